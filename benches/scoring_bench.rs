use criterion::{criterion_group, criterion_main, Criterion};
use stenoforge::config::Config;
use stenoforge::keyboard::Keyboard;
use stenoforge::lexicon::{Lexicon, WordRecord};
use stenoforge::ordering::{ExactOrderer, InsertionOrderer, PhonemeOrderer};
use stenoforge::phonology::{LanguageConfig, NucleusPolicy, PositionGroup};
use stenoforge::scorer::Candidate;
use stenoforge::session::Session;
use std::hint::black_box;

fn setup_session() -> Session {
    let onsets = ["", "p", "t", "k", "b", "d", "s", "m", "l", "R", "pR", "tR", "kl", "bl", "st"];
    let vowels = ["a", "i", "u", "e", "o", "@", "5"];
    let codas = ["", "R", "l", "s", "t", "k", "Rt", "st"];

    // Mock a 3k word lexicon with a Zipf-like frequency tail
    let mut records = Vec::new();
    let mut rank = 1.0;
    for o in onsets {
        for v in vowels {
            for c in codas {
                for second in ["", "a", "i"] {
                    let mut syllables = vec![format!("{}{}{}", o, v, c)];
                    if !second.is_empty() {
                        syllables.push(format!("l{}", second));
                    }
                    let ortho = syllables.concat();
                    let parsed = syllables
                        .iter()
                        .map(|s| s.chars().map(|ch| ch.to_string()).collect())
                        .collect();
                    records.push(WordRecord::new(&ortho, parsed, 1000.0 / rank));
                    rank += 1.0;
                }
            }
        }
    }

    Session::from_parts(
        Lexicon::from_records(records),
        LanguageConfig::french(NucleusPolicy::Reject),
        Keyboard::starboard(),
        &Config::default(),
    )
    .expect("Failed to build session")
}

fn criterion_benchmark(c: &mut Criterion) {
    let session = setup_session();
    let scorer = session.scorer(false).expect("Failed to build scorer");
    let candidate = Candidate::regular(session.base_keymap());

    c.bench_function("score (2.5k words)", |b| {
        b.iter(|| scorer.score(black_box(&candidate)))
    });

    let onset = session.table.group(PositionGroup::Onset).clone();
    c.bench_function("order onset (insertion)", |b| {
        b.iter(|| InsertionOrderer::default().order(black_box(&onset)))
    });

    // 15 symbols, inside the subset DP limit
    let nucleus = session.table.group(PositionGroup::Nucleus).clone();
    c.bench_function("order nucleus (exact)", |b| {
        b.iter(|| ExactOrderer::default().order(black_box(&nucleus)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
