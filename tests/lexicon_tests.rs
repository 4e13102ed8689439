mod common;

use common::*;
use std::io::Write;
use stenoforge::biphoneme::BiphonemeTable;
use stenoforge::config::LexiconColumns;
use stenoforge::error::StenoForgeError;
use stenoforge::lexicon::{Lexicon, WordRecord};
use stenoforge::phonology::{LanguageConfig, NucleusPolicy, PositionGroup};
use tempfile::NamedTempFile;

fn write_lexicon(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "ortho\tsyll_cv\torthosyll_cv\tfreqfilms2\tfreqlivres").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

#[test]
fn test_load_tsv_lexicon() {
    let file = write_lexicon(&[
        "train\tt_R_5\ttrain\t10,5\t2.5",
        "# commented\tt_a\tta\t1\t1",
        "parti\tp_a_R|t_i\tpar|ti\t3\t",
        "\ta\ta\t1\t1",
    ]);
    let lexicon = Lexicon::load_from_file(file.path(), &LexiconColumns::default()).unwrap();

    assert_eq!(lexicon.len(), 2);
    let train = &lexicon.records()[0];
    assert_eq!(train.ortho, "train");
    assert_eq!(train.syllables, vec![ph("tR5")]);
    assert_eq!(train.frequencies, vec![10.5, 2.5]);
    assert!((lexicon.frequency(train) - 13.0).abs() < 1e-9);

    let parti = &lexicon.records()[1];
    assert_eq!(parti.syllables, vec![ph("paR"), ph("ti")]);
    assert_eq!(parti.grapheme_syllables, vec!["par", "ti"]);
    assert_eq!(parti.frequencies, vec![3.0, 0.0]);
    assert_eq!(parti.pronunciation(), "paR|ti");
}

#[test]
fn test_silent_marker_is_not_pronounced() {
    let file = write_lexicon(&[
        "vert\tv_E_R\tv_e_r_t\t40\t0",
        "verre\tv_E_R_#\tv_e_r_r_e\t30\t0",
        "vertes\tv_E_R|t_#\tv_e_r|t_e_s\t2\t0",
    ]);
    let lexicon = Lexicon::load_from_file(file.path(), &LexiconColumns::default()).unwrap();
    let by_ortho = |o: &str| lexicon.iter().find(|r| r.ortho == o).unwrap();

    assert_eq!(by_ortho("vert").pronunciation(), "vER");
    assert_eq!(by_ortho("verre").pronunciation(), "vER");
    assert_eq!(by_ortho("verre").syllable_names(), vec!["vER"]);
    assert_eq!(
        by_ortho("verre").syllable_spellings(),
        Some(["verre".to_string()].as_slice())
    );

    let vertes = by_ortho("vertes");
    assert_eq!(vertes.syllable_names(), vec!["vER", "t"]);
    assert_eq!(vertes.syllable_spellings().map(|s| s.len()), Some(2));
}

#[test]
fn test_malformed_frequency_skips_row() {
    let file = write_lexicon(&["bon\tb_§\tbon\tmany\t1", "vin\tv_5\tvin\t2\t1"]);
    let lexicon = Lexicon::load_from_file(file.path(), &LexiconColumns::default()).unwrap();
    assert_eq!(lexicon.len(), 1);
    assert_eq!(lexicon.records()[0].ortho, "vin");
}

#[test]
fn test_missing_column_is_configuration_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ortho\tfreqfilms2\tfreqlivres").unwrap();
    writeln!(file, "a\t1\t1").unwrap();

    let err = Lexicon::load_from_file(file.path(), &LexiconColumns::default()).unwrap_err();
    assert!(matches!(err, StenoForgeError::Configuration(_)));
}

#[test]
fn test_frequency_mix_weighs_corpora() {
    let file = write_lexicon(&["mot\tm_o\tmot\t4\t10"]);
    let columns = LexiconColumns {
        frequency_mix: "0.5,0.1".to_string(),
        ..LexiconColumns::default()
    };
    let lexicon = Lexicon::load_from_file(file.path(), &columns).unwrap();
    assert!((lexicon.frequency(&lexicon.records()[0]) - 3.0).abs() < 1e-9);

    let bad = LexiconColumns {
        frequency_mix: "1.0".to_string(),
        ..LexiconColumns::default()
    };
    assert!(Lexicon::load_from_file(file.path(), &bad).is_err());
}

#[test]
fn test_canonical_iteration_ignores_input_order() {
    let mut reversed = sample_words();
    reversed.reverse();
    let a: Vec<String> = sample_lexicon().iter().map(|r| r.ortho.clone()).collect();
    let b: Vec<String> = Lexicon::from_records(reversed)
        .iter()
        .map(|r| r.ortho.clone())
        .collect();
    assert_eq!(a, b);
}

#[test]
fn test_biphoneme_counts() {
    let table = BiphonemeTable::build(&sample_lexicon(), &small_language()).unwrap();
    let onset = table.group(PositionGroup::Onset);

    assert!((onset.pair("t", "R") - 14.0).abs() < 1e-9);
    assert_eq!(onset.pair("R", "t"), 0.0);
    assert!((onset.single("t") - 14.0).abs() < 1e-9);
    assert!((onset.single("d") - 6.0).abs() < 1e-9);
    assert!((table.group(PositionGroup::Coda).single("l") - 5.0).abs() < 1e-9);
    assert_eq!(table.usable_records, 5);
    assert_eq!(table.unusable_records, 0);
}

#[test]
fn test_unusable_records_contribute_nothing() {
    let mut words = sample_words();
    words.push(WordBuilder::new("x").freq(7.0).build());
    words.push(WordBuilder::new("st").syllables("s_t").freq(2.0).build());
    let table = BiphonemeTable::build(&Lexicon::from_records(words), &small_language()).unwrap();

    assert_eq!(table.unusable_records, 2);
    assert!((table.unusable_frequency - 9.0).abs() < 1e-9);
    assert_eq!(table.group(PositionGroup::Onset).pair("s", "t"), 0.0);
}

#[test]
fn test_repeats_are_kept_apart() {
    let words = vec![WordBuilder::new("alla").syllables("a_l_l|a").freq(3.0).build()];
    let table = BiphonemeTable::build(&Lexicon::from_records(words), &small_language()).unwrap();
    let coda = table.group(PositionGroup::Coda);
    assert!(coda.pairs.is_empty());
    assert!((coda.repeats["l"] - 3.0).abs() < 1e-9);
}

#[test]
fn test_split_nucleus_policy() {
    let record = WordRecord::new("tati", vec![ph("tati")], 1.0);
    let lexicon = Lexicon::from_records(vec![record]);

    let reject = BiphonemeTable::build(&lexicon, &small_language()).unwrap();
    assert_eq!(reject.unusable_records, 1);

    let lenient = LanguageConfig::from_symbols(VOWELS, CONSONANTS, NucleusPolicy::Merge).unwrap();
    let table = BiphonemeTable::build(&lexicon, &lenient).unwrap();
    assert_eq!(table.usable_records, 1);
    assert!((table.group(PositionGroup::Nucleus).pair("a", "i") - 1.0).abs() < 1e-9);
}

#[test]
fn test_unknown_phoneme_is_configuration_error() {
    let words = vec![WordBuilder::new("zoo").syllables("z_a").build()];
    let err = BiphonemeTable::build(&Lexicon::from_records(words), &small_language()).unwrap_err();
    assert!(matches!(err, StenoForgeError::Configuration(_)));
}

#[test]
fn test_bundled_groups_match_builtin_french() {
    let loaded = LanguageConfig::load_from_file("data/groups/french.tsv", NucleusPolicy::Reject)
        .expect("bundled groups file");
    let builtin = LanguageConfig::french(NucleusPolicy::Reject);
    for group in PositionGroup::ALL {
        assert_eq!(loaded.alphabet(group), builtin.alphabet(group));
    }
}

#[test]
fn test_positional_frequencies() {
    let table = BiphonemeTable::build(&sample_lexicon(), &small_language()).unwrap();
    let pos = &table.positional;

    // tra, tri: t opens the syllable, R is second, the vowel closes it.
    assert!((pos.from_start["t"][0] - 14.0).abs() < 1e-9);
    assert!((pos.from_start["R"][1] - 14.0).abs() < 1e-9);
    assert!((pos.from_end["R"][1] - 14.0).abs() < 1e-9);
    assert!((pos.from_end["l"][0] - 5.0).abs() < 1e-9);
    assert!((pos.from_end["a"][0] - 16.0).abs() < 1e-9);
}
