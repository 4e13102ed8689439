mod common;

use common::*;
use stenoforge::config::{Config, KeymapParams};
use stenoforge::error::StenoForgeError;
use stenoforge::keyboard::{Chord, Keyboard};
use stenoforge::keymap::Keymap;
use stenoforge::lexicon::Lexicon;
use stenoforge::phonology::{LanguageConfig, NucleusPolicy, PositionGroup};
use stenoforge::scorer::Candidate;
use stenoforge::session::Session;
use tempfile::tempdir;

fn french_session() -> Session {
    let words = vec![
        WordBuilder::new("tra").syllables("t_R_a").freq(10.0).build(),
        WordBuilder::new("pri").syllables("p_R_i").freq(5.0).build(),
        WordBuilder::new("pat").syllables("p_a_t").freq(4.0).build(),
        WordBuilder::new("bal").syllables("b_a_l").freq(3.0).build(),
        WordBuilder::new("sak").syllables("s_a_k").freq(2.0).build(),
    ];
    Session::from_parts(
        Lexicon::from_records(words),
        LanguageConfig::french(NucleusPolicy::Reject),
        Keyboard::starboard(),
        &Config::default(),
    )
    .expect("Failed to build session")
}

#[test]
fn test_save_and_load_round_trip() {
    let kb = small_keyboard();
    let mut keymap = full_keymap();
    keymap.push_chord(PositionGroup::Onset, ph("t"), Chord::from_keys(&[5, 6]));
    keymap.insert(PositionGroup::Coda, ph("s"), vec![single(10)]);
    keymap.mark_shared(PositionGroup::Coda, single(10));

    let dir = tempdir().unwrap();
    let path = dir.path().join("keymap.json");
    keymap.save(&path, &kb).unwrap();

    let loaded = Keymap::load_from_file(&path, &kb).unwrap();
    assert_eq!(loaded, keymap);
    assert_eq!(loaded.chords(PositionGroup::Onset, &ph("t")).len(), 2);
    assert_eq!(loaded.multi_representation_count(), 1);
}

#[test]
fn test_reserved_key_is_rejected() {
    let kb = Keyboard::starboard();
    let json = r#"{ "entries": [
        { "group": "onset", "phonemes": ["s"], "chords": [["0"]] }
    ] }"#;
    let err = Keymap::from_json(json, &kb).unwrap_err();
    assert!(matches!(err, StenoForgeError::Validation(_)));
}

#[test]
fn test_unknown_key_is_rejected() {
    let kb = Keyboard::starboard();
    let json = r#"{ "entries": [
        { "group": "coda", "phonemes": ["l"], "chords": [["99"]] }
    ] }"#;
    assert!(matches!(
        Keymap::from_json(json, &kb),
        Err(StenoForgeError::Validation(_))
    ));
}

#[test]
fn test_loaded_collision_needs_shared_block() {
    let kb = Keyboard::starboard();
    let colliding = r#"{ "entries": [
        { "group": "coda", "phonemes": ["l"], "chords": [["16"]] },
        { "group": "coda", "phonemes": ["R"], "chords": [["16"]] }
    ] }"#;
    assert!(Keymap::from_json(colliding, &kb).is_err());

    let shared = r#"{ "entries": [
        { "group": "coda", "phonemes": ["l"], "chords": [["16"]] },
        { "group": "coda", "phonemes": ["R"], "chords": [["16"]] }
    ], "shared": [ { "group": "coda", "keys": ["16"] } ] }"#;
    let keymap = Keymap::from_json(shared, &kb).unwrap();
    assert!(keymap.is_shared(PositionGroup::Coda, Chord::from_keys(&[16])));
}

#[test]
fn test_base_keymap_is_valid_and_complete() {
    let session = french_session();
    let keymap = session.base_keymap();

    keymap.validate().unwrap();
    for group in PositionGroup::ALL {
        assert!(keymap.covers_group(group), "{} left unmapped", group);
    }
    for (_, chords) in keymap.entries() {
        for chord in chords {
            assert!(chord.keys().all(|k| !session.keyboard.keys[k].reserved));
        }
    }

    let scorer = session.scorer(false).unwrap();
    let report = scorer.score(&Candidate::regular(keymap)).unwrap();
    assert_eq!(report.uncovered_words, 0);
    assert_eq!(report.misread_mass, 0.0);
}

#[test]
fn test_base_keymap_follows_canonical_order() {
    let session = french_session();
    let keymap = session.base_keymap();

    let mut onset: Vec<(usize, usize)> = keymap
        .entries()
        .filter(|((g, p), chords)| {
            *g == PositionGroup::Onset && p.len() == 1 && chords[0].len() == 1
        })
        .map(|((g, p), chords)| {
            let key = chords[0].keys().next().unwrap_or(usize::MAX);
            let rank = session.order.rank(*g, &p[0]).unwrap_or(usize::MAX);
            (key, rank)
        })
        .collect();
    onset.sort();
    assert_eq!(onset.len(), 5);
    assert!(onset.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn test_keyboard_file_round_trip() {
    let kb = Keyboard::starboard();
    let dir = tempdir().unwrap();
    let path = dir.path().join("starboard.json");
    std::fs::write(&path, kb.to_json().unwrap()).unwrap();

    let loaded = Keyboard::load_from_file(&path).unwrap();
    assert_eq!(loaded.keys, kb.keys);
    for group in PositionGroup::ALL {
        assert_eq!(loaded.chord_pool(group, 3, 0.5), kb.chord_pool(group, 3, 0.5));
    }
    let pinky = Chord::from_keys(&[22, 24]);
    assert_eq!(loaded.chord_strain(pinky, 0.5), kb.chord_strain(pinky, 0.5));
}

#[test]
fn test_invalid_keyboard_combo_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{ "name": "bad", "keys": [
            { "id": "a", "finger": "left_index", "zones": ["onset"] },
            { "id": "b", "finger": "right_index", "zones": ["coda"] }
        ], "combos": [ { "keys": ["a", "b"], "strain": 1.0 } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        Keyboard::load_from_file(&path),
        Err(StenoForgeError::Configuration(_))
    ));
}

#[test]
fn test_leftover_phoneme_shares_chord_without_homophones() {
    let words = vec![
        WordBuilder::new("ta").syllables("t_a").freq(10.0).build(),
        WordBuilder::new("de").syllables("d_e").freq(8.0).build(),
        WordBuilder::new("ti").syllables("t_i").freq(6.0).build(),
        WordBuilder::new("to").syllables("t_o").freq(3.0).build(),
        WordBuilder::new("pu").syllables("p_u").freq(2.0).build(),
    ];
    let config = Config {
        keymap: KeymapParams {
            max_chord_keys: 1,
            ..KeymapParams::default()
        },
        ..Config::default()
    };
    let language = LanguageConfig::from_symbols("aeiou", CONSONANTS, NucleusPolicy::Reject).unwrap();
    let session =
        Session::from_parts(Lexicon::from_records(words), language, small_keyboard(), &config)
            .unwrap();

    let nucleus = PositionGroup::Nucleus;
    assert_eq!(session.ambiguity.conflict(nucleus, "o", "a"), 3.0);
    assert_eq!(session.ambiguity.conflict(nucleus, "o", "i"), 3.0);
    assert_eq!(session.ambiguity.conflict(nucleus, "o", "e"), 0.0);

    // "to" next to "ta" or "ti" would be lost; next to "de" it stays apart.
    let keymap = session.base_keymap();
    let primary = |p: &str| keymap.primary(nucleus, &[p.to_string()]);
    assert!(primary("o").is_some());
    assert_eq!(primary("o"), primary("e"));
    assert_ne!(primary("o"), primary("i"));
}
