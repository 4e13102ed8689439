#![allow(dead_code)] // Not every test binary uses every helper

use stenoforge::keyboard::{Chord, Finger, Key, Keyboard};
use stenoforge::keymap::Keymap;
use stenoforge::lexicon::{Lexicon, WordRecord};
use stenoforge::phonology::{LanguageConfig, NucleusPolicy, Phoneme, PositionGroup};
use stenoforge::scorer::{Scorer, ScorerBuildParams};
use std::sync::Arc;

pub const VOWELS: &str = "ai";
pub const CONSONANTS: &str = "tdRpsl";

/// One phoneme per character.
pub fn ph(s: &str) -> Vec<Phoneme> {
    s.chars().map(|c| c.to_string()).collect()
}

pub fn small_language() -> LanguageConfig {
    LanguageConfig::from_symbols(VOWELS, CONSONANTS, NucleusPolicy::Reject)
        .expect("valid test language")
}

/// Builder for WordRecord to keep fixtures short
pub struct WordBuilder {
    record: WordRecord,
}

impl WordBuilder {
    pub fn new(ortho: &str) -> Self {
        Self {
            record: WordRecord::new(ortho, Vec::new(), 1.0),
        }
    }

    /// `p1_p2|p3` notation.
    pub fn syllables(mut self, raw: &str) -> Self {
        self.record.syllables = WordRecord::parse_syllables(raw);
        self
    }

    /// `g1|g2` notation, one per phonological syllable.
    pub fn graphemes(mut self, raw: &str) -> Self {
        self.record.grapheme_syllables = WordRecord::parse_grapheme_syllables(raw);
        self
    }

    pub fn lemma(mut self, lemma: &str) -> Self {
        self.record.lemma = Some(lemma.to_string());
        self
    }

    pub fn freq(mut self, f: f64) -> Self {
        self.record.frequencies = vec![f];
        self
    }

    pub fn build(self) -> WordRecord {
        self.record
    }
}

pub fn sample_words() -> Vec<WordRecord> {
    vec![
        WordBuilder::new("tra").syllables("t_R_a").freq(10.0).build(),
        WordBuilder::new("tri").syllables("t_R_i").freq(4.0).build(),
        WordBuilder::new("da").syllables("d_a").freq(6.0).build(),
        WordBuilder::new("pal").syllables("p_a_l").freq(3.0).build(),
        WordBuilder::new("sil").syllables("s_i_l").freq(2.0).build(),
    ]
}

pub fn sample_lexicon() -> Lexicon {
    Lexicon::from_records(sample_words())
}

/// Builder for Key
pub struct KeyBuilder {
    key: Key,
}

impl KeyBuilder {
    pub fn new(id: &str, finger: Finger) -> Self {
        Self {
            key: Key {
                id: id.to_string(),
                finger,
                strain: 1.0,
                zones: Vec::new(),
                reserved: false,
            },
        }
    }

    pub fn zone(mut self, group: PositionGroup) -> Self {
        self.key.zones.push(group);
        self
    }

    pub fn strain(mut self, strain: f64) -> Self {
        self.key.strain = strain;
        self
    }

    pub fn reserved(mut self) -> Self {
        self.key.reserved = true;
        self
    }

    pub fn build(self) -> Key {
        self.key
    }
}

/// 17 keys: onset 0..=6, nucleus 7..=9, coda 10..=16. No combos.
pub fn small_keyboard() -> Keyboard {
    use Finger::*;
    let onset = [LeftPinky, LeftPinky, LeftRing, LeftRing, LeftMiddle, LeftIndex, LeftIndex];
    let nucleus = [LeftThumb, LeftThumb, RightThumb];
    let coda = [RightIndex, RightIndex, RightMiddle, RightRing, RightRing, RightPinky, RightPinky];

    let mut keys = Vec::new();
    for (i, f) in onset.iter().enumerate() {
        keys.push(KeyBuilder::new(&format!("o{}", i), *f).zone(PositionGroup::Onset).build());
    }
    for (i, f) in nucleus.iter().enumerate() {
        keys.push(KeyBuilder::new(&format!("n{}", i), *f).zone(PositionGroup::Nucleus).build());
    }
    for (i, f) in coda.iter().enumerate() {
        keys.push(KeyBuilder::new(&format!("c{}", i), *f).zone(PositionGroup::Coda).build());
    }
    Keyboard::new("small", keys, Vec::new()).expect("valid test keyboard")
}

pub fn single(key: usize) -> Chord {
    Chord::from_keys(&[key])
}

/// Every phoneme of the small language on its own key.
pub fn full_keymap() -> Keymap {
    let mut km = Keymap::new();
    for (i, c) in CONSONANTS.chars().enumerate() {
        km.insert(PositionGroup::Onset, vec![c.to_string()], vec![single(i)]);
        km.insert(PositionGroup::Coda, vec![c.to_string()], vec![single(10 + i)]);
    }
    for (i, v) in VOWELS.chars().enumerate() {
        km.insert(PositionGroup::Nucleus, vec![v.to_string()], vec![single(7 + i)]);
    }
    km
}

pub fn build_scorer(lexicon: Lexicon) -> Scorer {
    ScorerBuildParams::builder()
        .lexicon(Arc::new(lexicon))
        .language(small_language())
        .keyboard(small_keyboard())
        .build()
        .build_scorer()
        .expect("Failed to build scorer")
}
