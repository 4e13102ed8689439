use crate::keyboard::Finger;
use crate::keymap::Keymap;
use crate::scorer::mental::SyllableVariation;
use crate::theory::{AmbiguityStats, Theory};
use serde::Serialize;

/// A keymap together with the theory that types words with it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub keymap: Keymap,
    pub theory: Theory,
}

impl Candidate {
    pub fn new(keymap: Keymap, theory: Theory) -> Self {
        Self { keymap, theory }
    }

    /// Keymap typed with the regular derivation only.
    pub fn regular(keymap: Keymap) -> Self {
        Self {
            keymap,
            theory: Theory::identity(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncoveredWord {
    pub ortho: String,
    pub pronunciation: String,
    pub frequency: f64,
}

/// Every strain figure for one candidate. Averages are per covered word,
/// weighted by word frequency.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    // Coverage
    pub total_words: usize,
    pub total_mass: f64,
    pub covered_words: usize,
    pub covered_mass: f64,
    pub uncovered_words: usize,
    pub uncovered_mass: f64,
    pub unusable_words: usize,
    pub unusable_mass: f64,

    // Physical strain
    pub avg_keystrokes: f64,
    pub avg_chords: f64,
    pub avg_strain: f64,
    pub finger_load: [f64; Finger::COUNT],
    pub peak_finger_share: f64,

    // Mental strain
    pub multi_representation_count: usize,
    /// Phonological syllables typed with more than one chord pattern.
    pub variation_count: usize,
    pub extra_variants: usize,
    /// Exception rules that cost memory: those out of canonical order, and
    /// those deviating from the keymap unlike other words with the same
    /// syllable. Only rules applied to a covered word can be judged.
    pub exception_count: usize,
    pub out_of_order_exceptions: usize,
    /// Rules applied to at least one covered word.
    pub applied_exceptions: usize,
    /// Every rule of the theory, applied or not.
    pub declared_exceptions: usize,
    pub variation_examples: Vec<SyllableVariation>,

    // Phoneme order
    pub in_order_mass: f64,
    pub out_of_order_mass: f64,
    pub misread_mass: f64,

    pub ambiguity: AmbiguityStats,

    pub uncovered_examples: Vec<UncoveredWord>,
}

impl ScoreReport {
    pub fn coverage(&self) -> f64 {
        let usable = self.covered_mass + self.uncovered_mass;
        if usable > 0.0 {
            self.covered_mass / usable
        } else {
            0.0
        }
    }

    /// Declared rules that typed no covered word.
    pub fn unused_exceptions(&self) -> usize {
        self.declared_exceptions.saturating_sub(self.applied_exceptions)
    }

    pub fn out_of_order_ratio(&self) -> f64 {
        let total = self.in_order_mass + self.out_of_order_mass;
        if total > 0.0 {
            self.out_of_order_mass / total
        } else {
            0.0
        }
    }
}
