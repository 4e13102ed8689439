pub mod builder;
pub mod mental;
pub mod strain;
pub mod types;

pub use self::builder::ScorerBuildParams;
pub use self::types::{Candidate, ScoreReport, UncoveredWord};

use self::mental::MentalTally;
use self::strain::StrainTally;
use crate::config::StrainParams;
use crate::error::{SfResult, StenoForgeError};
use crate::keyboard::Keyboard;
use crate::keymap::Keymap;
use crate::ordering::CanonicalOrder;
use crate::phonology::{LanguageConfig, PositionGroup, SyllableRuns};
use crate::theory::{regular_strokes, StenoDictionary, Theory};
use tracing::debug;

const UNCOVERED_EXAMPLES: usize = 10;
const VARIATION_EXAMPLES: usize = 10;

/// A usable lexicon entry, already split into syllable runs.
#[derive(Debug, Clone)]
pub struct PreparedWord {
    pub ortho: String,
    pub lemma: Option<String>,
    /// Silent markers removed.
    pub pronunciation: String,
    /// One per entry of `syllables`.
    pub syllable_names: Vec<String>,
    /// Graphemic syllables, when they line up with `syllable_names`.
    pub spellings: Option<Vec<String>>,
    pub frequency: f64,
    pub syllables: Vec<SyllableRuns>,
    pub in_order_pairs: u32,
    pub out_of_order_pairs: u32,
}

pub struct Scorer {
    pub keyboard: Keyboard,
    pub language: LanguageConfig,
    pub order: CanonicalOrder,
    pub strain: StrainParams,

    words: Vec<PreparedWord>,
    required_groups: Vec<PositionGroup>,
    unusable_words: usize,
    unusable_mass: f64,

    pub debug: bool,
}

impl Scorer {
    pub fn words(&self) -> &[PreparedWord] {
        &self.words
    }

    pub fn required_groups(&self) -> &[PositionGroup] {
        &self.required_groups
    }

    /// A keymap must map something in every group the lexicon uses.
    pub fn check_compatibility(&self, keymap: &Keymap) -> SfResult<()> {
        let missing: Vec<String> = self
            .required_groups
            .iter()
            .filter(|g| !keymap.covers_group(**g))
            .map(|g| g.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StenoForgeError::IncompatibleKeymap(format!(
                "no entries for group(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn score(&self, candidate: &Candidate) -> SfResult<ScoreReport> {
        self.score_with(&candidate.keymap, &candidate.theory)
    }

    pub fn score_with(&self, keymap: &Keymap, theory: &Theory) -> SfResult<ScoreReport> {
        keymap.validate()?;
        self.check_compatibility(keymap)?;

        let surcharge = self.strain.same_finger_surcharge;
        let mut report = ScoreReport {
            total_words: self.words.len() + self.unusable_words,
            unusable_words: self.unusable_words,
            unusable_mass: self.unusable_mass,
            multi_representation_count: keymap.multi_representation_count(),
            declared_exceptions: theory.exceptions().len(),
            ..Default::default()
        };
        let mut tally = StrainTally::default();
        let mut mental = MentalTally::default();
        let mut dictionary = StenoDictionary::default();
        let mut uncovered = Vec::new();

        for word in &self.words {
            let freq = word.frequency;
            let regular = regular_strokes(keymap, &word.syllables);
            let rule = theory.rule_for(&word.ortho, &word.pronunciation);
            let strokes = match rule {
                Some(i) => Some(theory.exception_strokes(i)),
                None => regular.clone(),
            };
            let Some(strokes) = strokes else {
                report.uncovered_words += 1;
                report.uncovered_mass += freq;
                uncovered.push(UncoveredWord {
                    ortho: word.ortho.clone(),
                    pronunciation: word.pronunciation.clone(),
                    frequency: freq,
                });
                continue;
            };

            report.covered_words += 1;
            report.covered_mass += freq;
            tally.add(&self.keyboard, &strokes.chords, freq, surcharge);
            report.misread_mass += strokes.misread_pairs as f64 * freq;

            let in_order = word.in_order_pairs as f64 * freq;
            let out_of_order = word.out_of_order_pairs as f64 * freq;
            let per_syllable = strokes.per_syllable(regular.as_ref(), word.syllables.len());
            match strokes.rule {
                Some(i) => {
                    let rule = &theory.exceptions()[i];
                    let deviates = regular.as_ref().map_or(true, |r| r.chords != strokes.chords);
                    mental.rule_applied(
                        i,
                        deviates,
                        rule.follows_canonical_order,
                        per_syllable.is_some(),
                    );
                    if rule.follows_canonical_order {
                        report.in_order_mass += in_order;
                        report.out_of_order_mass += out_of_order;
                    } else {
                        report.out_of_order_mass += in_order + out_of_order;
                    }
                }
                None => {
                    report.in_order_mass += in_order;
                    report.out_of_order_mass += out_of_order;
                }
            }

            if let Some(patterns) = per_syllable {
                for (i, pattern) in patterns.into_iter().enumerate() {
                    let spelling = word.spellings.as_ref().and_then(|s| s.get(i));
                    let name = word.syllable_names.get(i).unwrap_or(&word.pronunciation);
                    mental.observe_syllable(
                        name,
                        spelling.map(String::as_str),
                        pattern,
                        freq,
                        strokes.rule,
                    );
                }
            }
            dictionary.insert(strokes.chords, &word.ortho, word.lemma.as_deref(), freq);
        }

        report.total_mass = report.covered_mass + report.uncovered_mass + report.unusable_mass;
        if report.covered_mass > 0.0 {
            report.avg_keystrokes = tally.keystrokes / report.covered_mass;
            report.avg_chords = tally.chords / report.covered_mass;
            report.avg_strain = tally.strain / report.covered_mass;
        }
        report.finger_load = tally.finger_load();
        report.peak_finger_share = tally.peak_finger_share();

        report.variation_count = mental.variation_count();
        report.extra_variants = mental.extra_variants();
        report.exception_count = mental.exception_count();
        report.out_of_order_exceptions = mental.out_of_order_exceptions();
        report.applied_exceptions = mental.applied_exceptions();
        report.variation_examples = mental.variations(VARIATION_EXAMPLES);
        report.ambiguity = dictionary.ambiguity();

        uncovered.sort_by(|a, b| {
            b.frequency
                .total_cmp(&a.frequency)
                .then_with(|| a.ortho.cmp(&b.ortho))
        });
        uncovered.truncate(UNCOVERED_EXAMPLES);
        report.uncovered_examples = uncovered;

        if self.debug {
            debug!(
                "Scored {} words: {} uncovered, avg strain {:.3}",
                self.words.len(),
                report.uncovered_words,
                report.avg_strain
            );
        }
        Ok(report)
    }

    /// Chord dictionary of every covered word.
    pub fn dictionary(&self, candidate: &Candidate) -> StenoDictionary {
        let mut dictionary = StenoDictionary {
            unusable_words: self.unusable_words,
            ..Default::default()
        };
        for word in &self.words {
            match candidate.theory.strokes(
                &candidate.keymap,
                &word.ortho,
                &word.pronunciation,
                &word.syllables,
            ) {
                Some(strokes) => dictionary.insert(
                    strokes.chords,
                    &word.ortho,
                    word.lemma.as_deref(),
                    word.frequency,
                ),
                None => dictionary.uncovered_words += 1,
            }
        }
        dictionary
    }
}
