use crate::keyboard::Chord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How one phonological syllable is typed across the lexicon.
#[derive(Debug, Clone, Default)]
struct SyllableUsage {
    /// Chord pattern to the frequency typed with it.
    patterns: BTreeMap<Vec<Chord>, f64>,
    spellings: BTreeMap<String, f64>,
    /// Patterns each exception rule used for this syllable.
    rule_patterns: BTreeMap<usize, BTreeSet<Vec<Chord>>>,
}

impl SyllableUsage {
    fn frequency(&self) -> f64 {
        self.patterns.values().sum()
    }
}

/// A syllable typed with more than one chord pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllableVariation {
    pub syllable: String,
    pub patterns: usize,
    /// Most frequent first.
    pub spellings: Vec<String>,
    pub frequency: f64,
}

/// Tracks how consistently syllables are typed and which exceptions cost
/// something to remember.
#[derive(Debug, Clone, Default)]
pub struct MentalTally {
    syllables: BTreeMap<String, SyllableUsage>,
    applied_rules: BTreeSet<usize>,
    deviating_rules: BTreeSet<usize>,
    unordered_rules: BTreeSet<usize>,
    unattributed_rules: BTreeSet<usize>,
}

impl MentalTally {
    /// One syllable occurrence typed with `pattern`. `rule` is the exception
    /// that produced it, if any.
    pub fn observe_syllable(
        &mut self,
        syllable: &str,
        spelling: Option<&str>,
        pattern: &[Chord],
        frequency: f64,
        rule: Option<usize>,
    ) {
        let usage = self.syllables.entry(syllable.to_string()).or_default();
        *usage.patterns.entry(pattern.to_vec()).or_insert(0.0) += frequency;
        if let Some(spelling) = spelling {
            *usage.spellings.entry(spelling.to_string()).or_insert(0.0) += frequency;
        }
        if let Some(rule) = rule {
            usage
                .rule_patterns
                .entry(rule)
                .or_default()
                .insert(pattern.to_vec());
        }
    }

    /// Records an applied exception. `deviates` is true when its chords differ
    /// from what the keymap alone produces, `attributed` when its chords could
    /// be split over the word's syllables.
    pub fn rule_applied(&mut self, rule: usize, deviates: bool, follows_order: bool, attributed: bool) {
        self.applied_rules.insert(rule);
        if deviates {
            self.deviating_rules.insert(rule);
            if !attributed {
                self.unattributed_rules.insert(rule);
            }
        }
        if !follows_order {
            self.unordered_rules.insert(rule);
        }
    }

    /// Syllables typed with more than one chord pattern.
    pub fn variation_count(&self) -> usize {
        self.syllables.values().filter(|u| u.patterns.len() > 1).count()
    }

    pub fn extra_variants(&self) -> usize {
        self.syllables
            .values()
            .map(|u| u.patterns.len().saturating_sub(1))
            .sum()
    }

    /// Rules that cost memory: out of canonical order, or deviating from the
    /// keymap in a way other words sharing the syllable do not.
    pub fn exception_rules(&self) -> BTreeSet<usize> {
        let mut rules = self.unordered_rules.clone();
        rules.extend(self.unattributed_rules.iter().copied());
        for usage in self.syllables.values().filter(|u| u.patterns.len() > 1) {
            for (rule, used) in &usage.rule_patterns {
                if self.deviating_rules.contains(rule)
                    && usage.patterns.keys().any(|p| !used.contains(p))
                {
                    rules.insert(*rule);
                }
            }
        }
        rules
    }

    pub fn exception_count(&self) -> usize {
        self.exception_rules().len()
    }

    pub fn out_of_order_exceptions(&self) -> usize {
        self.unordered_rules.len()
    }

    pub fn applied_exceptions(&self) -> usize {
        self.applied_rules.len()
    }

    /// The heaviest varying syllables.
    pub fn variations(&self, limit: usize) -> Vec<SyllableVariation> {
        let mut out: Vec<SyllableVariation> = self
            .syllables
            .iter()
            .filter(|(_, u)| u.patterns.len() > 1)
            .map(|(name, u)| {
                let mut spellings: Vec<(&String, &f64)> = u.spellings.iter().collect();
                spellings.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
                SyllableVariation {
                    syllable: name.clone(),
                    patterns: u.patterns.len(),
                    spellings: spellings.into_iter().map(|(s, _)| s.clone()).collect(),
                    frequency: u.frequency(),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.frequency
                .total_cmp(&a.frequency)
                .then_with(|| a.syllable.cmp(&b.syllable))
        });
        out.truncate(limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homophones_share_a_pattern() {
        let mut m = MentalTally::default();
        let c = vec![Chord::from_keys(&[2, 11])];
        m.observe_syllable("mA", Some("man"), &c, 3.0, None);
        m.observe_syllable("mA", Some("ment"), &c, 1.0, None);
        assert_eq!(m.variation_count(), 0);

        m.observe_syllable("mA", Some("mant"), &[Chord::from_keys(&[3, 11])], 1.0, Some(0));
        m.rule_applied(0, true, true, true);
        assert_eq!(m.variation_count(), 1);
        assert_eq!(m.extra_variants(), 1);
        assert_eq!(m.exception_count(), 1);

        let v = m.variations(10);
        assert_eq!(v[0].syllable, "mA");
        assert_eq!(v[0].spellings, vec!["man", "mant", "ment"]);
        assert!((v[0].frequency - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_matching_exception_is_not_counted() {
        let mut m = MentalTally::default();
        let c = vec![Chord::from_keys(&[4])];
        m.observe_syllable("sa", None, &c, 1.0, Some(0));
        m.rule_applied(0, false, true, true);
        m.rule_applied(2, false, false, true);
        assert_eq!(m.exception_count(), 1);
        assert_eq!(m.out_of_order_exceptions(), 1);
        assert_eq!(m.applied_exceptions(), 2);
    }

    #[test]
    fn test_consistent_deviation_is_not_counted() {
        let mut m = MentalTally::default();
        let brief = vec![Chord::from_keys(&[5])];
        m.observe_syllable("sE", Some("c'est"), &brief, 9.0, Some(0));
        m.observe_syllable("sE", Some("sait"), &brief, 2.0, Some(1));
        m.rule_applied(0, true, true, true);
        m.rule_applied(1, true, true, true);
        assert_eq!(m.variation_count(), 0);
        assert_eq!(m.exception_count(), 0);

        m.rule_applied(2, true, true, false);
        assert_eq!(m.exception_count(), 1);
    }
}
