use crate::error::{SfResult, StenoForgeError};
use crate::keyboard::{Chord, Keyboard};
use crate::keymap::Keymap;
use crate::phonology::SyllableRuns;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// A word typed with an explicit chord sequence instead of the regular
/// keymap derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryRule {
    pub ortho: String,
    /// Restricts the rule to one pronunciation (`p1p2|p3` form).
    pub phonology: Option<String>,
    pub chords: Vec<Chord>,
    pub follows_canonical_order: bool,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleFile {
    ortho: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phonology: Option<String>,
    chords: Vec<Vec<String>>,
    #[serde(default = "yes")]
    follows_canonical_order: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct TheoryFile {
    name: String,
    #[serde(default)]
    exceptions: Vec<RuleFile>,
}

/// Chord sequence of one word and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct WordStrokes {
    pub chords: Vec<Chord>,
    /// Adjacent phoneme pairs whose keys read back in the wrong order
    /// inside a single chord.
    pub misread_pairs: usize,
    /// Index of the exception rule used, if any.
    pub rule: Option<usize>,
    /// Chords spent on each syllable. Empty for exception strokes.
    pub syllable_chords: Vec<usize>,
}

impl WordStrokes {
    /// Splits the chord sequence into one pattern per syllable.
    ///
    /// Regular strokes split where they were built. Exception chords follow
    /// the regular split when they have the same length, otherwise one chord
    /// per syllable. Any other shape cannot be attributed and gives `None`.
    pub fn per_syllable(&self, regular: Option<&WordStrokes>, syllables: usize) -> Option<Vec<&[Chord]>> {
        let breaks = if !self.syllable_chords.is_empty() {
            &self.syllable_chords
        } else {
            match regular {
                Some(r) if r.chords.len() == self.chords.len() => &r.syllable_chords,
                _ if self.chords.len() == syllables => {
                    return Some(self.chords.chunks(1).collect());
                }
                _ => return None,
            }
        };
        let mut rest = self.chords.as_slice();
        let mut out = Vec::with_capacity(breaks.len());
        for &n in breaks {
            let (head, tail) = rest.split_at(n.min(rest.len()));
            out.push(head);
            rest = tail;
        }
        Some(out)
    }
}

/// Regular derivation plus exceptions.
#[derive(Debug, Clone, Default)]
pub struct Theory {
    pub name: String,
    exceptions: Vec<TheoryRule>,
    by_word: HashMap<(String, Option<String>), usize>,
}

impl Theory {
    /// Every word follows the keymap: one chord per syllable, split when a key repeats.
    pub fn identity() -> Self {
        Self {
            name: "identity".to_string(),
            ..Default::default()
        }
    }

    pub fn with_exceptions(name: &str, exceptions: Vec<TheoryRule>) -> SfResult<Self> {
        let mut by_word = HashMap::new();
        for (i, rule) in exceptions.iter().enumerate() {
            if rule.chords.is_empty() || rule.chords.iter().any(|c| c.is_empty()) {
                return Err(StenoForgeError::Validation(format!(
                    "Exception for '{}' has an empty chord",
                    rule.ortho
                )));
            }
            let key = (rule.ortho.clone(), rule.phonology.clone());
            if by_word.insert(key, i).is_some() {
                return Err(StenoForgeError::Validation(format!(
                    "Duplicate exception for '{}'",
                    rule.ortho
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            exceptions,
            by_word,
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P, keyboard: &Keyboard) -> SfResult<Self> {
        let path = path.as_ref();
        info!("Loading theory from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, keyboard)
    }

    pub fn from_json(content: &str, keyboard: &Keyboard) -> SfResult<Self> {
        let file: TheoryFile = serde_json::from_str(content)?;
        let rules = file
            .exceptions
            .into_iter()
            .map(|r| {
                Ok(TheoryRule {
                    chords: r
                        .chords
                        .iter()
                        .map(|ids| keyboard.chord_from_ids(ids))
                        .collect::<SfResult<Vec<_>>>()?,
                    ortho: r.ortho,
                    phonology: r.phonology,
                    follows_canonical_order: r.follows_canonical_order,
                })
            })
            .collect::<SfResult<Vec<_>>>()?;
        Self::with_exceptions(&file.name, rules)
    }

    pub fn to_json(&self, keyboard: &Keyboard) -> SfResult<String> {
        let file = TheoryFile {
            name: self.name.clone(),
            exceptions: self
                .exceptions
                .iter()
                .map(|r| RuleFile {
                    ortho: r.ortho.clone(),
                    phonology: r.phonology.clone(),
                    chords: r.chords.iter().map(|c| keyboard.chord_ids(*c)).collect(),
                    follows_canonical_order: r.follows_canonical_order,
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn exceptions(&self) -> &[TheoryRule] {
        &self.exceptions
    }

    /// Pronunciation-specific rules win over spelling-only ones.
    pub fn rule_for(&self, ortho: &str, pronunciation: &str) -> Option<usize> {
        self.by_word
            .get(&(ortho.to_string(), Some(pronunciation.to_string())))
            .or_else(|| self.by_word.get(&(ortho.to_string(), None)))
            .copied()
    }

    pub fn strokes(
        &self,
        keymap: &Keymap,
        ortho: &str,
        pronunciation: &str,
        syllables: &[SyllableRuns],
    ) -> Option<WordStrokes> {
        match self.rule_for(ortho, pronunciation) {
            Some(i) => Some(self.exception_strokes(i)),
            None => regular_strokes(keymap, syllables),
        }
    }

    /// Strokes of the exception at `rule`.
    pub fn exception_strokes(&self, rule: usize) -> WordStrokes {
        WordStrokes {
            chords: self.exceptions[rule].chords.clone(),
            misread_pairs: 0,
            rule: Some(rule),
            syllable_chords: Vec::new(),
        }
    }
}

/// Keymap-only derivation of a word.
pub fn regular_strokes(keymap: &Keymap, syllables: &[SyllableRuns]) -> Option<WordStrokes> {
    let mut chords = Vec::with_capacity(syllables.len());
    let mut breaks = Vec::with_capacity(syllables.len());
    let mut misread_pairs = 0;
    for runs in syllables {
        let (syllable_chords, misread) = derive_syllable(keymap, runs)?;
        breaks.push(syllable_chords.len());
        chords.extend(syllable_chords);
        misread_pairs += misread;
    }
    Some(WordStrokes {
        chords,
        misread_pairs,
        rule: None,
        syllable_chords: breaks,
    })
}

/// Merges a syllable's pieces into as few chords as possible, opening a new
/// chord whenever a piece needs a key already held.
pub fn derive_syllable(keymap: &Keymap, runs: &SyllableRuns) -> Option<(Vec<Chord>, usize)> {
    let mut chords = Vec::new();
    let mut current = Chord::EMPTY;
    let mut misread = 0;

    for (group, run) in runs.runs() {
        let segments = keymap.segment(group, run)?;
        let mut previous_lead: Option<usize> = None;
        for seg in segments {
            if current.intersects(seg.chord) {
                chords.push(current);
                current = Chord::EMPTY;
                previous_lead = None;
            }
            let lead = seg.chord.keys().next();
            if let (Some(prev), Some(lead)) = (previous_lead, lead) {
                if lead < prev {
                    misread += 1;
                }
            }
            previous_lead = lead;
            current = current.union(seg.chord);
        }
    }
    if !current.is_empty() {
        chords.push(current);
    }
    Some((chords, misread))
}

/// Aggregate ambiguity of a chord dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguityStats {
    /// Chord sequences standing for more than one spelling.
    pub ambiguous_sequences: usize,
    /// Frequency of words that lose their sequence to a more frequent spelling.
    pub ambiguity_mass: f64,
    pub max_ambiguity: usize,
    pub max_ambiguity_words: Vec<String>,
    pub heaviest_words: Vec<String>,
    pub heaviest_mass: f64,
    /// Sequences where several spellings of one lemma meet. Those need a
    /// grammatical discriminator rather than a different chord.
    pub same_lemma_sequences: usize,
    pub same_lemma_mass: f64,
}

/// Chord sequence to spellings, with their frequencies.
#[derive(Debug, Clone, Default)]
pub struct StenoDictionary {
    pub entries: BTreeMap<Vec<Chord>, BTreeMap<String, f64>>,
    /// Lemma to its spellings, per sequence.
    pub lemmas: BTreeMap<Vec<Chord>, BTreeMap<String, BTreeSet<String>>>,
    pub uncovered_words: usize,
    pub unusable_words: usize,
}

impl StenoDictionary {
    pub fn insert(&mut self, chords: Vec<Chord>, ortho: &str, lemma: Option<&str>, frequency: f64) {
        if let Some(lemma) = lemma {
            self.lemmas
                .entry(chords.clone())
                .or_default()
                .entry(lemma.to_string())
                .or_default()
                .insert(ortho.to_string());
        }
        *self
            .entries
            .entry(chords)
            .or_default()
            .entry(ortho.to_string())
            .or_insert(0.0) += frequency;
    }

    pub fn ambiguity(&self) -> AmbiguityStats {
        let mut stats = AmbiguityStats::default();
        for words in self.entries.values() {
            let total: f64 = words.values().sum();
            if words.len() > stats.max_ambiguity {
                stats.max_ambiguity = words.len();
                stats.max_ambiguity_words = words.keys().cloned().collect();
            }
            if words.len() < 2 {
                continue;
            }
            stats.ambiguous_sequences += 1;
            let top = words.values().copied().fold(0.0, f64::max);
            stats.ambiguity_mass += total - top;
            if total > stats.heaviest_mass {
                stats.heaviest_mass = total;
                stats.heaviest_words = words.keys().cloned().collect();
            }
        }
        for (chords, lemmas) in &self.lemmas {
            let Some(words) = self.entries.get(chords) else {
                continue;
            };
            for spellings in lemmas.values().filter(|s| s.len() > 1) {
                let masses: Vec<f64> = spellings.iter().filter_map(|o| words.get(o)).copied().collect();
                let top = masses.iter().copied().fold(0.0, f64::max);
                stats.same_lemma_sequences += 1;
                stats.same_lemma_mass += masses.iter().sum::<f64>() - top;
            }
        }
        stats
    }

    /// `strokes<TAB>words` with chords joined by `/` and keys by `+`.
    pub fn write_tsv<W: Write>(&self, out: &mut W, keyboard: &Keyboard) -> SfResult<()> {
        writeln!(out, "strokes\twords")?;
        for (chords, words) in &self.entries {
            let strokes: Vec<String> = chords.iter().map(|c| keyboard.chord_label(*c)).collect();
            let words: Vec<&str> = words.keys().map(String::as_str).collect();
            writeln!(out, "{}\t{}", strokes.join("/"), words.join(","))?;
        }
        Ok(())
    }
}
