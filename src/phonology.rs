use crate::error::{SfResult, StenoForgeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, info};

pub type Phoneme = String;

/// Marker for silent phonemes in syllable transcriptions.
pub const SILENT_MARKER: &str = "#";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionGroup {
    Onset,
    Nucleus,
    Coda,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 3] = [
        PositionGroup::Onset,
        PositionGroup::Nucleus,
        PositionGroup::Coda,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// How a syllable with two vowel clusters separated by consonants is treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NucleusPolicy {
    /// The syllable is malformed; its record is counted as unusable.
    #[default]
    Reject,
    /// Every vowel cluster joins the nucleus run and the consonants between
    /// clusters join the coda run ahead of the trailing consonants.
    Merge,
}

/// Set of position groups a phoneme may occupy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupSet(u8);

impl GroupSet {
    pub fn of(groups: &[PositionGroup]) -> Self {
        Self(groups.iter().fold(0, |acc, g| acc | g.bit()))
    }

    #[inline(always)]
    pub fn contains(self, group: PositionGroup) -> bool {
        self.0 & group.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn groups(self) -> impl Iterator<Item = PositionGroup> {
        PositionGroup::ALL.into_iter().filter(move |g| self.contains(*g))
    }
}

/// Onset, nucleus and coda runs of one syllable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyllableRuns {
    pub onset: Vec<Phoneme>,
    pub nucleus: Vec<Phoneme>,
    pub coda: Vec<Phoneme>,
}

impl SyllableRuns {
    pub fn run(&self, group: PositionGroup) -> &[Phoneme] {
        match group {
            PositionGroup::Onset => &self.onset,
            PositionGroup::Nucleus => &self.nucleus,
            PositionGroup::Coda => &self.coda,
        }
    }

    pub fn runs(&self) -> impl Iterator<Item = (PositionGroup, &[Phoneme])> {
        PositionGroup::ALL
            .into_iter()
            .map(move |g| (g, self.run(g)))
            .filter(|(_, run)| !run.is_empty())
    }

    pub fn phoneme_count(&self) -> usize {
        self.onset.len() + self.nucleus.len() + self.coda.len()
    }
}

/// Immutable language description: which groups each phoneme may occupy,
/// plus the phonotactic policy applied when splitting syllables.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    memberships: BTreeMap<Phoneme, GroupSet>,
    nucleus_policy: NucleusPolicy,
}

impl LanguageConfig {
    pub fn new<I, S>(memberships: I, nucleus_policy: NucleusPolicy) -> SfResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<PositionGroup>)>,
        S: Into<Phoneme>,
    {
        let mut map = BTreeMap::new();
        for (phoneme, groups) in memberships {
            let phoneme = phoneme.into();
            let set = GroupSet::of(&groups);
            if phoneme.is_empty() || phoneme == SILENT_MARKER {
                return Err(StenoForgeError::Configuration(format!(
                    "'{}' cannot be declared as a phoneme",
                    phoneme
                )));
            }
            if set.is_empty() {
                return Err(StenoForgeError::Configuration(format!(
                    "Phoneme '{}' has no position group",
                    phoneme
                )));
            }
            if set.contains(PositionGroup::Nucleus)
                && (set.contains(PositionGroup::Onset) || set.contains(PositionGroup::Coda))
            {
                return Err(StenoForgeError::Configuration(format!(
                    "Phoneme '{}' cannot be both a nucleus and a consonant",
                    phoneme
                )));
            }
            map.insert(phoneme, set);
        }
        Ok(Self {
            memberships: map,
            nucleus_policy,
        })
    }

    /// Builds a configuration from vowel and consonant symbol strings.
    /// Each `char` is one phoneme; consonants may occupy onset and coda.
    pub fn from_symbols(vowels: &str, consonants: &str, policy: NucleusPolicy) -> SfResult<Self> {
        let entries = vowels
            .chars()
            .map(|c| (c.to_string(), vec![PositionGroup::Nucleus]))
            .chain(
                consonants
                    .chars()
                    .map(|c| (c.to_string(), vec![PositionGroup::Onset, PositionGroup::Coda])),
            );
        Self::new(entries, policy)
    }

    /// French phoneme inventory using the Lexique transcription symbols.
    pub fn french(policy: NucleusPolicy) -> Self {
        Self::from_symbols("aeiouy2589OE§@°", "pbtdkgfvszSZmnNGlRwjx", policy)
            .unwrap_or_else(|_| unreachable!("built-in inventory is well formed"))
    }

    /// Reads `phoneme<TAB>groups` lines. `groups` is a comma list of
    /// `onset`, `nucleus`, `coda`, or the shorthands `consonant` and `vowel`.
    pub fn load_from_file<P: AsRef<Path>>(path: P, policy: NucleusPolicy) -> SfResult<Self> {
        let path = path.as_ref();
        info!("Loading phoneme groups from {}", path.display());
        let file = File::open(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'%'))
            .flexible(true)
            .quoting(false)
            .from_reader(file);

        let mut entries = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() < 2 {
                return Err(StenoForgeError::Configuration(format!(
                    "Row {} of phoneme groups needs 'phoneme<TAB>groups'",
                    row + 1
                )));
            }
            let phoneme = record[0].trim().to_string();
            let mut groups = Vec::new();
            for token in record[1].split(',').map(str::trim).filter(|t| !t.is_empty()) {
                match token {
                    "consonant" => groups.extend([PositionGroup::Onset, PositionGroup::Coda]),
                    "vowel" => groups.push(PositionGroup::Nucleus),
                    other => groups.push(other.parse().map_err(|_| {
                        StenoForgeError::Configuration(format!(
                            "Unknown position group '{}' for phoneme '{}'",
                            other, phoneme
                        ))
                    })?),
                }
            }
            entries.push((phoneme, groups));
        }
        debug!("Read {} phoneme definitions", entries.len());
        Self::new(entries, policy)
    }

    pub fn nucleus_policy(&self) -> NucleusPolicy {
        self.nucleus_policy
    }

    pub fn groups_of(&self, phoneme: &str) -> Option<GroupSet> {
        self.memberships.get(phoneme).copied()
    }

    /// Alphabet of a group in symbol order.
    pub fn alphabet(&self, group: PositionGroup) -> Vec<Phoneme> {
        self.memberships
            .iter()
            .filter(|(_, set)| set.contains(group))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn membership(&self, phoneme: &str) -> SfResult<GroupSet> {
        self.groups_of(phoneme).ok_or_else(|| {
            StenoForgeError::Configuration(format!(
                "Phoneme '{}' has no position group assignment",
                phoneme
            ))
        })
    }

    fn require(&self, phoneme: &str, group: PositionGroup) -> SfResult<()> {
        if self.membership(phoneme)?.contains(group) {
            Ok(())
        } else {
            Err(StenoForgeError::Configuration(format!(
                "Phoneme '{}' is not allowed in the {} group",
                phoneme, group
            )))
        }
    }

    /// Splits a syllable into position-group runs.
    ///
    /// `Ok(None)` means the syllable is malformed data (no vowel, or a split
    /// nucleus under [`NucleusPolicy::Reject`]). A phoneme without a group
    /// assignment is a configuration error.
    pub fn split_syllable(&self, phonemes: &[Phoneme]) -> SfResult<Option<SyllableRuns>> {
        let phonemes: Vec<&Phoneme> = phonemes
            .iter()
            .filter(|p| p.as_str() != SILENT_MARKER && !p.is_empty())
            .collect();

        let mut nuclear = Vec::with_capacity(phonemes.len());
        for p in &phonemes {
            nuclear.push(self.membership(p)?.contains(PositionGroup::Nucleus));
        }

        let Some(first) = nuclear.iter().position(|&v| v) else {
            return Ok(None);
        };
        let last = nuclear.iter().rposition(|&v| v).unwrap_or(first);

        let inner_consonants = (first..=last).any(|i| !nuclear[i]);
        if inner_consonants && self.nucleus_policy == NucleusPolicy::Reject {
            return Ok(None);
        }

        let mut runs = SyllableRuns::default();
        for p in &phonemes[..first] {
            self.require(p, PositionGroup::Onset)?;
            runs.onset.push((*p).clone());
        }
        for (i, p) in phonemes.iter().enumerate().take(last + 1).skip(first) {
            if nuclear[i] {
                runs.nucleus.push((*p).clone());
            } else {
                self.require(p, PositionGroup::Coda)?;
                runs.coda.push((*p).clone());
            }
        }
        for p in &phonemes[last + 1..] {
            self.require(p, PositionGroup::Coda)?;
            runs.coda.push((*p).clone());
        }
        Ok(Some(runs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syl(s: &str) -> Vec<Phoneme> {
        s.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_split_basic_cvc() {
        let lang = LanguageConfig::french(NucleusPolicy::Reject);
        let runs = lang.split_syllable(&syl("tRav")).unwrap().unwrap();
        assert_eq!(runs.onset, syl("tR"));
        assert_eq!(runs.nucleus, syl("a"));
        assert_eq!(runs.coda, syl("v"));
    }

    #[test]
    fn test_silent_marker_dropped() {
        let lang = LanguageConfig::french(NucleusPolicy::Reject);
        let mut s = syl("vR");
        s.insert(0, "i".to_string());
        s.push("#".to_string());
        let runs = lang.split_syllable(&s).unwrap().unwrap();
        assert_eq!(runs.coda, syl("vR"));
    }

    #[test]
    fn test_split_nucleus_policy() {
        let reject = LanguageConfig::french(NucleusPolicy::Reject);
        assert!(reject.split_syllable(&syl("pati")).unwrap().is_none());

        let merge = LanguageConfig::french(NucleusPolicy::Merge);
        let runs = merge.split_syllable(&syl("patis")).unwrap().unwrap();
        assert_eq!(runs.onset, syl("p"));
        assert_eq!(runs.nucleus, syl("ai"));
        assert_eq!(runs.coda, syl("ts"));
    }

    #[test]
    fn test_unknown_phoneme_is_configuration_error() {
        let lang = LanguageConfig::french(NucleusPolicy::Reject);
        let err = lang.split_syllable(&syl("qa")).unwrap_err();
        assert!(matches!(err, StenoForgeError::Configuration(_)));
    }

    #[test]
    fn test_no_vowel_is_unusable() {
        let lang = LanguageConfig::french(NucleusPolicy::Reject);
        assert!(lang.split_syllable(&syl("pst")).unwrap().is_none());
    }
}
