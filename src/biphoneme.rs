use crate::error::SfResult;
use crate::lexicon::Lexicon;
use crate::phonology::{LanguageConfig, Phoneme, PositionGroup, SyllableRuns};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Positions past this are folded into the last bucket.
pub const MAX_POSITION: usize = 7;

/// Pair and single-occurrence statistics of one position group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub group: PositionGroup,
    pub alphabet: Vec<Phoneme>,
    /// (A, B) -> frequency of A immediately followed by B. Never holds A == B.
    pub pairs: BTreeMap<(Phoneme, Phoneme), f64>,
    /// Frequency of each phoneme occurring in this group ("importance").
    pub singles: BTreeMap<Phoneme, f64>,
    /// Frequency of a phoneme immediately repeating itself.
    pub repeats: BTreeMap<Phoneme, f64>,
}

impl GroupStats {
    pub fn new(group: PositionGroup, alphabet: Vec<Phoneme>) -> Self {
        let mut stats = Self {
            group,
            alphabet: Vec::new(),
            pairs: BTreeMap::new(),
            singles: BTreeMap::new(),
            repeats: BTreeMap::new(),
        };
        stats.extend_alphabet(alphabet);
        stats
    }

    /// Builds stats straight from weighted pairs; the alphabet is every
    /// phoneme mentioned.
    pub fn from_pairs<'a, I>(group: PositionGroup, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let mut stats = Self::new(group, Vec::new());
        let mut seen = Vec::new();
        for (a, b, f) in pairs {
            seen.push(a.to_string());
            seen.push(b.to_string());
            stats.add_pair(a, b, f);
        }
        stats.extend_alphabet(seen);
        stats
    }

    fn extend_alphabet(&mut self, extra: Vec<Phoneme>) {
        let set: BTreeSet<Phoneme> = self.alphabet.drain(..).chain(extra).collect();
        self.alphabet = set.into_iter().collect();
    }

    fn add_pair(&mut self, a: &str, b: &str, freq: f64) {
        if a == b {
            *self.repeats.entry(a.to_string()).or_insert(0.0) += freq;
        } else {
            *self
                .pairs
                .entry((a.to_string(), b.to_string()))
                .or_insert(0.0) += freq;
        }
    }

    fn add_run(&mut self, run: &[Phoneme], freq: f64) {
        for p in run {
            *self.singles.entry(p.clone()).or_insert(0.0) += freq;
        }
        for w in run.windows(2) {
            self.add_pair(&w[0], &w[1], freq);
        }
    }

    pub fn pair(&self, a: &str, b: &str) -> f64 {
        self.pairs
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn single(&self, p: &str) -> f64 {
        self.singles.get(p).copied().unwrap_or(0.0)
    }

    pub fn total_pair_mass(&self) -> f64 {
        self.pairs.values().sum()
    }

    /// Dense `n x n` pair matrix indexed like `alphabet`.
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        let n = self.alphabet.len();
        let index: BTreeMap<&str, usize> = self
            .alphabet
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();
        let mut m = vec![vec![0.0; n]; n];
        for ((a, b), f) in &self.pairs {
            if let (Some(&i), Some(&j)) = (index.get(a.as_str()), index.get(b.as_str())) {
                m[i][j] += f;
            }
        }
        m
    }
}

/// How often each phoneme sits at a given offset from the syllable edges.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionalStats {
    pub from_start: BTreeMap<Phoneme, [f64; MAX_POSITION]>,
    pub from_end: BTreeMap<Phoneme, [f64; MAX_POSITION]>,
}

impl PositionalStats {
    fn add_syllable(&mut self, runs: &SyllableRuns, freq: f64) {
        let flat: Vec<&Phoneme> = runs.runs().flat_map(|(_, run)| run.iter()).collect();
        let len = flat.len();
        for (i, p) in flat.into_iter().enumerate() {
            let start = i.min(MAX_POSITION - 1);
            let end = (len - 1 - i).min(MAX_POSITION - 1);
            self.from_start.entry(p.clone()).or_insert([0.0; MAX_POSITION])[start] += freq;
            self.from_end.entry(p.clone()).or_insert([0.0; MAX_POSITION])[end] += freq;
        }
    }
}

/// Biphoneme counts for all three position groups of one lexicon snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BiphonemeTable {
    groups: [GroupStats; 3],
    pub positional: PositionalStats,
    pub usable_records: usize,
    pub usable_frequency: f64,
    pub unusable_records: usize,
    pub unusable_frequency: f64,
}

impl BiphonemeTable {
    pub fn from_groups(onset: GroupStats, nucleus: GroupStats, coda: GroupStats) -> Self {
        Self {
            groups: [onset, nucleus, coda],
            positional: PositionalStats::default(),
            usable_records: 0,
            usable_frequency: 0.0,
            unusable_records: 0,
            unusable_frequency: 0.0,
        }
    }

    /// Scans the lexicon. Records without phonology, or with a malformed
    /// syllable, are counted as unusable and contribute nothing.
    pub fn build(lexicon: &Lexicon, lang: &LanguageConfig) -> SfResult<Self> {
        let mut table = Self::from_groups(
            GroupStats::new(PositionGroup::Onset, lang.alphabet(PositionGroup::Onset)),
            GroupStats::new(PositionGroup::Nucleus, lang.alphabet(PositionGroup::Nucleus)),
            GroupStats::new(PositionGroup::Coda, lang.alphabet(PositionGroup::Coda)),
        );

        for record in lexicon.iter() {
            let freq = lexicon.frequency(record);
            let Some(split) = split_record(record.syllables.as_slice(), lang)? else {
                debug!("Unusable record '{}'", record.ortho);
                table.unusable_records += 1;
                table.unusable_frequency += freq;
                continue;
            };

            table.usable_records += 1;
            table.usable_frequency += freq;
            for runs in &split {
                for (group, run) in runs.runs() {
                    table.groups[group.index()].add_run(run, freq);
                }
                table.positional.add_syllable(runs, freq);
            }
        }

        if table.unusable_records > 0 {
            warn!(
                "{} records ({:.1} frequency) had no usable phonology",
                table.unusable_records, table.unusable_frequency
            );
        }
        info!(
            "Biphoneme table: {} onset, {} nucleus, {} coda pairs",
            table.groups[0].pairs.len(),
            table.groups[1].pairs.len(),
            table.groups[2].pairs.len()
        );
        Ok(table)
    }

    pub fn group(&self, group: PositionGroup) -> &GroupStats {
        &self.groups[group.index()]
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupStats> {
        self.groups.iter()
    }
}

/// Splits every syllable of a record. `Ok(None)` when the record is unusable.
pub fn split_record(
    syllables: &[Vec<Phoneme>],
    lang: &LanguageConfig,
) -> SfResult<Option<Vec<SyllableRuns>>> {
    if syllables.iter().all(|s| s.is_empty()) {
        return Ok(None);
    }
    let mut out = Vec::with_capacity(syllables.len());
    for syllable in syllables {
        match lang.split_syllable(syllable)? {
            Some(runs) => out.push(runs),
            None => return Ok(None),
        }
    }
    Ok(Some(out))
}
