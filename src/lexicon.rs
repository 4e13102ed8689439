use crate::config::LexiconColumns;
use crate::error::{SfResult, StenoForgeError};
use crate::phonology::{Phoneme, SILENT_MARKER};
use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// One lexicon entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct WordRecord {
    pub ortho: String,
    pub lemma: Option<String>,
    /// Phonological syllables, each an ordered phoneme list.
    pub syllables: Vec<Vec<Phoneme>>,
    /// Graphemic syllables parallel to `syllables`; may be empty.
    pub grapheme_syllables: Vec<String>,
    /// One value per corpus.
    pub frequencies: Vec<f64>,
}

impl WordRecord {
    pub fn new(ortho: &str, syllables: Vec<Vec<Phoneme>>, frequency: f64) -> Self {
        Self {
            ortho: ortho.to_string(),
            lemma: None,
            syllables,
            grapheme_syllables: Vec::new(),
            frequencies: vec![frequency],
        }
    }

    /// Parses `p1_p2|p3_p4` syllable notation.
    pub fn parse_syllables(raw: &str) -> Vec<Vec<Phoneme>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        raw.split('|')
            .map(|syll| {
                syll.split('_')
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|syll| !syll.is_empty())
            .collect()
    }

    /// Graphemic syllables with their `_` separators removed.
    pub fn parse_grapheme_syllables(raw: &str) -> Vec<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        raw.split('|')
            .map(|syll| syll.replace(['_', '#'], ""))
            .collect()
    }

    pub fn has_phonology(&self) -> bool {
        self.syllables.iter().any(|s| !s.is_empty())
    }

    /// Key grouping homophones: the full pronunciation with syllable breaks.
    /// Silent markers are not part of it.
    pub fn pronunciation(&self) -> String {
        self.syllable_names().join("|")
    }

    /// Each phonological syllable as one string, silent markers removed.
    /// Syllables that held nothing but a silent marker are dropped.
    pub fn syllable_names(&self) -> Vec<String> {
        self.syllables
            .iter()
            .map(|s| {
                s.iter()
                    .filter(|p| p.as_str() != SILENT_MARKER)
                    .map(String::as_str)
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Spelling of each phonological syllable, when the graphemic breakdown
    /// lines up with the phonological one.
    pub fn syllable_spellings(&self) -> Option<&[String]> {
        let spoken = self
            .syllables
            .iter()
            .filter(|s| s.iter().any(|p| p.as_str() != SILENT_MARKER))
            .count();
        (spoken > 0 && self.grapheme_syllables.len() == spoken)
            .then_some(self.grapheme_syllables.as_slice())
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.ortho
            .cmp(&other.ortho)
            .then_with(|| self.syllables.cmp(&other.syllables))
            .then_with(|| self.grapheme_syllables.cmp(&other.grapheme_syllables))
            .then_with(|| self.lemma.cmp(&other.lemma))
            .then_with(|| {
                self.frequencies
                    .iter()
                    .zip(&other.frequencies)
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| self.frequencies.len().cmp(&other.frequencies.len()))
            })
    }
}

/// Read-only ordered view over word records.
///
/// Aggregations walk the records in a canonical order, so any statistic
/// computed through [`Lexicon::iter`] is independent of input order.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    records: Vec<WordRecord>,
    canonical: Vec<usize>,
    mix: Vec<f64>,
}

impl Lexicon {
    /// Plain sum over corpora.
    pub fn from_records(records: Vec<WordRecord>) -> Self {
        Self::with_mix(records, Vec::new())
    }

    /// `mix[i]` weighs corpus `i`; corpora without a weight count 1.0.
    pub fn with_mix(records: Vec<WordRecord>, mix: Vec<f64>) -> Self {
        let mut canonical: Vec<usize> = (0..records.len()).collect();
        canonical.sort_by(|&a, &b| records[a].canonical_cmp(&records[b]));
        Self {
            records,
            canonical,
            mix,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P, columns: &LexiconColumns) -> SfResult<Self> {
        let path = path.as_ref();
        info!("Loading lexicon from {}", path.display());
        let file = File::open(path)?;
        Self::load_from_reader(file, columns)
    }

    pub fn load_from_reader<R: std::io::Read>(reader: R, columns: &LexiconColumns) -> SfResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                StenoForgeError::Configuration(format!("Lexicon has no '{}' column", name))
            })
        };

        let ortho_idx = require(columns.col_ortho.as_str())?;
        let syll_idx = require(columns.col_syllables.as_str())?;
        let graph_idx = find(columns.col_graphemes.as_str());
        let lemma_idx = find(columns.col_lemma.as_str());
        let freq_idx = columns
            .get_frequency_columns()
            .iter()
            .map(|c| require(c.as_str()))
            .collect::<SfResult<Vec<usize>>>()?;
        let mix = columns.get_frequency_mix()?;

        let mut records = Vec::new();
        let mut bad_rows = 0usize;
        for result in rdr.records() {
            let rec = match result {
                Ok(rec) => rec,
                Err(e) => {
                    debug!("Skipping unreadable lexicon row: {}", e);
                    bad_rows += 1;
                    continue;
                }
            };
            let Some(ortho) = rec.get(ortho_idx).map(str::trim) else {
                bad_rows += 1;
                continue;
            };
            if ortho.is_empty() || ortho.starts_with('#') {
                continue;
            }

            let mut frequencies = Vec::with_capacity(freq_idx.len());
            for &i in &freq_idx {
                let value = rec
                    .get(i)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| v.replace(',', ".").parse::<f64>());
                match value {
                    Some(Ok(v)) if v.is_finite() && v >= 0.0 => frequencies.push(v),
                    None => frequencies.push(0.0),
                    _ => {
                        bad_rows += 1;
                        frequencies.clear();
                        break;
                    }
                }
            }
            if frequencies.len() != freq_idx.len() {
                continue;
            }

            records.push(WordRecord {
                ortho: ortho.to_string(),
                lemma: lemma_idx
                    .and_then(|i| rec.get(i))
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
                syllables: WordRecord::parse_syllables(rec.get(syll_idx).unwrap_or("")),
                grapheme_syllables: graph_idx
                    .and_then(|i| rec.get(i))
                    .map(WordRecord::parse_grapheme_syllables)
                    .unwrap_or_default(),
                frequencies,
            });
        }

        if bad_rows > 0 {
            warn!("Skipped {} malformed lexicon rows", bad_rows);
        }
        info!("Loaded {} lexicon records", records.len());
        Ok(Self::with_mix(records, mix))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in input order.
    pub fn records(&self) -> &[WordRecord] {
        &self.records
    }

    /// Records in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &WordRecord> {
        self.canonical.iter().map(move |&i| &self.records[i])
    }

    /// The record's corpus frequencies combined with the configured mix.
    pub fn frequency(&self, record: &WordRecord) -> f64 {
        record
            .frequencies
            .iter()
            .enumerate()
            .map(|(i, f)| f * self.mix.get(i).copied().unwrap_or(1.0))
            .sum()
    }
}
