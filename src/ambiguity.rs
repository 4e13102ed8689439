use crate::biphoneme::split_record;
use crate::error::SfResult;
use crate::lexicon::Lexicon;
use crate::phonology::{LanguageConfig, Phoneme, PositionGroup, SyllableRuns};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

struct Entry {
    ortho: String,
    syllables: Vec<SyllableRuns>,
    frequency: f64,
}

/// Lexical cost of letting two phonemes of a group share one chord: the
/// frequency of words that become indistinguishable from a differently
/// spelled word once the two phonemes are merged.
#[derive(Debug, Clone, Default)]
pub struct MergeAmbiguity {
    alphabets: [Vec<Phoneme>; 3],
    conflicts: [BTreeMap<(Phoneme, Phoneme), f64>; 3],
}

impl MergeAmbiguity {
    pub fn build(lexicon: &Lexicon, lang: &LanguageConfig) -> SfResult<Self> {
        let mut entries = Vec::with_capacity(lexicon.len());
        for record in lexicon.iter() {
            if let Some(syllables) = split_record(&record.syllables, lang)? {
                entries.push(Entry {
                    ortho: record.ortho.clone(),
                    syllables,
                    frequency: lexicon.frequency(record),
                });
            }
        }

        let mut out = Self::default();
        for group in PositionGroup::ALL {
            let mut users: BTreeMap<&Phoneme, Vec<usize>> = BTreeMap::new();
            for (i, entry) in entries.iter().enumerate() {
                let mut seen = BTreeSet::new();
                for runs in &entry.syllables {
                    for p in runs.run(group) {
                        if seen.insert(p) {
                            users.entry(p).or_default().push(i);
                        }
                    }
                }
            }

            let alphabet: Vec<&Phoneme> = users.keys().copied().collect();
            let pairs: Vec<(&Phoneme, &Phoneme)> = alphabet
                .iter()
                .enumerate()
                .flat_map(|(i, p)| alphabet[i + 1..].iter().map(move |q| (*p, *q)))
                .collect();

            let conflicts: Vec<((Phoneme, Phoneme), f64)> = pairs
                .par_iter()
                .map(|&(p, q)| {
                    let mut words: Vec<usize> =
                        users[p].iter().chain(&users[q]).copied().collect();
                    words.sort_unstable();
                    words.dedup();
                    let conflict = merge_conflict(&entries, &words, group, p, q);
                    ((p.clone(), q.clone()), conflict)
                })
                .collect();

            debug!("{}: {} phoneme pairs measured", group, conflicts.len());
            out.alphabets[group.index()] = alphabet.into_iter().cloned().collect();
            out.conflicts[group.index()] = conflicts.into_iter().collect();
        }
        info!("Merge ambiguity measured over {} words", entries.len());
        Ok(out)
    }

    /// Symmetric; 0.0 for phonemes never seen in the group.
    pub fn conflict(&self, group: PositionGroup, p: &str, q: &str) -> f64 {
        let table = &self.conflicts[group.index()];
        let key = if p <= q {
            (p.to_string(), q.to_string())
        } else {
            (q.to_string(), p.to_string())
        };
        table.get(&key).copied().unwrap_or(0.0)
    }

    /// Observed phonemes of the group in symbol order.
    pub fn alphabet(&self, group: PositionGroup) -> &[Phoneme] {
        &self.alphabets[group.index()]
    }

    /// Writes `group,p1,p2,conflict` rows, each unordered pair once.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> SfResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        for group in PositionGroup::ALL {
            let name = group.to_string();
            for ((p, q), conflict) in &self.conflicts[group.index()] {
                let conflict = format!("{:.1}", conflict);
                wtr.write_record([name.as_str(), p.as_str(), q.as_str(), conflict.as_str()])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Pronunciation key with `from` replaced by `to` in `group`.
fn merged_key(syllables: &[SyllableRuns], group: PositionGroup, from: &str, to: &str) -> String {
    let mut key = String::new();
    for (i, runs) in syllables.iter().enumerate() {
        if i > 0 {
            key.push('|');
        }
        for g in PositionGroup::ALL {
            key.push('.');
            for p in runs.run(g) {
                let p = if g == group && p == from { to } else { p.as_str() };
                key.push_str(p);
                key.push(' ');
            }
        }
    }
    key
}

/// Within each merged pronunciation, the heaviest original pronunciation
/// keeps its words; differently spelled words of the others are lost.
fn merge_conflict(
    entries: &[Entry],
    words: &[usize],
    group: PositionGroup,
    p: &str,
    q: &str,
) -> f64 {
    // merged key -> original key -> (mass, spellings)
    let mut buckets: HashMap<String, BTreeMap<String, (f64, BTreeSet<&str>)>> = HashMap::new();
    for &i in words {
        let entry = &entries[i];
        let original = merged_key(&entry.syllables, group, "", "");
        let merged = merged_key(&entry.syllables, group, q, p);
        let slot = buckets
            .entry(merged)
            .or_default()
            .entry(original)
            .or_default();
        slot.0 += entry.frequency;
        slot.1.insert(entry.ortho.as_str());
    }

    let mut conflict = 0.0;
    for originals in buckets.values().filter(|o| o.len() > 1) {
        let Some((_, (_, kept))) = originals
            .iter()
            .max_by(|a, b| a.1 .0.total_cmp(&b.1 .0).then_with(|| b.0.cmp(a.0)))
        else {
            continue;
        };
        for (mass, spellings) in originals.values() {
            if spellings.iter().any(|o| !kept.contains(o)) {
                conflict += mass;
            }
        }
    }
    conflict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::WordRecord;
    use crate::phonology::NucleusPolicy;

    fn word(ortho: &str, syll: &str, freq: f64) -> WordRecord {
        WordRecord::new(ortho, WordRecord::parse_syllables(syll), freq)
    }

    #[test]
    fn test_merging_minimal_pair_costs_lighter_word() {
        let lang = LanguageConfig::from_symbols("ai", "tdpl", NucleusPolicy::Reject).unwrap();
        let lexicon = Lexicon::from_records(vec![
            word("ta", "t_a", 10.0),
            word("da", "d_a", 4.0),
            word("pa", "p_a", 3.0),
            word("li", "l_i", 1.0),
        ]);
        let table = MergeAmbiguity::build(&lexicon, &lang).unwrap();

        assert!((table.conflict(PositionGroup::Onset, "t", "d") - 4.0).abs() < 1e-12);
        assert!((table.conflict(PositionGroup::Onset, "d", "t") - 4.0).abs() < 1e-12);
        assert!((table.conflict(PositionGroup::Onset, "d", "p") - 3.0).abs() < 1e-12);
        assert_eq!(table.conflict(PositionGroup::Onset, "t", "l"), 0.0);
        assert_eq!(table.conflict(PositionGroup::Nucleus, "a", "i"), 0.0);
        assert_eq!(table.alphabet(PositionGroup::Onset), ["d", "l", "p", "t"]);
    }

    #[test]
    fn test_same_spelling_is_not_a_conflict() {
        let lang = LanguageConfig::from_symbols("ai", "tdpl", NucleusPolicy::Reject).unwrap();
        let lexicon = Lexicon::from_records(vec![
            word("ta", "t_a", 10.0),
            word("ta", "d_a", 2.0),
        ]);
        let table = MergeAmbiguity::build(&lexicon, &lang).unwrap();
        assert_eq!(table.conflict(PositionGroup::Onset, "t", "d"), 0.0);
    }
}
