pub mod exact;
pub mod insertion;

pub use exact::ExactOrderer;
pub use insertion::InsertionOrderer;

use crate::biphoneme::{BiphonemeTable, GroupStats};
use crate::error::SfResult;
use crate::phonology::{Phoneme, PositionGroup};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisorderedPair {
    /// Recorded as `first` followed by `second`, but `second` ranks earlier.
    pub first: Phoneme,
    pub second: Phoneme,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub group: PositionGroup,
    pub permutation: Vec<Phoneme>,
    pub ordered_score: f64,
    /// Always `<= 0`.
    pub disordered_score: f64,
    /// Heaviest first.
    pub disordered_pairs: Vec<DisorderedPair>,
}

impl OrderResult {
    /// Scores `permutation` against the group's pair table.
    pub fn evaluate(stats: &GroupStats, permutation: Vec<Phoneme>) -> Self {
        let rank: HashMap<&str, usize> = permutation
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut ordered = 0.0;
        let mut disordered = 0.0;
        let mut pairs = Vec::new();
        for ((a, b), &f) in &stats.pairs {
            let ra = rank.get(a.as_str()).copied().unwrap_or(usize::MAX);
            let rb = rank.get(b.as_str()).copied().unwrap_or(usize::MAX);
            if ra < rb {
                ordered += f;
            } else {
                disordered += f;
                pairs.push(DisorderedPair {
                    first: a.clone(),
                    second: b.clone(),
                    frequency: f,
                });
            }
        }
        pairs.sort_by(|x, y| {
            y.frequency
                .total_cmp(&x.frequency)
                .then_with(|| x.first.cmp(&y.first))
                .then_with(|| x.second.cmp(&y.second))
        });

        Self {
            group: stats.group,
            permutation,
            ordered_score: ordered,
            disordered_score: -disordered,
            disordered_pairs: pairs,
        }
    }

    pub fn total_score(&self) -> f64 {
        self.ordered_score + self.disordered_score
    }
}

/// Strategy producing a total order of one group's alphabet.
pub trait PhonemeOrderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn order(&self, stats: &GroupStats) -> OrderResult;
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OrdererKind {
    /// Exact for small alphabets, insertion heuristic otherwise.
    #[default]
    Auto,
    Insertion,
    Exact,
}

/// Exact below `exact_limit` symbols, insertion heuristic above.
pub struct AutoOrderer {
    pub exact_limit: usize,
}

impl PhonemeOrderer for AutoOrderer {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn order(&self, stats: &GroupStats) -> OrderResult {
        if stats.alphabet.len() <= self.exact_limit {
            ExactOrderer {
                limit: self.exact_limit,
            }
            .order(stats)
        } else {
            InsertionOrderer::default().order(stats)
        }
    }
}

pub fn build_orderer(kind: OrdererKind, exact_limit: usize) -> Box<dyn PhonemeOrderer> {
    match kind {
        OrdererKind::Auto => Box::new(AutoOrderer { exact_limit }),
        OrdererKind::Insertion => Box::new(InsertionOrderer::default()),
        OrdererKind::Exact => Box::new(ExactOrderer { limit: exact_limit }),
    }
}

/// Per-group canonical orders with rank lookup.
#[derive(Debug, Clone)]
pub struct CanonicalOrder {
    results: [OrderResult; 3],
    ranks: [HashMap<Phoneme, usize>; 3],
}

impl CanonicalOrder {
    pub fn compute(table: &BiphonemeTable, orderer: &dyn PhonemeOrderer) -> Self {
        let [onset, nucleus, coda] = PositionGroup::ALL.map(|g| {
            let result = orderer.order(table.group(g));
            info!(
                "{} order ({}): {} | ordered {:.1}, disordered {:.1}",
                g,
                orderer.name(),
                result.permutation.concat(),
                result.ordered_score,
                result.disordered_score
            );
            result
        });
        Self::from_results(onset, nucleus, coda)
    }

    pub fn from_results(onset: OrderResult, nucleus: OrderResult, coda: OrderResult) -> Self {
        let results = [onset, nucleus, coda];
        let ranks = [0, 1, 2].map(|i| {
            results[i]
                .permutation
                .iter()
                .enumerate()
                .map(|(r, p)| (p.clone(), r))
                .collect()
        });
        Self { results, ranks }
    }

    pub fn result(&self, group: PositionGroup) -> &OrderResult {
        &self.results[group.index()]
    }

    pub fn rank(&self, group: PositionGroup, phoneme: &str) -> Option<usize> {
        self.ranks[group.index()].get(phoneme).copied()
    }

    /// Writes `group,p1,p2,score` rows where score is `f(p1,p2) - f(p2,p1)`.
    pub fn write_pairwise_csv<P: AsRef<Path>>(table: &BiphonemeTable, path: P) -> SfResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        for stats in table.groups() {
            let group = stats.group.to_string();
            for p1 in &stats.alphabet {
                for p2 in &stats.alphabet {
                    if p1 == p2 {
                        continue;
                    }
                    let score = format!("{:.1}", stats.pair(p1, p2) - stats.pair(p2, p1));
                    wtr.write_record([group.as_str(), p1.as_str(), p2.as_str(), score.as_str()])?;
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }

    /// Human readable dump of the three orders.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> SfResult<()> {
        for r in &self.results {
            writeln!(
                out,
                "{}\t{}\t{:.1}\t{:.1}",
                r.group,
                r.permutation.join(" "),
                r.ordered_score,
                r.disordered_score
            )?;
        }
        Ok(())
    }
}
