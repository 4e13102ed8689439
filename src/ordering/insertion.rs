use super::{OrderResult, PhonemeOrderer};
use crate::biphoneme::GroupStats;

const EPSILON: f64 = 1e-9;

/// Greedy insertion heuristic followed by a single-phoneme reinsertion sweep.
///
/// Phonemes are inserted by decreasing incident pair mass; ties go to the
/// phoneme with the larger single-occurrence frequency, then to symbol order.
/// Each one lands at the insertion point with the best running score, the
/// earliest point winning ties.
#[derive(Debug, Clone)]
pub struct InsertionOrderer {
    pub max_sweeps: usize,
}

impl Default for InsertionOrderer {
    fn default() -> Self {
        Self { max_sweeps: 64 }
    }
}

/// Best insertion point for `p` in `order`, with its net gain.
fn best_slot(w: &[Vec<f64>], order: &[usize], p: usize) -> (usize, f64) {
    // Everything after p at first: p -> q is in order.
    let mut gain: f64 = order.iter().map(|&q| w[p][q] - w[q][p]).sum();
    let mut best = (0, gain);
    for (k, &q) in order.iter().enumerate() {
        // Moving q before p flips its contribution.
        gain += 2.0 * (w[q][p] - w[p][q]);
        if gain > best.1 + EPSILON {
            best = (k + 1, gain);
        }
    }
    best
}

/// Insertion sequence: heaviest incident mass first.
pub(crate) fn insertion_sequence(stats: &GroupStats, w: &[Vec<f64>]) -> Vec<usize> {
    let n = stats.alphabet.len();
    let incident: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| w[i][j] + w[j][i]).sum())
        .collect();
    let mut seq: Vec<usize> = (0..n).collect();
    seq.sort_by(|&a, &b| {
        incident[b]
            .total_cmp(&incident[a])
            .then_with(|| {
                stats
                    .single(&stats.alphabet[b])
                    .total_cmp(&stats.single(&stats.alphabet[a]))
            })
            .then_with(|| stats.alphabet[a].cmp(&stats.alphabet[b]))
    });
    seq
}

impl PhonemeOrderer for InsertionOrderer {
    fn name(&self) -> &'static str {
        "insertion"
    }

    fn order(&self, stats: &GroupStats) -> OrderResult {
        let w = stats.matrix();
        let sequence = insertion_sequence(stats, &w);

        let mut order: Vec<usize> = Vec::with_capacity(sequence.len());
        for &p in &sequence {
            let (slot, _) = best_slot(&w, &order, p);
            order.insert(slot, p);
        }

        // Reinsertion sweep until a full pass finds no strict improvement.
        for _ in 0..self.max_sweeps {
            let mut improved = false;
            for &p in &sequence {
                let Some(pos) = order.iter().position(|&x| x == p) else {
                    continue;
                };
                order.remove(pos);
                let current = slot_gain(&w, &order, p, pos);
                let (slot, best) = best_slot(&w, &order, p);
                if best > current + EPSILON {
                    order.insert(slot, p);
                    improved = true;
                } else {
                    order.insert(pos, p);
                }
            }
            if !improved {
                break;
            }
        }

        let permutation = order.into_iter().map(|i| stats.alphabet[i].clone()).collect();
        OrderResult::evaluate(stats, permutation)
    }
}

/// Net gain of `p` sitting after `order[..k]` and before `order[k..]`.
fn slot_gain(w: &[Vec<f64>], order: &[usize], p: usize, k: usize) -> f64 {
    let before: f64 = order[..k].iter().map(|&q| w[q][p] - w[p][q]).sum();
    let after: f64 = order[k..].iter().map(|&q| w[p][q] - w[q][p]).sum();
    before + after
}
