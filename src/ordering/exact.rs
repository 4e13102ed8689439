use super::insertion::insertion_sequence;
use super::{InsertionOrderer, OrderResult, PhonemeOrderer};
use crate::biphoneme::GroupStats;
use tracing::warn;

/// Hard ceiling on the subset table (2^20 entries).
pub const MAX_EXACT_ALPHABET: usize = 20;

const EPSILON: f64 = 1e-9;

/// Optimal ordering by dynamic programming over subsets.
///
/// `dp[S]` is the best score of any arrangement of `S` as a prefix; appending
/// `p` after `S` settles every pair between `p` and `S`. Alphabets above
/// `limit` fall back to [`InsertionOrderer`].
#[derive(Debug, Clone)]
pub struct ExactOrderer {
    pub limit: usize,
}

impl Default for ExactOrderer {
    fn default() -> Self {
        Self { limit: 16 }
    }
}

impl PhonemeOrderer for ExactOrderer {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn order(&self, stats: &GroupStats) -> OrderResult {
        let n = stats.alphabet.len();
        if n > self.limit.min(MAX_EXACT_ALPHABET) {
            warn!(
                "{} alphabet has {} symbols, above the exact limit; using insertion",
                stats.group, n
            );
            return InsertionOrderer::default().order(stats);
        }

        let w = stats.matrix();
        // Candidates tried in heuristic order so ties resolve the same way every run.
        let seq = insertion_sequence(stats, &w);
        let full = (1usize << n) - 1;
        let mut dp = vec![f64::NEG_INFINITY; full + 1];
        let mut last = vec![usize::MAX; full + 1];
        dp[0] = 0.0;

        for set in 1..=full {
            for &p in &seq {
                let bit = 1 << p;
                if set & bit == 0 {
                    continue;
                }
                let prev = set ^ bit;
                let mut gain = 0.0;
                let mut rest = prev;
                while rest != 0 {
                    let q = rest.trailing_zeros() as usize;
                    gain += w[q][p] - w[p][q];
                    rest &= rest - 1;
                }
                let candidate = dp[prev] + gain;
                if candidate > dp[set] + EPSILON {
                    dp[set] = candidate;
                    last[set] = p;
                }
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut set = full;
        while set != 0 {
            let p = last[set];
            order.push(p);
            set ^= 1 << p;
        }
        order.reverse();

        let permutation = order.into_iter().map(|i| stats.alphabet[i].clone()).collect();
        OrderResult::evaluate(stats, permutation)
    }
}
