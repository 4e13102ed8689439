use crate::config::FitnessWeights;
use crate::error::SfResult;
use crate::scorer::{Candidate, ScoreReport, Scorer};
use rayon::prelude::*;

impl ScoreReport {
    /// Uncovered mass over usable mass.
    pub fn uncovered_ratio(&self) -> f64 {
        let usable = self.covered_mass + self.uncovered_mass;
        if usable > 0.0 {
            self.uncovered_mass / usable
        } else {
            0.0
        }
    }

    pub fn misread_ratio(&self) -> f64 {
        let total = self.in_order_mass + self.out_of_order_mass;
        if total > 0.0 {
            self.misread_mass / total
        } else {
            0.0
        }
    }

    pub fn ambiguity_ratio(&self) -> f64 {
        if self.covered_mass > 0.0 {
            self.ambiguity.ambiguity_mass / self.covered_mass
        } else {
            0.0
        }
    }

    /// Weighted sum of the report's figures. Lower is better.
    pub fn fitness(&self, w: &FitnessWeights) -> f64 {
        w.weight_keystrokes * self.avg_keystrokes
            + w.weight_chords * self.avg_chords
            + w.weight_strain * self.avg_strain
            + w.weight_peak_finger * self.peak_finger_share
            + w.weight_uncovered * self.uncovered_ratio()
            + w.weight_multi_rep * self.multi_representation_count as f64
            + w.weight_variation * self.variation_count as f64
            + w.weight_exception * self.exception_count as f64
            + w.weight_disorder * self.out_of_order_ratio()
            + w.weight_misread * self.misread_ratio()
            + w.weight_ambiguity * self.ambiguity_ratio()
    }
}

/// Scores a whole population in parallel, keeping input order.
pub fn evaluate_population(
    scorer: &Scorer,
    weights: &FitnessWeights,
    candidates: &[Candidate],
) -> Vec<SfResult<(f64, ScoreReport)>> {
    candidates
        .par_iter()
        .map(|c| {
            let report = scorer.score(c)?;
            Ok((report.fitness(weights), report))
        })
        .collect()
}
