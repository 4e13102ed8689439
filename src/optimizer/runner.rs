use crate::config::{Config, FitnessWeights};
use crate::error::SfResult;
use crate::keymap::Keymap;
use crate::optimizer::crossover::crossover;
use crate::optimizer::mutation::mutate;
use crate::optimizer::{Genome, SearchSpace};
use crate::scorer::{ScoreReport, Scorer};
use crate::theory::Theory;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct OptimizationOptions {
    pub population_size: usize,
    pub generations: usize,
    pub patience: usize,
    pub patience_threshold: f64,
    pub tournament_size: usize,
    pub elitism: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub weights: FitnessWeights,
    pub max_time: Option<Duration>,
}

impl From<&Config> for OptimizationOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            population_size: cfg.search.population_size,
            generations: cfg.search.generations,
            patience: cfg.search.search_patience,
            patience_threshold: cfg.search.search_patience_threshold,
            tournament_size: cfg.search.tournament_size,
            elitism: cfg.search.elitism,
            crossover_rate: cfg.search.crossover_rate,
            mutation_rate: cfg.search.mutation_rate,
            weights: cfg.weights.clone(),
            max_time: None,
        }
    }
}

pub struct OptimizationResult {
    pub fitness: f64,
    pub report: ScoreReport,
    pub keymap: Keymap,
    pub generations: usize,
}

/// Receives the best keymap after each generation. Returning `false` stops
/// the search.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, generation: usize, fitness: f64, best: &Keymap) -> bool;
}

struct Individual {
    genome: Genome,
    fitness: f64,
    report: ScoreReport,
}

pub struct Optimizer {
    scorer: Arc<Scorer>,
    space: Arc<SearchSpace>,
    options: OptimizationOptions,
}

impl Optimizer {
    pub fn new(scorer: Arc<Scorer>, space: Arc<SearchSpace>, options: OptimizationOptions) -> Self {
        Self {
            scorer,
            space,
            options,
        }
    }

    fn evaluate(&self, genomes: Vec<Genome>, theory: &Theory) -> SfResult<Vec<Individual>> {
        genomes
            .into_par_iter()
            .map(|genome| {
                let keymap = self.space.decode(&genome);
                let report = self.scorer.score_with(&keymap, theory)?;
                Ok(Individual {
                    fitness: report.fitness(&self.options.weights),
                    genome,
                    report,
                })
            })
            .collect()
    }

    fn tournament<'a>(&self, population: &'a [Individual], rng: &mut fastrand::Rng) -> &'a Genome {
        let mut best = &population[rng.usize(0..population.len())];
        for _ in 1..self.options.tournament_size.max(1) {
            let other = &population[rng.usize(0..population.len())];
            if other.fitness < best.fitness {
                best = other;
            }
        }
        &best.genome
    }

    /// Genetic search over keymaps. `seed_keymap`, when given, joins the
    /// first generation; with elitism the result never scores worse than it.
    pub fn run<CB: ProgressCallback>(
        &self,
        seed: Option<u64>,
        theory: &Theory,
        seed_keymap: Option<&Keymap>,
        callback: CB,
    ) -> SfResult<OptimizationResult> {
        let opts = &self.options;
        let size = opts.population_size.max(2);
        let mut rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };

        // 1. Initial population
        let mut genomes = Vec::with_capacity(size);
        if let Some(keymap) = seed_keymap {
            genomes.push(self.space.encode(keymap, &mut rng));
        }
        while genomes.len() < size {
            genomes.push(self.space.random_genome(&mut rng));
        }
        let mut population = self.evaluate(genomes, theory)?;
        sort_population(&mut population);

        let mut best_fitness = population[0].fitness;
        let mut patience_counter = 0;
        let mut generation = 0;
        let start_time = Instant::now();

        // 2. Main loop
        while generation < opts.generations {
            if let Some(limit) = opts.max_time {
                if start_time.elapsed() >= limit {
                    break;
                }
            }
            generation += 1;

            let elite = opts.elitism.min(size);
            let mut next: Vec<Genome> = population[..elite]
                .iter()
                .map(|i| i.genome.clone())
                .collect();
            while next.len() < size {
                let a = self.tournament(&population, &mut rng);
                let mut child = if rng.f64() < opts.crossover_rate {
                    let b = self.tournament(&population, &mut rng);
                    crossover(a, b, &mut rng)
                } else {
                    a.clone()
                };
                if rng.f64() < opts.mutation_rate {
                    mutate(&mut child, &self.space, &mut rng);
                }
                next.push(child);
            }

            population = self.evaluate(next, theory)?;
            sort_population(&mut population);

            let current = population[0].fitness;
            if current < best_fitness - opts.patience_threshold {
                patience_counter = 0;
            } else {
                patience_counter += 1;
            }
            if current < best_fitness {
                best_fitness = current;
            }
            debug!("Generation {}: best {:.5}", generation, current);

            let best_keymap = self.space.decode(&population[0].genome);
            if !callback.on_progress(generation, current, &best_keymap) {
                break;
            }
            if patience_counter >= opts.patience {
                info!("No improvement for {} generations, stopping", opts.patience);
                break;
            }
        }

        let best = population.swap_remove(0);
        Ok(OptimizationResult {
            fitness: best.fitness,
            keymap: self.space.decode(&best.genome),
            report: best.report,
            generations: generation,
        })
    }
}

/// Best first. Ties keep their order so a seeded run is reproducible.
fn sort_population(population: &mut [Individual]) {
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
}
