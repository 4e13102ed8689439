mod common;

use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stenoforge::config::Config;
use stenoforge::keymap::Keymap;
use stenoforge::optimizer::runner::{
    OptimizationOptions, OptimizationResult, Optimizer, ProgressCallback,
};
use stenoforge::scorer::Candidate;
use stenoforge::session::Session;
use stenoforge::theory::Theory;

struct Counter(Arc<AtomicUsize>);

impl ProgressCallback for Counter {
    fn on_progress(&self, _generation: usize, fitness: f64, best: &Keymap) -> bool {
        assert!(fitness.is_finite());
        assert!(best.validate().is_ok());
        self.0.fetch_add(1, Ordering::SeqCst);
        true
    }
}

struct StopAfter(usize);

impl ProgressCallback for StopAfter {
    fn on_progress(&self, generation: usize, _fitness: f64, _best: &Keymap) -> bool {
        generation < self.0
    }
}

fn session() -> Session {
    let mut config = Config::default();
    config.search.population_size = 12;
    config.search.generations = 15;
    config.search.search_patience = 100;
    Session::from_parts(sample_lexicon(), small_language(), small_keyboard(), &config)
        .expect("Failed to build session")
}

fn search<CB: ProgressCallback>(session: &Session, seed: u64, callback: CB) -> OptimizationResult {
    let scorer = Arc::new(session.scorer(false).unwrap());
    let space = Arc::new(session.search_space().unwrap());
    let optimizer = Optimizer::new(scorer, space, OptimizationOptions::from(&session.config));
    let base = session.base_keymap();
    optimizer
        .run(Some(seed), &Theory::identity(), Some(&base), callback)
        .expect("Search failed")
}

#[test]
fn test_seeded_search_is_deterministic() {
    let session = session();
    let calls = Arc::new(AtomicUsize::new(0));
    let a = search(&session, 12345, Counter(calls.clone()));
    let b = search(&session, 12345, Counter(calls.clone()));

    assert_eq!(a.fitness, b.fitness);
    assert_eq!(a.keymap, b.keymap);
    assert_eq!(a.generations, b.generations);
    assert_eq!(calls.load(Ordering::SeqCst), a.generations + b.generations);
}

#[test]
fn test_search_never_loses_to_base_keymap() {
    let session = session();
    let scorer = session.scorer(false).unwrap();
    let base = scorer
        .score(&Candidate::regular(session.base_keymap()))
        .unwrap()
        .fitness(&session.config.weights);

    let result = search(&session, 7, StopAfter(usize::MAX));
    assert!(result.fitness <= base + 1e-9);
    assert!(result.keymap.validate().is_ok());
    assert_eq!(result.report.uncovered_words, 0);
}

#[test]
fn test_callback_can_stop_the_search() {
    let session = session();
    let result = search(&session, 3, StopAfter(2));
    assert_eq!(result.generations, 2);
}
