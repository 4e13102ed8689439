use crate::reports;
use clap::Args;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stenoforge::config::Config;
use stenoforge::error::SfResult;
use stenoforge::keymap::Keymap;
use stenoforge::optimizer::{OptimizationOptions, Optimizer, ProgressCallback};
use stenoforge::session::Session;
use stenoforge::theory::Theory;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    /// Time limit in seconds.
    #[arg(short = 'T', long)]
    pub time: Option<u64>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    #[arg(short, long)]
    pub theory: Option<String>,

    /// Where to save the best keymap.
    #[arg(short, long)]
    pub output: Option<String>,
}

struct ConsoleProgress {
    start: Instant,
    interval: usize,
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, generation: usize, fitness: f64, best: &Keymap) -> bool {
        if generation % self.interval == 0 {
            println!(
                "Gen {:5} | Best: {:.5} | {} entries | {:.1}s",
                generation,
                fitness,
                best.len(),
                self.start.elapsed().as_secs_f32()
            );
        }
        true
    }
}

pub fn run(args: &SearchArgs, session: &Session, debug: bool) -> SfResult<()> {
    let scorer = Arc::new(session.scorer(debug)?);
    let space = Arc::new(session.search_space()?);
    let theory = match &args.theory {
        Some(path) => Theory::load_from_file(path, &session.keyboard)?,
        None => Theory::identity(),
    };

    let mut options = OptimizationOptions::from(&session.config);
    options.max_time = args.time.map(Duration::from_secs);
    println!(
        "🧬 Searching {} genes, population {}, up to {} generations",
        space.gene_count(),
        options.population_size,
        options.generations
    );

    let base = session.base_keymap();
    let optimizer = Optimizer::new(scorer, space, options);
    let progress = ConsoleProgress {
        start: Instant::now(),
        interval: if debug { 1 } else { 10 },
    };
    let result = optimizer.run(args.seed, &theory, Some(&base), progress)?;

    println!("\n=== 🏆 FINAL RESULT ===");
    println!(
        "Fitness: {:.5} after {} generations",
        result.fitness, result.generations
    );
    reports::print_keymap(&result.keymap, &session.keyboard);
    reports::print_score_report(&[("best".to_string(), result.fitness, result.report.clone())]);
    reports::print_coverage(&result.report);
    reports::print_finger_load(&result.report);
    reports::print_mental_strain(&result.report);

    if let Some(path) = &args.output {
        result.keymap.save(path, &session.keyboard)?;
        println!("💾 Keymap saved to {}", path);
    }
    Ok(())
}
