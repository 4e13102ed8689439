use crate::reports;
use clap::Args;
use stenoforge::config::Config;
use stenoforge::error::SfResult;
use stenoforge::fitness::evaluate_population;
use stenoforge::keymap::Keymap;
use stenoforge::scorer::Candidate;
use stenoforge::session::Session;
use stenoforge::theory::Theory;

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub config: Config,

    /// Keymap files to compare. The generated base keymap is always included.
    #[arg(short = 'm', long = "keymap")]
    pub keymaps: Vec<String>,

    #[arg(short, long)]
    pub theory: Option<String>,

    /// Prints the reports as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &ScoreArgs, session: &Session, debug: bool) -> SfResult<()> {
    let scorer = session.scorer(debug)?;
    let theory = match &args.theory {
        Some(path) => Theory::load_from_file(path, &session.keyboard)?,
        None => Theory::identity(),
    };

    let mut keymaps = vec![("base".to_string(), session.base_keymap())];
    for path in &args.keymaps {
        keymaps.push((path.clone(), Keymap::load_from_file(path, &session.keyboard)?));
    }

    let (names, candidates): (Vec<String>, Vec<Candidate>) = keymaps
        .into_iter()
        .map(|(name, keymap)| (name, Candidate::new(keymap, theory.clone())))
        .unzip();
    let mut results = Vec::with_capacity(names.len());
    for (name, scored) in names
        .into_iter()
        .zip(evaluate_population(&scorer, &session.config.weights, &candidates))
    {
        let (fitness, report) = scored?;
        results.push((name, fitness, report));
    }
    results.sort_by(|a, b| a.1.total_cmp(&b.1));

    if args.json {
        let out: Vec<_> = results
            .iter()
            .map(|(name, fitness, report)| {
                serde_json::json!({ "keymap": name, "fitness": fitness, "report": report })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    reports::print_score_report(&results);
    for (name, _, report) in &results {
        println!("\n--- {} ---", name);
        reports::print_coverage(report);
        reports::print_finger_load(report);
        reports::print_ambiguity(&report.ambiguity);
        reports::print_mental_strain(report);
    }
    Ok(())
}
