use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use stenoforge::config::FitnessWeights;
use stenoforge::session::Session;
use tracing::error;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, short, long, default_value = "data/lexique.tsv")]
    lexicon: String,

    /// Phoneme group table (`phoneme<TAB>groups`); French when absent.
    #[arg(global = true, short, long)]
    groups: Option<String>,

    /// Keyboard JSON; the Starboard when absent.
    #[arg(global = true, short = 'k', long)]
    keyboard: Option<String>,

    #[arg(global = true, long)]
    weights: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Computes the canonical phoneme order of each group.
    Order(cmd::order::OrderArgs),
    /// Scores keymaps against the lexicon.
    Score(cmd::score::ScoreArgs),
    /// Prints a keymap and builds its chord dictionary.
    Theory(cmd::theory::TheoryArgs),
    /// Searches for a low-strain keymap.
    Search(cmd::search::SearchArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    // 1. Raw matches tell user input apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // 2. Subcommand config and its matches
    let (name, mut config) = match &cli.command {
        Commands::Order(args) => ("order", args.config.clone()),
        Commands::Score(args) => ("score", args.config.clone()),
        Commands::Theory(args) => ("theory", args.config.clone()),
        Commands::Search(args) => ("search", args.config.clone()),
    };

    // 3. Weights file as base, explicit flags on top
    if let Some(path) = &cli.weights {
        println!("⚖️  Loading Weights from: {}", path);
        let mut file_weights = FitnessWeights::load_from_file(path).unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        });
        if let Some(sub_matches) = matches.subcommand_matches(name) {
            file_weights.merge_from_cli(&config.weights, sub_matches);
        }
        config.weights = file_weights;
    }
    if let Err(e) = config.weights.validate() {
        error!("{}", e);
        process::exit(1);
    }

    // 4. Shared state
    println!("\n🚀 Loading lexicon: {}", cli.lexicon);
    let session = Session::load(
        &cli.lexicon,
        cli.groups.as_deref(),
        cli.keyboard.as_deref(),
        &config,
    )
    .unwrap_or_else(|e| {
        eprintln!("\n❌ FATAL ERROR LOADING DATA:");
        eprintln!("   {}", e);
        process::exit(1);
    });

    // 5. Execute
    let result = match &cli.command {
        Commands::Order(args) => cmd::order::run(args, &session),
        Commands::Score(args) => cmd::score::run(args, &session, cli.debug),
        Commands::Theory(args) => cmd::theory::run(args, &session, cli.debug),
        Commands::Search(args) => cmd::search::run(args, &session, cli.debug),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}
