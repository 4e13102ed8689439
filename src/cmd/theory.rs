use crate::reports;
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use stenoforge::config::Config;
use stenoforge::error::SfResult;
use stenoforge::keymap::Keymap;
use stenoforge::scorer::Candidate;
use stenoforge::session::Session;
use stenoforge::theory::Theory;

#[derive(Args, Debug, Clone)]
pub struct TheoryArgs {
    #[command(flatten)]
    pub config: Config,

    /// Keymap file; the generated base keymap when absent.
    #[arg(short = 'm', long)]
    pub keymap: Option<String>,

    #[arg(short, long)]
    pub theory: Option<String>,

    /// Writes the chord dictionary as TSV.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Saves the keymap used as JSON.
    #[arg(long)]
    pub save_keymap: Option<String>,
}

pub fn run(args: &TheoryArgs, session: &Session, debug: bool) -> SfResult<()> {
    let keymap = match &args.keymap {
        Some(path) => Keymap::load_from_file(path, &session.keyboard)?,
        None => session.base_keymap(),
    };
    let theory = match &args.theory {
        Some(path) => Theory::load_from_file(path, &session.keyboard)?,
        None => Theory::identity(),
    };

    println!("\n=== KEYMAP ({} entries) ===", keymap.len());
    reports::print_keymap(&keymap, &session.keyboard);
    if let Some(path) = &args.save_keymap {
        keymap.save(path, &session.keyboard)?;
        println!("💾 Keymap saved to {}", path);
    }

    let scorer = session.scorer(debug)?;
    let candidate = Candidate::new(keymap, theory);
    let dictionary = scorer.dictionary(&candidate);
    println!(
        "\n📖 Dictionary: {} chord sequences, {} uncovered, {} unusable",
        dictionary.entries.len(),
        dictionary.uncovered_words,
        dictionary.unusable_words
    );
    reports::print_ambiguity(&dictionary.ambiguity());

    if let Some(path) = &args.output {
        let mut out = BufWriter::new(File::create(path)?);
        dictionary.write_tsv(&mut out, &session.keyboard)?;
        println!("📝 Dictionary written to {}", path);
    }
    Ok(())
}
