use crate::reports;
use clap::Args;
use std::fs::File;
use stenoforge::config::Config;
use stenoforge::error::SfResult;
use stenoforge::ordering::CanonicalOrder;
use stenoforge::phonology::PositionGroup;
use stenoforge::session::Session;

#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    #[command(flatten)]
    pub config: Config,

    /// Writes `group,p1,p2,score` rows for every observed pair.
    #[arg(long)]
    pub pairwise_csv: Option<String>,

    /// Writes `group,p1,p2,conflict` rows: word mass made homophonous by
    /// giving both phonemes one chord.
    #[arg(long)]
    pub ambiguity_csv: Option<String>,

    /// Writes one `group<TAB>order<TAB>ordered<TAB>disordered` line per group.
    #[arg(long)]
    pub summary: Option<String>,

    /// Also prints where each phoneme sits inside its syllable.
    #[arg(long, default_value_t = false)]
    pub positions: bool,

    /// Prints the orders as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &OrderArgs, session: &Session) -> SfResult<()> {
    if let Some(path) = &args.pairwise_csv {
        CanonicalOrder::write_pairwise_csv(&session.table, path)?;
        println!("📝 Pairwise scores written to {}", path);
    }

    if let Some(path) = &args.ambiguity_csv {
        session.ambiguity.write_csv(path)?;
        println!("📝 Merge ambiguity written to {}", path);
    }

    if let Some(path) = &args.summary {
        let mut file = File::create(path)?;
        session.order.write_summary(&mut file)?;
        println!("📝 Order summary written to {}", path);
    }

    if args.json {
        let results: Vec<_> = PositionGroup::ALL
            .iter()
            .map(|g| session.order.result(*g))
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        reports::print_order_report(&session.order);
        if args.positions {
            reports::print_positional(&session.table.positional);
        }
    }
    Ok(())
}
