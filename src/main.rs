use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use straddle_watch::config::MonitorConfig;
use straddle_watch::model::SeriesLabel;
use straddle_watch::{history, run};

mod cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Tick {
            force_market_open,
            dry_run,
            history_file,
            lookback,
        } => run::run(&run::TickArgs {
            force_market_open,
            dry_run,
            history_file,
            lookback,
        }),
        cli::Command::History {
            index,
            rank,
            limit,
            history_file,
        } => {
            let label = SeriesLabel::new(
                index.parse().map_err(|e: String| anyhow!(e))?,
                rank.parse().map_err(|e: String| anyhow!(e))?,
            );
            let history_file = match history_file {
                Some(p) => p,
                None => MonitorConfig::from_env()?.history_file,
            };
            history::run(&history_file, label, limit)
        }
        cli::Command::Config => {
            MonitorConfig::from_env()?.print();
            Ok(())
        }
    }
}
