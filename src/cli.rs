use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NIFTY / BANKNIFTY ATM straddle monitor: samples the option chains,
/// records premium, VWAP and IV percentile, and raises threshold alerts.
#[derive(Parser)]
#[command(name = "straddle-watch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one sampling tick (schedule this externally, e.g. every 5 minutes)
    Tick {
        /// Ignore the trading-hours check (off-hours testing)
        #[arg(long)]
        force_market_open: bool,

        /// Log alerts and the derived row without sending or writing anything
        #[arg(long)]
        dry_run: bool,

        /// History CSV to read and append to (overrides HISTORY_FILE)
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Look-back window in rows for VWAP and IVP (overrides LOOKBACK_WINDOW)
        #[arg(long)]
        lookback: Option<usize>,
    },

    /// Print the most recent rows recorded for one index/expiry series
    History {
        /// Index symbol: NIFTY or BANKNIFTY
        #[arg(long, default_value = "NIFTY")]
        index: String,

        /// Expiry rank: current or next
        #[arg(long, default_value = "current")]
        rank: String,

        /// Number of rows to show
        #[arg(long, default_value = "10")]
        limit: usize,

        /// History CSV (overrides HISTORY_FILE)
        #[arg(long)]
        history_file: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}
