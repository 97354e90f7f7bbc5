pub mod counter;
pub mod market;
pub mod tick;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::data::{CsvHistory, HistoryStore, ReadOnlyHistory};
use crate::fetch::{NseFetcher, NseSession, RetryPolicy};
use crate::model::time::{format_timestamp, now_ist};
use crate::notify::{AlertDispatcher, LogDispatcher, TelegramDispatcher};

use counter::RunCounter;
use market::MarketState;
pub use tick::{TickOutcome, failure_message, run_tick, run_tick_reported};

/// CLI-facing overrides for the `tick` command (applied over the environment).
#[derive(Debug, Default)]
pub struct TickArgs {
    pub force_market_open: bool,
    pub dry_run: bool,
    pub history_file: Option<PathBuf>,
    pub lookback: Option<usize>,
}

impl MonitorConfig {
    pub fn with_tick_args(mut self, args: &TickArgs) -> Result<Self> {
        self.force_market_open |= args.force_market_open;
        if let Some(path) = &args.history_file {
            self.history_file = path.clone();
        }
        if let Some(n) = args.lookback {
            self.lookback = n;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Entry point for the `tick` command: one tick, then exit.
pub fn run(args: &TickArgs) -> Result<()> {
    let config = MonitorConfig::from_env()
        .context("reading configuration")?
        .with_tick_args(args)?;

    println!("=== straddle-watch tick ===");
    println!("History:  {}", config.history_file.display());
    println!("Lookback: {} rows", config.lookback);
    println!("Expiries: {}", config.expiry_count);
    println!("Forced:   {}", config.force_market_open);
    println!("Dry run:  {}", args.dry_run);
    println!();

    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    rt.block_on(run_async(config, args.dry_run))
}

async fn run_async(config: MonitorConfig, dry_run: bool) -> Result<()> {
    let now = now_ist();
    if config.trading_window.state_at(&now, config.force_market_open) == MarketState::Closed {
        println!("Market closed at {}. Nothing to do.", format_timestamp(&now));
        return Ok(());
    }

    let dispatcher = build_dispatcher(&config, dry_run)?;
    let outcome = tick_once(&config, dispatcher.as_ref(), dry_run, now).await?;
    print_outcome(&outcome);
    Ok(())
}

async fn tick_once(
    config: &MonitorConfig,
    dispatcher: &dyn AlertDispatcher,
    dry_run: bool,
    now: crate::model::Timestamp,
) -> Result<TickOutcome> {
    let client = match NseFetcher::build_client() {
        Ok(c) => c,
        Err(e) => {
            dispatcher.dispatch_error(&failure_message(&now, &e)).await;
            return Err(e);
        }
    };
    let cached = NseSession::load(&config.session_file);
    let fetcher = match NseFetcher::connect(
        client,
        config.nse_base_url.clone(),
        cached,
        RetryPolicy::default(),
        Utc::now(),
    )
    .await
    {
        Ok(f) => f,
        Err(e) => {
            let reason = e.to_string();
            dispatcher
                .dispatch_error(&format!(
                    "Tick at {} aborted, no row written: {reason}",
                    format_timestamp(&now)
                ))
                .await;
            return Ok(TickOutcome::Aborted { reason });
        }
    };
    if let Err(e) = fetcher.session().save(&config.session_file) {
        warn!("could not cache NSE session: {e:#}");
    }

    let csv = CsvHistory::new(&config.history_file);
    let mut store: Box<dyn HistoryStore> = if dry_run {
        Box::new(ReadOnlyHistory::new(csv))
    } else {
        Box::new(csv)
    };

    let outcome = run_tick_reported(config, &fetcher, store.as_mut(), dispatcher, now).await?;

    if !dry_run {
        match RunCounter::new(&config.runlog_dir).increment() {
            Ok(n) => info!("run #{n} done"),
            Err(e) => warn!("could not update run counter: {e:#}"),
        }
    }

    Ok(outcome)
}

fn build_dispatcher(config: &MonitorConfig, dry_run: bool) -> Result<Box<dyn AlertDispatcher>> {
    match (&config.telegram, dry_run) {
        (Some(creds), false) => Ok(Box::new(TelegramDispatcher::new(
            creds.token.clone(),
            creds.chat_id.clone(),
        )?)),
        _ => {
            info!("alerts will be logged only");
            Ok(Box::new(LogDispatcher))
        }
    }
}

fn print_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::MarketClosed => println!("Market closed. Nothing written."),
        TickOutcome::Aborted { reason } => println!("Tick aborted: {reason}"),
        TickOutcome::Completed { row, alerts } => {
            println!(
                "Row {}  VIX {}",
                format_timestamp(&row.timestamp),
                row.vix.map(|v| v.to_string()).unwrap_or_else(|| "—".to_string())
            );
            for (label, s) in &row.series {
                println!(
                    "  {:<18} strike {:>8}  straddle {:>8.2}  IV {:>5.1}  VWAP {:>8}  IVP {:>5}",
                    label.to_string(),
                    s.strike,
                    s.straddle,
                    s.straddle_iv,
                    s.vwap.map(|v| format!("{v:.2}")).unwrap_or_else(|| "—".to_string()),
                    s.ivp.map(|v| format!("{v:.1}")).unwrap_or_else(|| "—".to_string()),
                );
            }
            println!("{} alert(s) sent.", alerts.len());
        }
    }
}
