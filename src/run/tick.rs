use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::data::HistoryStore;
use crate::engine::{self, alerts, interpret};
use crate::fetch::SnapshotSource;
use crate::model::time::format_timestamp;
use crate::model::{AlertEvent, AtmStraddle, DerivedRow, HistorySlice, IndexId, Timestamp};
use crate::notify::AlertDispatcher;

use super::market::MarketState;

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Outside trading hours; nothing fetched, written or sent.
    MarketClosed,
    /// Snapshot data was unusable. No row was written; the reason went out
    /// as an error message along with any VIX alert.
    Aborted { reason: String },
    /// A row was appended and its alerts dispatched.
    Completed { row: DerivedRow, alerts: Vec<AlertEvent> },
}

/// Run one sampling tick at `now`.
///
/// Both index snapshots must arrive and resolve for anything to be written.
/// Errors returned from here are fatal to the tick (store failures and the
/// like); the caller reports them and exits.
pub async fn run_tick(
    config: &MonitorConfig,
    source: &dyn SnapshotSource,
    store: &mut dyn HistoryStore,
    dispatcher: &dyn AlertDispatcher,
    now: Timestamp,
) -> Result<TickOutcome> {
    if config.trading_window.state_at(&now, config.force_market_open) == MarketState::Closed {
        info!("market closed at {}, skipping tick", format_timestamp(&now));
        return Ok(TickOutcome::MarketClosed);
    }

    let (vix, nifty, bank_nifty) = tokio::join!(
        source.fetch_volatility_index(),
        source.fetch_snapshot(IndexId::Nifty),
        source.fetch_snapshot(IndexId::BankNifty),
    );

    let vix = match vix {
        Some(v) => Some(v),
        None => {
            let last = store.last_vix().context("reading last VIX for forward fill")?;
            warn!("VIX unavailable, carrying forward {:?}", last);
            last
        }
    };
    let vix_alert = alerts::vix_alert(vix, &config.thresholds, &now);

    let mut failures = Vec::new();
    let mut straddles: Vec<AtmStraddle> = Vec::new();
    for (index, fetched) in [(IndexId::Nifty, nifty), (IndexId::BankNifty, bank_nifty)] {
        match fetched {
            Ok(snapshot) => match interpret(index, &snapshot, config.expiry_count) {
                Ok(found) if found.is_empty() => failures.push(format!("{index}: option chain lists no expiries")),
                Ok(found) => straddles.extend(found),
                Err(e) => failures.push(e.to_string()),
            },
            Err(e) => failures.push(e.to_string()),
        }
    }

    if !failures.is_empty() {
        let reason = failures.join("; ");
        warn!("tick aborted: {reason}");
        if let Some(alert) = &vix_alert {
            dispatcher.dispatch(alert).await;
        }
        dispatcher
            .dispatch_error(&format!(
                "Tick at {} aborted, no row written: {reason}",
                format_timestamp(&now)
            ))
            .await;
        return Ok(TickOutcome::Aborted { reason });
    }

    let mut series: Vec<(AtmStraddle, HistorySlice)> = Vec::with_capacity(straddles.len());
    for atm in straddles {
        let history = store
            .read_recent_slice(atm.label, config.lookback)
            .with_context(|| format!("reading history for {}", atm.label))?;
        series.push((atm, history));
    }

    let row = engine::build_row(now, vix, series);
    let alerts = engine::evaluate_row(&row, &config.thresholds);

    store.append_row(&row).context("appending history row")?;
    for (label, stats) in &row.series {
        info!(
            series = %label,
            strike = stats.strike,
            straddle = stats.straddle,
            iv = stats.straddle_iv,
            vwap = ?stats.vwap,
            ivp = ?stats.ivp,
            "recorded"
        );
    }

    for alert in &alerts {
        dispatcher.dispatch(alert).await;
    }

    Ok(TickOutcome::Completed { row, alerts })
}

/// [`run_tick`], with any error that escapes it sent out as an error
/// message before being handed back to the caller.
pub async fn run_tick_reported(
    config: &MonitorConfig,
    source: &dyn SnapshotSource,
    store: &mut dyn HistoryStore,
    dispatcher: &dyn AlertDispatcher,
    now: Timestamp,
) -> Result<TickOutcome> {
    match run_tick(config, source, store, dispatcher, now).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            dispatcher.dispatch_error(&failure_message(&now, &e)).await;
            Err(e)
        }
    }
}

pub fn failure_message(now: &Timestamp, e: &anyhow::Error) -> String {
    format!("Tick at {} failed: {e:#}", format_timestamp(now))
}
