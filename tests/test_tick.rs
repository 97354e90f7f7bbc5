
use straddle_watch::config::MonitorConfig;
use straddle_watch::data::{HistoryStore, MemoryHistory};
use straddle_watch::engine::Thresholds;
use straddle_watch::fetch::{FetchError, StaticSource};
use straddle_watch::model::{AlertKind, ChainSnapshot, ExpiryRank, IndexId, SeriesLabel};
use straddle_watch::notify::{Dispatched, RecordingDispatcher};
use straddle_watch::run::{TickOutcome, run_tick, run_tick_reported};

use chain_common::*;

fn config() -> MonitorConfig {
    MonitorConfig {
        thresholds: Thresholds {
            vix_high: 16.0,
            ..Thresholds::default()
        },
        ..MonitorConfig::default()
    }
}

fn both_indices(vix: Option<f64>) -> StaticSource {
    StaticSource::new(vix)
        .with_snapshot(IndexId::Nifty, nifty_snapshot())
        .with_snapshot(IndexId::BankNifty, bank_nifty_snapshot())
}

// ── Completed ticks ──────────────────────────────────────────────────

#[tokio::test]
async fn test_tick_appends_one_row_per_tick() {
    let source = both_indices(Some(14.5));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();

    let outcome = run_tick(&config(), &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();

    let TickOutcome::Completed { row, alerts } = outcome else {
        panic!("expected a completed tick");
    };
    assert_eq!(row.timestamp, ts(10, 0));
    assert_eq!(row.vix, Some(14.5));
    assert_eq!(row.series.len(), 3, "NIFTY current, BANKNIFTY current and next");

    let nifty = &row.series[&nifty_current()];
    assert_eq!(nifty.strike, 22500.0);
    assert_eq!(nifty.straddle, 230.0);
    // cold start
    assert_eq!(nifty.vwap, None);
    assert_eq!(nifty.ivp, None);

    assert!(alerts.is_empty());
    assert!(dispatcher.sent().is_empty());
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn test_second_tick_uses_history() {
    let source = both_indices(Some(14.5));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();
    let cfg = config();

    run_tick(&cfg, &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();
    let outcome = run_tick(&cfg, &source, &mut store, &dispatcher, ts(10, 1)).await.unwrap();

    let TickOutcome::Completed { row, .. } = outcome else {
        panic!("expected a completed tick");
    };
    let nifty = &row.series[&nifty_current()];
    assert_eq!(nifty.vwap, Some(230.0));
    assert_eq!(nifty.ivp, Some(0.0));
    assert_eq!(store.rows().len(), 2);
}

#[tokio::test]
async fn test_vix_alert_dispatched_on_completed_tick() {
    let source = both_indices(Some(16.0));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();

    run_tick(&config(), &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();

    let alerts = dispatcher.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::VolatilityIndexThreshold);
    assert!(dispatcher.errors().is_empty());
}

#[tokio::test]
async fn test_missing_vix_is_carried_forward() {
    let mut store = MemoryHistory::new();
    store.append_row(&row_with(ts(9, 30), Some(13.75), &[])).unwrap();
    let dispatcher = RecordingDispatcher::new();

    let outcome = run_tick(&config(), &both_indices(None), &mut store, &dispatcher, ts(10, 0))
        .await
        .unwrap();

    let TickOutcome::Completed { row, .. } = outcome else {
        panic!("expected a completed tick");
    };
    assert_eq!(row.vix, Some(13.75));
    assert_eq!(store.last_vix().unwrap(), Some(13.75));
}

// ── Market state ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_closed_market_has_no_side_effects() {
    let source = both_indices(Some(30.0));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();
    // 2025-03-08 is a Saturday
    let saturday = date(2025, 3, 8).and_hms_opt(11, 0, 0).unwrap();

    let outcome = run_tick(&config(), &source, &mut store, &dispatcher, saturday).await.unwrap();

    assert_eq!(outcome, TickOutcome::MarketClosed);
    assert!(store.rows().is_empty());
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_force_open_overrides_the_clock() {
    let source = both_indices(Some(14.0));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();
    let cfg = MonitorConfig {
        force_market_open: true,
        ..config()
    };
    let late = ts(22, 0);

    let outcome = run_tick(&cfg, &source, &mut store, &dispatcher, late).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Completed { .. }));
    assert_eq!(store.rows().len(), 1);
}

// ── Aborted ticks ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_failure_aborts_without_a_row() {
    let source = StaticSource::new(Some(17.0))
        .with_snapshot(IndexId::Nifty, nifty_snapshot())
        .with_failure(IndexId::BankNifty, FetchError::network("BANKNIFTY", "connection reset"));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();

    let outcome = run_tick(&config(), &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();

    let TickOutcome::Aborted { reason } = outcome else {
        panic!("expected an aborted tick");
    };
    assert!(reason.contains("connection reset"), "{reason}");
    assert!(store.rows().is_empty());

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(&sent[0], Dispatched::Alert(a) if a.kind == AlertKind::VolatilityIndexThreshold));
    assert!(matches!(&sent[1], Dispatched::Error(e) if e.contains("no row written")));
}

#[tokio::test]
async fn test_unusable_snapshot_aborts() {
    let mut broken = ChainSnapshot::new(None);
    broken.insert(date(2025, 3, 6), strike(22500.0, leg(1.0, 1, 1.0), leg(1.0, 1, 1.0)));
    let source = StaticSource::new(Some(14.0))
        .with_snapshot(IndexId::Nifty, broken)
        .with_snapshot(IndexId::BankNifty, bank_nifty_snapshot());
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();

    let outcome = run_tick(&config(), &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();

    assert!(matches!(outcome, TickOutcome::Aborted { .. }));
    assert!(store.rows().is_empty());
    assert!(dispatcher.alerts().is_empty());
    assert_eq!(dispatcher.errors().len(), 1);
}

#[tokio::test]
async fn test_chain_without_expiries_aborts() {
    let source = StaticSource::new(Some(17.0))
        .with_snapshot(IndexId::Nifty, nifty_snapshot())
        .with_snapshot(IndexId::BankNifty, ChainSnapshot::new(Some(48000.0)));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();

    let outcome = run_tick(&config(), &source, &mut store, &dispatcher, ts(10, 0)).await.unwrap();

    let TickOutcome::Aborted { reason } = outcome else {
        panic!("expected an aborted tick");
    };
    assert!(reason.contains("BANKNIFTY"), "{reason}");
    assert!(store.rows().is_empty());
    assert_eq!(dispatcher.alerts().len(), 1, "VIX alert still forwarded");
    assert_eq!(dispatcher.errors().len(), 1);
}

// ── Fatal errors ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_fatal_error_is_dispatched_and_returned() {
    let source = both_indices(Some(14.0));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();
    let cfg = config();

    run_tick_reported(&cfg, &source, &mut store, &dispatcher, ts(10, 5)).await.unwrap();
    assert!(dispatcher.sent().is_empty());

    let result = run_tick_reported(&cfg, &source, &mut store, &dispatcher, ts(10, 5)).await;
    assert!(result.is_err());

    let errors = dispatcher.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed"), "{}", errors[0]);
    assert!(errors[0].contains("2025-03-05 10:05:00"), "{}", errors[0]);
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn test_out_of_order_tick_is_fatal() {
    let source = both_indices(Some(14.0));
    let mut store = MemoryHistory::new();
    let dispatcher = RecordingDispatcher::new();
    let cfg = config();

    run_tick(&cfg, &source, &mut store, &dispatcher, ts(10, 5)).await.unwrap();
    let err = run_tick(&cfg, &source, &mut store, &dispatcher, ts(10, 5)).await;
    assert!(err.is_err());
    assert_eq!(store.rows().len(), 1);
    assert_eq!(
        store.rows()[0].series.keys().copied().collect::<Vec<_>>(),
        vec![
            SeriesLabel::new(IndexId::Nifty, ExpiryRank::Current),
            SeriesLabel::new(IndexId::BankNifty, ExpiryRank::Current),
            SeriesLabel::new(IndexId::BankNifty, ExpiryRank::Next),
        ]
    );
}
