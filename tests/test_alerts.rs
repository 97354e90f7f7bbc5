
use straddle_watch::engine::alerts::{VIX_SUBJECT, ivp_alert, premium_alert, vix_alert};
use straddle_watch::engine::{Thresholds, evaluate_row};
use straddle_watch::model::{AlertKind, SeriesStats};

use chain_common::*;

fn with_stats(ivp: Option<f64>, vwap: Option<f64>, straddle: f64) -> SeriesStats {
    SeriesStats {
        ivp,
        vwap,
        ..stats(straddle, 1800, 29.0)
    }
}

// ── VIX ──────────────────────────────────────────────────────────────

#[test]
fn test_vix_band_edges_fire() {
    let t = Thresholds {
        vix_low: 11.0,
        vix_high: 16.0,
        ..Thresholds::default()
    };
    let now = ts(10, 0);

    let alert = vix_alert(Some(16.0), &t, &now).expect("VIX at the high edge fires");
    assert_eq!(alert.kind, AlertKind::VolatilityIndexThreshold);
    assert_eq!(alert.subject, VIX_SUBJECT);
    assert!(alert.message.contains("VIX=16"), "{}", alert.message);
    assert!(alert.message.contains("2025-03-05 10:00:00"), "{}", alert.message);
    assert_eq!(alert.timestamp, now);

    assert!(vix_alert(Some(11.0), &t, &now).unwrap().message.contains("LOW"));
    assert!(vix_alert(Some(15.99), &t, &now).is_none());
    assert!(vix_alert(None, &t, &now).is_none());
}

// ── IVP ──────────────────────────────────────────────────────────────

#[test]
fn test_ivp_band_edges_stay_quiet() {
    let t = Thresholds::default();
    let label = nifty_current();
    let now = ts(10, 0);

    assert!(ivp_alert(&label, &with_stats(Some(90.0), None, 230.0), &t, &now).is_none());
    assert!(ivp_alert(&label, &with_stats(Some(10.0), None, 230.0), &t, &now).is_none());
    assert!(ivp_alert(&label, &with_stats(None, None, 230.0), &t, &now).is_none());

    let high = ivp_alert(&label, &with_stats(Some(90.1), None, 230.0), &t, &now).unwrap();
    assert_eq!(high.kind, AlertKind::IvpThreshold);
    assert_eq!(high.subject, "NIFTY_current");
    assert!(high.message.contains("HIGH"));

    let low = ivp_alert(&label, &with_stats(Some(0.0), None, 230.0), &t, &now).unwrap();
    assert!(low.message.contains("LOW"));
}

// ── Premium vs VWAP ──────────────────────────────────────────────────

#[test]
fn test_premium_outside_vwap_band() {
    let t = Thresholds::default();
    let label = nifty_current();
    let now = ts(10, 0);

    let above = premium_alert(&label, &with_stats(None, Some(200.0), 230.0), &t, &now).unwrap();
    assert_eq!(above.kind, AlertKind::PremiumVsVwapThreshold);
    assert!(above.message.contains("ABOVE"));

    let below = premium_alert(&label, &with_stats(None, Some(200.0), 170.0), &t, &now).unwrap();
    assert!(below.message.contains("BELOW"));

    assert!(premium_alert(&label, &with_stats(None, Some(200.0), 210.0), &t, &now).is_none());
}

#[test]
fn test_premium_needs_a_usable_vwap() {
    let t = Thresholds::default();
    let label = nifty_current();
    let now = ts(10, 0);
    assert!(premium_alert(&label, &with_stats(None, None, 230.0), &t, &now).is_none());
    assert!(premium_alert(&label, &with_stats(None, Some(0.0), 230.0), &t, &now).is_none());
}

// ── Whole row ────────────────────────────────────────────────────────

#[test]
fn test_evaluate_row_collects_every_alert() {
    let t = Thresholds::default();
    let row = row_with(
        ts(10, 0),
        Some(22.0),
        &[(nifty_current(), with_stats(Some(95.0), Some(200.0), 230.0))],
    );
    let alerts = evaluate_row(&row, &t);
    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AlertKind::VolatilityIndexThreshold,
            AlertKind::IvpThreshold,
            AlertKind::PremiumVsVwapThreshold
        ]
    );
}

#[test]
fn test_quiet_row_has_no_alerts() {
    let row = row_with(
        ts(10, 0),
        Some(15.0),
        &[(nifty_current(), with_stats(Some(50.0), Some(230.0), 230.0))],
    );
    assert!(evaluate_row(&row, &Thresholds::default()).is_empty());
}
