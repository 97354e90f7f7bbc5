use crate::model::time::format_timestamp;
use crate::model::{AlertEvent, AlertKind, DerivedRow, SeriesLabel, SeriesStats, Timestamp};

pub const VIX_SUBJECT: &str = "INDIA VIX";

/// Alert bands. Each pair is `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub vix_low: f64,
    pub vix_high: f64,
    pub ivp_low: f64,
    pub ivp_high: f64,
    pub vwap_factor_low: f64,
    pub vwap_factor_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            vix_low: 11.0,
            vix_high: 20.0,
            ivp_low: 10.0,
            ivp_high: 90.0,
            vwap_factor_low: 0.9,
            vwap_factor_high: 1.1,
        }
    }
}

/// Fires when VIX is at or beyond either band edge (inclusive).
pub fn vix_alert(vix: Option<f64>, t: &Thresholds, ts: &Timestamp) -> Option<AlertEvent> {
    let vix = vix?;
    let side = if vix >= t.vix_high {
        "HIGH"
    } else if vix <= t.vix_low {
        "LOW"
    } else {
        return None;
    };

    Some(AlertEvent {
        kind: AlertKind::VolatilityIndexThreshold,
        subject: VIX_SUBJECT.to_string(),
        message: format!(
            "⚠️ {VIX_SUBJECT} {side}: VIX={vix} (band {} – {}) at {}",
            t.vix_low,
            t.vix_high,
            format_timestamp(ts)
        ),
        timestamp: *ts,
    })
}

/// Fires when IVP is strictly outside the band. Boundary values stay quiet.
pub fn ivp_alert(label: &SeriesLabel, stats: &SeriesStats, t: &Thresholds, ts: &Timestamp) -> Option<AlertEvent> {
    let ivp = stats.ivp?;
    let side = if ivp > t.ivp_high {
        "HIGH"
    } else if ivp < t.ivp_low {
        "LOW"
    } else {
        return None;
    };

    Some(AlertEvent {
        kind: AlertKind::IvpThreshold,
        subject: label.to_string(),
        message: format!(
            "📈 {label} IVP {side}: IVP={ivp} (band {} – {}), straddle IV={} strike={} expiry={} at {}",
            t.ivp_low,
            t.ivp_high,
            stats.straddle_iv,
            stats.strike,
            stats.expiry,
            format_timestamp(ts)
        ),
        timestamp: *ts,
    })
}

/// Fires when the straddle premium leaves `[factor_low × VWAP, factor_high × VWAP]`.
/// Needs a non-null, non-zero VWAP.
pub fn premium_alert(
    label: &SeriesLabel,
    stats: &SeriesStats,
    t: &Thresholds,
    ts: &Timestamp,
) -> Option<AlertEvent> {
    let vwap = stats.vwap.filter(|v| *v != 0.0)?;
    let premium = stats.straddle;
    let (side, factor) = if premium > t.vwap_factor_high * vwap {
        ("ABOVE", t.vwap_factor_high)
    } else if premium < t.vwap_factor_low * vwap {
        ("BELOW", t.vwap_factor_low)
    } else {
        return None;
    };

    Some(AlertEvent {
        kind: AlertKind::PremiumVsVwapThreshold,
        subject: label.to_string(),
        message: format!(
            "💰 {label} straddle {side} {factor}×VWAP: premium={premium} VWAP={vwap} strike={} expiry={} at {}",
            stats.strike,
            stats.expiry,
            format_timestamp(ts)
        ),
        timestamp: *ts,
    })
}

/// Every alert a freshly derived row triggers. No state is kept between
/// ticks, so a condition that persists re-fires each tick.
pub fn evaluate_row(row: &DerivedRow, t: &Thresholds) -> Vec<AlertEvent> {
    let ts = &row.timestamp;
    let mut alerts: Vec<AlertEvent> = vix_alert(row.vix, t, ts).into_iter().collect();
    for (label, stats) in &row.series {
        alerts.extend(ivp_alert(label, stats, t, ts));
        alerts.extend(premium_alert(label, stats, t, ts));
    }
    alerts
}
