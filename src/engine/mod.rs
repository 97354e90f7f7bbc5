//! Statistics engine: turns one option-chain snapshot plus the recent
//! history of each series into a derived row and its alerts.
//!
//! Everything here is pure. Fetching, persistence and delivery live in
//! `fetch`, `data` and `notify`; `run` wires them together per tick.

pub mod alerts;
pub mod interpret;
pub mod rolling;

use crate::model::{AtmStraddle, DerivedRow, HistorySlice, SeriesStats, Timestamp};

pub use alerts::{Thresholds, evaluate_row};
pub use interpret::{InterpretError, interpret};

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Attach rolling VWAP and IVP to a resolved straddle.
pub fn derive_series(atm: &AtmStraddle, history: &HistorySlice) -> SeriesStats {
    let vwap = rolling::vwap(history);
    let ivp = rolling::ivp(history, atm.straddle_iv);
    SeriesStats::from_atm(atm, vwap, ivp)
}

/// Assemble the row for one tick from per-series results.
pub fn build_row(
    timestamp: Timestamp,
    vix: Option<f64>,
    series: impl IntoIterator<Item = (AtmStraddle, HistorySlice)>,
) -> DerivedRow {
    let mut row = DerivedRow::new(timestamp, vix);
    for (atm, history) in series {
        let stats = derive_series(&atm, &history);
        row.series.insert(atm.label, stats);
    }
    row
}
