use thiserror::Error;
use tracing::debug;

use crate::model::HistorySlice;

use super::round_to;

/// Why a rolling statistic could not be produced.
#[derive(Debug, Error, PartialEq)]
pub enum StatError {
    #[error("not enough history")]
    InsufficientData,

    #[error("non-finite result")]
    NonFinite,
}

/// Volume-weighted average straddle premium over the slice, 2 decimals.
///
/// Only rows with both a premium and a volume contribute. `None` means
/// "not enough data" (empty slice or zero traded volume), never zero.
pub fn vwap(slice: &HistorySlice) -> Option<f64> {
    match try_vwap(slice) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(label = %slice.label, "vwap unavailable: {e}");
            None
        }
    }
}

pub fn try_vwap(slice: &HistorySlice) -> Result<f64, StatError> {
    let (weighted, volume) = slice
        .points
        .iter()
        .filter_map(|p| Some((p.straddle?, p.total_volume?)))
        .fold((0.0, 0.0), |(w, v), (price, vol)| (w + price * vol, v + vol));

    if volume == 0.0 {
        return Err(StatError::InsufficientData);
    }
    finite(round_to(weighted / volume, 2))
}

/// Percentage of historical straddle IVs strictly below `current`, 1 decimal.
///
/// The current reading is not part of the denominator. `None` on empty history.
pub fn ivp(slice: &HistorySlice, current: f64) -> Option<f64> {
    match try_ivp(slice, current) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(label = %slice.label, "ivp unavailable: {e}");
            None
        }
    }
}

pub fn try_ivp(slice: &HistorySlice, current: f64) -> Result<f64, StatError> {
    if !current.is_finite() {
        return Err(StatError::NonFinite);
    }
    let (below, total) = slice
        .straddle_ivs()
        .fold((0usize, 0usize), |(b, t), iv| (b + usize::from(iv < current), t + 1));

    if total == 0 {
        return Err(StatError::InsufficientData);
    }
    finite(round_to(100.0 * below as f64 / total as f64, 1))
}

fn finite(v: f64) -> Result<f64, StatError> {
    if v.is_finite() { Ok(v) } else { Err(StatError::NonFinite) }
}
