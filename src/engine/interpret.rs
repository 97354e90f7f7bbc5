use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{AtmStraddle, ChainSnapshot, ExpiryRank, IndexId, OptionLeg, SeriesLabel, StrikeQuotes};

use super::round_to;

#[derive(Debug, Error, PartialEq)]
pub enum InterpretError {
    #[error("{index}: option chain has no usable spot price")]
    MissingSpotPrice { index: IndexId },

    #[error("{index}: no strikes listed for expiry {expiry}")]
    NoStrikesForExpiry { index: IndexId, expiry: NaiveDate },
}

/// The `count` chronologically earliest expiries in the snapshot.
pub fn select_expiries(snapshot: &ChainSnapshot, count: usize) -> Vec<NaiveDate> {
    let mut expiries = snapshot.expiries.clone();
    expiries.sort();
    expiries.dedup();
    expiries.truncate(count);
    expiries
}

/// Strike closest to `spot`. Strikes are scanned in ascending order and the
/// first one at the minimum distance wins, so ties go to the lower strike.
pub fn find_atm_strike(strikes: &[StrikeQuotes], spot: f64) -> Option<&StrikeQuotes> {
    let mut ordered: Vec<&StrikeQuotes> = strikes.iter().filter(|s| s.strike.is_finite()).collect();
    ordered.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    ordered
        .into_iter()
        .min_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()))
}

/// Resolve the ATM straddle for the first `count` expiries of `snapshot`.
///
/// A missing call or put leg counts as zero price, zero volume and zero IV.
/// Ranks beyond the expiries the chain lists are simply not returned.
pub fn interpret(
    index: IndexId,
    snapshot: &ChainSnapshot,
    count: usize,
) -> Result<Vec<AtmStraddle>, InterpretError> {
    let spot = snapshot
        .spot_price
        .filter(|s| s.is_finite() && *s > 0.0)
        .ok_or(InterpretError::MissingSpotPrice { index })?;

    let mut out = Vec::new();
    for (ordinal, expiry) in select_expiries(snapshot, count).into_iter().enumerate() {
        let Some(rank) = ExpiryRank::from_ordinal(ordinal) else {
            break;
        };

        let atm = find_atm_strike(snapshot.strikes_for(&expiry), spot)
            .ok_or(InterpretError::NoStrikesForExpiry { index, expiry })?;

        let call = atm.call.unwrap_or_default();
        let put = atm.put.unwrap_or_default();
        out.push(straddle_at(SeriesLabel::new(index, rank), expiry, spot, atm.strike, call, put));
    }

    Ok(out)
}

fn straddle_at(
    label: SeriesLabel,
    expiry: NaiveDate,
    spot: f64,
    strike: f64,
    call: OptionLeg,
    put: OptionLeg,
) -> AtmStraddle {
    AtmStraddle {
        label,
        expiry,
        spot,
        strike,
        call_ltp: call.last_price,
        put_ltp: put.last_price,
        straddle: call.last_price + put.last_price,
        call_volume: call.total_volume,
        put_volume: put.total_volume,
        total_volume: call.total_volume + put.total_volume,
        straddle_iv: round_to(call.implied_volatility + put.implied_volatility, 1),
    }
}
