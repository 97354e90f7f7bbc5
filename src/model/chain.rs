use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::index::SeriesLabel;

/// Last trade, traded volume and implied volatility of one call or put.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionLeg {
    pub last_price: f64,
    pub total_volume: u64,
    pub implied_volatility: f64,
}

impl OptionLeg {
    pub fn new(last_price: f64, total_volume: u64, implied_volatility: f64) -> Self {
        Self {
            last_price,
            total_volume,
            implied_volatility,
        }
    }
}

/// Both legs listed at a strike for one expiry. Either leg may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeQuotes {
    pub strike: f64,
    pub call: Option<OptionLeg>,
    pub put: Option<OptionLeg>,
}

/// Raw option chain for one index at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Underlying spot. `None` when the source did not report one.
    pub spot_price: Option<f64>,
    pub expiries: Vec<NaiveDate>,
    /// Strike rows per expiry, in whatever order the source listed them.
    pub strikes: BTreeMap<NaiveDate, Vec<StrikeQuotes>>,
}

impl ChainSnapshot {
    pub fn new(spot_price: Option<f64>) -> Self {
        Self {
            spot_price,
            ..Default::default()
        }
    }

    /// Record a strike row, registering its expiry if unseen.
    pub fn insert(&mut self, expiry: NaiveDate, quotes: StrikeQuotes) {
        if !self.expiries.contains(&expiry) {
            self.expiries.push(expiry);
        }
        self.strikes.entry(expiry).or_default().push(quotes);
    }

    pub fn strikes_for(&self, expiry: &NaiveDate) -> &[StrikeQuotes] {
        self.strikes.get(expiry).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The at-the-money call/put pair resolved for one (index, expiry-rank).
#[derive(Debug, Clone, PartialEq)]
pub struct AtmStraddle {
    pub label: SeriesLabel,
    pub expiry: NaiveDate,
    pub spot: f64,
    pub strike: f64,
    pub call_ltp: f64,
    pub put_ltp: f64,
    pub straddle: f64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub total_volume: u64,
    /// Call IV + put IV, rounded to one decimal.
    pub straddle_iv: f64,
}
