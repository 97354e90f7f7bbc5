use chrono::{Datelike, NaiveTime, Weekday};

use crate::model::Timestamp;

/// Whether a tick does any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketState {
    Open,
    Closed,
}

/// Regular NSE session, Monday to Friday, inclusive of both ends (IST).
/// Exchange holidays are not modelled; the chain simply stops changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for TradingWindow {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TradingWindow {
    pub fn is_open(&self, now: &Timestamp) -> bool {
        let weekday = !matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        let t = now.time();
        weekday && t >= self.open && t <= self.close
    }

    /// Decide the state for one tick. `force_open` bypasses the clock.
    pub fn state_at(&self, now: &Timestamp, force_open: bool) -> MarketState {
        if force_open || self.is_open(now) {
            MarketState::Open
        } else {
            MarketState::Closed
        }
    }
}
