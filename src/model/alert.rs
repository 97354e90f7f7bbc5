use std::fmt;

use super::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    VolatilityIndexThreshold,
    IvpThreshold,
    PremiumVsVwapThreshold,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::VolatilityIndexThreshold => "vix",
            AlertKind::IvpThreshold => "ivp",
            AlertKind::PremiumVsVwapThreshold => "premium_vs_vwap",
        };
        f.write_str(s)
    }
}

/// A threshold breach raised during one tick. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    /// `INDIA VIX` or a series label such as `NIFTY_current`.
    pub subject: String,
    pub message: String,
    pub timestamp: Timestamp,
}
