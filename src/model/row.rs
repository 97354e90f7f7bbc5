use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::chain::AtmStraddle;
use super::index::SeriesLabel;
use super::time::Timestamp;

/// Per-series fields, in the column order they are written.
pub const SERIES_FIELDS: [&str; 12] = [
    "expiry",
    "spot",
    "strike",
    "call_ltp",
    "put_ltp",
    "straddle",
    "call_volume",
    "put_volume",
    "total_volume",
    "straddle_iv",
    "vwap",
    "ivp",
];

const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Everything recorded for one (index, expiry-rank) in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub expiry: NaiveDate,
    pub spot: f64,
    pub strike: f64,
    pub call_ltp: f64,
    pub put_ltp: f64,
    pub straddle: f64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub total_volume: u64,
    pub straddle_iv: f64,
    /// `None` while the look-back window has no traded volume.
    pub vwap: Option<f64>,
    /// `None` on cold start.
    pub ivp: Option<f64>,
}

impl SeriesStats {
    pub fn from_atm(atm: &AtmStraddle, vwap: Option<f64>, ivp: Option<f64>) -> Self {
        Self {
            expiry: atm.expiry,
            spot: atm.spot,
            strike: atm.strike,
            call_ltp: atm.call_ltp,
            put_ltp: atm.put_ltp,
            straddle: atm.straddle,
            call_volume: atm.call_volume,
            put_volume: atm.put_volume,
            total_volume: atm.total_volume,
            straddle_iv: atm.straddle_iv,
            vwap,
            ivp,
        }
    }

    /// Cell text for `field`; empty for null values.
    pub fn cell(&self, field: &str) -> String {
        match field {
            "expiry" => self.expiry.format(EXPIRY_FORMAT).to_string(),
            "spot" => self.spot.to_string(),
            "strike" => self.strike.to_string(),
            "call_ltp" => self.call_ltp.to_string(),
            "put_ltp" => self.put_ltp.to_string(),
            "straddle" => self.straddle.to_string(),
            "call_volume" => self.call_volume.to_string(),
            "put_volume" => self.put_volume.to_string(),
            "total_volume" => self.total_volume.to_string(),
            "straddle_iv" => self.straddle_iv.to_string(),
            "vwap" => self.vwap.map(|v| v.to_string()).unwrap_or_default(),
            "ivp" => self.ivp.map(|v| v.to_string()).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Rebuild from stored cells. Returns `None` unless every non-nullable
    /// field is present and parses.
    pub fn from_cells<'a>(cell: impl Fn(&str) -> Option<&'a str>) -> Option<Self> {
        let num = |field: &str| cell(field).and_then(parse_f64);
        let vol = |field: &str| cell(field).and_then(parse_volume);
        Some(Self {
            expiry: NaiveDate::parse_from_str(cell("expiry")?.trim(), EXPIRY_FORMAT).ok()?,
            spot: num("spot")?,
            strike: num("strike")?,
            call_ltp: num("call_ltp")?,
            put_ltp: num("put_ltp")?,
            straddle: num("straddle")?,
            call_volume: vol("call_volume")?,
            put_volume: vol("put_volume")?,
            total_volume: vol("total_volume")?,
            straddle_iv: num("straddle_iv")?,
            vwap: num("vwap"),
            ivp: num("ivp"),
        })
    }
}

/// One appended row of the history table.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub timestamp: Timestamp,
    /// India VIX, forward-filled from the previous row when the fetch came back empty.
    pub vix: Option<f64>,
    pub series: BTreeMap<SeriesLabel, SeriesStats>,
}

impl DerivedRow {
    pub fn new(timestamp: Timestamp, vix: Option<f64>) -> Self {
        Self {
            timestamp,
            vix,
            series: BTreeMap::new(),
        }
    }

    /// All column names this row populates, `timestamp` and `vix` first.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec!["timestamp".to_string(), "vix".to_string()];
        for label in self.series.keys() {
            cols.extend(SERIES_FIELDS.iter().map(|f| label.column(f)));
        }
        cols
    }
}

/// The columns of one series that the rolling statistics read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: Timestamp,
    pub straddle: Option<f64>,
    pub total_volume: Option<f64>,
    pub straddle_iv: Option<f64>,
}

impl HistoryPoint {
    pub fn from_stats(timestamp: Timestamp, stats: &SeriesStats) -> Self {
        Self {
            timestamp,
            straddle: Some(stats.straddle),
            total_volume: Some(stats.total_volume as f64),
            straddle_iv: Some(stats.straddle_iv),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.straddle.is_none() && self.total_volume.is_none() && self.straddle_iv.is_none()
    }
}

/// Most recent rows of one series, oldest first. May be empty or shorter
/// than the look-back window.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySlice {
    pub label: SeriesLabel,
    pub points: Vec<HistoryPoint>,
}

impl HistorySlice {
    pub fn new(label: SeriesLabel, points: Vec<HistoryPoint>) -> Self {
        Self { label, points }
    }

    pub fn empty(label: SeriesLabel) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn straddle_ivs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.straddle_iv)
    }
}

pub(crate) fn parse_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Volumes are written as integers, but older tables stored them as floats.
fn parse_volume(s: &str) -> Option<u64> {
    let s = s.trim();
    s.parse::<u64>().ok().or_else(|| {
        parse_f64(s)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}
