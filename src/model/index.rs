use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Equity index whose option chain is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexId {
    #[serde(rename = "NIFTY")]
    Nifty,
    #[serde(rename = "BANKNIFTY")]
    BankNifty,
}

impl IndexId {
    pub const ALL: [IndexId; 2] = [IndexId::Nifty, IndexId::BankNifty];

    /// Exchange symbol, also used as the column prefix in the history table.
    pub fn symbol(&self) -> &'static str {
        match self {
            IndexId::Nifty => "NIFTY",
            IndexId::BankNifty => "BANKNIFTY",
        }
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for IndexId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NIFTY" => Ok(IndexId::Nifty),
            "BANKNIFTY" => Ok(IndexId::BankNifty),
            other => Err(format!("Unknown index '{other}'. Use NIFTY or BANKNIFTY.")),
        }
    }
}

/// Ordinal position of an expiry among the chronologically sorted expiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryRank {
    Current,
    Next,
}

impl ExpiryRank {
    pub const ALL: [ExpiryRank; 2] = [ExpiryRank::Current, ExpiryRank::Next];

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryRank::Current => "current",
            ExpiryRank::Next => "next",
        }
    }
}

impl fmt::Display for ExpiryRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryRank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" | "0" => Ok(ExpiryRank::Current),
            "next" | "1" => Ok(ExpiryRank::Next),
            other => Err(format!("Unknown expiry rank '{other}'. Use current or next.")),
        }
    }
}

/// One (index, expiry-rank) series in the history table, e.g. `NIFTY_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesLabel {
    pub index: IndexId,
    pub rank: ExpiryRank,
}

impl SeriesLabel {
    pub fn new(index: IndexId, rank: ExpiryRank) -> Self {
        Self { index, rank }
    }

    /// Every label the monitor knows how to populate.
    pub fn all() -> impl Iterator<Item = SeriesLabel> {
        IndexId::ALL
            .into_iter()
            .flat_map(|index| ExpiryRank::ALL.into_iter().map(move |rank| SeriesLabel { index, rank }))
    }

    /// Column name for one field of this series.
    pub fn column(&self, field: &str) -> String {
        format!("{self}_{field}")
    }

    /// Parse a `{INDEX}_{rank}_{field}` column name back into (label, field).
    /// Columns for labels this build does not know return `None`.
    pub fn parse_column(column: &str) -> Option<(SeriesLabel, &str)> {
        let mut parts = column.splitn(3, '_');
        let index = parts.next()?.parse().ok()?;
        let rank = parts.next()?.parse().ok()?;
        let field = parts.next()?;
        Some((SeriesLabel { index, rank }, field))
    }
}

impl fmt::Display for SeriesLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.index, self.rank)
    }
}
