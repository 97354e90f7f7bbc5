pub mod alert;
pub mod chain;
pub mod index;
pub mod row;
pub mod time;

pub use alert::{AlertEvent, AlertKind};
pub use chain::{AtmStraddle, ChainSnapshot, OptionLeg, StrikeQuotes};
pub use index::{ExpiryRank, IndexId, SeriesLabel};
pub use row::{DerivedRow, HistoryPoint, HistorySlice, SeriesStats};
pub use time::Timestamp;
