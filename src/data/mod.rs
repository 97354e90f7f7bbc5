pub mod csv_store;
pub mod memory;
pub mod read_only;

use thiserror::Error;

use crate::model::{DerivedRow, HistoryPoint, HistorySlice, SeriesLabel, SeriesStats, Timestamp};

pub use csv_store::CsvHistory;
pub use memory::MemoryHistory;
pub use read_only::ReadOnlyHistory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row at {new} is not after the last stored row at {last}")]
    OutOfOrder { last: Timestamp, new: Timestamp },
}

/// Append-only time series of derived rows, keyed by timestamp.
///
/// The set of columns grows as new series get populated; readers treat
/// columns a row lacks as absent.
pub trait HistoryStore {
    /// The last `limit` rows in which `label` has any data, oldest first.
    fn read_recent_slice(&self, label: SeriesLabel, limit: usize) -> Result<HistorySlice, StoreError>;

    /// The last `limit` complete records of `label`, oldest first.
    fn read_recent_series(
        &self,
        label: SeriesLabel,
        limit: usize,
    ) -> Result<Vec<(Timestamp, SeriesStats)>, StoreError>;

    /// Most recent non-empty volatility-index value.
    fn last_vix(&self) -> Result<Option<f64>, StoreError>;

    fn last_timestamp(&self) -> Result<Option<Timestamp>, StoreError>;

    /// Append one row. Its timestamp must be strictly after the last stored row.
    fn append_row(&mut self, row: &DerivedRow) -> Result<(), StoreError>;
}

/// Reject rows that would break timestamp ordering.
pub(crate) fn check_order(last: Option<Timestamp>, new: Timestamp) -> Result<(), StoreError> {
    match last {
        Some(last) if new <= last => Err(StoreError::OutOfOrder { last, new }),
        _ => Ok(()),
    }
}

/// Keep the newest `limit` items of an oldest-first sequence.
pub(crate) fn keep_recent<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if items.len() > limit {
        items.drain(..items.len() - limit);
    }
    items
}

pub(crate) fn slice_from(label: SeriesLabel, points: Vec<HistoryPoint>, limit: usize) -> HistorySlice {
    let points = points.into_iter().filter(|p| !p.is_empty()).collect();
    HistorySlice::new(label, keep_recent(points, limit))
}
