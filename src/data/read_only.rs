use tracing::info;

use crate::model::time::format_timestamp;
use crate::model::{DerivedRow, HistorySlice, SeriesLabel, SeriesStats, Timestamp};

use super::{HistoryStore, StoreError, check_order};

/// Reads from an underlying store but only logs appends (`--dry-run`).
pub struct ReadOnlyHistory<S> {
    inner: S,
}

impl<S: HistoryStore> ReadOnlyHistory<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: HistoryStore> HistoryStore for ReadOnlyHistory<S> {
    fn read_recent_slice(&self, label: SeriesLabel, limit: usize) -> Result<HistorySlice, StoreError> {
        self.inner.read_recent_slice(label, limit)
    }

    fn read_recent_series(
        &self,
        label: SeriesLabel,
        limit: usize,
    ) -> Result<Vec<(Timestamp, SeriesStats)>, StoreError> {
        self.inner.read_recent_series(label, limit)
    }

    fn last_vix(&self) -> Result<Option<f64>, StoreError> {
        self.inner.last_vix()
    }

    fn last_timestamp(&self) -> Result<Option<Timestamp>, StoreError> {
        self.inner.last_timestamp()
    }

    fn append_row(&mut self, row: &DerivedRow) -> Result<(), StoreError> {
        check_order(self.inner.last_timestamp()?, row.timestamp)?;
        info!(
            "dry run: not writing row at {} ({} series)",
            format_timestamp(&row.timestamp),
            row.series.len()
        );
        Ok(())
    }
}
