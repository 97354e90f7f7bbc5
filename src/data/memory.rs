use crate::model::{DerivedRow, HistoryPoint, HistorySlice, SeriesLabel, SeriesStats, Timestamp};

use super::{HistoryStore, StoreError, check_order, keep_recent, slice_from};

/// In-process history, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    rows: Vec<DerivedRow>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with rows, which must already be in timestamp order.
    pub fn with_rows(rows: Vec<DerivedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DerivedRow] {
        &self.rows
    }
}

impl HistoryStore for MemoryHistory {
    fn read_recent_slice(&self, label: SeriesLabel, limit: usize) -> Result<HistorySlice, StoreError> {
        let points = self
            .rows
            .iter()
            .filter_map(|r| r.series.get(&label).map(|s| HistoryPoint::from_stats(r.timestamp, s)))
            .collect();
        Ok(slice_from(label, points, limit))
    }

    fn read_recent_series(
        &self,
        label: SeriesLabel,
        limit: usize,
    ) -> Result<Vec<(Timestamp, SeriesStats)>, StoreError> {
        let series = self
            .rows
            .iter()
            .filter_map(|r| r.series.get(&label).map(|s| (r.timestamp, s.clone())))
            .collect();
        Ok(keep_recent(series, limit))
    }

    fn last_vix(&self) -> Result<Option<f64>, StoreError> {
        Ok(self.rows.iter().rev().find_map(|r| r.vix))
    }

    fn last_timestamp(&self) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.rows.last().map(|r| r.timestamp))
    }

    fn append_row(&mut self, row: &DerivedRow) -> Result<(), StoreError> {
        check_order(self.last_timestamp()?, row.timestamp)?;
        self.rows.push(row.clone());
        Ok(())
    }
}
