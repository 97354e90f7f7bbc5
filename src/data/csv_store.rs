use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;

use csv::StringRecord;
use tracing::{debug, info};

use crate::model::row::parse_f64;
use crate::model::time::{format_timestamp, parse_timestamp};
use crate::model::{DerivedRow, HistoryPoint, HistorySlice, SeriesLabel, SeriesStats, Timestamp};

use super::{HistoryStore, StoreError, check_order, keep_recent, slice_from};

const TIMESTAMP_COL: &str = "timestamp";
const VIX_COL: &str = "vix";

/// History table kept as one wide CSV file.
///
/// Rows are only ever appended. When a row brings columns the file has
/// never seen, the file is rewritten once with the widened header and the
/// existing rows padded with empty cells.
pub struct CsvHistory {
    path: PathBuf,
}

/// Header plus records, with column lookup by name.
struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl Table {
    fn empty() -> Self {
        Self {
            headers: Vec::new(),
            index: HashMap::new(),
            records: Vec::new(),
        }
    }

    fn new(headers: Vec<String>, records: Vec<StringRecord>) -> Self {
        let index = headers.iter().enumerate().map(|(i, h)| (h.clone(), i)).collect();
        Self {
            headers,
            index,
            records,
        }
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let i = *self.index.get(column)?;
        record.get(i).filter(|c| !c.trim().is_empty())
    }

    fn timestamp(&self, record: &StringRecord) -> Option<Timestamp> {
        self.cell(record, TIMESTAMP_COL).and_then(parse_timestamp)
    }

    fn point(&self, record: &StringRecord, label: &SeriesLabel) -> Option<HistoryPoint> {
        let timestamp = self.timestamp(record)?;
        let num = |field: &str| self.cell(record, &label.column(field)).and_then(parse_f64);
        Some(HistoryPoint {
            timestamp,
            straddle: num("straddle"),
            total_volume: num("total_volume"),
            straddle_iv: num("straddle_iv"),
        })
    }
}

impl CsvHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Table, StoreError> {
        if !self.path.exists() {
            return Ok(Table::empty());
        }
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        for h in &headers {
            if h != TIMESTAMP_COL && h != VIX_COL && SeriesLabel::parse_column(h).is_none() {
                debug!("ignoring unknown history column {h}");
            }
        }
        let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Table::new(headers, records))
    }

    fn write_all(&self, headers: &[String], records: &[StringRecord]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
            wtr.write_record(headers)?;
            for record in records {
                let padded: Vec<&str> = (0..headers.len()).map(|i| record.get(i).unwrap_or("")).collect();
                wtr.write_record(&padded)?;
            }
            wtr.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn append_record(&self, record: &[String]) -> Result<(), StoreError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(record)?;
        wtr.flush()?;
        Ok(())
    }
}

fn row_cells(row: &DerivedRow) -> HashMap<String, String> {
    let mut cells = HashMap::new();
    cells.insert(TIMESTAMP_COL.to_string(), format_timestamp(&row.timestamp));
    cells.insert(VIX_COL.to_string(), row.vix.map(|v| v.to_string()).unwrap_or_default());
    for (label, stats) in &row.series {
        for field in crate::model::row::SERIES_FIELDS {
            cells.insert(label.column(field), stats.cell(field));
        }
    }
    cells
}

impl HistoryStore for CsvHistory {
    fn read_recent_slice(&self, label: SeriesLabel, limit: usize) -> Result<HistorySlice, StoreError> {
        let table = self.load()?;
        let points = table.records.iter().filter_map(|r| table.point(r, &label)).collect();
        Ok(slice_from(label, points, limit))
    }

    fn read_recent_series(
        &self,
        label: SeriesLabel,
        limit: usize,
    ) -> Result<Vec<(Timestamp, SeriesStats)>, StoreError> {
        let table = self.load()?;
        let series = table
            .records
            .iter()
            .filter_map(|r| {
                let ts = table.timestamp(r)?;
                let stats = SeriesStats::from_cells(|field| table.cell(r, &label.column(field)))?;
                Some((ts, stats))
            })
            .collect();
        Ok(keep_recent(series, limit))
    }

    fn last_vix(&self) -> Result<Option<f64>, StoreError> {
        let table = self.load()?;
        Ok(table
            .records
            .iter()
            .rev()
            .find_map(|r| table.cell(r, VIX_COL).and_then(parse_f64)))
    }

    fn last_timestamp(&self) -> Result<Option<Timestamp>, StoreError> {
        let table = self.load()?;
        Ok(table.records.iter().rev().find_map(|r| table.timestamp(r)))
    }

    fn append_row(&mut self, row: &DerivedRow) -> Result<(), StoreError> {
        let table = self.load()?;
        check_order(table.records.iter().rev().find_map(|r| table.timestamp(r)), row.timestamp)?;

        let mut cells = row_cells(row);

        if table.headers.is_empty() {
            let headers = row.columns();
            let record: Vec<String> = headers.iter().map(|h| cells.remove(h).unwrap_or_default()).collect();
            self.write_all(&headers, &[StringRecord::from(record)])?;
            info!("created history table {} ({} columns)", self.path.display(), headers.len());
            return Ok(());
        }

        let new_columns: Vec<String> = row
            .columns()
            .into_iter()
            .filter(|c| !table.index.contains_key(c))
            .collect();

        let mut headers = table.headers.clone();
        headers.extend(new_columns.iter().cloned());
        let record: Vec<String> = headers.iter().map(|h| cells.remove(h).unwrap_or_default()).collect();

        if new_columns.is_empty() {
            self.append_record(&record)?;
        } else {
            debug!("widening history table with {:?}", new_columns);
            let mut records = table.records;
            records.push(StringRecord::from(record));
            self.write_all(&headers, &records)?;
            info!("history table widened by {} columns", new_columns.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvHistory::new(dir.path().join("nope.csv"));
        assert!(store.last_timestamp().unwrap().is_none());
        assert!(store.last_vix().unwrap().is_none());
    }

    #[test]
    fn test_reads_legacy_columns_and_ignores_unknown_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.csv");
        std::fs::write(
            &path,
            "timestamp,vix,NIFTY_current_straddle,NIFTY_current_total_volume,FINNIFTY_current_straddle\n\
             2025-03-05 10:00:00,14.1,230.5,1800.0,99\n\
             2025-03-05 10:05:00,,abc,,99\n",
        )
        .unwrap();

        let store = CsvHistory::new(&path);
        let label = SeriesLabel::new(crate::model::IndexId::Nifty, crate::model::ExpiryRank::Current);
        let slice = store.read_recent_slice(label, 30).unwrap();

        // second row has only an unparsable straddle, so it carries no data
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.points[0].straddle, Some(230.5));
        assert_eq!(slice.points[0].total_volume, Some(1800.0));
        assert_eq!(slice.points[0].straddle_iv, None);
        assert_eq!(store.last_vix().unwrap(), Some(14.1));
    }
}
