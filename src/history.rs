use std::path::Path;

use anyhow::{Context, Result};

use crate::data::{CsvHistory, HistoryStore};
use crate::model::time::format_timestamp;
use crate::model::SeriesLabel;

/// Entry point for the `history` command: print the latest rows of one series.
pub fn run(history_file: &Path, label: SeriesLabel, limit: usize) -> Result<()> {
    let store = CsvHistory::new(history_file);
    let rows = store
        .read_recent_series(label, limit)
        .with_context(|| format!("reading {}", history_file.display()))?;

    if rows.is_empty() {
        println!("No rows for {label} in {}.", history_file.display());
        let populated: Vec<String> = SeriesLabel::all()
            .filter(|l| store.read_recent_series(*l, 1).is_ok_and(|r| !r.is_empty()))
            .map(|l| l.to_string())
            .collect();
        if !populated.is_empty() {
            println!("Series with data: {}", populated.join(", "));
        }
        return Ok(());
    }

    println!("{label}: last {} row(s)", rows.len());
    println!(
        "{:<20} {:<11} {:>9} {:>9} {:>9} {:>9} {:>10} {:>6} {:>9} {:>6}",
        "TIMESTAMP", "EXPIRY", "SPOT", "STRIKE", "CALL", "PUT", "VOLUME", "IV", "VWAP", "IVP"
    );
    println!("{}", "-".repeat(106));

    for (ts, s) in &rows {
        println!(
            "{:<20} {:<11} {:>9.2} {:>9} {:>9.2} {:>9.2} {:>10} {:>6.1} {:>9} {:>6}",
            format_timestamp(ts),
            s.expiry.to_string(),
            s.spot,
            s.strike,
            s.call_ltp,
            s.put_ltp,
            s.total_volume,
            s.straddle_iv,
            dash_or(s.vwap, 2),
            dash_or(s.ivp, 1),
        );
    }
    Ok(())
}

fn dash_or(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "—".to_string(),
    }
}
