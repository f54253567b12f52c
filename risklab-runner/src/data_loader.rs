//! CSV ingestion — bars and optional minute bars into the engine's
//! in-memory form.
//!
//! One row per symbol per period. A row that fails to parse is warned about
//! and skipped; only an entirely unreadable file is an error. This mirrors
//! the engine's own degradation policy: bad input shrinks the eligible set,
//! it does not abort the run.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use risklab_core::data::MarketData;
use risklab_core::domain::PriceBar;
use risklab_core::engine::{MinuteBar, MinuteData};
use serde::Deserialize;
use std::path::Path;

/// Daily CSV row:
/// `symbol,date,open,high,low,close,adr,buy_signal,sell_signal,target_price[,ranking]`
#[derive(Debug, Deserialize)]
struct BarRow {
    symbol: String,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adr: f64,
    buy_signal: bool,
    sell_signal: bool,
    target_price: f64,
    #[serde(default)]
    ranking: Option<f64>,
}

impl From<BarRow> for PriceBar {
    fn from(row: BarRow) -> Self {
        PriceBar {
            symbol: row.symbol,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adr: row.adr,
            buy_signal: row.buy_signal,
            sell_signal: row.sell_signal,
            target_price: row.target_price,
            ranking: row.ranking,
        }
    }
}

/// Minute CSV row: `symbol,ts,open,high,low,close` with ISO-8601 timestamps
/// (`2024-01-05T09:31:00`).
#[derive(Debug, Deserialize)]
struct MinuteRow {
    symbol: String,
    ts: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Load daily bars. Returns the aligned data plus per-row parse warnings.
pub fn load_bars_csv(path: &Path) -> Result<(MarketData, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open bar file {}", path.display()))?;

    let mut bars: Vec<PriceBar> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for (i, row) in reader.deserialize::<BarRow>().enumerate() {
        match row {
            Ok(row) => bars.push(row.into()),
            Err(err) => {
                let warning = format!("{}: row {}: {err}", path.display(), i + 2);
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    let data = MarketData::from_bars(bars)
        .with_context(|| format!("No usable bars in {}", path.display()))?;
    Ok((data, warnings))
}

/// Load minute bars for entry refinement.
pub fn load_minutes_csv(path: &Path) -> Result<MinuteData> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open minute file {}", path.display()))?;

    let mut minutes = MinuteData::new();
    for (i, row) in reader.deserialize::<MinuteRow>().enumerate() {
        match row {
            Ok(row) => minutes.push(
                &row.symbol,
                MinuteBar {
                    ts: row.ts,
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                },
            ),
            Err(err) => {
                tracing::warn!("{}: row {}: {err}", path.display(), i + 2);
            }
        }
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_daily_bars() {
        let file = write_temp(
            "symbol,date,open,high,low,close,adr,buy_signal,sell_signal,target_price,ranking\n\
             AAPL,2024-01-02,100.0,103.0,99.0,102.0,3.1,true,false,100.2,1.5\n\
             AAPL,2024-01-03,102.0,104.0,101.0,103.0,3.0,false,false,0.0,\n",
        );
        let (data, warnings) = load_bars_csv(file.path()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(data.len(), 2);
        let bar = data.bar("AAPL", 0).unwrap();
        assert!(bar.buy_signal);
        assert_eq!(bar.ranking, Some(1.5));
        assert_eq!(data.bar("AAPL", 1).unwrap().ranking, None);
    }

    #[test]
    fn bad_rows_warn_and_skip() {
        let file = write_temp(
            "symbol,date,open,high,low,close,adr,buy_signal,sell_signal,target_price,ranking\n\
             AAPL,2024-01-02,100.0,103.0,99.0,102.0,3.1,true,false,100.2,\n\
             AAPL,not-a-date,102.0,104.0,101.0,103.0,3.0,false,false,0.0,\n",
        );
        let (data, warnings) = load_bars_csv(file.path()).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("row 3"));
    }

    #[test]
    fn loads_minute_bars() {
        let file = write_temp(
            "symbol,ts,open,high,low,close\n\
             AAPL,2024-01-02T09:30:00,99.5,100.0,99.3,99.9\n\
             AAPL,2024-01-02T09:31:00,99.9,100.4,99.8,100.3\n",
        );
        let minutes = load_minutes_csv(file.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let session = minutes.session("AAPL", date).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session[1].high, 100.4);
    }

    #[test]
    fn missing_file_errors() {
        assert!(load_bars_csv(Path::new("/nonexistent/bars.csv")).is_err());
    }
}
