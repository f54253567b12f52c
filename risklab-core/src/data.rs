//! MarketData — pre-loaded, date-aligned bar series for every symbol.
//!
//! All simulation input is in memory before the driver starts; the engine
//! performs no I/O. Symbols trade on different calendars, so each series is
//! aligned to the union of dates with gaps as `None`. A gap (or an
//! untradable bar) removes the symbol from that period's eligible set only —
//! it never aborts the run.

use crate::domain::PriceBar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no bars supplied")]
    Empty,
    #[error("duplicate bar for {symbol} on {date}")]
    DuplicateBar { symbol: String, date: NaiveDate },
}

/// Date-aligned market data for a set of symbols.
#[derive(Debug, Clone)]
pub struct MarketData {
    dates: Vec<NaiveDate>,
    series: BTreeMap<String, Vec<Option<PriceBar>>>,
}

impl MarketData {
    /// Build aligned data from a flat list of bars.
    ///
    /// The date axis is the sorted union of all bar dates. Two bars for the
    /// same symbol and date are rejected — that is corrupt input, not a gap.
    pub fn from_bars(bars: Vec<PriceBar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::Empty);
        }

        let mut dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        dates.sort_unstable();
        dates.dedup();
        let date_index: BTreeMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut series: BTreeMap<String, Vec<Option<PriceBar>>> = BTreeMap::new();
        for bar in bars {
            let idx = date_index[&bar.date];
            let row = series
                .entry(bar.symbol.clone())
                .or_insert_with(|| vec![None; dates.len()]);
            if row[idx].is_some() {
                return Err(DataError::DuplicateBar {
                    symbol: bar.symbol,
                    date: bar.date,
                });
            }
            row[idx] = Some(bar);
        }

        Ok(Self { dates, series })
    }

    /// Number of periods on the aligned date axis.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn date(&self, t: usize) -> NaiveDate {
        self.dates[t]
    }

    /// Symbols in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// The bar for `symbol` at period `t`, if present *and* tradable.
    ///
    /// Gaps and malformed rows look identical to callers: no bar, no trade.
    pub fn bar(&self, symbol: &str, t: usize) -> Option<&PriceBar> {
        self.series
            .get(symbol)?
            .get(t)?
            .as_ref()
            .filter(|b| b.is_tradable())
    }
}
