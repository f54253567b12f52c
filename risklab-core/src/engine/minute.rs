//! Minute-precision entry refinement.
//!
//! The daily driver approximates the entry fill from the bar's open/high.
//! When minute bars are available, this module finds the exact minute the
//! target was touched and refines the fill price/time. Each candidate's
//! search reads only its own series, so the searches run on the rayon pool;
//! results are merged in symbol order before the driver applies them through
//! the single-threaded portfolio path.

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One intraday bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinuteBar {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Minute bars grouped by symbol and session date.
#[derive(Debug, Clone, Default)]
pub struct MinuteData {
    series: BTreeMap<String, BTreeMap<NaiveDate, Vec<MinuteBar>>>,
}

impl MinuteData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one bar; bars within a session must be pushed in time order.
    pub fn push(&mut self, symbol: &str, bar: MinuteBar) {
        self.series
            .entry(symbol.to_string())
            .or_default()
            .entry(bar.ts.date())
            .or_default()
            .push(bar);
    }

    pub fn session(&self, symbol: &str, date: NaiveDate) -> Option<&[MinuteBar]> {
        self.series.get(symbol)?.get(&date).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// A candidate's refined fill: the exact touch minute and price.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedEntry {
    pub symbol: String,
    /// Raw fill price, before slippage.
    pub fill_price: f64,
    pub touched_at: NaiveDateTime,
}

/// Scan one session for the first minute the target is reached.
///
/// The target is a touch trigger from below: the first minute whose high
/// reaches it fills at the target, or at that minute's open when the session
/// gapped straight through.
pub fn refine_entry(session: &[MinuteBar], target: f64) -> Option<(f64, NaiveDateTime)> {
    session
        .iter()
        .find(|m| m.high >= target)
        .map(|m| (target.max(m.open), m.ts))
}

/// Refine a batch of candidates in parallel.
///
/// `candidates` pairs each symbol with its target price. Candidates without
/// a session or whose target is never touched are omitted — the caller falls
/// back to the daily fill rule for those. The output is sorted by symbol so
/// the merge is deterministic regardless of pool scheduling.
pub fn refine_entries(
    candidates: &[(String, f64)],
    minutes: &MinuteData,
    date: NaiveDate,
) -> Vec<RefinedEntry> {
    let mut refined: Vec<RefinedEntry> = candidates
        .par_iter()
        .filter_map(|(symbol, target)| {
            let session = minutes.session(symbol, date)?;
            let (fill_price, touched_at) = refine_entry(session, *target)?;
            Some(RefinedEntry {
                symbol: symbol.clone(),
                fill_price,
                touched_at,
            })
        })
        .collect();
    refined.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    refined
}
