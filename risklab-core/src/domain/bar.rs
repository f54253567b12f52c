//! PriceBar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One symbol's data for a single period: OHLC, volatility proxy, and the
/// opaque signal flags produced by the upstream strategy layer.
///
/// The engine never interprets the signals; it only acts on them. `adr` is
/// the Average Daily Range in percent (`5.0` = 5%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Average Daily Range in percent.
    pub adr: f64,
    pub buy_signal: bool,
    pub sell_signal: bool,
    /// Entry target supplied by the signal layer; only meaningful on buy bars.
    pub target_price: f64,
    /// Optional ranking metric (e.g. relative strength) for candidate ordering.
    pub ranking: Option<f64>,
}

impl PriceBar {
    /// Whether this bar can participate in any trading decision.
    ///
    /// Non-positive or non-finite prices and a non-positive ADR all degrade
    /// to "no trade" for this symbol/period rather than aborting the run.
    pub fn is_tradable(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.adr.is_finite()
            && self.adr > 0.0
            && self.high >= self.low
            && self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }

    /// Whether the entry target is usable for a buy on this bar.
    pub fn has_valid_target(&self) -> bool {
        self.target_price.is_finite() && self.target_price > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            symbol: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            adr: 3.2,
            buy_signal: false,
            sell_signal: false,
            target_price: 101.5,
            ranking: None,
        }
    }

    #[test]
    fn bar_is_tradable() {
        assert!(sample_bar().is_tradable());
    }

    #[test]
    fn bar_rejects_nan_price() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_tradable());
    }

    #[test]
    fn bar_rejects_non_positive_adr() {
        let mut bar = sample_bar();
        bar.adr = 0.0;
        assert!(!bar.is_tradable());
        bar.adr = -1.0;
        assert!(!bar.is_tradable());
    }

    #[test]
    fn bar_rejects_inverted_range() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_tradable());
    }

    #[test]
    fn target_validity() {
        let mut bar = sample_bar();
        assert!(bar.has_valid_target());
        bar.target_price = 0.0;
        assert!(!bar.has_valid_target());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.symbol, deser.symbol);
        assert_eq!(bar.date, deser.date);
        assert_eq!(bar.close, deser.close);
        assert_eq!(bar.ranking, deser.ranking);
    }
}
