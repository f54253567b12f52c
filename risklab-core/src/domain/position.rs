//! Position — one open holding, tracked in principal × multiplier form.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an open position.
///
/// `HalfSold` replaces the numeric sentinel the legacy system overloaded onto
/// the holding-duration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Open,
    HalfSold,
}

/// One open holding.
///
/// `principal` is the originally invested cash and is immutable once set —
/// the only sanctioned writes are the 50% haircut on a half-sell and the
/// addition on a pyramid rebuy. All gains live in `again`, the cumulative
/// return multiplier, so market value is always `principal * again`. Folding
/// `again` back into `principal` is exactly the double-counting defect this
/// representation exists to prevent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Original invested cash.
    pub principal: f64,
    pub avg_entry_price: f64,
    /// Cumulative return multiplier since entry (`1.10` = +10%).
    pub again: f64,
    /// Periods held.
    pub duration: usize,
    pub stop_price: f64,
    /// Trailing-stop step size as a fraction; widened after a half-sell.
    pub risk_unit: f64,
    pub state: PositionState,
    /// Close of the last period this position was marked at. Anchors the
    /// multiplicative chain across data gaps.
    pub last_close: f64,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.principal * self.again
    }

    pub fn is_half_sold(&self) -> bool {
        self.state == PositionState::HalfSold
    }

    /// Compound one period's return into the multiplier chain.
    pub fn compound(&mut self, close: f64) {
        let period_return = (close - self.last_close) / self.last_close;
        self.again *= 1.0 + period_return;
        self.last_close = close;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            symbol: "AAPL".into(),
            principal: 20_000.0,
            avg_entry_price: 100.0,
            again: 1.0,
            duration: 1,
            stop_price: 97.0,
            risk_unit: 0.05,
            state: PositionState::Open,
            last_close: 100.0,
        }
    }

    #[test]
    fn market_value_is_principal_times_again() {
        let mut pos = sample_position();
        pos.again = 1.15;
        assert!((pos.market_value() - 23_000.0).abs() < 1e-10);
    }

    #[test]
    fn compound_is_multiplicative() {
        let mut pos = sample_position();
        pos.compound(102.0); // +2%
        pos.compound(99.96); // -2%
        // 1.02 * 0.98 != 1.0 — the chain compounds, it does not net out
        assert!((pos.again - 1.02 * 0.98).abs() < 1e-12);
        assert_eq!(pos.last_close, 99.96);
    }

    #[test]
    fn principal_untouched_by_compounding() {
        let mut pos = sample_position();
        pos.compound(130.0);
        pos.compound(150.0);
        assert_eq!(pos.principal, 20_000.0);
    }
}
