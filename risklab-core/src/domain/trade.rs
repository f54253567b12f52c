//! Trade — an immutable record in the simulation's trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    Buy,
    Sell,
    HalfSell,
    /// Entered and stopped out within the same period; never held.
    Whipsaw,
}

/// Why a position was (partially) closed. Only present on exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Losscut,
    SignalSell,
    HalfSellProfit,
    Whipsaw,
}

/// One entry in the ordered trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub kind: TradeKind,
    /// Shares at the fill price.
    pub quantity: f64,
    pub price: f64,
    pub date: NaiveDate,
    pub reason: Option<ExitReason>,
    /// Cash delta realized by this trade (0 for a buy).
    pub realized_pnl: f64,
    /// Cumulative return multiplier at the time of the trade.
    pub again: f64,
    pub holding_periods: usize,
}

impl Trade {
    pub fn is_exit(&self) -> bool {
        self.reason.is_some()
    }
}
