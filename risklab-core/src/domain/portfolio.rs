//! Portfolio — aggregate state of cash + all open positions + win/loss tally.

use super::position::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate portfolio state.
///
/// The accounting identity must hold at every period:
/// `total_value == cash + sum(position market values)`.
///
/// Positions are keyed by symbol in a `BTreeMap`: iteration order over open
/// positions is part of the engine's observable contract, so a deterministic
/// map is load-bearing here, not a style choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
    pub win_count: usize,
    pub loss_count: usize,
    /// Sum of |again - 1| over winning exits.
    pub win_gain_sum: f64,
    /// Sum of |again - 1| over losing exits.
    pub loss_gain_sum: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            positions: BTreeMap::new(),
            win_count: 0,
            loss_count: 0,
            win_gain_sum: 0.0,
            loss_gain_sum: 0.0,
        }
    }

    /// Total equity = cash + sum of all position market values.
    pub fn total_value(&self) -> f64 {
        self.cash + self.positions.values().map(Position::market_value).sum::<f64>()
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Classify a realized exit and update the win/loss tally.
    ///
    /// The decision applies exit slippage to the raw multiplier:
    /// `net = again * (1 - slippage)`, loss iff `net <= 1`. Returns `true`
    /// for a win.
    pub fn record_exit(&mut self, again: f64, slippage: f64) -> bool {
        let net = again * (1.0 - slippage);
        let gain = (again - 1.0).abs();
        if net <= 1.0 {
            self.loss_count += 1;
            self.loss_gain_sum += gain;
            false
        } else {
            self.win_count += 1;
            self.win_gain_sum += gain;
            true
        }
    }
}
