//! Exit evaluation — the per-position state machine.
//!
//! Pure decision only; the driver applies the resulting mutation so the
//! portfolio keeps a single mutator. Priority order is fixed: LOSSCUT, then
//! SIGNAL_SELL, then HALF_SELL, then HOLD — exactly one action per position
//! per period.

use crate::domain::{BacktestConfig, Position, PriceBar};

/// What happens to one open position this period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitAction {
    /// The low breached the stop; exit at `fill`.
    Losscut { fill: f64 },
    /// The external sell flag fired; exit at the open.
    SignalSell { fill: f64 },
    /// Bank half the position at the close.
    HalfSell,
    /// Compound the period return and advance the stop.
    Hold,
}

/// Decide this period's action for an open position.
///
/// Uses only the current bar and the position's state as of the previous
/// period — the half-sell threshold is checked against the stored `again`,
/// before this period's return is compounded.
pub fn decide_exit(position: &Position, bar: &PriceBar, config: &BacktestConfig) -> ExitAction {
    if bar.low < position.stop_price {
        // Gap below the stop fills at the open; otherwise at the stop.
        let fill = if bar.open < position.stop_price {
            bar.open
        } else {
            position.stop_price
        };
        return ExitAction::Losscut { fill };
    }

    if bar.sell_signal {
        return ExitAction::SignalSell { fill: bar.open };
    }

    if config.enable_half_sell
        && !position.is_half_sold()
        && position.again >= 1.0 + config.half_sell_threshold
    {
        return ExitAction::HalfSell;
    }

    ExitAction::Hold
}
