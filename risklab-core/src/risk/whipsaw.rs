//! Whipsaw detection — same-bar stop-out at entry time.

use super::trailing_stop::stepped_stop;

/// Outcome of the whipsaw check for a freshly filled entry.
#[derive(Debug, Clone, Copy)]
pub struct WhipsawCheck {
    /// The bar's low already breached the position's would-be initial stop.
    pub stopped: bool,
    /// Return from the fill price to the bar's close.
    pub first_period_return: f64,
    /// The stop the position would start with.
    pub initial_stop: f64,
}

/// Decide whether an entry is stopped out within its own bar.
///
/// `entry_price` is the actual fill (slippage included). The initial stop is
/// the stepped stop seeded with the first period's return and no previous
/// stop. If the bar's low dipped further below entry than the stop distance,
/// the trade never survives the bar: it is booked as a whipsaw and the
/// would-be position discarded.
pub fn detect_whipsaw(
    entry_price: f64,
    low: f64,
    close: f64,
    risk_unit: f64,
    init_risk: f64,
) -> WhipsawCheck {
    let first_period_return = (close - entry_price) / entry_price;
    let initial_stop = stepped_stop(1.0 + first_period_return, 0.0, entry_price, risk_unit, init_risk);
    let low_gain = (low - entry_price) / entry_price;
    let cut_gain = (initial_stop - entry_price) / entry_price;
    WhipsawCheck {
        stopped: low_gain < cut_gain,
        first_period_return,
        initial_stop,
    }
}
