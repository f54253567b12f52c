//! Stepped trailing stop — the one stop contract every driver shares.
//!
//! The stop advances in discrete `risk_unit`-sized steps as profit accrues
//! and never retreats. The legacy system carried three diverging copies of
//! this computation (daily backtest, minute backtest, live monitor); this
//! function is the single replacement all of them call.

/// Compute the new stop price for a position.
///
/// `again` is the cumulative return multiplier since entry, `previous_stop`
/// the stop currently in force (pass `0.0` at entry), `risk_unit` the step
/// size and `init_risk` the minimum stop distance below the entry price.
///
/// Until one full step of profit exists the stop sits at the entry floor
/// `avg_entry_price * (1 - init_risk)`. From then on each additional
/// `risk_unit` of profit lifts the stop one step, always one step behind
/// the profit level. The result is clamped to the floor and ratcheted
/// against `previous_stop`, so the stop is monotonically non-decreasing
/// over a position's lifetime.
pub fn stepped_stop(
    again: f64,
    previous_stop: f64,
    avg_entry_price: f64,
    risk_unit: f64,
    init_risk: f64,
) -> f64 {
    let profit_units = ((again - 1.0) / risk_unit).floor();
    let floor_price = avg_entry_price * (1.0 - init_risk);
    let candidate = if profit_units < 1.0 {
        floor_price
    } else {
        avg_entry_price * (1.0 + (profit_units - 1.0) * risk_unit)
    };
    candidate.max(floor_price).max(previous_stop)
}
