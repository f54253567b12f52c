//! Position sizing and entry fill pricing.

use crate::domain::PriceBar;

/// ADR level (percent) above which sizing is halved.
pub const HIGH_ADR_THRESHOLD: f64 = 5.0;
/// Equity fraction committed to a high-volatility entry.
pub const HIGH_ADR_RATIO: f64 = 0.10;
/// Equity fraction committed to a normal entry.
pub const BASE_RATIO: f64 = 0.20;
/// Entries below this fraction of equity are not worth opening.
pub const MIN_INVEST_FRACTION: f64 = 0.01;

/// Equity fraction to commit given the symbol's ADR (percent).
pub fn entry_ratio(adr: f64) -> f64 {
    if adr >= HIGH_ADR_THRESHOLD {
        HIGH_ADR_RATIO
    } else {
        BASE_RATIO
    }
}

/// Cash to commit to a new entry, or `None` if the entry is not viable.
///
/// Capped by available cash; rejected when the cap leaves less than
/// [`MIN_INVEST_FRACTION`] of total equity. Running out of cash therefore
/// quietly limits how many positions open — it is not an error.
pub fn size_entry(total_value: f64, cash: f64, adr: f64) -> Option<f64> {
    let target_cash = total_value * entry_ratio(adr);
    let invest = target_cash.min(cash);
    if invest < total_value * MIN_INVEST_FRACTION {
        return None;
    }
    Some(invest)
}

/// Entry fill price from the daily bar, slippage included.
///
/// The target is a touch trigger: if it lies within `[open, high]` the fill
/// is at the target; if the bar opens beyond it the fill gaps to the open.
/// Returns `None` when the bar carries no usable target.
pub fn entry_fill_price(bar: &PriceBar, slippage: f64) -> Option<f64> {
    if !bar.has_valid_target() {
        return None;
    }
    let raw = if bar.target_price >= bar.open && bar.target_price <= bar.high {
        bar.target_price
    } else {
        bar.open
    };
    Some(raw * (1.0 + slippage))
}
