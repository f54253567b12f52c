//! Pyramiding — adding capital to an already-profitable position.

use crate::data::MarketData;
use crate::domain::{Portfolio, Position};
use crate::risk::stepped_stop;

/// Held symbols eligible for a rebuy at period `t`, in symbol order.
///
/// A rebuy requires a fresh buy flag, a usable target, an un-halved
/// position, and at least one full risk step of accrued profit — adding to
/// losers is exactly what pyramiding must never do.
pub fn select_rebuy_candidates(data: &MarketData, t: usize, portfolio: &Portfolio) -> Vec<String> {
    portfolio
        .positions
        .iter()
        .filter_map(|(sym, pos)| {
            let bar = data.bar(sym, t)?;
            let qualifies = bar.buy_signal
                && bar.has_valid_target()
                && !pos.is_half_sold()
                && pos.again >= 1.0 + pos.risk_unit;
            qualifies.then(|| sym.clone())
        })
        .collect()
}

/// Fold `add` cash (filled at `fill`, marked at `close`) into a position.
///
/// The re-basing preserves market value: the new `again` is the blended
/// multiplier `(principal·again + add·close/fill) / (principal + add)`, and
/// the average entry price becomes the cost-weighted blend of the old basis
/// and the new fill. The stop is recomputed against the new geometry but
/// still ratchets against its previous value.
pub fn apply_rebuy(position: &mut Position, add: f64, fill: f64, close: f64, init_risk: f64) {
    let cost_shares = position.principal / position.avg_entry_price;
    let add_shares = add / fill;
    position.avg_entry_price = (position.principal + add) / (cost_shares + add_shares);

    let value_after = position.principal * position.again + add * (close / fill);
    position.principal += add;
    position.again = value_after / position.principal;
    position.last_close = close;

    position.stop_price = stepped_stop(
        position.again,
        position.stop_price,
        position.avg_entry_price,
        position.risk_unit,
        init_risk,
    );
}
