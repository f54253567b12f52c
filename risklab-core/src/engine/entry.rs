//! Entry candidate selection.

use crate::data::MarketData;
use crate::domain::{BacktestConfig, CandidateOrder, Portfolio};
use std::cmp::Ordering;

/// Symbols eligible to open a new position at period `t`, bounded by free
/// slots.
///
/// A candidate must carry a buy flag, a usable target price, and must not be
/// held already. Under [`CandidateOrder::Ranked`] candidates sort descending
/// by their ranking metric (stable, so missing metrics and ties keep symbol
/// order); under [`CandidateOrder::SignalOrder`] symbol order is used as-is.
pub fn select_candidates(
    data: &MarketData,
    t: usize,
    portfolio: &Portfolio,
    config: &BacktestConfig,
) -> Vec<String> {
    let free_slots = config.max_positions.saturating_sub(portfolio.open_count());
    if free_slots == 0 {
        return Vec::new();
    }

    // Symbol order from the data map keeps this pass deterministic.
    let mut candidates: Vec<(&str, Option<f64>)> = data
        .symbols()
        .filter(|sym| !portfolio.has_position(sym))
        .filter_map(|sym| {
            let bar = data.bar(sym, t)?;
            (bar.buy_signal && bar.has_valid_target()).then_some((sym, bar.ranking))
        })
        .collect();

    if config.candidate_order == CandidateOrder::Ranked {
        candidates.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    candidates
        .into_iter()
        .take(free_slots)
        .map(|(sym, _)| sym.to_string())
        .collect()
}
