//! Summary metrics — pure functions over the run's outputs.
//!
//! Every metric is a pure function: equity curve, snapshots, or portfolio
//! tally in, scalar out. No dependency on the driver or the data layer.

use risklab_core::domain::{Portfolio, PortfolioSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate metrics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_return: f64,
    pub win_rate: f64,
    /// Average winning gain over average losing gain; 0 when undefined.
    pub win_loss_gain: f64,
    /// Negative fraction (e.g. -0.15 = 15% peak-to-trough).
    pub max_drawdown: f64,
    pub final_value: f64,
    pub win_count: usize,
    pub loss_count: usize,
    pub avg_cash_ratio: f64,
    pub max_positions: usize,
}

impl SummaryMetrics {
    /// Compute all metrics from a finished run.
    pub fn compute(
        equity_curve: &[f64],
        snapshots: &[PortfolioSnapshot],
        portfolio: &Portfolio,
        initial_cash: f64,
        max_positions: usize,
    ) -> Self {
        let final_value = equity_curve.last().copied().unwrap_or(initial_cash);
        Self {
            total_return: (final_value - initial_cash) / initial_cash,
            win_rate: win_rate(portfolio),
            win_loss_gain: win_loss_gain(portfolio),
            max_drawdown: max_drawdown(equity_curve),
            final_value,
            win_count: portfolio.win_count,
            loss_count: portfolio.loss_count,
            avg_cash_ratio: avg_cash_ratio(snapshots),
            max_positions,
        }
    }

    /// Flat map form for downstream consumers that want opaque key/values.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("total_return".to_string(), self.total_return),
            ("win_rate".to_string(), self.win_rate),
            ("win_loss_gain".to_string(), self.win_loss_gain),
            ("max_drawdown".to_string(), self.max_drawdown),
            ("final_value".to_string(), self.final_value),
            ("win_count".to_string(), self.win_count as f64),
            ("loss_count".to_string(), self.loss_count as f64),
            ("avg_cash_ratio".to_string(), self.avg_cash_ratio),
            ("max_positions".to_string(), self.max_positions as f64),
        ])
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of realized exits that were wins.
pub fn win_rate(portfolio: &Portfolio) -> f64 {
    let total = portfolio.win_count + portfolio.loss_count;
    if total == 0 {
        return 0.0;
    }
    portfolio.win_count as f64 / total as f64
}

/// Average winning gain over average losing gain.
///
/// Undefined (returns 0.0) until at least one win and one loss exist.
pub fn win_loss_gain(portfolio: &Portfolio) -> f64 {
    if portfolio.win_count == 0 || portfolio.loss_count == 0 {
        return 0.0;
    }
    let avg_win = portfolio.win_gain_sum / portfolio.win_count as f64;
    let avg_loss = portfolio.loss_gain_sum / portfolio.loss_count as f64;
    if avg_loss < 1e-15 {
        return 0.0;
    }
    avg_win / avg_loss
}

/// Maximum drawdown as a negative fraction of the running peak.
///
/// Returns 0.0 for constant or monotonically increasing equity.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Mean cash fraction across all snapshots.
pub fn avg_cash_ratio(snapshots: &[PortfolioSnapshot]) -> f64 {
    if snapshots.is_empty() {
        return 0.0;
    }
    snapshots.iter().map(PortfolioSnapshot::cash_ratio).sum::<f64>() / snapshots.len() as f64
}
