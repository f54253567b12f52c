//! Backtest result — everything one run produces, ready for export.

use crate::metrics::SummaryMetrics;
use risklab_core::domain::{BacktestConfig, PortfolioSnapshot, Trade};
use risklab_core::fingerprint::RunFingerprint;
use serde::{Deserialize, Serialize};

/// Complete result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// The config that produced this result (for reruns and manifests).
    pub config: BacktestConfig,
    /// Ordered trade log.
    pub trades: Vec<Trade>,
    /// One snapshot per period.
    pub snapshots: Vec<PortfolioSnapshot>,
    /// Total equity per period.
    pub equity_curve: Vec<f64>,
    pub metrics: SummaryMetrics,
    /// Deterministic identity of config + trade log.
    pub fingerprint: RunFingerprint,
    /// Data-quality warnings accumulated during the run.
    pub warnings: Vec<String>,
}

impl BacktestResult {
    pub fn period_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}
