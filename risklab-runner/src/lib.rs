//! RiskLab Runner — backtest orchestration.
//!
//! Loads bar data, drives `risklab-core`'s simulation, computes summary
//! metrics, and exports per-run artifacts. The engine stays pure and
//! in-memory; everything touching the filesystem lives here.

pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;

pub use data_loader::{load_bars_csv, load_minutes_csv};
pub use export::save_artifacts;
pub use metrics::SummaryMetrics;
pub use result::BacktestResult;
pub use runner::run_backtest;
