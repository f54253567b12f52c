//! RiskLab Core — the position lifecycle and risk-managed simulation engine.
//!
//! This crate contains the heart of the trading platform's simulation path:
//! - Domain types (price bars, positions, portfolio, trades, config)
//! - Pure risk functions (stepped trailing stop, sizing, whipsaw detection)
//! - Exit/entry evaluation and the sequential simulation driver
//! - Minute-precision entry refinement (the only parallel stage)
//! - Run fingerprinting for the determinism contract
//!
//! The same pure risk functions back every driver variant, so the daily
//! path, the minute-refined path, and a live decision loop cannot drift
//! apart — the defect class that motivated this crate.

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod risk;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types crossing the runner/worker boundary are
    /// Send + Sync, so results can move off a worker thread freely.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::BacktestConfig>();
        require_sync::<domain::BacktestConfig>();
        require_send::<domain::PortfolioSnapshot>();
        require_sync::<domain::PortfolioSnapshot>();

        require_send::<data::MarketData>();
        require_sync::<data::MarketData>();

        require_send::<engine::SimulationRun>();
        require_sync::<engine::SimulationRun>();
        require_send::<engine::MinuteData>();
        require_sync::<engine::MinuteData>();

        require_send::<fingerprint::RunFingerprint>();
        require_sync::<fingerprint::RunFingerprint>();
    }
}
