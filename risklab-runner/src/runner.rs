//! Run orchestration — config + data in, `BacktestResult` out.

use crate::metrics::SummaryMetrics;
use crate::result::BacktestResult;
use risklab_core::data::MarketData;
use risklab_core::domain::BacktestConfig;
use risklab_core::engine::{run_simulation, run_simulation_with_minutes, EngineError, MinuteData};
use risklab_core::fingerprint::fingerprint_run;

/// Run one backtest and assemble the full result.
///
/// Pass `minutes` to refine entry fills to the exact touch minute; without
/// it the daily open/high approximation applies.
pub fn run_backtest(
    config: &BacktestConfig,
    data: &MarketData,
    minutes: Option<&MinuteData>,
) -> Result<BacktestResult, EngineError> {
    let run = match minutes {
        Some(minutes) => run_simulation_with_minutes(data, minutes, config),
        None => run_simulation(data, config),
    }?;

    let metrics = SummaryMetrics::compute(
        &run.equity_curve,
        &run.snapshots,
        &run.portfolio,
        config.initial_cash,
        config.max_positions,
    );
    let fingerprint = fingerprint_run(&run.trades, config);

    tracing::info!(
        "Run {}: {} trades, total return {:.2}%, max drawdown {:.2}%",
        fingerprint.short(),
        run.trades.len(),
        metrics.total_return * 100.0,
        metrics.max_drawdown * 100.0,
    );

    Ok(BacktestResult {
        config: config.clone(),
        trades: run.trades,
        snapshots: run.snapshots,
        equity_curve: run.equity_curve,
        metrics,
        fingerprint,
        warnings: run.warnings,
    })
}
