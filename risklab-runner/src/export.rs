//! Artifact export — one directory per run with the trade tape, equity
//! curve, and summary.

use crate::result::BacktestResult;
use anyhow::{Context, Result};
use risklab_core::domain::{ExitReason, Trade, TradeKind};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `trades.csv`, `trades.json`, `equity.csv` and `summary.json` into
/// `<out_dir>/run-<fingerprint>/`. Returns the run directory.
pub fn save_artifacts(result: &BacktestResult, out_dir: &Path) -> Result<PathBuf> {
    let run_dir = out_dir.join(format!("run-{}", result.fingerprint.short()));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

    write_trades_csv(&run_dir.join("trades.csv"), &result.trades)?;
    write_trades_json(&run_dir.join("trades.json"), &result.trades)?;
    write_equity_csv(&run_dir.join("equity.csv"), result)?;
    write_summary_json(&run_dir.join("summary.json"), result)?;

    Ok(run_dir)
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;

    writeln!(
        file,
        "symbol,kind,quantity,price,date,reason,realized_pnl,again,holding_periods"
    )?;

    for trade in trades {
        let kind = match trade.kind {
            TradeKind::Buy => "Buy",
            TradeKind::Sell => "Sell",
            TradeKind::HalfSell => "HalfSell",
            TradeKind::Whipsaw => "Whipsaw",
        };
        let reason = match trade.reason {
            Some(ExitReason::Losscut) => "Losscut",
            Some(ExitReason::SignalSell) => "SignalSell",
            Some(ExitReason::HalfSellProfit) => "HalfSellProfit",
            Some(ExitReason::Whipsaw) => "Whipsaw",
            None => "",
        };
        writeln!(
            file,
            "{},{},{:.4},{:.4},{},{},{:.4},{:.6},{}",
            trade.symbol,
            kind,
            trade.quantity,
            trade.price,
            trade.date,
            reason,
            trade.realized_pnl,
            trade.again,
            trade.holding_periods
        )?;
    }

    Ok(())
}

pub fn write_trades_json(path: &Path, trades: &[Trade]) -> Result<()> {
    let json = serde_json::to_string_pretty(trades).context("Failed to serialize trades")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write trades JSON {}", path.display()))?;
    Ok(())
}

fn write_equity_csv(path: &Path, result: &BacktestResult) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;

    writeln!(file, "date,cash,total_value,open_positions")?;
    for snap in &result.snapshots {
        writeln!(
            file,
            "{},{:.4},{:.4},{}",
            snap.date, snap.cash, snap.total_value, snap.open_positions
        )?;
    }
    Ok(())
}

fn write_summary_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let summary = serde_json::json!({
        "fingerprint": result.fingerprint,
        "config": result.config,
        "metrics": result.metrics.to_map(),
        "trade_count": result.trade_count(),
        "period_count": result.period_count(),
        "warnings": result.warnings,
    });
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary JSON {}", path.display()))?;
    Ok(())
}
