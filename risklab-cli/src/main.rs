//! RiskLab CLI — run a risk-managed trade simulation from files.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config and a CSV bar file,
//!   optionally refining entries against a minute-bar CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use risklab_core::domain::BacktestConfig;
use risklab_runner::{load_bars_csv, load_minutes_csv, run_backtest, save_artifacts, BacktestResult};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "risklab", about = "RiskLab — position lifecycle simulation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file and a CSV bar file.
    Run {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Path to the daily bar CSV
        /// (symbol,date,open,high,low,close,adr,buy_signal,sell_signal,target_price[,ranking]).
        #[arg(long)]
        bars: PathBuf,

        /// Optional minute bar CSV (symbol,ts,open,high,low,close) for
        /// entry-timing refinement.
        #[arg(long)]
        minutes: Option<PathBuf>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            bars,
            minutes,
            output_dir,
        } => run_cmd(config, bars, minutes, output_dir),
    }
}

fn run_cmd(
    config_path: PathBuf,
    bars_path: PathBuf,
    minutes_path: Option<PathBuf>,
    output_dir: PathBuf,
) -> Result<()> {
    let config_text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    let config = BacktestConfig::from_toml(&config_text)
        .with_context(|| format!("Invalid config {}", config_path.display()))?;

    let (data, load_warnings) = load_bars_csv(&bars_path)?;
    let minutes = minutes_path.as_deref().map(load_minutes_csv).transpose()?;

    let result = run_backtest(&config, &data, minutes.as_ref())?;

    print_summary(&result);
    for warning in load_warnings.iter().chain(&result.warnings) {
        println!("WARNING: {warning}");
    }

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.fingerprint.short());
    println!("Periods:        {}", result.period_count());
    println!("Trades:         {}", result.trade_count());
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", result.metrics.total_return * 100.0);
    println!("Final Value:    {:.2}", result.metrics.final_value);
    println!("Max Drawdown:   {:.2}%", result.metrics.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", result.metrics.win_rate * 100.0);
    println!(
        "Wins / Losses:  {} / {}",
        result.metrics.win_count, result.metrics.loss_count
    );
    println!("Win/Loss Gain:  {:.2}", result.metrics.win_loss_gain);
    println!("Avg Cash Ratio: {:.1}%", result.metrics.avg_cash_ratio * 100.0);
    println!();
}
