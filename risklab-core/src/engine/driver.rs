//! Simulation driver — the sequential period loop.
//!
//! One pass over the aligned date axis. Period 0 only initializes the
//! clock; for every later period the driver runs exits strictly before
//! entries (freed cash and slots are available the same period), appends
//! trades to the log, and snapshots the portfolio. Decisions at period `t`
//! see data up to and including `t` only, and the portfolio has exactly one
//! mutator — this loop. Everything observable (trade order, candidate
//! order, tie-breaks) is deterministic by construction.

use crate::data::MarketData;
use crate::domain::{
    BacktestConfig, ConfigError, ExitReason, Portfolio, PortfolioSnapshot, Position,
    PositionState, Trade, TradeKind,
};
use crate::engine::entry::select_candidates;
use crate::engine::exit::{decide_exit, ExitAction};
use crate::engine::minute::{refine_entries, MinuteData, RefinedEntry};
use crate::engine::pyramid::{apply_rebuy, select_rebuy_candidates};
use crate::risk::{detect_whipsaw, entry_fill_price, size_entry, stepped_stop};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Errors that stop a run before it starts. Once the loop is running, bad
/// rows degrade per symbol/period instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("insufficient data: need {required} periods, have {available}")]
    InsufficientData { required: usize, available: usize },
}

/// Everything a run produces.
#[derive(Debug)]
pub struct SimulationRun {
    /// Ordered trade log.
    pub trades: Vec<Trade>,
    /// One snapshot per period, including period 0.
    pub snapshots: Vec<PortfolioSnapshot>,
    /// Total equity per period, same cadence as `snapshots`.
    pub equity_curve: Vec<f64>,
    /// Final portfolio state (win/loss tally included).
    pub portfolio: Portfolio,
    /// Data-quality notes accumulated during the run.
    pub warnings: Vec<String>,
}

/// Run the daily simulation.
pub fn run_simulation(
    data: &MarketData,
    config: &BacktestConfig,
) -> Result<SimulationRun, EngineError> {
    run_driver(data, None, config)
}

/// Run with minute-precision entry refinement.
///
/// Identical to [`run_simulation`] except that each buy candidate's fill is
/// refined to the exact minute its target was touched, where minute bars
/// exist. The refinement search is the only parallel stage; its results are
/// merged in symbol order before touching the portfolio.
pub fn run_simulation_with_minutes(
    data: &MarketData,
    minutes: &MinuteData,
    config: &BacktestConfig,
) -> Result<SimulationRun, EngineError> {
    run_driver(data, Some(minutes), config)
}

fn run_driver(
    data: &MarketData,
    minutes: Option<&MinuteData>,
    config: &BacktestConfig,
) -> Result<SimulationRun, EngineError> {
    config.validate()?;
    let periods = data.len();
    if periods < 2 {
        return Err(EngineError::InsufficientData {
            required: 2,
            available: periods,
        });
    }

    tracing::info!(
        "Starting simulation: {} periods, {} symbols, {} initial cash",
        periods,
        data.symbols().count(),
        config.initial_cash
    );

    let mut portfolio = Portfolio::new(config.initial_cash);
    let mut trades: Vec<Trade> = Vec::new();
    let mut snapshots: Vec<PortfolioSnapshot> = Vec::with_capacity(periods);
    let mut equity_curve: Vec<f64> = Vec::with_capacity(periods);
    let mut carried: BTreeMap<String, usize> = BTreeMap::new();

    // Period 0 initializes the clock only: no decisions, just the baseline.
    record_snapshot(&portfolio, data.date(0), &mut snapshots, &mut equity_curve);

    for t in 1..periods {
        process_exits(&mut portfolio, data, t, config, &mut trades, &mut carried);
        process_entries(&mut portfolio, data, t, minutes, config, &mut trades);
        record_snapshot(&portfolio, data.date(t), &mut snapshots, &mut equity_curve);
    }

    let warnings: Vec<String> = carried
        .iter()
        .map(|(sym, n)| format!("{sym}: {n} period(s) without a tradable bar, position carried"))
        .collect();
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        "Simulation complete: {} trades, final value {:.2}",
        trades.len(),
        portfolio.total_value()
    );

    Ok(SimulationRun {
        trades,
        snapshots,
        equity_curve,
        portfolio,
        warnings,
    })
}

fn record_snapshot(
    portfolio: &Portfolio,
    date: NaiveDate,
    snapshots: &mut Vec<PortfolioSnapshot>,
    equity_curve: &mut Vec<f64>,
) {
    let total_value = portfolio.total_value();
    snapshots.push(PortfolioSnapshot {
        date,
        cash: portfolio.cash,
        total_value,
        open_positions: portfolio.open_count(),
    });
    equity_curve.push(total_value);
}

// ─── Exits ───────────────────────────────────────────────────────────

fn process_exits(
    portfolio: &mut Portfolio,
    data: &MarketData,
    t: usize,
    config: &BacktestConfig,
    trades: &mut Vec<Trade>,
    carried: &mut BTreeMap<String, usize>,
) {
    let date = data.date(t);
    let held: Vec<String> = portfolio.positions.keys().cloned().collect();

    for symbol in held {
        let Some(bar) = data.bar(&symbol, t) else {
            // No tradable bar: carry the position unchanged.
            *carried.entry(symbol).or_default() += 1;
            continue;
        };
        let Some(position) = portfolio.positions.get(&symbol) else {
            continue;
        };

        match decide_exit(position, bar, config) {
            ExitAction::Losscut { fill } => {
                close_position(portfolio, &symbol, fill, ExitReason::Losscut, date, config, trades);
            }
            ExitAction::SignalSell { fill } => {
                close_position(
                    portfolio,
                    &symbol,
                    fill,
                    ExitReason::SignalSell,
                    date,
                    config,
                    trades,
                );
            }
            ExitAction::HalfSell => {
                half_sell(portfolio, &symbol, bar.close, date, config, trades);
            }
            ExitAction::Hold => {
                if let Some(pos) = portfolio.positions.get_mut(&symbol) {
                    pos.compound(bar.close);
                    pos.duration += 1;
                    pos.stop_price = stepped_stop(
                        pos.again,
                        pos.stop_price,
                        pos.avg_entry_price,
                        pos.risk_unit,
                        config.init_risk,
                    );
                }
            }
        }
    }
}

fn close_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    fill: f64,
    reason: ExitReason,
    date: NaiveDate,
    config: &BacktestConfig,
    trades: &mut Vec<Trade>,
) {
    let Some(pos) = portfolio.positions.remove(symbol) else {
        return;
    };
    // The exit fill lands intraperiod, so the final leg of the multiplier
    // chain runs from the last mark to the fill price.
    let exit_again = pos.again * (fill / pos.last_close);
    let gross = pos.principal * exit_again;
    let proceeds = gross * (1.0 - config.slippage);
    portfolio.cash += proceeds;
    portfolio.record_exit(exit_again, config.slippage);
    trades.push(Trade {
        symbol: symbol.to_string(),
        kind: TradeKind::Sell,
        quantity: gross / fill,
        price: fill,
        date,
        reason: Some(reason),
        realized_pnl: proceeds - pos.principal,
        again: exit_again,
        holding_periods: pos.duration,
    });
}

fn half_sell(
    portfolio: &mut Portfolio,
    symbol: &str,
    close: f64,
    date: NaiveDate,
    config: &BacktestConfig,
    trades: &mut Vec<Trade>,
) {
    let Some((proceeds, quantity, again, duration, new_principal)) =
        portfolio.positions.get_mut(symbol).map(|pos| {
            // The period return must compound before the sale; dropping it
            // would lose one period from the multiplicative chain.
            pos.compound(close);
            pos.duration += 1;
            let half_value = pos.market_value() / 2.0;
            pos.principal /= 2.0;
            pos.state = PositionState::HalfSold;
            pos.risk_unit *= config.half_sell_risk_multiplier;
            pos.stop_price = stepped_stop(
                pos.again,
                pos.stop_price,
                pos.avg_entry_price,
                pos.risk_unit,
                config.init_risk,
            );
            (
                half_value * (1.0 - config.slippage),
                half_value / close,
                pos.again,
                pos.duration,
                pos.principal,
            )
        })
    else {
        return;
    };

    portfolio.cash += proceeds;
    portfolio.record_exit(again, config.slippage);
    trades.push(Trade {
        symbol: symbol.to_string(),
        kind: TradeKind::HalfSell,
        quantity,
        price: close,
        date,
        reason: Some(ExitReason::HalfSellProfit),
        realized_pnl: proceeds - new_principal,
        again,
        holding_periods: duration,
    });
}

// ─── Entries ─────────────────────────────────────────────────────────

fn process_entries(
    portfolio: &mut Portfolio,
    data: &MarketData,
    t: usize,
    minutes: Option<&MinuteData>,
    config: &BacktestConfig,
    trades: &mut Vec<Trade>,
) {
    let date = data.date(t);
    let selected = select_candidates(data, t, portfolio, config);

    // Read-only parallel refinement; merged symbol-sorted before any
    // portfolio mutation below.
    let refined: BTreeMap<String, RefinedEntry> = match minutes {
        Some(minutes) if !selected.is_empty() => {
            let targets: Vec<(String, f64)> = selected
                .iter()
                .filter_map(|sym| data.bar(sym, t).map(|b| (sym.clone(), b.target_price)))
                .collect();
            refine_entries(&targets, minutes, date)
                .into_iter()
                .map(|r| (r.symbol.clone(), r))
                .collect()
        }
        _ => BTreeMap::new(),
    };

    for symbol in selected {
        let Some(bar) = data.bar(&symbol, t) else {
            continue;
        };
        let fill = match refined.get(&symbol) {
            Some(r) => r.fill_price * (1.0 + config.slippage),
            None => match entry_fill_price(bar, config.slippage) {
                Some(f) => f,
                None => continue,
            },
        };

        let total_value = portfolio.total_value();
        let Some(invest) = size_entry(total_value, portfolio.cash, bar.adr) else {
            continue;
        };

        let check = detect_whipsaw(fill, bar.low, bar.close, config.std_risk, config.init_risk);
        if config.enable_whipsaw && check.stopped {
            // Booked and discarded within the same period: the cash round
            // trips, the tally records an exit, no position remains.
            let exit_again = 1.0 + check.first_period_return;
            let proceeds = invest * exit_again * (1.0 - config.slippage);
            portfolio.cash += proceeds - invest;
            portfolio.record_exit(exit_again, config.slippage);
            trades.push(Trade {
                symbol: symbol.clone(),
                kind: TradeKind::Whipsaw,
                quantity: invest / fill,
                price: bar.close,
                date,
                reason: Some(ExitReason::Whipsaw),
                realized_pnl: proceeds - invest,
                again: exit_again,
                holding_periods: 0,
            });
            continue;
        }

        portfolio.cash -= invest;
        trades.push(Trade {
            symbol: symbol.clone(),
            kind: TradeKind::Buy,
            quantity: invest / fill,
            price: fill,
            date,
            reason: None,
            realized_pnl: 0.0,
            again: 1.0,
            holding_periods: 0,
        });
        portfolio.positions.insert(
            symbol.clone(),
            Position {
                symbol,
                principal: invest,
                avg_entry_price: fill,
                again: 1.0 + check.first_period_return,
                duration: 1,
                stop_price: check.initial_stop,
                risk_unit: config.std_risk,
                state: PositionState::Open,
                last_close: bar.close,
            },
        );
    }

    if config.enable_rebuying {
        process_rebuys(portfolio, data, t, config, trades);
    }
}

fn process_rebuys(
    portfolio: &mut Portfolio,
    data: &MarketData,
    t: usize,
    config: &BacktestConfig,
    trades: &mut Vec<Trade>,
) {
    let date = data.date(t);
    for symbol in select_rebuy_candidates(data, t, portfolio) {
        let Some(bar) = data.bar(&symbol, t) else {
            continue;
        };
        let Some(fill) = entry_fill_price(bar, config.slippage) else {
            continue;
        };
        let total_value = portfolio.total_value();
        let Some(add) = size_entry(total_value, portfolio.cash, bar.adr) else {
            continue;
        };

        let Some((again, duration)) = portfolio.positions.get_mut(&symbol).map(|pos| {
            apply_rebuy(pos, add, fill, bar.close, config.init_risk);
            (pos.again, pos.duration)
        }) else {
            continue;
        };

        portfolio.cash -= add;
        trades.push(Trade {
            symbol,
            kind: TradeKind::Buy,
            quantity: add / fill,
            price: fill,
            date,
            reason: None,
            realized_pnl: 0.0,
            again,
            holding_periods: duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn bar(
        symbol: &str,
        day: u32,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        buy: bool,
        target: f64,
    ) -> PriceBar {
        PriceBar {
            symbol: symbol.into(),
            date: date(day),
            open,
            high,
            low,
            close,
            adr: 3.0,
            buy_signal: buy,
            sell_signal: false,
            target_price: target,
            ranking: None,
        }
    }

    fn config() -> BacktestConfig {
        BacktestConfig::new(100_000.0, 10, 0.002).unwrap()
    }

    /// The reference scenario: buy at period 1, losscut when the stop breaks.
    #[test]
    fn buy_then_losscut() {
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("TEST", 2, 100.0, 103.0, 99.5, 102.0, true, 100.2),
            bar("TEST", 3, 101.0, 101.0, 97.0, 98.0, false, 0.0),
            bar("TEST", 4, 97.0, 97.5, 89.0, 90.0, false, 0.0),
            bar("TEST", 5, 88.0, 88.0, 84.0, 85.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &config()).unwrap();
        assert_eq!(run.trades.len(), 2);

        let entry_fill = 100.2 * 1.002;
        let buy = &run.trades[0];
        assert_eq!(buy.kind, TradeKind::Buy);
        assert!((buy.price - entry_fill).abs() < 1e-9);
        assert!((buy.quantity - 20_000.0 / entry_fill).abs() < 1e-9);

        // Initial stop at the -3% floor; period 3's low (97.0) breaks it.
        let stop = entry_fill * 0.97;
        let sell = &run.trades[1];
        assert_eq!(sell.kind, TradeKind::Sell);
        assert_eq!(sell.reason, Some(ExitReason::Losscut));
        assert_eq!(sell.date, date(3));
        assert!((sell.price - stop).abs() < 1e-9);
        // Fill at the stop makes the exit multiplier exactly 1 - init_risk.
        assert!((sell.again - 0.97).abs() < 1e-12);
        let proceeds = 20_000.0 * 0.97 * 0.998;
        assert!((sell.realized_pnl - (proceeds - 20_000.0)).abs() < 1e-9);

        assert!(run.portfolio.positions.is_empty());
        assert_eq!(run.portfolio.loss_count, 1);
        assert_eq!(run.portfolio.win_count, 0);
    }

    #[test]
    fn whipsaw_leaves_no_position() {
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            // Deep same-bar crash: low -15% against a -3% stop distance.
            bar("TEST", 2, 100.0, 101.0, 85.0, 90.0, true, 100.0),
            bar("TEST", 3, 90.0, 91.0, 89.0, 90.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &config()).unwrap();
        assert_eq!(run.trades.len(), 1);
        let trade = &run.trades[0];
        assert_eq!(trade.kind, TradeKind::Whipsaw);
        assert_eq!(trade.reason, Some(ExitReason::Whipsaw));
        assert_eq!(trade.holding_periods, 0);
        assert!(run.portfolio.positions.is_empty());
        assert_eq!(run.portfolio.loss_count, 1);
    }

    #[test]
    fn whipsaw_toggle_keeps_position() {
        let mut cfg = config();
        cfg.enable_whipsaw = false;
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("TEST", 2, 100.0, 101.0, 85.0, 90.0, true, 100.0),
            bar("TEST", 3, 90.0, 91.0, 89.0, 90.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &cfg).unwrap();
        assert_eq!(run.trades[0].kind, TradeKind::Buy);
        // Without the whipsaw check the position survives entry, then the
        // stop (already marked through a -10% close) goes at period 3.
        assert_eq!(run.trades[1].reason, Some(ExitReason::Losscut));
    }

    #[test]
    fn position_cap_holds_every_period() {
        let mut bars = Vec::new();
        let symbols = ["AAA", "BBB", "CCC", "DDD", "EEE"];
        for day in 1..=6u32 {
            for sym in symbols {
                let base = 100.0;
                bars.push(bar(
                    sym,
                    day,
                    base,
                    base + 2.0,
                    base - 1.0,
                    base + 1.0,
                    day >= 2,
                    base + 0.5,
                ));
            }
        }
        let data = MarketData::from_bars(bars).unwrap();
        let mut cfg = config();
        cfg.max_positions = 3;

        let run = run_simulation(&data, &cfg).unwrap();
        assert!(run.snapshots.iter().all(|s| s.open_positions <= 3));
        assert_eq!(run.portfolio.open_count(), 3);
    }

    #[test]
    fn half_sell_happens_once() {
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("TEST", 2, 100.0, 101.0, 99.5, 100.0, true, 100.0),
            bar("TEST", 3, 120.0, 126.0, 119.0, 125.0, false, 0.0),
            bar("TEST", 4, 126.0, 127.0, 124.0, 126.0, false, 0.0),
            bar("TEST", 5, 126.0, 128.0, 125.0, 127.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &config()).unwrap();
        let half_sells = run
            .trades
            .iter()
            .filter(|t| t.kind == TradeKind::HalfSell)
            .count();
        assert_eq!(half_sells, 1);

        let pos = &run.portfolio.positions["TEST"];
        assert_eq!(pos.state, PositionState::HalfSold);
        assert!((pos.principal - 10_000.0).abs() < 1e-9);
        assert!((pos.risk_unit - 0.10).abs() < 1e-12);
        assert_eq!(run.portfolio.win_count, 1);
    }

    #[test]
    fn missing_bar_carries_position() {
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("TEST", 2, 100.0, 103.0, 99.5, 102.0, true, 100.2),
            // Period 3 exists only via another symbol: TEST has a gap.
            bar("OTHER", 3, 50.0, 51.0, 49.0, 50.0, false, 0.0),
            bar("TEST", 4, 102.0, 104.0, 101.0, 103.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &config()).unwrap();
        let pos = &run.portfolio.positions["TEST"];
        // Periods 2 and 4 marked; 3 skipped.
        assert_eq!(pos.duration, 2);
        assert!(run.warnings.iter().any(|w| w.starts_with("TEST")));
    }

    #[test]
    fn sell_before_buy_frees_the_slot() {
        let mut cfg = config();
        cfg.max_positions = 1;
        let mut sell_bar = bar("AAA", 3, 110.0, 111.0, 109.0, 110.0, false, 0.0);
        sell_bar.sell_signal = true;
        let data = MarketData::from_bars(vec![
            bar("AAA", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("BBB", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("AAA", 2, 100.0, 103.0, 99.5, 102.0, true, 100.2),
            bar("BBB", 2, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            sell_bar,
            bar("BBB", 3, 100.0, 103.0, 99.5, 102.0, true, 100.2),
            bar("AAA", 4, 110.0, 111.0, 109.0, 110.0, false, 0.0),
            bar("BBB", 4, 102.0, 104.0, 101.0, 103.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &cfg).unwrap();
        // Period 3: AAA exits on its signal, then BBB takes the freed slot.
        assert!(run.portfolio.positions.contains_key("BBB"));
        assert!(!run.portfolio.positions.contains_key("AAA"));
        let period3: Vec<&Trade> = run.trades.iter().filter(|t| t.date == date(3)).collect();
        assert_eq!(period3.len(), 2);
        assert_eq!(period3[0].kind, TradeKind::Sell);
        assert_eq!(period3[1].kind, TradeKind::Buy);
    }

    #[test]
    fn rejects_too_few_periods() {
        let data =
            MarketData::from_bars(vec![bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0)])
                .unwrap();
        assert!(matches!(
            run_simulation(&data, &config()),
            Err(EngineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rebuy_adds_to_winner() {
        let mut cfg = config();
        cfg.enable_rebuying = true;
        cfg.enable_half_sell = false; // isolate the pyramid path
        let data = MarketData::from_bars(vec![
            bar("TEST", 1, 100.0, 101.0, 99.0, 100.0, false, 0.0),
            bar("TEST", 2, 100.0, 101.0, 99.5, 100.0, true, 100.0),
            bar("TEST", 3, 108.0, 112.0, 107.0, 110.0, false, 0.0),
            // Fresh buy flag with the position up ~10%: pyramid.
            bar("TEST", 4, 110.0, 113.0, 109.0, 112.0, true, 111.0),
            bar("TEST", 5, 112.0, 114.0, 111.0, 113.0, false, 0.0),
        ])
        .unwrap();

        let run = run_simulation(&data, &cfg).unwrap();
        let buys: Vec<&Trade> = run
            .trades
            .iter()
            .filter(|t| t.kind == TradeKind::Buy)
            .collect();
        assert_eq!(buys.len(), 2);
        let pos = &run.portfolio.positions["TEST"];
        assert!(pos.principal > 20_000.0);
        assert!(pos.avg_entry_price > 100.0 * 1.002);
    }
}
