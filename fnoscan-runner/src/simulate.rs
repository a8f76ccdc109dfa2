//! Market simulation: backtest a universe and keep a running trade log.

use crate::backtest::{backtest_universe, BacktestOutcome, BacktestReport, BacktestSettings};
use crate::filter::SkipReason;
use chrono::NaiveDate;
use fnoscan_core::data::PriceSource;
use serde::{Deserialize, Serialize};

/// One trade with the cumulative return up to and including it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub entry: f64,
    pub exit: f64,
    pub pct_return: f64,
    pub cum_pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSimulation {
    /// Symbols with at least one trade, in input order.
    pub shortlisted: Vec<String>,
    pub log: Vec<TradeLogRow>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl MarketSimulation {
    /// Final cumulative return, 0 with no trades.
    pub fn total_pnl(&self) -> f64 {
        self.log.last().map_or(0.0, |row| row.cum_pnl)
    }
}

/// Build the trade log from a finished backtest report.
///
/// Rows are ordered symbol by symbol, then by trade; `cum_pnl` sums
/// `pct_return` along that order.
pub fn trade_log(report: &BacktestReport) -> MarketSimulation {
    let mut sim = MarketSimulation::default();
    let mut cum_pnl = 0.0;
    for result in &report.results {
        let trades = match &result.outcome {
            BacktestOutcome::Skipped { reason } => {
                sim.skipped.push((result.symbol.clone(), reason.clone()));
                continue;
            }
            BacktestOutcome::Evaluated { trades, .. } if trades.is_empty() => continue,
            BacktestOutcome::Evaluated { trades, .. } => trades,
        };
        sim.shortlisted.push(result.symbol.clone());
        for trade in trades {
            cum_pnl += trade.pct_return();
            sim.log.push(TradeLogRow {
                symbol: result.symbol.clone(),
                date: trade.date(),
                entry: trade.entry_price(),
                exit: trade.exit_price(),
                pct_return: trade.pct_return(),
                cum_pnl,
            });
        }
    }
    sim
}

/// Backtest `symbols` and collect every trade into one log.
pub fn simulate_market(
    source: &dyn PriceSource,
    symbols: &[String],
    settings: &BacktestSettings,
) -> MarketSimulation {
    trade_log(&backtest_universe(source, symbols, settings))
}
