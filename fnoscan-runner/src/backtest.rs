//! Per-symbol backtests across a universe.
//!
//! Each symbol is fetched once and run through the simulator. Fetch failures
//! and series shorter than the slow average become `Skipped` outcomes. The
//! overall summary is computed after every symbol has finished, over all
//! evaluated trades.

use crate::filter::SkipReason;
use fnoscan_core::data::{FetchRequest, HistoryRange, PriceSource};
use fnoscan_core::domain::{Interval, Trade};
use fnoscan_core::{simulate, summarize, SimulationMode, SimulatorConfig, Summary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestSettings {
    pub simulator: SimulatorConfig,
    pub mode: SimulationMode,
    pub request: FetchRequest,
    pub parallel: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            mode: SimulationMode::Daily,
            request: FetchRequest::new(HistoryRange::Months(6), Interval::Day1),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestOutcome {
    Evaluated {
        summary: Summary,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        trades: Vec<Trade>,
    },
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl BacktestOutcome {
    /// Summary of an evaluated symbol; skipped symbols report zeros.
    pub fn summary(&self) -> Summary {
        match self {
            BacktestOutcome::Evaluated { summary, .. } => *summary,
            BacktestOutcome::Skipped { .. } => Summary::default(),
        }
    }

    pub fn trades(&self) -> &[Trade] {
        match self {
            BacktestOutcome::Evaluated { trades, .. } => trades,
            BacktestOutcome::Skipped { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolBacktest {
    pub symbol: String,
    pub outcome: BacktestOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub mode: SimulationMode,
    pub results: Vec<SymbolBacktest>,
    /// Summary over the trades of every evaluated symbol.
    pub overall: Summary,
}

impl BacktestReport {
    pub fn evaluated(&self) -> impl Iterator<Item = &SymbolBacktest> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, BacktestOutcome::Evaluated { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            BacktestOutcome::Skipped { reason } => Some((r.symbol.as_str(), reason)),
            BacktestOutcome::Evaluated { .. } => None,
        })
    }
}

/// Fetch and simulate one symbol.
pub fn backtest_symbol(
    source: &dyn PriceSource,
    symbol: &str,
    settings: &BacktestSettings,
) -> BacktestOutcome {
    debug!(symbol, request = %settings.request, "downloading backtest data");
    let series = match source.fetch(symbol, &settings.request) {
        Ok(series) => series,
        Err(e) => {
            return BacktestOutcome::Skipped {
                reason: SkipReason::DataUnavailable {
                    detail: e.to_string(),
                },
            }
        }
    };

    let needed = settings.simulator.params.longest();
    if series.len() < needed {
        return BacktestOutcome::Skipped {
            reason: SkipReason::InsufficientHistory {
                needed,
                got: series.len(),
            },
        };
    }

    let trades = simulate(&series, settings.mode, &settings.simulator);
    let summary = summarize(&trades);
    debug!(
        symbol,
        trades = summary.trade_count,
        win_rate = summary.win_rate,
        avg_return = summary.avg_return,
        "backtest complete"
    );
    BacktestOutcome::Evaluated { summary, trades }
}

/// Backtest every symbol; results keep input order.
pub fn backtest_universe(
    source: &dyn PriceSource,
    symbols: &[String],
    settings: &BacktestSettings,
) -> BacktestReport {
    let run = |symbol: &String| SymbolBacktest {
        symbol: symbol.clone(),
        outcome: backtest_symbol(source, symbol, settings),
    };
    let results: Vec<SymbolBacktest> = if settings.parallel {
        symbols.par_iter().map(run).collect()
    } else {
        symbols.iter().map(run).collect()
    };

    let all_trades: Vec<Trade> = results
        .iter()
        .flat_map(|r| r.outcome.trades().iter().copied())
        .collect();
    let overall = summarize(&all_trades);

    let report = BacktestReport {
        mode: settings.mode,
        results,
        overall,
    };
    info!(
        symbols = report.results.len(),
        skipped = report.skipped().count(),
        trades = overall.trade_count,
        "backtests complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rising_daily, ScriptedSource};
    use fnoscan_core::{MaKind, MaParams};

    fn settings() -> BacktestSettings {
        BacktestSettings {
            simulator: SimulatorConfig::new(MaParams::new(3, 6, MaKind::Simple).unwrap()),
            ..BacktestSettings::default()
        }
    }

    #[test]
    fn rising_symbol_wins_every_trade() {
        let source = ScriptedSource::new().with_daily("UP", rising_daily(40, 1.0));
        let outcome = backtest_symbol(&source, "UP", &settings());
        let summary = outcome.summary();
        assert!(summary.trade_count > 0);
        assert_eq!(summary.win_rate, 1.0);
        assert_eq!(outcome.trades().len(), summary.trade_count);
    }

    #[test]
    fn missing_and_short_symbols_are_skipped() {
        let source = ScriptedSource::new().with_daily("NEW", rising_daily(4, 1.0));
        assert!(matches!(
            backtest_symbol(&source, "GONE", &settings()),
            BacktestOutcome::Skipped {
                reason: SkipReason::DataUnavailable { .. }
            }
        ));
        assert_eq!(
            backtest_symbol(&source, "NEW", &settings()),
            BacktestOutcome::Skipped {
                reason: SkipReason::InsufficientHistory { needed: 6, got: 4 }
            }
        );
    }

    #[test]
    fn overall_summary_pools_evaluated_trades() {
        let source = ScriptedSource::new()
            .with_daily("UP", rising_daily(40, 1.0))
            .with_daily("FLAT", rising_daily(40, 0.0));
        let symbols: Vec<String> = ["UP", "GONE", "FLAT"].iter().map(|s| s.to_string()).collect();
        let report = backtest_universe(&source, &symbols, &settings());

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[1].symbol, "GONE");
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(report.evaluated().count(), 2);

        let up = report.results[0].outcome.summary();
        let flat = report.results[2].outcome.summary();
        assert_eq!(flat.trade_count, 0);
        assert_eq!(report.overall, up);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut source = ScriptedSource::new();
        let symbols: Vec<String> = (0..12).map(|i| format!("S{i}")).collect();
        for (i, sym) in symbols.iter().enumerate() {
            source = source.with_daily(sym, rising_daily(30 + i, 1.0 - 0.2 * i as f64));
        }
        let sequential = backtest_universe(&source, &symbols, &settings());
        let parallel = backtest_universe(
            &source,
            &symbols,
            &BacktestSettings {
                parallel: true,
                ..settings()
            },
        );
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = BacktestOutcome::Skipped {
            reason: SkipReason::InsufficientHistory { needed: 50, got: 3 },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "insufficient_history");
        assert_eq!(json["needed"], 50);
    }
}
