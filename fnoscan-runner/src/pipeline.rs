//! Scan pipeline: validate → universe → filters → hook → backtests.

use crate::backtest::{backtest_universe, BacktestReport};
use crate::config::{ConfigError, RunId, ScanConfig};
use crate::filter::{run_filters, FilterReport, SkipReason};
use crate::hook::{apply_hook, load_strategy, StrategyHook};
use crate::predictor::predict_index_movement;
use chrono::{Local, NaiveDateTime};
use fnoscan_core::data::{DataError, PriceSource, SymbolUniverse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load symbol universe: {0}")]
    Universe(#[from] DataError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Structured result of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: RunId,
    pub started_at: NaiveDateTime,
    pub universe_size: usize,
    pub shortlisted: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
    pub filters: FilterReport,
    pub up_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtests: Option<BacktestReport>,
}

/// Run a scan with the hook named in the config, if any.
pub fn run_scan(
    config: &ScanConfig,
    source: &dyn PriceSource,
    universe: &dyn SymbolUniverse,
) -> Result<ScanReport, PipelineError> {
    let hook = match &config.strategy.hook {
        Some(spec) => Some(load_strategy(spec).map_err(ConfigError::from)?),
        None => None,
    };
    run_scan_with_hook(config, source, universe, hook.as_deref())
}

/// Run a scan with an explicit hook, overriding the configured one.
pub fn run_scan_with_hook(
    config: &ScanConfig,
    source: &dyn PriceSource,
    universe: &dyn SymbolUniverse,
    hook: Option<&dyn StrategyHook>,
) -> Result<ScanReport, PipelineError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let filter_settings = config.filter_settings()?;
    let backtest_settings = config.backtest_settings()?;
    let started_at = Local::now().naive_local();

    let symbols = universe.symbols()?;
    info!(run_id = %run_id, symbols = symbols.len(), mode = %config.filter.mode, "scan started");

    let filters = run_filters(source, &symbols, &filter_settings, config.filter.mode);
    let mut shortlisted = filters.shortlisted();
    if let Some(hook) = hook {
        let before = shortlisted.len();
        shortlisted = apply_hook(hook, &shortlisted);
        info!(hook = hook.name(), before, after = shortlisted.len(), "strategy hook applied");
    }

    let skipped: Vec<SkippedSymbol> = filters
        .skipped()
        .map(|(symbol, reason)| {
            warn!(symbol, %reason, "symbol skipped");
            SkippedSymbol {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }
        })
        .collect();

    let backtests = config
        .backtest
        .enabled
        .then(|| backtest_universe(source, &shortlisted, &backtest_settings));

    let up_probability =
        predict_index_movement(shortlisted.len(), config.schedule.prediction_threshold);
    info!(
        shortlisted = shortlisted.len(),
        skipped = skipped.len(),
        up_probability,
        "scan complete"
    );

    Ok(ScanReport {
        run_id,
        started_at,
        universe_size: symbols.len(),
        shortlisted,
        skipped,
        filters,
        up_probability,
        backtests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMode;
    use crate::testing::{rising_daily, rising_intraday, ScriptedSource};
    use fnoscan_core::data::StaticUniverse;

    fn config() -> ScanConfig {
        let mut config = ScanConfig::default();
        config.strategy.fast = 3;
        config.strategy.slow = 6;
        config
    }

    fn source() -> ScriptedSource {
        ScriptedSource::new()
            .with_daily("NTPC", rising_daily(30, 1.0))
            .with_intraday("NTPC", rising_intraday(20, 1.0))
            .with_daily("INFY", rising_daily(30, 1.0))
            .with_intraday("INFY", rising_intraday(20, 1.0))
            .with_daily("SBIN", rising_daily(30, -1.0))
    }

    #[test]
    fn scan_shortlists_and_records_skips() {
        let universe = StaticUniverse::new(["NTPC", "INFY", "SBIN", "GONE"]);
        let report = run_scan(&config(), &source(), &universe).unwrap();
        assert_eq!(report.universe_size, 4);
        assert_eq!(report.shortlisted, vec!["NTPC", "INFY"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].symbol, "GONE");
        assert!(report.backtests.is_none());
    }

    #[test]
    fn configured_hook_filters_shortlist() {
        let mut config = config();
        config.strategy.hook = Some("prefix:N".into());
        let universe = StaticUniverse::new(["NTPC", "INFY"]);
        let report = run_scan(&config, &source(), &universe).unwrap();
        assert_eq!(report.shortlisted, vec!["NTPC"]);
    }

    #[test]
    fn invalid_config_fails_before_any_fetch() {
        let mut config = config();
        config.strategy.fast = 10;
        let err = run_scan(&config, &source(), &StaticUniverse::new(["NTPC"])).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::Params(_))));
    }

    #[test]
    fn empty_universe_is_an_empty_report() {
        let report = run_scan(&config(), &source(), &StaticUniverse::default()).unwrap();
        assert_eq!(report.universe_size, 0);
        assert!(report.shortlisted.is_empty());
        assert!(report.filters.is_empty());
    }

    #[test]
    fn backtests_run_on_the_shortlist() {
        let mut config = config();
        config.filter.mode = FilterMode::Daily;
        config.backtest.enabled = true;
        let universe = StaticUniverse::new(["NTPC", "SBIN"]);
        let report = run_scan(&config, &source(), &universe).unwrap();
        let backtests = report.backtests.unwrap();
        assert_eq!(backtests.results.len(), 1);
        assert_eq!(backtests.results[0].symbol, "NTPC");
        assert_eq!(backtests.overall.win_rate, 1.0);
    }
}
