//! fnoscan runner — multi-symbol orchestration on top of `fnoscan-core`.
//!
//! This crate provides:
//! - TOML scan configuration with fail-fast validation
//! - DMA pre-scan filter and intraday scan with typed skip verdicts
//! - Per-symbol backtests and market simulation trade logs
//! - Strategy hooks, the index predictor and Telegram notifications
//! - The scan pipeline and its text, CSV and JSON exports

pub mod backtest;
pub mod config;
pub mod export;
pub mod filter;
pub mod hook;
pub mod notify;
pub mod pipeline;
pub mod predictor;
pub mod simulate;

#[cfg(test)]
pub(crate) mod testing;

pub use backtest::{
    backtest_symbol, backtest_universe, BacktestOutcome, BacktestReport, BacktestSettings,
    SymbolBacktest,
};
pub use config::{ConfigError, RunId, ScanConfig};
pub use export::{save_scan_outputs, write_shortlist, write_trade_log};
pub use filter::{
    dma_filter, intraday_scan, run_filters, FilterMode, FilterReport, FilterSettings, SkipReason,
    SymbolVerdict,
};
pub use hook::{apply_hook, load_strategy, HookError, StrategyHook};
pub use notify::{market_message, Notifier, NotifyError, TelegramNotifier};
pub use pipeline::{run_scan, run_scan_with_hook, PipelineError, ScanReport};
pub use predictor::{compare_with_indices, predict_index_movement, IndexComparison};
pub use simulate::{simulate_market, MarketSimulation, TradeLogRow};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn reports_are_send_sync() {
        assert_send::<ScanReport>();
        assert_sync::<ScanReport>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<FilterReport>();
        assert_sync::<FilterReport>();
        assert_send::<MarketSimulation>();
        assert_sync::<MarketSimulation>();
    }

    #[test]
    fn settings_are_send_sync() {
        assert_send::<ScanConfig>();
        assert_sync::<ScanConfig>();
        assert_send::<FilterSettings>();
        assert_sync::<FilterSettings>();
        assert_send::<BacktestSettings>();
        assert_sync::<BacktestSettings>();
    }

    #[test]
    fn hooks_are_shareable() {
        assert_send::<Box<dyn StrategyHook>>();
        assert_sync::<Box<dyn StrategyHook>>();
    }
}
