//! Serializable scan configuration.
//!
//! A TOML file with `[strategy]`, `[filter]`, `[backtest]`, `[universe]`,
//! `[output]` and `[schedule]` sections. Every field is optional; missing
//! values take the scanner defaults. CLI flags are applied on top by the
//! caller, then `validate()` runs before any symbol is touched.

use crate::backtest::BacktestSettings;
use crate::filter::{FilterMode, FilterSettings};
use crate::hook::{load_strategy, HookError};
use fnoscan_core::data::{FetchRequest, HistoryRange, FNO_LIST_URL};
use fnoscan_core::domain::Interval;
use fnoscan_core::{MaKind, MaParams, ParamsError, SimulationMode, SimulatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a scan configuration (content hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub strategy: StrategySection,
    pub filter: FilterSection,
    pub backtest: BacktestSection,
    pub universe: UniverseSection,
    pub output: OutputSection,
    pub schedule: ScheduleSection,
}

/// Moving-average parameters and the optional post-filter hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub fast: usize,
    pub slow: usize,
    pub kind: MaKind,
    /// `kind:arg` hook spec, e.g. `prefix:N`.
    pub hook: Option<String>,
}

impl Default for StrategySection {
    fn default() -> Self {
        let params = MaParams::default();
        Self {
            fast: params.fast,
            slow: params.slow,
            kind: params.kind,
            hook: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub mode: FilterMode,
    pub offset: usize,
    pub higher_interval: Interval,
    pub higher_range: HistoryRange,
    pub lower_interval: Interval,
    pub lower_range: HistoryRange,
    pub lower_offset: usize,
    pub parallel: bool,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            mode: FilterMode::Both,
            offset: 1,
            higher_interval: Interval::Day1,
            higher_range: HistoryRange::Days(100),
            lower_interval: Interval::Minute15,
            lower_range: HistoryRange::Days(3),
            lower_offset: 0,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub enabled: bool,
    /// Defaults to the filter mode.
    pub mode: Option<SimulationMode>,
    pub range: HistoryRange,
    /// Intraday candle size; defaults to the filter's lower interval.
    pub interval: Option<Interval>,
    pub start_hour: Option<u32>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: None,
            range: HistoryRange::Months(6),
            interval: None,
            start_hour: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSection {
    /// Explicit symbols; when empty the F&O list is downloaded.
    pub symbols: Vec<String>,
    pub fno_url: String,
}

impl Default for UniverseSection {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            fno_url: FNO_LIST_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub shortlist: PathBuf,
    pub backtest_csv: PathBuf,
    pub trade_log: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            shortlist: PathBuf::from("scan_results.txt"),
            backtest_csv: PathBuf::from("backtest_results.csv"),
            trade_log: None,
            report_json: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub every_minutes: u64,
    /// Index-up threshold for the shortlist-size predictor.
    pub prediction_threshold: usize,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            every_minutes: 15,
            prediction_threshold: crate::predictor::DEFAULT_THRESHOLD,
        }
    }
}

impl ScanConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn params(&self) -> Result<MaParams, ParamsError> {
        MaParams::new(self.strategy.fast, self.strategy.slow, self.strategy.kind)
    }

    /// Reject operator errors before any per-symbol work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params()?;
        if let Some(spec) = &self.strategy.hook {
            load_strategy(spec)?;
        }
        if !self.filter.lower_interval.is_intraday() {
            return Err(ConfigError::Invalid {
                field: "filter.lower_interval",
                reason: format!("{} is not an intraday interval", self.filter.lower_interval),
            });
        }
        if let Some(interval) = self.backtest.interval {
            if !interval.is_intraday() {
                return Err(ConfigError::Invalid {
                    field: "backtest.interval",
                    reason: format!("{interval} is not an intraday interval"),
                });
            }
        }
        if let Some(hour) = self.backtest.start_hour {
            if hour > 23 {
                return Err(ConfigError::Invalid {
                    field: "backtest.start_hour",
                    reason: format!("{hour} is not an hour of the day"),
                });
            }
        }
        if self.output.trade_log.is_some() && !self.backtest.enabled {
            return Err(ConfigError::Invalid {
                field: "output.trade_log",
                reason: "a trade log needs backtest.enabled = true".into(),
            });
        }
        if self.schedule.every_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "schedule.every_minutes",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Deterministic hash of the effective configuration.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn filter_settings(&self) -> Result<FilterSettings, ConfigError> {
        let f = &self.filter;
        Ok(FilterSettings {
            params: self.params()?,
            offset: f.offset,
            higher: FetchRequest::new(f.higher_range, f.higher_interval),
            lower: FetchRequest::new(f.lower_range, f.lower_interval),
            lower_offset: f.lower_offset,
            parallel: f.parallel,
        })
    }

    /// Effective backtest mode: explicit, else derived from the filter mode.
    pub fn backtest_mode(&self) -> SimulationMode {
        self.backtest
            .mode
            .unwrap_or_else(|| self.filter.mode.simulation_mode())
    }

    /// Daily-only backtests fetch daily candles; any intraday walk fetches the
    /// intraday interval and the daily walk runs over the same series.
    pub fn backtest_settings(&self) -> Result<BacktestSettings, ConfigError> {
        let mode = self.backtest_mode();
        let interval = if mode.includes_intraday() {
            self.backtest.interval.unwrap_or(self.filter.lower_interval)
        } else {
            Interval::Day1
        };
        let mut simulator = SimulatorConfig::new(self.params()?);
        simulator.start_hour = self.backtest.start_hour;
        Ok(BacktestSettings {
            simulator,
            mode,
            request: FetchRequest::new(self.backtest.range, interval),
            parallel: self.filter.parallel,
        })
    }
}
