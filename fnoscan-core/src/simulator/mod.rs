//! Trade simulator — replays a series and emits one trade per confirmed signal.
//!
//! Two walks over the data:
//! - **Intraday**: each calendar day is simulated on its own; averages restart
//!   every morning. A day trades from its first open to its last close.
//! - **Daily**: averages run over the whole series; a signal on candle i is
//!   executed on candle i+1 (open → close). The signal candle is never traded.
//!
//! `Combined` runs intraday first, then daily, and concatenates the trades.
//! Short or empty input is not an error: it simply produces no trades.

pub mod daily;
pub mod intraday;

pub use daily::simulate_daily;
pub use intraday::simulate_intraday;

use crate::domain::{Series, Trade};
use crate::indicators::{MaParams, ParamsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which walk(s) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    Intraday,
    Daily,
    #[default]
    #[serde(alias = "combined")]
    Both,
}

impl SimulationMode {
    pub fn includes_intraday(&self) -> bool {
        matches!(self, SimulationMode::Intraday | SimulationMode::Both)
    }

    pub fn includes_daily(&self) -> bool {
        matches!(self, SimulationMode::Daily | SimulationMode::Both)
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationMode::Intraday => f.write_str("intraday"),
            SimulationMode::Daily => f.write_str("daily"),
            SimulationMode::Both => f.write_str("both"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown mode '{0}' (expected daily, intraday or both)")]
pub struct ParseModeError(pub String);

impl FromStr for SimulationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intraday" => Ok(SimulationMode::Intraday),
            "daily" => Ok(SimulationMode::Daily),
            "both" | "combined" => Ok(SimulationMode::Both),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Simulator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub params: MaParams,
    /// Intraday only: ignore candles before this hour (exchange-local).
    #[serde(default)]
    pub start_hour: Option<u32>,
}

impl SimulatorConfig {
    pub fn new(params: MaParams) -> Self {
        Self {
            params,
            start_hour: None,
        }
    }

    pub fn with_start_hour(mut self, hour: u32) -> Self {
        self.start_hour = Some(hour);
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        self.params.validate()
    }
}

/// Run the simulator in `mode` over `series`.
pub fn simulate(series: &Series, mode: SimulationMode, config: &SimulatorConfig) -> Vec<Trade> {
    let mut trades = Vec::new();
    if mode.includes_intraday() {
        trades.extend(simulate_intraday(series, config));
    }
    if mode.includes_daily() {
        trades.extend(simulate_daily(series, &config.params));
    }
    trades
}
