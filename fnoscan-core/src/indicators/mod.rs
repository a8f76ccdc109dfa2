//! Moving-average indicator engine.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! `compute_averages` runs one forward pass per average and returns the
//! candles annotated with a fast and a slow series, indexed in parallel.
//!
//! # Look-ahead contamination guard
//! No indicator value at candle t may depend on candles t+1 or later.

pub mod ema;
pub mod sma;

pub use ema::Ema;
pub use sma::Sma;

use crate::domain::{Candle, Series};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trait for single-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as the input; the first
/// `lookback()` values are `f64::NAN` (warmup).
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "ema_50").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Moving average flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaKind {
    Simple,
    #[default]
    Exponential,
}

impl MaKind {
    pub fn build(&self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaKind::Simple => Box::new(Sma::new(period)),
            MaKind::Exponential => Box::new(Ema::new(period)),
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Simple => f.write_str("simple"),
            MaKind::Exponential => f.write_str("exponential"),
        }
    }
}

impl FromStr for MaKind {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "sma" => Ok(MaKind::Simple),
            "exponential" | "ema" => Ok(MaKind::Exponential),
            other => Err(ParamsError::UnknownKind(other.to_string())),
        }
    }
}

/// Invalid moving-average parameters. These reflect operator error and are
/// reported before any per-symbol work starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("moving average periods must be positive (fast={fast}, slow={slow})")]
    NonPositivePeriod { fast: usize, slow: usize },

    #[error("fast period {fast} must be smaller than slow period {slow}")]
    FastNotFaster { fast: usize, slow: usize },

    #[error("unknown moving average kind '{0}' (expected simple or exponential)")]
    UnknownKind(String),
}

/// Fast/slow moving average pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaParams {
    pub fast: usize,
    pub slow: usize,
    #[serde(default)]
    pub kind: MaKind,
}

impl Default for MaParams {
    fn default() -> Self {
        Self {
            fast: 20,
            slow: 50,
            kind: MaKind::Exponential,
        }
    }
}

impl MaParams {
    pub fn new(fast: usize, slow: usize, kind: MaKind) -> Result<Self, ParamsError> {
        let params = Self { fast, slow, kind };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.fast == 0 || self.slow == 0 {
            return Err(ParamsError::NonPositivePeriod {
                fast: self.fast,
                slow: self.slow,
            });
        }
        if self.fast >= self.slow {
            return Err(ParamsError::FastNotFaster {
                fast: self.fast,
                slow: self.slow,
            });
        }
        Ok(())
    }

    pub fn longest(&self) -> usize {
        self.fast.max(self.slow)
    }
}

/// Candles plus their fast and slow averages, index-aligned.
#[derive(Debug, Clone)]
pub struct AnnotatedSeries {
    candles: Vec<Candle>,
    fast: Vec<f64>,
    slow: Vec<f64>,
}

impl AnnotatedSeries {
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Fast average at `index`, absent during warmup or out of bounds.
    pub fn fast(&self, index: usize) -> Option<f64> {
        defined(&self.fast, index)
    }

    /// Slow average at `index`, absent during warmup or out of bounds.
    pub fn slow(&self, index: usize) -> Option<f64> {
        defined(&self.slow, index)
    }

    /// Crossover gate: fast ≥ slow at `index`. False while either is absent.
    pub fn fast_at_or_above_slow(&self, index: usize) -> bool {
        matches!((self.fast(index), self.slow(index)), (Some(f), Some(s)) if f >= s)
    }

    /// Strict variant of the crossover gate: fast > slow at `index`.
    pub fn fast_above_slow(&self, index: usize) -> bool {
        matches!((self.fast(index), self.slow(index)), (Some(f), Some(s)) if f > s)
    }
}

fn defined(values: &[f64], index: usize) -> Option<f64> {
    values.get(index).copied().filter(|v| !v.is_nan())
}

/// Annotate `series` with fast and slow averages of the given kind.
///
/// The input is left untouched; an empty series yields an empty result.
pub fn compute_averages(
    series: &Series,
    fast_period: usize,
    slow_period: usize,
    kind: MaKind,
) -> AnnotatedSeries {
    annotate(series.candles(), fast_period, slow_period, kind)
}

pub(crate) fn annotate(
    candles: &[Candle],
    fast_period: usize,
    slow_period: usize,
    kind: MaKind,
) -> AnnotatedSeries {
    AnnotatedSeries {
        candles: candles.to_vec(),
        fast: kind.build(fast_period).compute(candles),
        slow: kind.build(slow_period).compute(candles),
    }
}

/// Create synthetic daily candles from close prices for testing.
///
/// open = close - 0.5 so every candle closes above its open.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: base + chrono::Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
