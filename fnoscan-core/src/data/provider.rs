//! Price source trait, fetch request types and structured data errors.
//!
//! The `PriceSource` trait abstracts over Yahoo Finance, synthetic data and
//! test doubles. Implementations hand back a chronological `Series`; flattening
//! nested provider payloads and re-sorting happen on their side.

use crate::domain::{Interval, Series, SeriesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("universe error: {0}")]
    Universe(String),

    #[error("data error: {0}")]
    Other(String),
}

/// How much history to request, in provider notation (`3d`, `6mo`, `1y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HistoryRange {
    Days(u32),
    Months(u32),
    Years(u32),
}

/// Longest range accepted from text, in calendar days (100 years).
pub const MAX_RANGE_DAYS: u32 = 36_500;

impl HistoryRange {
    /// Approximate span in calendar days, saturating at `u32::MAX`.
    pub fn calendar_days(&self) -> u32 {
        match *self {
            HistoryRange::Days(n) => n,
            HistoryRange::Months(n) => n.saturating_mul(30),
            HistoryRange::Years(n) => n.saturating_mul(365),
        }
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRange::Days(n) => write!(f, "{n}d"),
            HistoryRange::Months(n) => write!(f, "{n}mo"),
            HistoryRange::Years(n) => write!(f, "{n}y"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid history range '{0}' (expected e.g. 3d, 6mo or 1y)")]
pub struct ParseRangeError(pub String);

impl FromStr for HistoryRange {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let (digits, ctor): (&str, fn(u32) -> HistoryRange) =
            if let Some(n) = raw.strip_suffix("mo") {
                (n, HistoryRange::Months)
            } else if let Some(n) = raw.strip_suffix('d') {
                (n, HistoryRange::Days)
            } else if let Some(n) = raw.strip_suffix('y') {
                (n, HistoryRange::Years)
            } else {
                return Err(ParseRangeError(s.to_string()));
            };
        match digits.parse::<u32>() {
            Ok(n) if n > 0 && ctor(n).calendar_days() <= MAX_RANGE_DAYS => Ok(ctor(n)),
            _ => Err(ParseRangeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for HistoryRange {
    type Error = ParseRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HistoryRange> for String {
    fn from(value: HistoryRange) -> Self {
        value.to_string()
    }
}

/// One download: how far back and at which granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub range: HistoryRange,
    pub interval: Interval,
}

impl FetchRequest {
    pub fn new(range: HistoryRange, interval: Interval) -> Self {
        Self { range, interval }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.range, self.interval)
    }
}

/// Trait for price data sources.
///
/// `fetch` is synchronous and may be slow. Errors are reported per call; the
/// orchestration layer downgrades them to per-symbol skips.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch a chronological candle series for `symbol`.
    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError>;
}

impl<T: PriceSource + ?Sized> PriceSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError> {
        (**self).fetch(symbol, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parsing() {
        assert_eq!("6mo".parse::<HistoryRange>().unwrap(), HistoryRange::Months(6));
        assert_eq!("100d".parse::<HistoryRange>().unwrap(), HistoryRange::Days(100));
        assert_eq!("1Y".parse::<HistoryRange>().unwrap(), HistoryRange::Years(1));
        assert!("0d".parse::<HistoryRange>().is_err());
        assert!("weekly".parse::<HistoryRange>().is_err());
        assert!("mo".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        assert_eq!("100y".parse::<HistoryRange>().unwrap(), HistoryRange::Years(100));
        assert!("101y".parse::<HistoryRange>().is_err());
        assert!("200000000mo".parse::<HistoryRange>().is_err());
        assert!("1000000y".parse::<HistoryRange>().is_err());
        assert_eq!(HistoryRange::Months(u32::MAX).calendar_days(), u32::MAX);
        assert_eq!(HistoryRange::Years(200_000_000).calendar_days(), u32::MAX);
    }

    #[test]
    fn range_display_matches_provider_notation() {
        assert_eq!(HistoryRange::Months(6).to_string(), "6mo");
        assert_eq!(HistoryRange::Days(3).to_string(), "3d");
        assert_eq!(HistoryRange::Years(2).calendar_days(), 730);
    }

    #[test]
    fn request_serializes_as_strings() {
        let req = FetchRequest::new(HistoryRange::Days(3), Interval::Minute15);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"range":"3d","interval":"15m"}"#);
        let back: FetchRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
