//! Candle and Series — the fundamental market data units.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// OHLCV candle for a single symbol at a single timestamp.
///
/// Timestamps are exchange-local wall-clock time, so `date()` is the trading
/// day the candle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Calendar day of the candle.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Candle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Day1,
}

impl Interval {
    /// Provider interval code (`15m`, `1d`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "60m",
            Interval::Day1 => "1d",
        }
    }

    /// Candle length in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            Interval::Minute1 => 1,
            Interval::Minute5 => 5,
            Interval::Minute15 => 15,
            Interval::Minute30 => 30,
            Interval::Hour1 => 60,
            Interval::Day1 => 24 * 60,
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Interval::Day1)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown interval '{0}' (expected 1m, 5m, 15m, 30m, 60m, 1h or 1d)")]
pub struct ParseIntervalError(pub String);

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Interval::Minute1),
            "5m" => Ok(Interval::Minute5),
            "15m" => Ok(Interval::Minute15),
            "30m" => Ok(Interval::Minute30),
            "60m" | "1h" => Ok(Interval::Hour1),
            "1d" => Ok(Interval::Day1),
            _ => Err(ParseIntervalError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = ParseIntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.code().to_string()
    }
}

/// Ordering violations rejected by `Series::new`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("duplicate timestamp {timestamp} at index {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("timestamp {timestamp} at index {index} is earlier than its predecessor")]
    OutOfOrder {
        index: usize,
        timestamp: NaiveDateTime,
    },
}

/// Time-ordered candles for one symbol at one interval.
///
/// Invariant: timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    interval: Interval,
    candles: Vec<Candle>,
}

impl Series {
    /// Build a series, rejecting duplicate or out-of-order timestamps.
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            let (prev, cur) = (pair[0].timestamp, pair[1].timestamp);
            if cur == prev {
                return Err(SeriesError::DuplicateTimestamp {
                    index: i + 1,
                    timestamp: cur,
                });
            }
            if cur < prev {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    timestamp: cur,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            interval,
            candles,
        })
    }

    /// Build a series from provider output in arbitrary order.
    ///
    /// Sorts by timestamp; when a timestamp repeats the later record wins.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        interval: Interval,
        mut candles: Vec<Candle>,
    ) -> Self {
        // Stable sort keeps arrival order among equal timestamps.
        candles.sort_by_key(|c| c.timestamp);
        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => deduped.push(candle),
            }
        }
        Self {
            symbol: symbol.into(),
            interval,
            candles: deduped,
        }
    }

    pub fn empty(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            candles: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Sub-series of candles in `range`; ordering is inherited.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Series {
        Series {
            symbol: self.symbol.clone(),
            interval: self.interval,
            candles: self.candles[range].to_vec(),
        }
    }

    /// Split into per-calendar-day sub-series, in chronological order.
    pub fn split_by_day(&self) -> Vec<Series> {
        let mut days: Vec<Series> = Vec::new();
        for candle in &self.candles {
            match days.last_mut() {
                Some(day) if day.candles[0].date() == candle.date() => day.candles.push(*candle),
                _ => days.push(Series {
                    symbol: self.symbol.clone(),
                    interval: self.interval,
                    candles: vec![*candle],
                }),
            }
        }
        days
    }
}
