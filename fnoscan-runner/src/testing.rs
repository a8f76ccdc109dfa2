//! Test fixtures: a scripted price source and candle builders.

use chrono::{Duration, NaiveDate};
use fnoscan_core::data::{DataError, FetchRequest, PriceSource};
use fnoscan_core::domain::{Candle, Interval, Series};
use std::collections::HashMap;

/// Serves fixed daily and intraday series per symbol; unknown symbols fail.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    daily: HashMap<String, Vec<Candle>>,
    intraday: HashMap<String, Vec<Candle>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_daily(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.daily.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_intraday(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.intraday.insert(symbol.to_string(), candles);
        self
    }
}

impl PriceSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError> {
        let table = if request.interval.is_intraday() {
            &self.intraday
        } else {
            &self.daily
        };
        let candles = table.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        Ok(Series::new(symbol, request.interval, candles.clone())?)
    }
}

fn candle(timestamp: chrono::NaiveDateTime, close: f64) -> Candle {
    Candle {
        timestamp,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000,
    }
}

/// `n` daily candles from 100, moving `slope` per candle.
pub fn rising_daily(n: usize, slope: f64) -> Vec<Candle> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| candle(base + Duration::days(i as i64), 100.0 + slope * i as f64))
        .collect()
}

/// Fifteen-minute candles of one session from the given closes.
pub fn intraday_from_closes(closes: &[f64]) -> Vec<Candle> {
    let open = NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| candle(open + Duration::minutes(15 * i as i64), close))
        .collect()
}

/// `n` fifteen-minute candles from 100, moving `slope` per candle.
pub fn rising_intraday(n: usize, slope: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + slope * i as f64).collect();
    intraday_from_closes(&closes)
}
