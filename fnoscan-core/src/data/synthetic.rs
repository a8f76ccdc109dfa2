//! Synthetic price source for offline runs and demos.
//!
//! Produces a deterministic random walk per (symbol, interval), seeded from a
//! BLAKE3 hash so repeated runs see identical candles. Sessions follow NSE
//! hours (09:15–15:30) on weekdays ending at `as_of`. These are clearly fake.

use super::provider::{DataError, FetchRequest, PriceSource, MAX_RANGE_DAYS};
use crate::domain::{Candle, Interval, Series};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SESSION_MINUTES: u32 = 375;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    as_of: NaiveDate,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            start_price: 100.0,
        }
    }

    fn rng_for(symbol: &str, interval: Interval) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(interval.code().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// Weekdays in the requested window, oldest first. Stops at the
    /// earliest representable date.
    fn trading_days(&self, calendar_days: u32) -> Vec<NaiveDate> {
        let calendar_days = calendar_days.min(MAX_RANGE_DAYS);
        let mut days: Vec<NaiveDate> = (0..i64::from(calendar_days))
            .map_while(|back| self.as_of.checked_sub_signed(Duration::days(back)))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        days.reverse();
        days
    }
}

impl PriceSource for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError> {
        let mut rng = Self::rng_for(symbol, request.interval);
        let open_time = NaiveTime::from_hms_opt(9, 15, 0)
            .ok_or_else(|| DataError::Other("invalid session open".into()))?;
        let per_day = if request.interval.is_intraday() {
            (SESSION_MINUTES / request.interval.minutes()).max(1)
        } else {
            1
        };
        // Per-candle move scales with the square root of its share of a session.
        let step = 0.03 * (f64::from(per_day)).recip().sqrt();

        let mut price = self.start_price;
        let mut candles = Vec::new();
        for day in self.trading_days(request.range.calendar_days()) {
            let session_open = day.and_time(open_time);
            for k in 0..per_day {
                let ret: f64 = rng.gen_range(-step..step);
                let open = price;
                let close = price * (1.0 + ret);
                let wick = rng.gen_range(0.0..step / 3.0);
                candles.push(Candle {
                    timestamp: session_open
                        + Duration::minutes(i64::from(k * request.interval.minutes())),
                    open,
                    high: open.max(close) * (1.0 + wick),
                    low: open.min(close) * (1.0 - wick),
                    close,
                    volume: rng.gen_range(10_000..500_000u64),
                });
                price = close;
            }
        }

        Ok(Series::new(symbol, request.interval, candles)?)
    }
}
