//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Periods below 1 are clamped to 1; callers validate through `MaParams`.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let mut sum: f64 = candles[..self.period].iter().map(|c| c.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = candles[i - self.period].close;
            let entering = candles[i].close;
            if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
                // A NaN poisons the running sum; rebuild from the window.
                sum = candles[i + 1 - self.period..=i].iter().map(|c| c.close).sum();
            } else {
                sum += entering - leaving;
            }
            result[i] = sum / self.period as f64;
        }

        result
    }
}
