//! Exponential Moving Average (EMA), `adjust=false` convention.
//!
//! EMA[0] = close[0]; EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (period + 1). The recursion starts at the first candle, but
//! values before index period-1 are reported as NaN (warmup).

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    /// Periods below 1 are clamped to 1; callers validate through `MaParams`.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = vec![f64::NAN; candles.len()];
        let Some(first) = candles.first() else {
            return result;
        };

        let alpha = self.alpha();
        let mut prev = first.close;
        for (i, candle) in candles.iter().enumerate() {
            let ema = if i == 0 {
                prev
            } else {
                alpha * candle.close + (1.0 - alpha) * prev
            };
            prev = ema;
            if i >= self.lookback() {
                result[i] = ema;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let candles = make_candles(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&candles);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_seeded_by_first_close() {
        // alpha = 0.5
        // EMA: 10, 10.5, 11.25, 12.125, 13.0625
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&candles);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_empty_input() {
        assert!(Ema::new(5).compute(&[]).is_empty());
    }

    #[test]
    fn ema_alpha() {
        assert_approx(Ema::new(20).alpha(), 2.0 / 21.0, DEFAULT_EPSILON);
        assert_eq!(Ema::new(50).lookback(), 49);
    }
}
