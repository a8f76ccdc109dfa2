//! Daily walk: candle-by-candle signals with a one-candle execution lag.

use crate::domain::{Series, Trade};
use crate::indicators::{compute_averages, MaParams};

/// Emit a trade for every candle i (slow−1 ≤ i < len−1) where fast > slow.
///
/// Averages are continuous across the whole series. The trade is taken on
/// candle i+1: entry at its open, exit at its close, dated by that candle.
pub fn simulate_daily(series: &Series, params: &MaParams) -> Vec<Trade> {
    let n = series.len();
    let first = params.slow.saturating_sub(1);
    if n < 2 || first >= n - 1 {
        return Vec::new();
    }

    let annotated = compute_averages(series, params.fast, params.slow, params.kind);
    let candles = series.candles();

    (first..n - 1)
        .filter(|&i| annotated.fast_above_slow(i))
        .filter_map(|i| {
            let next = &candles[i + 1];
            Trade::new(next.date(), next.open, next.close)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;
    use crate::indicators::{make_candles, MaKind};

    fn series(closes: &[f64]) -> Series {
        Series::new("TEST", Interval::Day1, make_candles(closes)).unwrap()
    }

    fn sma(fast: usize, slow: usize) -> MaParams {
        MaParams::new(fast, slow, MaKind::Simple).unwrap()
    }

    #[test]
    fn rising_series_trades_every_candle_after_warmup() {
        let closes: Vec<f64> = (1..=10).map(f64::from).collect();
        let trades = simulate_daily(&series(&closes), &sma(2, 4));
        // Signals at i = 3..=8, executed on i+1 = 4..=9.
        assert_eq!(trades.len(), 6);
        assert_eq!(trades[0].entry_price(), 4.5);
        assert_eq!(trades[0].exit_price(), 5.0);
    }

    #[test]
    fn last_candle_never_signals() {
        let closes: Vec<f64> = (1..=4).map(f64::from).collect();
        // Only i = 3 would be eligible, but it is the last candle.
        assert!(simulate_daily(&series(&closes), &sma(2, 4)).is_empty());
    }

    #[test]
    fn equal_averages_do_not_signal() {
        let trades = simulate_daily(&series(&[5.0; 12]), &sma(3, 6));
        assert!(trades.is_empty());
    }

    #[test]
    fn entry_comes_from_the_following_candle() {
        let closes: Vec<f64> = (1..=8).map(|v| f64::from(v) * 10.0).collect();
        let s = series(&closes);
        let trades = simulate_daily(&s, &sma(2, 3));
        let candles = s.candles();
        for trade in &trades {
            let idx = candles
                .iter()
                .position(|c| c.date() == trade.date())
                .unwrap();
            assert!(idx >= 3, "trade on candle {idx} precedes the first signal + 1");
            assert_eq!(trade.entry_price(), candles[idx].open);
        }
    }

    #[test]
    fn short_series_yields_nothing() {
        assert!(simulate_daily(&series(&[1.0]), &sma(2, 4)).is_empty());
        assert!(simulate_daily(&series(&[]), &sma(2, 4)).is_empty());
    }
}
