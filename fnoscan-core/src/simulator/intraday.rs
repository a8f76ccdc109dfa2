//! Intraday walk: one candidate trade per calendar day.

use chrono::Timelike;
use tracing::trace;

use super::SimulatorConfig;
use crate::domain::{Candle, Series, Trade};
use crate::indicators::annotate;
use crate::pattern::{confirms, MIN_PATTERN_WINDOW};

/// Simulate each calendar day of `series` independently.
///
/// A day qualifies when, after dropping candles before `start_hour`, it has
/// at least max(fast, slow, 5) candles, its final candle has fast ≥ slow and
/// the whole day confirms the rising pattern. The trade enters at the day's
/// first open and exits at its last close.
pub fn simulate_intraday(series: &Series, config: &SimulatorConfig) -> Vec<Trade> {
    let params = &config.params;
    let min_candles = params.longest().max(MIN_PATTERN_WINDOW);

    series
        .split_by_day()
        .iter()
        .filter_map(|day| {
            let candles = session(day.candles(), config.start_hour);
            if candles.len() < min_candles {
                return None;
            }
            // Averages restart every day; prior sessions do not carry over.
            let annotated = annotate(candles, params.fast, params.slow, params.kind);
            let last = candles.len() - 1;
            if !(annotated.fast_at_or_above_slow(last) && confirms(candles)) {
                return None;
            }
            let first = &candles[0];
            let trade = Trade::new(first.date(), first.open, candles[last].close);
            if let Some(t) = &trade {
                trace!(date = %t.date(), pct_return = t.pct_return(), "intraday trade");
            }
            trade
        })
        .collect()
}

/// Candles at or after `start_hour`; the full day when no hour is set.
fn session(candles: &[Candle], start_hour: Option<u32>) -> &[Candle] {
    match start_hour {
        Some(hour) => {
            let from = candles
                .iter()
                .position(|c| c.timestamp.hour() >= hour)
                .unwrap_or(candles.len());
            &candles[from..]
        }
        None => candles,
    }
}
