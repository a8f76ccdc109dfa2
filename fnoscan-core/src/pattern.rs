//! Monotonic-rise confirmation pattern.
//!
//! A window confirms when its last four closes are strictly increasing.
//! Windows shorter than `MIN_PATTERN_WINDOW` never confirm. The fast/slow
//! crossover gate is the caller's responsibility
//! (`AnnotatedSeries::fast_at_or_above_slow`).

use crate::domain::Candle;

/// Shortest window the detector will evaluate.
pub const MIN_PATTERN_WINDOW: usize = 5;

/// Number of trailing closes that must rise.
const RISING_CLOSES: usize = 4;

/// True when the last four closes of `window` rise strictly.
pub fn confirms(window: &[Candle]) -> bool {
    if window.len() < MIN_PATTERN_WINDOW {
        return false;
    }
    window[window.len() - RISING_CLOSES..]
        .windows(2)
        .all(|pair| pair[0].close < pair[1].close)
}
