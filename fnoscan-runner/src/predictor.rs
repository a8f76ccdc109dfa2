//! Index-direction heuristic and two-day index comparison.

use fnoscan_core::data::{FetchRequest, HistoryRange, PriceSource};
use fnoscan_core::domain::Interval;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shortlist size at which the predictor reports 50%.
pub const DEFAULT_THRESHOLD: usize = 10;

pub const NIFTY_50: &str = "^NSEI";
pub const BANK_NIFTY: &str = "^NSEBANK";

/// Logistic estimate that the index moves up, from the shortlist size.
///
/// p = 1 / (1 + e^(−(count − threshold) / 5))
pub fn predict_index_movement(shortlisted_count: usize, threshold: usize) -> f64 {
    let x = (shortlisted_count as f64 - threshold as f64) / 5.0;
    1.0 / (1.0 + (-x).exp())
}

/// Average two-day change of the shortlist against the two main indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexComparison {
    pub stocks: f64,
    pub nifty: f64,
    pub banknifty: f64,
}

/// Last close over first close minus one for a two-day daily window.
///
/// `None` when the download fails or has fewer than two candles.
pub fn two_day_change(source: &dyn PriceSource, symbol: &str) -> Option<f64> {
    let request = FetchRequest::new(HistoryRange::Days(2), Interval::Day1);
    let series = match source.fetch(symbol, &request) {
        Ok(series) => series,
        Err(e) => {
            debug!(symbol, error = %e, "change data unavailable");
            return None;
        }
    };
    let candles = series.candles();
    match (candles.first(), candles.last()) {
        (Some(first), Some(last)) if candles.len() >= 2 && first.close != 0.0 => {
            Some(last.close / first.close - 1.0)
        }
        _ => None,
    }
}

/// Missing data counts as no change for the indices and is left out of the
/// stock average.
pub fn compare_with_indices(source: &dyn PriceSource, symbols: &[String]) -> IndexComparison {
    let changes: Vec<f64> = symbols
        .iter()
        .filter_map(|s| two_day_change(source, s))
        .collect();
    let stocks = if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    };
    IndexComparison {
        stocks,
        nifty: two_day_change(source, NIFTY_50).unwrap_or(0.0),
        banknifty: two_day_change(source, BANK_NIFTY).unwrap_or(0.0),
    }
}
