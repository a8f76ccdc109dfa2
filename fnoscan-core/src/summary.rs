//! Performance aggregation — trades in, summary statistics out.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};

/// Count, win rate and mean return of a trade collection.
///
/// An empty collection summarizes to all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub trade_count: usize,
    /// Fraction of trades with a strictly positive return, in [0, 1].
    pub win_rate: f64,
    /// Arithmetic mean of `pct_return`.
    pub avg_return: f64,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }
}

/// Reduce `trades` to a `Summary`. The trades are only read.
pub fn summarize(trades: &[Trade]) -> Summary {
    if trades.is_empty() {
        return Summary::default();
    }
    let n = trades.len() as f64;
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    let total: f64 = trades.iter().map(Trade::pct_return).sum();
    Summary {
        trade_count: trades.len(),
        win_rate: winners as f64 / n,
        avg_return: total / n,
    }
}
