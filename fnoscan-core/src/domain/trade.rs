//! Trade — a completed one-session round trip produced by the simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry → exit round trip.
///
/// Fields are private so that `pct_return` always agrees with the prices;
/// only the simulator constructs trades. Deserialization goes through the
/// same check and recomputes `pct_return` from the prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TradeRecord")]
pub struct Trade {
    date: NaiveDate,
    entry_price: f64,
    exit_price: f64,
    pct_return: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid trade prices: entry {entry_price}, exit {exit_price}")]
pub struct InvalidTrade {
    pub entry_price: f64,
    pub exit_price: f64,
}

/// Serialized form; a stored `pct_return` is ignored.
#[derive(Deserialize)]
struct TradeRecord {
    date: NaiveDate,
    entry_price: f64,
    exit_price: f64,
}

impl TryFrom<TradeRecord> for Trade {
    type Error = InvalidTrade;

    fn try_from(r: TradeRecord) -> Result<Self, Self::Error> {
        Trade::new(r.date, r.entry_price, r.exit_price).ok_or(InvalidTrade {
            entry_price: r.entry_price,
            exit_price: r.exit_price,
        })
    }
}

impl Trade {
    /// Create a trade, or `None` when the entry price cannot carry a return
    /// (non-positive or non-finite) or the exit price is not finite.
    pub(crate) fn new(date: NaiveDate, entry_price: f64, exit_price: f64) -> Option<Self> {
        if !entry_price.is_finite() || entry_price <= 0.0 || !exit_price.is_finite() {
            return None;
        }
        Some(Self {
            date,
            entry_price,
            exit_price,
            pct_return: (exit_price - entry_price) / entry_price,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn exit_price(&self) -> f64 {
        self.exit_price
    }

    /// Fractional return, (exit − entry) / entry.
    pub fn pct_return(&self) -> f64 {
        self.pct_return
    }

    pub fn is_winner(&self) -> bool {
        self.pct_return > 0.0
    }
}
