//! Domain types: candles, series and trades.

pub mod candle;
pub mod trade;

pub use candle::{Candle, Interval, ParseIntervalError, Series, SeriesError};
pub use trade::{InvalidTrade, Trade};
