//! fnoscan core — candles, moving averages, pattern detection, trade
//! simulation and performance summaries.
//!
//! The engine is pure: it consumes in-memory series and returns trades and
//! summaries. Price and universe collaborators live in `data`.

pub mod data;
pub mod domain;
pub mod indicators;
pub mod pattern;
pub mod simulator;
pub mod summary;

pub use domain::{Candle, Interval, Series, SeriesError, Trade};
pub use indicators::{compute_averages, AnnotatedSeries, MaKind, MaParams, ParamsError};
pub use pattern::{confirms, MIN_PATTERN_WINDOW};
pub use simulator::{simulate, SimulationMode, SimulatorConfig};
pub use summary::{summarize, Summary};
