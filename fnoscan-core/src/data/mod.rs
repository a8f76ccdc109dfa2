//! Data collaborators: price sources, universe providers, circuit breaker.

pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{
    DataError, FetchRequest, HistoryRange, ParseRangeError, PriceSource, MAX_RANGE_DAYS,
};
pub use synthetic::SyntheticProvider;
pub use universe::{
    parse_fno_csv, parse_symbol_list, FnoListUniverse, StaticUniverse, SymbolUniverse,
    FNO_LIST_URL,
};
pub use yahoo::YahooProvider;
