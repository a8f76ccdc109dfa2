//! Symbol universe providers.
//!
//! A universe is an ordered, duplicate-free list of exchange tickers. The
//! default source is the NSE F&O market-lot CSV; a static list covers
//! `--symbols` and config files.

use super::provider::DataError;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// NSE F&O market lots file.
pub const FNO_LIST_URL: &str = "https://archives.nseindia.com/content/fo/fo_mktlots.csv";

/// Source of candidate symbols.
pub trait SymbolUniverse {
    fn symbols(&self) -> Result<Vec<String>, DataError>;
}

/// Fixed list of symbols.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: normalize(symbols),
        }
    }
}

impl SymbolUniverse for StaticUniverse {
    fn symbols(&self) -> Result<Vec<String>, DataError> {
        Ok(self.symbols.clone())
    }
}

/// Downloads the F&O equity list from NSE archives.
pub struct FnoListUniverse {
    url: String,
}

impl FnoListUniverse {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for FnoListUniverse {
    fn default() -> Self {
        Self::new(FNO_LIST_URL)
    }
}

impl SymbolUniverse for FnoListUniverse {
    fn symbols(&self) -> Result<Vec<String>, DataError> {
        debug!(url = %self.url, "downloading F&O list");
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Universe(format!("failed to build HTTP client: {e}")))?;
        let body = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| DataError::Universe(format!("failed to fetch F&O list: {e}")))?;
        parse_fno_csv(&body)
    }
}

/// Extract symbols from the F&O CSV.
///
/// Uses the `SYMBOL` column (header compared after trimming) or the only
/// column of a single-column file.
pub fn parse_fno_csv(text: &str) -> Result<Vec<String>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::Universe(format!("unreadable CSV header: {e}")))?
        .clone();
    let column = match headers.iter().position(|h| h.eq_ignore_ascii_case("SYMBOL")) {
        Some(idx) => idx,
        None if headers.len() == 1 => 0,
        None => {
            return Err(DataError::Universe(
                "CSV does not contain SYMBOL column".into(),
            ))
        }
    };

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Universe(format!("bad CSV row: {e}")))?;
        if let Some(value) = record.get(column) {
            values.push(value.to_string());
        }
    }
    Ok(normalize(values))
}

/// Parse a comma-separated symbol list (`"infy, tcs,,sbin"`).
pub fn parse_symbol_list(text: &str) -> Vec<String> {
    normalize(text.split(','))
}

/// Trim, uppercase, drop empties and repeats; first occurrence keeps its place.
fn normalize<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_column_with_padded_headers() {
        let csv = "UNDERLYING                          ,SYMBOL    ,JAN-24\n\
                   NIFTY 50,NIFTY,50\n\
                   Reliance Industries,RELIANCE  ,250\n\
                   Infosys,INFY,400\n\
                   Infosys again,INFY,400\n";
        let symbols = parse_fno_csv(csv).unwrap();
        assert_eq!(symbols, vec!["NIFTY", "RELIANCE", "INFY"]);
    }

    #[test]
    fn single_column_file_is_accepted() {
        let symbols = parse_fno_csv("Ticker\nSBIN\n\nTCS\n").unwrap();
        assert_eq!(symbols, vec!["SBIN", "TCS"]);
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let err = parse_fno_csv("A,B\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("SYMBOL"));
    }

    #[test]
    fn symbol_list_parsing() {
        assert_eq!(parse_symbol_list(" infy, tcs,,INFY ,sbin"), vec!["INFY", "TCS", "SBIN"]);
        assert!(parse_symbol_list("").is_empty());
    }

    #[test]
    fn static_universe_normalizes() {
        let u = StaticUniverse::new(["abc", "ABC", " def "]);
        assert_eq!(u.symbols().unwrap(), vec!["ABC", "DEF"]);
    }
}
