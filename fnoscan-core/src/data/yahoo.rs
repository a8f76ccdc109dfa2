//! Yahoo Finance price source.
//!
//! Fetches OHLCV candles from Yahoo's v8 chart API for NSE equities (ticker
//! suffix `.NS` by default) and indices (`^NSEI`, passed through untouched).
//! Handles rate limiting, bounded retries with exponential backoff, response
//! flattening and the circuit breaker.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, FetchRequest, PriceSource};
use crate::domain::{Candle, Series};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default NSE ticker suffix on Yahoo.
pub const NSE_SUFFIX: &str = ".NS";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    suffix: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            suffix: NSE_SUFFIX.to_string(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Use a different exchange suffix (empty for US tickers).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Provider ticker for an exchange symbol. Indices (`^…`) and tickers
    /// that already carry an exchange suffix pass through unchanged.
    pub fn ticker(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.starts_with('^') || symbol.contains('.') {
            symbol
        } else {
            format!("{symbol}{}", self.suffix)
        }
    }

    fn chart_url(ticker: &str, request: &FetchRequest) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?range={}&interval={}&includePrePost=false",
            request.range,
            request.interval.code()
        )
    }

    /// Flatten the chart payload into a chronological series.
    fn parse_response(
        symbol: &str,
        request: &FetchRequest,
        resp: ChartResponse,
    ) -> Result<Series, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        // Over-returned payloads: only the first result and quote block are used.
        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut candles = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Rows without a close are holidays or halted sessions.
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let timestamp = local_time(ts, offset).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;
            candles.push(Candle {
                timestamp,
                open: quote.open.get(i).copied().flatten().unwrap_or(f64::NAN),
                high: quote.high.get(i).copied().flatten().unwrap_or(f64::NAN),
                low: quote.low.get(i).copied().flatten().unwrap_or(f64::NAN),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        Ok(Series::from_unsorted(symbol, request.interval, candles))
    }

    fn fetch_with_retry(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError> {
        let ticker = self.ticker(symbol);
        let url = Self::chart_url(&ticker, request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            debug!(%ticker, %request, attempt, "requesting chart");
            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            let series = Self::parse_response(symbol, request, chart)?;
            self.circuit_breaker.record_success();
            return Ok(series);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Series, DataError> {
        self.fetch_with_retry(symbol, request)
    }
}

/// UTC epoch seconds shifted to exchange-local wall-clock time.
fn local_time(ts: i64, gmt_offset_secs: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(ts + gmt_offset_secs, 0).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::HistoryRange;
    use crate::domain::Interval;
    use chrono::Timelike;

    fn provider() -> YahooProvider {
        YahooProvider::new(Arc::new(CircuitBreaker::default_provider())).unwrap()
    }

    fn request() -> FetchRequest {
        FetchRequest::new(HistoryRange::Days(3), Interval::Minute15)
    }

    #[test]
    fn ticker_mapping() {
        let p = provider();
        assert_eq!(p.ticker("reliance"), "RELIANCE.NS");
        assert_eq!(p.ticker("^NSEI"), "^NSEI");
        assert_eq!(p.ticker("TCS.BO"), "TCS.BO");
        assert_eq!(p.with_suffix("").ticker("SPY"), "SPY");
    }

    #[test]
    fn chart_url_uses_range_and_interval() {
        let url = YahooProvider::chart_url("INFY.NS", &request());
        assert!(url.contains("/chart/INFY.NS?"));
        assert!(url.contains("range=3d"));
        assert!(url.contains("interval=15m"));
    }

    #[test]
    fn parse_response_converts_to_exchange_time_and_skips_null_rows() {
        // 2024-03-04 03:45:00 UTC = 09:15 IST.
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 19800},
                    "timestamp": [1709523900, 1709524800, 1709525700],
                    "indicators": {"quote": [{
                        "open":   [100.0, null, 102.0],
                        "high":   [101.0, null, 103.0],
                        "low":    [99.0,  null, 101.0],
                        "close":  [100.5, null, 102.5],
                        "volume": [1000,  null, 1200]
                    }]}
                }],
                "error": null
            }
        }"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let series = YahooProvider::parse_response("INFY", &request(), resp).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "INFY");
        let first = series.candles()[0];
        assert_eq!((first.timestamp.hour(), first.timestamp.minute()), (9, 15));
        assert_eq!(series.candles()[1].close, 102.5);
    }

    #[test]
    fn parse_response_reports_missing_symbol() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = YahooProvider::parse_response("NOPE", &request(), resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn parse_response_sorts_out_of_order_rows() {
        let json = r#"{"chart": {"result": [{
            "timestamp": [1709524800, 1709523900],
            "indicators": {"quote": [{
                "open": [2.0, 1.0], "high": [2.0, 1.0], "low": [2.0, 1.0],
                "close": [2.0, 1.0], "volume": [1, 1]
            }]}
        }], "error": null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let series = YahooProvider::parse_response("X", &request(), resp).unwrap();
        let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0]);
    }
}
