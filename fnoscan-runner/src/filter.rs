//! Pre-scan filters: the two-timeframe DMA filter and the intraday scan.
//!
//! Each symbol gets a `SymbolVerdict`. A symbol whose data cannot be fetched
//! or is too short is `Skipped` with a reason; it never aborts the batch.
//! Verdicts come back in input order whether evaluated sequentially or on
//! the rayon pool.

use fnoscan_core::data::{FetchRequest, HistoryRange, PriceSource};
use fnoscan_core::domain::{Interval, Series};
use fnoscan_core::{compute_averages, confirms, MaParams, SimulationMode, MIN_PATTERN_WINDOW};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Which filter stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// DMA filter only.
    Daily,
    /// Intraday scan only.
    Intraday,
    /// DMA filter, then the intraday scan on its shortlist.
    #[default]
    Both,
}

impl FilterMode {
    /// Simulation mode a backtest uses when none is configured.
    pub fn simulation_mode(&self) -> SimulationMode {
        match self {
            FilterMode::Daily => SimulationMode::Daily,
            FilterMode::Intraday => SimulationMode::Intraday,
            FilterMode::Both => SimulationMode::Both,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Daily => f.write_str("daily"),
            FilterMode::Intraday => f.write_str("intraday"),
            FilterMode::Both => f.write_str("both"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown filter mode '{0}' (expected daily, intraday or both)")]
pub struct ParseFilterModeError(pub String);

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(FilterMode::Daily),
            "intraday" => Ok(FilterMode::Intraday),
            "both" => Ok(FilterMode::Both),
            other => Err(ParseFilterModeError(other.to_string())),
        }
    }
}

/// Why a symbol could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    DataUnavailable { detail: String },
    InsufficientHistory { needed: usize, got: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable { detail } => write!(f, "data unavailable: {detail}"),
            SkipReason::InsufficientHistory { needed, got } => {
                write!(f, "insufficient history: need {needed} candles, got {got}")
            }
        }
    }
}

/// Per-symbol filter result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SymbolVerdict {
    Shortlisted,
    NoSignal,
    Skipped(SkipReason),
}

impl SymbolVerdict {
    pub fn is_shortlisted(&self) -> bool {
        matches!(self, SymbolVerdict::Shortlisted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub symbol: String,
    pub verdict: SymbolVerdict,
}

/// Verdicts for a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub outcomes: Vec<FilterOutcome>,
}

impl FilterReport {
    pub fn shortlisted(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict.is_shortlisted())
            .map(|o| o.symbol.clone())
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match &o.verdict {
            SymbolVerdict::Skipped(reason) => Some((o.symbol.as_str(), reason)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Filter parameters shared by both stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub params: MaParams,
    /// Most recent higher-timeframe candles to ignore.
    pub offset: usize,
    pub higher: FetchRequest,
    pub lower: FetchRequest,
    /// Most recent lower-timeframe candles to ignore.
    pub lower_offset: usize,
    /// Evaluate symbols on the rayon pool.
    pub parallel: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            params: MaParams::default(),
            offset: 1,
            higher: FetchRequest::new(HistoryRange::Days(100), Interval::Day1),
            lower: FetchRequest::new(HistoryRange::Days(3), Interval::Minute15),
            lower_offset: 0,
            parallel: false,
        }
    }
}

fn fetch(
    source: &dyn PriceSource,
    symbol: &str,
    request: &FetchRequest,
) -> Result<Series, SkipReason> {
    debug!(symbol, %request, source = source.name(), "downloading");
    source
        .fetch(symbol, request)
        .map_err(|e| SkipReason::DataUnavailable {
            detail: e.to_string(),
        })
}

fn require_len(series: &Series, needed: usize) -> Result<(), SkipReason> {
    if series.len() < needed {
        return Err(SkipReason::InsufficientHistory {
            needed,
            got: series.len(),
        });
    }
    Ok(())
}

/// DMA filter for one symbol.
///
/// Higher timeframe: the candle `offset` places before the last must have
/// fast > slow. Lower timeframe: with the last `lower_offset` candles dropped,
/// the final candle must have fast ≥ slow and the window must confirm the
/// rising pattern.
pub fn dma_verdict(
    source: &dyn PriceSource,
    symbol: &str,
    settings: &FilterSettings,
) -> SymbolVerdict {
    match dma_check(source, symbol, settings) {
        Ok(true) => SymbolVerdict::Shortlisted,
        Ok(false) => SymbolVerdict::NoSignal,
        Err(reason) => SymbolVerdict::Skipped(reason),
    }
}

fn dma_check(
    source: &dyn PriceSource,
    symbol: &str,
    settings: &FilterSettings,
) -> Result<bool, SkipReason> {
    let p = &settings.params;

    let daily = fetch(source, symbol, &settings.higher)?;
    require_len(&daily, p.slow + settings.offset)?;
    let annotated = compute_averages(&daily, p.fast, p.slow, p.kind);
    let decision = daily.len() - (settings.offset + 1);
    if !annotated.fast_above_slow(decision) {
        return Ok(false);
    }

    let intra = fetch(source, symbol, &settings.lower)?;
    require_len(&intra, p.slow.max(MIN_PATTERN_WINDOW) + settings.lower_offset)?;
    let window = intra.slice(0..intra.len() - settings.lower_offset);
    let annotated = compute_averages(&window, p.fast, p.slow, p.kind);
    let last = window.len() - 1;
    Ok(annotated.fast_at_or_above_slow(last) && confirms(window.candles()))
}

/// Intraday scan for one symbol: the latest lower-timeframe candle must have
/// fast ≥ slow and the series must confirm the rising pattern.
pub fn intraday_verdict(
    source: &dyn PriceSource,
    symbol: &str,
    settings: &FilterSettings,
) -> SymbolVerdict {
    let check = || -> Result<bool, SkipReason> {
        let p = &settings.params;
        let intra = fetch(source, symbol, &settings.lower)?;
        require_len(&intra, p.slow)?;
        let annotated = compute_averages(&intra, p.fast, p.slow, p.kind);
        Ok(annotated.fast_at_or_above_slow(intra.len() - 1) && confirms(intra.candles()))
    };
    match check() {
        Ok(true) => SymbolVerdict::Shortlisted,
        Ok(false) => SymbolVerdict::NoSignal,
        Err(reason) => SymbolVerdict::Skipped(reason),
    }
}

fn evaluate<F>(symbols: &[String], parallel: bool, verdict: F) -> FilterReport
where
    F: Fn(&str) -> SymbolVerdict + Send + Sync,
{
    let run = |symbol: &String| {
        let verdict = verdict(symbol);
        debug!(symbol = symbol.as_str(), ?verdict, "verdict");
        FilterOutcome {
            symbol: symbol.clone(),
            verdict,
        }
    };
    let outcomes = if parallel {
        symbols.par_iter().map(run).collect()
    } else {
        symbols.iter().map(run).collect()
    };
    FilterReport { outcomes }
}

fn log_stage(stage: &str, report: &FilterReport) {
    info!(
        stage,
        evaluated = report.len(),
        shortlisted = report.shortlisted().len(),
        skipped = report.skipped().count(),
        "filter stage complete"
    );
}

pub fn dma_filter(
    source: &dyn PriceSource,
    symbols: &[String],
    settings: &FilterSettings,
) -> FilterReport {
    let report = evaluate(symbols, settings.parallel, |s| dma_verdict(source, s, settings));
    log_stage("dma", &report);
    report
}

pub fn intraday_scan(
    source: &dyn PriceSource,
    symbols: &[String],
    settings: &FilterSettings,
) -> FilterReport {
    let report = evaluate(symbols, settings.parallel, |s| {
        intraday_verdict(source, s, settings)
    });
    log_stage("intraday", &report);
    report
}

/// Run the stages selected by `mode`.
///
/// In `Both` mode only DMA-shortlisted symbols reach the intraday scan; every
/// input symbol still appears once in the report, carrying the verdict of the
/// last stage it reached.
pub fn run_filters(
    source: &dyn PriceSource,
    symbols: &[String],
    settings: &FilterSettings,
    mode: FilterMode,
) -> FilterReport {
    match mode {
        FilterMode::Daily => dma_filter(source, symbols, settings),
        FilterMode::Intraday => intraday_scan(source, symbols, settings),
        FilterMode::Both => {
            let mut report = dma_filter(source, symbols, settings);
            let passed = report.shortlisted();
            let second = intraday_scan(source, &passed, settings);
            let mut second = second.outcomes.into_iter();
            for outcome in report.outcomes.iter_mut().filter(|o| o.verdict.is_shortlisted()) {
                if let Some(next) = second.next() {
                    outcome.verdict = next.verdict;
                }
            }
            report
        }
    }
}
