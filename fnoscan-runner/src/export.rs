//! Export — shortlist text, CSV tables and JSON reports.
//!
//! - **Shortlist**: one symbol per line
//! - **Backtest CSV**: `symbol,trades,avg_return_pct,win_rate_pct`, one row per
//!   symbol; skipped symbols report zeros
//! - **Trade log CSV**: every simulated trade with its running PnL; written
//!   with the scan outputs when backtests ran and `output.trade_log` is set
//! - **JSON**: the full `ScanReport`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backtest::BacktestReport;
use crate::config::OutputSection;
use crate::pipeline::ScanReport;
use crate::simulate::{trade_log, TradeLogRow};

// ─── Text ───────────────────────────────────────────────────────────

pub fn shortlist_text(symbols: &[String]) -> String {
    symbols.join("\n")
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_shortlist(path: &Path, symbols: &[String]) -> Result<()> {
    write_file(path, &shortlist_text(symbols))
}

// ─── CSV ────────────────────────────────────────────────────────────

pub fn backtest_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "trades", "avg_return_pct", "win_rate_pct"])?;
    for result in &report.results {
        let s = result.outcome.summary();
        wtr.write_record([
            result.symbol.as_str(),
            &s.trade_count.to_string(),
            &format!("{:.2}", s.avg_return * 100.0),
            &format!("{:.1}", s.win_rate * 100.0),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn trade_log_csv(rows: &[TradeLogRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "date", "entry", "exit", "pct_return", "cum_pnl"])?;
    for row in rows {
        wtr.write_record([
            row.symbol.as_str(),
            &row.date.to_string(),
            &format!("{:.4}", row.entry),
            &format!("{:.4}", row.exit),
            &format!("{:.6}", row.pct_return),
            &format!("{:.6}", row.cum_pnl),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn report_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

// ─── Bundle ─────────────────────────────────────────────────────────

/// Write every artifact `output` asks for; returns the paths written.
pub fn save_scan_outputs(report: &ScanReport, output: &OutputSection) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    write_shortlist(&output.shortlist, &report.shortlisted)?;
    written.push(output.shortlist.clone());

    if let Some(backtests) = &report.backtests {
        write_file(&output.backtest_csv, &backtest_csv(backtests)?)?;
        written.push(output.backtest_csv.clone());

        if let Some(path) = &output.trade_log {
            write_trade_log(path, &trade_log(backtests).log)?;
            written.push(path.clone());
        }
    }

    if let Some(path) = &output.report_json {
        write_file(path, &report_json(report)?)?;
        written.push(path.clone());
    }

    Ok(written)
}

pub fn write_trade_log(path: &Path, rows: &[TradeLogRow]) -> Result<()> {
    write_file(path, &trade_log_csv(rows)?)
}
