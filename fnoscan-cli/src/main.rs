//! fnoscan CLI — NSE F&O bullish setup scanner.
//!
//! Commands:
//! - `scan` — filter the universe, optionally backtest, notify and repeat
//! - `backtest` — per-symbol backtests with a results CSV
//! - `simulate` — market simulation with a cumulative trade log
//! - `universe` — print the symbol universe

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use fnoscan_core::data::{
    parse_symbol_list, CircuitBreaker, FnoListUniverse, HistoryRange, PriceSource,
    StaticUniverse, SymbolUniverse, SyntheticProvider, YahooProvider, MAX_RANGE_DAYS,
};
use fnoscan_core::domain::Interval;
use fnoscan_core::{MaKind, SimulationMode};
use fnoscan_runner::export::{backtest_csv, report_json, write_shortlist};
use fnoscan_runner::{
    backtest_universe, compare_with_indices, market_message, run_scan, save_scan_outputs,
    simulate_market, write_trade_log, FilterMode, Notifier, ScanConfig, ScanReport,
    TelegramNotifier,
};

#[derive(Parser)]
#[command(name = "fnoscan", about = "fnoscan — NSE F&O bullish setup scanner")]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe for the moving-average setup.
    Scan(ScanArgs),
    /// Backtest symbols and write a results CSV.
    Backtest(BacktestArgs),
    /// Simulate trading a universe and write the trade log.
    Simulate(SimulateArgs),
    /// Print the symbol universe.
    Universe(UniverseArgs),
}

/// Flags shared by every command that touches prices.
#[derive(Args)]
struct CommonArgs {
    /// TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fast moving-average period.
    #[arg(long)]
    fast: Option<usize>,

    /// Slow moving-average period.
    #[arg(long)]
    slow: Option<usize>,

    /// Moving-average kind: simple (sma) or exponential (ema).
    #[arg(long)]
    ma_kind: Option<MaKind>,

    /// Comma separated list of ticker symbols (skips the F&O download).
    #[arg(long)]
    symbols: Option<String>,

    /// Custom URL to download the F&O stock list.
    #[arg(long)]
    fno_url: Option<String>,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Evaluate symbols in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Args)]
struct ScanArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// File to write scan results.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run a backtest for shortlisted stocks.
    #[arg(long, default_value_t = false)]
    backtest: bool,

    /// Send a Telegram notification (TELEGRAM_TOKEN / TELEGRAM_CHAT_ID).
    #[arg(long, default_value_t = false)]
    notify: bool,

    /// Re-run the scan every --freq minutes.
    #[arg(long, default_value_t = false)]
    schedule: bool,

    /// Like --schedule, also printing the shortlist each run.
    #[arg(long, default_value_t = false)]
    schedule_pred: bool,

    /// Minutes between scheduled runs.
    #[arg(long)]
    freq: Option<u64>,

    /// Candle interval for the intraday scan.
    #[arg(long)]
    interval: Option<Interval>,

    /// Which scans to run: daily, intraday or both.
    #[arg(long)]
    mode: Option<FilterMode>,

    /// Simulation mode for the backtester (default: follows --mode).
    #[arg(long)]
    bt_mode: Option<SimulationMode>,

    /// History requested for the backtester (e.g. 6mo, 100d, 1y).
    #[arg(long)]
    bt_period: Option<HistoryRange>,

    /// Intraday interval for the backtester (default: --interval).
    #[arg(long)]
    bt_interval: Option<Interval>,

    /// Higher timeframe candles to ignore.
    #[arg(long)]
    offset: Option<usize>,

    /// Lower timeframe candles to ignore.
    #[arg(long)]
    lower_offset: Option<usize>,

    /// Post-filter hook spec, e.g. prefix:N, allow:A|B, deny:A, limit:10.
    #[arg(long)]
    strategy: Option<String>,

    /// Intraday backtests ignore candles before this hour.
    #[arg(long)]
    start_hour: Option<u32>,

    /// Also write the full report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct BacktestArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Simulation mode: daily, intraday or both.
    #[arg(long, default_value = "daily")]
    mode: SimulationMode,

    /// History to download (e.g. 6mo).
    #[arg(long)]
    period: Option<HistoryRange>,

    /// Intraday candle interval.
    #[arg(long)]
    interval: Option<Interval>,

    /// Intraday sessions start at this hour.
    #[arg(long)]
    start_hour: Option<u32>,

    /// Results CSV path.
    #[arg(long, default_value = "backtest_results.csv")]
    output: PathBuf,

    /// Print results as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Simulation mode: daily, intraday or both.
    #[arg(long, default_value = "intraday")]
    mode: SimulationMode,

    /// Days of history to replay.
    #[arg(long, default_value_t = 5)]
    days: u32,

    /// Candle interval.
    #[arg(long, default_value = "15m")]
    interval: Interval,

    /// Trade log CSV path.
    #[arg(long, default_value = "trade_log.csv")]
    trade_log: PathBuf,

    /// Also write symbols with at least one trade here, one per line.
    #[arg(long)]
    save_shortlist: Option<PathBuf>,

    /// Print the simulation as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct UniverseArgs {
    /// Custom URL to download the F&O stock list.
    #[arg(long)]
    fno_url: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    match cli.command {
        Commands::Scan(args) => run_scan_cmd(args),
        Commands::Backtest(args) => run_backtest_cmd(args),
        Commands::Simulate(args) => run_simulate_cmd(args),
        Commands::Universe(args) => run_universe_cmd(args),
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["fnoscan", "fnoscan_core", "fnoscan_runner"] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

// ─── Shared setup ───────────────────────────────────────────────────

impl CommonArgs {
    /// Load the config file (or defaults) and apply the shared overrides.
    fn load_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_file(path)?,
            None => ScanConfig::default(),
        };
        if let Some(fast) = self.fast {
            config.strategy.fast = fast;
        }
        if let Some(slow) = self.slow {
            config.strategy.slow = slow;
        }
        if let Some(kind) = self.ma_kind {
            config.strategy.kind = kind;
        }
        if let Some(text) = &self.symbols {
            let symbols = parse_symbol_list(text);
            if symbols.is_empty() {
                bail!("--symbols did not contain any symbol");
            }
            config.universe.symbols = symbols;
        }
        if let Some(url) = &self.fno_url {
            config.universe.fno_url = url.clone();
        }
        if self.parallel {
            config.filter.parallel = true;
        }
        Ok(config)
    }

    fn price_source(&self) -> Result<Box<dyn PriceSource>> {
        if self.synthetic {
            let today = chrono::Local::now().date_naive();
            warn!("using synthetic prices; results are not market data");
            return Ok(Box::new(SyntheticProvider::new(today)));
        }
        let breaker = Arc::new(CircuitBreaker::default_provider());
        Ok(Box::new(YahooProvider::new(breaker)?))
    }
}

fn universe_for(config: &ScanConfig) -> Box<dyn SymbolUniverse> {
    if config.universe.symbols.is_empty() {
        Box::new(FnoListUniverse::new(config.universe.fno_url.clone()))
    } else {
        Box::new(StaticUniverse::new(&config.universe.symbols))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

// ─── scan ───────────────────────────────────────────────────────────

impl ScanArgs {
    fn apply(&self, config: &mut ScanConfig) {
        if let Some(path) = &self.output {
            config.output.shortlist = path.clone();
        }
        if self.backtest {
            config.backtest.enabled = true;
        }
        if let Some(freq) = self.freq {
            config.schedule.every_minutes = freq;
        }
        if let Some(interval) = self.interval {
            config.filter.lower_interval = interval;
        }
        if let Some(mode) = self.mode {
            config.filter.mode = mode;
        }
        if let Some(mode) = self.bt_mode {
            config.backtest.mode = Some(mode);
        }
        if let Some(range) = self.bt_period {
            config.backtest.range = range;
        }
        if let Some(interval) = self.bt_interval {
            config.backtest.interval = Some(interval);
        }
        if let Some(offset) = self.offset {
            config.filter.offset = offset;
        }
        if let Some(offset) = self.lower_offset {
            config.filter.lower_offset = offset;
        }
        if let Some(spec) = &self.strategy {
            config.strategy.hook = Some(spec.clone());
        }
        if let Some(hour) = self.start_hour {
            config.backtest.start_hour = Some(hour);
        }
        if let Some(path) = &self.report {
            config.output.report_json = Some(path.clone());
        }
    }
}

fn run_scan_cmd(args: ScanArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    args.apply(&mut config);
    config.validate()?;

    let source = args.common.price_source()?;
    let universe = universe_for(&config);
    let notifier = if args.notify {
        let notifier = TelegramNotifier::from_env()?;
        if notifier.is_none() {
            warn!("--notify given but TELEGRAM_TOKEN / TELEGRAM_CHAT_ID are not set");
        }
        notifier
    } else {
        None
    };

    if !(args.schedule || args.schedule_pred) {
        let report = scan_once(
            &config,
            source.as_ref(),
            universe.as_ref(),
            notifier.as_ref(),
            args.json,
        )?;
        info!(run_id = %report.run_id, "done");
        return Ok(());
    }

    let every = Duration::from_secs(config.schedule.every_minutes * 60);
    info!(minutes = config.schedule.every_minutes, "scheduled scanning started");
    loop {
        let outcome = scan_once(
            &config,
            source.as_ref(),
            universe.as_ref(),
            notifier.as_ref(),
            args.json,
        );
        match outcome {
            Ok(report) => {
                if args.schedule_pred {
                    println!(
                        "Stocks ({}): {}",
                        report.shortlisted.len(),
                        report.shortlisted.join(", ")
                    );
                }
                println!(
                    "Predicted market up move probability: {:.1}%",
                    report.up_probability * 100.0
                );
            }
            Err(e) => error!("scan failed: {e:#}"),
        }
        std::thread::sleep(every);
    }
}

fn scan_once(
    config: &ScanConfig,
    source: &dyn PriceSource,
    universe: &dyn SymbolUniverse,
    notifier: Option<&TelegramNotifier>,
    json: bool,
) -> Result<ScanReport> {
    let report = run_scan(config, source, universe)?;
    let written = save_scan_outputs(&report, &config.output)?;
    for path in &written {
        info!(path = %path.display(), "written");
    }

    if json {
        println!("{}", report_json(&report)?);
    } else {
        print_scan_report(&report);
    }

    if let Some(notifier) = notifier {
        let cmp = compare_with_indices(source, &report.shortlisted);
        let message = market_message(report.shortlisted.len(), report.up_probability, &cmp);
        if let Err(e) = notifier.send(&message) {
            warn!("telegram notification failed: {e}");
        }
    }
    Ok(report)
}

fn print_scan_report(report: &ScanReport) {
    println!("Shortlisted stocks ({}):", report.shortlisted.len());
    for symbol in &report.shortlisted {
        println!("{symbol}");
    }
    if !report.skipped.is_empty() {
        println!("\nSkipped ({}):", report.skipped.len());
        for skipped in &report.skipped {
            println!("{}: {}", skipped.symbol, skipped.reason);
        }
    }
    if let Some(backtests) = &report.backtests {
        println!("\nBacktest results:");
        for result in &backtests.results {
            let s = result.outcome.summary();
            println!(
                "{}: trades={}, avg_return={:.2}%, win_rate={:.1}%",
                result.symbol,
                s.trade_count,
                s.avg_return * 100.0,
                s.win_rate * 100.0
            );
        }
    }
}

// ─── backtest ───────────────────────────────────────────────────────

fn run_backtest_cmd(args: BacktestArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    config.backtest.mode = Some(args.mode);
    if let Some(range) = args.period {
        config.backtest.range = range;
    }
    if let Some(interval) = args.interval {
        config.backtest.interval = Some(interval);
    }
    if let Some(hour) = args.start_hour {
        config.backtest.start_hour = Some(hour);
    }
    config.validate()?;

    let settings = config.backtest_settings()?;
    let source = args.common.price_source()?;
    let symbols = universe_for(&config).symbols()?;
    if symbols.is_empty() {
        bail!("no symbols to backtest");
    }

    let report = backtest_universe(source.as_ref(), &symbols, &settings);
    std::fs::write(&args.output, backtest_csv(&report)?)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if args.json {
        return print_json(&report);
    }
    for result in &report.results {
        let s = result.outcome.summary();
        println!(
            "{}: trades={}, avg_return={:.2}%, win_rate={:.1}%",
            result.symbol,
            s.trade_count,
            s.avg_return * 100.0,
            s.win_rate * 100.0
        );
    }
    for (symbol, reason) in report.skipped() {
        println!("{symbol}: skipped ({reason})");
    }
    println!(
        "\nOverall: trades={}, avg_return={:.2}%, win_rate={:.1}%",
        report.overall.trade_count,
        report.overall.avg_return * 100.0,
        report.overall.win_rate * 100.0
    );
    Ok(())
}

// ─── simulate ───────────────────────────────────────────────────────

/// Effective config for `simulate`: flags over the config file.
fn simulate_config(args: &SimulateArgs) -> Result<ScanConfig> {
    if args.days == 0 || args.days > MAX_RANGE_DAYS {
        bail!("--days must be between 1 and {MAX_RANGE_DAYS}");
    }
    if args.mode.includes_intraday() && !args.interval.is_intraday() {
        bail!(
            "--interval {} is not intraday; {} mode needs 1m, 5m, 15m, 30m or 60m",
            args.interval,
            args.mode
        );
    }
    let mut config = args.common.load_config()?;
    config.backtest.mode = Some(args.mode);
    config.backtest.range = HistoryRange::Days(args.days);
    if args.interval.is_intraday() {
        config.backtest.interval = Some(args.interval);
    }
    config.validate()?;
    Ok(config)
}

fn run_simulate_cmd(args: SimulateArgs) -> Result<()> {
    let config = simulate_config(&args)?;
    let settings = config.backtest_settings()?;
    let source = args.common.price_source()?;
    let symbols = universe_for(&config).symbols()?;

    let sim = simulate_market(source.as_ref(), &symbols, &settings);
    write_trade_log(&args.trade_log, &sim.log)?;
    if let Some(path) = &args.save_shortlist {
        write_shortlist(path, &sim.shortlisted)?;
    }

    if args.json {
        return print_json(&sim);
    }
    println!("Symbols with trades ({}):", sim.shortlisted.len());
    for symbol in &sim.shortlisted {
        println!("{symbol}");
    }
    println!(
        "\n{} trades, cumulative return {:.2}%",
        sim.log.len(),
        sim.total_pnl() * 100.0
    );
    Ok(())
}

// ─── universe ───────────────────────────────────────────────────────

fn run_universe_cmd(args: UniverseArgs) -> Result<()> {
    let universe = match args.fno_url {
        Some(url) => FnoListUniverse::new(url),
        None => FnoListUniverse::default(),
    };
    let symbols = universe.symbols()?;
    println!("F&O symbols ({}):", symbols.len());
    for symbol in &symbols {
        println!("{symbol}");
    }
    Ok(())
}
