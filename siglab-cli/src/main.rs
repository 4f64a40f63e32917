//! SigLab CLI: analyze, backtest, screen, comment and demo commands.
//!
//! Commands:
//! - `analyze` evaluates the signal set for one symbol and saves report artifacts
//! - `backtest` replays crossovers over the trailing lookback window
//! - `screen` runs the signal set over a symbol list and writes a CSV table
//! - `comment` asks a chat model for a buy / sell / hold opinion
//! - `demo` runs the whole pipeline on synthetic data, no files needed

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use siglab_core::data::{read_csv_series, CsvProvider, DataProvider, SyntheticProvider};
use siglab_core::{BacktestReport, BacktestSignal, CrossDirection, Series};
use siglab_runner::{
    analyze, comment_on, export_report_json, export_screen_csv, export_trades_csv, parse_symbols,
    render_markdown, save_artifacts, screen, AnalysisReport, AnalyzeOptions, ChatClient,
    SiglabConfig,
};

#[derive(Parser)]
#[command(
    name = "siglab",
    about = "SigLab CLI: technical signals and crossover backtests on daily bars"
)]
struct Cli {
    /// TOML config file (defaults apply to anything it leaves out)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the bars for a single symbol come from.
#[derive(clap::Args)]
struct SourceArgs {
    /// Symbol code, e.g. 600000
    #[arg(long)]
    symbol: String,

    /// Read this CSV file instead of looking the symbol up in a data directory
    #[arg(long, conflicts_with_all = ["data_dir", "synthetic"])]
    csv: Option<PathBuf>,

    /// Directory holding `<symbol>.csv` files (overrides `[data] dir`)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the deterministic synthetic random walk
    #[arg(long, conflicts_with = "data_dir")]
    synthetic: bool,

    /// First date to load (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last date to load (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every signal at the latest bar (or at --at)
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Evaluate as of this date (YYYY-MM-DD); later bars are ignored
        #[arg(long)]
        at: Option<String>,

        /// Skip the crossover backtest
        #[arg(long)]
        no_backtest: bool,

        /// Print the JSON report to stdout instead of a summary
        #[arg(long)]
        json: bool,

        /// Write report.json, trades.csv and report.md under this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Backtest MACD or MA crossovers over the trailing lookback window
    Backtest {
        #[command(flatten)]
        source: SourceArgs,

        /// Crossover family: macd, or ma:FAST:SLOW (e.g. ma:5:10)
        #[arg(long)]
        signal: Option<String>,

        /// Trailing usable bars to scan
        #[arg(long)]
        lookback: Option<usize>,

        /// Bars between entry and exit
        #[arg(long)]
        holding_days: Option<usize>,

        /// Write the trade list as CSV to this file
        #[arg(long)]
        trades_csv: Option<PathBuf>,

        /// Print the backtest report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the signal set for many symbols in parallel
    Screen {
        /// Comma or whitespace separated symbols (overrides `[screen] symbols`)
        #[arg(long)]
        symbols: Option<String>,

        /// File with one or more symbols per line
        #[arg(long, conflicts_with = "symbols")]
        symbols_file: Option<PathBuf>,

        /// Directory holding `<symbol>.csv` files (overrides `[data] dir`)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Use the deterministic synthetic random walk
        #[arg(long, conflicts_with = "data_dir")]
        synthetic: bool,

        /// First date to load (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last date to load (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Write the code,signals table here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Ask a chat model for commentary on the latest analysis
    Comment {
        #[command(flatten)]
        source: SourceArgs,

        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,

        /// Model name (overrides `[commentary] model`)
        #[arg(long)]
        model: Option<String>,

        /// Print the prompt and exit without calling the API
        #[arg(long)]
        dry_run: bool,
    },

    /// Analyze a synthetic symbol end to end
    Demo {
        /// Symbol used to seed the synthetic walk
        #[arg(long, default_value = "600000")]
        symbol: String,

        /// Write report artifacts under this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            source,
            at,
            no_backtest,
            json,
            output_dir,
        } => run_analyze(&config, &source, at, !no_backtest, json, output_dir),
        Commands::Backtest {
            source,
            signal,
            lookback,
            holding_days,
            trades_csv,
            json,
        } => run_backtest_cmd(
            config,
            &source,
            signal,
            lookback,
            holding_days,
            trades_csv,
            json,
        ),
        Commands::Screen {
            symbols,
            symbols_file,
            data_dir,
            synthetic,
            start,
            end,
            output,
        } => run_screen(
            &config,
            symbols,
            symbols_file,
            data_dir,
            synthetic,
            start,
            end,
            output,
        ),
        Commands::Comment {
            source,
            at,
            model,
            dry_run,
        } => run_comment(config, &source, at, model, dry_run),
        Commands::Demo { symbol, output_dir } => run_demo(&config, &symbol, output_dir),
    }
}

/// Logs go to stderr so `--json` output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SiglabConfig> {
    let mut config = match path {
        Some(p) => SiglabConfig::load(p)
            .with_context(|| format!("failed to load config {}", p.display()))?,
        None => SiglabConfig::default(),
    };
    if config.commentary.api_key.is_none() {
        config.commentary.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
    }
    Ok(config)
}

fn parse_date(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{s}'"))
        })
        .transpose()
}

fn resolve_range(
    config: &SiglabConfig,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate)> {
    let mut data = config.data.clone();
    if let Some(start) = parse_date(start, "start")? {
        data.start = Some(start);
    }
    if let Some(end) = parse_date(end, "end")? {
        data.end = Some(end);
    }
    let (start, end) = data.range(chrono::Local::now().date_naive());
    if start > end {
        bail!("start date {start} is after end date {end}");
    }
    Ok((start, end))
}

fn provider_for(
    config: &SiglabConfig,
    data_dir: Option<PathBuf>,
    synthetic: bool,
) -> Result<Box<dyn DataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider));
    }
    match data_dir.or_else(|| config.data.dir.clone()) {
        Some(dir) => Ok(Box::new(CsvProvider::new(dir))),
        None => bail!("no data source: pass --csv, --data-dir, --synthetic, or set [data] dir"),
    }
}

fn load_series(config: &SiglabConfig, source: &SourceArgs) -> Result<Series> {
    if let Some(path) = &source.csv {
        return load_csv(
            path,
            &source.symbol,
            parse_date(source.start.as_deref(), "start")?,
            parse_date(source.end.as_deref(), "end")?,
        );
    }

    let (start, end) = resolve_range(config, source.start.as_deref(), source.end.as_deref())?;
    let provider = provider_for(config, source.data_dir.clone(), source.synthetic)?;
    let fetched = provider
        .fetch(&source.symbol, start, end)
        .with_context(|| format!("{} provider failed for {}", provider.name(), source.symbol))?;
    if fetched.source.is_synthetic() {
        tracing::warn!(symbol = %source.symbol, "using synthetic data");
    }
    Ok(fetched.series)
}

/// Read a CSV file, keeping only bars inside `--start`/`--end` when given.
fn load_csv(
    path: &Path,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Series> {
    let series = read_csv_series(path, symbol)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if start.is_none() && end.is_none() {
        return Ok(series);
    }
    let (start, end) = (start.unwrap_or(NaiveDate::MIN), end.unwrap_or(NaiveDate::MAX));
    series
        .within(start, end)
        .with_context(|| format!("{} has no bars between {start} and {end}", path.display()))
}

fn run_analyze(
    config: &SiglabConfig,
    source: &SourceArgs,
    at: Option<String>,
    backtest: bool,
    json: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let series = load_series(config, source)?;
    let opts = AnalyzeOptions {
        at: parse_date(at.as_deref(), "at")?,
        backtest,
        recent_closes: config.commentary.recent_closes,
    };
    let report = analyze(&series, &config.analysis, &opts)?;

    if json {
        println!("{}", export_report_json(&report)?);
    } else {
        print_markdown(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_backtest_cmd(
    mut config: SiglabConfig,
    source: &SourceArgs,
    signal: Option<String>,
    lookback: Option<usize>,
    holding_days: Option<usize>,
    trades_csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if let Some(signal) = signal {
        config.analysis.backtest.signal = parse_backtest_signal(&signal)?;
    }
    if let Some(lookback) = lookback {
        config.analysis.backtest.lookback = lookback;
    }
    if let Some(holding_days) = holding_days {
        config.analysis.backtest.holding_days = holding_days;
    }
    if let BacktestSignal::MaCross { fast, slow } = config.analysis.backtest.signal {
        for window in [fast, slow] {
            if !config.analysis.ma_windows.contains(&window) {
                config.analysis.ma_windows.push(window);
            }
        }
    }

    let series = load_series(&config, source)?;
    let opts = AnalyzeOptions {
        backtest: true,
        recent_closes: 0,
        ..AnalyzeOptions::default()
    };
    let report = analyze(&series, &config.analysis, &opts)?;
    let Some(bt) = report.backtest.as_ref() else {
        bail!("backtest was not run");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(bt)?);
    } else {
        print_backtest(&report.symbol, bt);
    }

    if let Some(path) = trades_csv {
        std::fs::write(&path, export_trades_csv(&bt.trades)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Trades written to: {}", path.display());
    }
    Ok(())
}

fn parse_backtest_signal(text: &str) -> Result<BacktestSignal> {
    let text = text.trim().to_ascii_lowercase();
    if text == "macd" {
        return Ok(BacktestSignal::MacdCross);
    }
    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        ["ma", fast, slow] => Ok(BacktestSignal::MaCross {
            fast: fast.parse().context("fast MA window")?,
            slow: slow.parse().context("slow MA window")?,
        }),
        _ => bail!("unknown backtest signal '{text}'. Valid: macd, ma:FAST:SLOW"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_screen(
    config: &SiglabConfig,
    symbols: Option<String>,
    symbols_file: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    synthetic: bool,
    start: Option<String>,
    end: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let symbols = match (symbols, symbols_file) {
        (Some(text), _) => parse_symbols(&text),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_symbols(&text)
        }
        (None, None) => config.screen.symbols.clone(),
    };
    if symbols.is_empty() {
        bail!("no symbols to screen: pass --symbols, --symbols-file, or set [screen] symbols");
    }

    let (start, end) = resolve_range(config, start.as_deref(), end.as_deref())?;
    let provider = provider_for(config, data_dir, synthetic)?;
    let rows = screen(provider.as_ref(), &symbols, &config.analysis, start, end)?;

    let failed = rows.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        tracing::warn!(failed, total = rows.len(), "some symbols could not be screened");
    }

    let csv = export_screen_csv(&rows)?;
    match output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Screen results written to: {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn run_comment(
    mut config: SiglabConfig,
    source: &SourceArgs,
    at: Option<String>,
    model: Option<String>,
    dry_run: bool,
) -> Result<()> {
    if let Some(model) = model {
        config.commentary.model = model;
    }
    let series = load_series(&config, source)?;
    let opts = AnalyzeOptions {
        at: parse_date(at.as_deref(), "at")?,
        backtest: true,
        recent_closes: config.commentary.recent_closes,
    };
    let report = analyze(&series, &config.analysis, &opts)?;

    if dry_run {
        let prompt = siglab_runner::build_prompt(&report);
        println!("{}\n\n{}", prompt.system, prompt.user);
        return Ok(());
    }

    let client = ChatClient::new(&config.commentary)
        .context("set OPENAI_API_KEY or [commentary] api_key")?;
    let text = comment_on(&report, &client)
        .with_context(|| format!("commentary request to {} failed", client.model()))?;
    println!("{text}");
    Ok(())
}

fn run_demo(config: &SiglabConfig, symbol: &str, output_dir: Option<PathBuf>) -> Result<()> {
    let end = chrono::Local::now().date_naive();
    let start = end - chrono::Duration::days(i64::from(config.data.history_days.max(365)));
    let series = SyntheticProvider
        .fetch(symbol, start, end)
        .with_context(|| format!("synthetic provider failed for {symbol}"))?
        .series;

    let report = analyze(&series, &config.analysis, &AnalyzeOptions::default())?;
    print_markdown(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_markdown(report: &AnalysisReport) {
    print!("{}", render_markdown(report));
}

fn print_backtest(symbol: &str, bt: &BacktestReport) {
    println!();
    println!("=== Backtest: {symbol} ===");
    println!("Signal:         {}", bt.signal.label());
    println!("Usable bars:    {} (lookback {})", bt.usable_bars, bt.lookback);
    println!("Holding days:   {}", bt.holding_days);
    if bt.skipped_triggers > 0 {
        println!("Skipped:        {}", bt.skipped_triggers);
    }
    println!();
    for direction in CrossDirection::ALL {
        let s = bt.summary_for(direction);
        println!(
            "{:<18} count {:>3}  win rate {:>7}  mean {:>7.2}%",
            direction.label(),
            s.occurrence_count,
            s.win_rate_pct(),
            s.mean_return * 100.0
        );
    }
    println!();
    for t in &bt.trades {
        println!(
            "{}  {:<18} {:>8.2} -> {:>8.2}  {:>8}",
            t.entry_date,
            t.signal_kind.label(),
            t.entry_price,
            t.exit_price,
            t.return_pct_display()
        );
    }
}
