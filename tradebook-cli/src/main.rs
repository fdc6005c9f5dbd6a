//! Tradebook CLI: reconcile a trade-action log and report performance.
//!
//! Commands:
//! - `metrics`: extended metrics, overall or per backtest
//! - `positions`: the reconciled positions with close reasons
//! - `report`: write report.json, positions.csv and equity.csv

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tradebook_core::{PositionMatcher, TradeAction};
use tradebook_runner::{
    calculate_trade_metrics_extended, compute_by_backtest, load_actions, save_report,
    MetricsConfig, MetricsReport,
};

#[derive(Parser)]
#[command(
    name = "tradebook",
    about = "Tradebook CLI: position reconciliation and trade metrics"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute extended metrics for a trade-action file.
    Metrics {
        #[command(flatten)]
        input: InputArgs,

        /// One row per backtest id instead of a single summary.
        #[arg(long, default_value_t = false)]
        by_backtest: bool,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List reconciled positions.
    Positions {
        #[command(flatten)]
        input: InputArgs,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the full report bundle to a directory.
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory.
        #[arg(long, default_value = "report")]
        output_dir: PathBuf,
    },
}

/// Input file plus config overrides shared by every command.
#[derive(Args)]
struct InputArgs {
    /// Trade actions (.json or .csv).
    #[arg(long)]
    input: PathBuf,

    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting capital for the equity curve.
    #[arg(long)]
    initial_capital: Option<f64>,

    /// Price tolerance in percent (0.1 = 0.1%).
    #[arg(long)]
    tolerance: Option<f64>,

    /// Mark price for positions still open.
    #[arg(long)]
    current_price: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Metrics {
            input,
            by_backtest,
            json,
        } => run_metrics(&input, by_backtest, json),
        Commands::Positions { input, json } => run_positions(&input, json),
        Commands::Report { input, output_dir } => run_report(&input, &output_dir),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(format!("tradebook={level}")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn resolve_config(args: &InputArgs) -> Result<MetricsConfig> {
    let mut config = match &args.config {
        Some(path) => MetricsConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => MetricsConfig::default(),
    };
    if let Some(capital) = args.initial_capital {
        config = config.with_initial_capital(capital);
    }
    if let Some(tolerance) = args.tolerance {
        config = config.with_tolerance_percent(tolerance);
    }
    if let Some(price) = args.current_price {
        config = config.with_current_price(price);
    }
    config.validate().context("invalid metrics config")?;
    Ok(config)
}

fn load(args: &InputArgs) -> Result<(Vec<TradeAction>, MetricsConfig)> {
    let config = resolve_config(args)?;
    let actions = load_actions(&args.input)
        .with_context(|| format!("failed to load trade actions from {}", args.input.display()))?;
    tracing::info!(count = actions.len(), path = %args.input.display(), "loaded trade actions");
    Ok((actions, config))
}

fn run_metrics(args: &InputArgs, by_backtest: bool, json: bool) -> Result<()> {
    let (actions, config) = load(args)?;

    if by_backtest {
        let results = compute_by_backtest(&actions, &config);
        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            display::print_backtest_table(&results);
        }
        return Ok(());
    }

    let metrics = calculate_trade_metrics_extended(&actions, &config);
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        display::print_metrics(&metrics);
    }
    Ok(())
}

fn run_positions(args: &InputArgs, json: bool) -> Result<()> {
    let (actions, config) = load(args)?;
    let matcher = PositionMatcher::new(config.tolerance_fraction());
    let rec = matcher.reconcile(&actions, config.current_price);

    if json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
    } else {
        display::print_positions(&rec.positions, rec.unmatched_closes.len());
    }
    Ok(())
}

fn run_report(args: &InputArgs, output_dir: &Path) -> Result<()> {
    let (actions, config) = load(args)?;
    let report = MetricsReport::build(&actions, &config);
    let dir = save_report(&report, output_dir)
        .with_context(|| format!("failed to write report to {}", output_dir.display()))?;

    println!("Report written to {}", dir.display());
    println!("  Input hash: {}", report.input_hash);
    println!(
        "  Positions:  {} ({} open)",
        report.positions.len(),
        report.metrics.open_positions_count
    );
    println!(
        "  Total PnL:  {}",
        display::format_currency(report.metrics.base.total_pnl, 2)
    );
    Ok(())
}
