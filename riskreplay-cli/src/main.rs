//! RiskReplay CLI: run, sweep and validate backtest configurations.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config and write its artifacts
//! - `sweep`: re-run a config over a list of fractions at risk
//! - `validate`: parse and check a config without touching data
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for per-transaction
//! output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use riskreplay_runner::{
    parse_fractions, run_fraction_sweep, run_single_backtest, save_artifacts, save_sweep,
    BacktestConfig, BacktestResult, SweepResults,
};

#[derive(Parser)]
#[command(
    name = "riskreplay",
    about = "RiskReplay CLI: event-driven backtests with intrabar stop-losses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result JSON and CSVs.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Re-run a config once per fraction at risk.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Comma-separated fractions, e.g. 0.01,0.02,0.05.
        #[arg(long)]
        fractions: String,

        /// Run one configuration at a time instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Output directory for the sweep table.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Parse and validate a config file.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(config, output_dir),
        Commands::Sweep {
            config,
            fractions,
            sequential,
            output_dir,
        } => sweep_cmd(config, &fractions, sequential, output_dir),
        Commands::Validate { config } => validate_cmd(config),
    }
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn run_cmd(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let result = run_single_backtest(&config).context("backtest failed")?;
    print_summary(&result);

    // the run already succeeded; a failed export is reported, not fatal
    match save_artifacts(&result, &output_dir) {
        Ok(dir) => println!("Artifacts:    {}", dir.display()),
        Err(e) => log::error!("failed to write artifacts to {}: {e:#}", output_dir.display()),
    }
    Ok(())
}

fn sweep_cmd(config_path: PathBuf, fractions: &str, sequential: bool, output_dir: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let fractions = parse_fractions(fractions)?;
    let sweep = run_fraction_sweep(&config, &fractions, !sequential).context("sweep failed")?;
    print_sweep(&sweep);

    match save_sweep(&sweep, &output_dir) {
        Ok(path) => println!("Sweep table: {}", path.display()),
        Err(e) => log::error!("failed to write sweep to {}: {e:#}", output_dir.display()),
    }
    Ok(())
}

fn validate_cmd(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    config.validate()?;
    println!(
        "{}: ok ({} models, {} tickers, run id {})",
        config_path.display(),
        config.models.len(),
        config.tickers().len(),
        &config.run_id()?[..12]
    );
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let run = &result.run;
    println!("Run id:       {}", result.run_id);
    println!("Fingerprint:  {}", result.fingerprint);
    println!("Dataset:      {} ({:?})", result.dataset_hash, result.data_source);
    println!("Ticks:        {}", run.tick_count);
    println!("Transactions: {}", run.transactions.len());
    println!("Initial cash: {:.2}", run.initial_cash);
    println!("Final equity: {:.2}", result.final_equity);
    println!("Return:       {:.2}%", result.total_return * 100.0);
    println!("Max drawdown: {:.2}%", result.max_drawdown * 100.0);
    for position in &run.final_positions {
        println!(
            "  {:<20} {:>12} @ {:.4}",
            position.ticker, position.quantity, position.avg_cost
        );
    }
}

fn print_sweep(sweep: &SweepResults) {
    println!(
        "{:>10}  {:>14}  {:>9}  {:>9}  {:>6}",
        "fraction", "final equity", "return", "max dd", "trades"
    );
    for e in &sweep.entries {
        println!(
            "{:>10.4}  {:>14.2}  {:>8.2}%  {:>8.2}%  {:>6}",
            e.fraction_at_risk,
            e.final_equity,
            e.total_return * 100.0,
            e.max_drawdown * 100.0,
            e.transaction_count
        );
    }
    if let Some(best) = sweep.best_by_return() {
        println!("Best return at fraction {}", best.fraction_at_risk);
    }
}
