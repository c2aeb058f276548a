//! Fraction-at-risk sweeps.
//!
//! One base configuration is re-run once per fraction. Data is loaded once and
//! shared; each run builds its own models, ledger, clock and stop table, so
//! runs are independent and can execute on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::load_data;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Summary of one run in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub fraction_at_risk: f64,
    pub run_id: String,
    pub fingerprint: String,
    pub final_equity: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub transaction_count: usize,
}

impl SweepEntry {
    fn from_result(fraction_at_risk: f64, result: &BacktestResult) -> Self {
        Self {
            fraction_at_risk,
            run_id: result.run_id.clone(),
            fingerprint: result.fingerprint.clone(),
            final_equity: result.final_equity,
            total_return: result.total_return,
            max_drawdown: result.max_drawdown,
            transaction_count: result.transaction_count(),
        }
    }
}

/// Sweep entries in the order the fractions were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub dataset_hash: String,
    pub entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the highest total return.
    pub fn best_by_return(&self) -> Option<&SweepEntry> {
        self.entries
            .iter()
            .max_by(|a, b| a.total_return.total_cmp(&b.total_return))
    }
}

/// Run `base` once per fraction.
pub fn run_fraction_sweep(
    base: &BacktestConfig,
    fractions: &[f64],
    parallel: bool,
) -> Result<SweepResults, RunError> {
    if fractions.is_empty() {
        return Err(ConfigError::Invalid("sweep needs at least one fraction".into()).into());
    }
    if let Some(bad) = fractions.iter().find(|f| !(**f > 0.0 && **f <= 1.0)) {
        return Err(
            ConfigError::Invalid(format!("fraction at risk must be in (0, 1], got {bad}")).into(),
        );
    }
    base.validate()?;
    let data = load_data(base)?;

    log::info!(
        "sweep: {} fractions ({})",
        fractions.len(),
        if parallel { "parallel" } else { "sequential" }
    );
    let run_one = |fraction: &f64| -> Result<SweepEntry, RunError> {
        let config = base.with_fraction_at_risk(*fraction);
        let result = run_backtest_from_data(&config, &data)?;
        Ok(SweepEntry::from_result(*fraction, &result))
    };
    let entries = if parallel {
        fractions
            .par_iter()
            .map(run_one)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        fractions.iter().map(run_one).collect::<Result<Vec<_>, _>>()?
    };
    log::info!("sweep done: {} runs", entries.len());

    Ok(SweepResults {
        dataset_hash: data.dataset_hash.clone(),
        entries,
    })
}

/// Parse a comma-separated fraction list such as `0.01,0.02,0.05`.
pub fn parse_fractions(raw: &str) -> Result<Vec<f64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| ConfigError::Invalid(format!("not a number: '{s}'")))
        })
        .collect()
}
