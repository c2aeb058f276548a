//! Export: JSON result, transaction and equity CSVs, sweep tables.
//!
//! All persisted results carry a `schema_version`; newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use riskreplay_core::domain::{EquityPoint, Transaction, TransactionOrigin};

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, ticker, quantity, price, origin.
pub fn export_transactions_csv(transactions: &[Transaction]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "ticker", "quantity", "price", "origin"])?;
    for t in transactions {
        let origin = match t.origin {
            TransactionOrigin::Signal => "signal",
            TransactionOrigin::StopLoss => "stop_loss",
        };
        wtr.write_record([
            &t.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &t.ticker,
            &t.quantity.to_string(),
            &format!("{:.6}", t.price),
            origin,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: timestamp, equity.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for point in equity_curve {
        wtr.write_record([
            &point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", point.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per sweep entry.
pub fn export_sweep_csv(sweep: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "fraction_at_risk",
        "run_id",
        "fingerprint",
        "final_equity",
        "total_return",
        "max_drawdown",
        "transactions",
    ])?;
    for e in &sweep.entries {
        wtr.write_record([
            &e.fraction_at_risk.to_string(),
            &e.run_id,
            &e.fingerprint,
            &format!("{:.2}", e.final_equity),
            &format!("{:.6}", e.total_return),
            &format!("{:.6}", e.max_drawdown),
            &e.transaction_count.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run under `output_dir/<run id prefix>/`:
/// - `result.json`: the full `BacktestResult`
/// - `transactions.csv`
/// - `equity.csv`
///
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(prefix);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("transactions.csv"),
        export_transactions_csv(&result.run.transactions)?,
    )?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.run.equity_curve)?,
    )?;

    log::info!("artifacts written to {}", run_dir.display());
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Write `sweep.csv` and `sweep.json` into `output_dir`.
pub fn save_sweep(sweep: &SweepResults, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let csv_path = output_dir.join("sweep.csv");
    std::fs::write(&csv_path, export_sweep_csv(sweep)?)?;
    std::fs::write(
        output_dir.join("sweep.json"),
        serde_json::to_string_pretty(sweep).context("failed to serialize sweep")?,
    )?;
    Ok(csv_path)
}
