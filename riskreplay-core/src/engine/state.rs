//! Engine configuration and run result types.

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use crate::domain::{EquityPoint, Position, Transaction};
use crate::fingerprint::Fingerprint;
use crate::schedule::ScheduleConfig;
use crate::strategy::RebalancePolicy;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub schedule: ScheduleConfig,
    pub initial_cash: f64,
    #[serde(default = "default_use_stop_losses")]
    pub use_stop_losses: bool,
    #[serde(default)]
    pub rebalance: RebalancePolicy,
    /// Calendar days before `start` scanned for the initial marks.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

fn default_use_stop_losses() -> bool {
    true
}

fn default_lookback_days() -> u32 {
    10
}

impl EngineConfig {
    pub fn new(schedule: ScheduleConfig, initial_cash: f64) -> Self {
        Self {
            schedule,
            initial_cash,
            use_stop_losses: default_use_stop_losses(),
            rebalance: RebalancePolicy::default(),
            lookback_days: default_lookback_days(),
        }
    }

    pub fn with_stop_losses(mut self, enabled: bool) -> Self {
        self.use_stop_losses = enabled;
        self
    }

    pub fn with_rebalance(mut self, policy: RebalancePolicy) -> Self {
        self.rebalance = policy;
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(EngineError::Config(format!(
                "initial cash must be positive and finite, got {}",
                self.initial_cash
            )));
        }
        if self.lookback_days == 0 {
            return Err(EngineError::Config("lookback_days must be >= 1".into()));
        }
        self.schedule.validate()?;
        Ok(())
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// All transactions in application order.
    pub transactions: Vec<Transaction>,
    /// One point per `Close` tick (one per calendar day).
    pub equity_curve: Vec<EquityPoint>,
    pub initial_cash: f64,
    pub final_cash: f64,
    /// Open positions at the end of the run.
    pub final_positions: Vec<Position>,
    /// Total ticks processed.
    pub tick_count: usize,
}

impl RunResult {
    /// Last recorded equity, or the initial cash if nothing was recorded.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_cash, |p| p.equity)
    }

    pub fn total_return(&self) -> f64 {
        self.final_equity() / self.initial_cash - 1.0
    }

    /// Largest peak-to-trough decline of the equity curve, as a positive fraction.
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = self.initial_cash;
        let mut worst = 0.0_f64;
        for point in &self.equity_curve {
            peak = peak.max(point.equity);
            if peak > 0.0 {
                worst = worst.max(1.0 - point.equity / peak);
            }
        }
        worst
    }

    /// BLAKE3 over the canonical JSON of the transaction log and equity curve.
    pub fn fingerprint(&self) -> Result<Fingerprint, EngineError> {
        Ok(Fingerprint::of(&(&self.transactions, &self.equity_curve))?)
    }
}
