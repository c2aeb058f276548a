//! Tick-by-tick event loop: the heart of the backtesting engine.
//!
//! Per tick, in this order:
//! 1. Risk: every bar completed at this tick is checked against its ticker's
//!    stop, then its close becomes the ticker's mark
//! 2. Decision (session open only): the orchestrator sizes and fills market
//!    orders against an equity snapshot and re-anchors stops
//! 3. Equity (close ticks only): the ledger records cash + marked positions

use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime};

use super::error::EngineError;
use super::state::{EngineConfig, RunResult};
use crate::data::{DataProvider, MarketDataWindow};
use crate::domain::Portfolio;
use crate::model::ModelBindings;
use crate::risk::StopLossManager;
use crate::schedule::{Frequency, Scheduler, SimTimer, Tick};
use crate::sizers::{FullEquitySizer, PositionSizer};
use crate::strategy::{DecisionContext, StrategyOrchestrator};

/// One backtest run. Consumed by [`Backtest::run`].
pub struct Backtest {
    config: EngineConfig,
    provider: Arc<dyn DataProvider>,
    bindings: ModelBindings,
    sizer: Box<dyn PositionSizer>,
    timer: SimTimer,
}

impl Backtest {
    pub fn new(config: EngineConfig, provider: Arc<dyn DataProvider>, bindings: ModelBindings) -> Self {
        Self {
            config,
            provider,
            bindings,
            sizer: Box::new(FullEquitySizer::default()),
            timer: SimTimer::new(),
        }
    }

    pub fn with_sizer(mut self, sizer: Box<dyn PositionSizer>) -> Self {
        self.sizer = sizer;
        self
    }

    /// Share a clock with models that need the simulated time.
    pub fn with_timer(mut self, timer: SimTimer) -> Self {
        self.timer = timer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(self) -> Result<RunResult, EngineError> {
        let Backtest {
            config,
            provider,
            bindings,
            sizer,
            timer,
        } = self;

        config.validate()?;
        bindings.validate()?;

        let frequency = config.schedule.frequency;
        let tickers = bindings.tickers();
        let scheduler = Scheduler::new(config.schedule.clone())?;

        log::info!(
            "backtest {} .. {} ({}, {} tickers, {} models, sizer {}, stops {})",
            config.schedule.start,
            config.schedule.end,
            frequency,
            tickers.len(),
            bindings.len(),
            sizer.name(),
            if config.use_stop_losses { "on" } else { "off" }
        );

        let mut window = MarketDataWindow::new(provider, tickers.clone(), frequency);
        window.warm_up(config.schedule.start, config.lookback_days)?;

        let mut ledger = Portfolio::new(config.initial_cash);
        let mut stops = StopLossManager::new();
        let mut orchestrator =
            StrategyOrchestrator::new(bindings, sizer, config.rebalance, config.use_stop_losses);
        let mut tick_count = 0usize;

        for tick in scheduler {
            timer.set(tick.timestamp);
            window.advance(&tick)?;
            tick_count += 1;
            log::trace!("tick {} {:?}", tick.timestamp, tick.kind);

            // Phase 1: stops and marks from completed bars
            if let Some(bar_start) = tick.completed_bar(frequency) {
                for ticker in &tickers {
                    let bar = match window.bar(ticker, bar_start) {
                        Some(bar) => bar.clone(),
                        // sparse intraday data: nothing traded in this bar
                        None if frequency.is_intraday() => continue,
                        None => {
                            return Err(EngineError::DataUnavailable {
                                ticker: ticker.clone(),
                                timestamp: bar_start,
                            })
                        }
                    };
                    let position = ledger.quantity(ticker);
                    if let Some(tx) = stops.check_bar(&bar, position, tick.timestamp)? {
                        ledger.apply(tx)?;
                        orchestrator.mark_stopped(ticker);
                    }
                    window.update_mark(ticker, bar.close);
                }
            }

            // Phase 2: decisions at the session open. Open ticks complete no
            // bar, so phase 1 never closed anything on this tick.
            if tick.is_decision() {
                let open_bar = open_bar_stamp(&tick, frequency);
                for ticker in &tickers {
                    if window.bar(ticker, open_bar).is_none() {
                        return Err(EngineError::DataUnavailable {
                            ticker: ticker.clone(),
                            timestamp: open_bar,
                        });
                    }
                }
                let equity = ledger.equity(window.marks())?;
                let ctx = DecisionContext {
                    timestamp: tick.timestamp,
                    open_bar,
                    equity,
                    ledger: &ledger,
                    window: &window,
                };
                let transactions = orchestrator.on_decision(&ctx, &mut stops)?;
                for tx in transactions {
                    ledger.apply(tx)?;
                }
            }

            // Phase 3: end-of-day equity
            if tick.records_equity() {
                ledger.record_equity(tick.timestamp, window.marks())?;
            }
        }

        let result = RunResult {
            transactions: ledger.transactions().to_vec(),
            equity_curve: ledger.equity_series().to_vec(),
            initial_cash: ledger.initial_cash(),
            final_cash: ledger.cash(),
            final_positions: ledger.positions().cloned().collect(),
            tick_count,
        };
        log::info!(
            "backtest done: {} ticks, {} transactions, final equity {:.2}",
            result.tick_count,
            result.transactions.len(),
            result.final_equity()
        );
        Ok(result)
    }
}

/// Stamp of the bar whose open is the session's opening price.
fn open_bar_stamp(tick: &Tick, frequency: Frequency) -> NaiveDateTime {
    if frequency.is_intraday() {
        tick.timestamp
    } else {
        tick.session_date.and_time(NaiveTime::MIN)
    }
}
