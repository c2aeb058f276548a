//! Strategy orchestration: binds models to tickers and turns their decisions
//! into sized market orders and protective stops.

pub mod orchestrator;

pub use orchestrator::{DecisionContext, RebalancePolicy, StrategyOrchestrator};
