//! Execution: converts orders into transactions.
//!
//! Key concepts:
//! - **Market orders** fill at the price the caller supplies (the session open)
//! - **Gap rule**: stops that gap through fill at the open, otherwise at the stop
//! - No slippage, no commission

pub mod builder;
pub mod gap_handler;

pub use builder::TransactionBuilder;
pub use gap_handler::GapHandler;
