//! Domain types for RiskReplay

pub mod bar;
pub mod exposure;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod transaction;

pub use bar::{BarError, PriceBar, PriceField};
pub use exposure::Exposure;
pub use order::{Order, OrderKind, StopOrder};
pub use portfolio::{EquityPoint, LedgerError, Marks, Portfolio};
pub use position::Position;
pub use transaction::{Transaction, TransactionOrigin};

/// Ticker symbol alias
pub type Ticker = String;
