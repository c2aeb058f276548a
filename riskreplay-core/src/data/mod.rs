//! Market data: provider trait, concrete providers, and the per-tick window.

pub mod csv_source;
pub mod preset;
pub mod provider;
pub mod synthetic;
pub mod window;

pub use csv_source::{parse_timestamp, CsvDataProvider};
pub use preset::PresetDataProvider;
pub use provider::{DataError, DataProvider, PriceArray};
pub use synthetic::{random_walk, SyntheticConfig};
pub use window::MarketDataWindow;
