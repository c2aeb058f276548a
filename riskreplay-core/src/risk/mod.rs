//! Risk management: protective stop-loss exits.

pub mod stop_loss;

pub use stop_loss::StopLossManager;
