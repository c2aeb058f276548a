//! Simulated clock: frequencies, market hours, session calendar, tick stream.
//!
//! A run is driven by a [`Scheduler`]: a deterministic, strictly increasing
//! sequence of [`Tick`]s between a start and end instant. Nothing here sleeps;
//! the engine pulls ticks as fast as it can process them.

pub mod calendar;
pub mod frequency;
pub mod scheduler;
pub mod timer;

pub use calendar::{MarketHours, TradingCalendar};
pub use frequency::Frequency;
pub use scheduler::{ScheduleConfig, ScheduleError, Scheduler, Tick, TickKind};
pub use timer::SimTimer;
