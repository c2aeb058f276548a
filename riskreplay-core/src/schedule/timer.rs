use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};

const UNSET: i64 = i64::MIN;

/// Shared handle on the current simulated time.
///
/// The engine sets it before processing each tick. Models that need "now"
/// (e.g. to query history strictly before the current instant) hold a clone.
#[derive(Debug, Clone)]
pub struct SimTimer {
    micros: Arc<AtomicI64>,
}

impl SimTimer {
    pub fn new() -> Self {
        Self {
            micros: Arc::new(AtomicI64::new(UNSET)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.micros
            .store(now.and_utc().timestamp_micros(), Ordering::SeqCst);
    }

    /// Current simulated time, or `None` before the first tick.
    pub fn now(&self) -> Option<NaiveDateTime> {
        match self.micros.load(Ordering::SeqCst) {
            UNSET => None,
            micros => DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc()),
        }
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn clones_share_time() {
        let timer = SimTimer::new();
        let handle = timer.clone();
        assert!(handle.now().is_none());

        let t = NaiveDate::from_ymd_opt(2015, 1, 2)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        timer.set(t);
        assert_eq!(handle.now(), Some(t));
    }
}
