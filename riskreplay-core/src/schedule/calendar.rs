//! Market hours and the session calendar.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Offsets from midnight at which a session opens and closes.
///
/// Each run carries its own value; there is no process-wide trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl MarketHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    pub fn is_valid(&self) -> bool {
        self.open < self.close
    }
}

impl Default for MarketHours {
    /// 13:30 / 20:00, the US equity session expressed in UTC.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(13, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Which calendar days are trading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingCalendar {
    /// Monday through Friday, no holiday list.
    #[default]
    Weekdays,
    EveryDay,
}

impl TradingCalendar {
    pub fn is_session(&self, date: NaiveDate) -> bool {
        match self {
            TradingCalendar::Weekdays => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            TradingCalendar::EveryDay => true,
        }
    }
}
