//! Tick generation.
//!
//! Every calendar day between `start` and `end` contributes ticks:
//!
//! - session day, daily framing: `Open` at `day + open`, `Close` at `day + close`
//! - session day, minute framing: `Open`, then `Intrabar` every `time_delta`
//!   strictly between open and close, then `Close`
//! - non-session day: a single `Close` (session = false) used to record equity
//!
//! Ticks outside `[start, end]` are dropped.

use std::collections::VecDeque;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calendar::{MarketHours, TradingCalendar};
use super::frequency::Frequency;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("schedule start {start} is after end {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("market open {open} must be before market close {close}")]
    InvalidMarketHours { open: String, close: String },

    #[error("session length is not a whole number of {frequency} bars")]
    MisalignedSession { frequency: Frequency },
}

/// Everything needed to generate a run's tick stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub market_hours: MarketHours,
    #[serde(default)]
    pub calendar: TradingCalendar,
}

impl ScheduleConfig {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, frequency: Frequency) -> Self {
        Self {
            start,
            end,
            frequency,
            market_hours: MarketHours::default(),
            calendar: TradingCalendar::default(),
        }
    }

    pub fn with_market_hours(mut self, market_hours: MarketHours) -> Self {
        self.market_hours = market_hours;
        self
    }

    pub fn with_calendar(mut self, calendar: TradingCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.start > self.end {
            return Err(ScheduleError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if !self.market_hours.is_valid() {
            return Err(ScheduleError::InvalidMarketHours {
                open: self.market_hours.open.to_string(),
                close: self.market_hours.close.to_string(),
            });
        }
        if self.frequency.is_intraday() {
            let session = self.market_hours.close - self.market_hours.open;
            let step = self.frequency.time_delta().num_seconds();
            if session.num_seconds() % step != 0 {
                return Err(ScheduleError::MisalignedSession {
                    frequency: self.frequency,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    /// Session open: decisions are made and market orders fill at the open.
    Open,
    /// Minute framing only: completes the bar that started one step earlier.
    Intrabar,
    /// Session close (or the single end-of-day tick of a non-session day).
    Close,
}

/// One instant the engine processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub kind: TickKind,
    pub session_date: NaiveDate,
    /// False on weekends (under the weekday calendar).
    pub session: bool,
}

impl Tick {
    /// Start timestamp of the bar this tick completes, if any.
    ///
    /// Minute framing: the bar stamped one `time_delta` before the tick.
    /// Daily framing: the session's daily bar, stamped at midnight.
    pub fn completed_bar(&self, frequency: Frequency) -> Option<NaiveDateTime> {
        if !self.session || self.kind == TickKind::Open {
            return None;
        }
        if frequency.is_intraday() {
            Some(self.timestamp - frequency.time_delta())
        } else {
            match self.kind {
                TickKind::Close => Some(self.session_date.and_time(chrono::NaiveTime::MIN)),
                _ => None,
            }
        }
    }

    pub fn is_decision(&self) -> bool {
        self.session && self.kind == TickKind::Open
    }

    pub fn records_equity(&self) -> bool {
        self.kind == TickKind::Close
    }
}

/// Iterator over the ticks of one run.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: ScheduleConfig,
    next_day: Option<NaiveDate>,
    pending: VecDeque<Tick>,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        let next_day = Some(config.start.date());
        Ok(Self {
            config,
            next_day,
            pending: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    fn day_ticks(&self, day: NaiveDate) -> Vec<Tick> {
        let hours = self.config.market_hours;
        let tick = |timestamp, kind, session| Tick {
            timestamp,
            kind,
            session_date: day,
            session,
        };

        if !self.config.calendar.is_session(day) {
            return vec![tick(day.and_time(hours.close), TickKind::Close, false)];
        }

        let open = day.and_time(hours.open);
        let close = day.and_time(hours.close);
        let mut ticks = vec![tick(open, TickKind::Open, true)];
        if self.config.frequency.is_intraday() {
            let step = self.config.frequency.time_delta();
            let mut t = open + step;
            while t < close {
                ticks.push(tick(t, TickKind::Intrabar, true));
                t += step;
            }
        }
        ticks.push(tick(close, TickKind::Close, true));
        ticks
    }
}

impl Iterator for Scheduler {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        loop {
            if let Some(tick) = self.pending.pop_front() {
                if tick.timestamp < self.config.start {
                    continue;
                }
                if tick.timestamp > self.config.end {
                    self.pending.clear();
                    self.next_day = None;
                    return None;
                }
                return Some(tick);
            }

            let day = self.next_day?;
            if day > self.config.end.date() {
                self.next_day = None;
                return None;
            }
            let ticks = self.day_ticks(day);
            self.pending.extend(ticks);
            self.next_day = day.succ_opt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn eod(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
    }

    #[test]
    fn daily_week_has_open_and_close_per_session() {
        // Thu 2015-01-01 .. Mon 2015-01-05
        let config = ScheduleConfig::new(dt(2015, 1, 1, 0, 0), eod(2015, 1, 5), Frequency::Daily);
        let ticks: Vec<Tick> = Scheduler::new(config).unwrap().collect();

        let kinds: Vec<(TickKind, bool)> = ticks.iter().map(|t| (t.kind, t.session)).collect();
        assert_eq!(
            kinds,
            vec![
                (TickKind::Open, true),
                (TickKind::Close, true),
                (TickKind::Open, true),
                (TickKind::Close, true),
                (TickKind::Close, false),
                (TickKind::Close, false),
                (TickKind::Open, true),
                (TickKind::Close, true),
            ]
        );
        assert_eq!(ticks[0].timestamp, dt(2015, 1, 1, 13, 30));
        assert_eq!(ticks[4].timestamp, dt(2015, 1, 3, 20, 0));
    }

    #[test]
    fn one_equity_tick_per_calendar_day() {
        let config = ScheduleConfig::new(dt(2015, 1, 1, 0, 0), eod(2015, 2, 28), Frequency::Daily);
        let closes = Scheduler::new(config)
            .unwrap()
            .filter(|t| t.records_equity())
            .count();
        assert_eq!(closes, 59);
    }

    #[test]
    fn minute_session_tick_count() {
        let config = ScheduleConfig::new(dt(2015, 1, 2, 0, 0), eod(2015, 1, 2), Frequency::Min1);
        let ticks: Vec<Tick> = Scheduler::new(config).unwrap().collect();
        // 390 minutes: one open, 389 intrabar, one close
        assert_eq!(ticks.len(), 391);
        assert_eq!(ticks[1].kind, TickKind::Intrabar);
        assert_eq!(ticks[1].timestamp, dt(2015, 1, 2, 13, 31));
        assert_eq!(ticks[390].kind, TickKind::Close);
    }

    #[test]
    fn ticks_are_strictly_increasing() {
        let config = ScheduleConfig::new(dt(2015, 1, 1, 0, 0), eod(2015, 1, 20), Frequency::Min15);
        let ticks: Vec<Tick> = Scheduler::new(config).unwrap().collect();
        assert!(ticks.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn ticks_outside_range_are_dropped() {
        let config = ScheduleConfig::new(
            dt(2015, 1, 2, 14, 0),
            dt(2015, 1, 5, 15, 0),
            Frequency::Daily,
        );
        let ticks: Vec<Tick> = Scheduler::new(config).unwrap().collect();
        // Fri close, Sat, Sun, Mon open
        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0].kind, TickKind::Close);
        assert_eq!(ticks[3].kind, TickKind::Open);
    }

    #[test]
    fn completed_bars() {
        let config = ScheduleConfig::new(dt(2015, 1, 2, 0, 0), eod(2015, 1, 2), Frequency::Min1);
        let ticks: Vec<Tick> = Scheduler::new(config).unwrap().collect();
        assert_eq!(ticks[0].completed_bar(Frequency::Min1), None);
        assert_eq!(
            ticks[1].completed_bar(Frequency::Min1),
            Some(dt(2015, 1, 2, 13, 30))
        );
        assert_eq!(
            ticks[390].completed_bar(Frequency::Min1),
            Some(dt(2015, 1, 2, 19, 59))
        );

        let close = Tick {
            timestamp: dt(2015, 1, 2, 20, 0),
            kind: TickKind::Close,
            session_date: NaiveDate::from_ymd_opt(2015, 1, 2).unwrap(),
            session: true,
        };
        assert_eq!(close.completed_bar(Frequency::Daily), Some(dt(2015, 1, 2, 0, 0)));
    }

    #[test]
    fn decision_ticks_never_complete_a_bar() {
        for frequency in [Frequency::Daily, Frequency::Min1, Frequency::Min5, Frequency::Min30] {
            let config = ScheduleConfig::new(dt(2015, 1, 1, 0, 0), eod(2015, 1, 12), frequency);
            let decisions: Vec<Tick> = Scheduler::new(config)
                .unwrap()
                .filter(|t| t.is_decision())
                .collect();
            assert_eq!(decisions.len(), 8, "{frequency}");
            assert!(decisions.iter().all(|t| t.completed_bar(frequency).is_none()));
        }
    }

    #[test]
    fn start_after_end_is_rejected() {
        let config = ScheduleConfig::new(dt(2015, 2, 1, 0, 0), dt(2015, 1, 1, 0, 0), Frequency::Daily);
        assert!(matches!(
            Scheduler::new(config),
            Err(ScheduleError::InvalidRange { .. })
        ));
    }

    #[test]
    fn misaligned_session_is_rejected() {
        let hours = MarketHours::new(
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 10, 0).unwrap(),
        );
        let config = ScheduleConfig::new(dt(2015, 1, 1, 0, 0), eod(2015, 1, 2), Frequency::Min60)
            .with_market_hours(hours);
        assert!(matches!(
            config.validate(),
            Err(ScheduleError::MisalignedSession { .. })
        ));
    }
}
