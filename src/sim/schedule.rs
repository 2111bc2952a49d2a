//! Hourly schedule walked by the workload scheduler.
//!
//! The scheduler state is `(current simulated time, day index, hour index
//! within the day)`. [`Schedule::buckets`] yields one [`HourBucket`] per step
//! and halts after the configured number of days.

use super::config::ActiveWindow;
use chrono::{NaiveDateTime, TimeDelta, Timelike};

/// Rate class of a simulated hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HourClass {
    Active,
    Inactive,
}

/// One simulated hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourBucket {
    pub start: NaiveDateTime,
    pub day_index: u32,
    pub hour_index: u32,
    pub class: HourClass,
}

/// Schedule over `days` simulated days
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    start: NaiveDateTime,
    days: u32,
    window: ActiveWindow,
}

impl Schedule {
    pub fn new(start: NaiveDateTime, days: u32, window: ActiveWindow) -> Self {
        Self {
            start,
            days,
            window,
        }
    }

    /// Steps processed per simulated day
    pub fn hours_per_day(&self) -> u32 {
        match self.window {
            ActiveWindow::Counted {
                active_hours,
                inactive_hours,
                ..
            } => active_hours.saturating_add(inactive_hours),
            ActiveWindow::WallClock {
                start_hour,
                end_hour,
                skip_inactive: true,
            } => band_len(start_hour, end_hour),
            ActiveWindow::WallClock { .. } => 24,
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn total_buckets(&self) -> u64 {
        self.days as u64 * self.hours_per_day() as u64
    }

    pub fn buckets(&self) -> ScheduleIter {
        let mut current = self.start;
        if let ActiveWindow::WallClock {
            start_hour,
            end_hour,
            skip_inactive: true,
        } = self.window
        {
            current = align_to_band(current, start_hour, end_hour);
        }
        ScheduleIter {
            window: self.window,
            hours_per_day: self.hours_per_day(),
            days: self.days,
            current,
            day_index: 0,
            hour_index: 0,
        }
    }
}

/// Iterator over the scheduler's state transitions
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    window: ActiveWindow,
    hours_per_day: u32,
    days: u32,
    current: NaiveDateTime,
    day_index: u32,
    hour_index: u32,
}

impl Iterator for ScheduleIter {
    type Item = HourBucket;

    fn next(&mut self) -> Option<HourBucket> {
        if self.hours_per_day == 0 || self.day_index >= self.days {
            return None;
        }

        let bucket = HourBucket {
            start: self.current,
            day_index: self.day_index,
            hour_index: self.hour_index,
            class: classify(self.window, self.hour_index, self.current),
        };

        self.current += TimeDelta::hours(1);
        if let ActiveWindow::WallClock {
            start_hour,
            end_hour,
            skip_inactive: true,
        } = self.window
        {
            self.current = align_to_band(self.current, start_hour, end_hour);
        }

        self.hour_index += 1;
        if self.hour_index == self.hours_per_day {
            self.hour_index = 0;
            self.day_index += 1;
        }

        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.days.saturating_sub(self.day_index) as usize
            * self.hours_per_day as usize)
            .saturating_sub(self.hour_index as usize);
        (remaining, Some(remaining))
    }
}

fn classify(window: ActiveWindow, hour_index: u32, at: NaiveDateTime) -> HourClass {
    let active = match window {
        ActiveWindow::Counted {
            active_hours,
            inactive_hours,
            inactive_first,
        } => {
            if inactive_first {
                hour_index >= inactive_hours
            } else {
                hour_index < active_hours
            }
        }
        ActiveWindow::WallClock {
            start_hour,
            end_hour,
            ..
        } => in_band(at.hour(), start_hour, end_hour),
    };
    if active {
        HourClass::Active
    } else {
        HourClass::Inactive
    }
}

/// Whether `hour` falls in `[start, end)`, wrapping past midnight
pub fn in_band(hour: u32, start: u32, end: u32) -> bool {
    if start == end {
        true
    } else if start < end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

fn band_len(start: u32, end: u32) -> u32 {
    if start == end {
        24
    } else {
        (end + 24 - start) % 24
    }
}

/// Jump forward to the next band start when `at` lies outside the band
fn align_to_band(at: NaiveDateTime, start: u32, end: u32) -> NaiveDateTime {
    let hour = at.hour();
    if in_band(hour, start, end) {
        return at;
    }
    let gap = (start + 24 - hour) % 24;
    at + TimeDelta::hours(gap as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_band_wraps() {
        assert!(in_band(23, 22, 6));
        assert!(in_band(3, 22, 6));
        assert!(!in_band(6, 22, 6));
        assert!(in_band(12, 5, 5));
        assert_eq!(band_len(22, 6), 8);
        assert_eq!(band_len(6, 22), 16);
        assert_eq!(band_len(9, 9), 24);
    }

    #[test]
    fn test_align_to_band() {
        let t = midnight() + TimeDelta::hours(23);
        let aligned = align_to_band(t, 6, 22);
        assert_eq!(aligned, midnight() + TimeDelta::hours(30));
        assert_eq!(align_to_band(midnight() + TimeDelta::hours(7), 6, 22).hour(), 7);
    }

    #[test]
    fn test_size_hint_matches_count() {
        let schedule = Schedule::new(midnight(), 3, ActiveWindow::default());
        let iter = schedule.buckets();
        assert_eq!(iter.size_hint().0, 72);
        assert_eq!(iter.count(), 72);
    }

    #[test]
    fn test_hours_per_day_saturates() {
        let window = ActiveWindow::Counted {
            active_hours: u32::MAX,
            inactive_hours: 1,
            inactive_first: false,
        };
        assert_eq!(Schedule::new(midnight(), 1, window).hours_per_day(), u32::MAX);
    }
}
