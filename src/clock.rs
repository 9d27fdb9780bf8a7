//! Wall-clock text for the panel.
//!
//! The wall clock is set once by SNTP at startup and is not re-synchronized
//! by this crate. Before a successful sync it holds whatever the system
//! booted with, and formatting proceeds against that.

use chrono::{DateTime, FixedOffset, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Anything earlier than 2001-09-09 means the clock was never set.
const PLAUSIBLE_AFTER_SECS: u64 = 1_000_000_000;

pub trait WallClock {
    fn now(&self) -> SystemTime;
}

/// The process clock that SNTP adjusts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `14:55:02`
    Time,
    /// `14:55`
    HourMinute,
    Hour,
    Minute,
    Second,
    /// `Fri 23 Aug`
    WeekdayDate,
    /// `23.08.24`
    NumericDate,
    /// `23 Aug`
    DayMonth,
    /// `Fri Aug 23 14:55:02 2024`
    Full,
}

impl TimeFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            TimeFormat::Time => "%T",
            TimeFormat::HourMinute => "%R",
            TimeFormat::Hour => "%H",
            TimeFormat::Minute => "%M",
            TimeFormat::Second => "%S",
            TimeFormat::WeekdayDate => "%a %d %b",
            TimeFormat::NumericDate => "%d.%m.%y",
            TimeFormat::DayMonth => "%d %b",
            TimeFormat::Full => "%c",
        }
    }
}

pub struct ClockSource {
    offset: FixedOffset,
    source: Box<dyn WallClock>,
}

impl ClockSource {
    pub fn new(offset: FixedOffset) -> Self {
        Self::with_source(offset, SystemClock)
    }

    pub fn with_source<W: WallClock + 'static>(offset: FixedOffset, source: W) -> Self {
        Self {
            offset,
            source: Box::new(source),
        }
    }

    pub fn format(&self, at: SystemTime, fmt: TimeFormat) -> String {
        DateTime::<Utc>::from(at)
            .with_timezone(&self.offset)
            .format(fmt.pattern())
            .to_string()
    }

    pub fn now_text(&self, fmt: TimeFormat) -> String {
        self.format(self.source.now(), fmt)
    }

    pub fn looks_synchronized(&self) -> bool {
        is_plausible(self.source.now())
    }
}

pub fn is_plausible(at: SystemTime) -> bool {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() >= PLAUSIBLE_AFTER_SECS)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // Fri 23 Aug 2024 11:55:02 UTC
    const AT: u64 = 1_724_414_102;

    fn moscow() -> ClockSource {
        ClockSource::new(FixedOffset::east_opt(3 * 3600).unwrap())
    }

    fn at() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(AT)
    }

    #[test]
    fn every_pattern_renders_local_time() {
        let clock = moscow();
        let cases = [
            (TimeFormat::Time, "14:55:02"),
            (TimeFormat::HourMinute, "14:55"),
            (TimeFormat::Hour, "14"),
            (TimeFormat::Minute, "55"),
            (TimeFormat::Second, "02"),
            (TimeFormat::WeekdayDate, "Fri 23 Aug"),
            (TimeFormat::NumericDate, "23.08.24"),
            (TimeFormat::DayMonth, "23 Aug"),
            (TimeFormat::Full, "Fri Aug 23 14:55:02 2024"),
        ];
        for (fmt, expected) in cases {
            assert_eq!(clock.format(at(), fmt), expected, "{fmt:?}");
        }
    }

    #[test]
    fn unsynchronized_clock_still_formats() {
        let clock = moscow();
        let boot = UNIX_EPOCH + Duration::from_secs(8);
        assert_eq!(clock.format(boot, TimeFormat::Time), "03:00:08");
        assert!(!is_plausible(boot));
        assert!(is_plausible(at()));
    }

    #[test]
    fn injected_source_is_used() {
        struct Fixed;
        impl WallClock for Fixed {
            fn now(&self) -> SystemTime {
                UNIX_EPOCH + Duration::from_secs(AT)
            }
        }
        let clock = ClockSource::with_source(FixedOffset::east_opt(0).unwrap(), Fixed);
        assert_eq!(clock.now_text(TimeFormat::Time), "11:55:02");
        assert!(clock.looks_synchronized());
    }
}
