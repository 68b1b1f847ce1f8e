//! UTC wall-clock breakdown for trail timestamps and file bucketing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Calendar breakdown of a UTC instant, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcStamp {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millis: u32,
}

impl UtcStamp {
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Instants before the epoch clamp to the epoch.
    #[must_use]
    pub fn from_system_time(t: SystemTime) -> Self {
        let since = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self::from_unix(since.as_secs(), since.subsec_millis())
    }

    #[must_use]
    pub fn from_unix(secs: u64, millis: u32) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u32,
            minute: ((rem % 3600) / 60) as u32,
            second: (rem % 60) as u32,
            millis: millis.min(999),
        }
    }

    /// `2026-10-16T08:15:02.123Z`
    #[must_use]
    pub fn iso8601(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millis
        )
    }

    /// First and last hour of the four-hour block containing this instant.
    #[must_use]
    pub fn four_hour_bucket(&self) -> (u32, u32) {
        let start = (self.hour / 4) * 4;
        (start, start + 3)
    }
}

/// Days since 1970-01-01 to proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_first_of_january_1970() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
    }

    #[test]
    fn leap_day_and_new_year() {
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(19_722), (2023, 12, 31));
    }

    #[test]
    fn formats_iso8601_with_millis() {
        // 2024-01-01T13:05:09Z
        let stamp = UtcStamp::from_unix(19_723 * 86_400 + 13 * 3600 + 5 * 60 + 9, 42);
        assert_eq!(stamp.iso8601(), "2024-01-01T13:05:09.042Z");
    }

    #[test]
    fn buckets_cover_four_hours() {
        let stamp = UtcStamp::from_unix(0, 0);
        assert_eq!(stamp.four_hour_bucket(), (0, 3));
        let late = UtcStamp::from_unix(23 * 3600 + 59 * 60, 0);
        assert_eq!(late.four_hour_bucket(), (20, 23));
        let mid = UtcStamp::from_unix(11 * 3600, 0);
        assert_eq!(mid.four_hour_bucket(), (8, 11));
    }
}
