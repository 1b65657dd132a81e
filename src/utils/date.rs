//! UTC datetime utilities without timezone dependencies.
//!
//! Only what commit messages need: the current UTC time, rendered as
//! `YYYY-MM-DD HH:MM:SS`.

use std::time::{SystemTime, UNIX_EPOCH};

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    /// Current time, or the epoch if the clock is before 1970.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_unix(secs)
    }

    /// Convert seconds since the Unix epoch.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn from_unix(secs: u64) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: ((rem / 60) % 60) as u8,
            second: (rem % 60) as u8,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn to_timestamp(self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian calendar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        let dt = DateTimeUtc::from_unix(0);
        assert_eq!(dt.to_timestamp(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_known_instant() {
        // 2024-06-15T14:30:45Z
        let dt = DateTimeUtc::from_unix(1_718_461_845);
        assert_eq!(dt.to_timestamp(), "2024-06-15 14:30:45");
    }

    #[test]
    fn test_leap_day() {
        // 2024-02-29T00:00:00Z
        let dt = DateTimeUtc::from_unix(1_709_164_800);
        assert_eq!((dt.year, dt.month, dt.day), (2024, 2, 29));
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(DateTimeUtc::now().year >= 2020);
    }
}
