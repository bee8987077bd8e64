//! Conversion between file system times and zip timestamps.
//!
//! Zip entries store modification times in MS-DOS format:
//! - Years 1980 through 2107
//! - Two-second resolution
//! - No time zone (this crate reads and writes them as UTC)
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, UNIX_EPOCH};
//! use zipsession::timestamp::{from_zip_datetime, to_zip_datetime};
//!
//! // 2000-01-01 01:01:02 UTC
//! let time = UNIX_EPOCH + Duration::from_secs(946_684_800 + 3_662);
//! let dos = to_zip_datetime(time);
//! assert_eq!((dos.year(), dos.hour(), dos.minute(), dos.second()), (2000, 1, 1, 2));
//! assert_eq!(from_zip_datetime(dos), Some(time));
//! ```

use std::time::SystemTime;

use chrono::{Datelike, NaiveDateTime, Utc};
use zip::DateTime;

/// First year representable in MS-DOS format.
const DOS_MIN_YEAR: i32 = 1980;

/// Last year representable in MS-DOS format.
const DOS_MAX_YEAR: i32 = 2107;

/// Converts a `SystemTime` to a zip timestamp.
///
/// Times before 1980 map to the earliest DOS time (1980-01-01 00:00:00).
/// Times after 2107 map to the latest one. Odd seconds are rounded down by
/// the format.
pub fn to_zip_datetime(time: SystemTime) -> DateTime {
    let naive = chrono::DateTime::<Utc>::from(time).naive_utc();

    if naive.year() < DOS_MIN_YEAR {
        return DateTime::default();
    }
    if naive.year() > DOS_MAX_YEAR {
        return DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default();
    }

    DateTime::try_from(naive).unwrap_or_default()
}

/// Converts a zip timestamp to a `SystemTime`.
///
/// Returns `None` for malformed timestamps (month or day out of range).
pub fn from_zip_datetime(datetime: DateTime) -> Option<SystemTime> {
    NaiveDateTime::try_from(datetime)
        .ok()
        .map(|naive| naive.and_utc().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    /// 2000-01-01 00:00:00 UTC.
    const Y2K: u64 = 946_684_800;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_leap_day() {
        // 2024-02-29 00:00:00 UTC
        let dos = to_zip_datetime(at(1_709_164_800));
        assert_eq!((dos.year(), dos.month(), dos.day()), (2024, 2, 29));
        assert_eq!((dos.hour(), dos.minute(), dos.second()), (0, 0, 0));
    }

    #[test]
    fn test_time_of_day() {
        let dos = to_zip_datetime(at(Y2K + 13 * 3600 + 45 * 60 + 30));
        assert_eq!((dos.hour(), dos.minute(), dos.second()), (13, 45, 30));
    }

    #[test]
    fn test_odd_seconds_round_down() {
        let dos = to_zip_datetime(at(Y2K + 7));
        assert_eq!(dos.second(), 6);
        assert_eq!(from_zip_datetime(dos), Some(at(Y2K + 6)));
    }

    #[test]
    fn test_roundtrip_even_second() {
        let time = at(1_709_164_800 + 12 * 3600 + 2);
        assert_eq!(from_zip_datetime(to_zip_datetime(time)), Some(time));
    }

    #[test]
    fn test_before_dos_epoch_clamps() {
        let dos = to_zip_datetime(UNIX_EPOCH);
        assert_eq!((dos.year(), dos.month(), dos.day()), (1980, 1, 1));

        let dos = to_zip_datetime(UNIX_EPOCH - Duration::from_secs(10));
        assert_eq!(dos.year(), 1980);
    }

    #[test]
    fn test_after_dos_range_clamps() {
        // Roughly year 2200
        let dos = to_zip_datetime(at(7_258_118_400));
        assert_eq!((dos.year(), dos.month(), dos.day()), (2107, 12, 31));
    }

    #[test]
    fn test_from_zip_datetime_default() {
        // 1980-01-01 00:00:00 UTC
        assert_eq!(from_zip_datetime(DateTime::default()), Some(at(315_532_800)));
    }

    #[test]
    fn test_from_zip_datetime_rejects_impossible_date() {
        // February 30th passes the DOS field ranges but is not a real date
        let Ok(dos) = DateTime::from_date_and_time(2023, 2, 30, 0, 0, 0) else {
            return;
        };
        assert_eq!(from_zip_datetime(dos), None);
    }

    #[test]
    fn test_subsecond_precision_dropped() {
        let time = at(Y2K + 4) + Duration::from_millis(750);
        assert_eq!(from_zip_datetime(to_zip_datetime(time)), Some(at(Y2K + 4)));
    }
}
