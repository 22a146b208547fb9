//! Timestamp handling for zip entries and selection predicates.
//!
//! This module provides the [`Timestamp`] type, a UTC instant stored as a
//! Windows FILETIME value (100-nanosecond intervals since January 1, 1601).
//! FILETIME is the unit the zip NTFS extra field stores, and it is the
//! single reference frame every timestamp in this crate is normalized to:
//! filesystem times arrive as [`SystemTime`] (UTC by definition) and DOS
//! local-header times are interpreted as UTC on conversion, so selection
//! predicates always compare like-for-like.
//!
//! # Precision
//!
//! - FILETIME: 100-nanosecond resolution.
//! - MS-DOS date/time (zip local headers): two-second resolution, years
//!   1980-2107 only. Conversion through [`Timestamp::to_dos_date_time`]
//!   truncates accordingly.
//!
//! # Example
//!
//! ```rust
//! use zipline::Timestamp;
//!
//! let ts = Timestamp::from_unix_secs(1_700_000_000).unwrap();
//! assert_eq!(ts.to_string(), "2023-11-14-22:13:20");
//!
//! let (date, time) = ts.to_dos_date_time().unwrap();
//! let back = Timestamp::from_dos_date_time(date, time).unwrap();
//! assert_eq!(back.as_unix_secs(), 1_700_000_000);
//! ```

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Windows FILETIME epoch: January 1, 1601 (UTC).
/// Difference from Unix epoch (January 1, 1970) in 100-nanosecond intervals.
const FILETIME_UNIX_DIFF: u64 = 116444736000000000;

/// Number of 100-nanosecond intervals per second.
const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// Fixed sortable rendering used by selection-predicate diagnostics.
const SORTABLE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]-[hour]:[minute]:[second]");

/// A UTC timestamp backed by a Windows FILETIME value.
///
/// Ordering and equality compare the underlying 100-nanosecond tick count,
/// which is what selection predicates rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Raw FILETIME value (100-nanosecond intervals since 1601-01-01).
    filetime: u64,
}

impl Timestamp {
    /// Creates a timestamp from a raw Windows FILETIME value.
    #[inline]
    pub const fn from_filetime(filetime: u64) -> Self {
        Self { filetime }
    }

    /// Creates a timestamp from Unix seconds (since January 1, 1970).
    ///
    /// Returns `None` if the instant is not representable as a FILETIME
    /// (before 1601 or after the u64 tick range).
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        if secs < 0 {
            let neg_intervals = secs.unsigned_abs().checked_mul(INTERVALS_PER_SECOND)?;
            FILETIME_UNIX_DIFF
                .checked_sub(neg_intervals)
                .map(Self::from_filetime)
        } else {
            let intervals = (secs as u64).checked_mul(INTERVALS_PER_SECOND)?;
            FILETIME_UNIX_DIFF
                .checked_add(intervals)
                .map(Self::from_filetime)
        }
    }

    /// Creates a timestamp from Unix seconds and a sub-second nanosecond part.
    ///
    /// Only 100-nanosecond precision is preserved; nanoseconds are truncated
    /// to the nearest 100ns tick.
    pub fn from_unix_secs_nanos(secs: i64, nanos: u32) -> Option<Self> {
        let base = Self::from_unix_secs(secs)?;
        base.filetime
            .checked_add(nanos as u64 / 100)
            .map(Self::from_filetime)
    }

    /// Creates a timestamp from a [`SystemTime`].
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(duration) => {
                Self::from_unix_secs_nanos(duration.as_secs() as i64, duration.subsec_nanos())
            }
            Err(e) => {
                // Before the Unix epoch: the whole duration, sub-second part
                // included, counts backwards from the epoch tick.
                let duration = e.duration();
                let ticks = duration
                    .as_secs()
                    .checked_mul(INTERVALS_PER_SECOND)?
                    .checked_add(u64::from(duration.subsec_nanos()) / 100)?;
                FILETIME_UNIX_DIFF.checked_sub(ticks).map(Self::from_filetime)
            }
        }
    }

    /// Returns the current time.
    pub fn now() -> Self {
        // SystemTime::now() is always within the FILETIME range.
        Self::from_system_time(SystemTime::now()).unwrap_or_default()
    }

    /// Returns the raw Windows FILETIME value.
    #[inline]
    pub const fn as_filetime(&self) -> u64 {
        self.filetime
    }

    /// Returns the timestamp as Unix seconds, truncating sub-second ticks.
    ///
    /// Returns negative values for instants before the Unix epoch.
    pub fn as_unix_secs(&self) -> i64 {
        if self.filetime >= FILETIME_UNIX_DIFF {
            let intervals = self.filetime - FILETIME_UNIX_DIFF;
            (intervals / INTERVALS_PER_SECOND) as i64
        } else {
            let intervals = FILETIME_UNIX_DIFF - self.filetime;
            let secs = intervals / INTERVALS_PER_SECOND;
            let extra = u64::from(intervals % INTERVALS_PER_SECOND > 0);
            -((secs + extra) as i64)
        }
    }

    /// Converts to a [`SystemTime`], preserving 100-nanosecond precision.
    pub fn as_system_time(&self) -> SystemTime {
        if self.filetime >= FILETIME_UNIX_DIFF {
            let intervals = self.filetime - FILETIME_UNIX_DIFF;
            let secs = intervals / INTERVALS_PER_SECOND;
            let nanos = ((intervals % INTERVALS_PER_SECOND) * 100) as u32;
            UNIX_EPOCH + Duration::new(secs, nanos)
        } else {
            let intervals = FILETIME_UNIX_DIFF - self.filetime;
            let secs = intervals / INTERVALS_PER_SECOND;
            let nanos = ((intervals % INTERVALS_PER_SECOND) * 100) as u32;
            UNIX_EPOCH - Duration::new(secs, nanos)
        }
    }

    /// Creates a timestamp from a packed MS-DOS date and time pair as stored
    /// in zip local headers.
    ///
    /// Layout per the PKWARE APPNOTE: `date` packs day (bits 0-4), month
    /// (bits 5-8) and year-since-1980 (bits 9-15); `time` packs seconds/2
    /// (bits 0-4), minutes (bits 5-10) and hours (bits 11-15). The value is
    /// interpreted as UTC.
    ///
    /// Returns `None` if the packed fields do not form a valid calendar
    /// date or time of day.
    pub fn from_dos_date_time(date: u16, time: u16) -> Option<Self> {
        let day = (date & 0x1F) as u8;
        let month = ((date >> 5) & 0x0F) as u8;
        let year = 1980 + i32::from(date >> 9);

        let seconds = ((time & 0x1F) * 2) as u8;
        let minutes = ((time >> 5) & 0x3F) as u8;
        let hours = (time >> 11) as u8;

        let month = Month::try_from(month).ok()?;
        let date = Date::from_calendar_date(year, month, day).ok()?;
        let time = Time::from_hms(hours, minutes, seconds).ok()?;
        let unix = PrimitiveDateTime::new(date, time)
            .assume_utc()
            .unix_timestamp();
        Self::from_unix_secs(unix)
    }

    /// Converts to a packed MS-DOS `(date, time)` pair, truncating to the
    /// two-second resolution of the format.
    ///
    /// Returns `None` for instants outside the DOS-representable range
    /// (years 1980 through 2107).
    pub fn to_dos_date_time(&self) -> Option<(u16, u16)> {
        let dt = OffsetDateTime::from_unix_timestamp(self.as_unix_secs()).ok()?;
        let year = dt.year();
        if !(1980..=2107).contains(&year) {
            return None;
        }

        let date = ((year - 1980) as u16) << 9
            | u16::from(u8::from(dt.month())) << 5
            | u16::from(dt.day());
        let time = u16::from(dt.hour()) << 11
            | u16::from(dt.minute()) << 5
            | u16::from(dt.second()) / 2;
        Some((date, time))
    }

    /// Renders the timestamp in the fixed sortable `yyyy-MM-dd-HH:mm:ss`
    /// (UTC) format used by selection-predicate diagnostics.
    ///
    /// Instants outside the printable calendar range fall back to a raw
    /// Unix-seconds rendering.
    pub fn format_sortable(&self) -> String {
        OffsetDateTime::from_unix_timestamp(self.as_unix_secs())
            .ok()
            .and_then(|dt| dt.format(SORTABLE_FORMAT).ok())
            .unwrap_or_else(|| format!("@{}", self.as_unix_secs()))
    }
}

impl Default for Timestamp {
    /// Returns the Unix epoch (January 1, 1970).
    fn default() -> Self {
        Self::from_filetime(FILETIME_UNIX_DIFF)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_sortable())
    }
}

impl From<u64> for Timestamp {
    fn from(filetime: u64) -> Self {
        Self::from_filetime(filetime)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> u64 {
        ts.filetime
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> SystemTime {
        ts.as_system_time()
    }
}
