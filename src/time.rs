//! Mac timestamp handling
//!
//! macOS artifacts record time against several different epochs and units:
//!
//! | Kind | Epoch | Unit |
//! |------|-------|------|
//! | [`EpochKind::Hfs`] | 1904-01-01 | seconds |
//! | [`EpochKind::MacAbsolute`] | 2001-01-01 | seconds, or nanoseconds when above 32 bits |
//! | [`EpochKind::Apfs`] | 1970-01-01 | nanoseconds |
//! | [`EpochKind::Unix`] | 1970-01-01 | seconds |
//!
//! Every converter accepts a [`RawValue`] and returns a [`Timestamp`], which
//! is either a UTC datetime or [`Timestamp::Unavailable`]. Converters never
//! fail: zero, empty and absent inputs mean "no timestamp" and are returned
//! as unavailable silently, while malformed or out of range inputs are
//! reported through the supplied [`Diagnostics`] first.
//!
//! Results are always UTC. Converting to local time is a separate step, see
//! [`UtcDateTime::to_local`].
//!
//! # Example
//!
//! ```
//! use dockitems::time::{read_mac_absolute_time, read_mac_hfs_time, Timestamp};
//! use dockitems::NullDiagnostics;
//!
//! let hfs = read_mac_hfs_time(3_600_000_000u32, &NullDiagnostics);
//! assert_eq!(hfs.to_string(), "2018-01-28T16:00:00Z");
//!
//! let absolute = read_mac_absolute_time("0", &NullDiagnostics);
//! assert_eq!(absolute.to_string(), "2001-01-01T00:00:00Z");
//!
//! assert_eq!(read_mac_hfs_time(0i64, &NullDiagnostics), Timestamp::Unavailable);
//! ```

use crate::coerce::RawValue;
use crate::diag::Diagnostics;

const TARGET: &str = "dockitems::time";

/// Seconds between 1904-01-01 (HFS+ epoch) and 1970-01-01
pub const HFS_EPOCH_OFFSET: i64 = 2082844800;

/// Seconds between 1970-01-01 and 2001-01-01 (Mac Absolute Time epoch)
pub const MAC_ABSOLUTE_EPOCH_OFFSET: i64 = 978307200;

/// Divisor turning nanosecond counts into seconds
pub const NANOS_PER_SECOND: f64 = 1e9;

/// Mac Absolute Time values above this are nanosecond counts
pub const MAC_ABSOLUTE_NANOS_THRESHOLD: u64 = 0xFFFF_FFFF;

// 0001-01-01T00:00:00Z and 9999-12-31T23:59:59Z
const MIN_UNIX_SECONDS: i64 = -62135596800;
const MAX_UNIX_SECONDS: i64 = 253402300799;

/// Represents the time zone of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZone {
    /// UTC (Coordinated Universal Time)
    Utc,
    /// Local time of the examiner's machine
    Local,
}

/// Marker type for UTC timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Utc;

/// Marker type for Local timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Local;

/// Trait for timezone markers
pub trait TimeZoneMarker {
    fn timezone() -> TimeZone;
}

impl TimeZoneMarker for Utc {
    fn timezone() -> TimeZone {
        TimeZone::Utc
    }
}

impl TimeZoneMarker for Local {
    fn timezone() -> TimeZone {
        TimeZone::Local
    }
}

/// A calendar datetime with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime<TZ = Utc> {
    year: u16,
    month: u8,       // 1-12
    day: u8,         // 1-31
    hour: u8,        // 0-23
    minute: u8,      // 0-59
    second: u8,      // 0-59
    nanosecond: u32, // 0-999,999,999
    _timezone: std::marker::PhantomData<TZ>,
}

/// Type alias for UTC datetimes
pub type UtcDateTime = DateTime<Utc>;

/// Type alias for local datetimes
pub type LocalDateTime = DateTime<Local>;

impl<TZ: TimeZoneMarker> std::fmt::Display for DateTime<TZ> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.nanosecond != 0 {
            if self.nanosecond % 1000 == 0 {
                write!(f, ".{:06}", self.nanosecond / 1000)?;
            } else {
                write!(f, ".{:09}", self.nanosecond)?;
            }
        }
        match TZ::timezone() {
            TimeZone::Utc => write!(f, "Z"),
            TimeZone::Local => Ok(()),
        }
    }
}

impl<TZ: TimeZoneMarker> DateTime<TZ> {
    /// Creates a datetime from date/time components with validation.
    ///
    /// # Errors
    ///
    /// Returns `None` if any component is invalid, the year is outside of
    /// 1-9999, or the date doesn't exist (e.g. February 30th).
    ///
    /// # Examples
    ///
    /// ```
    /// # use dockitems::time::UtcDateTime;
    /// let datetime = UtcDateTime::from_components(2023, 6, 15, 14, 30, 45, 500_000_000).unwrap();
    /// assert_eq!(datetime.year(), 2023);
    /// assert_eq!(datetime.nanosecond(), 500_000_000);
    ///
    /// assert!(UtcDateTime::from_components(2023, 2, 30, 0, 0, 0, 0).is_none());
    /// ```
    pub fn from_components(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanosecond: u32,
    ) -> Option<Self> {
        if year == 0
            || year > 9999
            || month == 0
            || month > 12
            || day == 0
            || hour > 23
            || minute > 59
            || second > 59
            || nanosecond > 999_999_999
        {
            return None;
        }

        if day > last_day_of_month(year, month) {
            return None;
        }

        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
            _timezone: std::marker::PhantomData,
        })
    }

    /// Builds a datetime from seconds relative to 1970-01-01 in this time
    /// zone, or `None` when it falls outside of years 1-9999.
    fn from_epoch_parts(seconds: i64, nanosecond: u32) -> Option<Self> {
        if !(MIN_UNIX_SECONDS..=MAX_UNIX_SECONDS).contains(&seconds) || nanosecond > 999_999_999
        {
            return None;
        }

        let (year, month, day, hour, minute, second) = unix_timestamp_to_components(seconds);
        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
            _timezone: std::marker::PhantomData,
        })
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Returns the hour component (0-23).
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Returns the minute component (0-59).
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Returns the second component (0-59).
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Returns the nanosecond component (0-999,999,999).
    #[must_use]
    pub const fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    #[must_use]
    pub fn timezone(&self) -> TimeZone {
        TZ::timezone()
    }

    /// Calculate days since Unix epoch (1970-01-01) for this date.
    ///
    /// Based on Howard Hinnant's `days_from_civil` algorithm:
    /// <https://howardhinnant.github.io/date_algorithms.html#days_from_civil>
    const fn days_from_civil(&self) -> i32 {
        let (y, m) = if self.month <= 2 {
            (self.year as i32 - 1, self.month as i32 + 9)
        } else {
            (self.year as i32, self.month as i32 - 3)
        };

        let era = y / 400;
        let yoe = y - era * 400; // [0, 399]
        let doy = (153 * m + 2) / 5 + self.day as i32 - 1; // [0, 365]
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]

        era * 146097 + doe - 719468
    }

    /// Seconds since 1970-01-01 of the wall clock reading, ignoring the zone.
    fn epoch_seconds(&self) -> i64 {
        i64::from(self.days_from_civil()) * 86400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }
}

impl DateTime<Utc> {
    /// Creates a datetime from a Unix timestamp (seconds since epoch).
    ///
    /// Returns `None` outside of years 1-9999.
    pub fn from_unix(seconds: i64) -> Option<UtcDateTime> {
        Self::from_epoch_parts(seconds, 0)
    }

    /// Creates a datetime from fractional seconds since the Unix epoch.
    ///
    /// The fraction is rounded half to even at microsecond resolution, which
    /// is the precision forensic tooling has traditionally reported.
    pub fn from_unix_f64(seconds: f64) -> Option<UtcDateTime> {
        if !seconds.is_finite() {
            return None;
        }

        let whole = seconds.trunc();
        if whole < MIN_UNIX_SECONDS as f64 - 1.0 || whole > MAX_UNIX_SECONDS as f64 + 1.0 {
            return None;
        }

        let mut secs = whole as i64;
        let mut micros = ((seconds - whole) * 1e6).round_ties_even() as i64;
        if micros >= 1_000_000 {
            secs += 1;
            micros -= 1_000_000;
        } else if micros < 0 {
            secs -= 1;
            micros += 1_000_000;
        }

        Self::from_epoch_parts(secs, (micros * 1000) as u32)
    }

    /// Convert to Unix timestamp (seconds since epoch).
    ///
    /// Negative values represent dates before 1970.
    #[must_use]
    pub fn to_unix(&self) -> i64 {
        self.epoch_seconds()
    }

    /// Converts to the wall clock time of the given zone.
    ///
    /// ```
    /// # use dockitems::time::UtcDateTime;
    /// let utc = UtcDateTime::from_components(2020, 1, 1, 3, 0, 0, 0).unwrap();
    /// let tz = jiff::tz::TimeZone::fixed(jiff::tz::offset(-5));
    /// assert_eq!(utc.to_local(&tz).unwrap().to_string(), "2019-12-31T22:00:00");
    /// ```
    ///
    /// Returns `None` if shifting by the zone's offset leaves years 1-9999.
    pub fn to_local(&self, tz: &jiff::tz::TimeZone) -> Option<LocalDateTime> {
        let timestamp =
            jiff::Timestamp::new(self.to_unix(), self.nanosecond as i32).ok()?;
        let offset = tz.to_offset(timestamp);
        let local_seconds = self.to_unix() + i64::from(offset.seconds());
        LocalDateTime::from_epoch_parts(local_seconds, self.nanosecond)
    }
}

/// Converts a UTC datetime to the system's local time zone.
pub fn local_time_from_utc(utc: &UtcDateTime) -> Option<LocalDateTime> {
    utc.to_local(&jiff::tz::TimeZone::system())
}

/// A normalized timestamp: either a UTC datetime or the unavailable marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timestamp {
    /// No valid timestamp was present
    Unavailable,
    Utc(UtcDateTime),
}

impl Timestamp {
    /// Returns the datetime, if available
    #[must_use]
    pub fn datetime(&self) -> Option<&UtcDateTime> {
        match self {
            Timestamp::Unavailable => None,
            Timestamp::Utc(dt) => Some(dt),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Timestamp::Utc(_))
    }
}

impl From<Option<UtcDateTime>> for Timestamp {
    fn from(value: Option<UtcDateTime>) -> Self {
        value.map_or(Timestamp::Unavailable, Timestamp::Utc)
    }
}

/// An unavailable timestamp displays as an empty string.
impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Unavailable => Ok(()),
            Timestamp::Utc(dt) => dt.fmt(f),
        }
    }
}

/// The reference date and unit a raw timestamp is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpochKind {
    /// Seconds since 1904-01-01
    Hfs,
    /// Seconds (or nanoseconds above 32 bits) since 2001-01-01
    MacAbsolute,
    /// Nanoseconds since 1970-01-01
    Apfs,
    /// Seconds since 1970-01-01
    Unix,
}

impl EpochKind {
    pub const ALL: [EpochKind; 4] = [
        EpochKind::Hfs,
        EpochKind::MacAbsolute,
        EpochKind::Apfs,
        EpochKind::Unix,
    ];

    /// Seconds since the Unix epoch for a value counted in this kind
    #[must_use]
    pub fn unix_seconds(self, value: f64) -> f64 {
        match self {
            EpochKind::Hfs => value - HFS_EPOCH_OFFSET as f64,
            EpochKind::MacAbsolute => {
                if value > MAC_ABSOLUTE_NANOS_THRESHOLD as f64 {
                    value / NANOS_PER_SECOND + MAC_ABSOLUTE_EPOCH_OFFSET as f64
                } else {
                    value + MAC_ABSOLUTE_EPOCH_OFFSET as f64
                }
            }
            EpochKind::Apfs => value / NANOS_PER_SECOND,
            EpochKind::Unix => value,
        }
    }

    fn reader_name(self) -> &'static str {
        match self {
            EpochKind::Hfs => "read_mac_hfs_time",
            EpochKind::MacAbsolute => "read_mac_absolute_time",
            EpochKind::Apfs => "read_apfs_time",
            EpochKind::Unix => "read_unix_time",
        }
    }
}

impl std::fmt::Display for EpochKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EpochKind::Hfs => "hfs",
            EpochKind::MacAbsolute => "mac-absolute",
            EpochKind::Apfs => "apfs",
            EpochKind::Unix => "unix",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for EpochKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hfs" | "hfs+" => Ok(EpochKind::Hfs),
            "mac-absolute" | "absolute" | "cocoa" => Ok(EpochKind::MacAbsolute),
            "apfs" => Ok(EpochKind::Apfs),
            "unix" => Ok(EpochKind::Unix),
            _ => Err(format!("unknown epoch kind: {}", s)),
        }
    }
}

/// Converts a raw timestamp of the given kind.
pub fn convert<'a>(
    kind: EpochKind,
    raw: impl Into<RawValue<'a>>,
    diag: &dyn Diagnostics,
) -> Timestamp {
    let raw = raw.into();
    if raw.is_sentinel() {
        return Timestamp::Unavailable;
    }

    let value = match raw.to_float_or_fail() {
        Ok(value) => value,
        Err(err) => {
            diag.error(
                TARGET,
                format_args!(
                    "{}() failed to convert timestamp from value {}: {}",
                    kind.reader_name(),
                    raw,
                    err
                ),
            );
            return Timestamp::Unavailable;
        }
    };

    match UtcDateTime::from_unix_f64(kind.unix_seconds(value)) {
        Some(dt) => Timestamp::Utc(dt),
        None => {
            diag.error(
                TARGET,
                format_args!(
                    "{}() failed to convert timestamp from value {}: out of range",
                    kind.reader_name(),
                    raw
                ),
            );
            Timestamp::Unavailable
        }
    }
}

/// Converts an HFS+ timestamp (seconds since 1904-01-01).
pub fn read_mac_hfs_time<'a>(raw: impl Into<RawValue<'a>>, diag: &dyn Diagnostics) -> Timestamp {
    convert(EpochKind::Hfs, raw, diag)
}

/// Converts an HFS+ timestamp after dropping everything above its low 32
/// bits.
///
/// High Sierra has been seen writing Dock `parent-mod-date` values with
/// garbage in the upper bits. Whether the low half is then the true
/// timestamp is not certain, so only that field goes through here.
///
/// ```
/// use dockitems::time::{read_mac_hfs_time, read_mac_hfs_time_masked};
/// use dockitems::NullDiagnostics;
///
/// let masked = read_mac_hfs_time_masked("4294967297", &NullDiagnostics);
/// assert_eq!(masked, read_mac_hfs_time(1i64, &NullDiagnostics));
/// assert_eq!(masked.to_string(), "1904-01-01T00:00:01Z");
/// ```
pub fn read_mac_hfs_time_masked<'a>(
    raw: impl Into<RawValue<'a>>,
    diag: &dyn Diagnostics,
) -> Timestamp {
    let raw = raw.into();
    if raw.is_sentinel() {
        return Timestamp::Unavailable;
    }

    match raw.mask_low_32_bits() {
        Ok(masked) if masked.is_sentinel() => {
            diag.debug(
                TARGET,
                format_args!(
                    "read_mac_hfs_time_masked() value {} has no low 32 bits set",
                    raw
                ),
            );
            Timestamp::Unavailable
        }
        Ok(masked) => convert(EpochKind::Hfs, masked, diag),
        Err(err) => {
            diag.error(
                TARGET,
                format_args!(
                    "read_mac_hfs_time_masked() failed to convert timestamp from value {}: {}",
                    raw, err
                ),
            );
            Timestamp::Unavailable
        }
    }
}

/// Converts a Mac Absolute Time timestamp (seconds since 2001-01-01).
///
/// High Sierra started writing nanosecond resolution values into fields
/// that previously held seconds, without any flag. Values that do not fit
/// in 32 bits are therefore treated as nanoseconds.
pub fn read_mac_absolute_time<'a>(
    raw: impl Into<RawValue<'a>>,
    diag: &dyn Diagnostics,
) -> Timestamp {
    convert(EpochKind::MacAbsolute, raw, diag)
}

/// Converts an APFS timestamp (nanoseconds since 1970-01-01).
pub fn read_apfs_time<'a>(raw: impl Into<RawValue<'a>>, diag: &dyn Diagnostics) -> Timestamp {
    convert(EpochKind::Apfs, raw, diag)
}

/// Converts a Unix timestamp (seconds since 1970-01-01).
pub fn read_unix_time<'a>(raw: impl Into<RawValue<'a>>, diag: &dyn Diagnostics) -> Timestamp {
    convert(EpochKind::Unix, raw, diag)
}

/// Convert Unix timestamp to broken down date/time components
///
/// Based on Howard Hinnant's date library algorithm `civil_from_days`:
///
/// <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn unix_timestamp_to_components(timestamp: i64) -> (u16, u8, u8, u8, u8, u8) {
    const SECONDS_PER_DAY: i64 = 86400;

    let total_days = timestamp.div_euclid(SECONDS_PER_DAY);
    let seconds_in_day = timestamp.rem_euclid(SECONDS_PER_DAY);

    let hour = (seconds_in_day / 3600) as u8;
    let minute = ((seconds_in_day % 3600) / 60) as u8;
    let second = (seconds_in_day % 60) as u8;

    // Shift epoch from 1970-01-01 to 0000-03-01 so leap days end the year
    let days_since_shifted_epoch = total_days + 719468;

    let era = days_since_shifted_epoch.div_euclid(146097);
    let days_of_era = days_since_shifted_epoch.rem_euclid(146097);

    let year_of_era =
        (days_of_era - days_of_era / 1460 + days_of_era / 36524 - days_of_era / 146096) / 365;
    let year = era * 400 + year_of_era;

    let days_before_year = year_of_era * 365 + year_of_era / 4 - year_of_era / 100;
    let day_of_year = days_of_era - days_before_year;

    // Months are shifted: Mar=0, Apr=1, ..., Dec=9, Jan=10, Feb=11
    let month_shifted = (5 * day_of_year + 2) / 153;
    let day_of_month = day_of_year - (153 * month_shifted + 2) / 5 + 1;

    let (final_year, final_month) = if month_shifted < 10 {
        (year, month_shifted + 3)
    } else {
        (year + 1, month_shifted - 9)
    };

    (
        final_year as u16,
        final_month as u8,
        day_of_month as u8,
        hour,
        minute,
        second,
    )
}

const fn is_leap(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns the last valid day of the given month in the given year.
const fn last_day_of_month(year: u16, month: u8) -> u8 {
    if month != 2 || !is_leap(year) {
        last_day_of_month_common_year(month as usize)
    } else {
        29
    }
}

const fn last_day_of_month_common_year(m: usize) -> u8 {
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31][m - 1]
}
