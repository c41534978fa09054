//! Calendar dates as the NASA endpoints speak them (`YYYY-MM-DD`), plus the
//! sol arithmetic used to grey out rover calendar days.
//!
//! Dates are kept as naive calendar days. The shell owns the user's timezone
//! and only ever hands the core a calendar date, so nothing here depends on
//! the machine clock except [`CalendarDate::today_local`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sol-to-Earth-day drift corrections applied by [`sol_to_earth_date`].
pub const SOL_DRIFT_SHORT_PERIOD: u32 = 37;
pub const SOL_DRIFT_LONG_PERIOD: u32 = 1493;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid calendar date '{input}', expected YYYY-MM-DD")]
    Invalid { input: String },

    #[error("{date} has no midnight at offset {offset}")]
    Unrepresentable { date: String, offset: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn parse(input: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| DateError::Invalid {
                input: input.to_string(),
            })
    }

    /// Reads the calendar day out of a `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn from_timestamp_prefix(timestamp: &str) -> Result<Self, DateError> {
        let prefix = timestamp.get(..10).ok_or_else(|| DateError::Invalid {
            input: timestamp.to_string(),
        })?;
        Self::parse(prefix)
    }

    /// First day APOD has a picture for.
    #[must_use]
    pub fn apod_epoch() -> Self {
        Self(NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or_default())
    }

    #[must_use]
    pub fn today_local() -> Self {
        Self::from_datetime(&Local::now())
    }

    #[must_use]
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self(datetime.date_naive())
    }

    /// Local midnight of this day at `offset`.
    pub fn start_of_day(self, offset: FixedOffset) -> Result<DateTime<FixedOffset>, DateError> {
        let unrepresentable = || DateError::Unrepresentable {
            date: self.to_string(),
            offset: offset.to_string(),
        };
        let midnight = self.0.and_hms_opt(0, 0, 0).ok_or_else(unrepresentable)?;
        offset
            .from_local_datetime(&midnight)
            .single()
            .ok_or_else(unrepresentable)
    }

    /// Saturates at the representable range instead of wrapping.
    #[must_use]
    pub fn add_days(self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map_or(self, Self)
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Formats the calendar day of `datetime` in its own offset.
pub fn apod_date_to_string<Tz>(datetime: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    datetime.format(DATE_FORMAT).to_string()
}

/// Parses `YYYY-MM-DD` into local midnight at `offset`.
pub fn apod_string_to_date(
    input: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, DateError> {
    CalendarDate::parse(input)?.start_of_day(offset)
}

/// Sols in `[0, last]` that have no manifest entry. `sols` is the manifest in
/// mission order, so its last element is the latest sol.
#[must_use]
pub fn missing_sols(sols: &[u32]) -> Vec<u32> {
    let Some(&last) = sols.last() else {
        return Vec::new();
    };
    let present: HashSet<u32> = sols.iter().copied().collect();
    (0..=last).filter(|sol| !present.contains(sol)).collect()
}

#[must_use]
pub fn sol_to_earth_date(first_earth_date: CalendarDate, sol: u32) -> CalendarDate {
    let sol = i64::from(sol);
    let offset = sol
        + sol / i64::from(SOL_DRIFT_SHORT_PERIOD)
        + sol / i64::from(SOL_DRIFT_LONG_PERIOD);
    first_earth_date.add_days(offset)
}

#[must_use]
pub fn rover_disabled_dates(sols: &[u32], first_earth_date: CalendarDate) -> BTreeSet<CalendarDate> {
    missing_sols(sols)
        .into_iter()
        .map(|sol| sol_to_earth_date(first_earth_date, sol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_parse_and_display() {
            let d = date("2020-12-08");
            assert_eq!((d.year(), d.month(), d.day()), (2020, 12, 8));
            assert_eq!(d.to_string(), "2020-12-08");
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(CalendarDate::parse("").is_err());
            assert!(CalendarDate::parse("2020-13-01").is_err());
            assert!(CalendarDate::parse("yesterday").is_err());
        }

        #[test]
        fn test_timestamp_prefix() {
            let d = CalendarDate::from_timestamp_prefix("2020-12-06 00:13:03").unwrap();
            assert_eq!(d, date("2020-12-06"));
            assert!(CalendarDate::from_timestamp_prefix("2020").is_err());
        }

        #[test]
        fn test_serde_uses_plain_string() {
            let json = serde_json::to_string(&date("1995-06-16")).unwrap();
            assert_eq!(json, "\"1995-06-16\"");
            let back: CalendarDate = serde_json::from_str(&json).unwrap();
            assert_eq!(back, CalendarDate::apod_epoch());
            assert!(serde_json::from_str::<CalendarDate>("\"06/16/1995\"").is_err());
        }

        #[test]
        fn test_add_days_crosses_months_and_back() {
            let d = date("2020-12-27");
            assert_eq!(d.add_days(5), date("2021-01-01"));
            assert_eq!(d.add_days(-27), date("2020-11-30"));
        }
    }

    mod sol_tests {
        use super::*;

        #[test]
        fn test_missing_sols_between_present_entries() {
            assert_eq!(missing_sols(&[0, 2, 5]), vec![1, 3, 4]);
            assert!(missing_sols(&[]).is_empty());
            assert!(missing_sols(&[0, 1, 2]).is_empty());
        }

        #[test]
        fn test_disabled_dates_from_manifest() {
            let disabled = rover_disabled_dates(&[0, 2, 5], date("2020-12-27"));
            let expected: BTreeSet<_> = ["2020-12-28", "2020-12-30", "2020-12-31"]
                .into_iter()
                .map(date)
                .collect();
            assert_eq!(disabled, expected);
        }

        #[test]
        fn test_drift_corrections_apply_per_sol() {
            let first = date("2012-08-06");
            assert_eq!(sol_to_earth_date(first, 36), first.add_days(36));
            assert_eq!(sol_to_earth_date(first, 37), first.add_days(38));
            assert_eq!(sol_to_earth_date(first, 74), first.add_days(76));
            assert_eq!(sol_to_earth_date(first, 1493), first.add_days(1493 + 40 + 1));
        }

        #[test]
        fn test_largest_sol_does_not_overflow() {
            let first = date("2012-08-06");
            assert!(sol_to_earth_date(first, u32::MAX) >= first);
            assert_eq!(sol_to_earth_date(first, 100_000), first.add_days(100_000 + 2702 + 66));
        }
    }

    proptest! {
        #[test]
        fn round_trip_holds_at_every_offset(
            days in 0i64..12_000,
            offset_secs in (-12 * 3600i32)..=(14 * 3600),
            seconds_into_day in 0i64..86_400,
        ) {
            let offset = FixedOffset::east_opt(offset_secs).unwrap();
            let day = CalendarDate::apod_epoch().add_days(days);
            let instant = day.start_of_day(offset).unwrap()
                + chrono::Duration::seconds(seconds_into_day);

            let parsed = apod_string_to_date(&apod_date_to_string(&instant), offset).unwrap();
            prop_assert_eq!(parsed.date_naive(), instant.date_naive());
            prop_assert_eq!(CalendarDate::from_datetime(&parsed), day);
        }

        #[test]
        fn disabled_dates_never_hit_present_sols(
            mut sols in proptest::collection::vec(0u32..3000, 1..60),
        ) {
            sols.sort_unstable();
            sols.dedup();
            let first = CalendarDate::apod_epoch();
            let disabled = rover_disabled_dates(&sols, first);
            prop_assert_eq!(disabled.len(), missing_sols(&sols).len());
            for sol in &sols {
                prop_assert!(!disabled.contains(&sol_to_earth_date(first, *sol)));
            }
        }
    }
}
