use std::{fmt::Display, str::FromStr};

use arrow2::datatypes::TimeUnit as ArrowTimeUnit;
use chrono::{LocalResult, TimeZone};
use common_error::{IngotError, IngotResult};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nanoseconds => write!(f, "ns"),
            Self::Microseconds => write!(f, "us"),
            Self::Milliseconds => write!(f, "ms"),
        }
    }
}

impl TimeUnit {
    #![allow(clippy::wrong_self_convention)]
    #[must_use]
    pub fn to_arrow(&self) -> ArrowTimeUnit {
        match self {
            Self::Nanoseconds => ArrowTimeUnit::Nanosecond,
            Self::Microseconds => ArrowTimeUnit::Microsecond,
            Self::Milliseconds => ArrowTimeUnit::Millisecond,
        }
    }

    /// Number of ticks of this unit per second.
    #[must_use]
    pub fn to_scale_factor(&self) -> i64 {
        match self {
            Self::Milliseconds => 1_000,
            Self::Microseconds => 1_000_000,
            Self::Nanoseconds => NANOS_PER_SECOND,
        }
    }

    /// The finer of two units; widening a temporal type moves towards the finer unit.
    #[must_use]
    pub fn finest(self, other: Self) -> Self {
        // Variants are declared finest first.
        self.min(other)
    }

    #[must_use]
    pub fn ticks_per_day(&self) -> i64 {
        self.to_scale_factor() * 86_400
    }
}

impl FromStr for TimeUnit {
    type Err = IngotError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ns" | "nanoseconds" => Ok(Self::Nanoseconds),
            "us" | "μs" | "microseconds" => Ok(Self::Microseconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            _ => Err(IngotError::ValueError(format!("Invalid time unit: {s}"))),
        }
    }
}

/// Converts a timestamp in `time_unit` into [`chrono::NaiveDateTime`] (UTC wall clock).
#[inline]
pub fn timestamp_to_naive_datetime(
    timestamp: i64,
    time_unit: TimeUnit,
) -> Option<chrono::NaiveDateTime> {
    let scale = time_unit.to_scale_factor();
    let secs = timestamp.div_euclid(scale);
    let subsec_nanos = timestamp.rem_euclid(scale) * (NANOS_PER_SECOND / scale);
    chrono::DateTime::from_timestamp(secs, subsec_nanos as u32).map(|dt| dt.naive_utc())
}

/// Converts a [`chrono::DateTime`] into a timestamp in `time_unit`, truncating sub-unit precision.
#[inline]
pub fn datetime_to_timestamp<T: chrono::TimeZone>(
    datetime: &chrono::DateTime<T>,
    time_unit: TimeUnit,
) -> IngotResult<i64> {
    let scale = time_unit.to_scale_factor();
    let ticks = i128::from(datetime.timestamp()) * i128::from(scale)
        + i128::from(datetime.timestamp_subsec_nanos()) / i128::from(NANOS_PER_SECOND / scale);
    i64::try_from(ticks).map_err(|_| {
        IngotError::ValueError(format!(
            "datetime {} is out of bounds for time unit {time_unit}",
            datetime.naive_utc()
        ))
    })
}

/// Converts a naive datetime (interpreted as UTC) into a timestamp in `time_unit`.
#[inline]
pub fn naive_datetime_to_timestamp(
    naive: chrono::NaiveDateTime,
    time_unit: TimeUnit,
) -> IngotResult<i64> {
    datetime_to_timestamp(&naive.and_utc(), time_unit)
}

/// Parses an offset of the form `"+WX:YZ"` or `"UTC"` into [`chrono::FixedOffset`].
pub fn parse_offset(offset: &str) -> IngotResult<chrono::FixedOffset> {
    let error = || {
        IngotError::ValueError(format!(
            "timezone offset must be of the form [-]00:00, got {offset}"
        ))
    };
    if offset == "UTC" {
        return chrono::FixedOffset::east_opt(0).ok_or_else(error);
    }

    let (first, last) = offset.split_once(':').ok_or_else(error)?;
    let hours: i32 = first.parse().map_err(|_| error())?;
    let minutes: i32 = last.parse().map_err(|_| error())?;
    let sign = if first.starts_with('-') { -1 } else { 1 };

    chrono::FixedOffset::east_opt(hours * 60 * 60 + sign * minutes * 60).ok_or_else(error)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimezone {
    Fixed(chrono::FixedOffset),
    Tz(chrono_tz::Tz),
}

impl Display for ParsedTimezone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Tz(tz) => write!(f, "{tz}"),
        }
    }
}

impl ParsedTimezone {
    /// Converts a UTC [`chrono::NaiveDateTime`] to a [`chrono::DateTime`] in this timezone.
    #[inline]
    pub fn from_utc_datetime(
        &self,
        naive: &chrono::NaiveDateTime,
    ) -> chrono::DateTime<chrono::FixedOffset> {
        match self {
            Self::Fixed(offset) => offset.from_utc_datetime(naive).fixed_offset(),
            Self::Tz(tz) => tz.from_utc_datetime(naive).fixed_offset(),
        }
    }

    /// Converts a local [`chrono::NaiveDateTime`] to a [`chrono::DateTime`] in this timezone.
    ///
    /// Returns `LocalResult` to handle ambiguous or nonexistent local times (e.g., during DST transitions).
    #[inline]
    pub fn from_local_datetime(
        &self,
        naive: &chrono::NaiveDateTime,
    ) -> LocalResult<chrono::DateTime<chrono::FixedOffset>> {
        match self {
            Self::Fixed(offset) => offset
                .from_local_datetime(naive)
                .map(|dt| dt.fixed_offset()),
            Self::Tz(tz) => tz.from_local_datetime(naive).map(|dt| dt.fixed_offset()),
        }
    }
}

/// Parses either a fixed offset or tz database name into [`ParsedTimezone`].
pub fn parse_timezone(tz: &str) -> IngotResult<ParsedTimezone> {
    if let Ok(offset) = parse_offset(tz) {
        Ok(ParsedTimezone::Fixed(offset))
    } else if let Ok(tz) = tz.parse::<chrono_tz::Tz>() {
        Ok(ParsedTimezone::Tz(tz))
    } else {
        Err(IngotError::ValueError(format!(
            "Unable to parse timezone string {tz}"
        )))
    }
}

/// Resolves a naive local datetime in `tz` into a timestamp in `timeunit`.
pub fn naive_local_to_timestamp(
    naive: chrono::NaiveDateTime,
    timeunit: TimeUnit,
    tz: &ParsedTimezone,
    tz_name: &str,
) -> IngotResult<i64> {
    let datetime = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, _) => {
            return Err(IngotError::ValueError(format!(
                "Ambiguous local datetime {naive} in timezone {tz_name}"
            )));
        }
        LocalResult::None => {
            return Err(IngotError::ValueError(format!(
                "Nonexistent local datetime {naive} in timezone {tz_name}"
            )));
        }
    };
    datetime_to_timestamp(&datetime, timeunit)
}

/// Converts a timestamp to the local [`chrono::DateTime`] in `tz`.
pub fn timestamp_to_local(
    timestamp: i64,
    timeunit: TimeUnit,
    tz: &ParsedTimezone,
) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    timestamp_to_naive_datetime(timestamp, timeunit).map(|naive| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TimeUnit::Milliseconds, 1_000)]
    #[case(TimeUnit::Microseconds, 1_000_000)]
    #[case(TimeUnit::Nanoseconds, 1_000_000_000)]
    fn scale_factors(#[case] unit: TimeUnit, #[case] expected: i64) {
        assert_eq!(unit.to_scale_factor(), expected);
    }

    #[test]
    fn finest_prefers_smaller_ticks() {
        assert_eq!(
            TimeUnit::Milliseconds.finest(TimeUnit::Nanoseconds),
            TimeUnit::Nanoseconds
        );
        assert_eq!(
            TimeUnit::Microseconds.finest(TimeUnit::Milliseconds),
            TimeUnit::Microseconds
        );
    }

    #[test]
    fn negative_timestamps_floor() -> IngotResult<()> {
        let naive = timestamp_to_naive_datetime(-1, TimeUnit::Milliseconds).unwrap();
        let expected = NaiveDate::from_ymd_opt(1969, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap();
        assert_eq!(naive, expected);
        assert_eq!(naive_datetime_to_timestamp(naive, TimeUnit::Milliseconds)?, -1);
        Ok(())
    }

    #[rstest]
    #[case("UTC", 0)]
    #[case("+01:30", 5400)]
    #[case("-05:30", -19800)]
    fn parses_fixed_offsets(#[case] offset: &str, #[case] secs: i32) -> IngotResult<()> {
        assert_eq!(parse_offset(offset)?.local_minus_utc(), secs);
        Ok(())
    }

    #[test]
    fn parses_named_zones() -> IngotResult<()> {
        assert!(matches!(
            parse_timezone("Europe/Amsterdam")?,
            ParsedTimezone::Tz(_)
        ));
        assert!(parse_timezone("Mars/Olympus").is_err());
        Ok(())
    }

    #[test]
    fn reports_nonexistent_local_times() -> IngotResult<()> {
        let tz = parse_timezone("Europe/Amsterdam")?;
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(
            naive_local_to_timestamp(gap, TimeUnit::Microseconds, &tz, "Europe/Amsterdam")
                .is_err()
        );
        Ok(())
    }
}
