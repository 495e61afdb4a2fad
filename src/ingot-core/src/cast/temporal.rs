use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{
    datatypes::{
        naive_datetime_to_timestamp, parse_timezone, timestamp_to_local,
        timestamp_to_naive_datetime, DataType, TimeUnit,
    },
    lit::Literal,
};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn epoch() -> NaiveDate {
    NaiveDate::default()
}

pub fn date_to_days(date: NaiveDate) -> Result<i32, String> {
    i32::try_from((date - epoch()).num_days())
        .map_err(|_| format!("date {date} is out of range"))
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::TimeDelta::try_days(i64::from(days))?)
}

/// Converts a count of `from` ticks into `to` ticks. Moving to a coarser unit drops sub-unit
/// precision: an error in strict mode, flooring otherwise.
pub fn rescale_time(value: i64, from: TimeUnit, to: TimeUnit, strict: bool) -> Result<i64, String> {
    let from_scale = from.to_scale_factor();
    let to_scale = to.to_scale_factor();
    if to_scale >= from_scale {
        value
            .checked_mul(to_scale / from_scale)
            .ok_or_else(|| format!("value {value}{from} overflows when converted to {to}"))
    } else {
        let divisor = from_scale / to_scale;
        if strict && value.rem_euclid(divisor) != 0 {
            return Err(format!(
                "value {value}{from} is not a whole number of {to}"
            ));
        }
        Ok(value.div_euclid(divisor))
    }
}

pub fn date_to_datetime(days: i32, unit: TimeUnit) -> Result<i64, String> {
    i64::from(days)
        .checked_mul(unit.ticks_per_day())
        .ok_or_else(|| format!("date {days}d is out of range for {unit}"))
}

/// Calendar date of an instant in `tz` (UTC when naive).
pub fn datetime_to_date(value: i64, unit: TimeUnit, tz: Option<&str>) -> Result<i32, String> {
    let naive = match tz {
        None => timestamp_to_naive_datetime(value, unit),
        Some(tz) => {
            let parsed = parse_timezone(tz).map_err(|e| e.to_string())?;
            timestamp_to_local(value, unit, &parsed).map(|dt| dt.naive_local())
        }
    }
    .ok_or_else(|| format!("timestamp {value}{unit} is out of range"))?;
    date_to_days(naive.date())
}

pub fn parse_date(s: &str) -> Result<i32, String> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("\"{s}\" is not a date: {e}"))?;
    date_to_days(date)
}

/// Parses an RFC 3339 timestamp (kept as the instant it names) or a naive wall clock
/// (read as UTC). A bare date means midnight.
///
/// Text without an offset follows the rule for naive datetime values: it is read as UTC even
/// when the target column is zoned. Only values that carry their own zone use local time.
pub fn parse_datetime(s: &str, unit: TimeUnit) -> Result<i64, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return naive_datetime_to_timestamp(dt.naive_utc(), unit).map_err(|e| e.to_string());
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("\"{s}\" is not a datetime"))?;
    naive_datetime_to_timestamp(naive, unit).map_err(|e| e.to_string())
}

/// Temporal to temporal conversions. Datetimes carry UTC instants, so a zone change never
/// touches the stored value.
pub fn cast_temporal(lit: &Literal, target: &DataType, strict: bool) -> Result<Literal, String> {
    match (lit, target) {
        (Literal::Date(days), DataType::Date) => Ok(Literal::Date(*days)),
        (Literal::Date(days), DataType::Datetime(unit, tz)) => Ok(Literal::Datetime(
            date_to_datetime(*days, *unit)?,
            *unit,
            tz.clone(),
        )),
        (Literal::Datetime(value, unit, tz), DataType::Date) => {
            Ok(Literal::Date(datetime_to_date(*value, *unit, tz.as_deref())?))
        }
        (Literal::Datetime(value, unit, _), DataType::Datetime(to_unit, to_tz)) => Ok(
            Literal::Datetime(rescale_time(*value, *unit, *to_unit, strict)?, *to_unit, to_tz.clone()),
        ),
        (Literal::Duration(value, unit), DataType::Duration(to_unit)) => Ok(Literal::Duration(
            rescale_time(*value, *unit, *to_unit, strict)?,
            *to_unit,
        )),
        (lit, target) => Err(format!("cannot convert {lit} to `{target}`")),
    }
}
