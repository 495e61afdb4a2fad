use chrono::{NaiveDateTime, TimeDelta, Timelike};
use common_error::{IngotError, IngotResult};
use indexmap::IndexMap;

use crate::{
    cast::{
        cast_literal,
        decimal::{fits_precision, num_digits},
        temporal::date_to_days,
    },
    datatypes::{
        lossy_supertype, naive_datetime_to_timestamp, naive_local_to_timestamp, parse_timezone,
        strict_supertype, DataType, Field, TimeUnit, DECIMAL_MAX_PRECISION,
    },
    lit::Literal,
    raw::RawValue,
};

/// A raw element turned into a literal, together with the dtype inferred for it.
///
/// For nested values the literal may still hold heterogeneous children; `dtype` is what they
/// unify to and is the type they are converted to when the column is materialized.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub value: Literal,
    pub dtype: DataType,
}

impl Normalized {
    fn scalar(value: Literal) -> Self {
        let dtype = value.get_type();
        Self { value, dtype }
    }
}

/// Supertype used while folding inferred dtypes: strict unification or the lossy fallback.
pub fn supertype(l: &DataType, r: &DataType, strict: bool) -> IngotResult<DataType> {
    if strict {
        strict_supertype(l, r)
    } else {
        lossy_supertype(l, r)
    }
}

fn unit_for_subsec_nanos(nanos: u32) -> TimeUnit {
    if nanos % 1_000 == 0 {
        TimeUnit::Microseconds
    } else {
        TimeUnit::Nanoseconds
    }
}

fn normalize_datetime(value: &NaiveDateTime, tz: Option<&str>) -> IngotResult<Literal> {
    let unit = unit_for_subsec_nanos(value.nanosecond());
    let timestamp = match tz {
        None => naive_datetime_to_timestamp(*value, unit)?,
        Some(tz) => {
            let parsed = parse_timezone(tz)?;
            naive_local_to_timestamp(*value, unit, &parsed, tz)?
        }
    };
    Ok(Literal::Datetime(timestamp, unit, tz.map(str::to_string)))
}

fn normalize_duration(delta: &TimeDelta) -> IngotResult<Literal> {
    let overflow = || IngotError::ValueError(format!("duration {delta} is out of range"));
    let unit = unit_for_subsec_nanos(delta.subsec_nanos().unsigned_abs());
    let value = match unit {
        TimeUnit::Nanoseconds => delta.num_nanoseconds().ok_or_else(overflow)?,
        _ => delta.num_microseconds().ok_or_else(overflow)?,
    };
    Ok(Literal::Duration(value, unit))
}

fn normalize_int(value: i128) -> IngotResult<Literal> {
    if let Ok(v) = i64::try_from(value) {
        Ok(Literal::Int64(v))
    } else if let Ok(v) = u64::try_from(value) {
        Ok(Literal::UInt64(v))
    } else {
        Err(IngotError::ValueError(format!(
            "integer {value} does not fit in a 64-bit integer type"
        )))
    }
}

fn normalize_decimal(mantissa: i128, scale: usize) -> IngotResult<Literal> {
    let precision = num_digits(mantissa).max(scale).max(1);
    if precision > DECIMAL_MAX_PRECISION {
        return Err(IngotError::ValueError(format!(
            "decimal with {precision} digits exceeds the maximum precision of {DECIMAL_MAX_PRECISION}"
        )));
    }
    Ok(Literal::Decimal(mantissa, precision, scale))
}

fn normalize_sequence(values: &[RawValue], strict: bool) -> IngotResult<Normalized> {
    let mut inner = DataType::Null;
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        let normalized = normalize(value, strict)?;
        inner = supertype(&inner, &normalized.dtype, strict)?;
        items.push(normalized.value);
    }
    Ok(Normalized {
        value: Literal::List(items),
        dtype: DataType::list(inner),
    })
}

fn normalize_record(fields: &[(String, RawValue)], strict: bool) -> IngotResult<Normalized> {
    if fields.is_empty() {
        return Err(IngotError::ValueError(
            "record must have at least one field".to_string(),
        ));
    }
    let mut values = IndexMap::with_capacity(fields.len());
    let mut dtypes = Vec::with_capacity(fields.len());
    for (name, raw) in fields {
        let normalized = normalize(raw, strict)?;
        if values.insert(name.clone(), normalized.value).is_some() {
            return Err(IngotError::SchemaMismatch(format!(
                "record contains duplicate field name: {name}"
            )));
        }
        dtypes.push(Field::new(name.clone(), normalized.dtype));
    }
    Ok(Normalized {
        value: Literal::Struct(values),
        dtype: DataType::Struct(dtypes),
    })
}

/// Rejects typed literals whose parameters no column could hold.
fn validate_typed(lit: &Literal) -> IngotResult<()> {
    match lit {
        Literal::Decimal(mantissa, precision, _) if !fits_precision(*mantissa, *precision) => {
            Err(IngotError::ValueError(format!(
                "typed decimal {lit} does not fit precision {precision}"
            )))
        }
        Literal::List(values) | Literal::Array(values) => {
            values.iter().try_for_each(validate_typed)
        }
        Literal::Struct(fields) => fields.values().try_for_each(validate_typed),
        _ => Ok(()),
    }
}

/// Typed arrays become `Array` values, nested once per extra dimension.
fn normalize_typed_array(
    dtype: &DataType,
    shape: &[usize],
    values: &[Literal],
) -> IngotResult<Normalized> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(IngotError::ShapeError(format!(
            "typed array shape {shape:?} must have at least one dimension and no empty axes"
        )));
    }
    let expected = shape.iter().product::<usize>();
    if expected != values.len() {
        return Err(IngotError::ShapeError(format!(
            "typed array of shape {shape:?} needs {expected} values, got {}",
            values.len()
        )));
    }
    let mut items = values
        .iter()
        .map(|v| {
            cast_literal(v, dtype, true).map_err(|reason| {
                IngotError::ValueError(format!("typed array element {v} is not a `{dtype}`: {reason}"))
            })
        })
        .collect::<IngotResult<Vec<_>>>()?;
    let mut item_type = dtype.clone();
    for &width in shape.iter().rev() {
        let mut rows = Vec::with_capacity(items.len() / width);
        let mut iter = items.into_iter();
        loop {
            let row = iter.by_ref().take(width).collect::<Vec<_>>();
            if row.is_empty() {
                break;
            }
            rows.push(Literal::Array(row));
        }
        items = rows;
        item_type = DataType::array(item_type, width);
    }
    let value = items.pop().unwrap_or(Literal::Null);
    Ok(Normalized {
        value,
        dtype: item_type,
    })
}

/// Converts one raw element into a literal and its inferred dtype.
///
/// Integers infer `Int64` (`UInt64` above `i64::MAX`), floats `Float64`, wall clocks
/// `Datetime[us]` (or `ns` when sub-microsecond digits are present). Nested sequences infer
/// `List` of the unified element type; typed arrays infer `Array`.
pub fn normalize(raw: &RawValue, strict: bool) -> IngotResult<Normalized> {
    let normalized = match raw {
        RawValue::Null => Normalized::scalar(Literal::Null),
        RawValue::Boolean(v) => Normalized::scalar(Literal::Boolean(*v)),
        RawValue::Int(v) => Normalized::scalar(normalize_int(*v)?),
        RawValue::Float(v) => Normalized::scalar(Literal::Float64(*v)),
        RawValue::Str(v) => Normalized::scalar(Literal::Utf8(v.clone())),
        RawValue::Bytes(v) => Normalized::scalar(Literal::Binary(v.clone())),
        RawValue::Decimal { mantissa, scale } => {
            Normalized::scalar(normalize_decimal(*mantissa, *scale)?)
        }
        RawValue::Date(date) => Normalized::scalar(Literal::Date(
            date_to_days(*date).map_err(IngotError::ValueError)?,
        )),
        RawValue::Datetime { value, tz } => {
            Normalized::scalar(normalize_datetime(value, tz.as_deref())?)
        }
        RawValue::Duration(delta) => Normalized::scalar(normalize_duration(delta)?),
        RawValue::Sequence(values) => normalize_sequence(values, strict)?,
        RawValue::Record(fields) => normalize_record(fields, strict)?,
        RawValue::Typed(lit) => {
            lit.get_type().validate()?;
            validate_typed(lit)?;
            Normalized::scalar(lit.clone())
        }
        RawValue::TypedArray {
            dtype,
            shape,
            values,
        } => normalize_typed_array(dtype, shape, values)?,
    };
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common_error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::raw;

    fn dtype_of(raw: RawValue, strict: bool) -> IngotResult<DataType> {
        normalize(&raw, strict).map(|n| n.dtype)
    }

    #[rstest]
    #[case(RawValue::Int(1), DataType::Int64)]
    #[case(RawValue::Int(i128::from(u64::MAX)), DataType::UInt64)]
    #[case(RawValue::Float(1.5), DataType::Float64)]
    #[case(RawValue::Null, DataType::Null)]
    #[case(RawValue::Str("a".into()), DataType::Utf8)]
    #[case(RawValue::Decimal { mantissa: 12345, scale: 2 }, DataType::Decimal(5, 2))]
    #[case(RawValue::Decimal { mantissa: 5, scale: 3 }, DataType::Decimal(3, 3))]
    #[case(RawValue::Sequence(vec![]), DataType::list(DataType::Null))]
    #[case(RawValue::Sequence(raw![1, null, 2]), DataType::list(DataType::Int64))]
    #[case(RawValue::Sequence(raw![[1, 2], [3]]), DataType::list(DataType::list(DataType::Int64)))]
    fn infers_leaf_types(#[case] raw: RawValue, #[case] expected: DataType) {
        assert_eq!(dtype_of(raw, true).unwrap(), expected);
    }

    #[rstest]
    #[case(Literal::Decimal(5, 1, 3))]
    #[case(Literal::Decimal(1, 0, 0))]
    #[case(Literal::Decimal(12_345, 4, 2))]
    #[case(Literal::Datetime(0, TimeUnit::Microseconds, Some("Mars/Olympus".into())))]
    #[case(Literal::List(vec![Literal::Decimal(5, 1, 3)]))]
    #[case(Literal::Array(vec![]))]
    fn invalid_typed_literals_are_value_errors(#[case] lit: Literal) {
        let err = normalize(&RawValue::Typed(lit), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
    }

    #[test]
    fn empty_records_are_rejected() {
        let err = normalize(&RawValue::Record(vec![]), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
    }

    #[test]
    fn integers_beyond_u64_are_rejected() {
        let err = normalize(&RawValue::Int(i128::from(u64::MAX) + 1), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
    }

    #[test]
    fn datetimes_pick_unit_from_precision() -> IngotResult<()> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let micros = base.and_hms_micro_opt(0, 0, 0, 1).unwrap();
        let nanos = base.and_hms_nano_opt(0, 0, 0, 1).unwrap();
        assert_eq!(
            dtype_of(micros.into(), true)?,
            DataType::Datetime(TimeUnit::Microseconds, None)
        );
        assert_eq!(
            dtype_of(nanos.into(), true)?,
            DataType::Datetime(TimeUnit::Nanoseconds, None)
        );
        Ok(())
    }

    #[test]
    fn zoned_wall_clocks_become_utc_instants() -> IngotResult<()> {
        let wall = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let normalized = normalize(&RawValue::datetime(wall, Some("Asia/Tokyo")), true)?;
        assert_eq!(
            normalized.value,
            Literal::Datetime(
                1_704_067_200_000_000,
                TimeUnit::Microseconds,
                Some("Asia/Tokyo".to_string())
            )
        );
        Ok(())
    }

    #[test]
    fn mixed_sequences_follow_strictness() {
        let mixed = RawValue::Sequence(raw![1, 2.5]);
        assert_eq!(
            dtype_of(mixed.clone(), true).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            dtype_of(mixed, false).unwrap(),
            DataType::list(DataType::Float64)
        );
    }

    #[test]
    fn records_become_structs() -> IngotResult<()> {
        let record = RawValue::record([("a", RawValue::Int(1)), ("b", RawValue::from("x"))]);
        assert_eq!(
            dtype_of(record, true)?,
            DataType::Struct(vec![
                Field::new("a", DataType::Int64),
                Field::new("b", DataType::Utf8),
            ])
        );
        let dup = RawValue::record([("a", RawValue::Int(1)), ("a", RawValue::Int(2))]);
        assert_eq!(
            normalize(&dup, true).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        Ok(())
    }

    #[test]
    fn typed_arrays_infer_fixed_width() -> IngotResult<()> {
        let raw = RawValue::TypedArray {
            dtype: DataType::Int32,
            shape: vec![2, 3],
            values: (0..6).map(Literal::Int32).collect(),
        };
        let normalized = normalize(&raw, true)?;
        assert_eq!(
            normalized.dtype,
            DataType::array(DataType::array(DataType::Int32, 3), 2)
        );
        assert_eq!(
            normalized.value,
            Literal::Array(vec![
                Literal::Array((0..3).map(Literal::Int32).collect()),
                Literal::Array((3..6).map(Literal::Int32).collect()),
            ])
        );

        let bad = RawValue::TypedArray {
            dtype: DataType::Int32,
            shape: vec![4],
            values: (0..3).map(Literal::Int32).collect(),
        };
        assert_eq!(normalize(&bad, true).unwrap_err().kind(), ErrorKind::ShapeError);
        Ok(())
    }
}
