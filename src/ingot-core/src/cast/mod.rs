//! Value-level conversions between dtypes.
//!
//! Every conversion is one arm of a pattern match over `(value, target dtype)`. A conversion
//! either produces a literal of exactly the target dtype or fails with a reason. Strictness
//! decides whether lossy steps (truncation, flooring, dropped struct fields) are allowed.

pub mod decimal;
pub mod numeric;
pub mod report;
pub mod string;
pub mod temporal;

use indexmap::IndexMap;

use self::{
    numeric::{cast_numeric, int_literal},
    string::{parse_str, render_plain},
    temporal::cast_temporal,
};
use crate::{
    datatypes::{DataType, Field},
    lit::Literal,
};

fn is_numeric_like(dtype: &DataType) -> bool {
    dtype.is_boolean() || dtype.is_numeric()
}

/// Whether some conversion from `from` to `to` exists. Individual values may still fail.
pub fn can_cast(from: &DataType, to: &DataType) -> bool {
    if from == to || from.is_null() {
        return true;
    }
    match (from, to) {
        (_, DataType::Null) => false,
        (from, DataType::Utf8 | DataType::Categorical) => !from.is_nested(),
        (DataType::Utf8 | DataType::Categorical, to) => {
            !to.is_nested() && !matches!(to, DataType::Duration(_))
        }
        (from, to) if is_numeric_like(from) && is_numeric_like(to) => true,
        (
            DataType::Date | DataType::Datetime(..),
            DataType::Date | DataType::Datetime(..),
        )
        | (DataType::Duration(_), DataType::Duration(_)) => true,
        (DataType::Date | DataType::Datetime(..) | DataType::Duration(_), to) => to.is_integer(),
        (from, DataType::Date | DataType::Datetime(..) | DataType::Duration(_)) => {
            from.is_integer()
        }
        (
            DataType::List(from_inner) | DataType::Array(from_inner, _),
            DataType::List(to_inner) | DataType::Array(to_inner, _),
        ) => can_cast(from_inner, to_inner),
        (DataType::Struct(from_fields), DataType::Struct(to_fields)) => {
            to_fields.iter().all(|to_field| {
                find_field(from_fields, &to_field.name)
                    .map_or(true, |from_field| can_cast(&from_field.dtype, &to_field.dtype))
            })
        }
        _ => false,
    }
}

/// Whether values of `from` may be placed into a column declared as `to` under strict
/// construction: no cross-family coercion, only exact per-value conversions.
pub fn can_cast_strict(from: &DataType, to: &DataType) -> bool {
    if from == to || from.is_null() {
        return true;
    }
    match (from, to) {
        (from, to) if from.is_numeric() && to.is_numeric() => true,
        (
            DataType::Utf8 | DataType::Categorical,
            DataType::Utf8 | DataType::Categorical,
        )
        | (DataType::Date, DataType::Datetime(..))
        | (DataType::Datetime(..), DataType::Datetime(..))
        | (DataType::Duration(_), DataType::Duration(_)) => true,
        (
            DataType::List(from_inner) | DataType::Array(from_inner, _),
            DataType::List(to_inner) | DataType::Array(to_inner, _),
        ) => can_cast_strict(from_inner, to_inner),
        (DataType::Struct(from_fields), DataType::Struct(to_fields)) => {
            from_fields.iter().all(|from_field| {
                find_field(to_fields, &from_field.name)
                    .is_some_and(|to_field| can_cast_strict(&from_field.dtype, &to_field.dtype))
            })
        }
        _ => false,
    }
}

fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

fn int_to_temporal(value: i128, target: &DataType) -> Result<Literal, String> {
    let out_of_range = || format!("value {value} is out of range for `{target}`");
    match target {
        DataType::Date => i32::try_from(value)
            .map(Literal::Date)
            .map_err(|_| out_of_range()),
        DataType::Datetime(unit, tz) => i64::try_from(value)
            .map(|v| Literal::Datetime(v, *unit, tz.clone()))
            .map_err(|_| out_of_range()),
        DataType::Duration(unit) => i64::try_from(value)
            .map(|v| Literal::Duration(v, *unit))
            .map_err(|_| out_of_range()),
        other => Err(format!("`{other}` is not a temporal type")),
    }
}

fn cast_elements(values: &[Literal], inner: &DataType, strict: bool) -> Result<Vec<Literal>, String> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| match cast_literal(value, inner, strict) {
            Ok(lit) => Ok(lit),
            Err(_) if !strict => Ok(Literal::Null),
            Err(reason) => Err(format!("element {idx}: {reason}")),
        })
        .collect()
}

fn cast_struct(
    values: &IndexMap<String, Literal>,
    fields: &[Field],
    strict: bool,
) -> Result<Literal, String> {
    if strict {
        if let Some(extra) = values.keys().find(|name| find_field(fields, name).is_none()) {
            return Err(format!("field '{extra}' is not part of the target struct"));
        }
    }
    fields
        .iter()
        .map(|field| {
            let value = match values.get(&field.name) {
                None => Literal::Null,
                Some(value) => match cast_literal(value, &field.dtype, strict) {
                    Ok(lit) => lit,
                    Err(_) if !strict => Literal::Null,
                    Err(reason) => return Err(format!("field '{}': {reason}", field.name)),
                },
            };
            Ok((field.name.clone(), value))
        })
        .collect::<Result<IndexMap<_, _>, _>>()
        .map(Literal::Struct)
}

/// Converts one value to `target`. Null stays null. On success the result's dtype is exactly
/// `target`.
pub fn cast_literal(lit: &Literal, target: &DataType, strict: bool) -> Result<Literal, String> {
    if lit.is_null() {
        return Ok(Literal::Null);
    }
    match (lit, target) {
        (_, DataType::Null) => Err(format!("{lit} cannot be represented as `Null`")),

        (Literal::Utf8(s) | Literal::Categorical(s), DataType::Utf8) => {
            Ok(Literal::Utf8(s.clone()))
        }
        (Literal::Utf8(s) | Literal::Categorical(s), DataType::Categorical) => {
            Ok(Literal::Categorical(s.clone()))
        }
        (Literal::Binary(bytes), DataType::Utf8 | DataType::Categorical) => {
            let s = String::from_utf8(bytes.clone())
                .map_err(|_| format!("{lit} is not valid UTF-8"))?;
            parse_str(&s, target, strict)
        }
        (Literal::Binary(bytes), DataType::Binary) => Ok(Literal::Binary(bytes.clone())),
        (
            Literal::List(_) | Literal::Array(_) | Literal::Struct(_),
            DataType::Utf8 | DataType::Categorical,
        ) => Err(format!("nested value {lit} cannot be converted to `{target}`")),
        (scalar, DataType::Utf8) => Ok(Literal::Utf8(render_plain(scalar))),
        (scalar, DataType::Categorical) => Ok(Literal::Categorical(render_plain(scalar))),
        (Literal::Utf8(s) | Literal::Categorical(s), target) => parse_str(s, target, strict),

        (
            Literal::Boolean(_)
            | Literal::Int8(_)
            | Literal::Int16(_)
            | Literal::Int32(_)
            | Literal::Int64(_)
            | Literal::UInt8(_)
            | Literal::UInt16(_)
            | Literal::UInt32(_)
            | Literal::UInt64(_)
            | Literal::Float32(_)
            | Literal::Float64(_)
            | Literal::Decimal(..),
            target,
        ) if is_numeric_like(target) => cast_numeric(lit, target, strict),

        (
            Literal::Date(_) | Literal::Datetime(..) | Literal::Duration(..),
            DataType::Date | DataType::Datetime(..) | DataType::Duration(_),
        ) => cast_temporal(lit, target, strict),
        (Literal::Date(days), target) if target.is_integer() => {
            int_literal(i128::from(*days), target)
        }
        (Literal::Datetime(value, ..) | Literal::Duration(value, _), target)
            if target.is_integer() =>
        {
            int_literal(i128::from(*value), target)
        }
        (lit, target) if target.is_temporal() => match lit.as_i128() {
            Some(value) => int_to_temporal(value, target),
            None => Err(format!("{lit} cannot be converted to `{target}`")),
        },

        (Literal::List(values) | Literal::Array(values), DataType::List(inner)) => {
            cast_elements(values, inner, strict).map(Literal::List)
        }
        (Literal::List(values) | Literal::Array(values), DataType::Array(inner, width)) => {
            if values.len() != *width {
                return Err(format!(
                    "{} elements do not fit `{target}`",
                    values.len()
                ));
            }
            cast_elements(values, inner, strict).map(Literal::Array)
        }
        (Literal::Struct(values), DataType::Struct(fields)) => cast_struct(values, fields, strict),

        (lit, target) => Err(format!("{lit} cannot be converted to `{target}`")),
    }
}
