use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::{datatypes::DataType, lit::Literal};

/// One element of dynamically-typed input, before any type has been inferred.
///
/// This is the only open-ended input representation; the normalizer turns every `RawValue`
/// into a [`Literal`] plus an inferred [`DataType`].
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// A missing-value marker.
    Null,
    Boolean(bool),
    /// Any integer. Values are inferred as `Int64`, or `UInt64` when above `i64::MAX`.
    Int(i128),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// An exact decimal `mantissa * 10^-scale`.
    Decimal { mantissa: i128, scale: usize },
    Date(NaiveDate),
    /// A wall-clock time, optionally in a time zone (tz database name or `+HH:MM` offset).
    Datetime {
        value: NaiveDateTime,
        tz: Option<String>,
    },
    Duration(TimeDelta),
    /// A nested, untyped sequence.
    Sequence(Vec<RawValue>),
    /// A row record: ordered name/value pairs.
    Record(Vec<(String, RawValue)>),
    /// An element that already carries its dtype, e.g. from an Arrow source.
    Typed(Literal),
    /// A typed array with a static shape. `values` holds the elements in row-major order.
    TypedArray {
        dtype: DataType,
        shape: Vec<usize>,
        values: Vec<Literal>,
    },
}

impl RawValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn datetime(value: NaiveDateTime, tz: Option<&str>) -> Self {
        Self::Datetime {
            value,
            tz: tz.map(str::to_string),
        }
    }

    pub fn record<S: Into<String>>(fields: impl IntoIterator<Item = (S, Self)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Length of a nested sequence, used when assembling tables from 2D input.
    pub fn outer_len(&self) -> Option<usize> {
        match self {
            Self::Sequence(values) => Some(values.len()),
            Self::TypedArray { shape, .. } => shape.first().copied(),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for RawValue {
                fn from(value: $t) -> Self {
                    Self::Int(value.into())
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f32> for RawValue {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Datetime { value, tz: None }
    }
}

impl From<TimeDelta> for RawValue {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

impl From<Literal> for RawValue {
    fn from(value: Literal) -> Self {
        Self::Typed(value)
    }
}

impl From<Vec<Self>> for RawValue {
    fn from(value: Vec<Self>) -> Self {
        Self::Sequence(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Builds a `Vec<RawValue>` from heterogeneous expressions. `null` marks a missing value and a
/// bracketed group becomes a nested sequence.
///
/// ```
/// # use ingot_core::raw;
/// let values = raw![1, 2.5, null, "a", [1, 2]];
/// assert_eq!(values.len(), 5);
/// ```
#[macro_export]
macro_rules! raw {
    (@one null) => { $crate::raw::RawValue::Null };
    (@one [$($inner:tt)*]) => { $crate::raw::RawValue::Sequence($crate::raw![$($inner)*]) };
    (@one $value:expr) => { $crate::raw::RawValue::from($value) };
    ($($item:tt),* $(,)?) => {
        vec![$($crate::raw!(@one $item)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_builds_nested_values() {
        let values = raw![1, null, [2.5, null], "x"];
        assert_eq!(
            values,
            vec![
                RawValue::Int(1),
                RawValue::Null,
                RawValue::Sequence(vec![RawValue::Float(2.5), RawValue::Null]),
                RawValue::Str("x".to_string()),
            ]
        );
    }

    #[test]
    fn negative_literals_need_grouping() {
        let values = raw![(-1), 2];
        assert_eq!(values, vec![RawValue::Int(-1), RawValue::Int(2)]);
    }
}
