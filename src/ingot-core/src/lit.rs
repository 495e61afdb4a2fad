use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    cast::decimal::format_decimal,
    datatypes::{
        parse_timezone, timestamp_to_local, timestamp_to_naive_datetime, widest_common_all,
        DataType, Field, TimeUnit,
    },
};

/// A single typed value. Every variant maps to exactly one physical representation, so a
/// literal's dtype can always be read off the value.
///
/// Datetimes are UTC instants; the zone only affects rendering.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Mantissa, precision, scale.
    Decimal(i128, usize, usize),
    Utf8(String),
    Binary(Vec<u8>),
    /// Days since the UNIX epoch.
    Date(i32),
    Datetime(i64, TimeUnit, Option<String>),
    Duration(i64, TimeUnit),
    List(Vec<Literal>),
    Array(Vec<Literal>),
    Struct(IndexMap<String, Literal>),
    Categorical(String),
}

impl Literal {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn get_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Decimal(_, precision, scale) => DataType::Decimal(*precision, *scale),
            Self::Utf8(_) => DataType::Utf8,
            Self::Binary(_) => DataType::Binary,
            Self::Date(_) => DataType::Date,
            Self::Datetime(_, unit, tz) => DataType::Datetime(*unit, tz.clone()),
            Self::Duration(_, unit) => DataType::Duration(*unit),
            Self::List(values) => DataType::list(element_type(values)),
            Self::Array(values) => DataType::array(element_type(values), values.len()),
            Self::Struct(fields) => DataType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| Field::new(name.clone(), value.get_type()))
                    .collect(),
            ),
            Self::Categorical(_) => DataType::Categorical,
        }
    }

    /// Integer payload widened to `i128`, for any integer variant.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int8(v) => Some((*v).into()),
            Self::Int16(v) => Some((*v).into()),
            Self::Int32(v) => Some((*v).into()),
            Self::Int64(v) => Some((*v).into()),
            Self::UInt8(v) => Some((*v).into()),
            Self::UInt16(v) => Some((*v).into()),
            Self::UInt32(v) => Some((*v).into()),
            Self::UInt64(v) => Some((*v).into()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(v) => Some((*v).into()),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) | Self::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

fn element_type(values: &[Literal]) -> DataType {
    let dtypes = values.iter().map(Literal::get_type).collect::<Vec<_>>();
    widest_common_all(&dtypes).unwrap_or(DataType::Null)
}

fn display_datetime(
    f: &mut Formatter,
    value: i64,
    unit: TimeUnit,
    tz: Option<&str>,
) -> FmtResult {
    let format = match unit {
        TimeUnit::Milliseconds => "%Y-%m-%dT%H:%M:%S%.3f",
        TimeUnit::Microseconds => "%Y-%m-%dT%H:%M:%S%.6f",
        TimeUnit::Nanoseconds => "%Y-%m-%dT%H:%M:%S%.9f",
    };
    match tz {
        None => match timestamp_to_naive_datetime(value, unit) {
            Some(naive) => write!(f, "{}", naive.format(format)),
            None => write!(f, "{value}{unit}"),
        },
        Some(tz) => {
            let local = parse_timezone(tz)
                .ok()
                .and_then(|parsed| timestamp_to_local(value, unit, &parsed));
            match local {
                Some(local) => write!(f, "{}{}", local.format(format), local.format("%:z")),
                None => write!(f, "{value}{unit} {tz}"),
            }
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Null => write!(f, "None"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v:?}"),
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::Decimal(mantissa, _, scale) => {
                write!(f, "{}", format_decimal(*mantissa, *scale))
            }
            Self::Utf8(v) => write!(f, "\"{v}\""),
            Self::Binary(v) => write!(f, "b\"{}\"", v.escape_ascii()),
            Self::Date(days) => {
                match chrono::DateTime::from_timestamp(i64::from(*days) * 86_400, 0) {
                    Some(dt) => write!(f, "{}", dt.date_naive()),
                    None => write!(f, "{days}d"),
                }
            }
            Self::Datetime(value, unit, tz) => display_datetime(f, *value, *unit, tz.as_deref()),
            Self::Duration(value, unit) => write!(f, "{value}{unit}"),
            Self::List(values) | Self::Array(values) => {
                write!(f, "[{}]", values.iter().join(", "))
            }
            Self::Struct(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .join(", ")
            ),
            Self::Categorical(v) => write!(f, "\"{v}\""),
        }
    }
}

macro_rules! impl_from_native {
    ($($native:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$native> for Literal {
                fn from(value: $native) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from_native!(
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Utf8,
    Vec<u8> => Binary,
);

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
