use std::fmt::{Display, Formatter, Result as FmtResult};

use arrow2::datatypes::{DataType as ArrowType, Field as ArrowField, IntegerType};
use common_error::{IngotError, IngotResult};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{field::Field, time_unit::parse_timezone, time_unit::TimeUnit};

/// Largest precision a `Decimal` can carry; the mantissa is stored as an `i128`.
pub const DECIMAL_MAX_PRECISION: usize = 38;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    // ArrowTypes:
    /// Null type
    Null,

    /// `true` and `false`.
    Boolean,

    /// An [`i8`]
    Int8,

    /// An [`i16`]
    Int16,

    /// An [`i32`]
    Int32,

    /// An [`i64`]
    Int64,

    /// An [`u8`]
    UInt8,

    /// An [`u16`]
    UInt16,

    /// An [`u32`]
    UInt32,

    /// An [`u64`]
    UInt64,

    /// A [`f32`]
    Float32,

    /// A [`f64`]
    Float64,

    /// Fixed-precision decimal type.
    /// Stored as an `i128` mantissa; precision and scale are the number of significant digits
    /// and the number of digits after the decimal point.
    Decimal(usize, usize),

    /// A time instant stored as a signed 64-bit count of `TimeUnit` since the UNIX epoch (UTC).
    /// The optional zone is an IANA tz database name or a fixed `+HH:MM` offset and only affects
    /// how the instant renders as a wall clock.
    Datetime(TimeUnit, Option<String>),

    /// A 32-bit count of days since the UNIX epoch.
    Date,

    /// A signed 64-bit count of `TimeUnit`.
    Duration(TimeUnit),

    /// Opaque binary data of variable length.
    Binary,

    /// A variable-length UTF-8 encoded string.
    Utf8,

    /// A list of some logical data type with a fixed number of elements.
    Array(Box<DataType>, usize),

    /// A list of some logical data type whose offsets are represented as [`i64`].
    List(Box<DataType>),

    /// A nested [`DataType`] with a given number of [`Field`]s.
    Struct(Vec<Field>),

    /// Dictionary-encoded strings.
    Categorical,
}

impl DataType {
    /// Validated `Decimal` constructor: `1 <= precision <= 38` and `scale <= precision`.
    pub fn decimal(precision: usize, scale: usize) -> IngotResult<Self> {
        if precision == 0 || precision > DECIMAL_MAX_PRECISION {
            return Err(IngotError::ValueError(format!(
                "Decimal precision must be between 1 and {DECIMAL_MAX_PRECISION}, got {precision}"
            )));
        }
        if scale > precision {
            return Err(IngotError::ValueError(format!(
                "Decimal scale {scale} cannot exceed precision {precision}"
            )));
        }
        Ok(Self::Decimal(precision, scale))
    }

    /// Validated `Datetime` constructor; the zone must parse as a tz name or fixed offset.
    pub fn datetime(unit: TimeUnit, timezone: Option<&str>) -> IngotResult<Self> {
        if let Some(tz) = timezone {
            parse_timezone(tz)?;
        }
        Ok(Self::Datetime(unit, timezone.map(str::to_string)))
    }

    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn array(inner: Self, width: usize) -> Self {
        Self::Array(Box::new(inner), width)
    }

    /// Checks the parameters of this type and every nested type.
    pub fn validate(&self) -> IngotResult<()> {
        match self {
            Self::Decimal(p, s) => Self::decimal(*p, *s).map(|_| ()),
            Self::Datetime(_, Some(tz)) => parse_timezone(tz).map(|_| ()),
            Self::Array(_, 0) => Err(IngotError::ValueError(
                "Array width must be a positive integer".to_string(),
            )),
            Self::Array(inner, _) | Self::List(inner) => inner.validate(),
            Self::Struct(fields) if fields.is_empty() => Err(IngotError::ValueError(
                "Struct must have at least one field".to_string(),
            )),
            Self::Struct(fields) => {
                if let Some(dup) = fields.iter().map(|f| f.name.as_str()).duplicates().next() {
                    return Err(IngotError::SchemaMismatch(format!(
                        "Struct contains duplicate field name: {dup}"
                    )));
                }
                fields.iter().try_for_each(|f| f.dtype.validate())
            }
            _ => Ok(()),
        }
    }

    /// The arrow type columns of this dtype are stored as.
    ///
    /// Strings and binaries use 64-bit offsets, lists are `LargeList`, and categoricals are
    /// `UInt32`-keyed dictionaries of strings.
    pub fn to_arrow(&self) -> IngotResult<ArrowType> {
        let arrow_type = match self {
            Self::Null => ArrowType::Null,
            Self::Boolean => ArrowType::Boolean,
            Self::Int8 => ArrowType::Int8,
            Self::Int16 => ArrowType::Int16,
            Self::Int32 => ArrowType::Int32,
            Self::Int64 => ArrowType::Int64,
            Self::UInt8 => ArrowType::UInt8,
            Self::UInt16 => ArrowType::UInt16,
            Self::UInt32 => ArrowType::UInt32,
            Self::UInt64 => ArrowType::UInt64,
            Self::Float32 => ArrowType::Float32,
            Self::Float64 => ArrowType::Float64,
            Self::Decimal(precision, scale) => ArrowType::Decimal(*precision, *scale),
            Self::Datetime(unit, tz) => ArrowType::Timestamp(unit.to_arrow(), tz.clone()),
            Self::Date => ArrowType::Date32,
            Self::Duration(unit) => ArrowType::Duration(unit.to_arrow()),
            Self::Binary => ArrowType::LargeBinary,
            Self::Utf8 => ArrowType::LargeUtf8,
            Self::Array(inner, width) => ArrowType::FixedSizeList(
                Box::new(ArrowField::new("item", inner.to_arrow()?, true)),
                *width,
            ),
            Self::List(inner) => {
                ArrowType::LargeList(Box::new(ArrowField::new("item", inner.to_arrow()?, true)))
            }
            Self::Struct(fields) if fields.is_empty() => {
                return Err(IngotError::ValueError(
                    "Struct must have at least one field".to_string(),
                ));
            }
            Self::Struct(fields) => ArrowType::Struct(
                fields
                    .iter()
                    .map(Field::to_arrow)
                    .collect::<IngotResult<Vec<_>>>()?,
            ),
            Self::Categorical => ArrowType::Dictionary(
                IntegerType::UInt32,
                Box::new(ArrowType::LargeUtf8),
                false,
            ),
        };
        Ok(arrow_type)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    #[inline]
    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    #[inline]
    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Self::Decimal(..))
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating() || self.is_decimal()
    }

    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Datetime(..) | Self::Duration(..))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Utf8)
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(..))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(..))
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.is_list() || self.is_array() || self.is_struct()
    }

    /// Element type of a `List` or `Array`.
    pub fn inner(&self) -> Option<&Self> {
        match self {
            Self::List(inner) | Self::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Bit width of an integer or float type.
    pub fn bit_width(&self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 => Some(8),
            Self::Int16 | Self::UInt16 => Some(16),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(32),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(64),
            _ => None,
        }
    }

    /// Inclusive value range of an integer type.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            Self::Int8 => (i8::MIN.into(), i8::MAX.into()),
            Self::Int16 => (i16::MIN.into(), i16::MAX.into()),
            Self::Int32 => (i32::MIN.into(), i32::MAX.into()),
            Self::Int64 => (i64::MIN.into(), i64::MAX.into()),
            Self::UInt8 => (0, u8::MAX.into()),
            Self::UInt16 => (0, u16::MAX.into()),
            Self::UInt32 => (0, u32::MAX.into()),
            Self::UInt64 => (0, u64::MAX.into()),
            _ => return None,
        };
        Some(bounds)
    }

    /// Number of decimal digits needed to hold every value of an integer type.
    pub fn int_digits(&self) -> Option<usize> {
        match self {
            Self::Boolean => Some(1),
            Self::Int8 | Self::UInt8 => Some(3),
            Self::Int16 | Self::UInt16 => Some(5),
            Self::Int32 | Self::UInt32 => Some(10),
            Self::Int64 => Some(19),
            Self::UInt64 => Some(20),
            _ => None,
        }
    }

    /// Signed integer type with the given bit width.
    pub fn signed_with_width(bits: usize) -> Option<Self> {
        match bits {
            8 => Some(Self::Int8),
            16 => Some(Self::Int16),
            32 => Some(Self::Int32),
            64 => Some(Self::Int64),
            _ => None,
        }
    }

    /// Unsigned integer type with the given bit width.
    pub fn unsigned_with_width(bits: usize) -> Option<Self> {
        match bits {
            8 => Some(Self::UInt8),
            16 => Some(Self::UInt16),
            32 => Some(Self::UInt32),
            64 => Some(Self::UInt64),
            _ => None,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Int8 => write!(f, "Int8"),
            Self::Int16 => write!(f, "Int16"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::UInt8 => write!(f, "UInt8"),
            Self::UInt16 => write!(f, "UInt16"),
            Self::UInt32 => write!(f, "UInt32"),
            Self::UInt64 => write!(f, "UInt64"),
            Self::Float32 => write!(f, "Float32"),
            Self::Float64 => write!(f, "Float64"),
            Self::Decimal(precision, scale) => write!(f, "Decimal({precision}, {scale})"),
            Self::Datetime(unit, None) => write!(f, "Datetime[{unit}]"),
            Self::Datetime(unit, Some(tz)) => write!(f, "Datetime[{unit}, {tz}]"),
            Self::Date => write!(f, "Date"),
            Self::Duration(unit) => write!(f, "Duration[{unit}]"),
            Self::Binary => write!(f, "Binary"),
            Self::Utf8 => write!(f, "String"),
            Self::Array(inner, width) => write!(f, "Array[{inner}; {width}]"),
            Self::List(inner) => write!(f, "List[{inner}]"),
            Self::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| format!("{}: {}", field.name, field.dtype))
                    .join(", ");
                write!(f, "Struct[{fields}]")
            }
            Self::Categorical => write!(f, "Categorical"),
        }
    }
}
