use common_error::{IngotResult, TypeMismatchError};
use indexmap::IndexMap;

use crate::{
    dtype::{DataType, DECIMAL_MAX_PRECISION},
    field::Field,
};

/// Coarse grouping of dtypes. Strict unification only widens inside a family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Null,
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Binary,
    Date,
    Datetime,
    Duration,
    Categorical,
    Sequence,
    Struct,
}

impl TypeFamily {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Null => Self::Null,
            DataType::Boolean => Self::Boolean,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Self::Integer,
            DataType::Float32 | DataType::Float64 => Self::Float,
            DataType::Decimal(..) => Self::Decimal,
            DataType::Utf8 => Self::String,
            DataType::Binary => Self::Binary,
            DataType::Date => Self::Date,
            DataType::Datetime(..) => Self::Datetime,
            DataType::Duration(..) => Self::Duration,
            DataType::Categorical => Self::Categorical,
            DataType::List(..) | DataType::Array(..) => Self::Sequence,
            DataType::Struct(..) => Self::Struct,
        }
    }
}

/// Whether two dtypes belong to the same family, recursively for nested types. `Null` matches
/// every family.
pub fn same_family(l: &DataType, r: &DataType) -> bool {
    match (l, r) {
        (DataType::Null, _) | (_, DataType::Null) => true,
        (
            DataType::List(li) | DataType::Array(li, _),
            DataType::List(ri) | DataType::Array(ri, _),
        ) => same_family(li, ri),
        (DataType::Struct(lf), DataType::Struct(rf)) => {
            lf.len() == rf.len()
                && lf
                    .iter()
                    .zip(rf)
                    .all(|(l, r)| l.name == r.name && same_family(&l.dtype, &r.dtype))
        }
        _ => TypeFamily::of(l) == TypeFamily::of(r),
    }
}

fn join_integers(l: &DataType, r: &DataType) -> Option<DataType> {
    let lw = l.bit_width()?;
    let rw = r.bit_width()?;
    match (l.is_signed_integer(), r.is_signed_integer()) {
        (true, true) => DataType::signed_with_width(lw.max(rw)),
        (false, false) => DataType::unsigned_with_width(lw.max(rw)),
        (signed_l, _) => {
            let (signed, unsigned) = if signed_l { (lw, rw) } else { (rw, lw) };
            if unsigned >= 64 {
                Some(DataType::Float64)
            } else {
                DataType::signed_with_width(signed.max(unsigned * 2))
            }
        }
    }
}

/// Decimal wide enough for both sides, or `None` when that needs more than the maximum precision
/// or a side has a scale above its precision.
fn join_decimals(lp: usize, ls: usize, rp: usize, rs: usize) -> Option<DataType> {
    let scale = ls.max(rs);
    let int_digits = lp.checked_sub(ls)?.max(rp.checked_sub(rs)?);
    let precision = int_digits.checked_add(scale)?;
    (precision <= DECIMAL_MAX_PRECISION).then_some(DataType::Decimal(precision, scale))
}

fn join_structs(lf: &[Field], rf: &[Field]) -> Option<DataType> {
    if lf.len() != rf.len() {
        return None;
    }
    lf.iter()
        .zip(rf)
        .map(|(l, r)| {
            if l.name != r.name {
                return None;
            }
            widest_common(&l.dtype, &r.dtype).map(|dtype| l.with_dtype(dtype))
        })
        .collect::<Option<Vec<_>>>()
        .map(DataType::Struct)
}

/// Least upper bound of two dtypes under the widening order, or `None` when they are
/// incomparable.
#[must_use]
pub fn widest_common(l: &DataType, r: &DataType) -> Option<DataType> {
    fn inner(l: &DataType, r: &DataType) -> Option<DataType> {
        if l == r {
            return Some(l.clone());
        }

        match (l, r) {
            (DataType::Null, other) => Some(other.clone()),

            (DataType::Boolean, other) if other.is_integer() || other.is_floating() => {
                Some(other.clone())
            }

            (l, r) if l.is_integer() && r.is_integer() => join_integers(l, r),
            (l, DataType::Float32 | DataType::Float64) if l.is_integer() => {
                Some(DataType::Float64)
            }
            (DataType::Float32, DataType::Float64) => Some(DataType::Float64),

            (DataType::Decimal(lp, ls), DataType::Decimal(rp, rs)) => {
                join_decimals(*lp, *ls, *rp, *rs)
            }

            (DataType::Date, DataType::Datetime(unit, tz)) => {
                Some(DataType::Datetime(*unit, tz.clone()))
            }
            (DataType::Datetime(lu, ltz), DataType::Datetime(ru, rtz)) => {
                let unit = lu.finest(*ru);
                match (ltz, rtz) {
                    (None, None) => Some(DataType::Datetime(unit, None)),
                    (Some(l), Some(r)) if l == r => Some(DataType::Datetime(unit, Some(l.clone()))),
                    (Some(_), Some(_)) => Some(DataType::Datetime(unit, Some("UTC".to_string()))),
                    // Naive and zoned wall clocks are not comparable.
                    _ => None,
                }
            }
            (DataType::Duration(lu), DataType::Duration(ru)) => {
                Some(DataType::Duration(lu.finest(*ru)))
            }

            (DataType::Categorical, DataType::Utf8) => Some(DataType::Utf8),

            (DataType::List(li), DataType::List(ri))
            | (DataType::List(li), DataType::Array(ri, _)) => {
                widest_common(li, ri).map(DataType::list)
            }
            (DataType::Array(li, lw), DataType::Array(ri, rw)) => {
                let inner = widest_common(li, ri)?;
                if lw == rw {
                    Some(DataType::array(inner, *lw))
                } else {
                    Some(DataType::list(inner))
                }
            }
            (DataType::Struct(lf), DataType::Struct(rf)) => join_structs(lf, rf),

            _ => None,
        }
    }

    inner(l, r).or_else(|| inner(r, l))
}

/// Like [`widest_common`] but reports incomparable types as a unification `TypeMismatch`.
pub fn try_widest_common(l: &DataType, r: &DataType) -> IngotResult<DataType> {
    widest_common(l, r).ok_or_else(|| TypeMismatchError::unification(l, r).into())
}

/// Folds [`widest_common`] over a collection, starting from `Null`.
pub fn widest_common_all<'a, I>(dtypes: I) -> Option<DataType>
where
    I: IntoIterator<Item = &'a DataType>,
{
    dtypes
        .into_iter()
        .try_fold(DataType::Null, |acc, dtype| widest_common(&acc, dtype))
}

/// `from ⊑ to`: every value of `from` is representable in `to` without loss.
#[must_use]
pub fn is_widening(from: &DataType, to: &DataType) -> bool {
    widest_common(from, to).is_some_and(|joined| &joined == to)
}

/// Supertype used by strict unification: both types must share a family, then the lattice join
/// applies.
pub fn strict_supertype(l: &DataType, r: &DataType) -> IngotResult<DataType> {
    if !same_family(l, r) {
        return Err(TypeMismatchError::unification(l, r).into());
    }
    try_widest_common(l, r)
}

/// Best-effort supertype used by non-strict unification. Falls back to a representation that
/// can hold both sides, possibly by converting values (which may then fail individually).
/// A scalar and a nested type have no such representation.
pub fn lossy_supertype(l: &DataType, r: &DataType) -> IngotResult<DataType> {
    if let Some(joined) = widest_common(l, r) {
        return Ok(joined);
    }
    lossy_inner(l, r)
        .or_else(|| lossy_inner(r, l))
        .or_else(|| render_as_string(l, r))
        .ok_or_else(|| TypeMismatchError::unification(l, r).into())
}

fn lossy_inner(l: &DataType, r: &DataType) -> Option<DataType> {
    match (l, r) {
        (DataType::List(li) | DataType::Array(li, _), DataType::List(ri) | DataType::Array(ri, _)) => {
            let inner = lossy_supertype(li, ri).ok()?;
            match (l, r) {
                (DataType::Array(_, lw), DataType::Array(_, rw)) if lw == rw => {
                    Some(DataType::array(inner, *lw))
                }
                _ => Some(DataType::list(inner)),
            }
        }
        (DataType::Struct(lf), DataType::Struct(rf)) => {
            let mut fields: IndexMap<&str, DataType> = IndexMap::new();
            for field in lf.iter().chain(rf) {
                let dtype = match fields.get(field.name.as_str()) {
                    Some(existing) => lossy_supertype(existing, &field.dtype).ok()?,
                    None => field.dtype.clone(),
                };
                fields.insert(&field.name, dtype);
            }
            Some(DataType::Struct(
                fields
                    .into_iter()
                    .map(|(name, dtype)| Field::new(name, dtype))
                    .collect(),
            ))
        }
        (DataType::Decimal(p, s), other) if other.is_integer() || other.is_boolean() => {
            let digits = other.int_digits()?;
            let precision = (*p).max(s + digits).min(DECIMAL_MAX_PRECISION);
            Some(DataType::Decimal(precision, *s))
        }
        (DataType::Decimal(..), DataType::Float32 | DataType::Float64) => Some(DataType::Float64),
        // Past the maximum precision keep every fractional digit; large values fail on their own.
        (DataType::Decimal(_, ls), DataType::Decimal(_, rs)) => Some(DataType::Decimal(
            DECIMAL_MAX_PRECISION,
            (*ls).max(*rs).min(DECIMAL_MAX_PRECISION),
        )),
        (DataType::Datetime(lu, Some(tz)), DataType::Datetime(ru, None)) => {
            Some(DataType::Datetime(lu.finest(*ru), Some(tz.clone())))
        }
        (DataType::Binary, DataType::Utf8 | DataType::Categorical) => Some(DataType::Binary),
        _ => None,
    }
}

/// Remaining scalar pairs render through strings. Binary only meets strings.
fn render_as_string(l: &DataType, r: &DataType) -> Option<DataType> {
    let unrenderable = |dtype: &DataType| dtype.is_nested() || matches!(dtype, DataType::Binary);
    if unrenderable(l) || unrenderable(r) {
        None
    } else {
        Some(DataType::Utf8)
    }
}
