mod builder;

use arrow2::array::{
    Array, BinaryArray, BooleanArray, DictionaryArray, FixedSizeListArray, ListArray,
    PrimitiveArray, StructArray, Utf8Array,
};
pub use builder::ArrayBuilder;

use crate::{datatypes::DataType, lit::Literal};

fn downcast<T: 'static>(array: &dyn Array) -> Option<&T> {
    array.as_any().downcast_ref::<T>()
}

/// The value of slot `idx` of an arrow array stored as `dtype`, or `Literal::Null`.
///
/// # Panics
/// Panics if `idx` is out of bounds.
pub fn literal_at(array: &dyn Array, dtype: &DataType, idx: usize) -> Literal {
    if dtype.is_null() || array.is_null(idx) {
        return Literal::Null;
    }
    // Storage always matches the dtype; anything else reads as null.
    valid_literal_at(array, dtype, idx).unwrap_or(Literal::Null)
}

fn valid_literal_at(array: &dyn Array, dtype: &DataType, idx: usize) -> Option<Literal> {
    macro_rules! primitive {
        ($native:ty) => {
            downcast::<PrimitiveArray<$native>>(array)?.value(idx)
        };
    }

    let lit = match dtype {
        DataType::Null => Literal::Null,
        DataType::Boolean => Literal::Boolean(downcast::<BooleanArray>(array)?.value(idx)),
        DataType::Int8 => Literal::Int8(primitive!(i8)),
        DataType::Int16 => Literal::Int16(primitive!(i16)),
        DataType::Int32 => Literal::Int32(primitive!(i32)),
        DataType::Int64 => Literal::Int64(primitive!(i64)),
        DataType::UInt8 => Literal::UInt8(primitive!(u8)),
        DataType::UInt16 => Literal::UInt16(primitive!(u16)),
        DataType::UInt32 => Literal::UInt32(primitive!(u32)),
        DataType::UInt64 => Literal::UInt64(primitive!(u64)),
        DataType::Float32 => Literal::Float32(primitive!(f32)),
        DataType::Float64 => Literal::Float64(primitive!(f64)),
        DataType::Decimal(precision, scale) => {
            Literal::Decimal(primitive!(i128), *precision, *scale)
        }
        DataType::Date => Literal::Date(primitive!(i32)),
        DataType::Datetime(unit, tz) => Literal::Datetime(primitive!(i64), *unit, tz.clone()),
        DataType::Duration(unit) => Literal::Duration(primitive!(i64), *unit),
        DataType::Utf8 => {
            Literal::Utf8(downcast::<Utf8Array<i64>>(array)?.value(idx).to_string())
        }
        DataType::Binary => {
            Literal::Binary(downcast::<BinaryArray<i64>>(array)?.value(idx).to_vec())
        }
        DataType::List(inner) => {
            let list = downcast::<ListArray<i64>>(array)?;
            let (start, end) = list.offsets().start_end(idx);
            Literal::List(
                (start..end)
                    .map(|i| literal_at(list.values().as_ref(), inner, i))
                    .collect(),
            )
        }
        DataType::Array(inner, width) => {
            let fixed = downcast::<FixedSizeListArray>(array)?;
            Literal::Array(
                (idx * width..(idx + 1) * width)
                    .map(|i| literal_at(fixed.values().as_ref(), inner, i))
                    .collect(),
            )
        }
        DataType::Struct(fields) => {
            let children = downcast::<StructArray>(array)?.values();
            Literal::Struct(
                fields
                    .iter()
                    .zip(children)
                    .map(|(field, child)| {
                        (
                            field.name.clone(),
                            literal_at(child.as_ref(), &field.dtype, idx),
                        )
                    })
                    .collect(),
            )
        }
        DataType::Categorical => {
            let dict = downcast::<DictionaryArray<u32>>(array)?;
            let categories = downcast::<Utf8Array<i64>>(dict.values().as_ref())?;
            Literal::Categorical(categories.value(dict.key_value(idx)).to_string())
        }
    };
    Some(lit)
}
