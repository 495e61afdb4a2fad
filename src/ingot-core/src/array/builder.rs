use std::sync::Arc;

use arrow2::{
    array::{
        Array, FixedSizeListArray, ListArray, MutableArray, MutableBinaryArray,
        MutableBooleanArray, MutableDictionaryArray, MutablePrimitiveArray, MutableUtf8Array,
        NullArray, StructArray, TryPush,
    },
    bitmap::{Bitmap, MutableBitmap},
    datatypes::DataType as ArrowType,
    offset::Offsets,
};
use common_error::{IngotError, IngotResult};

use crate::{
    datatypes::{DataType, Field},
    lit::Literal,
    series::Series,
};

enum Values {
    Null(usize),
    Boolean(MutableBooleanArray),
    Int8(MutablePrimitiveArray<i8>),
    Int16(MutablePrimitiveArray<i16>),
    Int32(MutablePrimitiveArray<i32>),
    Int64(MutablePrimitiveArray<i64>),
    UInt8(MutablePrimitiveArray<u8>),
    UInt16(MutablePrimitiveArray<u16>),
    UInt32(MutablePrimitiveArray<u32>),
    UInt64(MutablePrimitiveArray<u64>),
    Float32(MutablePrimitiveArray<f32>),
    Float64(MutablePrimitiveArray<f64>),
    Decimal(MutablePrimitiveArray<i128>),
    Date(MutablePrimitiveArray<i32>),
    Datetime(MutablePrimitiveArray<i64>),
    Duration(MutablePrimitiveArray<i64>),
    Utf8(MutableUtf8Array<i64>),
    Binary(MutableBinaryArray<i64>),
    List {
        offsets: Offsets<i64>,
        validity: MutableBitmap,
        child: Box<ArrayBuilder>,
    },
    Array {
        width: usize,
        validity: MutableBitmap,
        child: Box<ArrayBuilder>,
    },
    Struct {
        validity: MutableBitmap,
        children: Vec<ArrayBuilder>,
    },
    Categorical(MutableDictionaryArray<u32, MutableUtf8Array<i64>>),
}

fn primitive<T: arrow2::types::NativeType>(
    capacity: usize,
    arrow_type: ArrowType,
) -> MutablePrimitiveArray<T> {
    MutablePrimitiveArray::with_capacity_from(capacity, arrow_type)
}

/// `None` when every slot is valid.
fn finish_validity(validity: MutableBitmap) -> Option<Bitmap> {
    let validity: Bitmap = validity.into();
    (validity.unset_bits() > 0).then_some(validity)
}

/// Appends literals of one dtype into arrow2 mutable arrays.
///
/// Every pushed literal must already have the builder's dtype; the caster is responsible for
/// producing such literals.
pub struct ArrayBuilder {
    field: Field,
    arrow_type: ArrowType,
    values: Values,
}

impl ArrayBuilder {
    pub fn new(name: &str, dtype: &DataType, capacity: usize) -> IngotResult<Self> {
        let arrow_type = dtype.to_arrow()?;
        let values = match dtype {
            DataType::Null => Values::Null(0),
            DataType::Boolean => Values::Boolean(MutableBooleanArray::with_capacity(capacity)),
            DataType::Int8 => Values::Int8(primitive(capacity, arrow_type.clone())),
            DataType::Int16 => Values::Int16(primitive(capacity, arrow_type.clone())),
            DataType::Int32 => Values::Int32(primitive(capacity, arrow_type.clone())),
            DataType::Int64 => Values::Int64(primitive(capacity, arrow_type.clone())),
            DataType::UInt8 => Values::UInt8(primitive(capacity, arrow_type.clone())),
            DataType::UInt16 => Values::UInt16(primitive(capacity, arrow_type.clone())),
            DataType::UInt32 => Values::UInt32(primitive(capacity, arrow_type.clone())),
            DataType::UInt64 => Values::UInt64(primitive(capacity, arrow_type.clone())),
            DataType::Float32 => Values::Float32(primitive(capacity, arrow_type.clone())),
            DataType::Float64 => Values::Float64(primitive(capacity, arrow_type.clone())),
            DataType::Decimal(..) => Values::Decimal(primitive(capacity, arrow_type.clone())),
            DataType::Date => Values::Date(primitive(capacity, arrow_type.clone())),
            DataType::Datetime(..) => Values::Datetime(primitive(capacity, arrow_type.clone())),
            DataType::Duration(_) => Values::Duration(primitive(capacity, arrow_type.clone())),
            DataType::Utf8 => Values::Utf8(MutableUtf8Array::with_capacity(capacity)),
            DataType::Binary => Values::Binary(MutableBinaryArray::with_capacity(capacity)),
            DataType::List(inner) => Values::List {
                offsets: Offsets::with_capacity(capacity),
                validity: MutableBitmap::with_capacity(capacity),
                child: Box::new(Self::new("item", inner, capacity)?),
            },
            DataType::Array(inner, width) => Values::Array {
                width: *width,
                validity: MutableBitmap::with_capacity(capacity),
                child: Box::new(Self::new("item", inner, capacity * width)?),
            },
            DataType::Struct(fields) => Values::Struct {
                validity: MutableBitmap::with_capacity(capacity),
                children: fields
                    .iter()
                    .map(|f| Self::new(&f.name, &f.dtype, capacity))
                    .collect::<IngotResult<Vec<_>>>()?,
            },
            DataType::Categorical => Values::Categorical(MutableDictionaryArray::new()),
        };
        Ok(Self {
            field: Field::new(name, dtype.clone()),
            arrow_type,
            values,
        })
    }

    pub fn len(&self) -> usize {
        match &self.values {
            Values::Null(len) => *len,
            Values::Boolean(v) => v.len(),
            Values::Int8(v) => v.len(),
            Values::Int16(v) => v.len(),
            Values::Int32(v) | Values::Date(v) => v.len(),
            Values::Int64(v) | Values::Datetime(v) | Values::Duration(v) => v.len(),
            Values::UInt8(v) => v.len(),
            Values::UInt16(v) => v.len(),
            Values::UInt32(v) => v.len(),
            Values::UInt64(v) => v.len(),
            Values::Float32(v) => v.len(),
            Values::Float64(v) => v.len(),
            Values::Decimal(v) => v.len(),
            Values::Utf8(v) => v.len(),
            Values::Binary(v) => v.len(),
            Values::List { validity, .. }
            | Values::Array { validity, .. }
            | Values::Struct { validity, .. } => validity.len(),
            Values::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_null(&mut self) {
        match &mut self.values {
            Values::Null(len) => *len += 1,
            Values::Boolean(v) => v.push_null(),
            Values::Int8(v) => v.push_null(),
            Values::Int16(v) => v.push_null(),
            Values::Int32(v) | Values::Date(v) => v.push_null(),
            Values::Int64(v) | Values::Datetime(v) | Values::Duration(v) => v.push_null(),
            Values::UInt8(v) => v.push_null(),
            Values::UInt16(v) => v.push_null(),
            Values::UInt32(v) => v.push_null(),
            Values::UInt64(v) => v.push_null(),
            Values::Float32(v) => v.push_null(),
            Values::Float64(v) => v.push_null(),
            Values::Decimal(v) => v.push_null(),
            Values::Utf8(v) => v.push_null(),
            Values::Binary(v) => v.push_null(),
            Values::List {
                offsets, validity, ..
            } => {
                offsets.extend_constant(1);
                validity.push(false);
            }
            Values::Array {
                width,
                validity,
                child,
            } => {
                for _ in 0..*width {
                    child.push_null();
                }
                validity.push(false);
            }
            Values::Struct { validity, children } => {
                children.iter_mut().for_each(Self::push_null);
                validity.push(false);
            }
            Values::Categorical(v) => v.push_null(),
        }
    }

    pub fn push(&mut self, lit: &Literal) -> IngotResult<()> {
        if lit.is_null() {
            self.push_null();
            return Ok(());
        }
        match (&mut self.values, lit) {
            (Values::Boolean(v), Literal::Boolean(x)) => v.push(Some(*x)),
            (Values::Int8(v), Literal::Int8(x)) => v.push(Some(*x)),
            (Values::Int16(v), Literal::Int16(x)) => v.push(Some(*x)),
            (Values::Int32(v), Literal::Int32(x)) => v.push(Some(*x)),
            (Values::Int64(v), Literal::Int64(x)) => v.push(Some(*x)),
            (Values::UInt8(v), Literal::UInt8(x)) => v.push(Some(*x)),
            (Values::UInt16(v), Literal::UInt16(x)) => v.push(Some(*x)),
            (Values::UInt32(v), Literal::UInt32(x)) => v.push(Some(*x)),
            (Values::UInt64(v), Literal::UInt64(x)) => v.push(Some(*x)),
            (Values::Float32(v), Literal::Float32(x)) => v.push(Some(*x)),
            (Values::Float64(v), Literal::Float64(x)) => v.push(Some(*x)),
            (Values::Decimal(v), Literal::Decimal(mantissa, ..)) => v.push(Some(*mantissa)),
            (Values::Date(v), Literal::Date(days)) => v.push(Some(*days)),
            (Values::Datetime(v), Literal::Datetime(x, ..)) => v.push(Some(*x)),
            (Values::Duration(v), Literal::Duration(x, _)) => v.push(Some(*x)),
            (Values::Utf8(v), Literal::Utf8(s)) => v.push(Some(s)),
            (Values::Binary(v), Literal::Binary(bytes)) => v.push(Some(bytes)),
            (
                Values::List {
                    offsets,
                    validity,
                    child,
                },
                Literal::List(items) | Literal::Array(items),
            ) => {
                child.extend(items)?;
                offsets.try_push_usize(items.len())?;
                validity.push(true);
            }
            (
                Values::Array {
                    width,
                    validity,
                    child,
                },
                Literal::Array(items) | Literal::List(items),
            ) if items.len() == *width => {
                child.extend(items)?;
                validity.push(true);
            }
            (Values::Struct { validity, children }, Literal::Struct(fields)) => {
                for child in children.iter_mut() {
                    match fields.get(&child.field.name) {
                        Some(value) => child.push(value)?,
                        None => child.push_null(),
                    }
                }
                validity.push(true);
            }
            (Values::Categorical(v), Literal::Categorical(s)) => v.try_push(Some(s.as_str()))?,
            _ => {
                return Err(IngotError::InternalError(format!(
                    "cannot append {lit} to a column of type `{}`",
                    self.field.dtype
                )));
            }
        }
        Ok(())
    }

    pub fn extend<'a>(&mut self, lits: impl IntoIterator<Item = &'a Literal>) -> IngotResult<()> {
        lits.into_iter().try_for_each(|lit| self.push(lit))
    }

    fn finish_array(self) -> IngotResult<Box<dyn Array>> {
        let arrow_type = self.arrow_type;
        let array: Box<dyn Array> = match self.values {
            Values::Null(len) => Box::new(NullArray::new(arrow_type, len)),
            Values::Boolean(mut v) => v.as_box(),
            Values::Int8(mut v) => v.as_box(),
            Values::Int16(mut v) => v.as_box(),
            Values::Int32(mut v) | Values::Date(mut v) => v.as_box(),
            Values::Int64(mut v) | Values::Datetime(mut v) | Values::Duration(mut v) => {
                v.as_box()
            }
            Values::UInt8(mut v) => v.as_box(),
            Values::UInt16(mut v) => v.as_box(),
            Values::UInt32(mut v) => v.as_box(),
            Values::UInt64(mut v) => v.as_box(),
            Values::Float32(mut v) => v.as_box(),
            Values::Float64(mut v) => v.as_box(),
            Values::Decimal(mut v) => v.as_box(),
            Values::Utf8(mut v) => v.as_box(),
            Values::Binary(mut v) => v.as_box(),
            Values::List {
                offsets,
                validity,
                child,
            } => Box::new(ListArray::<i64>::try_new(
                arrow_type,
                offsets.into(),
                child.finish_array()?,
                finish_validity(validity),
            )?),
            Values::Array {
                validity, child, ..
            } => Box::new(FixedSizeListArray::try_new(
                arrow_type,
                child.finish_array()?,
                finish_validity(validity),
            )?),
            Values::Struct { validity, children } => Box::new(StructArray::try_new(
                arrow_type,
                children
                    .into_iter()
                    .map(Self::finish_array)
                    .collect::<IngotResult<Vec<_>>>()?,
                finish_validity(validity),
            )?),
            Values::Categorical(v) => v.into_box(),
        };
        Ok(array)
    }

    pub fn finish(self) -> IngotResult<Series> {
        let field = Arc::new(self.field.clone());
        Series::from_arrow(field, self.finish_array()?)
    }
}

#[cfg(test)]
mod tests {
    use arrow2::array::{DictionaryArray, Utf8Array};
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn nulls_keep_offsets_aligned() -> IngotResult<()> {
        let mut builder = ArrayBuilder::new("s", &DataType::Utf8, 3)?;
        builder.push(&Literal::Utf8("ab".into()))?;
        builder.push_null();
        builder.push(&Literal::Utf8("c".into()))?;
        let series = builder.finish()?;
        assert_eq!(series.len(), 3);
        assert_eq!(series.null_count(), 1);
        let strings = series
            .data()
            .as_any()
            .downcast_ref::<Utf8Array<i64>>()
            .unwrap();
        assert_eq!(strings.offsets().as_slice(), &[0, 2, 2, 3]);
        assert_eq!(strings.values().as_slice(), b"abc");
        Ok(())
    }

    #[test]
    fn no_nulls_means_no_bitmap() -> IngotResult<()> {
        let mut builder = ArrayBuilder::new("i", &DataType::Int64, 2)?;
        builder.extend(&[Literal::Int64(1), Literal::Int64(2)])?;
        assert!(builder.finish()?.validity().is_none());
        Ok(())
    }

    #[test]
    fn fixed_width_rows_pad_nulls() -> IngotResult<()> {
        let mut builder = ArrayBuilder::new("a", &DataType::array(DataType::Int8, 2), 2)?;
        builder.push(&Literal::Array(vec![Literal::Int8(1), Literal::Int8(2)]))?;
        builder.push_null();
        let series = builder.finish()?;
        let fixed = series
            .data()
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .unwrap();
        assert_eq!(fixed.values().len(), 4);
        assert_eq!(series.null_count(), 1);
        Ok(())
    }

    #[test]
    fn fixed_width_rows_reject_other_lengths() -> IngotResult<()> {
        let mut builder = ArrayBuilder::new("a", &DataType::array(DataType::Int8, 2), 1)?;
        assert!(builder
            .push(&Literal::Array(vec![Literal::Int8(1)]))
            .is_err());
        Ok(())
    }

    #[test]
    fn struct_children_follow_field_names() -> IngotResult<()> {
        let dtype = DataType::Struct(vec![
            Field::new("x", DataType::Int64),
            Field::new("y", DataType::Utf8),
        ]);
        let mut builder = ArrayBuilder::new("st", &dtype, 1)?;
        builder.push(&Literal::Struct(IndexMap::from([(
            "y".to_string(),
            Literal::Utf8("v".into()),
        )])))?;
        let series = builder.finish()?;
        assert_eq!(
            series.get_lit(0),
            Literal::Struct(IndexMap::from([
                ("x".to_string(), Literal::Null),
                ("y".to_string(), Literal::Utf8("v".into())),
            ]))
        );
        Ok(())
    }

    #[test]
    fn categories_are_deduplicated() -> IngotResult<()> {
        let mut builder = ArrayBuilder::new("c", &DataType::Categorical, 3)?;
        for s in ["a", "b", "a"] {
            builder.push(&Literal::Categorical(s.to_string()))?;
        }
        let series = builder.finish()?;
        let dict = series
            .data()
            .as_any()
            .downcast_ref::<DictionaryArray<u32>>()
            .unwrap();
        assert_eq!(dict.keys().values().as_slice(), &[0, 1, 0]);
        assert_eq!(dict.values().len(), 2);
        assert_eq!(series.get_lit(2), Literal::Categorical("a".to_string()));
        Ok(())
    }

    #[test]
    fn storage_type_matches_the_dtype() -> IngotResult<()> {
        let dtype = DataType::list(DataType::Decimal(5, 2));
        let mut builder = ArrayBuilder::new("l", &dtype, 2)?;
        builder.push(&Literal::List(vec![Literal::Decimal(125, 5, 2)]))?;
        builder.push_null();
        let series = builder.finish()?;
        assert_eq!(series.data().data_type(), &dtype.to_arrow()?);
        assert_eq!(
            series.get_lit(0),
            Literal::List(vec![Literal::Decimal(125, 5, 2)])
        );
        assert_eq!(series.get_lit(1), Literal::Null);
        Ok(())
    }
}
