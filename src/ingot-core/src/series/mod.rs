mod from;
mod ops;

use std::sync::Arc;

use arrow2::{
    array::{Array, PrimitiveArray},
    bitmap::Bitmap,
    types::NativeType,
};
use common_display::table_display::{comfy_table, make_comfy_table, StrValue};
use common_error::{IngotError, IngotResult};
use derive_more::Display;
pub use ops::cast_series_to_supertype;

use crate::{
    array::{literal_at, ArrayBuilder},
    cast::string::render_plain,
    datatypes::{DataType, Field, FieldRef},
    lit::Literal,
};

const MAX_DISPLAY_COL_WIDTH: usize = 80;

/// A named, immutable column backed by an arrow array of the dtype's storage type.
///
/// Operations never mutate a `Series`; they return a new one.
#[derive(Clone, Debug, PartialEq, Display)]
#[display("{}\n", self.to_comfy_table())]
pub struct Series {
    field: FieldRef,
    data: Box<dyn Array>,
}

impl Series {
    /// Wraps an arrow array. Its arrow type must be the storage type of `field`'s dtype.
    pub fn from_arrow<F: Into<FieldRef>>(field: F, data: Box<dyn Array>) -> IngotResult<Self> {
        let field = field.into();
        let expected = field.dtype.to_arrow()?;
        if &expected != data.data_type() {
            return Err(IngotError::SchemaMismatch(format!(
                "column '{}' of type `{}` expects arrow type {expected:?}, got {:?}",
                field.name,
                field.dtype,
                data.data_type()
            )));
        }
        Ok(Self { field, data })
    }

    /// Same field, new storage of the same arrow type.
    pub(crate) fn with_data(&self, data: Box<dyn Array>) -> Self {
        Self {
            field: self.field.clone(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.field.dtype
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data(&self) -> &dyn Array {
        self.data.as_ref()
    }

    /// `None` when the column has no nulls.
    pub fn validity(&self) -> Option<&Bitmap> {
        self.data.validity()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        !self.data_type().is_null() && self.data.is_valid(idx)
    }

    pub fn null_count(&self) -> usize {
        if self.data_type().is_null() {
            return self.len();
        }
        self.data.null_count()
    }

    #[must_use]
    pub fn rename<S: AsRef<str>>(&self, name: S) -> Self {
        Self {
            field: Arc::new(self.field.rename(name.as_ref())),
            data: self.data.clone(),
        }
    }

    pub fn full_null(name: &str, dtype: &DataType, length: usize) -> IngotResult<Self> {
        let data = arrow2::array::new_null_array(dtype.to_arrow()?, length);
        Self::from_arrow(Field::new(name, dtype.clone()), data)
    }

    pub fn empty(name: &str, dtype: &DataType) -> IngotResult<Self> {
        let data = arrow2::array::new_empty_array(dtype.to_arrow()?);
        Self::from_arrow(Field::new(name, dtype.clone()), data)
    }

    /// Builds a column from literals that already have type `dtype` (or are null).
    pub fn from_literals(name: &str, dtype: &DataType, values: &[Literal]) -> IngotResult<Self> {
        let mut builder = ArrayBuilder::new(name, dtype, values.len())?;
        builder.extend(values)?;
        builder.finish()
    }

    /// The primitive buffer backing this column. Slots under nulls hold default values.
    pub fn try_as_slice<T: NativeType>(&self) -> IngotResult<&[T]> {
        self.data
            .as_any()
            .downcast_ref::<PrimitiveArray<T>>()
            .map(|array| array.values().as_slice())
            .ok_or_else(|| {
                IngotError::ValueError(format!(
                    "column '{}' of type `{}` is not backed by a `{}` buffer",
                    self.name(),
                    self.data_type(),
                    std::any::type_name::<T>()
                ))
            })
    }

    /// The value at `idx`, or `Literal::Null` for a null slot.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn get_lit(&self, idx: usize) -> Literal {
        assert!(
            idx < self.len(),
            "index {idx} is out of bounds for column of length {}",
            self.len()
        );
        literal_at(self.data.as_ref(), self.data_type(), idx)
    }

    pub fn lits(&self) -> impl Iterator<Item = Literal> + '_ {
        (0..self.len()).map(|idx| self.get_lit(idx))
    }

    pub fn to_comfy_table(&self) -> comfy_table::Table {
        let header = format!("{}\n---\n{}", self.name(), self.data_type());
        make_comfy_table(
            &[header],
            Some(&[self as &dyn StrValue]),
            Some(self.len()),
            Some(MAX_DISPLAY_COL_WIDTH),
        )
    }
}

impl StrValue for Series {
    fn str_value(&self, idx: usize) -> String {
        render_plain(&self.get_lit(idx))
    }
}
