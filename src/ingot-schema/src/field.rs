use std::sync::Arc;

use arrow2::datatypes::Field as ArrowField;
use common_error::IngotResult;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::dtype::DataType;

pub type FieldRef = Arc<Field>;

#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{name}#{dtype}")]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }

    #[must_use]
    pub fn rename<S: Into<String>>(&self, name: S) -> Self {
        Self {
            name: name.into(),
            dtype: self.dtype.clone(),
        }
    }

    pub fn to_arrow(&self) -> IngotResult<ArrowField> {
        Ok(ArrowField::new(
            self.name.clone(),
            self.dtype.to_arrow()?,
            true,
        ))
    }

    #[must_use]
    pub fn with_dtype(&self, dtype: DataType) -> Self {
        Self {
            name: self.name.clone(),
            dtype,
        }
    }
}

impl From<(&str, DataType)> for Field {
    fn from((name, dtype): (&str, DataType)) -> Self {
        Self::new(name, dtype)
    }
}
