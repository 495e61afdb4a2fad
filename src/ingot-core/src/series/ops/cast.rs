use common_error::{IngotError, IngotResult, TypeMismatchError};
use common_ingest_config::IngestConfig;

use crate::{
    cast::can_cast,
    datatypes::{widest_common, DataType},
    series::{from::materialize, Series},
};

impl Series {
    /// Converts every value to `dtype` under `config`.
    ///
    /// A dtype pair with no conversion at all is a `TypeMismatch` in either mode. Otherwise a
    /// strict cast fails with an aggregated `InvalidConversion` if any value is inexact, and a
    /// non-strict cast turns such values into nulls.
    pub fn cast_with_options(&self, dtype: &DataType, config: &IngestConfig) -> IngotResult<Self> {
        if self.data_type() == dtype {
            return Ok(self.clone());
        }
        dtype.validate()?;
        if !can_cast(self.data_type(), dtype) {
            return Err(IngotError::from(TypeMismatchError::declared(
                dtype,
                self.data_type(),
            ))
            .with_column(self.name()));
        }
        let values = self.lits().collect::<Vec<_>>();
        materialize(self.name(), &values, Some(self.data_type()), dtype, config)
    }

    pub fn cast(&self, dtype: &DataType) -> IngotResult<Self> {
        self.cast_with_options(dtype, &IngestConfig::non_strict())
    }

    pub fn strict_cast(&self, dtype: &DataType) -> IngotResult<Self> {
        self.cast_with_options(dtype, &IngestConfig::strict())
    }
}

/// Casts all columns to the narrowest dtype that holds each of them.
pub fn cast_series_to_supertype(series: &[&Series]) -> IngotResult<Vec<Series>> {
    let mut supertype = DataType::Null;
    for s in series {
        supertype = widest_common(&supertype, s.data_type()).ok_or_else(|| {
            IngotError::from(TypeMismatchError::unification(&supertype, s.data_type()))
                .with_column(s.name())
        })?;
    }
    series.iter().map(|s| s.strict_cast(&supertype)).collect()
}
