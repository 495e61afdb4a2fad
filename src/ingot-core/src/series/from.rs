use common_error::{IngotError, IngotResult};
use common_ingest_config::IngestConfig;
use rayon::prelude::*;

use super::Series;
use crate::{
    array::ArrayBuilder,
    cast::{cast_literal, report::FailureCollector},
    datatypes::DataType,
    lit::Literal,
    normalize::{normalize, Normalized},
    raw::RawValue,
    resolve::resolve_dtype,
};

/// Maps `f` over `items`, splitting into chunks processed in parallel when the input is longer
/// than `chunk_size`. Output order matches input order.
pub(crate) fn chunked_map<T, U, F>(items: &[T], chunk_size: usize, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    if items.len() <= chunk_size {
        return items.iter().map(&f).collect();
    }
    log::debug!(
        "processing {} values in {} chunks of up to {chunk_size}",
        items.len(),
        items.len().div_ceil(chunk_size)
    );
    items
        .par_chunks(chunk_size)
        .map(|chunk| chunk.iter().map(&f).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Converts `values` to `dtype` and materializes them. Per-value failures are aggregated into
/// one `InvalidConversion` in strict mode and become nulls otherwise.
///
/// `from` names the source dtype in errors; without it the dtype of the first failing value is
/// used.
pub(crate) fn materialize(
    name: &str,
    values: &[Literal],
    from: Option<&DataType>,
    dtype: &DataType,
    config: &IngestConfig,
) -> IngotResult<Series> {
    let strict = config.strict;
    let converted = chunked_map(values, config.parallel_chunk_size.max(1), |value| {
        cast_literal(value, dtype, strict)
    });

    let mut failures = FailureCollector::new(config.error_sample_size);
    let mut builder = ArrayBuilder::new(name, dtype, values.len())?;
    for (position, (value, result)) in values.iter().zip(converted).enumerate() {
        match result {
            Ok(lit) => builder.push(&lit)?,
            Err(reason) => {
                failures.record(position, value, reason);
                builder.push_null();
            }
        }
    }

    if failures.is_empty() {
        return builder.finish();
    }
    if strict {
        let from = from
            .cloned()
            .or_else(|| failures.first_type().cloned())
            .unwrap_or(DataType::Null);
        let err = failures
            .into_error(name, &from, dtype, values.len())
            .ok_or_else(|| IngotError::InternalError("missing conversion failure".to_string()))?;
        return Err(err.into());
    }
    log::debug!(
        "{} of {} values in column '{name}' could not be converted to `{dtype}` and were set to null",
        failures.failed(),
        values.len()
    );
    builder.finish()
}

fn normalize_all(values: &[RawValue], config: &IngestConfig) -> IngotResult<Vec<Normalized>> {
    chunked_map(values, config.parallel_chunk_size.max(1), |raw| {
        normalize(raw, config.strict)
    })
    .into_iter()
    .collect()
}

impl Series {
    /// Builds a column from dynamically-typed input.
    ///
    /// Values are normalized, the column dtype is resolved (unified, or checked against
    /// `dtype` when given), and every value is converted to it. `config.strict` controls
    /// both unification and per-value conversion.
    pub fn from_values(
        name: &str,
        values: &[RawValue],
        dtype: Option<&DataType>,
        config: &IngestConfig,
    ) -> IngotResult<Self> {
        let normalized = normalize_all(values, config).map_err(|e| e.with_column(name))?;
        let resolved =
            resolve_dtype(&normalized, dtype, config.strict).map_err(|e| e.with_column(name))?;
        let literals = normalized
            .into_iter()
            .map(|n| n.value)
            .collect::<Vec<_>>();
        materialize(name, &literals, None, &resolved, config)
    }

    /// Builds a column from already-typed literals, unifying or checking their types the same
    /// way as [`Series::from_values`].
    pub fn from_typed_literals(
        name: &str,
        values: Vec<Literal>,
        dtype: Option<&DataType>,
        config: &IngestConfig,
    ) -> IngotResult<Self> {
        let raw = values.into_iter().map(RawValue::Typed).collect::<Vec<_>>();
        Self::from_values(name, &raw, dtype, config)
    }
}
