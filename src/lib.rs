//! Typed ingestion and casting of dynamically-typed values into columns and record batches.
//!
//! Raw input ([`RawValue`]) is normalized into [`Literal`]s, a column dtype is resolved (by
//! unification or against a declared dtype) and the values are materialized into a [`Series`].
//! [`RecordBatch`] assembles equal-length columns from dict, row, grid or record input.

pub use common_error::{ConversionError, ErrorKind, IngotError, IngotResult, TypeMismatchError};
pub use common_ingest_config::IngestConfig;
pub use ingot_core::{prelude::*, raw};
pub use ingot_recordbatch::{
    resolve_orientation, Orientation, OrientationDecision, RecordBatch, SchemaDefinition,
    TableOptions,
};

pub fn version() -> &'static str {
    ingot_core::VERSION
}
