//! Prelude for ingot core
//!
//! Re-exports the items most callers need to build and cast columns.

pub use crate::{
    array::ArrayBuilder,
    cast::{can_cast, can_cast_strict, cast_literal},
    datatypes::*,
    lit::Literal,
    normalize::{normalize, Normalized},
    raw::RawValue,
    resolve::{infer_dtype, resolve_dtype},
    series::{cast_series_to_supertype, Series},
};
