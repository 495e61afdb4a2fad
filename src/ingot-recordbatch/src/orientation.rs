use std::str::FromStr;

use common_error::IngotError;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Whether the outer axis of two-dimensional input holds rows or columns.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[display("row")]
    Row,
    #[display("col")]
    Column,
}

impl FromStr for Orientation {
    type Err = IngotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "rows" => Ok(Self::Row),
            "col" | "column" | "columns" => Ok(Self::Column),
            other => Err(IngotError::ValueError(format!(
                "orientation must be one of {{'row', 'col'}}, got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrientationDecision {
    pub orientation: Orientation,
    /// Set when the shape did not determine the orientation and the column default was used.
    pub warning: Option<String>,
}

impl OrientationDecision {
    fn decided(orientation: Orientation) -> Self {
        Self {
            orientation,
            warning: None,
        }
    }
}

/// Decides the layout of input with `outer` elements of `inner` values each.
///
/// Only shape and schema width are consulted, never the values themselves. An explicit
/// orientation always wins; otherwise the axis whose length matches the schema width (and the
/// other axis does not) holds the columns. Anything else falls back to column orientation
/// with a warning.
pub fn resolve_orientation(
    outer: usize,
    inner: usize,
    schema_len: Option<usize>,
    explicit: Option<Orientation>,
) -> OrientationDecision {
    if let Some(orientation) = explicit {
        return OrientationDecision::decided(orientation);
    }
    match schema_len {
        Some(n) if inner == n && outer != n => {
            return OrientationDecision::decided(Orientation::Row);
        }
        Some(n) if outer == n && inner != n => {
            return OrientationDecision::decided(Orientation::Column);
        }
        _ => {}
    }

    let warning = format!(
        "Orientation of {outer}x{inner} input is ambiguous{}; defaulting to column orientation. \
         Pass an explicit orientation ('row' or 'col') to silence this warning",
        schema_len.map_or_else(
            || " without a schema".to_string(),
            |n| format!(" for a schema of {n} columns")
        )
    );
    log::warn!("{warning}");
    OrientationDecision {
        orientation: Orientation::Column,
        warning: Some(warning),
    }
}
