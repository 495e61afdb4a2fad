use std::fmt::{Display, Formatter};

use thiserror::Error;

pub type IngotResult<T> = std::result::Result<T, IngotError>;

const NON_STRICT_HINT: &str = "hint: pass the non-strict option to allow mixed types";
const NULL_ON_FAILURE_HINT: &str =
    "hint: pass the non-strict option to replace values that cannot be converted with null";

#[derive(Debug, Error)]
pub enum IngotError {
    #[error("{0}")]
    TypeMismatch(Box<TypeMismatchError>),
    #[error("{0}")]
    InvalidConversion(Box<ConversionError>),
    #[error("{0}")]
    SchemaMismatch(String),
    #[error("{0}")]
    ShapeError(String),
    #[error("{0}")]
    ValueError(String),
    #[error("{0}")]
    FieldNotFound(String),
    #[error("{0:?}")]
    ArrowError(#[from] arrow2::error::Error),
    #[error("{0}")]
    InternalError(String),
}

/// The failure taxonomy callers branch on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    InvalidConversion,
    SchemaMismatch,
    ShapeError,
    ValueError,
    FieldNotFound,
    InternalError,
}

impl IngotError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::InvalidConversion(_) => ErrorKind::InvalidConversion,
            Self::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            Self::ShapeError(_) => ErrorKind::ShapeError,
            Self::ValueError(_) => ErrorKind::ValueError,
            Self::FieldNotFound(_) => ErrorKind::FieldNotFound,
            Self::ArrowError(_) | Self::InternalError(_) => ErrorKind::InternalError,
        }
    }

    /// Attaches a column name to the structured variants that don't carry one yet.
    #[must_use]
    pub fn with_column(self, name: &str) -> Self {
        match self {
            Self::TypeMismatch(mut err) => {
                if err.column.is_none() {
                    err.column = Some(name.to_string());
                }
                Self::TypeMismatch(err)
            }
            Self::InvalidConversion(mut err) => {
                if err.column.is_empty() {
                    err.column = name.to_string();
                }
                Self::InvalidConversion(err)
            }
            other => other,
        }
    }
}

impl From<TypeMismatchError> for IngotError {
    fn from(err: TypeMismatchError) -> Self {
        Self::TypeMismatch(Box::new(err))
    }
}

impl From<ConversionError> for IngotError {
    fn from(err: ConversionError) -> Self {
        Self::InvalidConversion(Box::new(err))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchKind {
    /// Two inferred types had no common supertype.
    Unification,
    /// An inferred type has no conversion into the declared type.
    Declared,
}

/// Two or more incomparable types met during construction.
///
/// For [`MismatchKind::Unification`], `left` is the type accumulated so far and `right` the type
/// of the offending value. For [`MismatchKind::Declared`], `left` is the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeMismatchError {
    pub kind: MismatchKind,
    pub column: Option<String>,
    pub left: String,
    pub right: String,
    pub value: Option<String>,
    pub position: Option<usize>,
}

impl TypeMismatchError {
    pub fn unification(left: impl Display, right: impl Display) -> Self {
        Self {
            kind: MismatchKind::Unification,
            column: None,
            left: left.to_string(),
            right: right.to_string(),
            value: None,
            position: None,
        }
    }

    pub fn declared(declared: impl Display, found: impl Display) -> Self {
        Self {
            kind: MismatchKind::Declared,
            column: None,
            left: declared.to_string(),
            right: found.to_string(),
            value: None,
            position: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Display, position: usize) -> Self {
        self.value = Some(value.to_string());
        self.position = Some(position);
        self
    }
}

impl Display for TypeMismatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MismatchKind::Unification => write!(
                f,
                "mixed types cannot be unified: found `{}` and `{}`",
                self.left, self.right
            )?,
            MismatchKind::Declared => write!(
                f,
                "values of type `{}` cannot be converted to the declared type `{}`",
                self.right, self.left
            )?,
        }
        if let Some(column) = &self.column {
            write!(f, " in column '{column}'")?;
        }
        match (&self.value, self.position) {
            (Some(value), Some(position)) => {
                write!(f, "; offending value {value} at index {position}")?;
            }
            (Some(value), None) => write!(f, "; offending value {value}")?,
            _ => {}
        }
        let hint = match self.kind {
            MismatchKind::Unification => NON_STRICT_HINT,
            MismatchKind::Declared => NULL_ON_FAILURE_HINT,
        };
        write!(f, "\n\n{hint}")
    }
}

/// Some values of a batch could not be represented exactly in the target type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionError {
    pub column: String,
    pub from: String,
    pub to: String,
    pub failed: usize,
    pub total: usize,
    /// Bounded `(position, rendered value)` sample of the failures, in input order.
    pub sample: Vec<(usize, String)>,
    /// Why the first failing value could not be converted.
    pub reason: String,
}

impl ConversionError {
    pub fn first_position(&self) -> Option<usize> {
        self.sample.first().map(|(idx, _)| *idx)
    }

    pub fn sample_values(&self) -> Vec<&str> {
        self.sample.iter().map(|(_, v)| v.as_str()).collect()
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "conversion from `{}` to `{}` failed", self.from, self.to)?;
        if !self.column.is_empty() {
            write!(f, " in column '{}'", self.column)?;
        }
        let values = self.sample_values().join(", ");
        let ellipsis = if self.failed > self.sample.len() {
            ", ..."
        } else {
            ""
        };
        write!(
            f,
            " for {} out of {} values: [{values}{ellipsis}]",
            self.failed, self.total
        )?;
        if let Some(position) = self.first_position() {
            write!(f, "\nfirst failure at index {position}: {}", self.reason)?;
        }
        write!(f, "\n\n{NULL_ON_FAILURE_HINT}")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn type_mismatch_names_both_types_and_value() {
        let err: IngotError = TypeMismatchError::unification("Int64", "Float64")
            .with_value("3.5", 2)
            .into();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        let msg = err.to_string();
        assert!(msg.starts_with("mixed types cannot be unified: found `Int64` and `Float64`"));
        assert!(msg.contains("offending value 3.5 at index 2"));
        assert!(msg.ends_with(NON_STRICT_HINT));
    }

    #[test]
    fn conversion_error_lists_counts_and_sample() {
        let err = ConversionError {
            column: "a".to_string(),
            from: "Int64".to_string(),
            to: "UInt8".to_string(),
            failed: 1,
            total: 3,
            sample: vec![(2, "300".to_string())],
            reason: "value is out of range for `UInt8`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("conversion from `Int64` to `UInt8` failed in column 'a'"));
        assert!(msg.contains("for 1 out of 3 values: [300]"));
        assert!(msg.contains("first failure at index 2"));
        assert_eq!(err.first_position(), Some(2));
    }

    #[rstest]
    #[case(3, "[1, 2, ...]")]
    #[case(2, "[1, 2]")]
    fn conversion_error_marks_truncated_samples(#[case] failed: usize, #[case] expected: &str) {
        let err = ConversionError {
            column: String::new(),
            from: "String".to_string(),
            to: "Int64".to_string(),
            failed,
            total: 5,
            sample: vec![(0, "1".to_string()), (1, "2".to_string())],
            reason: "not a number".to_string(),
        };
        assert!(err.to_string().contains(expected));
    }

    #[test]
    fn with_column_fills_missing_names_only() {
        let err: IngotError = TypeMismatchError::unification("Int64", "String").into();
        let err = err.with_column("x").with_column("y");
        match err {
            IngotError::TypeMismatch(inner) => assert_eq!(inner.column.as_deref(), Some("x")),
            other => panic!("unexpected error {other}"),
        }
    }
}
