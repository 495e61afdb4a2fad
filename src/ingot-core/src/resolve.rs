use common_error::{IngotError, IngotResult, TypeMismatchError};

use crate::{
    cast::{can_cast, can_cast_strict},
    datatypes::DataType,
    lit::Literal,
    normalize::{normalize, supertype, Normalized},
    raw::RawValue,
};

/// Adds the offending value and its position to a `TypeMismatch`, keeping the first one.
fn annotate(err: IngotError, value: &Literal, position: usize) -> IngotError {
    match err {
        IngotError::TypeMismatch(mut mismatch) if mismatch.value.is_none() => {
            mismatch.value = Some(value.to_string());
            mismatch.position = Some(position);
            IngotError::TypeMismatch(mismatch)
        }
        other => other,
    }
}

/// Computes the dtype of a column from its normalized values.
///
/// Without a declared dtype, the inferred dtypes are folded left to right with the strict or
/// lossy supertype, stopping at the first value that cannot be unified. With a declared
/// dtype, every value's dtype must be convertible to it; the per-value conversion itself
/// happens later.
pub fn resolve_dtype(
    values: &[Normalized],
    declared: Option<&DataType>,
    strict: bool,
) -> IngotResult<DataType> {
    match declared {
        Some(declared) => {
            declared.validate()?;
            let compatible = if strict { can_cast_strict } else { can_cast };
            for (position, normalized) in values.iter().enumerate() {
                if !compatible(&normalized.dtype, declared) {
                    return Err(TypeMismatchError::declared(declared, &normalized.dtype)
                        .with_value(&normalized.value, position)
                        .into());
                }
            }
            Ok(declared.clone())
        }
        None => values
            .iter()
            .enumerate()
            .try_fold(DataType::Null, |acc, (position, normalized)| {
                supertype(&acc, &normalized.dtype, strict)
                    .map_err(|err| annotate(err, &normalized.value, position))
            }),
    }
}

/// Predicts the dtype a column built from `values` would get, without materializing it.
pub fn infer_dtype(
    values: &[RawValue],
    declared: Option<&DataType>,
    strict: bool,
) -> IngotResult<DataType> {
    let normalized = values
        .iter()
        .map(|raw| normalize(raw, strict))
        .collect::<IngotResult<Vec<_>>>()?;
    resolve_dtype(&normalized, declared, strict)
}

#[cfg(test)]
mod tests {
    use common_error::{ErrorKind, MismatchKind};
    use rstest::rstest;

    use super::*;
    use crate::{datatypes::TimeUnit, raw};

    #[rstest]
    #[case(raw![1, 2, 3], DataType::Int64)]
    #[case(raw![null, null], DataType::Null)]
    #[case(raw![null, "a"], DataType::Utf8)]
    #[case(raw![[1], [], null], DataType::list(DataType::Int64))]
    fn unifies_homogeneous_input(#[case] values: Vec<RawValue>, #[case] expected: DataType) {
        assert_eq!(infer_dtype(&values, None, true).unwrap(), expected);
    }

    #[test]
    fn strict_mixed_numbers_report_types_and_value() {
        let err = infer_dtype(&raw![1, 2, 3.5], None, true).unwrap_err();
        match &err {
            IngotError::TypeMismatch(mismatch) => {
                assert_eq!(mismatch.kind, MismatchKind::Unification);
                assert_eq!(mismatch.left, "Int64");
                assert_eq!(mismatch.right, "Float64");
                assert_eq!(mismatch.value.as_deref(), Some("3.5"));
                assert_eq!(mismatch.position, Some(2));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[rstest]
    #[case(raw![1, 2, 3.5], DataType::Float64)]
    #[case(raw![1, "a"], DataType::Utf8)]
    #[case(raw![[1], [2.5]], DataType::list(DataType::Float64))]
    fn non_strict_falls_back(#[case] values: Vec<RawValue>, #[case] expected: DataType) {
        assert_eq!(infer_dtype(&values, None, false).unwrap(), expected);
    }

    #[test]
    fn scalar_and_nested_never_unify() {
        let err = infer_dtype(&raw![1, [2]], None, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("at index 1"));
    }

    #[test]
    fn declared_dtype_checks_compatibility() {
        let declared = DataType::Int8;
        assert_eq!(
            infer_dtype(&raw![1, 2, 3.5], Some(&declared), true).unwrap(),
            declared
        );
        let err = infer_dtype(&raw![1, "a"], Some(&declared), true).unwrap_err();
        match err {
            IngotError::TypeMismatch(mismatch) => {
                assert_eq!(mismatch.kind, MismatchKind::Declared);
                assert_eq!(mismatch.position, Some(1));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(
            infer_dtype(&raw![1, "2"], Some(&declared), false).unwrap(),
            declared
        );
        assert!(infer_dtype(&raw![[1]], Some(&declared), false).is_err());
    }

    #[test]
    fn declared_dtype_is_validated() {
        let bad = DataType::Datetime(TimeUnit::Milliseconds, Some("Nowhere/Special".to_string()));
        assert_eq!(
            infer_dtype(&raw![null], Some(&bad), true).unwrap_err().kind(),
            ErrorKind::ValueError
        );
    }
}
