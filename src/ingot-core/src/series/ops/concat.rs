use arrow2::{
    array::{new_null_array, Array},
    compute::concatenate::concatenate,
};
use common_error::{IngotError, IngotResult, TypeMismatchError};

use crate::{datatypes::DataType, series::Series};

impl Series {
    /// Appends columns of one dtype. All-null (`Null`-typed) columns adopt the common dtype.
    pub fn concat(series: &[&Self]) -> IngotResult<Self> {
        match series {
            [] => Err(IngotError::ValueError(
                "Need at least 1 series to perform concat".to_string(),
            )),
            [single_series] => Ok((*single_series).clone()),
            [first, ..] => {
                let dtype = series
                    .iter()
                    .map(|s| s.data_type())
                    .find(|dtype| !dtype.is_null())
                    .unwrap_or(&DataType::Null);
                let arrow_type = dtype.to_arrow()?;
                let mut arrays = Vec::with_capacity(series.len());
                for s in series {
                    if s.data_type().is_null() {
                        arrays.push(new_null_array(arrow_type.clone(), s.len()));
                    } else if s.data_type() != dtype {
                        return Err(IngotError::from(TypeMismatchError::unification(
                            dtype,
                            s.data_type(),
                        ))
                        .with_column(first.name()));
                    } else {
                        arrays.push(s.data().to_boxed());
                    }
                }
                let arrays = arrays.iter().map(AsRef::as_ref).collect::<Vec<&dyn Array>>();
                let field = first.field().with_dtype(dtype.clone());
                Self::from_arrow(field, concatenate(&arrays)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use common_error::ErrorKind;
    use common_ingest_config::IngestConfig;

    use super::*;
    use crate::{lit::Literal, raw};

    #[test]
    fn concat_appends_in_order() -> IngotResult<()> {
        let a = Series::from_values("a", &raw![1, 2], None, &IngestConfig::strict())?;
        let b = Series::from_values("b", &raw![null, 3], None, &IngestConfig::strict())?;
        let c = Series::concat(&[&a, &b])?;
        assert_eq!(c.name(), "a");
        assert_eq!(
            c.lits().collect::<Vec<_>>(),
            vec![
                Literal::Int64(1),
                Literal::Int64(2),
                Literal::Null,
                Literal::Int64(3)
            ]
        );
        Ok(())
    }

    #[test]
    fn null_columns_adopt_the_common_type() -> IngotResult<()> {
        let n = Series::full_null("n", &DataType::Null, 2)?;
        let s = Series::from_values("s", &raw!["x"], None, &IngestConfig::strict())?;
        let c = Series::concat(&[&n, &s])?;
        assert_eq!(c.data_type(), &DataType::Utf8);
        assert_eq!(c.null_count(), 2);
        assert_eq!(c.get_lit(2), Literal::Utf8("x".to_string()));
        Ok(())
    }

    #[test]
    fn categoricals_concatenate_across_dictionaries() -> IngotResult<()> {
        let a = Series::from_literals(
            "c",
            &DataType::Categorical,
            &[Literal::Categorical("x".to_string())],
        )?;
        let b = Series::from_literals(
            "c",
            &DataType::Categorical,
            &[Literal::Categorical("y".to_string()), Literal::Categorical("x".to_string())],
        )?;
        let c = Series::concat(&[&a, &b])?;
        assert_eq!(
            c.lits().collect::<Vec<_>>(),
            ["x", "y", "x"]
                .map(|v| Literal::Categorical(v.to_string()))
                .to_vec()
        );
        Ok(())
    }

    #[test]
    fn mismatched_types_are_rejected() -> IngotResult<()> {
        let a = Series::from_values("a", &raw![1], None, &IngestConfig::strict())?;
        let b = Series::from_values("b", &raw![1.5], None, &IngestConfig::strict())?;
        let err = Series::concat(&[&a, &b]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(Series::concat(&[]).is_err());
        Ok(())
    }
}
