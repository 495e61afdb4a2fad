use common_error::{IngotError, IngotResult};

use crate::series::Series;

impl Series {
    /// Rows `start..end`. Shares the underlying buffers.
    pub fn slice(&self, start: usize, end: usize) -> IngotResult<Self> {
        if start > end || end > self.len() {
            return Err(IngotError::ValueError(format!(
                "Trying to slice column '{}' of length {} with invalid range {start}..{end}",
                self.name(),
                self.len()
            )));
        }
        Ok(self.with_data(self.data.sliced(start, end - start)))
    }

    pub fn head(&self, num: usize) -> IngotResult<Self> {
        if num >= self.len() {
            return Ok(self.clone());
        }
        self.slice(0, num)
    }
}

#[cfg(test)]
mod tests {
    use common_ingest_config::IngestConfig;

    use super::*;
    use crate::{datatypes::DataType, lit::Literal, raw, raw::RawValue};

    #[test]
    fn slice_keeps_nulls_and_type() -> IngotResult<()> {
        let s = Series::from_values("a", &raw![[1], null, [2, 3]], None, &IngestConfig::strict())?;
        let sliced = s.slice(1, 3)?;
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.data_type(), s.data_type());
        assert_eq!(sliced.get_lit(0), Literal::Null);
        assert_eq!(
            sliced.get_lit(1),
            Literal::List(vec![Literal::Int64(2), Literal::Int64(3)])
        );
        Ok(())
    }

    #[test]
    fn slices_of_fixed_width_and_struct_columns() -> IngotResult<()> {
        let fixed = Series::from_literals(
            "a",
            &DataType::array(DataType::Int8, 2),
            &[
                Literal::Array(vec![Literal::Int8(1), Literal::Int8(2)]),
                Literal::Array(vec![Literal::Int8(3), Literal::Int8(4)]),
            ],
        )?;
        assert_eq!(
            fixed.slice(1, 2)?.get_lit(0),
            Literal::Array(vec![Literal::Int8(3), Literal::Int8(4)])
        );
        let records = Series::from_values(
            "r",
            &[
                RawValue::record([("k", RawValue::from(1))]),
                RawValue::record([("k", RawValue::from(2))]),
            ],
            None,
            &IngestConfig::strict(),
        )?;
        assert_eq!(
            records.slice(1, 2)?.get_lit(0),
            Literal::Struct([("k".to_string(), Literal::Int64(2))].into_iter().collect())
        );
        Ok(())
    }

    #[test]
    fn head_clamps_to_length() -> IngotResult<()> {
        let s = Series::from_values("a", &raw![1, 2, 3], None, &IngestConfig::strict())?;
        assert_eq!(s.head(10)?, s);
        assert_eq!(s.head(1)?.len(), 1);
        assert!(s.slice(2, 5).is_err());
        Ok(())
    }
}
