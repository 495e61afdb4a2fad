mod construct;
pub mod orientation;

use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result},
};

use common_display::table_display::{comfy_table, make_comfy_table, StrValue};
use common_error::{IngotError, IngotResult};
use common_ingest_config::IngestConfig;
pub use construct::{SchemaDefinition, TableOptions};
use ingot_core::prelude::*;
pub use orientation::{resolve_orientation, Orientation, OrientationDecision};

/// An ordered set of equal-length, uniquely named columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordBatch {
    pub schema: SchemaRef,
    columns: Vec<Series>,
    num_rows: usize,
}

#[inline]
fn validate_schema(schema: &Schema, columns: &[Series]) -> IngotResult<()> {
    if schema.len() != columns.len() {
        return Err(IngotError::SchemaMismatch(format!(
            "While building a RecordBatch, we found that the number of fields did not match between the schema and the input columns.\n {}\n vs\n {}",
            schema.len(),
            columns.len()
        )));
    }
    for (field, series) in schema.fields.values().zip(columns.iter()) {
        if field != series.field() {
            return Err(IngotError::SchemaMismatch(format!(
                "While building a RecordBatch, we found that the Schema Field and the Series Field did not match. schema field: {field} vs series field: {}",
                series.field()
            )));
        }
    }
    Ok(())
}

fn validate_lengths(columns: &[Series], num_rows: usize) -> IngotResult<()> {
    for series in columns {
        if series.len() != num_rows {
            return Err(IngotError::ShapeError(format!(
                "While building a RecordBatch, we found that the column lengths did not match. Column '{}' had length {} vs the expected length {num_rows}",
                series.name(),
                series.len()
            )));
        }
    }
    Ok(())
}

impl RecordBatch {
    /// Create a new [`RecordBatch`], validating `columns` against `schema` and `num_rows`.
    ///
    /// # Arguments
    ///
    /// * `schema` - Expected [`Schema`] of the new [`RecordBatch`]
    /// * `columns` - Columns as [`Series`] objects, in schema order
    /// * `num_rows` - Expected number of rows, passed explicitly to handle cases where `columns` is empty
    pub fn new<S: Into<SchemaRef>>(
        schema: S,
        columns: Vec<Series>,
        num_rows: usize,
    ) -> IngotResult<Self> {
        let schema: SchemaRef = schema.into();
        validate_schema(schema.as_ref(), columns.as_slice())?;
        validate_lengths(&columns, num_rows)?;
        Ok(Self::new_unchecked(schema, columns, num_rows))
    }

    pub(crate) fn new_unchecked<S: Into<SchemaRef>>(
        schema: S,
        columns: Vec<Series>,
        num_rows: usize,
    ) -> Self {
        Self {
            schema: schema.into(),
            columns,
            num_rows,
        }
    }

    pub fn empty(schema: Option<SchemaRef>) -> IngotResult<Self> {
        let schema = schema.unwrap_or_else(|| Schema::empty().into());
        let columns = schema
            .fields
            .values()
            .map(|field| Series::empty(&field.name, &field.dtype))
            .collect::<IngotResult<Vec<_>>>()?;
        Ok(Self::new_unchecked(schema, columns, 0))
    }

    /// Create a RecordBatch from a set of columns, inferring the schema and row count.
    ///
    /// Column names must be unique and all columns must have the same length.
    pub fn from_columns(columns: Vec<Series>) -> IngotResult<Self> {
        let schema = Schema::new(columns.iter().map(|s| s.field().clone()).collect())?;
        let num_rows = columns.first().map_or(0, Series::len);
        validate_lengths(&columns, num_rows)?;
        Ok(Self::new_unchecked(schema, columns, num_rows))
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.names()
    }

    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> IngotResult<&Series> {
        let idx = self.schema.get_index(name)?;
        Ok(&self.columns[idx])
    }

    pub fn get_column_by_index(&self, idx: usize) -> IngotResult<&Series> {
        self.columns.get(idx).ok_or_else(|| {
            IngotError::FieldNotFound(format!(
                "Column index {idx} is out of bounds for a RecordBatch with {} columns",
                self.num_columns()
            ))
        })
    }

    /// Replaces the column with the same name, or appends it.
    pub fn with_column(&self, series: Series) -> IngotResult<Self> {
        if !self.columns.is_empty() && series.len() != self.len() {
            return Err(IngotError::ShapeError(format!(
                "Cannot add column '{}' of length {} to a RecordBatch of length {}",
                series.name(),
                series.len(),
                self.len()
            )));
        }
        let mut columns = self.columns.clone();
        match self.schema.get_index(series.name()) {
            Ok(idx) => columns[idx] = series,
            Err(_) => columns.push(series),
        }
        Self::from_columns(columns)
    }

    pub fn drop_column(&self, name: &str) -> IngotResult<Self> {
        let idx = self.schema.get_index(name)?;
        let mut columns = self.columns.clone();
        columns.remove(idx);
        let schema = Schema::new(columns.iter().map(|s| s.field().clone()).collect())?;
        Ok(Self::new_unchecked(schema, columns, self.len()))
    }

    /// Columns named in `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> IngotResult<Self> {
        let columns = names
            .iter()
            .map(|name| self.get_column(name.as_ref()).cloned())
            .collect::<IngotResult<Vec<_>>>()?;
        let schema = Schema::new(columns.iter().map(|s| s.field().clone()).collect())?;
        Ok(Self::new_unchecked(schema, columns, self.len()))
    }

    pub fn slice(&self, start: usize, end: usize) -> IngotResult<Self> {
        let columns = self
            .columns
            .iter()
            .map(|s| s.slice(start, end))
            .collect::<IngotResult<Vec<_>>>()?;
        let num_rows = self.len().min(end.saturating_sub(start));
        Self::new(self.schema.clone(), columns, num_rows)
    }

    pub fn head(&self, num: usize) -> IngotResult<Self> {
        if num >= self.len() {
            return Ok(self.clone());
        }
        self.slice(0, num)
    }

    /// Non-strict [`RecordBatch::cast_to_schema_with_options`].
    pub fn cast_to_schema(&self, schema: &Schema) -> IngotResult<Self> {
        self.cast_to_schema_with_options(schema, &IngestConfig::non_strict())
    }

    /// Reshapes the batch to `schema`: shared columns are cast, schema columns missing from
    /// the batch are filled with nulls, and columns absent from `schema` are dropped.
    pub fn cast_to_schema_with_options(
        &self,
        schema: &Schema,
        config: &IngestConfig,
    ) -> IngotResult<Self> {
        let current = self.column_names().into_iter().collect::<HashSet<_>>();
        let columns = schema
            .fields
            .values()
            .map(|field| {
                if current.contains(&field.name) {
                    self.get_column(&field.name)?
                        .cast_with_options(&field.dtype, config)
                } else {
                    Series::full_null(&field.name, &field.dtype, self.len())
                }
            })
            .collect::<IngotResult<Vec<_>>>()?;
        Self::new(schema.clone(), columns, self.len())
    }

    pub fn to_comfy_table(&self, max_col_width: Option<usize>) -> comfy_table::Table {
        let headers = self
            .schema
            .fields
            .values()
            .map(|field| format!("{}\n---\n{}", field.name, field.dtype))
            .collect::<Vec<_>>();
        let columns = self
            .columns
            .iter()
            .map(|s| s as &dyn StrValue)
            .collect::<Vec<_>>();
        make_comfy_table(
            headers.as_slice(),
            Some(columns.as_slice()),
            Some(self.len()),
            max_col_width,
        )
    }
}

impl Display for RecordBatch {
    // `f` is a buffer, and this method must write the formatted string into it
    fn fmt(&self, f: &mut Formatter) -> Result {
        let table = self.to_comfy_table(Some(32));
        writeln!(f, "{table}")
    }
}

impl AsRef<Self> for RecordBatch {
    fn as_ref(&self) -> &Self {
        self
    }
}
