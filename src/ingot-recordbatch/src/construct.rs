use std::collections::HashMap;

use common_error::{IngotError, IngotResult};
use common_ingest_config::IngestConfig;
use indexmap::{IndexMap, IndexSet};
use ingot_core::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    orientation::{resolve_orientation, Orientation},
    RecordBatch,
};

/// Column names with optional dtypes, given alongside table input.
///
/// Unlike [`Schema`], a definition may leave dtypes open; those columns are inferred.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    columns: Vec<(String, Option<DataType>)>,
}

impl SchemaDefinition {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Option<DataType>)>,
    ) -> IngotResult<Self> {
        let columns = columns
            .into_iter()
            .map(|(name, dtype)| (name.into(), dtype))
            .collect::<Vec<_>>();
        let mut seen = IndexSet::with_capacity(columns.len());
        for (name, dtype) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(IngotError::SchemaMismatch(format!(
                    "Attempting to make a schema definition with duplicate column names: {name}"
                )));
            }
            if let Some(dtype) = dtype {
                dtype.validate()?;
            }
        }
        Ok(Self { columns })
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> IngotResult<Self> {
        Self::new(names.into_iter().map(|name| (name, None)))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn dtype(&self, idx: usize) -> Option<&DataType> {
        self.columns.get(idx).and_then(|(_, dtype)| dtype.as_ref())
    }
}

impl From<&Schema> for SchemaDefinition {
    fn from(schema: &Schema) -> Self {
        Self {
            columns: schema
                .fields
                .values()
                .map(|field| (field.name.clone(), Some(field.dtype.clone())))
                .collect(),
        }
    }
}

/// How tabular input is turned into a [`RecordBatch`].
#[derive(Clone, Debug, Default)]
pub struct TableOptions {
    /// Column names, positional, with optional dtypes.
    pub schema: Option<SchemaDefinition>,
    /// Dtypes by column name, taking precedence over `schema`.
    pub schema_overrides: IndexMap<String, DataType>,
    /// Layout of two-dimensional input. Inferred from shape when unset.
    pub orientation: Option<Orientation>,
    pub config: IngestConfig,
}

impl TableOptions {
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaDefinition) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_schema_overrides<S: Into<String>>(
        mut self,
        overrides: impl IntoIterator<Item = (S, DataType)>,
    ) -> Self {
        self.schema_overrides
            .extend(overrides.into_iter().map(|(name, dtype)| (name.into(), dtype)));
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    fn schema_len(&self) -> Option<usize> {
        self.schema.as_ref().map(SchemaDefinition::len)
    }

    /// The `n` output column names: the schema's when given (it must have exactly `n`
    /// columns), otherwise `defaults`.
    fn column_names(
        &self,
        n: usize,
        defaults: impl FnOnce() -> Vec<String>,
    ) -> IngotResult<Vec<String>> {
        match &self.schema {
            Some(schema) if schema.len() != n => Err(IngotError::SchemaMismatch(format!(
                "the schema has {} columns but the data has {n}",
                schema.len()
            ))),
            Some(schema) => Ok(schema.names().map(str::to_string).collect()),
            None => Ok(defaults()),
        }
    }

    fn declared_dtype(&self, idx: usize, name: &str) -> Option<DataType> {
        self.schema_overrides
            .get(name)
            .or_else(|| self.schema.as_ref().and_then(|s| s.dtype(idx)))
            .cloned()
    }

    fn empty_batch(&self) -> IngotResult<RecordBatch> {
        let columns = match &self.schema {
            None => vec![],
            Some(schema) => schema
                .names()
                .enumerate()
                .map(|(idx, name)| {
                    let dtype = self.declared_dtype(idx, name).unwrap_or(DataType::Null);
                    dtype.validate()?;
                    Series::empty(name, &dtype)
                })
                .collect::<IngotResult<Vec<_>>>()?,
        };
        RecordBatch::from_columns(columns)
    }
}

fn default_names(n: usize) -> Vec<String> {
    (0..n).map(|idx| format!("column_{idx}")).collect()
}

/// True while inference has not pinned a concrete leaf type anywhere in `dtype`.
fn has_unresolved(dtype: &DataType) -> bool {
    match dtype {
        DataType::Null => true,
        DataType::List(inner) | DataType::Array(inner, _) => has_unresolved(inner),
        DataType::Struct(fields) => fields.iter().any(|f| has_unresolved(&f.dtype)),
        _ => false,
    }
}

/// Values of one column waiting to be built.
struct PendingColumn {
    name: String,
    values: Vec<RawValue>,
    dtype: Option<DataType>,
    /// Infer the dtype from the first `infer_schema_length` values only. Strict builds always
    /// infer over every value, so a late mismatch is a `TypeMismatch` as for column input.
    infer_from_prefix: bool,
}

impl PendingColumn {
    fn prefix_dtype(&self, config: &IngestConfig) -> IngotResult<Option<DataType>> {
        match config.infer_schema_length {
            Some(n) if !config.strict && n < self.values.len() => {
                let dtype = infer_dtype(&self.values[..n], None, config.strict)
                    .map_err(|e| e.with_column(&self.name))?;
                Ok((!has_unresolved(&dtype)).then_some(dtype))
            }
            _ => Ok(None),
        }
    }

    fn build(self, config: &IngestConfig) -> IngotResult<Series> {
        let dtype = match self.dtype.clone() {
            Some(dtype) => Some(dtype),
            None if self.infer_from_prefix => self.prefix_dtype(config)?,
            None => None,
        };
        Series::from_values(&self.name, &self.values, dtype.as_ref(), config)
    }
}

/// Builds independent columns in parallel. The error of the leftmost failing column wins.
fn build_columns(pending: Vec<PendingColumn>, config: &IngestConfig) -> IngotResult<RecordBatch> {
    log::debug!("building {} columns", pending.len());
    let built = pending
        .into_par_iter()
        .map(|column| column.build(config))
        .collect::<Vec<_>>();
    RecordBatch::from_columns(built.into_iter().collect::<IngotResult<Vec<_>>>()?)
}

/// Elements of one outer item of 2D input.
fn outer_item(value: &RawValue, idx: usize) -> IngotResult<Vec<RawValue>> {
    match value {
        RawValue::Sequence(items) => Ok(items.clone()),
        RawValue::TypedArray {
            shape, values, ..
        } if shape.len() == 1 => Ok(values.iter().cloned().map(RawValue::Typed).collect()),
        other => Err(IngotError::ShapeError(format!(
            "two-dimensional input expects a sequence at index {idx}, found {other:?}"
        ))),
    }
}

fn typed_cells(values: &[Literal], positions: impl Iterator<Item = usize>) -> Vec<RawValue> {
    positions
        .map(|idx| RawValue::Typed(values[idx].clone()))
        .collect()
}

fn transpose(rows: Vec<Vec<RawValue>>, width: usize) -> Vec<Vec<RawValue>> {
    let mut columns = (0..width)
        .map(|_| Vec::with_capacity(rows.len()))
        .collect::<Vec<_>>();
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    columns
}

impl RecordBatch {
    /// Builds a batch from named columns of raw values.
    ///
    /// With a schema definition, its names replace the keys positionally.
    pub fn from_dict<S: Into<String>>(
        data: impl IntoIterator<Item = (S, Vec<RawValue>)>,
        options: &TableOptions,
    ) -> IngotResult<Self> {
        let data = data
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect::<Vec<(String, Vec<RawValue>)>>();
        if data.is_empty() {
            return options.empty_batch();
        }
        let names = options.column_names(data.len(), || {
            data.iter().map(|(name, _)| name.clone()).collect()
        })?;

        let num_rows = data[0].1.len();
        if let Some((name, values)) = data.iter().find(|(_, values)| values.len() != num_rows) {
            return Err(IngotError::ShapeError(format!(
                "column '{name}' has length {} but column '{}' has length {num_rows}",
                values.len(),
                data[0].0
            )));
        }

        let pending = names
            .into_iter()
            .zip(data)
            .enumerate()
            .map(|(idx, (name, (_, values)))| PendingColumn {
                dtype: options.declared_dtype(idx, &name),
                name,
                values,
                infer_from_prefix: false,
            })
            .collect();
        build_columns(pending, &options.config)
    }

    /// Builds a batch from two-dimensional input: a sequence of sequences whose outer axis is
    /// rows or columns as decided by [`resolve_orientation`].
    pub fn from_rows(data: &[RawValue], options: &TableOptions) -> IngotResult<Self> {
        if data.is_empty() {
            return options.empty_batch();
        }
        let items = data
            .iter()
            .enumerate()
            .map(|(idx, value)| outer_item(value, idx))
            .collect::<IngotResult<Vec<_>>>()?;
        let inner = items[0].len();
        if let Some(idx) = items.iter().position(|item| item.len() != inner) {
            return Err(IngotError::ShapeError(format!(
                "two-dimensional input is ragged: element {idx} has {} values but element 0 has {inner}",
                items[idx].len()
            )));
        }

        let decision =
            resolve_orientation(items.len(), inner, options.schema_len(), options.orientation);
        let (columns, infer_from_prefix) = match decision.orientation {
            Orientation::Row => (transpose(items, inner), true),
            Orientation::Column => (items, false),
        };
        let names = options.column_names(columns.len(), || default_names(columns.len()))?;
        let pending = names
            .into_iter()
            .zip(columns)
            .enumerate()
            .map(|(idx, (name, values))| PendingColumn {
                dtype: options.declared_dtype(idx, &name),
                name,
                values,
                infer_from_prefix,
            })
            .collect();
        build_columns(pending, &options.config)
    }

    /// Builds a batch from a typed array with one or two axes. Columns default to the array's
    /// dtype.
    pub fn from_grid(grid: &RawValue, options: &TableOptions) -> IngotResult<Self> {
        let RawValue::TypedArray {
            dtype,
            shape,
            values,
        } = grid
        else {
            return Err(IngotError::ValueError(format!(
                "from_grid expects a typed array, found {grid:?}"
            )));
        };
        let expected = shape.iter().product::<usize>();
        if values.len() != expected {
            return Err(IngotError::ShapeError(format!(
                "typed array of shape {shape:?} needs {expected} values, got {}",
                values.len()
            )));
        }

        let (rows, cols) = match shape.as_slice() {
            [len] => (*len, 1),
            [rows, cols] => (*rows, *cols),
            _ => {
                return Err(IngotError::ShapeError(format!(
                    "cannot build a table from a typed array with {} axes",
                    shape.len()
                )))
            }
        };
        let columns = if shape.len() == 1 {
            vec![typed_cells(values, 0..rows)]
        } else {
            match resolve_orientation(rows, cols, options.schema_len(), options.orientation)
                .orientation
            {
                Orientation::Row => (0..cols)
                    .map(|j| typed_cells(values, (0..rows).map(|i| i * cols + j)))
                    .collect(),
                Orientation::Column => (0..rows)
                    .map(|i| typed_cells(values, i * cols..(i + 1) * cols))
                    .collect::<Vec<_>>(),
            }
        };

        let names = options.column_names(columns.len(), || default_names(columns.len()))?;
        let pending = names
            .into_iter()
            .zip(columns)
            .enumerate()
            .map(|(idx, (name, values))| PendingColumn {
                dtype: Some(
                    options
                        .declared_dtype(idx, &name)
                        .unwrap_or_else(|| dtype.clone()),
                ),
                name,
                values,
                infer_from_prefix: false,
            })
            .collect();
        build_columns(pending, &options.config)
    }

    /// Builds a batch from row records.
    ///
    /// Without a schema definition, columns are the keys seen in the first
    /// `infer_schema_length` records, in first-seen order. Missing keys read as null; keys
    /// outside the column set are ignored. A null record is a row of nulls.
    pub fn from_records(records: &[RawValue], options: &TableOptions) -> IngotResult<Self> {
        let rows = records
            .iter()
            .enumerate()
            .map(|(idx, record)| match record {
                RawValue::Record(fields) => {
                    let mut row = HashMap::with_capacity(fields.len());
                    for (name, value) in fields {
                        if row.insert(name.as_str(), value).is_some() {
                            return Err(IngotError::SchemaMismatch(format!(
                                "record {idx} has duplicate key '{name}'"
                            )));
                        }
                    }
                    Ok(row)
                }
                RawValue::Null => Ok(HashMap::new()),
                other => Err(IngotError::ValueError(format!(
                    "expected a record at index {idx}, found {other:?}"
                ))),
            })
            .collect::<IngotResult<Vec<_>>>()?;

        let names = match &options.schema {
            Some(schema) => schema.names().map(str::to_string).collect::<Vec<_>>(),
            None => {
                let scan = options
                    .config
                    .infer_schema_length
                    .map_or(records.len(), |n| n.min(records.len()));
                let mut keys = IndexSet::new();
                for record in &records[..scan] {
                    if let RawValue::Record(fields) = record {
                        keys.extend(fields.iter().map(|(name, _)| name.as_str()));
                    }
                }
                keys.into_iter().map(str::to_string).collect()
            }
        };
        if names.is_empty() {
            return options.empty_batch();
        }

        let pending = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = rows
                    .iter()
                    .map(|row| row.get(name.as_str()).map_or(RawValue::Null, |v| (*v).clone()))
                    .collect();
                PendingColumn {
                    dtype: options.declared_dtype(idx, &name),
                    name,
                    values,
                    infer_from_prefix: true,
                }
            })
            .collect();
        build_columns(pending, &options.config)
    }
}

#[cfg(test)]
mod tests {
    use common_error::ErrorKind;
    use ingot_core::raw;
    use rstest::rstest;

    use super::*;

    fn ints(batch: &RecordBatch, name: &str) -> IngotResult<Vec<Literal>> {
        Ok(batch.get_column(name)?.lits().collect())
    }

    #[test]
    fn dict_columns_keep_key_order() -> IngotResult<()> {
        let batch = RecordBatch::from_dict(
            [("b", raw![1, 2]), ("a", raw!["x", null])],
            &TableOptions::default(),
        )?;
        assert_eq!(batch.column_names(), vec!["b", "a"]);
        assert_eq!(batch.get_column("a")?.data_type(), &DataType::Utf8);
        assert_eq!(batch.len(), 2);
        Ok(())
    }

    #[test]
    fn dict_schema_renames_positionally_and_declares_types() -> IngotResult<()> {
        let schema = SchemaDefinition::new([("x", Some(DataType::Int8)), ("y", None)])?;
        let options = TableOptions::default().with_schema(schema);
        let batch = RecordBatch::from_dict([("a", raw![1]), ("b", raw![2.5])], &options)?;
        assert_eq!(batch.column_names(), vec!["x", "y"]);
        assert_eq!(batch.get_column("x")?.data_type(), &DataType::Int8);
        assert_eq!(batch.get_column("y")?.data_type(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn dict_unequal_lengths_are_a_shape_error() {
        let err = RecordBatch::from_dict(
            [("a", raw![1, 2]), ("b", raw![1])],
            &TableOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeError);
    }

    #[test]
    fn overrides_beat_the_schema() -> IngotResult<()> {
        let schema = SchemaDefinition::new([("a", Some(DataType::Int8))])?;
        let options = TableOptions::default()
            .with_schema(schema)
            .with_schema_overrides([("a", DataType::Float32)]);
        let batch = RecordBatch::from_dict([("a", raw![1])], &options)?;
        assert_eq!(batch.get_column("a")?.data_type(), &DataType::Float32);
        Ok(())
    }

    #[test]
    fn square_input_defaults_to_columns() -> IngotResult<()> {
        let schema = SchemaDefinition::from_names(["a", "b"])?;
        let data = raw![[1, 2], [3, 4]];
        let batch = RecordBatch::from_rows(&data, &TableOptions::default().with_schema(schema.clone()))?;
        assert_eq!(ints(&batch, "a")?, vec![Literal::Int64(1), Literal::Int64(2)]);

        let options = TableOptions::default()
            .with_schema(schema)
            .with_orientation(Orientation::Row);
        let batch = RecordBatch::from_rows(&data, &options)?;
        assert_eq!(ints(&batch, "a")?, vec![Literal::Int64(1), Literal::Int64(3)]);
        Ok(())
    }

    #[test]
    fn schema_width_picks_the_row_axis() -> IngotResult<()> {
        let schema = SchemaDefinition::from_names(["a", "b"])?;
        let data = raw![[1, "x"], [2, "y"], [3, "z"]];
        let batch = RecordBatch::from_rows(&data, &TableOptions::default().with_schema(schema))?;
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.get_column("b")?.data_type(), &DataType::Utf8);
        Ok(())
    }

    #[test]
    fn mixed_cells_in_a_row_do_not_flip_orientation() -> IngotResult<()> {
        let numeric = RecordBatch::from_rows(&raw![[1, 2], [3, 4]], &TableOptions::default())?;
        let mixed = RecordBatch::from_rows(&raw![[1, 2], ["a", "b"]], &TableOptions::default())?;
        assert_eq!(numeric.num_columns(), 2);
        assert_eq!(mixed.num_columns(), 2);
        assert_eq!(mixed.get_column("column_1")?.data_type(), &DataType::Utf8);
        Ok(())
    }

    #[test]
    fn explicit_orientation_must_match_schema_width() -> IngotResult<()> {
        let options = TableOptions::default()
            .with_schema(SchemaDefinition::from_names(["a", "b", "c"])?)
            .with_orientation(Orientation::Row);
        let err = RecordBatch::from_rows(&raw![[1, 2], [3, 4]], &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        Ok(())
    }

    #[test]
    fn ragged_rows_are_a_shape_error() {
        let options = TableOptions::default().with_orientation(Orientation::Row);
        let err = RecordBatch::from_rows(&raw![[1, 2], [3]], &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeError);
    }

    #[test]
    fn row_dtypes_come_from_the_inference_window() -> IngotResult<()> {
        let config = IngestConfig::non_strict().with_infer_schema_length(Some(2));
        let options = TableOptions::default()
            .with_orientation(Orientation::Row)
            .with_config(config);
        let batch = RecordBatch::from_rows(&raw![[1], [2], [3.5]], &options)?;
        let column = batch.get_column("column_0")?;
        assert_eq!(column.data_type(), &DataType::Int64);
        assert_eq!(column.get_lit(2), Literal::Int64(3));
        Ok(())
    }

    #[test]
    fn strict_rows_report_late_mismatches_like_columns() {
        let config = IngestConfig::strict().with_infer_schema_length(Some(2));
        let rows = TableOptions::default()
            .with_orientation(Orientation::Row)
            .with_config(config.clone());
        let row_err = RecordBatch::from_rows(&raw![[1], [2], [3.5]], &rows).unwrap_err();

        let columns = TableOptions::default()
            .with_orientation(Orientation::Column)
            .with_config(config);
        let column_err = RecordBatch::from_rows(&raw![[1, 2, 3.5]], &columns).unwrap_err();

        assert_eq!(row_err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(row_err.kind(), column_err.kind());
    }

    #[test]
    fn null_prefix_falls_back_to_full_inference() -> IngotResult<()> {
        let config = IngestConfig::strict().with_infer_schema_length(Some(1));
        let options = TableOptions::default()
            .with_orientation(Orientation::Row)
            .with_config(config);
        let batch = RecordBatch::from_rows(&raw![[null], [2]], &options)?;
        assert_eq!(batch.get_column("column_0")?.data_type(), &DataType::Int64);
        Ok(())
    }

    #[rstest]
    #[case(Orientation::Row, vec![Literal::Int32(1), Literal::Int32(3), Literal::Int32(5)])]
    #[case(Orientation::Column, vec![Literal::Int32(1), Literal::Int32(2)])]
    fn grids_follow_orientation(
        #[case] orientation: Orientation,
        #[case] first: Vec<Literal>,
    ) -> IngotResult<()> {
        let grid = RawValue::TypedArray {
            dtype: DataType::Int32,
            shape: vec![3, 2],
            values: (1..=6).map(Literal::Int32).collect(),
        };
        let options = TableOptions::default().with_orientation(orientation);
        let batch = RecordBatch::from_grid(&grid, &options)?;
        assert_eq!(batch.get_column_by_index(0)?.lits().collect::<Vec<_>>(), first);
        assert!(batch
            .columns()
            .iter()
            .all(|s| s.data_type() == &DataType::Int32));
        Ok(())
    }

    #[test]
    fn grid_shape_must_match_values() {
        let grid = RawValue::TypedArray {
            dtype: DataType::Int32,
            shape: vec![2, 2],
            values: vec![Literal::Int32(1)],
        };
        let err = RecordBatch::from_grid(&grid, &TableOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeError);
    }

    #[test]
    fn records_use_first_seen_keys() -> IngotResult<()> {
        let records = vec![
            RawValue::record([("a", RawValue::from(1)), ("b", RawValue::from("x"))]),
            RawValue::record([("c", RawValue::from(true)), ("a", RawValue::from(2))]),
            RawValue::Null,
        ];
        let batch = RecordBatch::from_records(&records, &TableOptions::default())?;
        assert_eq!(batch.column_names(), vec!["a", "b", "c"]);
        assert_eq!(
            ints(&batch, "a")?,
            vec![Literal::Int64(1), Literal::Int64(2), Literal::Null]
        );
        assert_eq!(batch.get_column("c")?.null_count(), 2);
        Ok(())
    }

    #[test]
    fn records_outside_the_window_add_no_columns() -> IngotResult<()> {
        let records = vec![
            RawValue::record([("a", RawValue::from(1))]),
            RawValue::record([("a", RawValue::from(2)), ("late", RawValue::from(0))]),
        ];
        let options = TableOptions::default()
            .with_config(IngestConfig::strict().with_infer_schema_length(Some(1)));
        let batch = RecordBatch::from_records(&records, &options)?;
        assert_eq!(batch.column_names(), vec!["a"]);
        Ok(())
    }

    #[test]
    fn duplicate_record_keys_are_rejected() {
        let records = vec![RawValue::record([
            ("a", RawValue::from(1)),
            ("a", RawValue::from(2)),
        ])];
        let err = RecordBatch::from_records(&records, &TableOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn empty_input_with_schema_yields_typed_empty_columns() -> IngotResult<()> {
        let schema = SchemaDefinition::new([("a", Some(DataType::Utf8)), ("b", None)])?;
        let batch = RecordBatch::from_rows(&[], &TableOptions::default().with_schema(schema))?;
        assert!(batch.is_empty());
        assert_eq!(batch.get_column("a")?.data_type(), &DataType::Utf8);
        assert_eq!(batch.get_column("b")?.data_type(), &DataType::Null);
        Ok(())
    }

    #[test]
    fn schema_definitions_reject_duplicates() {
        let err = SchemaDefinition::from_names(["a", "a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }
}
