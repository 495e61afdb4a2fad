use std::{collections::HashSet, sync::Arc};

use common_display::table_display::make_schema_vertical_table;
use common_error::{IngotError, IngotResult};
use derive_more::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{dtype::DataType, field::Field, supertype::try_widest_common};

pub type SchemaRef = Arc<Schema>;

#[derive(Clone, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{}\n", make_schema_vertical_table(
    fields.iter().map(|(name, field)| (name.clone(), field.dtype.to_string()))
))]
pub struct Schema {
    #[serde(with = "indexmap::map::serde_seq")]
    pub fields: IndexMap<String, Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> IngotResult<Self> {
        let mut map = IndexMap::new();

        for f in fields {
            match map.entry(f.name.clone()) {
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(f);
                }
                indexmap::map::Entry::Occupied(entry) => {
                    return Err(IngotError::SchemaMismatch(format!(
                        "Attempting to make a Schema with duplicate field names: {}",
                        entry.key()
                    )));
                }
            }
        }

        Ok(Self { fields: map })
    }

    pub fn empty() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn get_field(&self, name: &str) -> IngotResult<&Field> {
        match self.fields.get(name) {
            None => Err(IngotError::FieldNotFound(format!(
                "Column \"{}\" not found in schema: {:?}",
                name,
                self.fields.keys()
            ))),
            Some(val) => Ok(val),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_index(&self, name: &str) -> IngotResult<usize> {
        match self.fields.get_index_of(name) {
            None => Err(IngotError::FieldNotFound(format!(
                "Column \"{}\" not found in schema: {:?}",
                name,
                self.fields.keys()
            ))),
            Some(val) => Ok(val),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn dtypes(&self) -> Vec<DataType> {
        self.fields.values().map(|f| f.dtype.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Takes the disjoint union over the `self` and `other` schemas, throwing an error if the
    /// schemas contain overlapping keys.
    pub fn union(&self, other: &Self) -> IngotResult<Self> {
        let self_keys: HashSet<&String> = HashSet::from_iter(self.fields.keys());
        let other_keys: HashSet<&String> = HashSet::from_iter(other.fields.keys());
        if self_keys.is_disjoint(&other_keys) {
            let fields = self
                .fields
                .iter()
                .chain(other.fields.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Self { fields })
        } else {
            Err(IngotError::SchemaMismatch(
                "Cannot disjoint union two schemas with overlapping keys".to_string(),
            ))
        }
    }

    /// Replaces the dtype of every field that also appears in `hints`. Hints naming columns
    /// absent from `self` are ignored.
    pub fn apply_hints(&self, hints: &Self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| match hints.fields.get(name) {
                None => (name.clone(), field.clone()),
                Some(hint_field) => (name.clone(), field.with_dtype(hint_field.dtype.clone())),
            })
            .collect();
        Self { fields }
    }

    /// Column-wise supertype of two schemas. Shared columns keep `self`'s position and take
    /// the widest common dtype; columns only in `other` are appended.
    pub fn supertype(&self, other: &Self) -> IngotResult<Self> {
        let mut fields = self.fields.clone();
        for (name, field) in &other.fields {
            match fields.get_mut(name) {
                Some(existing) => {
                    existing.dtype = try_widest_common(&existing.dtype, &field.dtype)
                        .map_err(|e| e.with_column(name))?;
                }
                None => {
                    fields.insert(name.clone(), field.clone());
                }
            }
        }
        Ok(Self { fields })
    }

    pub fn short_string(&self) -> String {
        if self.is_empty() {
            return "EMPTY".to_string();
        }
        self.fields
            .values()
            .map(|field| field.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<(&str, DataType)>> for Schema {
    type Error = IngotError;

    fn try_from(fields: Vec<(&str, DataType)>) -> IngotResult<Self> {
        Self::new(fields.into_iter().map(Field::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use common_error::ErrorKind;

    use super::*;

    fn schema(fields: Vec<(&str, DataType)>) -> Schema {
        Schema::try_from(fields).unwrap()
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("a", DataType::Utf8),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn lookups_preserve_order() -> IngotResult<()> {
        let s = schema(vec![("b", DataType::Int64), ("a", DataType::Utf8)]);
        assert_eq!(s.names(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(s.get_index("a")?, 1);
        assert_eq!(s.get_field("b")?.dtype, DataType::Int64);
        assert_eq!(s.get_field("c").unwrap_err().kind(), ErrorKind::FieldNotFound);
        Ok(())
    }

    #[test]
    fn union_requires_disjoint_names() -> IngotResult<()> {
        let l = schema(vec![("a", DataType::Int64)]);
        let r = schema(vec![("b", DataType::Utf8)]);
        assert_eq!(l.union(&r)?.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(l.union(&l).is_err());
        Ok(())
    }

    #[test]
    fn hints_override_dtypes_only() {
        let s = schema(vec![("a", DataType::Int64), ("b", DataType::Utf8)]);
        let hints = schema(vec![("b", DataType::Categorical), ("z", DataType::Date)]);
        assert_eq!(
            s.apply_hints(&hints),
            schema(vec![("a", DataType::Int64), ("b", DataType::Categorical)])
        );
    }

    #[test]
    fn supertype_widens_shared_columns() -> IngotResult<()> {
        let l = schema(vec![("a", DataType::Int8), ("b", DataType::Utf8)]);
        let r = schema(vec![("c", DataType::Boolean), ("a", DataType::UInt8)]);
        assert_eq!(
            l.supertype(&r)?,
            schema(vec![
                ("a", DataType::Int16),
                ("b", DataType::Utf8),
                ("c", DataType::Boolean),
            ])
        );

        let bad = schema(vec![("b", DataType::Int64)]);
        let err = l.supertype(&bad).unwrap_err();
        assert!(err.to_string().contains("in column 'b'"));
        Ok(())
    }

    #[test]
    fn display_lists_columns() {
        let s = schema(vec![("when", DataType::Date)]);
        let rendered = s.to_string();
        assert!(rendered.contains("when"));
        assert!(rendered.contains("Date"));
        assert_eq!(s.short_string(), "when#Date");
    }
}
