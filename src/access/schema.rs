//! Tuple descriptors.

use crate::access::field::DataType;
use crate::error::{DbError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name and type of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: Option<String>,
    pub data_type: DataType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }

    pub fn unnamed(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }
}

/// Ordered list of columns describing the shape of a tuple.
///
/// Equality and hashing look only at the type sequence; two schemas whose
/// columns are named differently are still interchangeable for storage.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    /// Builds a schema of unnamed columns.
    pub fn from_types(types: impl IntoIterator<Item = DataType>) -> Self {
        Self::new(types.into_iter().map(ColumnInfo::unnamed).collect())
    }

    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    fn column(&self, index: usize) -> Result<&ColumnInfo> {
        self.columns.get(index).ok_or_else(|| {
            DbError::Schema(format!(
                "field index {} out of range for {} fields",
                index,
                self.columns.len()
            ))
        })
    }

    pub fn field_name(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.column(index)?.name.as_deref())
    }

    pub fn field_type(&self, index: usize) -> Result<DataType> {
        Ok(self.column(index)?.data_type)
    }

    /// Index of the first column with the given name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|col| col.name.as_deref() == Some(name))
            .ok_or_else(|| DbError::Schema(format!("no field named '{}'", name)))
    }

    /// Encoded size of one tuple of this schema.
    pub fn byte_size(&self) -> usize {
        self.columns.iter().map(|col| col.data_type.byte_len()).sum()
    }

    /// Concatenates two schemas, `first`'s columns leading.
    pub fn merge(first: &Schema, second: &Schema) -> Schema {
        let columns = first
            .columns
            .iter()
            .chain(second.columns.iter())
            .cloned()
            .collect();
        Schema::new(columns)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.data_type == b.data_type)
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for col in &self.columns {
            col.data_type.hash(state);
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}({})", col.name.as_deref().unwrap_or("null"), col.data_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn users() -> Schema {
        Schema::new(vec![
            ColumnInfo::new("id", DataType::Int32),
            ColumnInfo::new("name", DataType::Varchar(16)),
            ColumnInfo::new("id", DataType::Int32),
        ])
    }

    fn hash_of(schema: &Schema) -> u64 {
        let mut hasher = DefaultHasher::new();
        schema.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_size_is_sum_of_field_widths() {
        assert_eq!(users().byte_size(), 4 + 20 + 4);
        assert_eq!(Schema::from_types([DataType::Int32, DataType::Int32]).byte_size(), 8);
    }

    #[test]
    fn test_equality_ignores_names() {
        let named = users();
        let unnamed =
            Schema::from_types([DataType::Int32, DataType::Varchar(16), DataType::Int32]);
        assert_eq!(named, unnamed);
        assert_eq!(hash_of(&named), hash_of(&unnamed));

        let shorter = Schema::from_types([DataType::Int32, DataType::Varchar(16)]);
        assert_ne!(named, shorter);

        let other_len = Schema::from_types([DataType::Int32, DataType::Varchar(8), DataType::Int32]);
        assert_ne!(named, other_len);
    }

    #[test]
    fn test_accessors() -> anyhow::Result<()> {
        let schema = users();
        assert_eq!(schema.num_fields(), 3);
        assert_eq!(schema.field_name(1)?, Some("name"));
        assert_eq!(schema.field_type(1)?, DataType::Varchar(16));
        assert!(schema.field_name(3).is_err());
        assert!(schema.field_type(7).is_err());

        let unnamed = Schema::from_types([DataType::Int32]);
        assert_eq!(unnamed.field_name(0)?, None);
        Ok(())
    }

    #[test]
    fn test_index_of_returns_first_match() -> anyhow::Result<()> {
        let schema = users();
        assert_eq!(schema.index_of("id")?, 0);
        assert_eq!(schema.index_of("name")?, 1);
        assert!(matches!(schema.index_of("missing"), Err(DbError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_merge() -> anyhow::Result<()> {
        let left = Schema::new(vec![ColumnInfo::new("a", DataType::Int32)]);
        let right = Schema::new(vec![
            ColumnInfo::new("b", DataType::Varchar(4)),
            ColumnInfo::unnamed(DataType::Int32),
        ]);
        let merged = Schema::merge(&left, &right);

        assert_eq!(merged.num_fields(), 3);
        assert_eq!(merged.field_name(0)?, Some("a"));
        assert_eq!(merged.field_name(1)?, Some("b"));
        assert_eq!(merged.field_name(2)?, None);
        assert_eq!(merged.byte_size(), 4 + 8 + 4);
        Ok(())
    }

    #[test]
    fn test_display() {
        let schema = Schema::new(vec![
            ColumnInfo::new("id", DataType::Int32),
            ColumnInfo::unnamed(DataType::Varchar(3)),
        ]);
        assert_eq!(schema.to_string(), "id(INT), null(STRING(3))");
    }
}
