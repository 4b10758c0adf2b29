use crate::access::field::Field;
use crate::access::schema::Schema;
use crate::error::{DbError, Result};
use crate::storage::page::PageId;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Location of a tuple: the page it lives on and its slot within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TupleId {
    pub page_id: PageId,
    pub slot_id: u16,
}

impl TupleId {
    pub fn new(page_id: PageId, slot_id: u16) -> Self {
        Self { page_id, slot_id }
    }
}

impl PartialOrd for TupleId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TupleId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.page_id
            .cmp(&other.page_id)
            .then(self.slot_id.cmp(&other.slot_id))
    }
}

/// A row: one optional field per schema column plus the row's current
/// storage location.
///
/// The location is stamped by the storage layer on decode or insert; callers
/// never set it directly.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Option<Field>>,
    tuple_id: Option<TupleId>,
}

impl Tuple {
    /// Creates a tuple with every field unset.
    pub fn new(schema: Arc<Schema>) -> Self {
        let fields = vec![None; schema.num_fields()];
        Self {
            schema,
            fields,
            tuple_id: None,
        }
    }

    /// Creates a fully populated tuple, checking arity and types.
    pub fn with_fields(schema: Arc<Schema>, fields: Vec<Field>) -> Result<Self> {
        if fields.len() != schema.num_fields() {
            return Err(DbError::Schema(format!(
                "tuple has {} fields but schema has {}",
                fields.len(),
                schema.num_fields()
            )));
        }
        let mut tuple = Self::new(schema);
        for (i, field) in fields.into_iter().enumerate() {
            tuple.set_field(i, field)?;
        }
        Ok(tuple)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn tuple_id(&self) -> Option<TupleId> {
        self.tuple_id
    }

    pub(crate) fn set_tuple_id(&mut self, tuple_id: Option<TupleId>) {
        self.tuple_id = tuple_id;
    }

    /// The field at `index`, or `None` if the index is out of range or the
    /// field has not been set.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index).and_then(Option::as_ref)
    }

    pub fn set_field(&mut self, index: usize, field: Field) -> Result<()> {
        let data_type = self.schema.field_type(index)?;
        if !field.data_type_matches(data_type) {
            return Err(DbError::Schema(format!(
                "field {} does not match column {} of type {}",
                field, index, data_type
            )));
        }
        self.fields[index] = Some(field);
        Ok(())
    }

    pub fn fields(&self) -> impl Iterator<Item = Option<&Field>> {
        self.fields.iter().map(Option::as_ref)
    }

    /// Relabels the tuple with a schema of the same column types, keeping
    /// its fields and storage location.
    pub fn set_schema(&mut self, schema: Arc<Schema>) -> Result<()> {
        if *self.schema != *schema {
            return Err(DbError::SchemaMismatch {
                expected: schema.to_string(),
                actual: self.schema.to_string(),
            });
        }
        self.schema = schema;
        Ok(())
    }

    /// Copies the field values into a new, unplaced tuple of `schema`.
    pub fn detached(&self, schema: Arc<Schema>) -> Result<Tuple> {
        if *self.schema != *schema {
            return Err(DbError::SchemaMismatch {
                expected: schema.to_string(),
                actual: self.schema.to_string(),
            });
        }
        Ok(Tuple {
            schema,
            fields: self.fields.clone(),
            tuple_id: None,
        })
    }

    /// Appends the slot encoding of this tuple: each field's fixed-width
    /// encoding in schema order.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            let field = field
                .as_ref()
                .ok_or_else(|| DbError::Schema(format!("field {} is not set", i)))?;
            field.write_to(self.schema.field_type(i)?, out)?;
        }
        Ok(())
    }

    /// Decodes a tuple from one slot's bytes.
    pub fn read_from(schema: Arc<Schema>, mut input: &[u8]) -> Result<Tuple> {
        let mut fields = Vec::with_capacity(schema.num_fields());
        for col in schema.columns() {
            fields.push(Some(Field::read_from(col.data_type, &mut input)?));
        }
        Ok(Tuple {
            schema,
            fields,
            tuple_id: None,
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.fields == other.fields
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            match field {
                Some(field) => write!(f, "{}", field)?,
                None => f.write_str("null")?,
            }
        }
        Ok(())
    }
}
