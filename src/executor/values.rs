//! Leaf executor over an in-memory list of tuples.

use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::error::{DbError, Result};
use crate::executor::{Cursor, Executor};
use std::sync::Arc;

#[derive(Debug)]
pub struct ValuesExecutor {
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    position: usize,
    cursor: Cursor,
}

impl ValuesExecutor {
    /// Fails if any tuple's schema differs from `schema`.
    pub fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> Result<Self> {
        if let Some(bad) = tuples.iter().find(|t| **t.schema() != *schema) {
            return Err(DbError::SchemaMismatch {
                expected: schema.to_string(),
                actual: bad.schema().to_string(),
            });
        }

        Ok(Self {
            schema,
            tuples,
            position: 0,
            cursor: Cursor::default(),
        })
    }
}

impl Executor for ValuesExecutor {
    fn open(&mut self) -> Result<()> {
        self.position = 0;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.cursor.close();
    }

    fn has_next(&mut self) -> Result<bool> {
        let Self {
            tuples,
            position,
            cursor,
            ..
        } = self;
        cursor.has_next(|| {
            let tuple = tuples.get(*position).cloned();
            if tuple.is_some() {
                *position += 1;
            }
            Ok(tuple)
        })
    }

    fn next(&mut self) -> Result<Tuple> {
        self.cursor.next()
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
