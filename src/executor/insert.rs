//! Insert executor implementation.

use crate::access::field::{DataType, Field};
use crate::access::schema::{ColumnInfo, Schema};
use crate::access::tuple::Tuple;
use crate::catalog::TableId;
use crate::error::{DbError, Result};
use crate::executor::{Cursor, ExecutionContext, Executor, Operator};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Single `count` column reported by Insert and Delete.
pub(crate) fn count_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![ColumnInfo::new("count", DataType::Int32)]))
}

pub(crate) fn count_tuple(schema: &Arc<Schema>, count: i32) -> Result<Tuple> {
    Tuple::with_fields(schema.clone(), vec![Field::Int32(count)])
}

/// Executor for inserting the child's rows into a table
///
/// The child is drained once over the executor's lifetime; the first
/// `has_next` performs every insertion and yields one row holding the count.
#[derive(Debug)]
pub struct InsertExecutor {
    context: ExecutionContext,
    tid: TransactionId,
    child: Box<Operator>,
    table_id: TableId,
    table_schema: Arc<Schema>,
    output_schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl InsertExecutor {
    /// Fails if the child's tuples do not fit the table's schema.
    pub fn new(
        context: ExecutionContext,
        tid: TransactionId,
        child: Operator,
        table_id: TableId,
    ) -> Result<Self> {
        let table_schema = context.catalog.tuple_desc(table_id)?;
        check_schema(&table_schema, child.schema())?;

        Ok(Self {
            context,
            tid,
            child: Box::new(child),
            table_id,
            table_schema,
            output_schema: count_schema(),
            done: false,
            cursor: Cursor::default(),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn child(&self) -> &Operator {
        &self.child
    }

    pub(crate) fn set_child(&mut self, child: Operator) -> Result<()> {
        check_schema(&self.table_schema, child.schema())?;
        self.child = Box::new(child);
        Ok(())
    }

    fn insert_all(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let pool = &self.context.buffer_pool;
        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?.detached(self.table_schema.clone())?;
            pool.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        log::debug!("{} inserted {} tuples into table {}", self.tid, count, self.table_id);

        count_tuple(&self.output_schema, count).map(Some)
    }
}

pub(crate) fn check_schema(expected: &Schema, actual: &Schema) -> Result<()> {
    if expected != actual {
        return Err(DbError::SchemaMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

impl Executor for InsertExecutor {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.close();
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.cursor.is_open() && !self.done {
            let summary = self.insert_all()?;
            return self.cursor.has_next(|| Ok(summary));
        }
        self.cursor.has_next(|| Ok(None))
    }

    fn next(&mut self) -> Result<Tuple> {
        self.cursor.next()
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }
}
