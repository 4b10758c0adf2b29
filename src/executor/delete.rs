//! Delete executor implementation.

use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::error::Result;
use crate::executor::insert::{count_schema, count_tuple};
use crate::executor::{Cursor, ExecutionContext, Executor, Operator};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Executor that deletes every tuple its child produces from the page the
/// tuple was read from. Like insert, it drains the child once and yields a
/// single `count` row.
#[derive(Debug)]
pub struct DeleteExecutor {
    context: ExecutionContext,
    tid: TransactionId,
    child: Box<Operator>,
    output_schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl DeleteExecutor {
    pub fn new(context: ExecutionContext, tid: TransactionId, child: Operator) -> Self {
        Self {
            context,
            tid,
            child: Box::new(child),
            output_schema: count_schema(),
            done: false,
            cursor: Cursor::default(),
        }
    }

    pub fn child(&self) -> &Operator {
        &self.child
    }

    pub(crate) fn set_child(&mut self, child: Operator) -> Result<()> {
        self.child = Box::new(child);
        Ok(())
    }

    fn delete_all(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.context.buffer_pool.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        log::debug!("{} deleted {} tuples", self.tid, count);

        count_tuple(&self.output_schema, count).map(Some)
    }
}

impl Executor for DeleteExecutor {
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
            let summary = self.delete_all()?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::field::{DataType, Field, Op};
    use crate::access::heap::HeapFile;
    use crate::catalog::{Catalog, TableId};
    use crate::error::DbError;
    use crate::executor::{collect_all, FilterExecutor, Predicate, SeqScanExecutor, ValuesExecutor};
    use crate::storage::buffer::BufferPool;
    use std::time::Duration;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        context: ExecutionContext,
        table_id: TableId,
        schema: Arc<Schema>,
    }

    fn setup(rows: &[i32]) -> anyhow::Result<Fixture> {
        let dir = tempdir()?;
        let schema = Arc::new(Schema::from_types([DataType::Int32]));
        let file = Arc::new(HeapFile::open(&dir.path().join("t.dat"), schema.clone(), 64)?);
        let catalog = Arc::new(Catalog::new());
        let table_id = catalog.add_table(file, "t");
        let pool = Arc::new(BufferPool::new(catalog.clone(), 8, Duration::from_millis(50)));

        let writer = TransactionId::new(1);
        for &v in rows {
            pool.insert_tuple(writer, table_id, Tuple::with_fields(schema.clone(), vec![Field::Int32(v)])?)?;
        }
        pool.transaction_complete(writer, true)?;

        Ok(Fixture {
            _dir: dir,
            context: ExecutionContext::new(catalog, pool),
            table_id,
            schema,
        })
    }

    fn scan(fx: &Fixture, tid: TransactionId) -> anyhow::Result<Operator> {
        Ok(SeqScanExecutor::new(fx.context.clone(), tid, fx.table_id)?.into())
    }

    #[test]
    fn test_delete_matching_rows() -> anyhow::Result<()> {
        let fx = setup(&[1, 2, 3, 4])?;
        let tid = TransactionId::new(2);
        let child = FilterExecutor::new(scan(&fx, tid)?, Predicate::new(0, Op::LessThan, Field::Int32(3)));
        let mut delete = DeleteExecutor::new(fx.context.clone(), tid, child.into());

        let rows = collect_all(&mut delete)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field(0), Some(&Field::Int32(2)));

        let remaining = collect_all(&mut scan(&fx, tid)?)?;
        let values: Vec<_> = remaining.iter().map(|t| t.field(0).cloned()).collect();
        assert_eq!(values, vec![Some(Field::Int32(3)), Some(Field::Int32(4))]);
        Ok(())
    }

    #[test]
    fn test_delete_unstored_tuple_fails() -> anyhow::Result<()> {
        let fx = setup(&[])?;
        let loose = Tuple::with_fields(fx.schema.clone(), vec![Field::Int32(1)])?;
        let child = ValuesExecutor::new(fx.schema.clone(), vec![loose])?;
        let mut delete = DeleteExecutor::new(fx.context.clone(), TransactionId::new(2), child.into());

        delete.open()?;
        assert!(matches!(delete.has_next(), Err(DbError::TupleNotStored)));
        Ok(())
    }

    #[test]
    fn test_delete_reports_once() -> anyhow::Result<()> {
        let fx = setup(&[5])?;
        let tid = TransactionId::new(2);
        let mut delete = DeleteExecutor::new(fx.context.clone(), tid, scan(&fx, tid)?);

        delete.open()?;
        assert!(delete.has_next()?);
        assert_eq!(delete.next()?.field(0), Some(&Field::Int32(1)));
        assert!(!delete.has_next()?);
        delete.rewind()?;
        assert!(!delete.has_next()?);
        Ok(())
    }
}
