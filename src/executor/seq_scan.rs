//! Sequential scan executor implementation.

use crate::access::scan::HeapFileIterator;
use crate::access::schema::{ColumnInfo, Schema};
use crate::access::tuple::Tuple;
use crate::catalog::TableId;
use crate::error::Result;
use crate::executor::{Cursor, ExecutionContext, Executor};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Reads every tuple of one table inside a transaction.
///
/// Output columns are named `alias.field`; a missing alias or field name is
/// rendered as `null`.
#[derive(Debug)]
pub struct SeqScanExecutor {
    context: ExecutionContext,
    tid: TransactionId,
    table_id: TableId,
    table_name: String,
    alias: Option<String>,
    schema: Arc<Schema>,
    iter: Option<HeapFileIterator>,
    cursor: Cursor,
}

impl SeqScanExecutor {
    /// Scan aliased by the table's own name.
    pub fn new(context: ExecutionContext, tid: TransactionId, table_id: TableId) -> Result<Self> {
        let table_name = context.catalog.table_name(table_id)?;
        Self::with_alias(context, tid, table_id, Some(table_name))
    }

    pub fn with_alias(
        context: ExecutionContext,
        tid: TransactionId,
        table_id: TableId,
        alias: Option<String>,
    ) -> Result<Self> {
        let mut scan = Self {
            context,
            tid,
            table_id,
            table_name: String::new(),
            alias: None,
            schema: Arc::new(Schema::new(Vec::new())),
            iter: None,
            cursor: Cursor::default(),
        };
        scan.reset(table_id, alias)?;
        Ok(scan)
    }

    /// Points the scan at another table and alias. The scan must be opened
    /// again before use.
    pub fn reset(&mut self, table_id: TableId, alias: Option<String>) -> Result<()> {
        let table_name = self.context.catalog.table_name(table_id)?;
        let table_schema = self.context.catalog.tuple_desc(table_id)?;

        let prefix = alias.as_deref().unwrap_or("null");
        let columns = table_schema
            .columns()
            .iter()
            .map(|column| {
                let name = column.name.as_deref().unwrap_or("null");
                ColumnInfo::new(format!("{}.{}", prefix, name), column.data_type)
            })
            .collect();

        self.close();
        self.table_id = table_id;
        self.table_name = table_name;
        self.alias = alias;
        self.schema = Arc::new(Schema::new(columns));
        Ok(())
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl Executor for SeqScanExecutor {
    fn open(&mut self) -> Result<()> {
        let file = self.context.catalog.database_file(self.table_id)?;
        let mut iter = file.iterator(self.tid, self.context.buffer_pool.clone());
        iter.open()?;
        self.iter = Some(iter);
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        if let Some(iter) = self.iter.as_mut() {
            iter.close();
        }
        self.iter = None;
        self.cursor.close();
    }

    fn has_next(&mut self) -> Result<bool> {
        let Self {
            iter,
            cursor,
            schema,
            ..
        } = self;
        cursor.has_next(|| {
            let Some(iter) = iter.as_mut() else {
                return Ok(None);
            };
            if !iter.has_next()? {
                return Ok(None);
            }
            let mut tuple = iter.next()?;
            tuple.set_schema(schema.clone())?;
            Ok(Some(tuple))
        })
    }

    fn next(&mut self) -> Result<Tuple> {
        self.cursor.next()
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
