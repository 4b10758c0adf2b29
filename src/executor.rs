//! Executor layer for query execution.
//!
//! Pull-based operators composed into trees. Every operator follows the same
//! life cycle: `open` it, alternate `has_next` / `next` until `has_next`
//! reports exhaustion, optionally `rewind`, then `close`. `has_next` and
//! `next` are only valid while open, and `next` only returns the tuple a
//! preceding `has_next` confirmed.
//!
//! Operator trees are built from the `Operator` sum type, each node owning
//! its children.

use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::catalog::Catalog;
use crate::error::{DbError, Result};
use crate::storage::buffer::BufferPool;
use std::sync::Arc;

pub mod delete;
pub mod filter;
pub mod insert;
pub mod predicate;
pub mod seq_scan;
pub mod values;

pub use delete::DeleteExecutor;
pub use filter::FilterExecutor;
pub use insert::InsertExecutor;
pub use predicate::Predicate;
pub use seq_scan::SeqScanExecutor;
pub use values::ValuesExecutor;

/// Trait for all query executors
pub trait Executor: Send {
    /// Prepares the executor (and its children) to produce tuples.
    fn open(&mut self) -> Result<()>;

    /// Releases the executor's cursor. Safe to call more than once.
    fn close(&mut self);

    /// True if another tuple is available. Fetches it ahead of `next`.
    fn has_next(&mut self) -> Result<bool>;

    /// Returns the tuple confirmed by the preceding `has_next`.
    fn next(&mut self) -> Result<Tuple>;

    /// Restarts the executor from its first tuple.
    fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    /// Schema of the tuples this executor produces.
    fn schema(&self) -> &Arc<Schema>;
}

/// Execution context containing shared resources
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub catalog: Arc<Catalog>,
    pub buffer_pool: Arc<BufferPool>,
}

impl ExecutionContext {
    pub fn new(catalog: Arc<Catalog>, buffer_pool: Arc<BufferPool>) -> Self {
        Self {
            catalog,
            buffer_pool,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    #[default]
    Unopened,
    Open,
    Closed,
}

/// Life-cycle state and one-tuple lookahead shared by every operator.
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    state: CursorState,
    lookahead: Option<Tuple>,
}

impl Cursor {
    pub(crate) fn open(&mut self) {
        self.state = CursorState::Open;
        self.lookahead = None;
    }

    pub(crate) fn close(&mut self) {
        self.state = CursorState::Closed;
        self.lookahead = None;
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state == CursorState::Open
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            CursorState::Open => Ok(()),
            CursorState::Unopened => Err(DbError::IteratorState("operator not opened")),
            CursorState::Closed => Err(DbError::IteratorState("operator closed")),
        }
    }

    /// Fills the lookahead with `fetch` unless a tuple is already waiting.
    pub(crate) fn has_next(
        &mut self,
        fetch: impl FnOnce() -> Result<Option<Tuple>>,
    ) -> Result<bool> {
        self.ensure_open()?;
        if self.lookahead.is_none() {
            self.lookahead = fetch()?;
        }
        Ok(self.lookahead.is_some())
    }

    pub(crate) fn next(&mut self) -> Result<Tuple> {
        self.ensure_open()?;
        self.lookahead
            .take()
            .ok_or(DbError::NoSuchElement("next called without a pending tuple"))
    }
}

/// A node of an operator tree.
#[derive(Debug)]
pub enum Operator {
    SeqScan(SeqScanExecutor),
    Filter(FilterExecutor),
    Insert(InsertExecutor),
    Delete(DeleteExecutor),
    Values(ValuesExecutor),
}

impl Operator {
    fn as_executor(&self) -> &dyn Executor {
        match self {
            Operator::SeqScan(op) => op,
            Operator::Filter(op) => op,
            Operator::Insert(op) => op,
            Operator::Delete(op) => op,
            Operator::Values(op) => op,
        }
    }

    fn as_executor_mut(&mut self) -> &mut dyn Executor {
        match self {
            Operator::SeqScan(op) => op,
            Operator::Filter(op) => op,
            Operator::Insert(op) => op,
            Operator::Delete(op) => op,
            Operator::Values(op) => op,
        }
    }

    pub fn children(&self) -> Vec<&Operator> {
        match self {
            Operator::SeqScan(_) | Operator::Values(_) => Vec::new(),
            Operator::Filter(op) => vec![op.child()],
            Operator::Insert(op) => vec![op.child()],
            Operator::Delete(op) => vec![op.child()],
        }
    }

    /// Replaces this node's children. Leaves accept only an empty list;
    /// every other operator takes exactly one child.
    pub fn set_children(&mut self, children: Vec<Operator>) -> Result<()> {
        let expected = match self {
            Operator::SeqScan(_) | Operator::Values(_) => 0,
            _ => 1,
        };
        if children.len() != expected {
            return Err(DbError::Schema(format!(
                "operator takes {} children, got {}",
                expected,
                children.len()
            )));
        }

        let Some(child) = children.into_iter().next() else {
            return Ok(());
        };
        match self {
            Operator::Filter(op) => op.set_child(child),
            Operator::Insert(op) => op.set_child(child),
            Operator::Delete(op) => op.set_child(child),
            Operator::SeqScan(_) | Operator::Values(_) => Ok(()),
        }
    }
}

impl Executor for Operator {
    fn open(&mut self) -> Result<()> {
        self.as_executor_mut().open()
    }

    fn close(&mut self) {
        self.as_executor_mut().close()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.as_executor_mut().has_next()
    }

    fn next(&mut self) -> Result<Tuple> {
        self.as_executor_mut().next()
    }

    fn rewind(&mut self) -> Result<()> {
        self.as_executor_mut().rewind()
    }

    fn schema(&self) -> &Arc<Schema> {
        self.as_executor().schema()
    }
}

impl From<SeqScanExecutor> for Operator {
    fn from(op: SeqScanExecutor) -> Self {
        Operator::SeqScan(op)
    }
}

impl From<FilterExecutor> for Operator {
    fn from(op: FilterExecutor) -> Self {
        Operator::Filter(op)
    }
}

impl From<InsertExecutor> for Operator {
    fn from(op: InsertExecutor) -> Self {
        Operator::Insert(op)
    }
}

impl From<DeleteExecutor> for Operator {
    fn from(op: DeleteExecutor) -> Self {
        Operator::Delete(op)
    }
}

impl From<ValuesExecutor> for Operator {
    fn from(op: ValuesExecutor) -> Self {
        Operator::Values(op)
    }
}

/// Drains `op` from open to close, collecting every tuple.
pub fn collect_all(op: &mut impl Executor) -> Result<Vec<Tuple>> {
    op.open()?;
    let mut tuples = Vec::new();
    while op.has_next()? {
        tuples.push(op.next()?);
    }
    op.close();
    Ok(tuples)
}
