//! Filter executor implementation.
//!
//! Passes through the child's tuples that satisfy a predicate, in child
//! order.

use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::error::Result;
use crate::executor::{Cursor, Executor, Operator, Predicate};
use std::sync::Arc;

/// Executor that filters tuples based on a predicate
#[derive(Debug)]
pub struct FilterExecutor {
    /// Child executor that produces tuples
    child: Box<Operator>,
    predicate: Predicate,
    cursor: Cursor,
}

impl FilterExecutor {
    pub fn new(child: Operator, predicate: Predicate) -> Self {
        Self {
            child: Box::new(child),
            predicate,
            cursor: Cursor::default(),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn child(&self) -> &Operator {
        &self.child
    }

    pub(crate) fn set_child(&mut self, child: Operator) -> Result<()> {
        self.child = Box::new(child);
        Ok(())
    }

    fn fetch_next(child: &mut Operator, predicate: &Predicate) -> Result<Option<Tuple>> {
        while child.has_next()? {
            let tuple = child.next()?;
            if predicate.filter(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

impl Executor for FilterExecutor {
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
        let Self {
            child,
            predicate,
            cursor,
        } = self;
        cursor.has_next(|| Self::fetch_next(child, predicate))
    }

    fn next(&mut self) -> Result<Tuple> {
        self.cursor.next()
    }

    fn schema(&self) -> &Arc<Schema> {
        self.child.schema()
    }
}
