use crate::access::field::{Field, Op};
use crate::access::tuple::Tuple;
use std::fmt;

/// Compares one field of a tuple against a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: Op, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// True if `tuple`'s field satisfies `field op operand`. An unset or
    /// out-of-range field never matches.
    pub fn filter(&self, tuple: &Tuple) -> bool {
        tuple
            .field(self.field)
            .is_some_and(|value| value.compare(self.op, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {} {} {}", self.field, self.op, self.operand)
    }
}
