use crate::error::{DbError, Result};
use crate::storage::error::StorageError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Ordering;
use std::fmt;

/// Bytes used for the length prefix of a string field.
const STRING_LEN_PREFIX: usize = 4;

/// Column types supported by the storage format.
///
/// Every type has a fixed on-disk width, which is what makes tuple slots
/// fixed-size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int32,
    /// String stored in exactly `max_len` bytes after a length prefix.
    Varchar(usize),
}

impl DataType {
    /// Width of an encoded field of this type.
    pub fn byte_len(&self) -> usize {
        match self {
            DataType::Int32 => 4,
            DataType::Varchar(max_len) => STRING_LEN_PREFIX + max_len,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "INT"),
            DataType::Varchar(max_len) => write!(f, "STRING({})", max_len),
        }
    }
}

/// Comparison operators a predicate can apply to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    Like,
    NotEquals,
}

impl Op {
    pub const ALL: [Op; 7] = [
        Op::Equals,
        Op::GreaterThan,
        Op::LessThan,
        Op::LessThanOrEq,
        Op::GreaterThanOrEq,
        Op::Like,
        Op::NotEquals,
    ];

    /// Looks up an operator by its position in [`Op::ALL`].
    pub fn from_index(index: usize) -> Option<Op> {
        Self::ALL.get(index).copied()
    }

    /// Whether `lhs op rhs` holds given `lhs.cmp(rhs)`. `Like` is treated as
    /// equality here; string containment is handled by the caller.
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Op::Equals | Op::Like => ordering == Ordering::Equal,
            Op::NotEquals => ordering != Ordering::Equal,
            Op::GreaterThan => ordering == Ordering::Greater,
            Op::GreaterThanOrEq => ordering != Ordering::Less,
            Op::LessThan => ordering == Ordering::Less,
            Op::LessThanOrEq => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Op::Equals => "=",
            Op::GreaterThan => ">",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::GreaterThanOrEq => ">=",
            Op::Like => "LIKE",
            Op::NotEquals => "<>",
        };
        f.write_str(symbol)
    }
}

/// A typed scalar value stored in a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int32(i32),
    String(String),
}

impl Field {
    pub fn data_type_matches(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (Field::Int32(_), DataType::Int32) | (Field::String(_), DataType::Varchar(_))
        )
    }

    /// Evaluates `self op operand`.
    ///
    /// Fields of different types never compare true. For strings `Like`
    /// means "contains the operand".
    pub fn compare(&self, op: Op, operand: &Field) -> bool {
        match (self, operand) {
            (Field::Int32(lhs), Field::Int32(rhs)) => op.holds(lhs.cmp(rhs)),
            (Field::String(lhs), Field::String(rhs)) => match op {
                Op::Like => lhs.contains(rhs.as_str()),
                _ => op.holds(lhs.as_str().cmp(rhs.as_str())),
            },
            _ => false,
        }
    }

    /// Appends the fixed-width encoding of this field.
    pub fn write_to(&self, data_type: DataType, out: &mut Vec<u8>) -> Result<()> {
        match (self, data_type) {
            (Field::Int32(value), DataType::Int32) => {
                out.write_i32::<BigEndian>(*value).map_err(StorageError::from)?;
            }
            (Field::String(value), DataType::Varchar(max_len)) => {
                let bytes = truncate_to_boundary(value, max_len).as_bytes();
                out.write_i32::<BigEndian>(bytes.len() as i32)
                    .map_err(StorageError::from)?;
                out.extend_from_slice(bytes);
                out.resize(out.len() + (max_len - bytes.len()), 0);
            }
            _ => {
                return Err(DbError::Schema(format!(
                    "field {} cannot be encoded as {}",
                    self, data_type
                )))
            }
        }
        Ok(())
    }

    /// Decodes one field from the front of `input`, advancing it past the
    /// field's full fixed width.
    pub fn read_from(data_type: DataType, input: &mut &[u8]) -> Result<Field> {
        if input.len() < data_type.byte_len() {
            return Err(DbError::Schema(format!(
                "need {} bytes to decode {}, have {}",
                data_type.byte_len(),
                data_type,
                input.len()
            )));
        }

        match data_type {
            DataType::Int32 => {
                let value = input.read_i32::<BigEndian>().map_err(StorageError::from)?;
                Ok(Field::Int32(value))
            }
            DataType::Varchar(max_len) => {
                let len = input.read_i32::<BigEndian>().map_err(StorageError::from)?;
                if len < 0 || len as usize > max_len {
                    return Err(DbError::Schema(format!(
                        "string length {} out of range for {}",
                        len, data_type
                    )));
                }
                let (body, rest) = input.split_at(max_len);
                let value = std::str::from_utf8(&body[..len as usize])
                    .map_err(|e| DbError::Schema(format!("invalid string field: {}", e)))?
                    .to_string();
                *input = rest;
                Ok(Field::String(value))
            }
        }
    }
}

/// Longest prefix of `value` that fits in `max_len` bytes without splitting a
/// character.
fn truncate_to_boundary(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int32(value) => write!(f, "{}", value),
            Field::String(value) => f.write_str(value),
        }
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Field::Int32(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::String(value.to_string())
    }
}
