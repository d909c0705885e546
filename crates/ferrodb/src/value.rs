//! Scalar values and column types.
//!
//! Every cell in a table, every literal in a parsed statement, and
//! every key in a B-Tree index is a [`Value`]. The type is a closed
//! tagged union rather than a trait object: every comparison,
//! coercion, and serialization site matches on it exhaustively.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed scalar value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A double-precision float.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// A boolean.
    Boolean(bool),
    /// SQL NULL.
    Null,
}

impl Value {
    /// Returns the numeric widening of this value, if it is numeric.
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether this value is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The [`ColumnType`] this value's variant belongs to.
    ///
    /// `Null` has no type of its own; callers that need a type for a
    /// `Null` value should consult the column's declared type instead.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Float(_) => Some(ColumnType::Float),
            Self::Text(_) => Some(ColumnType::Text),
            Self::Boolean(_) => Some(ColumnType::Boolean),
            Self::Null => None,
        }
    }

    /// Compares two values under SQL's three-valued logic.
    ///
    /// Returns `None` ("unknown") whenever either side is `Null`;
    /// numeric variants otherwise widen to `f64` before comparing.
    #[must_use]
    pub fn partial_cmp3(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Text(a), Self::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality under three-valued logic: `None` if either side is `Null`.
    #[must_use]
    pub fn eq3(&self, other: &Self) -> Option<bool> {
        self.partial_cmp3(other).map(|o| o == Ordering::Equal)
    }

    /// Total, `Null`-aware ordering used for B-Tree keys and `ORDER BY`.
    ///
    /// Unlike [`partial_cmp3`](Self::partial_cmp3) this never returns
    /// `None`: `Null` sorts less than any non-null value, and two
    /// nulls compare equal. This is the ordering the B-Tree and the
    /// executor's sort step both rely on.
    #[must_use]
    pub fn order_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            _ => self
                .partial_cmp3(other)
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.order_key(other) == Ordering::Equal
    }
}
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.order_key(other))
    }
}
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// A declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// `INTEGER`.
    Integer,
    /// `TEXT`.
    Text,
    /// `FLOAT`.
    Float,
    /// `BOOLEAN`.
    Boolean,
}

impl ColumnType {
    /// Returns the SQL keyword for this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
        }
    }

    /// Coerces `value` to conform to this column type.
    ///
    /// `Null` always conforms (nullability is a separate, `not_null`
    /// constraint checked elsewhere). An `Integer` is widened to
    /// `Float` when the column is declared `FLOAT`. Any other
    /// variant mismatch is rejected.
    pub fn coerce(&self, value: Value) -> Result<Value, Value> {
        match (self, &value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Integer, Value::Integer(_)) => Ok(value),
            (Self::Text, Value::Text(_)) => Ok(value),
            (Self::Boolean, Value::Boolean(_)) => Ok(value),
            (Self::Float, Value::Float(_)) => Ok(value),
            (Self::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            _ => Err(value),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
