//! Dynamic column value type.

use crate::timestamp::TimeStamp;

/// A single column value.
///
/// Mirrors [`ColumnKind`](crate::ColumnKind); whether a given value is legal
/// for a given column is decided by `ColumnKind::check`, not here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value; the declared column width bounds the usable range.
    Integer(i64),
    /// Float value; stored double-precision, narrowed on the wire when the
    /// column is single-precision.
    Float(f64),
    /// Text value.
    Text(String),
    /// Byte array value.
    Bytes(Vec<u8>),
    /// Timestamp value.
    TimeStamp(TimeStamp),
    /// List of values.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::TimeStamp(_) => "timestamp",
            Self::List(_) => "list",
        }
    }

    /// Returns the integer payload, if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<TimeStamp> for Value {
    fn from(v: TimeStamp) -> Self {
        Self::TimeStamp(v)
    }
}
