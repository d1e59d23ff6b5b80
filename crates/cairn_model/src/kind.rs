//! The closed set of column element types.

use crate::error::{ModelError, ModelResult};
use crate::value::Value;
use cairn_bits::{max_value, min_value};

/// Element type of a column.
///
/// This is a closed set: the SQL mapping and the bit codec both match on it
/// exhaustively, so adding a kind is caught at compile time everywhere it
/// must be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Single boolean, one bit on the wire.
    Bool,
    /// Integer of a fixed bit width and signedness.
    ///
    /// Signed widths range 1..=64, unsigned 1..=63, so every legal value
    /// fits an `i64`. Construct through [`ColumnKind::integer`].
    Integer {
        /// Width in bits.
        bits: u8,
        /// Two's-complement signedness.
        signed: bool,
    },
    /// IEEE-754 float, single or double precision.
    Float {
        /// `true` for 64-bit, `false` for 32-bit.
        double: bool,
    },
    /// Variable-length text.
    Text,
    /// Variable-length byte array.
    Bytes,
    /// Point in time with a coarse UTC offset.
    TimeStamp,
    /// Homogeneous list of up to `max_len` elements.
    List {
        /// Element type.
        element: Box<ColumnKind>,
        /// Largest element count the column admits; also fixes the width
        /// of the count field in the bit encoding.
        max_len: u32,
    },
}

impl ColumnKind {
    /// Creates an integer kind, validating the width against the signedness.
    pub fn integer(bits: u8, signed: bool) -> ModelResult<Self> {
        let max = if signed { 64 } else { 63 };
        if bits == 0 || bits > max {
            return Err(ModelError::InvalidKind {
                message: format!(
                    "{}signed integer width must be 1..={max}, got {bits}",
                    if signed { "" } else { "un" }
                ),
            });
        }
        Ok(Self::Integer { bits, signed })
    }

    /// Creates a list kind over the given element type.
    pub fn list(element: ColumnKind, max_len: u32) -> ModelResult<Self> {
        if max_len == 0 {
            return Err(ModelError::InvalidKind {
                message: "list max_len must be at least 1".into(),
            });
        }
        Ok(Self::List {
            element: Box::new(element),
            max_len,
        })
    }

    /// Short name of the kind, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::TimeStamp => "timestamp",
            Self::List { .. } => "list",
        }
    }

    /// Checks that `value` is of this kind and within its declared domain.
    pub fn check(&self, column: &str, value: &Value) -> ModelResult<()> {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Float { .. }, Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::Bytes, Value::Bytes(_))
            | (Self::TimeStamp, Value::TimeStamp(_)) => Ok(()),
            (Self::Integer { bits, signed }, Value::Integer(n)) => {
                let n = i128::from(*n);
                let min = min_value(u32::from(*bits), *signed);
                let max = max_value(u32::from(*bits), *signed);
                if n < min || n > max {
                    return Err(ModelError::ValueOutOfRange {
                        column: column.to_owned(),
                        message: format!("{n} outside [{min}; {max}]"),
                    });
                }
                Ok(())
            }
            (Self::List { element, max_len }, Value::List(items)) => {
                if items.len() > *max_len as usize {
                    return Err(ModelError::ValueOutOfRange {
                        column: column.to_owned(),
                        message: format!("list has {} elements, maximum is {max_len}", items.len()),
                    });
                }
                for item in items {
                    element.check(column, item)?;
                }
                Ok(())
            }
            _ => Err(ModelError::KindMismatch {
                column: column.to_owned(),
                expected: self.type_name(),
                found: value.type_name(),
            }),
        }
    }
}
