//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building schemas or manipulating records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Schema construction failed at seal time.
    ///
    /// Fatal to the schema being built; the builder is consumed either way.
    #[error("cannot seal schema \"{schema}\": {message}")]
    SchemaBuild {
        /// Name of the schema that failed to seal.
        schema: String,
        /// What went wrong.
        message: String,
    },

    /// A column kind was declared with an unsupported shape.
    #[error("invalid column kind: {message}")]
    InvalidKind {
        /// What is wrong with the declaration.
        message: String,
    },

    /// No column with the given name exists in the schema.
    #[error("no column named \"{name}\"")]
    NoSuchColumn {
        /// The unknown column name.
        name: String,
    },

    /// A value of the wrong kind was offered to a column.
    #[error("column \"{column}\" holds {expected}, got {found}")]
    KindMismatch {
        /// Name of the column.
        column: String,
        /// Kind the column was declared with.
        expected: &'static str,
        /// Kind of the offered value.
        found: &'static str,
    },

    /// A value lies outside the range its column's declared width admits.
    #[error("value out of range for column \"{column}\": {message}")]
    ValueOutOfRange {
        /// Name of the column.
        column: String,
        /// Which bound was violated.
        message: String,
    },

    /// A non-optional column holds no value where one is required.
    #[error("record is incomplete: column \"{column}\" has no value")]
    IncompleteRecord {
        /// The unset column.
        column: String,
    },

    /// Bit stream failure while encoding or decoding values.
    #[error("bit codec error: {0}")]
    Bits(#[from] cairn_bits::BitsError),
}

impl ModelError {
    /// Creates a seal-time schema construction error.
    pub fn schema_build(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaBuild {
            schema: schema.into(),
            message: message.into(),
        }
    }
}
