//! Column definitions.

use crate::kind::ColumnKind;
use crate::value::Value;

/// A single typed, named slot within a schema.
///
/// Columns are assembled through a [`SchemaBuilder`](crate::SchemaBuilder)
/// and become immutable once the owning schema is sealed.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    optional: bool,
    default_value: Option<Value>,
}

impl Column {
    /// Creates a required column with no default value.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default_value: None,
        }
    }

    /// Marks the column optional: records may leave it unset.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the default value. Validated against the kind at seal time.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type of the column.
    #[must_use]
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Whether records may leave this column unset.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Default value, if one was declared.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }
}
