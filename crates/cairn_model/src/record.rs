//! Records: mutable value containers bound to one schema.

use crate::error::{ModelError, ModelResult};
use crate::schema::Schema;
use crate::value::Value;
use std::sync::Arc;

/// Overall value-completeness of a record.
///
/// Derived on demand from the per-column slots, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// No column holds a value yet.
    Unset,
    /// Some values are set, but at least one non-optional column is not.
    Partial,
    /// Every non-optional column holds a value; the record is storable.
    Complete,
}

/// A mutable instance of values conforming to one [`Schema`].
///
/// Stores one value (or "unset") per column. Incomplete records are a
/// first-class state - a form being filled in stays partial until every
/// non-optional column has a value - and they round-trip unchanged until
/// completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Creates a record with every column unset.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![None; schema.columns().len()];
        Self { schema, values }
    }

    /// The schema this record conforms to.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Sets a column value by name, validating it against the column kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let position = self.schema.position_of(name)?;
        self.set_at(position, value.into())
    }

    /// Sets a column value by position, validating it against the column kind.
    pub fn set_at(&mut self, position: usize, value: Value) -> ModelResult<()> {
        let column = self.schema.column(position);
        column.kind().check(column.name(), &value)?;
        self.values[position] = Some(value);
        Ok(())
    }

    /// Returns a column value by name, or `None` when unset.
    pub fn get(&self, name: &str) -> ModelResult<Option<&Value>> {
        Ok(self.get_at(self.schema.position_of(name)?))
    }

    /// Returns a column value by position, or `None` when unset.
    #[must_use]
    pub fn get_at(&self, position: usize) -> Option<&Value> {
        self.values[position].as_ref()
    }

    /// Whether the column at the given position holds a value.
    #[must_use]
    pub fn is_set(&self, position: usize) -> bool {
        self.values[position].is_some()
    }

    /// Clears a column value by name, returning the previous value.
    ///
    /// Clearing a non-optional column is allowed - it is the one
    /// intentional way a record moves backward from complete to partial -
    /// but it never happens implicitly.
    pub fn clear(&mut self, name: &str) -> ModelResult<Option<Value>> {
        let position = self.schema.position_of(name)?;
        Ok(self.clear_at(position))
    }

    /// Clears a column value by position, returning the previous value.
    pub fn clear_at(&mut self, position: usize) -> Option<Value> {
        self.values[position].take()
    }

    /// Fills every unset column that declares a default value.
    pub fn apply_defaults(&mut self) {
        for (position, column) in self.schema.columns().iter().enumerate() {
            if self.values[position].is_none() {
                if let Some(default) = column.default_value() {
                    self.values[position] = Some(default.clone());
                }
            }
        }
    }

    /// Derives the record's overall completeness.
    #[must_use]
    pub fn completeness(&self) -> Completeness {
        if self.values.iter().all(Option::is_none) {
            return Completeness::Unset;
        }
        let all_required_set = self
            .schema
            .columns()
            .iter()
            .enumerate()
            .all(|(position, column)| column.is_optional() || self.values[position].is_some());
        if all_required_set {
            Completeness::Complete
        } else {
            Completeness::Partial
        }
    }

    /// Whether every non-optional column holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completeness() == Completeness::Complete
    }

    /// Returns the first non-optional column that holds no value, if any.
    #[must_use]
    pub fn first_missing(&self) -> Option<&str> {
        self.schema
            .columns()
            .iter()
            .enumerate()
            .find(|(position, column)| !column.is_optional() && self.values[*position].is_none())
            .map(|(_, column)| column.name())
    }

    /// Extracts a lightweight reference from the primary-key columns.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompleteRecord`] when a key column is unset.
    pub fn reference(&self) -> ModelResult<RecordReference> {
        let key = self.schema.primary_key();
        let mut key_values = Vec::with_capacity(key.positions().len());
        for &position in key.positions() {
            let value = self.values[position].clone().ok_or_else(|| {
                ModelError::IncompleteRecord {
                    column: self.schema.column(position).name().to_owned(),
                }
            })?;
            key_values.push(value);
        }
        Ok(RecordReference {
            schema: Arc::clone(&self.schema),
            key_values,
        })
    }
}

/// Schema plus primary-key values: refers to a record without carrying its
/// full payload (foreign-key-like relationships).
#[derive(Debug, Clone)]
pub struct RecordReference {
    schema: Arc<Schema>,
    key_values: Vec<Value>,
}

impl RecordReference {
    /// The schema of the referenced record.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Primary-key values in key order.
    #[must_use]
    pub fn key_values(&self) -> &[Value] {
        &self.key_values
    }
}

impl PartialEq for RecordReference {
    fn eq(&self, other: &Self) -> bool {
        self.schema.model_id() == other.schema.model_id()
            && self.schema.schema_number() == other.schema.schema_number()
            && self.key_values == other.key_values
    }
}
