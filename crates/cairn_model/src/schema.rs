//! Schema construction and sealing.
//!
//! Schemas go through two distinct types: a mutable [`SchemaBuilder`] and an
//! immutable [`Schema`] that can only be obtained by consuming a builder
//! through [`SchemaBuilder::seal`]. There is no way back, and no runtime
//! "is it sealed" flag to check.

use crate::column::Column;
use crate::error::{ModelError, ModelResult};
use crate::kind::ColumnKind;

/// Largest number of columns a single schema (model slot) may declare.
pub const MAX_COLUMNS: usize = 256;

/// An index declaration, expressed over column names.
///
/// Resolved to column positions when the owning schema is sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    name: String,
    columns: Vec<String>,
    unique: bool,
    primary_key: bool,
    auto_increment: bool,
}

impl IndexSpec {
    /// A plain (non-unique) index over the given columns.
    pub fn plain(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// A uniqueness constraint over the given columns.
    pub fn unique(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            unique: true,
            ..Self::plain(name, columns)
        }
    }

    /// The primary key over the given columns.
    pub fn primary_key(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            unique: true,
            primary_key: true,
            ..Self::plain(name, columns)
        }
    }

    /// An auto-incrementing integer primary key over a single column.
    pub fn auto_increment(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            unique: true,
            primary_key: true,
            auto_increment: true,
            ..Self::plain(name, vec![column.into()])
        }
    }
}

/// An index over one or more columns of a sealed schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: String,
    positions: Vec<usize>,
    unique: bool,
    primary_key: bool,
    auto_increment: bool,
}

impl Index {
    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positions of the indexed columns, in index order.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Whether the index enforces uniqueness.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the index is the schema's primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the key value is assigned by the storage backend on insert.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Whether the index covers exactly one column.
    #[must_use]
    pub fn is_single_column(&self) -> bool {
        self.positions.len() == 1
    }
}

/// Mutable schema under construction.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    model_id: u64,
    schema_number: u32,
    name: String,
    columns: Vec<Column>,
    indexes: Vec<IndexSpec>,
}

impl SchemaBuilder {
    /// Starts a new schema in the given model namespace.
    pub fn new(model_id: u64, schema_number: u32, name: impl Into<String>) -> Self {
        Self {
            model_id,
            schema_number,
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Appends a column. Name collisions are reported at seal time.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index declaration.
    #[must_use]
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Seals the schema, consuming the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaBuild`] on: zero columns, more than
    /// [`MAX_COLUMNS`] columns, duplicate column names (case-insensitive),
    /// an index naming an unknown column, no primary key, more than one
    /// primary key, an auto-incrementing key that is not a single integer
    /// column, an optional primary-key column, or a default value that does
    /// not fit its column's kind.
    pub fn seal(self) -> ModelResult<Schema> {
        let schema_name = self.name;

        if self.columns.is_empty() {
            return Err(ModelError::schema_build(&schema_name, "schema has no columns"));
        }
        if self.columns.len() > MAX_COLUMNS {
            return Err(ModelError::schema_build(
                &schema_name,
                format!(
                    "schema has {} columns, the maximum is {MAX_COLUMNS}",
                    self.columns.len()
                ),
            ));
        }

        // Duplicate names, case-insensitive.
        let lowered: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.name().to_lowercase())
            .collect();
        for (i, name) in lowered.iter().enumerate() {
            if lowered[..i].contains(name) {
                return Err(ModelError::schema_build(
                    &schema_name,
                    format!("duplicate column name \"{}\"", self.columns[i].name()),
                ));
            }
        }

        // Default values must fit their columns.
        for column in &self.columns {
            if let Some(default) = column.default_value() {
                column.kind().check(column.name(), default)?;
            }
        }

        // Resolve index column names to positions.
        let mut indexes = Vec::with_capacity(self.indexes.len());
        let mut primary_key = None;
        for spec in self.indexes {
            let mut positions = Vec::with_capacity(spec.columns.len());
            for col_name in &spec.columns {
                let position = lowered
                    .iter()
                    .position(|n| n == &col_name.to_lowercase())
                    .ok_or_else(|| {
                        ModelError::schema_build(
                            &schema_name,
                            format!("index \"{}\" names unknown column \"{col_name}\"", spec.name),
                        )
                    })?;
                positions.push(position);
            }
            if positions.is_empty() {
                return Err(ModelError::schema_build(
                    &schema_name,
                    format!("index \"{}\" covers no columns", spec.name),
                ));
            }

            let index = Index {
                name: spec.name,
                positions,
                unique: spec.unique,
                primary_key: spec.primary_key,
                auto_increment: spec.auto_increment,
            };

            if index.primary_key {
                if primary_key.is_some() {
                    return Err(ModelError::schema_build(
                        &schema_name,
                        "schema declares more than one primary key",
                    ));
                }
                if index.auto_increment {
                    let single_integer = index.is_single_column()
                        && matches!(
                            self.columns[index.positions[0]].kind(),
                            ColumnKind::Integer { .. }
                        );
                    if !single_integer {
                        return Err(ModelError::schema_build(
                            &schema_name,
                            "an auto-incrementing key must be a single integer column",
                        ));
                    }
                }
                for &position in &index.positions {
                    if self.columns[position].is_optional() {
                        return Err(ModelError::schema_build(
                            &schema_name,
                            format!(
                                "primary-key column \"{}\" cannot be optional",
                                self.columns[position].name()
                            ),
                        ));
                    }
                }
                primary_key = Some(indexes.len());
            }
            indexes.push(index);
        }

        let Some(primary_key) = primary_key else {
            return Err(ModelError::schema_build(&schema_name, "no primary key declared"));
        };

        Ok(Schema {
            model_id: self.model_id,
            schema_number: self.schema_number,
            name: schema_name,
            columns: self.columns,
            indexes,
            primary_key,
        })
    }
}

/// A sealed, immutable schema: named, versioned, ordered columns plus
/// indexes, belonging to a model namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    model_id: u64,
    schema_number: u32,
    name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    /// Position of the primary key within `indexes`.
    primary_key: usize,
}

impl Schema {
    /// Stable identifier of the model namespace this schema belongs to.
    #[must_use]
    pub fn model_id(&self) -> u64 {
        self.model_id
    }

    /// Position of this schema within its model.
    #[must_use]
    pub fn schema_number(&self) -> u32 {
        self.schema_number
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column at the given position.
    #[must_use]
    pub fn column(&self, position: usize) -> &Column {
        &self.columns[position]
    }

    /// Finds a column position by case-insensitive name.
    pub fn position_of(&self, name: &str) -> ModelResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::NoSuchColumn {
                name: name.to_owned(),
            })
    }

    /// All indexes, primary key included.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// The primary key index.
    #[must_use]
    pub fn primary_key(&self) -> &Index {
        &self.indexes[self.primary_key]
    }

    /// Position of the auto-incrementing key column, if the schema has one.
    #[must_use]
    pub fn auto_increment_position(&self) -> Option<usize> {
        let pk = self.primary_key();
        if pk.is_auto_increment() {
            Some(pk.positions()[0])
        } else {
            None
        }
    }
}
