//! Generic SQL mapping: schema to table definition and statement templates.
//!
//! Backend-independent; everything engine-specific comes in through the
//! [`SqlDialect`] trait.

use crate::dialect::SqlDialect;
use cairn_model::{ColumnKind, Schema};

/// How a model column is carried by its SQL column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SqlRepr {
    /// Boolean stored as 0/1 integer.
    Bool,
    /// Integer stored natively.
    Integer,
    /// Float stored natively.
    Float,
    /// Text stored natively.
    Text,
    /// Byte array stored natively as a blob.
    Bytes,
    /// Timestamp stored as RFC 3339 text.
    TimeStamp,
    /// No natural relational shape; value serialized to a blob with the
    /// bit codec.
    CodecBlob,
}

impl SqlRepr {
    fn for_kind(kind: &ColumnKind) -> Self {
        match kind {
            ColumnKind::Bool => Self::Bool,
            ColumnKind::Integer { .. } => Self::Integer,
            ColumnKind::Float { .. } => Self::Float,
            ColumnKind::Text => Self::Text,
            ColumnKind::Bytes => Self::Bytes,
            ColumnKind::TimeStamp => Self::TimeStamp,
            ColumnKind::List { .. } => Self::CodecBlob,
        }
    }
}

/// One SQL column, mapped from one model column.
#[derive(Debug, Clone)]
pub(crate) struct SqlColumn {
    /// Sanitized SQL column name.
    pub name: String,
    /// Position of the source column in the schema.
    pub position: usize,
    /// Value representation in the backend.
    pub repr: SqlRepr,
}

/// A schema mapped to a backend table: the table definition plus the fixed
/// set of parameterized statement templates every table operation reuses.
#[derive(Debug, Clone)]
pub struct TableSpec {
    table_name: String,
    columns: Vec<SqlColumn>,
    create_table: String,
    create_indexes: Vec<String>,
    insert: String,
    update: String,
    delete: String,
    exists: String,
    count: String,
    select_all: String,
}

impl TableSpec {
    /// Maps a sealed schema to a table definition under the given dialect.
    ///
    /// Columns are visited in declaration order and map 1:1 onto SQL
    /// columns. A column covered by exactly one single-column index gets
    /// its constraint inline (`PRIMARY KEY [AUTOINCREMENT]` or `UNIQUE`);
    /// multi-column indexes become table-level constraints, and plain
    /// non-unique indexes become separate `CREATE INDEX` statements.
    /// A SQL column is `NOT NULL` unless its source column is optional.
    #[must_use]
    pub fn build(schema: &Schema, dialect: &dyn SqlDialect) -> Self {
        let table_name = dialect.sanitize_identifier(schema.name());

        let columns: Vec<SqlColumn> = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(position, column)| SqlColumn {
                name: dialect.sanitize_identifier(column.name()),
                position,
                repr: SqlRepr::for_kind(column.kind()),
            })
            .collect();

        // Indexes not yet expressed; inline placement consumes them.
        let mut pending: Vec<&cairn_model::Index> = schema.indexes().iter().collect();

        let mut column_defs = Vec::with_capacity(columns.len());
        for (position, sql_column) in columns.iter().enumerate() {
            let source = schema.column(position);
            let mut def = format!("{} {}", sql_column.name, dialect.sql_type(source.kind()));

            pending.retain(|index| {
                if !index.is_single_column() || index.positions()[0] != position {
                    return true;
                }
                if index.is_primary_key() {
                    def.push_str(" PRIMARY KEY");
                    if index.is_auto_increment() && dialect.supports_inline_autoincrement() {
                        def.push_str(" AUTOINCREMENT");
                    }
                    false
                } else if index.is_unique() {
                    def.push_str(" UNIQUE");
                    false
                } else {
                    // Plain index; created separately after the table.
                    true
                }
            });

            if !source.is_optional() {
                def.push_str(" NOT NULL");
            }
            column_defs.push(def);
        }

        // Leftover primary-key/unique indexes become table-level
        // constraints, listing columns in index order.
        let mut table_constraints = Vec::new();
        let mut create_indexes = Vec::new();
        for index in pending {
            let column_list: Vec<&str> = index
                .positions()
                .iter()
                .map(|&p| columns[p].name.as_str())
                .collect();
            if index.is_primary_key() {
                table_constraints.push(format!("PRIMARY KEY ({})", column_list.join(", ")));
            } else if index.is_unique() {
                table_constraints.push(format!("UNIQUE ({})", column_list.join(", ")));
            } else {
                create_indexes.push(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
                    dialect.sanitize_identifier(index.name()),
                    table_name,
                    column_list.join(", ")
                ));
            }
        }

        let mut body = column_defs;
        body.extend(table_constraints);
        let create_table = format!("CREATE TABLE {} ({});", table_name, body.join(", "));

        // Statement templates, built once and reused for the lifetime of
        // the table.
        let all_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<&str> = columns.iter().map(|_| dialect.placeholder()).collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            table_name,
            all_names.join(", "),
            placeholders.join(", ")
        );

        let key_positions = schema.primary_key().positions();
        let where_key: Vec<String> = key_positions
            .iter()
            .map(|&p| format!("{} = {}", columns[p].name, dialect.placeholder()))
            .collect();
        let where_key = where_key.join(" AND ");

        let set_clause: Vec<String> = columns
            .iter()
            .enumerate()
            .filter(|(position, _)| !key_positions.contains(position))
            .map(|(_, c)| format!("{} = {}", c.name, dialect.placeholder()))
            .collect();

        // When every column belongs to the key there is nothing a row
        // update could change; the template stays empty and `update`
        // becomes a no-op.
        let update = if set_clause.is_empty() {
            String::new()
        } else {
            format!(
                "UPDATE {} SET {} WHERE {};",
                table_name,
                set_clause.join(", "),
                where_key
            )
        };
        let delete = format!("DELETE FROM {table_name} WHERE {where_key};");
        let exists = format!(
            "SELECT {} FROM {} WHERE {};",
            dialect.row_identifier(),
            table_name,
            where_key
        );
        let count = format!("SELECT COUNT(*) FROM {table_name};");
        let select_all = format!("SELECT {} FROM {}", all_names.join(", "), table_name);

        Self {
            table_name,
            columns,
            create_table,
            create_indexes,
            insert,
            update,
            delete,
            exists,
            count,
            select_all,
        }
    }

    /// Sanitized table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The `CREATE TABLE` statement.
    #[must_use]
    pub fn create_table_sql(&self) -> &str {
        &self.create_table
    }

    /// `CREATE INDEX` statements for indexes the table definition could
    /// not express.
    #[must_use]
    pub fn create_index_sql(&self) -> &[String] {
        &self.create_indexes
    }

    pub(crate) fn columns(&self) -> &[SqlColumn] {
        &self.columns
    }

    pub(crate) fn insert_sql(&self) -> &str {
        &self.insert
    }

    pub(crate) fn update_sql(&self) -> &str {
        &self.update
    }

    pub(crate) fn delete_sql(&self) -> &str {
        &self.delete
    }

    pub(crate) fn exists_sql(&self) -> &str {
        &self.exists
    }

    pub(crate) fn count_sql(&self) -> &str {
        &self.count
    }

    pub(crate) fn select_all_sql(&self) -> &str {
        &self.select_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;
    use cairn_model::{Column, ColumnKind, IndexSpec, SchemaBuilder};

    fn person() -> Schema {
        SchemaBuilder::new(1, 0, "Person")
            .column(Column::new("id", ColumnKind::integer(64, true).unwrap()))
            .column(Column::new("name", ColumnKind::Text))
            .column(Column::new("age", ColumnKind::integer(8, true).unwrap()).optional())
            .index(IndexSpec::auto_increment("pk_person", "id"))
            .seal()
            .unwrap()
    }

    #[test]
    fn single_column_primary_key_is_inlined() {
        let spec = TableSpec::build(&person(), &SqliteDialect);
        assert_eq!(
            spec.create_table_sql(),
            "CREATE TABLE Person (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             name TEXT NOT NULL, age INTEGER);"
        );
        assert!(spec.create_index_sql().is_empty());
    }

    #[test]
    fn statement_templates_bind_in_schema_order() {
        let spec = TableSpec::build(&person(), &SqliteDialect);
        assert_eq!(
            spec.insert_sql(),
            "INSERT INTO Person (id, name, age) VALUES (?, ?, ?);"
        );
        assert_eq!(
            spec.update_sql(),
            "UPDATE Person SET name = ?, age = ? WHERE id = ?;"
        );
        assert_eq!(spec.delete_sql(), "DELETE FROM Person WHERE id = ?;");
        assert_eq!(spec.exists_sql(), "SELECT ROWID FROM Person WHERE id = ?;");
        assert_eq!(spec.count_sql(), "SELECT COUNT(*) FROM Person;");
        assert_eq!(spec.select_all_sql(), "SELECT id, name, age FROM Person");
    }

    #[test]
    fn multi_column_primary_key_becomes_table_constraint() {
        let schema = SchemaBuilder::new(1, 1, "Sighting")
            .column(Column::new("survey", ColumnKind::integer(16, false).unwrap()))
            .column(Column::new("sequence", ColumnKind::integer(16, false).unwrap()))
            .column(Column::new("species", ColumnKind::Text))
            .index(IndexSpec::primary_key(
                "pk_sighting",
                vec!["survey".into(), "sequence".into()],
            ))
            .seal()
            .unwrap();
        let spec = TableSpec::build(&schema, &SqliteDialect);
        assert_eq!(
            spec.create_table_sql(),
            "CREATE TABLE Sighting (survey INTEGER NOT NULL, sequence INTEGER NOT NULL, \
             species TEXT NOT NULL, PRIMARY KEY (survey, sequence));"
        );
    }

    #[test]
    fn plain_index_becomes_create_index_statement() {
        let schema = SchemaBuilder::new(1, 2, "Reading")
            .column(Column::new("id", ColumnKind::integer(64, true).unwrap()))
            .column(Column::new("site", ColumnKind::Text))
            .index(IndexSpec::auto_increment("pk_reading", "id"))
            .index(IndexSpec::plain("idx_site", vec!["site".into()]))
            .seal()
            .unwrap();
        let spec = TableSpec::build(&schema, &SqliteDialect);
        assert_eq!(
            spec.create_index_sql(),
            &["CREATE INDEX IF NOT EXISTS idx_site ON Reading (site);".to_owned()]
        );
    }

    #[test]
    fn single_column_unique_index_is_inlined() {
        let schema = SchemaBuilder::new(1, 3, "Device")
            .column(Column::new("id", ColumnKind::integer(64, true).unwrap()))
            .column(Column::new("serial", ColumnKind::Text))
            .index(IndexSpec::auto_increment("pk_device", "id"))
            .index(IndexSpec::unique("uq_serial", vec!["serial".into()]))
            .seal()
            .unwrap();
        let spec = TableSpec::build(&schema, &SqliteDialect);
        assert_eq!(
            spec.create_table_sql(),
            "CREATE TABLE Device (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             serial TEXT UNIQUE NOT NULL);"
        );
    }

    #[test]
    fn all_key_schema_gets_no_update_template() {
        let schema = SchemaBuilder::new(1, 5, "Tag")
            .column(Column::new("tag", ColumnKind::Text))
            .index(IndexSpec::primary_key("pk_tag", vec!["tag".into()]))
            .seal()
            .unwrap();
        let spec = TableSpec::build(&schema, &SqliteDialect);
        assert_eq!(
            spec.create_table_sql(),
            "CREATE TABLE Tag (tag TEXT PRIMARY KEY NOT NULL);"
        );
        assert!(spec.update_sql().is_empty());
        assert_eq!(spec.delete_sql(), "DELETE FROM Tag WHERE tag = ?;");
    }

    #[test]
    fn awkward_names_are_quoted_everywhere() {
        let schema = SchemaBuilder::new(1, 4, "my table")
            .column(Column::new("2fast", ColumnKind::integer(8, false).unwrap()))
            .index(IndexSpec::primary_key("pk", vec!["2fast".into()]))
            .seal()
            .unwrap();
        let spec = TableSpec::build(&schema, &SqliteDialect);
        assert_eq!(spec.table_name(), "[my table]");
        assert_eq!(
            spec.create_table_sql(),
            "CREATE TABLE [my table] ([2fast] INTEGER PRIMARY KEY NOT NULL);"
        );
    }
}
