//! Backend dialect: the seam between the generic mapping layer and a
//! concrete SQL engine.

use cairn_model::ColumnKind;

/// Backend-specific primitives the generic mapping layer depends on.
///
/// A dialect owns no business rules beyond its type and quoting tables; all
/// statement semantics live in the generic layer.
pub trait SqlDialect {
    /// Makes an identifier safe for this backend.
    ///
    /// Identifiers matching `[A-Za-z_][A-Za-z0-9_]*` pass untouched; any
    /// other identifier is quoted.
    fn sanitize_identifier(&self, identifier: &str) -> String;

    /// Native type name for a column kind.
    fn sql_type(&self, kind: &ColumnKind) -> &'static str;

    /// Parameter placeholder syntax.
    fn placeholder(&self) -> &'static str;

    /// Name of the backend's physical row identifier, used for existence
    /// probes on schemas without a usable surrogate key.
    fn row_identifier(&self) -> &'static str;

    /// Whether a single-column auto-incrementing key can be expressed
    /// inline on the column definition.
    fn supports_inline_autoincrement(&self) -> bool;

    /// Whether the backend nests transactions natively.
    ///
    /// When `false` the store simulates nesting with a depth counter and
    /// only the outermost begin/commit/rollback reaches the backend.
    fn supports_nested_transactions(&self) -> bool;
}

/// SQLite dialect.
///
/// Type affinities follow section 1.1 of the SQLite datatype documentation:
/// booleans and integers are INTEGER, floats REAL, text and timestamps
/// TEXT, byte arrays and list blobs BLOB.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn sanitize_identifier(&self, identifier: &str) -> String {
        let mut chars = identifier.chars();
        let bare = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if bare {
            identifier.to_owned()
        } else {
            format!("[{identifier}]")
        }
    }

    fn sql_type(&self, kind: &ColumnKind) -> &'static str {
        match kind {
            ColumnKind::Bool | ColumnKind::Integer { .. } => "INTEGER",
            ColumnKind::Float { .. } => "REAL",
            ColumnKind::Text | ColumnKind::TimeStamp => "TEXT",
            ColumnKind::Bytes | ColumnKind::List { .. } => "BLOB",
        }
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn row_identifier(&self) -> &'static str {
        "ROWID"
    }

    fn supports_inline_autoincrement(&self) -> bool {
        true
    }

    fn supports_nested_transactions(&self) -> bool {
        // Plain BEGIN/COMMIT cannot nest; SAVEPOINT support would flip this.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers_pass_untouched() {
        let dialect = SqliteDialect;
        for id in ["mytable", "my_field", "xyz123", "_table14343", "_1col", "a"] {
            assert_eq!(dialect.sanitize_identifier(id), id);
        }
    }

    #[test]
    fn invalid_identifiers_are_bracket_quoted() {
        let dialect = SqliteDialect;
        for id in ["my table", "my-field", "my.table", "123xyz", "_abc?col", "2", ""] {
            assert_eq!(dialect.sanitize_identifier(id), format!("[{id}]"));
        }
    }

    #[test]
    fn type_mapping_is_exhaustive_over_kinds() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.sql_type(&ColumnKind::Bool), "INTEGER");
        assert_eq!(
            dialect.sql_type(&ColumnKind::integer(16, false).unwrap()),
            "INTEGER"
        );
        assert_eq!(dialect.sql_type(&ColumnKind::Float { double: true }), "REAL");
        assert_eq!(dialect.sql_type(&ColumnKind::Text), "TEXT");
        assert_eq!(dialect.sql_type(&ColumnKind::TimeStamp), "TEXT");
        assert_eq!(dialect.sql_type(&ColumnKind::Bytes), "BLOB");
        assert_eq!(
            dialect.sql_type(&ColumnKind::list(ColumnKind::Bool, 4).unwrap()),
            "BLOB"
        );
    }
}
