//! The record store: connection ownership, table registration, CRUD and
//! transactions.

use crate::backup::backup_file;
use crate::config::StoreConfig;
use crate::dialect::{SqlDialect, SqliteDialect};
use crate::error::{StoreError, StoreResult};
use crate::mapping::{SqlColumn, SqlRepr, TableSpec};
use cairn_model::{codec, Record, RecordReference, Schema, TimeStamp, Value};
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A registered schema: its table mapping, bound 1:1 to the schema for the
/// lifetime of the connection.
struct Table {
    schema: Arc<Schema>,
    spec: TableSpec,
}

impl Table {
    fn key_positions(&self) -> &[usize] {
        self.schema.primary_key().positions()
    }
}

/// A record store over one physical SQLite file.
///
/// All statement execution is sequential from one logical owner; the store
/// performs no internal locking beyond the transaction depth counter, so
/// callers sharing a handle across threads must serialize access
/// externally.
pub struct RecordStore {
    conn: Connection,
    path: PathBuf,
    config: StoreConfig,
    dialect: SqliteDialect,
    tables: HashMap<(u64, u32), Table>,
    /// Simulated transaction nesting depth; only depth 1 reaches SQLite.
    open_transactions: Cell<u32>,
}

impl RecordStore {
    /// Opens (or creates) the store at the given path.
    ///
    /// Fails without leaving a half-open handle: the connection is
    /// verified readable before the store is returned, and is dropped on
    /// any verification failure.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = Connection::open_with_flags(&path, flags)?;
        conn.busy_timeout(config.busy_timeout)?;
        // Probe the file; an existing non-database file fails here.
        conn.pragma_query_value(None, "schema_version", |row| row.get::<_, i64>(0))?;
        info!(path = %path.display(), "opened record store");
        Ok(Self {
            conn,
            path,
            config,
            dialect: SqliteDialect,
            tables: HashMap::new(),
            open_transactions: Cell::new(0),
        })
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers a schema, creating its table and indexes if absent.
    ///
    /// Registration is idempotent; the table mapping and its statement
    /// templates are built once and kept for the connection's lifetime.
    pub fn register(&mut self, schema: &Arc<Schema>) -> StoreResult<()> {
        let key = (schema.model_id(), schema.schema_number());
        if self.tables.contains_key(&key) {
            return Ok(());
        }
        let spec = TableSpec::build(schema, &self.dialect);
        if !self.table_exists(spec.table_name())? {
            debug!(table = spec.table_name(), "creating table");
            self.conn.execute(spec.create_table_sql(), [])?;
            for index_sql in spec.create_index_sql() {
                self.conn.execute(index_sql, [])?;
            }
        }
        self.tables.insert(
            key,
            Table {
                schema: Arc::clone(schema),
                spec,
            },
        );
        Ok(())
    }

    /// Names of all user tables in the database file, registered or not.
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name;",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Row count of an arbitrary table by name.
    pub fn count_rows(&self, table_name: &str) -> StoreResult<u64> {
        let table = self.dialect.sanitize_identifier(table_name);
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Whether a table of the given (already sanitized) name exists.
    pub fn table_exists(&self, table_name: &str) -> StoreResult<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?;",
                [table_name.trim_matches(['[', ']'])],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Inserts a record, binding all column values in schema order.
    ///
    /// When the schema uses an auto-incrementing key, the row id the
    /// backend assigned is written back into the record's key column
    /// before this returns.
    pub fn insert(&self, record: &mut Record) -> StoreResult<()> {
        let table = self.table_for(record.schema())?;
        self.require_storable(record)?;

        let values = self.bind_all(table, record)?;
        let mut stmt = self.conn.prepare_cached(table.spec.insert_sql())?;
        stmt.execute(params_from_iter(values))?;

        if let Some(position) = table.schema.auto_increment_position() {
            if !record.is_set(position) {
                record.set_at(position, Value::Integer(self.conn.last_insert_rowid()))?;
            }
        }
        Ok(())
    }

    /// Updates the single row identified by the record's key columns.
    pub fn update(&self, record: &Record) -> StoreResult<()> {
        let table = self.table_for(record.schema())?;
        self.require_storable(record)?;

        if table.spec.update_sql().is_empty() {
            // Every column is part of the key; there is nothing to change.
            self.bind_keys(table, record)?;
            return Ok(());
        }

        let key_positions = table.key_positions();
        let mut values = Vec::with_capacity(table.spec.columns().len());
        for sql_column in table.spec.columns() {
            if key_positions.contains(&sql_column.position) {
                continue;
            }
            values.push(self.bind_one(table, sql_column, record.get_at(sql_column.position))?);
        }
        values.extend(self.bind_keys(table, record)?);

        let mut stmt = self.conn.prepare_cached(table.spec.update_sql())?;
        stmt.execute(params_from_iter(values))?;
        Ok(())
    }

    /// Deletes the row identified by the record's key columns.
    ///
    /// Has no effect (and is not an error) if the row no longer exists.
    pub fn delete(&self, record: &Record) -> StoreResult<()> {
        let table = self.table_for(record.schema())?;
        let keys = self.bind_keys(table, record)?;
        let mut stmt = self.conn.prepare_cached(table.spec.delete_sql())?;
        stmt.execute(params_from_iter(keys))?;
        Ok(())
    }

    /// Whether the record is present in the store.
    ///
    /// With an auto-incrementing key this is answered from the in-memory
    /// record alone; otherwise the backend row identifier is probed by the
    /// declared key columns.
    pub fn exists(&self, record: &Record) -> StoreResult<bool> {
        let table = self.table_for(record.schema())?;
        if let Some(position) = table.schema.auto_increment_position() {
            return Ok(record.is_set(position));
        }
        let keys = self.bind_keys(table, record)?;
        let mut stmt = self.conn.prepare_cached(table.spec.exists_sql())?;
        let row_id: Option<i64> = stmt
            .query_row(params_from_iter(keys), |row| row.get(0))
            .optional()?;
        Ok(row_id.is_some())
    }

    /// Row cardinality of the schema's table; never loads rows.
    pub fn count(&self, schema: &Schema) -> StoreResult<u64> {
        let table = self.table_for(schema)?;
        let mut stmt = self.conn.prepare_cached(table.spec.count_sql())?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Loads every record of the schema.
    pub fn select_all(&self, schema: &Arc<Schema>) -> StoreResult<Vec<Record>> {
        self.select_where(schema, &[])
    }

    /// Loads records matching all the given column/value equality criteria.
    ///
    /// Rows are materialized one at a time; the first row that fails to
    /// reconstruct aborts the collection with its error.
    pub fn select_where(
        &self,
        schema: &Arc<Schema>,
        criteria: &[(&str, Value)],
    ) -> StoreResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut first_error = None;
        self.for_each_matching(schema, criteria, |outcome| match outcome {
            Ok(record) => records.push(record),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        })?;
        match first_error {
            Some(err) => Err(err),
            None => Ok(records),
        }
    }

    /// Streams records matching the criteria through a callback, one row
    /// at a time, bounding peak memory for large result sets.
    ///
    /// Row-level reconstruction failures (e.g. a corrupt blob) are handed
    /// to the callback per row; other rows are unaffected. The underlying
    /// cursor is released on every exit path.
    pub fn for_each_matching(
        &self,
        schema: &Arc<Schema>,
        criteria: &[(&str, Value)],
        mut f: impl FnMut(StoreResult<Record>),
    ) -> StoreResult<()> {
        let table = self.table_for(schema)?;

        let mut sql = table.spec.select_all_sql().to_owned();
        let mut bound = Vec::with_capacity(criteria.len());
        for (i, (name, value)) in criteria.iter().enumerate() {
            let position = schema.position_of(name)?;
            let sql_column = &table.spec.columns()[position];
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&sql_column.name);
            sql.push_str(" = ");
            sql.push_str(self.dialect.placeholder());
            bound.push(self.bind_one(table, sql_column, Some(value))?);
        }
        sql.push(';');

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(bound))?;
        while let Some(row) = rows.next()? {
            f(self.record_from_row(table, row));
        }
        Ok(())
    }

    /// Loads the record a reference points at, if it is still stored.
    pub fn select_by_reference(
        &self,
        reference: &RecordReference,
    ) -> StoreResult<Option<Record>> {
        let schema = reference.schema();
        let key = schema.primary_key();
        let criteria: Vec<(&str, Value)> = key
            .positions()
            .iter()
            .zip(reference.key_values())
            .map(|(&p, value)| (schema.column(p).name(), value.clone()))
            .collect();
        let mut records = self.select_where(schema, &criteria)?;
        Ok(records.pop())
    }

    /// Opens a transaction scope.
    ///
    /// SQLite's basic transactions cannot nest, so nesting is simulated
    /// with a depth counter: only the outermost scope issues `BEGIN`, and
    /// inner scopes are intentionally not isolated from each other.
    pub fn begin_transaction(&self) -> StoreResult<()> {
        if !self.in_transaction() {
            debug!("BEGIN TRANSACTION");
            self.conn.execute_batch("BEGIN TRANSACTION;")?;
        }
        self.open_transactions.set(self.open_transactions.get() + 1);
        Ok(())
    }

    /// Commits the current transaction scope; only the outermost commit
    /// reaches the backend.
    pub fn commit_transaction(&self) -> StoreResult<()> {
        match self.open_transactions.get() {
            0 => return Err(StoreError::NoOpenTransaction),
            1 => {
                debug!("COMMIT TRANSACTION");
                self.conn.execute_batch("COMMIT TRANSACTION;")?;
            }
            _ => {}
        }
        self.open_transactions.set(self.open_transactions.get() - 1);
        Ok(())
    }

    /// Rolls back the current transaction scope; only the outermost
    /// rollback reaches the backend.
    pub fn rollback_transaction(&self) -> StoreResult<()> {
        match self.open_transactions.get() {
            0 => return Err(StoreError::NoOpenTransaction),
            1 => {
                debug!("ROLLBACK TRANSACTION");
                self.conn.execute_batch("ROLLBACK TRANSACTION;")?;
            }
            _ => {}
        }
        self.open_transactions.set(self.open_transactions.get() - 1);
        Ok(())
    }

    /// Whether a transaction scope is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.open_transactions.get() > 0
    }

    /// Runs a closure inside a transaction scope: committed on `Ok`,
    /// rolled back on `Err`, leaving no partial writes observable.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> StoreResult<T>) -> StoreResult<T> {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit_transaction()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback_transaction() {
                    warn!(error = %rollback_err, "rollback after failed transaction also failed");
                }
                Err(err)
            }
        }
    }

    /// Copies the database file verbatim into the destination folder,
    /// suffixing the name with a timestamp.
    ///
    /// Returns the path of the backup file.
    pub fn backup(&self, destination: &Path) -> StoreResult<PathBuf> {
        let backup_path = backup_file(&self.path, destination)?;
        info!(backup = %backup_path.display(), "backed up record store");
        Ok(backup_path)
    }

    /// Drops the schema's table and forgets its registration.
    pub fn drop_table(&mut self, schema: &Schema) -> StoreResult<()> {
        let key = (schema.model_id(), schema.schema_number());
        let Some(table) = self.tables.remove(&key) else {
            return Err(StoreError::UnregisteredSchema {
                name: schema.name().to_owned(),
            });
        };
        self.conn
            .execute(&format!("DROP TABLE {};", table.spec.table_name()), [])?;
        Ok(())
    }

    /// Closes the store, releasing the connection.
    pub fn close(self) -> StoreResult<()> {
        // Cached statements hold the connection; drop them first.
        drop(self.tables);
        self.conn
            .close()
            .map_err(|(_, err)| StoreError::from(err))?;
        Ok(())
    }

    fn table_for(&self, schema: &Schema) -> StoreResult<&Table> {
        self.tables
            .get(&(schema.model_id(), schema.schema_number()))
            .ok_or_else(|| StoreError::UnregisteredSchema {
                name: schema.name().to_owned(),
            })
    }

    /// A record must have every non-optional column set before it can be
    /// written; unset optional columns persist as SQL NULL and round-trip.
    ///
    /// The auto-increment key is exempt: the backend assigns it on insert,
    /// so an unset key is the normal state of a fresh record.
    fn require_storable(&self, record: &Record) -> StoreResult<()> {
        let schema = record.schema();
        let auto_increment = schema.auto_increment_position();
        for (position, column) in schema.columns().iter().enumerate() {
            if column.is_optional() || Some(position) == auto_increment {
                continue;
            }
            if !record.is_set(position) {
                return Err(StoreError::Model(
                    cairn_model::ModelError::IncompleteRecord {
                        column: column.name().to_owned(),
                    },
                ));
            }
        }
        Ok(())
    }

    fn bind_all(&self, table: &Table, record: &Record) -> StoreResult<Vec<SqlValue>> {
        table
            .spec
            .columns()
            .iter()
            .map(|sql_column| self.bind_one(table, sql_column, record.get_at(sql_column.position)))
            .collect()
    }

    fn bind_keys(&self, table: &Table, record: &Record) -> StoreResult<Vec<SqlValue>> {
        table
            .key_positions()
            .iter()
            .map(|&position| {
                let value = record.get_at(position);
                if value.is_none() {
                    return Err(StoreError::Model(
                        cairn_model::ModelError::IncompleteRecord {
                            column: table.schema.column(position).name().to_owned(),
                        },
                    ));
                }
                self.bind_one(table, &table.spec.columns()[position], value)
            })
            .collect()
    }

    /// Converts one model value to its backend representation.
    fn bind_one(
        &self,
        table: &Table,
        sql_column: &SqlColumn,
        value: Option<&Value>,
    ) -> StoreResult<SqlValue> {
        let Some(value) = value else {
            return Ok(SqlValue::Null);
        };
        let column = table.schema.column(sql_column.position);
        column.kind().check(column.name(), value)?;
        Ok(match (sql_column.repr, value) {
            (SqlRepr::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (SqlRepr::Integer, Value::Integer(n)) => SqlValue::Integer(*n),
            (SqlRepr::Float, Value::Float(f)) => SqlValue::Real(*f),
            (SqlRepr::Text, Value::Text(t)) => SqlValue::Text(t.clone()),
            (SqlRepr::Bytes, Value::Bytes(b)) => SqlValue::Blob(b.clone()),
            (SqlRepr::TimeStamp, Value::TimeStamp(ts)) => SqlValue::Text(ts.to_rfc3339()),
            (SqlRepr::CodecBlob, value) => SqlValue::Blob(codec::value_to_bytes(
                column.name(),
                column.kind(),
                value,
                self.config.blob_charset,
            )?),
            // `check` above guarantees the pairing.
            _ => unreachable!("value kind checked before binding"),
        })
    }

    /// Reconstructs one record from a result row, handing each decoded SQL
    /// value to its owning column in registration order.
    fn record_from_row(&self, table: &Table, row: &Row<'_>) -> StoreResult<Record> {
        let mut record = Record::new(Arc::clone(&table.schema));
        for (i, sql_column) in table.spec.columns().iter().enumerate() {
            let column = table.schema.column(sql_column.position);
            let value_ref = row
                .get_ref(i)
                .map_err(|err| StoreError::storage_io(err.to_string()))?;
            let value = match (sql_column.repr, value_ref) {
                (_, ValueRef::Null) => None,
                (SqlRepr::Bool, ValueRef::Integer(n)) => Some(Value::Bool(n != 0)),
                (SqlRepr::Integer, ValueRef::Integer(n)) => Some(Value::Integer(n)),
                (SqlRepr::Float, ValueRef::Real(f)) => Some(Value::Float(f)),
                (SqlRepr::Float, ValueRef::Integer(n)) => Some(Value::Float(n as f64)),
                (SqlRepr::Text, ValueRef::Text(bytes)) => {
                    let text = std::str::from_utf8(bytes)
                        .map_err(|err| codec_error(column.name(), err))?;
                    Some(Value::Text(text.to_owned()))
                }
                (SqlRepr::TimeStamp, ValueRef::Text(bytes)) => {
                    let text = std::str::from_utf8(bytes)
                        .map_err(|err| codec_error(column.name(), err))?;
                    let ts = TimeStamp::parse_rfc3339(text)
                        .map_err(|err| codec_error(column.name(), err))?;
                    Some(Value::TimeStamp(ts))
                }
                (SqlRepr::Bytes, ValueRef::Blob(bytes)) => Some(Value::Bytes(bytes.to_vec())),
                (SqlRepr::CodecBlob, ValueRef::Blob(bytes)) => Some(
                    codec::value_from_bytes(
                        column.name(),
                        column.kind(),
                        bytes,
                        self.config.blob_charset,
                    )
                    .map_err(|err| codec_error(column.name(), err))?,
                ),
                (_, other) => {
                    return Err(codec_error(
                        column.name(),
                        format!("unexpected storage class {:?}", other.data_type()),
                    ))
                }
            };
            if let Some(value) = value {
                record.set_at(sql_column.position, value)?;
            }
        }
        Ok(record)
    }
}

fn codec_error(column: &str, message: impl ToString) -> StoreError {
    StoreError::Codec {
        column: column.to_owned(),
        message: message.to_string(),
    }
}
