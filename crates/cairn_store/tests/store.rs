//! End-to-end tests against a real SQLite file.

use cairn_model::{Column, ColumnKind, IndexSpec, Record, Schema, SchemaBuilder, Value};
use cairn_store::{RecordStore, StoreConfig, StoreError};
use std::sync::Arc;

fn person_schema() -> Arc<Schema> {
    Arc::new(
        SchemaBuilder::new(1, 0, "Person")
            .column(Column::new("id", ColumnKind::integer(32, true).unwrap()))
            .column(Column::new("name", ColumnKind::Text))
            .column(Column::new("age", ColumnKind::integer(8, false).unwrap()))
            .index(IndexSpec::auto_increment("pk_person", "id"))
            .seal()
            .unwrap(),
    )
}

fn open_store(dir: &tempfile::TempDir) -> RecordStore {
    RecordStore::open(dir.path().join("test.sqlite3"), StoreConfig::default()).unwrap()
}

fn person(schema: &Arc<Schema>, name: &str, age: i64) -> Record {
    let mut record = Record::new(Arc::clone(schema));
    record.set("name", Value::Text(name.to_owned())).unwrap();
    record.set("age", Value::Integer(age)).unwrap();
    record
}

#[test]
fn insert_assigns_key_and_row_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let mut alice = person(&schema, "Alice", 34);
    assert!(!store.exists(&alice).unwrap());
    store.insert(&mut alice).unwrap();
    assert_eq!(alice.get("id").unwrap(), Some(&Value::Integer(1)));
    assert!(store.exists(&alice).unwrap());

    let rows = store.select_all(&schema).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").unwrap(), Some(&Value::Text("Alice".into())));
    assert_eq!(rows[0].get("age").unwrap(), Some(&Value::Integer(34)));
}

#[test]
fn update_changes_only_the_addressed_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let mut alice = person(&schema, "Alice", 34);
    let mut bob = person(&schema, "Bob", 51);
    store.insert(&mut alice).unwrap();
    store.insert(&mut bob).unwrap();

    alice.set("age", Value::Integer(35)).unwrap();
    store.update(&alice).unwrap();

    let rows = store.select_where(&schema, &[("name", Value::Text("Alice".into()))]).unwrap();
    assert_eq!(rows[0].get("age").unwrap(), Some(&Value::Integer(35)));
    let rows = store.select_where(&schema, &[("name", Value::Text("Bob".into()))]).unwrap();
    assert_eq!(rows[0].get("age").unwrap(), Some(&Value::Integer(51)));
}

#[test]
fn delete_removes_the_row_and_tolerates_absence() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let mut alice = person(&schema, "Alice", 34);
    store.insert(&mut alice).unwrap();
    assert_eq!(store.count(&schema).unwrap(), 1);

    store.delete(&alice).unwrap();
    assert_eq!(store.count(&schema).unwrap(), 0);

    // Deleting again is a no-op, not an error.
    store.delete(&alice).unwrap();
    assert_eq!(store.count(&schema).unwrap(), 0);
}

#[test]
fn incomplete_record_is_rejected_before_reaching_sql() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let mut partial = Record::new(Arc::clone(&schema));
    partial.set("name", Value::Text("Ghost".into())).unwrap();
    let err = store.insert(&mut partial).unwrap_err();
    assert!(matches!(err, StoreError::Model(_)));
    assert_eq!(store.count(&schema).unwrap(), 0);
}

#[test]
fn optional_column_round_trips_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = Arc::new(
        SchemaBuilder::new(1, 1, "Note")
            .column(Column::new("id", ColumnKind::integer(32, true).unwrap()))
            .column(Column::new("body", ColumnKind::Text).optional())
            .index(IndexSpec::auto_increment("pk_note", "id"))
            .seal()
            .unwrap(),
    );
    store.register(&schema).unwrap();

    let mut note = Record::new(Arc::clone(&schema));
    store.insert(&mut note).unwrap();

    let rows = store.select_all(&schema).unwrap();
    assert_eq!(rows[0].get("body").unwrap(), None);
    assert!(rows[0].is_complete());
}

#[test]
fn list_column_round_trips_through_its_blob() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = Arc::new(
        SchemaBuilder::new(2, 0, "Track")
            .column(Column::new("id", ColumnKind::integer(32, true).unwrap()))
            .column(Column::new(
                "readings",
                ColumnKind::list(ColumnKind::integer(8, true).unwrap(), 16).unwrap(),
            ))
            .index(IndexSpec::auto_increment("pk_track", "id"))
            .seal()
            .unwrap(),
    );
    store.register(&schema).unwrap();

    let readings = Value::List(vec![
        Value::Integer(-128),
        Value::Integer(0),
        Value::Integer(127),
    ]);
    let mut track = Record::new(Arc::clone(&schema));
    track.set("readings", readings.clone()).unwrap();
    store.insert(&mut track).unwrap();

    let rows = store.select_all(&schema).unwrap();
    assert_eq!(rows[0].get("readings").unwrap(), Some(&readings));
}

#[test]
fn unique_constraint_violation_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = Arc::new(
        SchemaBuilder::new(3, 0, "User")
            .column(Column::new("login", ColumnKind::Text))
            .column(Column::new("nick", ColumnKind::Text))
            .index(IndexSpec::primary_key("pk_user", vec!["login".into()]))
            .seal()
            .unwrap(),
    );
    store.register(&schema).unwrap();

    let mut first = Record::new(Arc::clone(&schema));
    first.set("login", Value::Text("kay".into())).unwrap();
    first.set("nick", Value::Text("K".into())).unwrap();
    store.insert(&mut first).unwrap();

    let mut dup = Record::new(Arc::clone(&schema));
    dup.set("login", Value::Text("kay".into())).unwrap();
    dup.set("nick", Value::Text("Kay Two".into())).unwrap();
    let err = store.insert(&mut dup).unwrap_err();
    assert!(matches!(err, StoreError::Constraint { .. }));
    assert_eq!(store.count(&schema).unwrap(), 1);
}

#[test]
fn update_on_all_key_schema_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = Arc::new(
        SchemaBuilder::new(4, 0, "Tag")
            .column(Column::new("tag", ColumnKind::Text))
            .index(IndexSpec::primary_key("pk_tag", vec!["tag".into()]))
            .seal()
            .unwrap(),
    );
    store.register(&schema).unwrap();

    let mut tag = Record::new(Arc::clone(&schema));
    tag.set("tag", Value::Text("urgent".into())).unwrap();
    store.insert(&mut tag).unwrap();

    // Every column is part of the key, so there is nothing to change.
    store.update(&tag).unwrap();
    let rows = store.select_all(&schema).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("tag").unwrap(), Some(&Value::Text("urgent".into())));
}

#[test]
fn constraint_violation_inside_transaction_rolls_everything_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = Arc::new(
        SchemaBuilder::new(3, 1, "Account")
            .column(Column::new("login", ColumnKind::Text))
            .column(Column::new("nick", ColumnKind::Text))
            .index(IndexSpec::primary_key("pk_account", vec!["login".into()]))
            .seal()
            .unwrap(),
    );
    store.register(&schema).unwrap();

    let mut existing = Record::new(Arc::clone(&schema));
    existing.set("login", Value::Text("kay".into())).unwrap();
    existing.set("nick", Value::Text("K".into())).unwrap();
    store.insert(&mut existing).unwrap();
    assert_eq!(store.count(&schema).unwrap(), 1);

    let outcome: Result<(), StoreError> = store.transaction(|store| {
        let mut fresh = Record::new(Arc::clone(&schema));
        fresh.set("login", Value::Text("lee".into()))?;
        fresh.set("nick", Value::Text("Lee".into()))?;
        store.insert(&mut fresh)?;
        let mut dup = Record::new(Arc::clone(&schema));
        dup.set("login", Value::Text("kay".into()))?;
        dup.set("nick", Value::Text("Kay Two".into()))?;
        store.insert(&mut dup)?;
        Ok(())
    });
    assert!(matches!(outcome, Err(StoreError::Constraint { .. })));
    assert!(!store.in_transaction());
    // The successful insert in the same scope is rolled back with it.
    assert_eq!(store.count(&schema).unwrap(), 1);
}

#[test]
fn failed_transaction_leaves_no_partial_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let outcome: Result<(), StoreError> = store.transaction(|store| {
        let mut alice = person(&schema, "Alice", 34);
        store.insert(&mut alice)?;
        Err(StoreError::storage_io("simulated failure"))
    });
    assert!(outcome.is_err());
    assert!(!store.in_transaction());
    assert_eq!(store.count(&schema).unwrap(), 0);
}

#[test]
fn nested_transaction_scopes_commit_once_at_the_outermost() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    store.begin_transaction().unwrap();
    store.begin_transaction().unwrap();
    let mut alice = person(&schema, "Alice", 34);
    store.insert(&mut alice).unwrap();
    store.commit_transaction().unwrap();
    assert!(store.in_transaction());
    store.commit_transaction().unwrap();
    assert!(!store.in_transaction());
    assert_eq!(store.count(&schema).unwrap(), 1);

    let err = store.commit_transaction().unwrap_err();
    assert!(matches!(err, StoreError::NoOpenTransaction));
}

#[test]
fn select_by_reference_finds_the_pointed_at_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();

    let mut alice = person(&schema, "Alice", 34);
    store.insert(&mut alice).unwrap();
    let reference = alice.reference().unwrap();

    let found = store.select_by_reference(&reference).unwrap().unwrap();
    assert_eq!(found.get("name").unwrap(), Some(&Value::Text("Alice".into())));

    store.delete(&alice).unwrap();
    assert!(store.select_by_reference(&reference).unwrap().is_none());
}

#[test]
fn registration_is_idempotent_and_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let schema = person_schema();
    {
        let mut store = open_store(&dir);
        store.register(&schema).unwrap();
        store.register(&schema).unwrap();
        let mut alice = person(&schema, "Alice", 34);
        store.insert(&mut alice).unwrap();
        store.close().unwrap();
    }
    let mut store = open_store(&dir);
    store.register(&schema).unwrap();
    assert_eq!(store.count(&schema).unwrap(), 1);
}

#[test]
fn opening_missing_file_without_create_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::default().create_if_missing(false);
    let result = RecordStore::open(dir.path().join("absent.sqlite3"), config);
    assert!(matches!(result, Err(StoreError::StorageIo { .. })));
    assert!(!dir.path().join("absent.sqlite3").exists());
}

#[test]
fn backup_copies_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let schema = person_schema();
    store.register(&schema).unwrap();
    let mut alice = person(&schema, "Alice", 34);
    store.insert(&mut alice).unwrap();

    let dest = dir.path().join("backups");
    std::fs::create_dir(&dest).unwrap();
    let backup = store.backup(&dest).unwrap();
    let name = backup.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("test_Backup_"));
    assert!(name.ends_with(".sqlite3"));
    assert!(backup.metadata().unwrap().len() > 0);
}

#[test]
fn unregistered_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let schema = person_schema();
    let err = store.count(&schema).unwrap_err();
    assert!(matches!(err, StoreError::UnregisteredSchema { .. }));
}
