//! # Cairn Store
//!
//! Schema-driven relational storage for Cairn records.
//!
//! This crate turns sealed [`Schema`](cairn_model::Schema)s into backend
//! tables and persists [`Record`](cairn_model::Record)s through them:
//!
//! - Generic SQL mapping - declaration-order column mapping, inline vs.
//!   table-level constraint placement, parameterized statement templates
//! - Statement reuse - every CRUD statement is prepared once per
//!   connection and recycled, never re-parsed per call
//! - Simulated nested transactions atop SQLite's flat transaction model
//! - Blob-backed columns (lists) serialized with the Cairn bit codec
//! - Verbatim file backup with timestamped naming
//!
//! The engine is single-writer per physical store: every call is blocking
//! and synchronous, and callers sharing a [`RecordStore`] across threads
//! are responsible for external synchronization.

mod backup;
mod config;
mod dialect;
mod error;
mod mapping;
mod store;

pub use config::StoreConfig;
pub use dialect::{SqlDialect, SqliteDialect};
pub use error::{StoreError, StoreResult};
pub use mapping::TableSpec;
pub use store::RecordStore;
