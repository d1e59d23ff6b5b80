//! # Cairn Model
//!
//! The typed columnar data model at the heart of Cairn:
//!
//! - [`ColumnKind`] - closed set of column element types
//! - [`SchemaBuilder`] / [`Schema`] - mutable construction, then an
//!   irreversible seal into an immutable schema
//! - [`Record`] - one mutable instance of values conforming to a schema,
//!   with incomplete records as a first-class state
//! - [`RecordReference`] - schema + primary-key values, for referring to a
//!   record without its full payload
//! - [`codec`] - bit-exact serialization of values and whole records, used
//!   for blob-backed columns and for transmission over narrow channels
//!
//! A sealed [`Schema`] is immutable and shared (via `Arc`) by every record
//! created against it.

mod column;
mod error;
mod kind;
mod record;
mod schema;
mod timestamp;
mod value;

pub mod codec;

pub use column::Column;
pub use error::{ModelError, ModelResult};
pub use kind::ColumnKind;
pub use record::{Completeness, Record, RecordReference};
pub use schema::{Index, IndexSpec, Schema, SchemaBuilder, MAX_COLUMNS};
pub use timestamp::TimeStamp;
pub use value::Value;
