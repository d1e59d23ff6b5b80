//! # Cairn Bits
//!
//! Bit-granularity input/output streams for Cairn.
//!
//! This crate provides streams that read and write values using exactly the
//! number of bits a value's domain requires, independent of byte boundaries:
//!
//! - "MSB 0" bit numbering: the most significant bit is written first
//! - Big-endian semantics for multi-byte values
//! - Two's-complement encoding for signed integers
//! - IEEE-754 raw bit patterns for floats (no arithmetic renormalization)
//!
//! Both properties are fixed by design: encoded records may be produced on
//! one device and decoded on another, so there is no endianness negotiation
//! and no alternative bit numbering.
//!
//! ## Usage
//!
//! ```
//! use cairn_bits::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::in_memory();
//! writer.write_bits(-5, 4, true).unwrap();
//! writer.write_bool(true).unwrap();
//! let bytes = writer.into_bytes().unwrap();
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert_eq!(reader.read_bits(4, true).unwrap(), -5);
//! assert!(reader.read_bool().unwrap());
//! ```

mod charset;
mod error;
mod reader;
mod width;
mod writer;

pub use charset::Charset;
pub use error::{BitsError, BitsResult};
pub use reader::BitReader;
pub use width::{bits_needed, max_value, min_value, MAX_WIDTH};
pub use writer::BitWriter;
