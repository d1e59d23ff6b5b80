//! Error types for the bit stream crate.

use crate::charset::Charset;
use std::io;
use thiserror::Error;

/// Result type for bit stream operations.
pub type BitsResult<T> = Result<T, BitsError>;

/// Errors that can occur while reading or writing bit streams.
#[derive(Debug, Error)]
pub enum BitsError {
    /// Value does not fit the declared bit width.
    ///
    /// Raised before any bits are emitted, so the stream position is
    /// unchanged when this is returned.
    #[error("value {value} does not fit in {bits} bits (signed: {signed}), allowed range [{min}; {max}]")]
    Range {
        /// The rejected value.
        value: i128,
        /// Declared width in bits.
        bits: u32,
        /// Whether the width is signed.
        signed: bool,
        /// Smallest value the width admits.
        min: i128,
        /// Largest value the width admits.
        max: i128,
    },

    /// Requested width exceeds the supported maximum.
    #[error("bit width {bits} exceeds the supported maximum of {max} bits")]
    WidthTooLarge {
        /// Requested width.
        bits: u32,
        /// Supported maximum width.
        max: u32,
    },

    /// The stream has been closed; no further operations are possible.
    #[error("bit stream is closed")]
    StreamClosed,

    /// Ran out of bits before the requested value was fully read.
    #[error("unexpected end of bit stream")]
    EndOfStream,

    /// Bytes read from the stream are not valid in the given charset.
    #[error("invalid {charset:?} byte sequence")]
    InvalidText {
        /// Charset the bytes were decoded with.
        charset: Charset,
    },

    /// Underlying byte sink or source failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
