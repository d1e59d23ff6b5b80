//! String encodings supported by the bit streams.

use crate::error::{BitsError, BitsResult};

/// Character encoding used when writing or reading strings.
///
/// Always passed explicitly at the call site; the streams keep no implicit
/// default charset or locale state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8 (the usual choice for stored and transmitted text).
    Utf8,
    /// UTF-16, big-endian, no byte order mark.
    Utf16Be,
}

impl Charset {
    /// Encodes a string to bytes in this charset.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16Be => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
        }
    }

    /// Decodes bytes in this charset back to a string.
    pub fn decode(self, bytes: &[u8]) -> BitsResult<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| BitsError::InvalidText { charset: self }),
            Charset::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(BitsError::InvalidText { charset: self });
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| BitsError::InvalidText { charset: self })
            }
        }
    }
}
