//! Bit stream reader.

use crate::charset::Charset;
use crate::error::{BitsError, BitsResult};
use crate::width::MAX_WIDTH;
use std::io::Read;

/// A stream that bits can be read from; the precise inverse of
/// [`BitWriter`](crate::BitWriter).
///
/// `read_bits` reconstructs the same two's-complement value its counterpart
/// wrote. Reading past the available bit count fails with
/// [`BitsError::EndOfStream`].
pub struct BitReader<R: Read> {
    source: R,
    /// Byte currently being consumed.
    current: u8,
    /// Number of unread bits remaining in `current` (0..8).
    remaining: u32,
    bits_read: u64,
    closed: bool,
}

impl<R: Read> BitReader<R> {
    /// Creates a reader over the given byte source.
    pub fn new(source: R) -> Self {
        Self {
            source,
            current: 0,
            remaining: 0,
            bits_read: 0,
            closed: false,
        }
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> BitsResult<bool> {
        if self.closed {
            return Err(BitsError::StreamClosed);
        }
        self.pull_bit()
    }

    /// Reads a boolean written as a single bit.
    pub fn read_bool(&mut self) -> BitsResult<bool> {
        self.read_bit()
    }

    /// Reads an integer of the given width and signedness.
    ///
    /// A width of 0 bits consumes nothing and yields 0.
    pub fn read_bits(&mut self, bits: u32, signed: bool) -> BitsResult<i128> {
        if self.closed {
            return Err(BitsError::StreamClosed);
        }
        if bits > MAX_WIDTH {
            return Err(BitsError::WidthTooLarge { bits, max: MAX_WIDTH });
        }
        let mut raw: u128 = 0;
        for _ in 0..bits {
            raw = (raw << 1) | u128::from(self.pull_bit()?);
        }
        if signed && bits > 0 && (raw >> (bits - 1)) & 1 == 1 {
            // Sign-extend the two's-complement value.
            raw |= !0u128 << bits;
        }
        Ok(raw as i128)
    }

    /// Reads one byte.
    pub fn read_byte(&mut self) -> BitsResult<u8> {
        Ok(self.read_bits(8, false)? as u8)
    }

    /// Reads `count` bytes in order.
    pub fn read_bytes(&mut self, count: usize) -> BitsResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.read_byte()?);
        }
        Ok(bytes)
    }

    /// Reads `byte_count` bytes and decodes them in the given charset.
    pub fn read_string(&mut self, byte_count: usize, charset: Charset) -> BitsResult<String> {
        let bytes = self.read_bytes(byte_count)?;
        charset.decode(&bytes)
    }

    /// Reads a 32-bit float from its raw IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> BitsResult<f32> {
        let raw = self.read_bits(32, true)? as i32;
        Ok(f32::from_bits(raw as u32))
    }

    /// Reads a 64-bit float from its raw IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> BitsResult<f64> {
        let raw = self.read_bits(64, true)? as i64;
        Ok(f64::from_bits(raw as u64))
    }

    /// Number of bits read so far.
    #[must_use]
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Closes the stream; further reads fail with
    /// [`BitsError::StreamClosed`]. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn pull_bit(&mut self) -> BitsResult<bool> {
        if self.remaining == 0 {
            let mut byte = [0u8; 1];
            let n = self.source.read(&mut byte)?;
            if n == 0 {
                return Err(BitsError::EndOfStream);
            }
            self.current = byte[0];
            self.remaining = 8;
        }
        self.remaining -= 1;
        self.bits_read += 1;
        Ok((self.current >> self.remaining) & 1 == 1)
    }
}
