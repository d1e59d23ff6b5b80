//! Bit stream writer.

use crate::charset::Charset;
use crate::error::{BitsError, BitsResult};
use crate::width::{max_value, min_value, MAX_WIDTH};
use std::io::Write;

/// A stream that bits can be written to.
///
/// Bits are emitted in "MSB 0" order (the most significant bit of every
/// value goes out first) and multi-byte values are big-endian. The writer
/// keeps a running count of bits written so callers can size padding and
/// downstream length-prefixed blobs.
///
/// `close()` pads the final partial byte with zero bits, flushes the sink
/// and makes any further write fail with [`BitsError::StreamClosed`].
pub struct BitWriter<W: Write> {
    sink: W,
    /// Bits accumulated towards the next full byte, MSB-first.
    current: u8,
    /// Number of bits used in `current` (0..8).
    used: u32,
    bits_written: u64,
    closed: bool,
}

impl BitWriter<Vec<u8>> {
    /// Creates a writer over an in-memory byte buffer.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }

    /// Closes the writer and returns the accumulated bytes.
    ///
    /// The final partial byte, if any, is zero-padded.
    pub fn into_bytes(mut self) -> BitsResult<Vec<u8>> {
        self.close()?;
        Ok(self.sink)
    }
}

impl<W: Write> BitWriter<W> {
    /// Creates a writer over the given byte sink.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            current: 0,
            used: 0,
            bits_written: 0,
            closed: false,
        }
    }

    /// Writes a single bit (`true` = 1, `false` = 0).
    pub fn write_bit(&mut self, bit: bool) -> BitsResult<()> {
        if self.closed {
            return Err(BitsError::StreamClosed);
        }
        self.push_bit(bit)
    }

    /// Writes a boolean as a single bit.
    pub fn write_bool(&mut self, value: bool) -> BitsResult<()> {
        self.write_bit(value)
    }

    /// Writes an integer of the given width and signedness.
    ///
    /// Signed values use two's-complement representation. A width of 0 bits
    /// is allowed but only a value of 0 will fit.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError::Range`] when `value` lies outside the closed
    /// interval the width admits; no bits have been emitted in that case,
    /// so the stream position is unaffected.
    pub fn write_bits(&mut self, value: i128, bits: u32, signed: bool) -> BitsResult<()> {
        if self.closed {
            return Err(BitsError::StreamClosed);
        }
        if bits > MAX_WIDTH {
            return Err(BitsError::WidthTooLarge { bits, max: MAX_WIDTH });
        }
        let min = min_value(bits, signed);
        let max = max_value(bits, signed);
        if value < min || value > max {
            return Err(BitsError::Range {
                value,
                bits,
                signed,
                min,
                max,
            });
        }
        // For in-range values the low `bits` bits of the i128 are exactly
        // the two's-complement encoding, sign extension above them.
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Writes a byte, most significant bit first.
    pub fn write_byte(&mut self, byte: u8) -> BitsResult<()> {
        self.write_bits(i128::from(byte), 8, false)
    }

    /// Writes a byte slice in order (`bytes[0]` first).
    pub fn write_bytes(&mut self, bytes: &[u8]) -> BitsResult<()> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Writes a string encoded in the given charset.
    ///
    /// Returns the number of bytes written; no length field is emitted,
    /// length tracking is the caller's concern.
    pub fn write_string(&mut self, text: &str, charset: Charset) -> BitsResult<usize> {
        let bytes = charset.encode(text);
        self.write_bytes(&bytes)?;
        Ok(bytes.len())
    }

    /// Writes a 32-bit float as its raw IEEE-754 bit pattern.
    pub fn write_f32(&mut self, value: f32) -> BitsResult<()> {
        self.write_bits(i128::from(value.to_bits() as i32), 32, true)
    }

    /// Writes a 64-bit float as its raw IEEE-754 bit pattern.
    pub fn write_f64(&mut self, value: f64) -> BitsResult<()> {
        self.write_bits(i128::from(value.to_bits() as i64), 64, true)
    }

    /// Number of bits written so far (padding not included).
    #[must_use]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Closes the stream, zero-padding to the next byte boundary and
    /// flushing the underlying sink. Idempotent.
    pub fn close(&mut self) -> BitsResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.used > 0 {
            let padded = self.current << (8 - self.used);
            self.sink.write_all(&[padded])?;
            self.current = 0;
            self.used = 0;
        }
        self.sink.flush()?;
        self.closed = true;
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) -> BitsResult<()> {
        self.current = (self.current << 1) | u8::from(bit);
        self.used += 1;
        self.bits_written += 1;
        if self.used == 8 {
            self.sink.write_all(&[self.current])?;
            self.current = 0;
            self.used = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_msb_first() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(0b1010_0001, 8, false).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![0xa1]);
    }

    #[test]
    fn close_pads_with_zero_bits() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(0b101, 3, false).unwrap();
        assert_eq!(writer.bits_written(), 3);
        assert_eq!(writer.into_bytes().unwrap(), vec![0b1010_0000]);
    }

    #[test]
    fn close_is_idempotent() {
        let mut writer = BitWriter::in_memory();
        writer.write_bit(true).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.write_bit(true), Err(BitsError::StreamClosed)));
    }

    #[test]
    fn zero_width_accepts_only_zero() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(0, 0, false).unwrap();
        assert_eq!(writer.bits_written(), 0);
        assert!(matches!(
            writer.write_bits(1, 0, false),
            Err(BitsError::Range { .. })
        ));
    }

    #[test]
    fn negative_value_rejected_at_unsigned_width() {
        let mut writer = BitWriter::in_memory();
        for bits in [1, 8, 32, 64] {
            assert!(matches!(
                writer.write_bits(-1, bits, false),
                Err(BitsError::Range { .. })
            ));
        }
        // Nothing was emitted by the failed writes.
        assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn range_failure_leaves_stream_position_unchanged() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(3, 4, false).unwrap();
        assert!(writer.write_bits(300, 4, false).is_err());
        assert_eq!(writer.bits_written(), 4);
        writer.write_bits(5, 4, false).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![0x35]);
    }

    #[test]
    fn signed_boundaries() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(-128, 8, true).unwrap();
        writer.write_bits(127, 8, true).unwrap();
        assert!(matches!(
            writer.write_bits(128, 8, true),
            Err(BitsError::Range { .. })
        ));
        assert_eq!(writer.into_bytes().unwrap(), vec![0x80, 0x7f]);
    }

    #[test]
    fn width_above_maximum_is_rejected() {
        let mut writer = BitWriter::in_memory();
        assert!(matches!(
            writer.write_bits(0, 65, false),
            Err(BitsError::WidthTooLarge { .. })
        ));
    }

    #[test]
    fn multi_byte_values_are_big_endian() {
        let mut writer = BitWriter::in_memory();
        writer.write_bits(0x0102, 16, false).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn string_write_reports_byte_count() {
        let mut writer = BitWriter::in_memory();
        let written = writer.write_string("héllo", Charset::Utf8).unwrap();
        assert_eq!(written, "héllo".len());
        assert_eq!(writer.bits_written(), written as u64 * 8);
    }
}
