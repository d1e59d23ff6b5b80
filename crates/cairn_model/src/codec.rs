//! Bit-exact serialization of values and records.
//!
//! Encodes column values into the minimal, non-byte-aligned representation
//! their declared kind admits - no type tags, no negotiation. The same
//! encoding serves two consumers: blob-backed columns in SQL storage, and
//! whole-record transmission over narrow channels.
//!
//! Wire shapes per kind:
//!
//! - `Bool` - 1 bit
//! - `Integer { bits, signed }` - exactly `bits` bits, two's complement
//! - `Float { double }` - raw IEEE-754 pattern, 32 or 64 bits
//! - `Text` / `Bytes` - 16-bit unsigned byte count, then the bytes
//! - `TimeStamp` - 64-bit signed epoch milliseconds, 7-bit signed
//!   quarter-hour UTC offset
//! - `List { element, max_len }` - element count in `bits_needed(max_len)`
//!   bits, then the elements
//!
//! An optional column contributes one presence bit ahead of its value; a
//! required column contributes the value alone.

use crate::column::Column;
use crate::error::{ModelError, ModelResult};
use crate::kind::ColumnKind;
use crate::record::Record;
use crate::schema::Schema;
use crate::timestamp::TimeStamp;
use crate::value::Value;
use cairn_bits::{bits_needed, BitReader, BitWriter, Charset};
use std::io::{Read, Write};
use std::sync::Arc;

/// Bits in the byte-count prefix of text and byte-array values.
const LENGTH_PREFIX_BITS: u32 = 16;
/// Bits in a timestamp's quarter-hour offset field.
const TZ_OFFSET_BITS: u32 = 7;

/// Encodes one value of the given kind.
///
/// `column` is only used for error context.
pub fn encode_value<W: Write>(
    column: &str,
    kind: &ColumnKind,
    value: &Value,
    writer: &mut BitWriter<W>,
    charset: Charset,
) -> ModelResult<()> {
    kind.check(column, value)?;
    match (kind, value) {
        (ColumnKind::Bool, Value::Bool(b)) => writer.write_bool(*b)?,
        (ColumnKind::Integer { bits, signed }, Value::Integer(n)) => {
            writer.write_bits(i128::from(*n), u32::from(*bits), *signed)?;
        }
        (ColumnKind::Float { double: true }, Value::Float(f)) => writer.write_f64(*f)?,
        (ColumnKind::Float { double: false }, Value::Float(f)) => writer.write_f32(*f as f32)?,
        (ColumnKind::Text, Value::Text(text)) => {
            let bytes = charset.encode(text);
            write_length_prefixed(column, &bytes, writer)?;
        }
        (ColumnKind::Bytes, Value::Bytes(bytes)) => {
            write_length_prefixed(column, bytes, writer)?;
        }
        (ColumnKind::TimeStamp, Value::TimeStamp(ts)) => {
            writer.write_bits(i128::from(ts.ms_since_epoch()), 64, true)?;
            writer.write_bits(i128::from(ts.quarter_hour_offset()), TZ_OFFSET_BITS, true)?;
        }
        (ColumnKind::List { element, max_len }, Value::List(items)) => {
            let count_bits = bits_needed(u64::from(*max_len));
            writer.write_bits(items.len() as i128, count_bits, false)?;
            for item in items {
                encode_value(column, element, item, writer, charset)?;
            }
        }
        // kind.check above guarantees the pairing.
        _ => unreachable!("value kind checked before encoding"),
    }
    Ok(())
}

/// Decodes one value of the given kind.
pub fn decode_value<R: Read>(
    column: &str,
    kind: &ColumnKind,
    reader: &mut BitReader<R>,
    charset: Charset,
) -> ModelResult<Value> {
    let value = match kind {
        ColumnKind::Bool => Value::Bool(reader.read_bool()?),
        ColumnKind::Integer { bits, signed } => {
            Value::Integer(reader.read_bits(u32::from(*bits), *signed)? as i64)
        }
        ColumnKind::Float { double: true } => Value::Float(reader.read_f64()?),
        ColumnKind::Float { double: false } => Value::Float(f64::from(reader.read_f32()?)),
        ColumnKind::Text => {
            let byte_count = reader.read_bits(LENGTH_PREFIX_BITS, false)? as usize;
            Value::Text(reader.read_string(byte_count, charset)?)
        }
        ColumnKind::Bytes => {
            let byte_count = reader.read_bits(LENGTH_PREFIX_BITS, false)? as usize;
            Value::Bytes(reader.read_bytes(byte_count)?)
        }
        ColumnKind::TimeStamp => {
            let ms = reader.read_bits(64, true)? as i64;
            let offset = reader.read_bits(TZ_OFFSET_BITS, true)? as i8;
            Value::TimeStamp(TimeStamp::new(ms, offset))
        }
        ColumnKind::List { element, max_len } => {
            let count_bits = bits_needed(u64::from(*max_len));
            let count = reader.read_bits(count_bits, false)? as usize;
            if count > *max_len as usize {
                return Err(ModelError::ValueOutOfRange {
                    column: column.to_owned(),
                    message: format!("decoded list count {count} exceeds maximum {max_len}"),
                });
            }
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(column, element, reader, charset)?);
            }
            Value::List(items)
        }
    };
    Ok(value)
}

/// Encodes one column slot: a presence bit for optional columns, then the
/// value if present.
///
/// # Errors
///
/// Returns [`ModelError::IncompleteRecord`] when a non-optional column
/// holds no value.
pub fn encode_column<W: Write>(
    column: &Column,
    value: Option<&Value>,
    writer: &mut BitWriter<W>,
    charset: Charset,
) -> ModelResult<()> {
    if column.is_optional() {
        writer.write_bool(value.is_some())?;
    }
    match value {
        Some(value) => encode_value(column.name(), column.kind(), value, writer, charset),
        None if column.is_optional() => Ok(()),
        None => Err(ModelError::IncompleteRecord {
            column: column.name().to_owned(),
        }),
    }
}

/// Decodes one column slot written by [`encode_column`].
pub fn decode_column<R: Read>(
    column: &Column,
    reader: &mut BitReader<R>,
    charset: Charset,
) -> ModelResult<Option<Value>> {
    if column.is_optional() && !reader.read_bool()? {
        return Ok(None);
    }
    decode_value(column.name(), column.kind(), reader, charset).map(Some)
}

/// Encodes a whole record, columns in declaration order.
pub fn encode_record<W: Write>(
    record: &Record,
    writer: &mut BitWriter<W>,
    charset: Charset,
) -> ModelResult<()> {
    for (position, column) in record.schema().columns().iter().enumerate() {
        encode_column(column, record.get_at(position), writer, charset)?;
    }
    Ok(())
}

/// Decodes a whole record written by [`encode_record`].
pub fn decode_record<R: Read>(
    schema: Arc<Schema>,
    reader: &mut BitReader<R>,
    charset: Charset,
) -> ModelResult<Record> {
    let mut record = Record::new(Arc::clone(&schema));
    for (position, column) in schema.columns().iter().enumerate() {
        if let Some(value) = decode_column(column, reader, charset)? {
            record.set_at(position, value)?;
        }
    }
    Ok(record)
}

/// Serializes a single value to a zero-padded byte blob.
pub fn value_to_bytes(
    column: &str,
    kind: &ColumnKind,
    value: &Value,
    charset: Charset,
) -> ModelResult<Vec<u8>> {
    let mut writer = BitWriter::in_memory();
    encode_value(column, kind, value, &mut writer, charset)?;
    Ok(writer.into_bytes()?)
}

/// Deserializes a single value from a byte blob.
pub fn value_from_bytes(
    column: &str,
    kind: &ColumnKind,
    bytes: &[u8],
    charset: Charset,
) -> ModelResult<Value> {
    let mut reader = BitReader::new(bytes);
    decode_value(column, kind, &mut reader, charset)
}

/// Serializes a whole record to a zero-padded byte blob.
pub fn record_to_bytes(record: &Record, charset: Charset) -> ModelResult<Vec<u8>> {
    let mut writer = BitWriter::in_memory();
    encode_record(record, &mut writer, charset)?;
    Ok(writer.into_bytes()?)
}

/// Deserializes a whole record from a byte blob.
pub fn record_from_bytes(
    schema: Arc<Schema>,
    bytes: &[u8],
    charset: Charset,
) -> ModelResult<Record> {
    let mut reader = BitReader::new(bytes);
    decode_record(schema, &mut reader, charset)
}

fn write_length_prefixed<W: Write>(
    column: &str,
    bytes: &[u8],
    writer: &mut BitWriter<W>,
) -> ModelResult<()> {
    if bytes.len() > 0xffff {
        return Err(ModelError::ValueOutOfRange {
            column: column.to_owned(),
            message: format!("{} bytes exceed the 65535-byte payload limit", bytes.len()),
        });
    }
    writer.write_bits(bytes.len() as i128, LENGTH_PREFIX_BITS, false)?;
    writer.write_bytes(bytes)?;
    Ok(())
}
