//! Property tests: writer/reader round-trips across widths and signedness.

use cairn_bits::{max_value, min_value, BitReader, BitWriter, Charset};
use proptest::prelude::*;

fn write_then_read(values: &[(i128, u32, bool)]) -> Vec<i128> {
    let mut writer = BitWriter::in_memory();
    for &(value, bits, signed) in values {
        writer.write_bits(value, bits, signed).unwrap();
    }
    let bytes = writer.into_bytes().unwrap();
    let mut reader = BitReader::new(&bytes[..]);
    values
        .iter()
        .map(|&(_, bits, signed)| reader.read_bits(bits, signed).unwrap())
        .collect()
}

/// A (value, width, signedness) triple where the value fits the width.
fn in_range_triple() -> impl Strategy<Value = (i128, u32, bool)> {
    (0u32..=64, any::<bool>()).prop_flat_map(|(bits, signed)| {
        let min = min_value(bits, signed);
        let max = max_value(bits, signed);
        (min..=max, Just(bits), Just(signed))
    })
}

proptest! {
    #[test]
    fn single_value_roundtrips((value, bits, signed) in in_range_triple()) {
        prop_assert_eq!(write_then_read(&[(value, bits, signed)]), vec![value]);
    }

    #[test]
    fn value_sequences_roundtrip(values in prop::collection::vec(in_range_triple(), 1..24)) {
        let expected: Vec<i128> = values.iter().map(|&(v, _, _)| v).collect();
        prop_assert_eq!(write_then_read(&values), expected);
    }

    #[test]
    fn out_of_range_value_is_rejected(bits in 0u32..64, signed in any::<bool>()) {
        let mut writer = BitWriter::in_memory();
        let too_large = max_value(bits, signed) + 1;
        prop_assert!(writer.write_bits(too_large, bits, signed).is_err());
        let too_small = min_value(bits, signed) - 1;
        prop_assert!(writer.write_bits(too_small, bits, signed).is_err());
        prop_assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn f64_bit_pattern_roundtrips(raw in any::<u64>()) {
        let value = f64::from_bits(raw);
        let mut writer = BitWriter::in_memory();
        writer.write_f64(value).unwrap();
        let bytes = writer.into_bytes().unwrap();
        let mut reader = BitReader::new(&bytes[..]);
        prop_assert_eq!(reader.read_f64().unwrap().to_bits(), raw);
    }

    #[test]
    fn strings_roundtrip_in_both_charsets(text in "\\PC{0,40}") {
        for charset in [Charset::Utf8, Charset::Utf16Be] {
            let mut writer = BitWriter::in_memory();
            // Misalign the stream so string bytes straddle byte boundaries.
            writer.write_bits(5, 3, false).unwrap();
            let byte_count = writer.write_string(&text, charset).unwrap();
            let bytes = writer.into_bytes().unwrap();
            let mut reader = BitReader::new(&bytes[..]);
            reader.read_bits(3, false).unwrap();
            prop_assert_eq!(reader.read_string(byte_count, charset).unwrap(), text.clone());
        }
    }
}
