//! Bit-width range helpers.
//!
//! Every column's legal value range is known statically from its declared
//! width and signedness, so producer and consumer can agree on payload size
//! without transmitting type tags. These helpers compute those ranges.

/// Maximum supported width of a single integer value, in bits.
pub const MAX_WIDTH: u32 = 64;

/// Smallest value representable in `bits` bits with the given signedness.
///
/// A width of 0 bits admits only the value 0.
#[must_use]
pub fn min_value(bits: u32, signed: bool) -> i128 {
    if !signed || bits == 0 {
        0
    } else {
        -(1i128 << (bits - 1))
    }
}

/// Largest value representable in `bits` bits with the given signedness.
///
/// A width of 0 bits admits only the value 0.
#[must_use]
pub fn max_value(bits: u32, signed: bool) -> i128 {
    if bits == 0 {
        0
    } else if signed {
        (1i128 << (bits - 1)) - 1
    } else {
        (1i128 << bits) - 1
    }
}

/// Number of bits needed to represent every unsigned value in `0..=max`.
///
/// `bits_needed(0)` is 0: a zero-width field whose only value is 0.
#[must_use]
pub fn bits_needed(max: u64) -> u32 {
    64 - max.leading_zeros()
}
