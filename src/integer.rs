//! Signed and bounded integer encoding (Spec 7.1.5, 7.1.9).
//!
//! Unbounded integers are a sign boolean followed by the magnitude as an
//! Unsigned Integer (Spec 7.1.6). For negative values the magnitude is
//! `(-value) - 1`, so the full `i64` range is representable without
//! overflow. Bounded integers with known lower/upper bounds are encoded as
//! the offset from the lower bound in exactly `⌈log₂(U−L+1)⌉` bits
//! (Spec 7.1.9).

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, bit_width, n_bit_unsigned_integer, unsigned_integer};

/// Encodes an `i64` as sign + magnitude (Spec 7.1.5).
pub fn encode(writer: &mut BitWriter, value: i64) {
    if value < 0 {
        writer.write_bit(true);
        // -value - 1, bitweise ohne Overflow bei i64::MIN
        unsigned_integer::encode(writer, !(value as u64));
    } else {
        writer.write_bit(false);
        unsigned_integer::encode(writer, value as u64);
    }
}

/// Decodes a sign + magnitude integer (Spec 7.1.5).
///
/// Returns [`Error::IntegerOverflow`] if the magnitude exceeds the `i64`
/// range; use [`decode_big`] for arbitrary precision.
pub fn decode(reader: &mut BitReader) -> Result<i64> {
    let negative = reader.read_bit()?;
    let magnitude = unsigned_integer::decode(reader)?;
    if magnitude > i64::MAX as u64 {
        return Err(Error::IntegerOverflow);
    }
    if negative {
        Ok(-(magnitude as i64) - 1)
    } else {
        Ok(magnitude as i64)
    }
}

/// Encodes an arbitrary-precision signed integer (Spec 7.1.5).
///
/// Bit-identisch zu [`encode`] fuer Werte im i64-Bereich.
pub fn encode_big(writer: &mut BitWriter, value: &BigInt) {
    if value.sign() == Sign::Minus {
        writer.write_bit(true);
        unsigned_integer::encode_big(writer, &(value.magnitude() - 1u32));
    } else {
        writer.write_bit(false);
        unsigned_integer::encode_big(writer, value.magnitude());
    }
}

/// Decodes an arbitrary-precision signed integer (Spec 7.1.5).
pub fn decode_big(reader: &mut BitReader) -> Result<BigInt> {
    let negative = reader.read_bit()?;
    let magnitude = unsigned_integer::decode_big(reader)?;
    if negative {
        Ok(-(BigInt::from(magnitude) + 1u32))
    } else {
        Ok(BigInt::from(magnitude))
    }
}

/// Encodes a bounded integer as an n-bit offset from `lower` (Spec 7.1.9).
///
/// The bit width is `⌈log₂(upper − lower + 1)⌉`.
///
/// # Panics
///
/// Panics if `value` lies outside `lower..=upper`.
pub fn encode_bounded(writer: &mut BitWriter, value: i64, lower: i64, upper: i64) {
    assert!(
        lower <= value && value <= upper,
        "value {value} outside bounds [{lower}, {upper}]"
    );
    let range = upper.wrapping_sub(lower) as u64;
    let offset = value.wrapping_sub(lower) as u64;
    n_bit_unsigned_integer::encode(writer, offset, bit_width::for_range(range));
}

/// Decodes a bounded integer from its n-bit offset (Spec 7.1.9).
///
/// Returns [`Error::IntegerOverflow`] if the decoded offset exceeds the
/// range (possible when the range is not a power of two).
pub fn decode_bounded(reader: &mut BitReader, lower: i64, upper: i64) -> Result<i64> {
    let range = upper.wrapping_sub(lower) as u64;
    let offset = n_bit_unsigned_integer::decode(reader, bit_width::for_range(range))?;
    if offset > range {
        return Err(Error::IntegerOverflow);
    }
    Ok(lower.wrapping_add(offset as i64))
}

/// Bit width for the offsets of a big-integer bound pair (Spec 7.1.9).
///
/// Returns [`Error::IntegerOverflow`] when the range does not fit the
/// 64-bit offset channel.
pub fn bounded_big_width(lower: &BigInt, upper: &BigInt) -> Result<u8> {
    let range = (upper - lower)
        .to_biguint()
        .and_then(|r| r.to_u64())
        .ok_or(Error::IntegerOverflow)?;
    Ok(bit_width::for_range(range))
}

/// Offset of `value` from `lower`, asserted to fit a machine integer.
pub fn bounded_big_offset(value: &BigInt, lower: &BigInt) -> Result<u64> {
    (value - lower)
        .to_biguint()
        .and_then(|o| o.to_u64())
        .ok_or(Error::IntegerOverflow)
}

/// Decodes a big-bounded integer from its n-bit offset (Spec 7.1.9).
pub fn decode_bounded_big(reader: &mut BitReader, lower: &BigInt, upper: &BigInt) -> Result<BigInt> {
    let width = bounded_big_width(lower, upper)?;
    let offset = n_bit_unsigned_integer::decode(reader, width)?;
    let value = lower + BigInt::from(BigUint::from(offset));
    if &value > upper {
        return Err(Error::IntegerOverflow);
    }
    Ok(value)
}
