//! Variable-length 7-bit unsigned integer encoding (Spec 7.1.6).
//!
//! Each octet has a continuation bit (MSB) and 7 data bits. The least
//! significant group is written first. The last octet has continuation = 0.
//!
//! Two entry points: the `u64` pair for machine-sized values and the
//! `BigUint` pair for arbitrary-precision values. Both produce the identical
//! octet sequence for values in the shared range.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result};

/// Octet bound for [`decode_big`] as a guard against unbounded allocation
/// from corrupted streams. 7 bits per octet.
const MAX_BIG_OCTETS: usize = 16 * 1024;

/// Encodes a `u64` as a variable-length unsigned integer (Spec 7.1.6).
#[inline]
pub fn encode(writer: &mut BitWriter, value: u64) {
    if value < 128 {
        // Fast-Path: Single-Byte (häufigster Fall — ASCII Codepoints, kleine Längen)
        writer.write_byte_aligned(value as u8);
        return;
    }
    let mut v = value;
    loop {
        let low7 = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            writer.write_byte_aligned(low7);
            break;
        }
        writer.write_byte_aligned(0x80 | low7);
    }
}

/// Decodes a variable-length unsigned integer from the stream (Spec 7.1.6).
#[inline]
pub fn decode(reader: &mut BitReader) -> Result<u64> {
    let byte = reader.read_byte_aligned()?;
    if byte & 0x80 == 0 {
        // Fast-Path: Single-Byte (häufigster Fall — ASCII Codepoints, kleine Längen)
        return Ok(u64::from(byte));
    }
    // Multi-Byte: erstes Byte bereits gelesen
    let mut result = u64::from(byte & 0x7F);
    let mut shift: u32 = 7;
    loop {
        let byte = reader.read_byte_aligned()?;
        let data = u64::from(byte & 0x7F);
        // Overflow-Prüfung (Spec 7.1.6): Bei shift 63 (10. Byte) ist nur
        // Daten-Bit 0 gültig (u64 hat 64 Bits), und kein Continuation-Byte.
        if shift == 63 && (data > 1 || byte & 0x80 != 0) {
            return Err(Error::IntegerOverflow);
        }
        result |= data << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Encodes an arbitrary-precision unsigned integer (Spec 7.1.6).
///
/// Identische Octet-Folge wie [`encode`] fuer Werte im u64-Bereich.
pub fn encode_big(writer: &mut BitWriter, value: &BigUint) {
    if value.is_zero() {
        writer.write_byte_aligned(0);
        return;
    }
    // Radix 128 liefert genau die 7-Bit-Gruppen, least significant first.
    let groups = value.to_radix_le(128);
    for (i, &g) in groups.iter().enumerate() {
        if i + 1 < groups.len() {
            writer.write_byte_aligned(0x80 | g);
        } else {
            writer.write_byte_aligned(g);
        }
    }
}

/// Decodes an arbitrary-precision unsigned integer (Spec 7.1.6).
///
/// Returns [`Error::IntegerOverflow`] when the octet count exceeds the
/// allocation guard.
pub fn decode_big(reader: &mut BitReader) -> Result<BigUint> {
    let mut groups: Vec<u8> = Vec::new();
    loop {
        let byte = reader.read_byte_aligned()?;
        groups.push(byte & 0x7F);
        if byte & 0x80 == 0 {
            break;
        }
        if groups.len() >= MAX_BIG_OCTETS {
            return Err(Error::IntegerOverflow);
        }
    }
    BigUint::from_radix_le(&groups, 128).ok_or(Error::IntegerOverflow)
}
