//! Enumeration encoding (Spec 7.1.4).
//!
//! Enumerated values are encoded as their ordinal position in the schema's
//! enumeration, an n-bit unsigned integer with `n = ⌈log₂ m⌉` for `m`
//! enumerated values. The value order is schema order, not sorted order.

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, bit_width, n_bit_unsigned_integer};

/// Encodes an enumeration ordinal among `enum_count` values (Spec 7.1.4).
///
/// # Panics
///
/// Panics if `index >= enum_count`.
pub fn encode(writer: &mut BitWriter, index: usize, enum_count: usize) {
    assert!(
        index < enum_count,
        "enumeration index {index} out of range for {enum_count} values"
    );
    n_bit_unsigned_integer::encode(writer, index as u64, bit_width::for_count(enum_count));
}

/// Decodes an enumeration ordinal among `enum_count` values (Spec 7.1.4).
///
/// Returns [`Error::InvalidEnumerationIndex`] if the decoded ordinal is out
/// of range (possible when `enum_count` is not a power of two).
pub fn decode(reader: &mut BitReader, enum_count: usize) -> Result<usize> {
    let index = n_bit_unsigned_integer::decode(reader, bit_width::for_count(enum_count))? as usize;
    if index >= enum_count {
        return Err(Error::InvalidEnumerationIndex { index, enum_count });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(index: usize, enum_count: usize) -> usize {
        let mut w = BitWriter::new();
        encode(&mut w, index, enum_count);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        decode(&mut r, enum_count).unwrap()
    }

    /// Spec 7.1.4: single-value enumeration uses 0 bits
    #[test]
    fn single_value_zero_bits() {
        let mut w = BitWriter::new();
        encode(&mut w, 0, 1);
        assert_eq!(w.bit_position(), 0);

        let mut r = BitReader::new(&[]);
        assert_eq!(decode(&mut r, 1).unwrap(), 0);
    }

    /// Spec 7.1.4: n = ceil(log2 m)
    #[test]
    fn bit_widths() {
        for (enum_count, expected_bits) in [(2usize, 1usize), (3, 2), (4, 2), (5, 3), (256, 8)] {
            let mut w = BitWriter::new();
            encode(&mut w, 0, enum_count);
            assert_eq!(w.bit_position(), expected_bits, "m={enum_count}");
        }
    }

    #[test]
    fn all_ordinals_round_trip() {
        for enum_count in [2usize, 3, 7, 8, 9] {
            for index in 0..enum_count {
                assert_eq!(round_trip(index, enum_count), index);
            }
        }
    }

    /// Spec 7.1.4: out-of-range ordinal in the stream is rejected
    #[test]
    fn decode_invalid_ordinal() {
        // m=5 → 3 bits, ordinals 5..=7 invalid
        let mut w = BitWriter::new();
        w.write_bits(6, 3);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(
            decode(&mut r, 5).unwrap_err(),
            Error::InvalidEnumerationIndex {
                index: 6,
                enum_count: 5
            }
        );
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn encode_out_of_range_panics() {
        let mut w = BitWriter::new();
        encode(&mut w, 4, 4);
    }

    #[test]
    fn decode_eof() {
        let mut r = BitReader::new(&[]);
        assert_eq!(
            decode(&mut r, 4).unwrap_err(),
            Error::PrematureEndOfStream
        );
    }
}
