//! Boolean encoding (Spec 7.1.2).
//!
//! Two encoding variants (context-dependent):
//! 1. Default: 1-bit unsigned integer (0=false, 1=true)
//! 2. When pattern facets are present: 2-bit unsigned integer preserving
//!    all four lexical forms (0="false", 1="0", 2="true", 3="1")

use crate::bitstream::{BitReader, BitWriter};
use crate::{Result, n_bit_unsigned_integer};

/// The four lexical values of a boolean with pattern facets (Spec 7.1.2).
///
/// When an xsd:boolean has pattern facets defined in the schema, all four
/// lexical representations ("false", "0", "true", "1") must be preserved
/// to maintain round-trip fidelity with the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanValue {
    /// Lexical "false" (encoded as 0).
    False = 0,
    /// Lexical "0" (encoded as 1).
    Zero = 1,
    /// Lexical "true" (encoded as 2).
    True = 2,
    /// Lexical "1" (encoded as 3).
    One = 3,
}

impl BooleanValue {
    /// Parses one of the four xsd:boolean lexical forms.
    pub fn from_lexical(s: &str) -> Option<Self> {
        match s {
            "false" => Some(Self::False),
            "0" => Some(Self::Zero),
            "true" => Some(Self::True),
            "1" => Some(Self::One),
            _ => None,
        }
    }

    /// The exact lexical form this value preserves.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::False => "false",
            Self::Zero => "0",
            Self::True => "true",
            Self::One => "1",
        }
    }

    /// The truth value behind the lexical form.
    pub fn as_bool(self) -> bool {
        matches!(self, Self::True | Self::One)
    }
}

/// Encodes a boolean as a 1-bit unsigned integer (Spec 7.1.2).
pub fn encode(writer: &mut BitWriter, value: bool) {
    n_bit_unsigned_integer::encode(writer, value as u64, 1);
}

/// Decodes a boolean from a 1-bit unsigned integer (Spec 7.1.2).
pub fn decode(reader: &mut BitReader) -> Result<bool> {
    let bit = n_bit_unsigned_integer::decode(reader, 1)?;
    Ok(bit == 1)
}

/// Encodes a boolean with pattern facets as a 2-bit unsigned integer (Spec 7.1.2).
pub fn encode_with_pattern(writer: &mut BitWriter, value: BooleanValue) {
    n_bit_unsigned_integer::encode(writer, value as u64, 2);
}

/// Decodes a boolean with pattern facets from a 2-bit unsigned integer (Spec 7.1.2).
pub fn decode_with_pattern(reader: &mut BitReader) -> Result<BooleanValue> {
    let bits = n_bit_unsigned_integer::decode(reader, 2)?;
    let value = match bits {
        0 => BooleanValue::False,
        1 => BooleanValue::Zero,
        2 => BooleanValue::True,
        3 => BooleanValue::One,
        _ => unreachable!("2-bit decode yielded value > 3"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: bool) -> bool {
        let mut w = BitWriter::new();
        encode(&mut w, value);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        decode(&mut r).unwrap()
    }

    /// Spec 7.1.2: verify exact byte encoding (MSB-first)
    #[test]
    fn encode_byte_patterns() {
        // false → bit 0 → 0x00; true → bit 1 → 0x80
        let mut w = BitWriter::new();
        encode(&mut w, false);
        assert_eq!(w.into_vec(), vec![0x00]);

        let mut w = BitWriter::new();
        encode(&mut w, true);
        assert_eq!(w.into_vec(), vec![0x80]);
    }

    #[test]
    fn one_bit_round_trip() {
        assert!(!round_trip(false));
        assert!(round_trip(true));

        let mut w = BitWriter::new();
        encode(&mut w, true);
        assert_eq!(w.bit_position(), 1);
    }

    #[test]
    fn decode_eof() {
        let mut r = BitReader::new(&[]);
        assert_eq!(
            decode(&mut r).unwrap_err(),
            crate::Error::PrematureEndOfStream
        );
    }

    /// Spec 7.1.2: all four pattern values round-trip with exactly 2 bits
    #[test]
    fn pattern_all_values() {
        for value in [
            BooleanValue::False,
            BooleanValue::Zero,
            BooleanValue::True,
            BooleanValue::One,
        ] {
            let mut w = BitWriter::new();
            encode_with_pattern(&mut w, value);
            assert_eq!(w.bit_position(), 2);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(decode_with_pattern(&mut r).unwrap(), value);
        }
    }

    /// Spec 7.1.2: pattern discriminants match the spec values
    #[test]
    fn pattern_encoded_values() {
        for (val, expected) in [
            (BooleanValue::False, 0u64),
            (BooleanValue::Zero, 1),
            (BooleanValue::True, 2),
            (BooleanValue::One, 3),
        ] {
            let mut w = BitWriter::new();
            encode_with_pattern(&mut w, val);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(n_bit_unsigned_integer::decode(&mut r, 2).unwrap(), expected);
        }
    }

    #[test]
    fn pattern_lexical_round_trip() {
        for lexical in ["false", "0", "true", "1"] {
            let v = BooleanValue::from_lexical(lexical).unwrap();
            assert_eq!(v.as_str(), lexical);
        }
        assert!(BooleanValue::from_lexical("TRUE").is_none());
        assert!(BooleanValue::from_lexical("").is_none());
    }

    #[test]
    fn pattern_truth_values() {
        assert!(!BooleanValue::False.as_bool());
        assert!(!BooleanValue::Zero.as_bool());
        assert!(BooleanValue::True.as_bool());
        assert!(BooleanValue::One.as_bool());
    }

    /// Spec 7.1.2: sequential booleans in a stream
    #[test]
    fn sequential_booleans() {
        let mut w = BitWriter::new();
        encode(&mut w, true);
        encode(&mut w, false);
        encode_with_pattern(&mut w, BooleanValue::One);
        let data = w.into_vec();

        let mut r = BitReader::new(&data);
        assert!(decode(&mut r).unwrap());
        assert!(!decode(&mut r).unwrap());
        assert_eq!(decode_with_pattern(&mut r).unwrap(), BooleanValue::One);
    }

    #[test]
    fn pattern_decode_partial_eof() {
        let mut r = BitReader::new(&[0xFF]);
        for _ in 0..7 {
            let _ = decode(&mut r).unwrap();
        }
        assert_eq!(
            decode_with_pattern(&mut r).unwrap_err(),
            crate::Error::PrematureEndOfStream
        );
    }
}
