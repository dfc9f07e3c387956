//! Float encoding (Spec 7.1.4).
//!
//! The Float datatype representation is two consecutive Integers (Spec 7.1.5):
//! a mantissa and a base-10 exponent. The mantissa range is -(2^63) to 2^63-1,
//! and the exponent range is -(2^14-1) to 2^14-1.
//!
//! The special exponent value -(2^14) encodes infinity, negative infinity and
//! NaN: mantissa 1 = INF, mantissa -1 = -INF, any other mantissa = NaN.

use std::fmt;

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, integer};

/// Normal exponent range: -(2^14-1) to 2^14-1.
const EXPONENT_MIN: i64 = -(1 << 14) + 1; // -16383
const EXPONENT_MAX: i64 = (1 << 14) - 1; // 16383

/// Special exponent value for INF, -INF, NaN.
const SPECIAL_EXPONENT: i64 = -(1 << 14); // -16384

/// An EXI float value (Spec 7.1.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    /// A finite value: m × 10^e.
    Value { mantissa: i64, exponent: i64 },
    /// Positive infinity (INF).
    Infinity,
    /// Negative infinity (-INF).
    NegativeInfinity,
    /// Not-a-Number (NaN).
    NaN,
}

impl Float {
    /// Parses an xsd:float/xsd:double lexical form.
    ///
    /// Accepts the special values INF, -INF, +INF and NaN, plus decimal and
    /// scientific notation. Returns `None` when the form is not parseable or
    /// the mantissa/exponent fall outside the representable ranges.
    pub fn from_lexical(s: &str) -> Option<Self> {
        match s {
            "INF" | "+INF" => return Some(Self::Infinity),
            "-INF" => return Some(Self::NegativeInfinity),
            "NaN" => return Some(Self::NaN),
            _ => {}
        }

        let (mantissa_part, exp_part) = match s.find(['e', 'E']) {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };
        let explicit_exp: i64 = match exp_part {
            Some(e) => e.parse().ok()?,
            None => 0,
        };

        let (negative, digits) = match mantissa_part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa_part.strip_prefix('+').unwrap_or(mantissa_part)),
        };
        let (int_digits, frac_digits) = match digits.find('.') {
            Some(pos) => (&digits[..pos], &digits[pos + 1..]),
            None => (digits, ""),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }
        if !int_digits.bytes().all(|b| b.is_ascii_digit())
            || !frac_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let mut mantissa: i64 = 0;
        for b in int_digits.bytes().chain(frac_digits.bytes()) {
            mantissa = mantissa
                .checked_mul(10)?
                .checked_add((b - b'0') as i64)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        let exponent = explicit_exp.checked_sub(frac_digits.len() as i64)?;
        if !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
            return None;
        }
        Some(Self::Value { mantissa, exponent }.normalized())
    }

    /// Canonical form: trailing zeros moved from the mantissa into the
    /// exponent, and zero forced to `0E0`.
    pub fn normalized(self) -> Self {
        let Self::Value {
            mut mantissa,
            mut exponent,
        } = self
        else {
            return self;
        };
        if mantissa == 0 {
            return Self::Value {
                mantissa: 0,
                exponent: 0,
            };
        }
        while mantissa % 10 == 0 && exponent < EXPONENT_MAX {
            mantissa /= 10;
            exponent += 1;
        }
        Self::Value { mantissa, exponent }
    }
}

impl fmt::Display for Float {
    /// Canonical lexical form: `<mantissa>E<exponent>`, INF, -INF or NaN.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { mantissa, exponent } => write!(f, "{mantissa}E{exponent}"),
            Self::Infinity => f.write_str("INF"),
            Self::NegativeInfinity => f.write_str("-INF"),
            Self::NaN => f.write_str("NaN"),
        }
    }
}

/// Encodes a float value (Spec 7.1.4).
///
/// # Panics
///
/// Panics if a `Value` has an exponent outside the accepted range.
pub fn encode(writer: &mut BitWriter, value: Float) {
    match value {
        Float::Value { mantissa, exponent } => {
            assert!(
                (EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent),
                "exponent {exponent} out of range [{EXPONENT_MIN}, {EXPONENT_MAX}]"
            );
            integer::encode(writer, mantissa);
            integer::encode(writer, exponent);
        }
        Float::Infinity => {
            integer::encode(writer, 1);
            integer::encode(writer, SPECIAL_EXPONENT);
        }
        Float::NegativeInfinity => {
            integer::encode(writer, -1);
            integer::encode(writer, SPECIAL_EXPONENT);
        }
        Float::NaN => {
            integer::encode(writer, 0);
            integer::encode(writer, SPECIAL_EXPONENT);
        }
    }
}

/// Decodes a float value (Spec 7.1.4).
///
/// Returns [`Error::FloatOutOfRange`] if the exponent exceeds the accepted
/// range, [`Error::IntegerOverflow`] if the mantissa exceeds the i64 range.
pub fn decode(reader: &mut BitReader) -> Result<Float> {
    let mantissa = integer::decode(reader)?;
    let exponent = integer::decode(reader)?;

    if exponent == SPECIAL_EXPONENT {
        return Ok(match mantissa {
            1 => Float::Infinity,
            -1 => Float::NegativeInfinity,
            _ => Float::NaN,
        });
    }
    if !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
        return Err(Error::FloatOutOfRange);
    }
    Ok(Float::Value { mantissa, exponent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unsigned_integer;

    fn round_trip(value: Float) -> Float {
        let mut w = BitWriter::new();
        encode(&mut w, value);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        decode(&mut r).unwrap()
    }

    /// Spec 7.1.4: finite values round-trip, boundaries included
    #[test]
    fn finite_values_round_trip() {
        for (mantissa, exponent) in [
            (15i64, -1i64),
            (0, 0),
            (-42, 3),
            (123, -100),
            (i64::MIN, 0),
            (i64::MAX, 0),
            (0, EXPONENT_MIN),
            (0, EXPONENT_MAX),
        ] {
            let f = Float::Value { mantissa, exponent };
            assert_eq!(round_trip(f), f);
        }
    }

    /// Spec 7.1.4: special values
    #[test]
    fn special_values_round_trip() {
        assert_eq!(round_trip(Float::Infinity), Float::Infinity);
        assert_eq!(round_trip(Float::NegativeInfinity), Float::NegativeInfinity);
        assert_eq!(round_trip(Float::NaN), Float::NaN);
    }

    /// NaN wird mit Mantisse 0 encodiert (deterministische Ausgabe)
    #[test]
    fn nan_encodes_mantissa_zero() {
        let mut w = BitWriter::new();
        encode(&mut w, Float::NaN);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(integer::decode(&mut r).unwrap(), 0);
        assert_eq!(integer::decode(&mut r).unwrap(), SPECIAL_EXPONENT);
    }

    /// Spec 7.1.4: any mantissa other than 1/-1 with special exponent → NaN
    #[test]
    fn special_exponent_other_mantissa_is_nan() {
        for &m in &[0i64, 2, -2, i64::MAX, i64::MIN] {
            let mut w = BitWriter::new();
            integer::encode(&mut w, m);
            integer::encode(&mut w, SPECIAL_EXPONENT);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(decode(&mut r).unwrap(), Float::NaN, "mantissa={m}");
        }
    }

    /// Spec 7.1.4: exponent outside the normal range on decode
    #[test]
    fn decode_exponent_out_of_range() {
        for exp in [EXPONENT_MAX + 1, EXPONENT_MIN - 2] {
            let mut w = BitWriter::new();
            integer::encode(&mut w, 0);
            integer::encode(&mut w, exp);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(decode(&mut r).unwrap_err(), Error::FloatOutOfRange);
        }
    }

    /// Spec 7.1.4: mantissa beyond i64 → IntegerOverflow
    #[test]
    fn decode_mantissa_overflow() {
        let mut w = BitWriter::new();
        w.write_bit(false);
        unsigned_integer::encode(&mut w, u64::MAX);
        integer::encode(&mut w, 0);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(decode(&mut r).unwrap_err(), Error::IntegerOverflow);
    }

    #[test]
    fn decode_eof() {
        let mut r = BitReader::new(&[]);
        assert_eq!(decode(&mut r).unwrap_err(), Error::PrematureEndOfStream);

        let mut w = BitWriter::new();
        integer::encode(&mut w, 0); // mantissa only
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(decode(&mut r).unwrap_err(), Error::PrematureEndOfStream);
    }

    #[test]
    #[should_panic(expected = "exponent")]
    fn encode_special_exponent_as_value_panics() {
        let mut w = BitWriter::new();
        encode(
            &mut w,
            Float::Value {
                mantissa: 0,
                exponent: SPECIAL_EXPONENT,
            },
        );
    }

    // --- lexical forms ---

    /// xsd special values, including the +INF alias
    #[test]
    fn parse_special_values() {
        assert_eq!(Float::from_lexical("INF"), Some(Float::Infinity));
        assert_eq!(Float::from_lexical("+INF"), Some(Float::Infinity));
        assert_eq!(Float::from_lexical("-INF"), Some(Float::NegativeInfinity));
        assert_eq!(Float::from_lexical("NaN"), Some(Float::NaN));
    }

    #[test]
    fn parse_decimal_notation() {
        assert_eq!(
            Float::from_lexical("1.5"),
            Some(Float::Value {
                mantissa: 15,
                exponent: -1
            })
        );
        assert_eq!(
            Float::from_lexical("-0.25"),
            Some(Float::Value {
                mantissa: -25,
                exponent: -2
            })
        );
        assert_eq!(
            Float::from_lexical("42"),
            Some(Float::Value {
                mantissa: 42,
                exponent: 0
            })
        );
    }

    #[test]
    fn parse_scientific_notation() {
        assert_eq!(
            Float::from_lexical("-1.23E10"),
            Some(Float::Value {
                mantissa: -123,
                exponent: 8
            })
        );
        assert_eq!(
            Float::from_lexical("5e-3"),
            Some(Float::Value {
                mantissa: 5,
                exponent: -3
            })
        );
    }

    /// Parsen normalisiert: "1.50" und "15E-1" sind dieselbe Zahl
    #[test]
    fn parse_normalizes() {
        assert_eq!(Float::from_lexical("1.50"), Float::from_lexical("1.5"));
        assert_eq!(
            Float::from_lexical("100"),
            Some(Float::Value {
                mantissa: 1,
                exponent: 2
            })
        );
        assert_eq!(
            Float::from_lexical("0.000"),
            Some(Float::Value {
                mantissa: 0,
                exponent: 0
            })
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        for s in ["", ".", "abc", "1.2.3", "1e", "--5", "1f5", "Inf", "nan"] {
            assert_eq!(Float::from_lexical(s), None, "accepted {s:?}");
        }
    }

    /// Exponenten ausserhalb des 14-bit Bereichs werden beim Parsen abgelehnt
    #[test]
    fn parse_rejects_exponent_overflow() {
        assert_eq!(Float::from_lexical("1E16384"), None);
        assert_eq!(Float::from_lexical("1E-16384"), None);
        assert!(Float::from_lexical("1E16383").is_some());
    }

    #[test]
    fn normalized_is_idempotent() {
        for f in [
            Float::Value {
                mantissa: 1500,
                exponent: -2,
            },
            Float::Value {
                mantissa: 0,
                exponent: 99,
            },
            Float::NaN,
            Float::Infinity,
        ] {
            assert_eq!(f.normalized(), f.normalized().normalized());
        }
    }

    #[test]
    fn display_canonical() {
        assert_eq!(
            Float::Value {
                mantissa: 15,
                exponent: -1
            }
            .to_string(),
            "15E-1"
        );
        assert_eq!(Float::Infinity.to_string(), "INF");
        assert_eq!(Float::NegativeInfinity.to_string(), "-INF");
        assert_eq!(Float::NaN.to_string(), "NaN");
    }
}
