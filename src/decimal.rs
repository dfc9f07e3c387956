//! Decimal encoding (Spec 7.1.3).
//!
//! The Decimal datatype representation is a Boolean sign (Spec 7.1.2) followed
//! by two Unsigned Integers (Spec 7.1.6): the integral portion and the
//! fractional portion. The fractional digits are stored in reverse order so
//! that leading zeros of the fraction survive the numeric representation
//! ("0.05" stores the fraction as 50). Both portions are arbitrary precision.

use std::cell::OnceCell;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::bitstream::{BitReader, BitWriter};
use crate::{Result, boolean, unsigned_integer};

/// An EXI decimal value (Spec 7.1.3).
///
/// Trailing zeros of the fraction are not representable (the reversed digit
/// string "043" and "43" are the same number), so values are canonical by
/// construction. Minus zero normalizes to non-negative zero.
#[derive(Debug, Clone)]
pub struct Decimal {
    negative: bool,
    integral: BigUint,
    /// Nachkommastellen in umgekehrter Ziffernreihenfolge.
    rev_fractional: BigUint,
    /// Memoisierte kanonische Lexikalform.
    lexical: OnceCell<Box<str>>,
}

impl Decimal {
    /// Builds a decimal from its wire components, normalizing minus zero.
    pub fn new(negative: bool, integral: BigUint, rev_fractional: BigUint) -> Self {
        let negative = negative && !(integral.is_zero() && rev_fractional.is_zero());
        Self {
            negative,
            integral,
            rev_fractional,
            lexical: OnceCell::new(),
        }
    }

    /// Parses an xsd:decimal lexical form.
    ///
    /// Accepts an optional sign, integral digits, and an optional fraction.
    /// Trailing fraction zeros are dropped; "-0.0" becomes non-negative zero.
    pub fn from_lexical(s: &str) -> Option<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
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

        let integral = if int_digits.is_empty() {
            BigUint::zero()
        } else {
            int_digits.parse().ok()?
        };
        let frac_digits = frac_digits.trim_end_matches('0');
        let rev_fractional = if frac_digits.is_empty() {
            BigUint::zero()
        } else {
            let reversed: String = frac_digits.chars().rev().collect();
            reversed.parse().ok()?
        };
        Some(Self::new(negative, integral, rev_fractional))
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    #[inline]
    pub fn integral(&self) -> &BigUint {
        &self.integral
    }

    /// The fractional digits as a number with reversed digit order.
    #[inline]
    pub fn rev_fractional(&self) -> &BigUint {
        &self.rev_fractional
    }

    /// Canonical lexical form, built once and memoized.
    pub fn lexical(&self) -> &str {
        self.lexical.get_or_init(|| {
            let mut s = String::new();
            if self.negative {
                s.push('-');
            }
            s.push_str(&self.integral.to_string());
            if !self.rev_fractional.is_zero() {
                s.push('.');
                s.extend(self.rev_fractional.to_string().chars().rev());
            }
            s.into_boxed_str()
        })
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        // Memo nicht vergleichen
        self.negative == other.negative
            && self.integral == other.integral
            && self.rev_fractional == other.rev_fractional
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lexical())
    }
}

/// Encodes a decimal value (Spec 7.1.3).
pub fn encode(writer: &mut BitWriter, value: &Decimal) {
    boolean::encode(writer, value.negative);
    unsigned_integer::encode_big(writer, &value.integral);
    unsigned_integer::encode_big(writer, &value.rev_fractional);
}

/// Decodes a decimal value (Spec 7.1.3).
pub fn decode(reader: &mut BitReader) -> Result<Decimal> {
    let negative = boolean::decode(reader)?;
    let integral = unsigned_integer::decode_big(reader)?;
    let rev_fractional = unsigned_integer::decode_big(reader)?;
    Ok(Decimal::new(negative, integral, rev_fractional))
}
