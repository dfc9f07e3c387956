//! Restricted Character Sets (Spec 7.1.10.1).
//!
//! Strings whose schema type constrains the usable characters can be encoded
//! with a compact per-character code instead of full code points:
//! - characters in the set: n-bit index, `n = ⌈log₂(N+1)⌉` for a set of N
//! - characters outside the set: escape code N (n-bit) followed by the raw
//!   Unicode code point as an Unsigned Integer (Spec 7.1.6)
//!
//! A set is only usable when it has fewer than 256 characters and contains
//! only BMP characters (U+0000..U+FFFF).

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, bit_width, n_bit_unsigned_integer, unsigned_integer};

/// A finite character set with compact per-character codes (Spec 7.1.10.1).
///
/// The characters are kept sorted by code point; their position in the
/// sorted order is the transmitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedCharacterSet {
    /// Sortiert nach Code Point, dedupliziert.
    chars: Vec<char>,
    /// `⌈log₂(N+1)⌉` — das +1 reserviert den Escape-Code N.
    n: u8,
}

impl RestrictedCharacterSet {
    /// Builds a set from the given characters, sorting and deduplicating.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when the set is empty, contains non-BMP characters,
    /// or holds more than 255 characters after deduplication.
    pub fn new(mut chars: Vec<char>) -> Result<Self> {
        if chars.is_empty() {
            return Err(Error::invalid_value("restricted character set is empty"));
        }
        if chars.iter().any(|&ch| ch as u32 > 0xFFFF) {
            return Err(Error::invalid_value(
                "restricted character set contains non-BMP character",
            ));
        }
        chars.sort_unstable();
        chars.dedup();
        if chars.len() > 255 {
            return Err(Error::invalid_value(format!(
                "restricted character set has {} characters (max 255)",
                chars.len()
            )));
        }
        let n = bit_width::for_count(chars.len() + 1);
        Ok(Self { chars, n })
    }

    /// Number of characters in the set (1..=255).
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // Invariante: chars.len() >= 1
    }

    /// Bits per in-set character code.
    #[inline]
    pub fn bit_width(&self) -> u8 {
        self.n
    }

    /// The characters in sorted code-point order.
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    #[inline]
    fn char_to_index(&self, ch: char) -> Option<usize> {
        self.chars.binary_search(&ch).ok()
    }

    /// Encodes one character: n-bit index, or escape N + code point
    /// (Spec 7.1.10.1).
    pub fn encode_char(&self, writer: &mut BitWriter, ch: char) {
        match self.char_to_index(ch) {
            Some(index) => {
                n_bit_unsigned_integer::encode(writer, index as u64, self.n);
            }
            None => {
                n_bit_unsigned_integer::encode(writer, self.chars.len() as u64, self.n);
                unsigned_integer::encode(writer, ch as u64);
            }
        }
    }

    /// Decodes one character (Spec 7.1.10.1).
    pub fn decode_char(&self, reader: &mut BitReader) -> Result<char> {
        let index = n_bit_unsigned_integer::decode(reader, self.n)? as usize;
        if index < self.chars.len() {
            Ok(self.chars[index])
        } else if index == self.chars.len() {
            let code_point = unsigned_integer::decode(reader)?;
            u32::try_from(code_point)
                .ok()
                .and_then(char::from_u32)
                .ok_or(Error::InvalidCodePoint(code_point))
        } else {
            // Index > N: korrupte Daten
            Err(Error::InvalidEnumerationIndex {
                index,
                enum_count: self.chars.len() + 1,
            })
        }
    }

    /// Encodes a string's characters without a length prefix; the length is
    /// written by the caller (Spec 7.1.10.1).
    pub fn encode_string(&self, writer: &mut BitWriter, value: &str) {
        for ch in value.chars() {
            self.encode_char(writer, ch);
        }
    }

    /// Decodes exactly `len` characters; the length has already been
    /// consumed by the caller (Spec 7.1.10.1).
    pub fn decode_string(&self, reader: &mut BitReader, len: u64) -> Result<String> {
        let mut result = String::with_capacity(len as usize);
        for _ in 0..len {
            result.push(self.decode_char(reader)?);
        }
        Ok(result)
    }
}

// Predefined sets for the built-in types (Table 7-2). All include the XML
// whitespace characters.

fn build_rcs(
    extra_chars: &[char],
    ranges: &[std::ops::RangeInclusive<char>],
) -> RestrictedCharacterSet {
    let mut chars = vec!['\t', '\n', '\r', ' '];
    chars.extend_from_slice(extra_chars);
    for range in ranges {
        chars.extend(range.clone());
    }
    match RestrictedCharacterSet::new(chars) {
        Ok(rcs) => rcs,
        Err(_) => unreachable!("predefined set is valid"),
    }
}

/// base64Binary: { \t, \n, \r, ' ', +, /, 0-9, =, A-Z, a-z }
pub fn base64_binary() -> RestrictedCharacterSet {
    build_rcs(&['+', '/', '='], &['0'..='9', 'A'..='Z', 'a'..='z'])
}

/// hexBinary: { \t, \n, \r, ' ', 0-9, A-F, a-f }
pub fn hex_binary() -> RestrictedCharacterSet {
    build_rcs(&[], &['0'..='9', 'A'..='F', 'a'..='f'])
}

/// boolean: { \t, \n, \r, ' ', 0, 1, a, e, f, l, r, s, t, u }
pub fn boolean() -> RestrictedCharacterSet {
    build_rcs(&['0', '1', 'a', 'e', 'f', 'l', 'r', 's', 't', 'u'], &[])
}

/// dateTime and the gregorian types: { \t, \n, \r, ' ', +, -, ., 0-9, :, T, Z }
pub fn date_time() -> RestrictedCharacterSet {
    build_rcs(&['+', '-', '.', ':', 'T', 'Z'], &['0'..='9'])
}

/// decimal: { \t, \n, \r, ' ', +, -, ., 0-9 }
pub fn decimal() -> RestrictedCharacterSet {
    build_rcs(&['+', '-', '.'], &['0'..='9'])
}

/// double: { \t, \n, \r, ' ', +, -, ., 0-9, E, F, I, N, a, e }
pub fn double() -> RestrictedCharacterSet {
    build_rcs(&['+', '-', '.', 'E', 'F', 'I', 'N', 'a', 'e'], &['0'..='9'])
}

/// integer: { \t, \n, \r, ' ', +, -, 0-9 }
pub fn integer() -> RestrictedCharacterSet {
    build_rcs(&['+', '-'], &['0'..='9'])
}
