//! String encoding (Spec 7.1.10).
//!
//! When no restricted character set is in effect, a string is encoded as a
//! length-prefixed sequence of Unicode code points. The length (number of
//! characters) is an Unsigned Integer (Spec 7.1.6), followed by each
//! character's code point as an Unsigned Integer.
//!
//! The string table miss paths (Spec 7.3) prefix the length with a small
//! offset so a literal is distinguishable from the hit encodings; the
//! `*_with_length_offset` entry points reproduce those layouts.

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, unsigned_integer};

/// Obergrenze fuer die Vorab-Allokation beim Decode (korrupte Längen).
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Encodes a string as a length-prefixed code point sequence (Spec 7.1.10).
pub fn encode(writer: &mut BitWriter, value: &str) {
    encode_with_length_offset(writer, value, 0);
}

/// Encodes a string with `offset` added to the transmitted length (Spec 7.3.3).
///
/// ASCII-Fast-Path: jeder ASCII-Codepoint ergibt im Unsigned Integer genau
/// ein Byte ohne Continuation-Bit — identisch mit dem Roh-Byte, daher
/// Bulk-Write der UTF-8-Bytes.
pub fn encode_with_length_offset(writer: &mut BitWriter, value: &str, offset: u64) {
    if value.is_ascii() {
        // ASCII: len() == char count
        unsigned_integer::encode(writer, value.len() as u64 + offset);
        writer.write_bytes_aligned(value.as_bytes());
        return;
    }
    let count = value.chars().count() as u64;
    unsigned_integer::encode(writer, count + offset);
    for ch in value.chars() {
        unsigned_integer::encode(writer, ch as u64);
    }
}

/// Decodes a length-prefixed string (Spec 7.1.10).
pub fn decode(reader: &mut BitReader) -> Result<String> {
    let len = unsigned_integer::decode(reader)?;
    decode_chars(reader, len)
}

/// Decodes exactly `len` code points; the length has already been consumed
/// (string table literal paths, Spec 7.3).
///
/// Returns [`Error::InvalidCodePoint`] if a decoded code point is a
/// surrogate (U+D800..U+DFFF) or exceeds U+10FFFF.
pub fn decode_chars(reader: &mut BitReader, len: u64) -> Result<String> {
    if let Ok(len_usize) = usize::try_from(len) {
        if let Some(s) = try_decode_ascii_fast(reader, len_usize) {
            return Ok(s);
        }
    }
    // Fallback: Codepoint-by-Codepoint
    let cap = usize::try_from(len).unwrap_or(0).min(MAX_PREALLOC);
    let mut s = String::with_capacity(cap);
    for _ in 0..len {
        let cp = unsigned_integer::decode(reader)?;
        let ch = u32::try_from(cp)
            .ok()
            .and_then(char::from_u32)
            .ok_or(Error::InvalidCodePoint(cp))?;
        s.push(ch);
    }
    Ok(s)
}

/// Versucht `len` Codepoints als ASCII-Bytes zu dekodieren (Fast-Path).
///
/// Gibt `Some` zurück wenn byte-aligned und alle `len` Bytes MSB=0 sind
/// (Single-Byte Unsigned Integers = ASCII). Avanziert den Lesezeiger.
fn try_decode_ascii_fast(reader: &mut BitReader, len: usize) -> Option<String> {
    let bytes = reader.peek_aligned_bytes(len)?;
    if bytes.iter().all(|&b| b & 0x80 == 0) {
        // Alle Bytes < 128 -> valides UTF-8
        let s = String::from_utf8(bytes.to_vec()).ok()?;
        reader.skip_aligned_bytes(len);
        Some(s)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: &str) -> String {
        let mut w = BitWriter::new();
        encode(&mut w, value);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        decode(&mut r).unwrap()
    }

    /// Spec 7.1.10: empty string — length=0, no characters
    #[test]
    fn empty_string() {
        assert_eq!(round_trip(""), "");
        let mut w = BitWriter::new();
        encode(&mut w, "");
        assert_eq!(w.into_vec(), vec![0x00]);
    }

    #[test]
    fn ascii_string() {
        assert_eq!(round_trip("hello"), "hello");
    }

    /// Spec 7.1.10: length is character count, not byte count
    #[test]
    fn length_is_char_count() {
        let mut w = BitWriter::new();
        encode(&mut w, "aé");
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(unsigned_integer::decode(&mut r).unwrap(), 2);
    }

    /// Spec 7.1.10: multi-byte Unicode (BMP, supplementary planes)
    #[test]
    fn unicode_round_trips() {
        for s in ["😀", "漢字", "Hello, 世界! 🌍", "a\u{10FFFF}b"] {
            assert_eq!(round_trip(s), s);
        }
    }

    /// Spec 7.3.3: length offsets shift the transmitted length
    #[test]
    fn length_offsets() {
        for offset in [1u64, 2] {
            let mut w = BitWriter::new();
            encode_with_length_offset(&mut w, "abc", offset);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(unsigned_integer::decode(&mut r).unwrap(), 3 + offset);
            assert_eq!(decode_chars(&mut r, 3).unwrap(), "abc");
        }
    }

    /// Spec 7.3.3: offset path for non-ASCII content
    #[test]
    fn length_offset_non_ascii() {
        let mut w = BitWriter::new();
        encode_with_length_offset(&mut w, "héllo", 2);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(unsigned_integer::decode(&mut r).unwrap(), 7);
        assert_eq!(decode_chars(&mut r, 5).unwrap(), "héllo");
    }

    /// Spec 7.1.10: decode EOF on length and on character data
    #[test]
    fn decode_eof() {
        let mut r = BitReader::new(&[]);
        assert_eq!(decode(&mut r).unwrap_err(), Error::PrematureEndOfStream);

        let mut w = BitWriter::new();
        unsigned_integer::encode(&mut w, 3);
        unsigned_integer::encode(&mut w, 'A' as u64);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(decode(&mut r).unwrap_err(), Error::PrematureEndOfStream);
    }

    /// Spec 7.1.10: surrogates and out-of-range code points are invalid
    #[test]
    fn decode_invalid_code_points() {
        for cp in [0xD800u64, 0xDFFF, 0x110000, u64::MAX] {
            let mut w = BitWriter::new();
            unsigned_integer::encode(&mut w, 1);
            unsigned_integer::encode(&mut w, cp);
            let data = w.into_vec();
            let mut r = BitReader::new(&data);
            assert_eq!(decode(&mut r).unwrap_err(), Error::InvalidCodePoint(cp));
        }
    }

    /// ASCII-Fast-Path: Encode erzeugt identische Bytes wie per-Codepoint-Pfad
    #[test]
    fn ascii_fast_path_byte_identical() {
        let value = "Hello, World!";
        let mut slow = BitWriter::new();
        unsigned_integer::encode(&mut slow, value.len() as u64);
        for ch in value.chars() {
            unsigned_integer::encode(&mut slow, ch as u64);
        }
        let mut fast = BitWriter::new();
        encode(&mut fast, value);
        assert_eq!(fast.into_vec(), slow.into_vec());
    }

    /// ASCII-Fast-Path: langer ASCII-String (2-Byte Länge)
    #[test]
    fn ascii_fast_path_long_string() {
        let s: String = (0..200).map(|i| (b'A' + (i % 26) as u8) as char).collect();
        assert_eq!(round_trip(&s), s);
    }

    /// ASCII-Fast-Path greift nicht an unausgerichteten Bit-Positionen
    #[test]
    fn unaligned_string_round_trip() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        encode(&mut w, "abc");
        let data = w.into_vec();

        let mut r = BitReader::new(&data);
        assert!(r.read_bit().unwrap());
        assert_eq!(decode(&mut r).unwrap(), "abc");
    }

    /// ASCII nach Non-ASCII sequentiell decodieren (Fast→Slow→Fast)
    #[test]
    fn sequential_ascii_and_non_ascii() {
        let mut w = BitWriter::new();
        encode(&mut w, "fast");
        encode(&mut w, "日本語");
        encode(&mut w, "back");
        let data = w.into_vec();

        let mut r = BitReader::new(&data);
        assert_eq!(decode(&mut r).unwrap(), "fast");
        assert_eq!(decode(&mut r).unwrap(), "日本語");
        assert_eq!(decode(&mut r).unwrap(), "back");
    }

    /// Spec 7.1.10: boundary code points (U+0000, U+FFFF, U+10000, U+10FFFF)
    #[test]
    fn boundary_codepoints() {
        let s: String = ['\0', '\u{FFFF}', '\u{10000}', '\u{10FFFF}']
            .iter()
            .collect();
        assert_eq!(round_trip(&s), s);
    }
}
