//! Binary encoding (Spec 7.1.1).
//!
//! The Binary datatype representation is a length-prefixed sequence of octets.
//! The length is represented as an Unsigned Integer (Spec 7.1.6).

use crate::bitstream::{BitReader, BitWriter};
use crate::{Result, unsigned_integer};

/// Obergrenze fuer die Vorab-Allokation beim Decode (korrupte Längen).
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Encodes binary data as a length-prefixed sequence of octets (Spec 7.1.1).
pub fn encode(writer: &mut BitWriter, value: &[u8]) {
    unsigned_integer::encode(writer, value.len() as u64);
    writer.write_bytes_aligned(value);
}

/// Decodes binary data from a length-prefixed sequence of octets (Spec 7.1.1).
pub fn decode(reader: &mut BitReader) -> Result<Vec<u8>> {
    let len = unsigned_integer::decode(reader)?;
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    if len <= MAX_PREALLOC {
        reader.read_bytes_aligned(len)
    } else {
        // Länge grösser als der Guard: byte-weise lesen, EOF beendet früh.
        let mut buf = Vec::with_capacity(MAX_PREALLOC);
        for _ in 0..len {
            buf.push(reader.read_byte_aligned()?);
        }
        Ok(buf)
    }
}
