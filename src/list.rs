//! List encoding (Spec 7.1.7).
//!
//! A list is encoded as the item count (an Unsigned Integer, Spec 7.1.6)
//! followed by the encoding of each item according to the list's item type.
//! Item encoding is supplied by the caller, so any datatype representation
//! can serve as the item codec.

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, unsigned_integer};

/// Obergrenze fuer dekodierte Item-Zahlen (korrupte Streams).
pub const MAX_LIST_LENGTH: u64 = 1 << 24;

/// Encodes a list: item count, then each item via `encode_item` (Spec 7.1.7).
pub fn encode<T>(
    writer: &mut BitWriter,
    items: &[T],
    mut encode_item: impl FnMut(&mut BitWriter, &T) -> Result<()>,
) -> Result<()> {
    unsigned_integer::encode(writer, items.len() as u64);
    for item in items {
        encode_item(writer, item)?;
    }
    Ok(())
}

/// Decodes a list: item count, then each item via `decode_item` (Spec 7.1.7).
///
/// Returns [`Error::ListLengthOverflow`] when the decoded count exceeds
/// [`MAX_LIST_LENGTH`].
pub fn decode<T>(
    reader: &mut BitReader,
    mut decode_item: impl FnMut(&mut BitReader) -> Result<T>,
) -> Result<Vec<T>> {
    let len = unsigned_integer::decode(reader)?;
    if len > MAX_LIST_LENGTH {
        return Err(Error::ListLengthOverflow(len));
    }
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(decode_item(reader)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{boolean, integer};

    /// Spec 7.1.7: empty list — count=0, no items
    #[test]
    fn empty_list() {
        let mut w = BitWriter::new();
        encode::<i64>(&mut w, &[], |w, &v| {
            integer::encode(w, v);
            Ok(())
        })
        .unwrap();
        assert_eq!(w.into_vec(), vec![0x00]);
    }

    #[test]
    fn integer_list_round_trip() {
        let items = vec![1i64, -2, 300, 0, i64::MIN];
        let mut w = BitWriter::new();
        encode(&mut w, &items, |w, &v| {
            integer::encode(w, v);
            Ok(())
        })
        .unwrap();
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        let decoded = decode(&mut r, integer::decode).unwrap();
        assert_eq!(decoded, items);
    }

    /// Spec 7.1.7: count precedes the items
    #[test]
    fn count_prefix() {
        let items = vec![true, false, true];
        let mut w = BitWriter::new();
        encode(&mut w, &items, |w, &v| {
            boolean::encode(w, v);
            Ok(())
        })
        .unwrap();
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(unsigned_integer::decode(&mut r).unwrap(), 3);
        assert!(boolean::decode(&mut r).unwrap());
        assert!(!boolean::decode(&mut r).unwrap());
        assert!(boolean::decode(&mut r).unwrap());
    }

    /// Korrupte Riesen-Zahl wird abgelehnt statt allokiert
    #[test]
    fn decode_corrupt_count() {
        let mut w = BitWriter::new();
        unsigned_integer::encode(&mut w, MAX_LIST_LENGTH + 1);
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(
            decode(&mut r, integer::decode).unwrap_err(),
            Error::ListLengthOverflow(MAX_LIST_LENGTH + 1)
        );
    }

    /// Spec 7.1.7: EOF mid-item propagates
    #[test]
    fn decode_eof_mid_item() {
        let mut w = BitWriter::new();
        unsigned_integer::encode(&mut w, 2);
        integer::encode(&mut w, 7); // only one of two items
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        assert_eq!(
            decode(&mut r, integer::decode).unwrap_err(),
            Error::PrematureEndOfStream
        );
    }
}
