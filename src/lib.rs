//! exidata – EXI 1.0 (W3C Second Edition) value and datatype codec engine
//!
//! The value-side core of an EXI processor: the bit-packed channel
//! primitives (Spec 7.1), the datatype codec family (Spec 7), and the
//! runtime string/QName tables with their compact-identifier protocols
//! (Spec 7.3). The grammar and event-code machinery sits above this crate
//! and supplies a [`Datatype`] descriptor plus a [`QName`] context per
//! value slot.
//!
//! # Beispiel
//!
//! ```
//! use exidata::bitstream::{BitReader, BitWriter};
//! use exidata::{CodingTables, Datatype, QName, Value, codec_for};
//!
//! let datatype = Datatype::Decimal;
//! let context = QName::new("http://example.org", "price");
//!
//! // Encode: is_valid parst die Lexikalform, write_value verbraucht sie
//! let mut codec = codec_for(&datatype);
//! let mut tables = CodingTables::new(false);
//! let mut writer = BitWriter::new();
//! assert!(codec.is_valid(&Value::string("12.50")));
//! codec.write_value(&mut writer, &mut tables, &context).unwrap();
//! let bytes = writer.into_vec();
//!
//! // Decode
//! let mut tables = CodingTables::new(false);
//! let mut reader = BitReader::new(&bytes);
//! let value = codec.read_value(&mut reader, &mut tables, &context).unwrap();
//! assert_eq!(value.to_string(), "12.5");
//! ```

pub mod binary;
pub mod bit_width;
pub mod bitstream;
pub mod boolean;
pub mod codec;
pub mod datatype;
pub mod datetime;
pub mod decimal;
pub mod enumeration;
pub mod error;
pub mod float;
pub mod integer;
pub mod list;
pub mod n_bit_unsigned_integer;
pub mod qname;
pub mod rcs;
pub mod string;
pub mod string_table;
pub mod unsigned_integer;
pub mod value;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Werte und Deskriptoren
pub use datatype::{BinaryEncoding, Datatype};
pub use datetime::{DateTime, DateTimeKind};
pub use decimal::Decimal;
pub use float::Float;
pub use qname::QName;
pub use value::{IntegerValue, Value};

// Public API: Codec-Familie
pub use codec::{
    CodingTables, DatatypeCodec, NamespaceResolver, codec_for, codec_for_with_resolver,
};

// Public API: Tabellen
pub use string_table::{UriTable, ValueHit, ValueTable};
