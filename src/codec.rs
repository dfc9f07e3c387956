//! Datatype codec family and dispatch (Spec 7).
//!
//! One codec per built-in datatype, all behind the [`DatatypeCodec`] trait.
//! The encode side is two-phase: [`is_valid`](DatatypeCodec::is_valid)
//! parses a [`Value`] into the codec's canonical internal form and arms the
//! codec, [`write_value`](DatatypeCodec::write_value) consumes the armed
//! form. Lexical failure is recoverable (`is_valid` returns false, the
//! grammar layer picks a fallback); everything on the decode side is a hard
//! [`Error`].
//!
//! Codecs are stateless across values apart from construction-time
//! parameters; the per-value lifecycle is Unvalidated → Validated, reset on
//! every call.

use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::trace;
use num_bigint::BigInt;

use crate::bitstream::{BitReader, BitWriter};
use crate::boolean::BooleanValue;
use crate::datatype::BinaryEncoding::{self, Base64, Hex};
use crate::datatype::Datatype;
use crate::datetime::{self, DateTime, DateTimeKind};
use crate::decimal::{self, Decimal};
use crate::float::{self, Float};
use crate::qname::{QName, StringInterner};
use crate::rcs::RestrictedCharacterSet;
use crate::string_table::{UriTable, ValueHit, ValueTable};
use crate::value::{IntegerValue, Value};
use crate::{
    Error, Result, bit_width, binary, boolean, integer, n_bit_unsigned_integer, string,
    unsigned_integer,
};

/// Maps a prefix to its namespace URI; injected by the caller for
/// QName-typed slots, the engine owns no namespace scope of its own.
pub trait NamespaceResolver {
    fn resolve_prefix(&self, prefix: &str) -> Option<Rc<str>>;
}

/// The mutable table state of one coding run: URI/local-name/prefix table,
/// value string table, and the interner sharing decoded allocations.
///
/// One instance per run; never shared across runs (Spec 7.3). `reset`
/// restores the URI baseline and empties the value table for a fresh run
/// over the same configuration.
pub struct CodingTables {
    pub uris: UriTable,
    pub values: ValueTable,
    pub interner: StringInterner,
    pub preserve_prefixes: bool,
}

impl CodingTables {
    pub fn new(preserve_prefixes: bool) -> Self {
        Self::with_limits(None, None, preserve_prefixes)
    }

    /// `value_max_length` / `value_partition_capacity` are the EXI options
    /// of the same names; both sides of a stream must agree on them.
    pub fn with_limits(
        value_max_length: Option<usize>,
        value_partition_capacity: Option<usize>,
        preserve_prefixes: bool,
    ) -> Self {
        Self {
            uris: UriTable::with_default_entries(),
            values: ValueTable::with_options(value_max_length, value_partition_capacity),
            interner: StringInterner::new(),
            preserve_prefixes,
        }
    }

    pub fn reset(&mut self) {
        self.uris.reset();
        self.values.reset();
    }
}

/// One EXI datatype representation (Spec 7.1).
pub trait DatatypeCodec {
    /// Parses `value` into the codec's canonical form. Returns false on
    /// lexical failure. A successful call arms the next `write_value`.
    fn is_valid(&mut self, value: &Value) -> bool;

    /// Writes the value accepted by the preceding `is_valid`, consuming it.
    /// Calling without a successful `is_valid` is a contract violation and
    /// fails with [`Error::InvalidValue`].
    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<()>;

    /// Reads one value, mirroring `write_value` bit for bit.
    fn read_value(
        &mut self,
        reader: &mut BitReader,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<Value>;
}

/// Selects the codec for a datatype descriptor.
pub fn codec_for(datatype: &Datatype) -> Box<dyn DatatypeCodec> {
    build_codec(datatype, None)
}

/// Like [`codec_for`], with a namespace resolver so QName-typed slots can
/// validate prefixed lexical forms.
pub fn codec_for_with_resolver(
    datatype: &Datatype,
    resolver: Rc<dyn NamespaceResolver>,
) -> Box<dyn DatatypeCodec> {
    build_codec(datatype, Some(resolver))
}

fn build_codec(
    datatype: &Datatype,
    resolver: Option<Rc<dyn NamespaceResolver>>,
) -> Box<dyn DatatypeCodec> {
    trace!("codec dispatch for {datatype:?}");
    match datatype {
        Datatype::String => Box::new(StringCodec::plain()),
        Datatype::RestrictedString(set) => Box::new(StringCodec::restricted(set.clone())),
        Datatype::Boolean => Box::new(BooleanCodec::default()),
        Datatype::BooleanPattern => Box::new(BooleanPatternCodec::default()),
        Datatype::Binary(encoding) => Box::new(BinaryCodec::new(*encoding)),
        Datatype::Decimal => Box::new(DecimalCodec::default()),
        Datatype::Float => Box::new(FloatCodec::default()),
        Datatype::Integer => Box::new(IntegerCodec::default()),
        Datatype::UnsignedInteger => Box::new(UnsignedIntegerCodec::default()),
        Datatype::NBitInteger { lower, upper } => {
            Box::new(NBitIntegerCodec::new(lower.clone(), upper.clone()))
        }
        Datatype::Enumeration { values } => Box::new(EnumerationCodec::new(values.clone())),
        Datatype::List { item } => Box::new(ListCodec::new(build_codec(item, resolver))),
        Datatype::DateTime(kind) => Box::new(DateTimeCodec::new(*kind)),
        Datatype::QName => Box::new(QNameCodec::new(resolver)),
    }
}

fn not_validated() -> Error {
    Error::invalid_value("write_value without successful is_valid")
}

// === String (Spec 7.1.10, table protocol Spec 7.3.3) ===

struct StringCodec {
    rcs: Option<RestrictedCharacterSet>,
    validated: Option<Rc<str>>,
}

impl StringCodec {
    fn plain() -> Self {
        Self {
            rcs: None,
            validated: None,
        }
    }

    fn restricted(set: RestrictedCharacterSet) -> Self {
        Self {
            rcs: Some(set),
            validated: None,
        }
    }

    fn write_literal(&self, writer: &mut BitWriter, value: &str) {
        match &self.rcs {
            // Länge extern, dann Zeichen über das restringierte Alphabet
            Some(set) => {
                unsigned_integer::encode(writer, value.chars().count() as u64 + 2);
                set.encode_string(writer, value);
            }
            None => string::encode_with_length_offset(writer, value, 2),
        }
    }

    fn read_literal(&self, reader: &mut BitReader, len: u64) -> Result<String> {
        match &self.rcs {
            Some(set) => set.decode_string(reader, len),
            None => string::decode_chars(reader, len),
        }
    }
}

impl DatatypeCodec for StringCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::String(s) => Some(Rc::clone(s)),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        match tables.values.lookup(context, &value) {
            ValueHit::Local(id) => {
                unsigned_integer::encode(writer, 0);
                let n = bit_width::for_count(tables.values.local_size(context));
                n_bit_unsigned_integer::encode(writer, id as u64, n);
            }
            ValueHit::Global(id) => {
                unsigned_integer::encode(writer, 1);
                let n = bit_width::for_count(tables.values.global_size());
                n_bit_unsigned_integer::encode(writer, id as u64, n);
            }
            ValueHit::Miss => {
                self.write_literal(writer, &value);
                tables.values.insert(context, value);
            }
        }
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<Value> {
        let head = unsigned_integer::decode(reader)?;
        let value = match head {
            0 => {
                let n = bit_width::for_count(tables.values.local_size(context));
                let id = n_bit_unsigned_integer::decode(reader, n)? as usize;
                tables
                    .values
                    .local_value(context, id)
                    .ok_or(Error::InvalidCompactId(id))?
            }
            1 => {
                let n = bit_width::for_count(tables.values.global_size());
                let id = n_bit_unsigned_integer::decode(reader, n)? as usize;
                tables
                    .values
                    .global_value(id)
                    .ok_or(Error::InvalidCompactId(id))?
            }
            _ => {
                let len = head - 2;
                if len > u32::MAX as u64 {
                    return Err(Error::StringLengthExceeded {
                        length: len,
                        max: u32::MAX,
                    });
                }
                let literal = self.read_literal(reader, len)?;
                let rc = tables.interner.intern(&literal);
                tables.values.insert(context, Rc::clone(&rc));
                rc
            }
        };
        Ok(Value::String(value))
    }
}

// === Boolean (Spec 7.1.2) ===

#[derive(Default)]
struct BooleanCodec {
    validated: Option<bool>,
}

impl DatatypeCodec for BooleanCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Boolean(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        boolean::encode(writer, value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        Ok(Value::Boolean(boolean::decode(reader)?))
    }
}

#[derive(Default)]
struct BooleanPatternCodec {
    validated: Option<BooleanValue>,
}

impl DatatypeCodec for BooleanPatternCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::String(s) => BooleanValue::from_lexical(s.trim()),
            Value::Boolean(true) => Some(BooleanValue::True),
            Value::Boolean(false) => Some(BooleanValue::False),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        boolean::encode_with_pattern(writer, value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let value = boolean::decode_with_pattern(reader)?;
        // Die exakte Lexikalform bleibt erhalten
        Ok(Value::string(value.as_str()))
    }
}

// === Binary (Spec 7.1.1) ===

struct BinaryCodec {
    encoding: BinaryEncoding,
    validated: Option<Vec<u8>>,
}

impl BinaryCodec {
    fn new(encoding: BinaryEncoding) -> Self {
        Self {
            encoding,
            validated: None,
        }
    }

    fn parse(&self, s: &str) -> Option<Vec<u8>> {
        match self.encoding {
            Base64 => {
                let collapsed: String = s.split_whitespace().collect();
                BASE64.decode(collapsed).ok()
            }
            Hex => parse_hex(s.trim()),
        }
    }
}

fn parse_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    s.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

impl DatatypeCodec for BinaryCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Binary(bytes) => Some(bytes.clone()),
            Value::String(s) => self.parse(s),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        binary::encode(writer, &value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        Ok(Value::Binary(binary::decode(reader)?))
    }
}

// === Decimal (Spec 7.1.3) ===

#[derive(Default)]
struct DecimalCodec {
    validated: Option<Decimal>,
}

impl DatatypeCodec for DecimalCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Decimal(d) => Some(d.clone()),
            Value::String(s) => Decimal::from_lexical(s.trim()),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        decimal::encode(writer, &value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        Ok(Value::Decimal(decimal::decode(reader)?))
    }
}

// === Float (Spec 7.1.4) ===

#[derive(Default)]
struct FloatCodec {
    validated: Option<Float>,
}

impl DatatypeCodec for FloatCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Float(f) => Some(f.normalized()),
            Value::String(s) => Float::from_lexical(s.trim()),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        float::encode(writer, value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        Ok(Value::Float(float::decode(reader)?))
    }
}

// === Integer (Spec 7.1.5) and Unsigned Integer (Spec 7.1.6) ===

#[derive(Default)]
struct IntegerCodec {
    validated: Option<IntegerValue>,
}

impl DatatypeCodec for IntegerCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Integer(v) => Some(v.clone()),
            Value::String(s) => IntegerValue::from_lexical(s.trim()),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        // Alle drei Repräsentationen teilen eine Drahtform
        match value.as_i64() {
            Some(v) => integer::encode(writer, v),
            None => integer::encode_big(writer, &value.to_big()),
        }
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let value = integer::decode_big(reader)?;
        Ok(Value::Integer(IntegerValue::from_big(value)))
    }
}

#[derive(Default)]
struct UnsignedIntegerCodec {
    validated: Option<IntegerValue>,
}

impl DatatypeCodec for UnsignedIntegerCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        let parsed = match value {
            Value::Integer(v) => Some(v.clone()),
            Value::String(s) => IntegerValue::from_lexical(s.trim()),
            _ => None,
        };
        self.validated = parsed.filter(|v| !v.is_negative());
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        match value.as_i64() {
            Some(v) => unsigned_integer::encode(writer, v as u64),
            None => {
                // Nicht-negativ nach Validierung
                let (_, magnitude) = value.to_big().into_parts();
                unsigned_integer::encode_big(writer, &magnitude);
            }
        }
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let value = unsigned_integer::decode_big(reader)?;
        Ok(Value::Integer(IntegerValue::from_big(BigInt::from(value))))
    }
}

// === NBit bounded integer (Spec 7.1.9) ===

struct NBitIntegerCodec {
    lower: BigInt,
    upper: BigInt,
    validated: Option<BigInt>,
}

impl NBitIntegerCodec {
    fn new(lower: BigInt, upper: BigInt) -> Self {
        Self {
            lower,
            upper,
            validated: None,
        }
    }

    /// Machine-width fast path when both bounds fit i64; the wire form is
    /// identical either way.
    fn machine_bounds(&self) -> Option<(i64, i64)> {
        Some((
            i64::try_from(&self.lower).ok()?,
            i64::try_from(&self.upper).ok()?,
        ))
    }
}

impl DatatypeCodec for NBitIntegerCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        let parsed = match value {
            Value::Integer(v) => Some(v.to_big()),
            Value::String(s) => IntegerValue::from_lexical(s.trim()).map(|v| v.to_big()),
            _ => None,
        };
        self.validated = parsed.filter(|v| &self.lower <= v && v <= &self.upper);
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        match self.machine_bounds() {
            Some((lower, upper)) => {
                // Validierung garantiert lower <= value <= upper
                let v = i64::try_from(&value).map_err(|_| Error::IntegerOverflow)?;
                integer::encode_bounded(writer, v, lower, upper);
            }
            None => {
                let width = integer::bounded_big_width(&self.lower, &self.upper)?;
                let offset = integer::bounded_big_offset(&value, &self.lower)?;
                n_bit_unsigned_integer::encode(writer, offset, width);
            }
        }
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let value = match self.machine_bounds() {
            Some((lower, upper)) => {
                IntegerValue::from_i64(integer::decode_bounded(reader, lower, upper)?)
            }
            None => {
                IntegerValue::from_big(integer::decode_bounded_big(reader, &self.lower, &self.upper)?)
            }
        };
        Ok(Value::Integer(value))
    }
}

// === Enumeration (Spec 7.2) ===

struct EnumerationCodec {
    values: Vec<Value>,
    validated: Option<usize>,
}

impl EnumerationCodec {
    fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            validated: None,
        }
    }
}

impl DatatypeCodec for EnumerationCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::Enumeration(i) if *i < self.values.len() => Some(*i),
            Value::Enumeration(_) => None,
            // Enumerant-Abgleich über kanonische Gleichheit
            other => self.values.iter().position(|v| v == other),
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let index = self.validated.take().ok_or_else(not_validated)?;
        crate::enumeration::encode(writer, index, self.values.len());
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let index = crate::enumeration::decode(reader, self.values.len())?;
        Ok(Value::Enumeration(index))
    }
}

// === List (Spec 7.1.8) ===

struct ListCodec {
    item: Box<dyn DatatypeCodec>,
    validated: Option<Vec<Value>>,
}

impl ListCodec {
    fn new(item: Box<dyn DatatypeCodec>) -> Self {
        Self {
            item,
            validated: None,
        }
    }
}

impl DatatypeCodec for ListCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        let items: Option<Vec<Value>> = match value {
            Value::List(items) => Some(items.clone()),
            // xsd-Listen-Lexikalform: Whitespace-getrennte Items
            Value::String(s) => Some(s.split_whitespace().map(Value::string).collect()),
            _ => None,
        };
        self.validated = items.filter(|items| items.iter().all(|item| self.item.is_valid(item)));
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<()> {
        let items = self.validated.take().ok_or_else(not_validated)?;
        let item_codec = &mut self.item;
        crate::list::encode(writer, &items, |writer, item| {
            if !item_codec.is_valid(item) {
                return Err(Error::invalid_value("list item failed re-validation"));
            }
            item_codec.write_value(writer, tables, context)
        })
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        tables: &mut CodingTables,
        context: &QName,
    ) -> Result<Value> {
        let item_codec = &mut self.item;
        let items = crate::list::decode(reader, |reader| {
            item_codec.read_value(reader, tables, context)
        })?;
        Ok(Value::List(items))
    }
}

// === DateTime family (Spec 7.1.8, Table 7-4) ===

struct DateTimeCodec {
    kind: DateTimeKind,
    validated: Option<DateTime>,
}

impl DateTimeCodec {
    fn new(kind: DateTimeKind) -> Self {
        Self {
            kind,
            validated: None,
        }
    }
}

impl DatatypeCodec for DateTimeCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::DateTime(dt) if dt.kind() == self.kind => Some(dt.clone()),
            Value::String(s) => DateTime::from_lexical(self.kind, s.trim()),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        datetime::encode(writer, &value);
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        _tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        Ok(Value::DateTime(datetime::decode(reader, self.kind)?))
    }
}

// === QName (Spec 7.1.7, table protocols Spec 7.3.1) ===

struct QNameCodec {
    resolver: Option<Rc<dyn NamespaceResolver>>,
    validated: Option<QName>,
}

impl QNameCodec {
    fn new(resolver: Option<Rc<dyn NamespaceResolver>>) -> Self {
        Self {
            resolver,
            validated: None,
        }
    }

    /// Resolves "prefix:local" / "local" through the injected resolver.
    fn resolve_lexical(&self, s: &str) -> Option<QName> {
        let resolver = self.resolver.as_ref()?;
        match s.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
                let uri = resolver.resolve_prefix(prefix)?;
                Some(QName::with_prefix(uri, local, prefix))
            }
            Some(_) => None,
            None if !s.is_empty() => {
                let uri = resolver
                    .resolve_prefix("")
                    .unwrap_or_else(|| Rc::from(""));
                Some(QName::new(uri, s))
            }
            None => None,
        }
    }
}

fn write_uri(writer: &mut BitWriter, tables: &mut CodingTables, uri: &str) -> usize {
    let n = bit_width::for_count(tables.uris.uri_count() + 1);
    match tables.uris.lookup_uri(uri) {
        Some(id) => {
            n_bit_unsigned_integer::encode(writer, id as u64 + 1, n);
            id
        }
        None => {
            n_bit_unsigned_integer::encode(writer, 0, n);
            string::encode(writer, uri);
            tables.uris.add_uri(uri)
        }
    }
}

fn read_uri(reader: &mut BitReader, tables: &mut CodingTables) -> Result<(usize, Rc<str>)> {
    let n = bit_width::for_count(tables.uris.uri_count() + 1);
    let code = n_bit_unsigned_integer::decode(reader, n)? as usize;
    if code == 0 {
        let literal = string::decode(reader)?;
        let uri = tables.interner.intern(&literal);
        let id = tables.uris.add_uri(&uri);
        Ok((id, uri))
    } else {
        let id = code - 1;
        let uri = tables.uris.uri(id).ok_or(Error::InvalidCompactId(id))?;
        Ok((id, uri))
    }
}

fn write_local_name(writer: &mut BitWriter, tables: &mut CodingTables, uri_id: usize, name: &str) {
    match tables.uris.lookup_local_name(uri_id, name) {
        Some(id) => {
            unsigned_integer::encode(writer, 0);
            let n = bit_width::for_count(tables.uris.local_name_count(uri_id));
            n_bit_unsigned_integer::encode(writer, id as u64, n);
        }
        None => {
            string::encode_with_length_offset(writer, name, 1);
            tables.uris.add_local_name(uri_id, name);
        }
    }
}

fn read_local_name(
    reader: &mut BitReader,
    tables: &mut CodingTables,
    uri_id: usize,
) -> Result<Rc<str>> {
    let head = unsigned_integer::decode(reader)?;
    if head == 0 {
        let n = bit_width::for_count(tables.uris.local_name_count(uri_id));
        let id = n_bit_unsigned_integer::decode(reader, n)? as usize;
        tables
            .uris
            .local_name(uri_id, id)
            .ok_or(Error::InvalidCompactId(id))
    } else {
        let literal = string::decode_chars(reader, head - 1)?;
        let name = tables.interner.intern(&literal);
        tables.uris.add_local_name(uri_id, &name);
        Ok(name)
    }
}

/// Prefix selection, only present on prefix-preserving streams. An empty
/// partition writes nothing; an unknown prefix falls back to index 0.
fn write_prefix(writer: &mut BitWriter, tables: &CodingTables, uri_id: usize, prefix: Option<&str>) {
    let count = tables.uris.prefix_count(uri_id);
    if count == 0 {
        return;
    }
    let index = prefix
        .and_then(|p| tables.uris.lookup_prefix(uri_id, p))
        .unwrap_or(0);
    n_bit_unsigned_integer::encode(writer, index as u64, bit_width::for_count(count));
}

fn read_prefix(
    reader: &mut BitReader,
    tables: &CodingTables,
    uri_id: usize,
) -> Result<Option<Rc<str>>> {
    let count = tables.uris.prefix_count(uri_id);
    if count == 0 {
        return Ok(None);
    }
    let index = n_bit_unsigned_integer::decode(reader, bit_width::for_count(count))?;
    tables
        .uris
        .prefix(uri_id, index as usize)
        .map(Some)
        .ok_or(Error::UnresolvedPrefix(index))
}

impl DatatypeCodec for QNameCodec {
    fn is_valid(&mut self, value: &Value) -> bool {
        self.validated = match value {
            Value::QName(q) => Some(q.clone()),
            Value::String(s) => self.resolve_lexical(s.trim()),
            _ => None,
        };
        self.validated.is_some()
    }

    fn write_value(
        &mut self,
        writer: &mut BitWriter,
        tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<()> {
        let value = self.validated.take().ok_or_else(not_validated)?;
        let uri_id = write_uri(writer, tables, &value.uri);
        write_local_name(writer, tables, uri_id, &value.local_name);
        if tables.preserve_prefixes {
            write_prefix(writer, tables, uri_id, value.prefix.as_deref());
        }
        Ok(())
    }

    fn read_value(
        &mut self,
        reader: &mut BitReader,
        tables: &mut CodingTables,
        _context: &QName,
    ) -> Result<Value> {
        let (uri_id, uri) = read_uri(reader, tables)?;
        let local_name = read_local_name(reader, tables, uri_id)?;
        let prefix = if tables.preserve_prefixes {
            read_prefix(reader, tables, uri_id)?
        } else {
            None
        };
        let mut qname = QName::new(uri, local_name);
        qname.prefix = prefix;
        Ok(Value::QName(qname))
    }
}
