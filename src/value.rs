//! The decoded value model.
//!
//! A [`Value`] is what a codec produces on decode and accepts on encode.
//! Equality is canonical: Float values compare in normalized form
//! (10E-1 == 100E-2) and integers compare numerically across internal
//! representations.

use std::fmt;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use num_bigint::BigInt;

use crate::datetime::DateTime;
use crate::decimal::Decimal;
use crate::float::Float;
use crate::qname::QName;

/// An integer in its smallest sufficient representation (Spec 7.1.5).
///
/// All three representations share one wire form; the split is purely an
/// arithmetic fast path. Parsing picks the narrowest fit, decode promotes
/// only when the magnitude demands it.
#[derive(Debug, Clone)]
pub enum IntegerValue {
    Int(i32),
    Long(i64),
    Big(BigInt),
}

impl IntegerValue {
    /// Parses an xsd:integer lexical form into the narrowest representation.
    pub fn from_lexical(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('+').unwrap_or(s);
        let unsigned = digits.strip_prefix('-').unwrap_or(digits);
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if let Ok(v) = digits.parse::<i32>() {
            return Some(Self::Int(v));
        }
        if let Ok(v) = digits.parse::<i64>() {
            return Some(Self::Long(v));
        }
        digits.parse::<BigInt>().ok().map(Self::Big)
    }

    /// Narrowest representation for a `BigInt`, demoting when it fits.
    pub fn from_big(value: BigInt) -> Self {
        if let Ok(v) = i32::try_from(&value) {
            Self::Int(v)
        } else if let Ok(v) = i64::try_from(&value) {
            Self::Long(v)
        } else {
            Self::Big(value)
        }
    }

    pub fn from_i64(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::Long(value),
        }
    }

    /// The value as `i64` when it fits the machine range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Big(v) => i64::try_from(v).ok(),
        }
    }

    pub fn to_big(&self) -> BigInt {
        match self {
            Self::Int(v) => BigInt::from(*v),
            Self::Long(v) => BigInt::from(*v),
            Self::Big(v) => v.clone(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Self::Int(v) => *v < 0,
            Self::Long(v) => *v < 0,
            Self::Big(v) => v.sign() == num_bigint::Sign::Minus,
        }
    }
}

impl PartialEq for IntegerValue {
    /// Numeric equality, independent of the internal representation.
    fn eq(&self, other: &Self) -> bool {
        match (self.as_i64(), other.as_i64()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.to_big() == other.to_big(),
            _ => false,
        }
    }
}

impl Eq for IntegerValue {}

impl fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => v.fmt(f),
            Self::Long(v) => v.fmt(f),
            Self::Big(v) => v.fmt(f),
        }
    }
}

impl From<i32> for IntegerValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for IntegerValue {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<u64> for IntegerValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Self::from_i64(v),
            Err(_) => Self::Big(BigInt::from(value)),
        }
    }
}

/// A typed content value.
#[derive(Debug, Clone)]
pub enum Value {
    String(Rc<str>),
    Boolean(bool),
    Integer(IntegerValue),
    Decimal(Decimal),
    Float(Float),
    DateTime(DateTime),
    Binary(Vec<u8>),
    QName(QName),
    List(Vec<Value>),
    /// Ordinal into the declared enumerant list.
    Enumeration(usize),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::String(s.into())
    }

    /// The string content, for string-valued variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            // Kanonische Gleichheit: 10E-1 == 100E-2
            (Self::Float(a), Self::Float(b)) => a.normalized() == b.normalized(),
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::QName(a), Self::QName(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Enumeration(a), Self::Enumeration(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    /// Canonical lexical rendering; lists are space-separated, binary is
    /// rendered as base64.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Integer(v) => v.fmt(f),
            Self::Decimal(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::DateTime(v) => v.fmt(f),
            Self::Binary(bytes) => f.write_str(&BASE64.encode(bytes)),
            Self::QName(q) => q.fmt(f),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.fmt(f)?;
                }
                Ok(())
            }
            Self::Enumeration(i) => i.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<IntegerValue> for Value {
    fn from(value: IntegerValue) -> Self {
        Self::Integer(value)
    }
}
