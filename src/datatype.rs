//! Datatype descriptors.
//!
//! The grammar layer hands the codec engine one [`Datatype`] per value slot.
//! A descriptor is immutable: it carries the variant tag plus whatever
//! construction-time parameters the codec needs (bounds, character set,
//! enumerant list, item type). Descriptors may nest through lists but are
//! never cyclic.

use num_bigint::BigInt;

use crate::datetime::DateTimeKind;
use crate::rcs::RestrictedCharacterSet;
use crate::value::Value;
use crate::{Error, Result, bit_width};

/// Lexical encoding of a binary datatype; one octet wire format either way
/// (Spec 7.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryEncoding {
    Base64,
    Hex,
}

/// An EXI built-in datatype with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Datatype {
    /// Unrestricted string, via the value string table (Spec 7.1.10).
    String,
    /// String over a finite code-point set (Spec 7.1.10.1).
    RestrictedString(RestrictedCharacterSet),
    /// 1-bit boolean (Spec 7.1.2).
    Boolean,
    /// 2-bit boolean preserving the four lexical forms (Spec 7.1.2).
    BooleanPattern,
    Binary(BinaryEncoding),
    Decimal,
    Float,
    /// Unbounded signed integer (Spec 7.1.5).
    Integer,
    /// Non-negative integer (Spec 7.1.6).
    UnsignedInteger,
    /// Bounded integer transmitted as an n-bit offset from `lower`
    /// (Spec 7.1.9).
    NBitInteger { lower: BigInt, upper: BigInt },
    /// Ordinal over a fixed enumerant list (Spec 7.2).
    Enumeration { values: Vec<Value> },
    List { item: Box<Datatype> },
    DateTime(DateTimeKind),
    /// Qualified name via the URI table protocols (Spec 7.1.7).
    QName,
}

impl Datatype {
    /// Bounded integer descriptor; fails when the bounds are inverted.
    pub fn n_bit_integer(lower: impl Into<BigInt>, upper: impl Into<BigInt>) -> Result<Self> {
        let lower = lower.into();
        let upper = upper.into();
        if lower > upper {
            return Err(Error::invalid_value(format!(
                "inverted integer bounds [{lower}, {upper}]"
            )));
        }
        Ok(Self::NBitInteger { lower, upper })
    }

    /// Enumeration descriptor; the enumerant list must not be empty.
    pub fn enumeration(values: Vec<Value>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::invalid_value("empty enumerant list"));
        }
        Ok(Self::Enumeration { values })
    }

    pub fn list(item: Datatype) -> Self {
        Self::List {
            item: Box::new(item),
        }
    }

    /// Wire width in bits for descriptors with a fixed n-bit form.
    pub fn bit_width(&self) -> Option<u8> {
        match self {
            Self::NBitInteger { lower, upper } => {
                let range = upper - lower;
                // Bereiche jenseits von u64 treten in Schemata nicht auf
                let range = u64::try_from(range).ok()?;
                Some(bit_width::for_range(range))
            }
            Self::Enumeration { values } => Some(bit_width::for_count(values.len())),
            _ => None,
        }
    }
}
