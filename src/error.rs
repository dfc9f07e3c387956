//! Central error types for the value/datatype codec engine.
//!
//! Each variant references the relevant W3C EXI 1.0 Second Edition spec section.
//! Lexical validation failures are not errors: `is_valid` reports them by
//! returning `false` (Spec 7.1).

use core::fmt;

/// All fatal error conditions of the codec engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The EXI stream ended before a complete value was decoded (Spec 6).
    PrematureEndOfStream,
    /// An integer value exceeds the representable range (Spec 7.1.5, 7.1.6).
    IntegerOverflow,
    /// A float value exceeds the representable range (Spec 7.1.4 MUST NOT).
    FloatOutOfRange,
    /// A Unicode code point is invalid: surrogate (U+D800..U+DFFF) or > U+10FFFF (Spec 7.1.10).
    InvalidCodePoint(u64),
    /// A compact identifier does not reference an existing table entry (Spec 7.3).
    InvalidCompactId(usize),
    /// A QName prefix index could not be resolved (Spec 7.1.7).
    UnresolvedPrefix(u64),
    /// An enumeration index exceeds the valid range (Spec 7.2).
    InvalidEnumerationIndex { index: usize, enum_count: usize },
    /// A list length exceeds the maximum allowed size (Spec 7.1.11).
    ListLengthOverflow(u64),
    /// A decoded string exceeds the configured maximum length.
    StringLengthExceeded { length: u64, max: u32 },
    /// A typed value could not be produced or is structurally invalid (Spec 7.1).
    InvalidValue(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrematureEndOfStream => write!(f, "premature end of EXI stream (Spec 6)"),
            Self::IntegerOverflow => write!(f, "integer overflow (Spec 7.1.5, 7.1.6)"),
            Self::FloatOutOfRange => write!(f, "float value out of range (Spec 7.1.4)"),
            Self::InvalidCodePoint(cp) => {
                write!(f, "invalid Unicode code point U+{cp:X} (Spec 7.1.10)")
            }
            Self::InvalidCompactId(id) => {
                write!(f, "invalid compact identifier {id} (Spec 7.3)")
            }
            Self::UnresolvedPrefix(idx) => {
                write!(f, "unresolved QName prefix index {idx} (Spec 7.1.7)")
            }
            Self::InvalidEnumerationIndex { index, enum_count } => {
                write!(f, "enum index {index} exceeds valid range 0..{enum_count} (Spec 7.2)")
            }
            Self::ListLengthOverflow(len) => {
                write!(f, "list length {len} exceeds max allowed size (Spec 7.1.11)")
            }
            Self::StringLengthExceeded { length, max } => {
                write!(f, "string length {length} exceeds maximum {max}")
            }
            Self::InvalidValue(msg) => write!(f, "invalid typed value (Spec 7.1): {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `InvalidValue` Fehler mit Nachricht.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
