//! Qualified names and string interning.
//!
//! A [`QName`] identifies a value context: the namespace URI plus the local
//! name. The optional prefix is carried for prefix-preserving streams but
//! never takes part in identity, two QNames with the same URI and local
//! name address the same string table partitions regardless of prefix.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A namespace-qualified name.
#[derive(Debug, Clone)]
pub struct QName {
    pub uri: Rc<str>,
    pub local_name: Rc<str>,
    pub prefix: Option<Rc<str>>,
}

impl QName {
    pub fn new(uri: impl Into<Rc<str>>, local_name: impl Into<Rc<str>>) -> Self {
        Self {
            uri: uri.into(),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(
        uri: impl Into<Rc<str>>,
        local_name: impl Into<Rc<str>>,
        prefix: impl Into<Rc<str>>,
    ) -> Self {
        Self {
            uri: uri.into(),
            local_name: local_name.into(),
            prefix: Some(prefix.into()),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        // Prefix ist nicht identitätsrelevant
        self.uri == other.uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{uri}local`, or the bare local name for the empty
    /// namespace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local_name)
        }
    }
}

const INTERNER_SLOTS: usize = 32;

/// Direct-mapped `Rc<str>` cache.
///
/// Repeated values in a stream tend to recur back to back; a small
/// direct-mapped cache catches those without the cost of a growing map.
/// A slot collision simply replaces the previous occupant.
pub struct StringInterner {
    slots: [Option<Rc<str>>; INTERNER_SLOTS],
    hasher: ahash::RandomState,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            hasher: ahash::RandomState::new(),
        }
    }

    /// Returns a shared `Rc<str>` for `value`, reusing the cached allocation
    /// when the slot holds the same string.
    pub fn intern(&mut self, value: &str) -> Rc<str> {
        let slot = (self.hasher.hash_one(value) as usize) % INTERNER_SLOTS;
        match &self.slots[slot] {
            Some(rc) if &**rc == value => Rc::clone(rc),
            _ => {
                let rc: Rc<str> = value.into();
                self.slots[slot] = Some(Rc::clone(&rc));
                rc
            }
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
