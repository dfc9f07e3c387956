//! String tables (Spec 7.3, Appendix D).
//!
//! Strings are assigned compact identifiers on first encounter. The URI
//! table holds one entry per namespace URI, each carrying its own ordered
//! local-name and prefix partitions. The value table holds previously seen
//! content values in a GLOBAL partition plus one LOCAL partition per QName
//! context. Position in a partition is the compact id; partitions only ever
//! append.
//!
//! Lifecycle: one table set per stream. [`UriTable::reset`] restores the
//! caller-supplied baseline between independent runs.

use std::rc::Rc;

use log::{debug, trace};

use crate::qname::QName;
use crate::{FastHashMap, FastIndexMap};

/// Well-known URIs (Appendix D, Table D-1).
const URI_XML: &str = "http://www.w3.org/XML/1998/namespace";
/// XSI namespace URI, used by the default URI table entries.
pub const URI_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// One namespace URI with its local-name and prefix partitions.
#[derive(Clone)]
struct UriEntry {
    uri: Rc<str>,
    /// Einfügereihenfolge = Compact IDs.
    local_names: FastIndexMap<Rc<str>, ()>,
    prefixes: Vec<Rc<str>>,
}

impl UriEntry {
    fn new(uri: Rc<str>) -> Self {
        Self {
            uri,
            local_names: FastIndexMap::default(),
            prefixes: Vec::new(),
        }
    }
}

/// URI table with per-URI local-name and prefix partitions (Spec 7.3.1).
#[derive(Clone)]
pub struct UriTable {
    entries: Vec<UriEntry>,
    baseline: Vec<UriEntry>,
}

impl UriTable {
    /// Empty table with an empty baseline.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            baseline: Vec::new(),
        }
    }

    /// Table pre-populated per Appendix D: the empty URI, the XML namespace
    /// (local names base, id, lang, space) and the XSI namespace (nil,
    /// type), each with its reserved prefix. The pre-population is the
    /// initial baseline.
    pub fn with_default_entries() -> Self {
        let mut table = Self::new();
        let empty = table.add_uri("");
        table.add_prefix(empty, "");
        let xml = table.add_uri(URI_XML);
        table.add_prefix(xml, "xml");
        for name in ["base", "id", "lang", "space"] {
            table.add_local_name(xml, name);
        }
        let xsi = table.add_uri(URI_XSI);
        table.add_prefix(xsi, "xsi");
        for name in ["nil", "type"] {
            table.add_local_name(xsi, name);
        }
        table.snapshot_baseline();
        table
    }

    /// Captures the current contents as the baseline [`reset`](Self::reset)
    /// restores.
    pub fn snapshot_baseline(&mut self) {
        self.baseline = self.entries.clone();
    }

    /// Restores the baseline, discarding everything appended since.
    pub fn reset(&mut self) {
        debug!(
            "uri table reset: {} entries back to baseline of {}",
            self.entries.len(),
            self.baseline.len()
        );
        self.entries = self.baseline.clone();
    }

    #[inline]
    pub fn uri_count(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup_uri(&self, uri: &str) -> Option<usize> {
        self.entries.iter().position(|e| &*e.uri == uri)
    }

    /// Appends a URI, returning its compact id. Not idempotent by itself;
    /// callers look up first.
    pub fn add_uri(&mut self, uri: &str) -> usize {
        let id = self.entries.len();
        trace!("uri table add: {uri:?} -> {id}");
        self.entries.push(UriEntry::new(uri.into()));
        id
    }

    pub fn uri(&self, id: usize) -> Option<Rc<str>> {
        self.entries.get(id).map(|e| Rc::clone(&e.uri))
    }

    pub fn local_name_count(&self, uri_id: usize) -> usize {
        self.entries.get(uri_id).map_or(0, |e| e.local_names.len())
    }

    pub fn lookup_local_name(&self, uri_id: usize, local_name: &str) -> Option<usize> {
        self.entries.get(uri_id)?.local_names.get_index_of(local_name)
    }

    pub fn add_local_name(&mut self, uri_id: usize, local_name: &str) -> usize {
        let entry = &mut self.entries[uri_id];
        let (id, _) = entry.local_names.insert_full(local_name.into(), ());
        id
    }

    pub fn local_name(&self, uri_id: usize, id: usize) -> Option<Rc<str>> {
        let (name, ()) = self.entries.get(uri_id)?.local_names.get_index(id)?;
        Some(Rc::clone(name))
    }

    pub fn prefix_count(&self, uri_id: usize) -> usize {
        self.entries.get(uri_id).map_or(0, |e| e.prefixes.len())
    }

    pub fn lookup_prefix(&self, uri_id: usize, prefix: &str) -> Option<usize> {
        self.entries
            .get(uri_id)?
            .prefixes
            .iter()
            .position(|p| &**p == prefix)
    }

    pub fn add_prefix(&mut self, uri_id: usize, prefix: &str) -> usize {
        let prefixes = &mut self.entries[uri_id].prefixes;
        let id = prefixes.len();
        prefixes.push(prefix.into());
        id
    }

    pub fn prefix(&self, uri_id: usize, id: usize) -> Option<Rc<str>> {
        self.entries.get(uri_id)?.prefixes.get(id).cloned()
    }
}

impl Default for UriTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a value table lookup (Spec 7.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHit {
    /// Found in the LOCAL partition of the query's QName context.
    Local(usize),
    /// Found in the GLOBAL partition only.
    Global(usize),
    /// Not found; the value travels as a literal.
    Miss,
}

#[derive(Clone)]
struct ValueInfo {
    /// Kontext des ersten Einfügens, entscheidet Local- vs. Global-Hit.
    context: QName,
    global_id: usize,
    local_id: usize,
}

/// Value string table with GLOBAL and per-QName LOCAL partitions
/// (Spec 7.3.3).
///
/// A value is inserted into both partitions after a miss. When the global
/// partition has reached `capacity`, or the value exceeds
/// `value_max_length` characters, or the value is empty, the insertion is
/// skipped entirely and the value keeps travelling as a literal.
pub struct ValueTable {
    /// Ein zentraler Lookup für beide Partitionen, ein Hash pro Wert.
    lookup: FastHashMap<Rc<str>, ValueInfo>,
    global: Vec<Rc<str>>,
    locals: FastHashMap<QName, Vec<Rc<str>>>,
    value_max_length: Option<usize>,
    capacity: Option<usize>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::with_options(None, None)
    }

    /// `value_max_length` limits insertable values by character count;
    /// `capacity` bounds the global partition. `None` means unbounded.
    pub fn with_options(value_max_length: Option<usize>, capacity: Option<usize>) -> Self {
        Self {
            lookup: FastHashMap::with_capacity_and_hasher(1024, Default::default()),
            global: Vec::new(),
            locals: FastHashMap::default(),
            value_max_length,
            capacity,
        }
    }

    /// Looks a value up; LOCAL beats GLOBAL when the context matches the
    /// first insertion's context.
    pub fn lookup(&self, qname: &QName, value: &str) -> ValueHit {
        match self.lookup.get(value) {
            Some(info) if &info.context == qname => ValueHit::Local(info.local_id),
            Some(info) => ValueHit::Global(info.global_id),
            None => ValueHit::Miss,
        }
    }

    /// Whether the insertion policy admits this value.
    fn should_skip(&self, value: &str) -> bool {
        value.is_empty()
            || self.value_max_length.is_some_and(|max| {
                // byte_len <= max impliziert char_count <= max
                value.len() > max && value.chars().count() > max
            })
            || self.capacity.is_some_and(|cap| self.global.len() >= cap)
    }

    /// Records a value after a miss, appending it to the LOCAL partition of
    /// `qname` and to the GLOBAL partition. Skipped values leave the table
    /// unchanged. Idempotent for values already present.
    pub fn insert(&mut self, qname: &QName, value: Rc<str>) {
        if self.lookup.contains_key(&*value) {
            return;
        }
        if self.should_skip(&value) {
            trace!("value table skip: {:?} ({} chars)", &*value, value.chars().count());
            return;
        }
        let local = self.locals.entry(qname.clone()).or_default();
        let local_id = local.len();
        local.push(Rc::clone(&value));
        let global_id = self.global.len();
        self.global.push(Rc::clone(&value));
        self.lookup.insert(
            value,
            ValueInfo {
                context: qname.clone(),
                global_id,
                local_id,
            },
        );
    }

    pub fn local_value(&self, qname: &QName, id: usize) -> Option<Rc<str>> {
        self.locals.get(qname)?.get(id).cloned()
    }

    pub fn global_value(&self, id: usize) -> Option<Rc<str>> {
        self.global.get(id).cloned()
    }

    /// LOCAL partition size for the bit width of local compact ids.
    pub fn local_size(&self, qname: &QName) -> usize {
        self.locals.get(qname).map_or(0, Vec::len)
    }

    /// GLOBAL partition size for the bit width of global compact ids.
    pub fn global_size(&self) -> usize {
        self.global.len()
    }

    /// Drops all recorded values; the option bounds stay.
    pub fn reset(&mut self) {
        debug!("value table reset: {} global entries dropped", self.global.len());
        self.lookup.clear();
        self.global.clear();
        self.locals.clear();
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(local: &str) -> QName {
        QName::new("http://example.org", local)
    }

    // === UriTable ===

    /// Appendix D: default pre-population
    #[test]
    fn default_entries() {
        let t = UriTable::with_default_entries();
        assert_eq!(t.uri_count(), 3);
        assert_eq!(t.lookup_uri(""), Some(0));
        assert_eq!(t.lookup_uri(URI_XML), Some(1));
        assert_eq!(t.lookup_uri(URI_XSI), Some(2));
        assert_eq!(t.prefix(0, 0).as_deref(), Some(""));
        assert_eq!(t.prefix(1, 0).as_deref(), Some("xml"));
        assert_eq!(t.prefix(2, 0).as_deref(), Some("xsi"));
        assert_eq!(t.local_name_count(1), 4);
        assert_eq!(t.lookup_local_name(1, "lang"), Some(2));
        assert_eq!(t.local_name_count(2), 2);
        assert_eq!(t.lookup_local_name(2, "type"), Some(1));
    }

    /// Spec 7.3.1: ids are positions, appended in order
    #[test]
    fn sequential_compact_ids() {
        let mut t = UriTable::new();
        assert_eq!(t.add_uri("http://a"), 0);
        assert_eq!(t.add_uri("http://b"), 1);
        assert_eq!(t.add_local_name(0, "x"), 0);
        assert_eq!(t.add_local_name(0, "y"), 1);
        assert_eq!(t.add_local_name(1, "x"), 0); // eigene Partition pro URI
        assert_eq!(t.local_name(0, 1).as_deref(), Some("y"));
        assert_eq!(t.add_prefix(0, "a"), 0);
        assert_eq!(t.add_prefix(0, "b"), 1);
    }

    /// Reset stellt die Baseline wieder her, auch angehängte Local-Names
    #[test]
    fn reset_restores_baseline() {
        let mut t = UriTable::with_default_entries();
        let id = t.add_uri("http://example.org");
        t.add_local_name(id, "item");
        t.add_local_name(1, "extra"); // an Baseline-Entry angehängt
        assert_eq!(t.uri_count(), 4);
        assert_eq!(t.local_name_count(1), 5);

        t.reset();
        assert_eq!(t.uri_count(), 3);
        assert_eq!(t.local_name_count(1), 4);
        assert_eq!(t.lookup_uri("http://example.org"), None);
    }

    #[test]
    fn snapshot_moves_baseline() {
        let mut t = UriTable::new();
        t.add_uri("http://a");
        t.snapshot_baseline();
        t.add_uri("http://b");
        t.reset();
        assert_eq!(t.uri_count(), 1);
        assert_eq!(t.lookup_uri("http://a"), Some(0));
    }

    #[test]
    fn out_of_range_ids_are_none() {
        let t = UriTable::with_default_entries();
        assert!(t.uri(99).is_none());
        assert!(t.local_name(1, 99).is_none());
        assert!(t.prefix(0, 99).is_none());
        assert_eq!(t.local_name_count(99), 0);
    }

    // === ValueTable ===

    /// Spec 7.3.3: first sight misses, second sight hits locally
    #[test]
    fn miss_then_local_hit() {
        let mut t = ValueTable::new();
        let q = qn("animal");
        assert_eq!(t.lookup(&q, "cat"), ValueHit::Miss);
        t.insert(&q, "cat".into());
        assert_eq!(t.lookup(&q, "cat"), ValueHit::Local(0));
        assert_eq!(t.local_size(&q), 1);
        assert_eq!(t.global_size(), 1);
    }

    /// Spec 7.3.3: a different context sees the GLOBAL partition
    #[test]
    fn global_hit_from_other_context() {
        let mut t = ValueTable::new();
        t.insert(&qn("animal"), "cat".into());
        assert_eq!(t.lookup(&qn("pet"), "cat"), ValueHit::Global(0));
        assert_eq!(t.local_size(&qn("pet")), 0);
    }

    /// Local- und Global-IDs laufen unabhängig
    #[test]
    fn independent_id_sequences() {
        let mut t = ValueTable::new();
        t.insert(&qn("a"), "one".into());
        t.insert(&qn("b"), "two".into());
        t.insert(&qn("a"), "three".into());
        assert_eq!(t.lookup(&qn("a"), "three"), ValueHit::Local(1));
        assert_eq!(t.lookup(&qn("b"), "two"), ValueHit::Local(0));
        assert_eq!(t.lookup(&qn("c"), "three"), ValueHit::Global(2));
        assert_eq!(t.global_value(2).as_deref(), Some("three"));
        assert_eq!(t.local_value(&qn("a"), 1).as_deref(), Some("three"));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut t = ValueTable::new();
        t.insert(&qn("a"), "dup".into());
        t.insert(&qn("a"), "dup".into());
        t.insert(&qn("b"), "dup".into()); // bereits global bekannt
        assert_eq!(t.global_size(), 1);
        assert_eq!(t.local_size(&qn("a")), 1);
        assert_eq!(t.local_size(&qn("b")), 0);
    }

    /// Leere Strings werden nie aufgenommen
    #[test]
    fn empty_string_skipped() {
        let mut t = ValueTable::new();
        t.insert(&qn("a"), "".into());
        assert_eq!(t.global_size(), 0);
        assert_eq!(t.lookup(&qn("a"), ""), ValueHit::Miss);
    }

    /// valueMaxLength: Zeichenzahl, nicht Bytezahl
    #[test]
    fn max_length_skips_long_values() {
        let mut t = ValueTable::with_options(Some(3), None);
        t.insert(&qn("a"), "abcd".into());
        assert_eq!(t.global_size(), 0);
        t.insert(&qn("a"), "abc".into());
        assert_eq!(t.global_size(), 1);
        // 4 Bytes, aber nur 2 Zeichen
        t.insert(&qn("a"), "éé".into());
        assert_eq!(t.global_size(), 2);
    }

    /// Volle Partition: neue Werte werden übersprungen, nichts wird verdrängt
    #[test]
    fn capacity_skips_instead_of_evicting() {
        let mut t = ValueTable::with_options(None, Some(2));
        let q = qn("a");
        t.insert(&q, "one".into());
        t.insert(&q, "two".into());
        t.insert(&q, "three".into()); // voll → übersprungen
        assert_eq!(t.global_size(), 2);
        assert_eq!(t.lookup(&q, "one"), ValueHit::Local(0));
        assert_eq!(t.lookup(&q, "two"), ValueHit::Local(1));
        assert_eq!(t.lookup(&q, "three"), ValueHit::Miss);
    }

    #[test]
    fn capacity_zero_skips_everything() {
        let mut t = ValueTable::with_options(None, Some(0));
        t.insert(&qn("a"), "x".into());
        assert_eq!(t.global_size(), 0);
    }

    #[test]
    fn reset_clears_values() {
        let mut t = ValueTable::with_options(None, Some(8));
        t.insert(&qn("a"), "x".into());
        t.reset();
        assert_eq!(t.global_size(), 0);
        assert_eq!(t.lookup(&qn("a"), "x"), ValueHit::Miss);
        // Bounds überleben den Reset
        for i in 0..10 {
            t.insert(&qn("a"), format!("v{i}").into());
        }
        assert_eq!(t.global_size(), 8);
    }
}
