//! The per-channel collection of offered formats and payloads.
//!
//! A [`TransferStore`] holds what one channel currently offers: at most
//! one native entry per payload class, expanded on demand into the wire
//! formats the registry lists for each kind. Stores come in two flavors:
//! local (filled by `store()`, payloads resolved) and external (wrapping
//! a peer's selection, entries learned from its advertised format list
//! and resolved lazily).

use std::collections::HashMap;

use tracing::debug;

use crate::error::{FetchError, StoreError};
use crate::formats::{should_include, FormatTable};
use crate::kind::{TransferClass, TransferKind};
use crate::system::PeerId;

/// The data behind a format entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Resolved bytes owned by this process
    Bytes(Vec<u8>),
    /// Known to exist on the owning peer but not yet fetched
    External,
}

/// One offered format: a wire format id, the kind it carries, and its
/// payload (or lack of one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// Wire format identifier
    pub format_id: String,
    /// Kind the format carries
    pub kind: TransferKind,
    /// Resolved bytes or a pending external marker
    pub payload: Payload,
    /// Registry priority of this format
    pub priority: u32,
}

/// The set of entries currently offered on one logical channel.
#[derive(Debug, Clone, Default)]
pub struct TransferStore {
    entries: Vec<FormatEntry>,
    /// True when this store wraps a peer's selection
    data_is_external: bool,
    /// Peer owning the data, when external
    peer: Option<PeerId>,
    /// Deduplicated, shadowed kind list; computed once per generation
    query_cache: Option<Vec<TransferKind>>,
    /// Wire-conversion results, keyed by format id
    conversion_cache: HashMap<String, Vec<u8>>,
}

impl TransferStore {
    /// Create an empty local store.
    pub fn new_local() -> Self {
        Self::default()
    }

    /// Create an empty store wrapping a peer's selection.
    ///
    /// Entries are added only via [`note_external_format`](Self::note_external_format),
    /// never by local `store()` calls.
    pub fn new_external(peer: Option<PeerId>) -> Self {
        Self {
            data_is_external: true,
            peer,
            ..Self::default()
        }
    }

    /// True when this store wraps a peer's selection.
    pub fn is_external(&self) -> bool {
        self.data_is_external
    }

    /// The peer owning the data, when external.
    pub fn peer(&self) -> Option<PeerId> {
        self.peer
    }

    /// True when no formats are offered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a payload, replacing any existing entry of the same class.
    ///
    /// Derived kinds are normalized to styled text through the registry's
    /// codec where possible. The payload is held natively; wire formats
    /// are converted lazily on first fetch.
    pub fn store(&mut self, kind: TransferKind, data: Vec<u8>, table: &FormatTable) -> Result<(), StoreError> {
        if self.data_is_external {
            return Err(StoreError::ExternalStore);
        }

        if data.len() > table.max_size() {
            return Err(StoreError::DataSizeExceeded {
                actual: data.len(),
                max: table.max_size(),
            });
        }

        let (kind, data) = table.normalize(kind, data);

        let rows = table.lookup_by_kind(kind);
        let native = rows.first().ok_or(StoreError::Unrepresentable(kind))?;

        self.replace_class(kind.class());
        self.entries.push(FormatEntry {
            format_id: native.format_id.to_string(),
            kind,
            payload: Payload::Bytes(data),
            priority: native.priority,
        });

        debug!(kind = %kind, entries = self.entries.len(), "stored payload");
        Ok(())
    }

    /// Record a format advertised by the owning peer.
    ///
    /// Unknown formats are skipped with a debug log; a peer may offer
    /// encodings this engine has no use for.
    pub fn note_external_format(&mut self, format_id: &str, table: &FormatTable) {
        debug_assert!(self.data_is_external, "advertised formats belong to external stores");

        if self.entries.iter().any(|e| e.format_id == format_id) {
            return;
        }

        match table.lookup_by_format(format_id) {
            Some((kind, priority)) => {
                self.invalidate();
                self.entries.push(FormatEntry {
                    format_id: format_id.to_string(),
                    kind,
                    payload: Payload::External,
                    priority,
                });
            }
            None => debug!(format_id, "skipping unknown advertised format"),
        }
    }

    /// The deduplicated, priority-shadowed list of kinds on offer.
    ///
    /// Computed once and cached until the store changes. Richer text
    /// encodings shadow poorer ones per the registry's rule.
    pub fn query(&mut self, table: &FormatTable) -> Vec<TransferKind> {
        if let Some(cached) = &self.query_cache {
            return cached.clone();
        }

        let mut candidates: Vec<(TransferKind, u32)> = Vec::new();
        for entry in &self.entries {
            if !candidates.iter().any(|(k, _)| *k == entry.kind) {
                candidates.push((entry.kind, entry.priority));
            }
        }
        // Visit richer representations first so shadowing sees them
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut kinds: Vec<TransferKind> = Vec::new();
        for (kind, _) in candidates {
            if should_include(&kinds, kind) {
                kinds.push(kind);
            }
        }

        let _ = table; // reserved: external stores may refresh through the table later
        self.query_cache = Some(kinds.clone());
        kinds
    }

    /// True if a kind of the given class is present.
    pub fn has_class(&self, class: TransferClass) -> bool {
        self.entries.iter().any(|e| e.kind.class() == class)
    }

    /// The wire formats this store can advertise, highest priority first.
    ///
    /// Local stores expand stored kinds through the registry; external
    /// stores return the peer's advertised list. Local-only formats are
    /// never included.
    pub fn advertised_formats(&self, table: &FormatTable) -> Vec<String> {
        if self.data_is_external {
            return self.entries.iter().map(|e| e.format_id.clone()).collect();
        }

        let mut out: Vec<String> = Vec::new();
        let mut native: Vec<&FormatEntry> = self.entries.iter().collect();
        native.sort_by(|a, b| b.priority.cmp(&a.priority));
        for entry in native {
            for format_id in table.wire_formats(entry.kind) {
                if !out.iter().any(|f| f == format_id) {
                    out.push(format_id.to_string());
                }
            }
        }
        out
    }

    /// Fetch bytes in the requested wire format.
    ///
    /// The result is always the wire encoding: even an entry stored
    /// under the requested format id runs through the registry, since
    /// the native representation is not always the wire one (UTF-16LE
    /// behind `UTF8_STRING`, bare paths behind `text/uri-list`). The
    /// identity arms of the converter keep the cheap cases cheap, and
    /// the first conversion result is cached so repeated fetches are
    /// O(1). Entries still pending on a peer yield
    /// [`FetchError::NotPresent`]; resolving them is the proxy's
    /// business, not the store's.
    pub fn fetch(&mut self, format_id: &str, table: &FormatTable) -> Result<Vec<u8>, FetchError> {
        if let Some(cached) = self.conversion_cache.get(format_id) {
            return Ok(cached.clone());
        }

        if let Some(entry) = self.entries.iter().find(|e| e.format_id == format_id) {
            if let Payload::Bytes(data) = &entry.payload {
                let wire = table.convert_to_wire(entry.kind, format_id, data)?;
                self.conversion_cache.insert(format_id.to_string(), wire.clone());
                return Ok(wire);
            }
        }

        let (target_kind, _) = table
            .lookup_by_format(format_id)
            .ok_or_else(|| FetchError::NotPresent(format_id.to_string()))?;

        // Convert from the native entry of the same class.
        let source = self
            .entries
            .iter()
            .find(|e| e.kind.class() == target_kind.class())
            .ok_or_else(|| FetchError::NotPresent(format_id.to_string()))?;

        let native = match &source.payload {
            Payload::Bytes(data) => data,
            Payload::External => return Err(FetchError::NotPresent(format_id.to_string())),
        };

        let converted = table.convert_to_wire(source.kind, format_id, native)?;
        self.conversion_cache.insert(format_id.to_string(), converted.clone());
        Ok(converted)
    }

    /// Fetch the native payload for a kind without any conversion.
    ///
    /// This is the same-process read path: bytes come back exactly as
    /// stored, a behavioral contract, not an optimization.
    pub fn fetch_native(&self, kind: TransferKind) -> Result<Vec<u8>, FetchError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.kind.class() == kind.class())
            .ok_or_else(|| FetchError::NotPresent(kind.as_str().to_string()))?;

        match &entry.payload {
            Payload::Bytes(data) => Ok(data.clone()),
            Payload::External => Err(FetchError::NotPresent(kind.as_str().to_string())),
        }
    }

    /// Resolve an external entry with bytes fetched from the peer.
    ///
    /// An entry is created if the format was never advertised, so
    /// fetched bytes always land in the store and repeat fetches stay
    /// local.
    pub fn resolve(&mut self, format_id: &str, kind: TransferKind, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.format_id == format_id) {
            Some(entry) => {
                entry.kind = kind;
                entry.payload = Payload::Bytes(data);
            }
            None => {
                // A fetch can outrun the advertisement (or skip it
                // entirely on the drag path); the bytes are already
                // classified, so record a fresh entry.
                let priority = crate::formats::FORMAT_TABLE
                    .iter()
                    .find(|m| m.format_id == format_id)
                    .map_or(0, |m| m.priority);
                self.invalidate();
                self.entries.push(FormatEntry {
                    format_id: format_id.to_string(),
                    kind,
                    payload: Payload::Bytes(data),
                    priority,
                });
            }
        }
    }

    /// The resolved native bytes recorded for a format, if any.
    ///
    /// Unlike [`fetch`](Self::fetch) this performs no wire conversion:
    /// it answers "did an earlier resolve land bytes for this format"
    /// with exactly what was landed.
    pub(crate) fn resolved(&self, format_id: &str) -> Option<Vec<u8>> {
        self.entries
            .iter()
            .find(|e| e.format_id == format_id)
            .and_then(|e| match &e.payload {
                Payload::Bytes(data) => Some(data.clone()),
                Payload::External => None,
            })
    }

    /// Iterate over resolved native payloads (for snapshot hashing).
    pub(crate) fn resolved_payloads(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().filter_map(|e| match &e.payload {
            Payload::Bytes(data) => Some((e.format_id.as_str(), data.as_slice())),
            Payload::External => None,
        })
    }

    /// Drop all entries. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.invalidate();
    }

    fn replace_class(&mut self, class: TransferClass) {
        self.invalidate();
        self.entries.retain(|e| e.kind.class() != class);
    }

    fn invalidate(&mut self) {
        self.query_cache = None;
        self.conversion_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::TagCodec;
    use crate::formats::{FORMAT_PLAIN, FORMAT_PNG, FORMAT_RTF, FORMAT_STRING, FORMAT_STYLED, FORMAT_UTF8};
    use std::sync::Arc;

    fn table() -> FormatTable {
        FormatTable::new(Arc::new(TagCodec))
    }

    #[test]
    fn test_store_replaces_same_class() {
        let t = table();
        let mut store = TransferStore::new_local();

        store.store(TransferKind::Text, b"hello".to_vec(), &t).unwrap();
        assert_eq!(store.query(&t), vec![TransferKind::Text]);

        // Styled text replaces the text-class entry
        store.store(TransferKind::StyledText, b"pickle".to_vec(), &t).unwrap();
        assert_eq!(store.query(&t), vec![TransferKind::StyledText]);

        // A different class coexists
        store.store(TransferKind::Image, vec![0x89, 0x50], &t).unwrap();
        let kinds = store.query(&t);
        assert!(kinds.contains(&TransferKind::StyledText));
        assert!(kinds.contains(&TransferKind::Image));
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn test_store_normalizes_derived_kinds() {
        let t = table();
        let mut store = TransferStore::new_local();

        store.store(TransferKind::RtfText, b"RTF:inner".to_vec(), &t).unwrap();
        assert_eq!(store.query(&t), vec![TransferKind::StyledText]);
        assert_eq!(store.fetch(FORMAT_STYLED, &t).unwrap(), b"inner");
    }

    #[test]
    fn test_store_size_limit() {
        let t = FormatTable::with_max_size(Arc::new(TagCodec), 8);
        let mut store = TransferStore::new_local();

        let err = store.store(TransferKind::Text, vec![0u8; 9], &t).unwrap_err();
        assert!(matches!(err, StoreError::DataSizeExceeded { actual: 9, max: 8 }));
    }

    #[test]
    fn test_external_store_rejects_local_store() {
        let t = table();
        let mut store = TransferStore::new_external(Some(PeerId(7)));

        let err = store.store(TransferKind::Text, b"x".to_vec(), &t).unwrap_err();
        assert!(matches!(err, StoreError::ExternalStore));
    }

    #[test]
    fn test_fetch_converts_and_caches() {
        let t = table();
        let mut store = TransferStore::new_local();
        store.store(TransferKind::StyledText, b"pickle".to_vec(), &t).unwrap();

        // Native format comes back byte-identical
        assert_eq!(store.fetch(FORMAT_STYLED, &t).unwrap(), b"pickle");

        // Derived format converts through the codec
        assert_eq!(store.fetch(FORMAT_RTF, &t).unwrap(), b"RTF:pickle");

        // Second fetch hits the cache (same result either way; this
        // checks the cache is populated)
        assert!(store.conversion_cache.contains_key(FORMAT_RTF));
        assert_eq!(store.fetch(FORMAT_RTF, &t).unwrap(), b"RTF:pickle");
    }

    #[test]
    fn test_fetch_encodes_wire_format_for_native_entry() {
        let t = table();
        let mut store = TransferStore::new_local();

        // Unicode text is held as UTF-16LE but UTF8_STRING is UTF-8
        store
            .store(TransferKind::UnicodeText, vec![b'h', 0x00, b'i', 0x00], &t)
            .unwrap();
        assert_eq!(store.fetch(FORMAT_UTF8, &t).unwrap(), b"hi");

        // File lists are held as bare paths but the wire form is URIs
        store.store(TransferKind::Files, b"/tmp/f".to_vec(), &t).unwrap();
        assert_eq!(
            store.fetch(crate::formats::FORMAT_URI_LIST, &t).unwrap(),
            b"file:///tmp/f"
        );
    }

    #[test]
    fn test_fetch_unknown_format() {
        let t = table();
        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"hi".to_vec(), &t).unwrap();

        let err = store.fetch(FORMAT_PNG, &t).unwrap_err();
        assert!(matches!(err, FetchError::NotPresent(_)));
    }

    #[test]
    fn test_query_shadowing_on_external_store() {
        let t = table();
        let mut store = TransferStore::new_external(Some(PeerId(3)));

        // Peer advertises styled, unicode and plain text variants
        store.note_external_format(FORMAT_STYLED, &t);
        store.note_external_format(FORMAT_UTF8, &t);
        store.note_external_format(FORMAT_STRING, &t);
        store.note_external_format(FORMAT_PLAIN, &t);

        // Styled shadows both plain kinds
        assert_eq!(store.query(&t), vec![TransferKind::StyledText]);
    }

    #[test]
    fn test_external_resolve() {
        let t = table();
        let mut store = TransferStore::new_external(Some(PeerId(3)));
        store.note_external_format(FORMAT_PNG, &t);

        assert!(matches!(store.fetch(FORMAT_PNG, &t), Err(FetchError::NotPresent(_))));

        store.resolve(FORMAT_PNG, TransferKind::Image, vec![1, 2, 3]);
        assert_eq!(store.fetch(FORMAT_PNG, &t).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_advertised_formats_exclude_private() {
        let t = table();
        let mut store = TransferStore::new_local();
        store.store(TransferKind::Private, b"secret".to_vec(), &t).unwrap();
        store.store(TransferKind::Text, b"hello".to_vec(), &t).unwrap();

        let formats = store.advertised_formats(&t);
        assert!(formats.iter().any(|f| f == FORMAT_STRING));
        assert!(!formats.iter().any(|f| f.contains("private")));
    }

    #[test]
    fn test_clear_idempotent() {
        let t = table();
        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"x".to_vec(), &t).unwrap();

        store.clear();
        assert!(store.is_empty());
        store.clear();
        assert!(store.is_empty());
    }
}
