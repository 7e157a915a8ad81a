//! Per-channel ownership tracking.
//!
//! Each logical channel (clipboard, selection, drag) is an independent
//! ownership slot. Publishing claims the slot from the window system and
//! snapshots the caller's store, so the bytes handed to later requesters
//! stay stable whatever the caller does to its working copy afterwards.
//! External state can change without notice; an ownership-lost event
//! drops the snapshot and the channel must be re-pulled before reading.

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{FetchError, PublishError};
use crate::formats::FormatTable;
use crate::store::TransferStore;
use crate::system::{ChannelId, CorrelationKey, PeerId, WindowSystem};

/// The ownership state of one channel.
#[derive(Debug, Clone)]
pub enum ChannelState {
    /// Nobody we know of owns the channel
    Idle,

    /// This process owns the channel
    LocallyOwned {
        /// True until the snapshot has been flushed to a persistence
        /// service (where one exists)
        dirty: bool,
        /// The stable copy requests are answered from
        snapshot: TransferStore,
        /// SHA-256 over the snapshot's resolved payloads
        content_hash: [u8; 32],
    },

    /// Another process owns the channel
    ExternallyOwned {
        /// Peer-backed view; formats filled in by `query_external`
        store: TransferStore,
    },
}

/// A read-only view of a channel's contents.
#[derive(Debug)]
pub enum ReadView<'a> {
    /// Nothing known to be on the channel
    Empty,
    /// Our own snapshot; reads bypass the window system entirely
    Local(&'a TransferStore),
    /// A peer's selection; reads go through the proxy
    External(&'a TransferStore),
}

/// One logical ownership slot.
#[derive(Debug)]
pub struct OwnershipChannel {
    id: ChannelId,
    state: ChannelState,
}

impl OwnershipChannel {
    /// Create an idle channel.
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            state: ChannelState::Idle,
        }
    }

    /// This channel's id.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Current state (for inspection; mutate through the methods).
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// True while this process owns the channel.
    pub fn is_owned(&self) -> bool {
        matches!(self.state, ChannelState::LocallyOwned { .. })
    }

    /// True while the snapshot has not been flushed.
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, ChannelState::LocallyOwned { dirty: true, .. })
    }

    /// Claim ownership and snapshot `store` as this channel's contents.
    ///
    /// No bytes move here; peers pull them lazily via data requests. If
    /// the window system refuses the claim, the channel keeps its
    /// previous state and `OwnershipDenied` is returned.
    pub fn publish(&mut self, store: &TransferStore, ws: &mut dyn WindowSystem) -> Result<(), PublishError> {
        if store.is_external() {
            return Err(PublishError::NotLocal);
        }

        if !ws.claim_ownership(self.id) {
            warn!(channel = %self.id, "window system denied ownership claim");
            return Err(PublishError::OwnershipDenied(self.id));
        }

        let snapshot = store.clone();
        let content_hash = hash_store(&snapshot);

        if let ChannelState::LocallyOwned { content_hash: old, .. } = &self.state {
            if *old == content_hash {
                debug!(channel = %self.id, "re-publish with unchanged content");
            }
        }

        info!(channel = %self.id, "published local data");
        self.state = ChannelState::LocallyOwned {
            dirty: true,
            snapshot,
            content_hash,
        };
        Ok(())
    }

    /// Push the snapshot to the system's persistence service, if any.
    ///
    /// Best-effort durability for callers about to exit; a system
    /// without a persistence service reports `Unsupported` rather than
    /// failing silently. A no-op unless locally owned and dirty.
    pub fn flush(&mut self, ws: &mut dyn WindowSystem) -> Result<(), PublishError> {
        match &mut self.state {
            ChannelState::LocallyOwned { dirty, .. } => {
                if !*dirty {
                    return Ok(());
                }
                if ws.persist_channel(self.id) {
                    *dirty = false;
                    Ok(())
                } else {
                    Err(PublishError::Unsupported)
                }
            }
            _ => {
                debug!(channel = %self.id, "flush on a channel we do not own");
                Ok(())
            }
        }
    }

    /// Handle an asynchronous ownership-lost notification.
    ///
    /// The snapshot is dropped; anything tied to this channel (drag
    /// session, selection highlight) must be told to clear by the
    /// caller. Reading again requires a fresh [`pull`](Self::pull).
    pub fn ownership_lost(&mut self) {
        if self.is_owned() {
            info!(channel = %self.id, "ownership lost to another process");
        }
        self.state = ChannelState::ExternallyOwned {
            store: TransferStore::new_external(None),
        };
    }

    /// Begin treating the channel as externally owned by `peer`.
    ///
    /// The external store starts with an empty format list; the proxy's
    /// `query_external` populates it.
    pub fn pull(&mut self, peer: Option<PeerId>) -> &mut TransferStore {
        debug!(channel = %self.id, ?peer, "pulling external contents");
        self.state = ChannelState::ExternallyOwned {
            store: TransferStore::new_external(peer),
        };
        match &mut self.state {
            ChannelState::ExternallyOwned { store } => store,
            _ => unreachable!(),
        }
    }

    /// Read access to the channel's contents.
    ///
    /// When locally owned this returns the snapshot with no system
    /// round-trip: the internal-copy fast path. Same-process reads must
    /// come back byte-identical, so no converter runs on this path.
    pub fn get_for_read(&self) -> ReadView<'_> {
        match &self.state {
            ChannelState::Idle => ReadView::Empty,
            ChannelState::LocallyOwned { snapshot, .. } => ReadView::Local(snapshot),
            ChannelState::ExternallyOwned { store } => ReadView::External(store),
        }
    }

    /// Mutable access to the external store, if externally owned.
    pub fn external_store_mut(&mut self) -> Option<&mut TransferStore> {
        match &mut self.state {
            ChannelState::ExternallyOwned { store } => Some(store),
            _ => None,
        }
    }

    /// The snapshot, if locally owned.
    pub fn snapshot_mut(&mut self) -> Option<&mut TransferStore> {
        match &mut self.state {
            ChannelState::LocallyOwned { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Answer a peer's inbound data request from the snapshot.
    ///
    /// Conversion failure is recoverable: the peer gets an empty buffer
    /// (format treated as absent) and the error is surfaced for logging.
    pub fn answer_request(
        &mut self,
        peer: PeerId,
        key: CorrelationKey,
        format_id: &str,
        table: &FormatTable,
        ws: &mut dyn WindowSystem,
    ) -> Result<(), FetchError> {
        let snapshot = match &mut self.state {
            ChannelState::LocallyOwned { snapshot, .. } => snapshot,
            _ => {
                warn!(channel = %self.id, %peer, "data request for a channel we do not own");
                ws.set_exchange_buffer(peer, key, Vec::new());
                return Err(FetchError::NotPresent(format_id.to_string()));
            }
        };

        match snapshot.fetch(format_id, table) {
            Ok(data) => {
                debug!(channel = %self.id, %peer, format_id, bytes = data.len(), "answered data request");
                ws.set_exchange_buffer(peer, key, data);
                Ok(())
            }
            Err(err) => {
                warn!(channel = %self.id, %peer, format_id, %err, "cannot satisfy data request");
                ws.set_exchange_buffer(peer, key, Vec::new());
                Err(err)
            }
        }
    }

    /// Release ownership and return to idle. Clears any snapshot.
    pub fn release(&mut self, ws: &mut dyn WindowSystem) {
        if self.is_owned() {
            ws.release_ownership(self.id);
        }
        self.state = ChannelState::Idle;
    }
}

/// Content hash over a store's resolved payloads, order-independent of
/// insertion by hashing format ids alongside bytes.
fn hash_store(store: &TransferStore) -> [u8; 32] {
    let mut entries: Vec<(&str, &[u8])> = store.resolved_payloads().collect();
    entries.sort_by_key(|(format_id, _)| *format_id);

    let mut hasher = Sha256::new();
    for (format_id, data) in entries {
        hasher.update(format_id.as_bytes());
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
    }
    hasher.finalize().into()
}
