//! The engine context: one `Pasteboard` per process.
//!
//! Holds the format registry, the correlator, the three ownership
//! channels and the drag negotiator, all behind one explicit struct
//! passed by reference. There is no process-wide state; two instances
//! in one process are independent engines, which the integration tests
//! rely on to simulate two peers.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::channel::{OwnershipChannel, ReadView};
use crate::codec::StyledTextCodec;
use crate::config::EngineConfig;
use crate::correlator::RequestCorrelator;
use crate::drag::{DragAction, DragActionSet, DragNegotiator, ModifierState};
use crate::error::{DragError, FetchError, PublishError};
use crate::formats::FormatTable;
use crate::kind::{TransferClass, TransferKind};
use crate::peer::ExternalPeerProxy;
use crate::store::TransferStore;
use crate::system::{ChannelId, Event, PeerId, WindowSystem};

/// What `process_event` wants the caller to act on.
#[derive(Debug)]
pub enum EngineNotice {
    /// Ownership of a channel moved to another process; any selection
    /// highlight or drag tied to it should be cleared in the UI.
    SelectionCleared(ChannelId),

    /// An event the engine does not consume; dispatch it yourself.
    Unhandled(Event),
}

/// The data-transfer engine for one process.
pub struct Pasteboard {
    config: EngineConfig,
    table: FormatTable,
    correlator: RequestCorrelator,
    clipboard: OwnershipChannel,
    selection: OwnershipChannel,
    drag_channel: OwnershipChannel,
    drag: DragNegotiator,
}

impl Pasteboard {
    /// Build an engine with default configuration.
    pub fn new(codec: Arc<dyn StyledTextCodec + Send + Sync>) -> Self {
        Self::with_config(codec, EngineConfig::default())
    }

    /// Build an engine with explicit configuration.
    pub fn with_config(codec: Arc<dyn StyledTextCodec + Send + Sync>, config: EngineConfig) -> Self {
        let table = FormatTable::with_max_size(codec, config.max_data_size);
        Self {
            config,
            table,
            correlator: RequestCorrelator::new(),
            clipboard: OwnershipChannel::new(ChannelId::Clipboard),
            selection: OwnershipChannel::new(ChannelId::Selection),
            drag_channel: OwnershipChannel::new(ChannelId::Drag),
            drag: DragNegotiator::new(),
        }
    }

    /// The format registry, for building stores against.
    pub fn table(&self) -> &FormatTable {
        &self.table
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The drag negotiator, read-only.
    pub fn drag(&self) -> &DragNegotiator {
        &self.drag
    }

    /// A channel's ownership state, read-only.
    pub fn channel(&self, id: ChannelId) -> &OwnershipChannel {
        match id {
            ChannelId::Clipboard => &self.clipboard,
            ChannelId::Selection => &self.selection,
            ChannelId::Drag => &self.drag_channel,
        }
    }

    fn channel_mut(&mut self, id: ChannelId) -> &mut OwnershipChannel {
        match id {
            ChannelId::Clipboard => &mut self.clipboard,
            ChannelId::Selection => &mut self.selection,
            ChannelId::Drag => &mut self.drag_channel,
        }
    }

    // ------------------------------------------------------------------
    // Publish side
    // ------------------------------------------------------------------

    /// Claim `id` and snapshot `store` as its contents.
    pub fn publish(
        &mut self,
        id: ChannelId,
        store: &TransferStore,
        ws: &mut dyn WindowSystem,
    ) -> Result<(), PublishError> {
        self.channel_mut(id).publish(store, ws)
    }

    /// Push a channel's snapshot to the system persistence service.
    pub fn flush(&mut self, id: ChannelId, ws: &mut dyn WindowSystem) -> Result<(), PublishError> {
        self.channel_mut(id).flush(ws)
    }

    /// Release a channel this process owns.
    pub fn release(&mut self, id: ChannelId, ws: &mut dyn WindowSystem) {
        self.channel_mut(id).release(ws)
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    /// Begin reading an externally-owned channel: create the external
    /// store and enumerate the owner's formats.
    ///
    /// Returns the kinds available after the query; a silent owner
    /// yields an empty list.
    pub fn pull(&mut self, id: ChannelId, peer: PeerId, ws: &mut dyn WindowSystem) -> Vec<TransferKind> {
        let channel = match id {
            ChannelId::Clipboard => &mut self.clipboard,
            ChannelId::Selection => &mut self.selection,
            ChannelId::Drag => &mut self.drag_channel,
        };
        let store = channel.pull(Some(peer));

        let mut proxy = ExternalPeerProxy::new(id, peer, &mut self.correlator, self.config.request_timeout);
        proxy.query_external(ws, store, &self.table);
        store.query(&self.table)
    }

    /// The kinds currently readable on a channel.
    ///
    /// Listed richest-first with shadowed representations removed. An
    /// idle channel reads as empty; an external channel reflects the
    /// formats enumerated by the last [`pull`](Self::pull).
    pub fn query(&mut self, id: ChannelId) -> Vec<TransferKind> {
        let table = &self.table;
        let channel = match id {
            ChannelId::Clipboard => &mut self.clipboard,
            ChannelId::Selection => &mut self.selection,
            ChannelId::Drag => &mut self.drag_channel,
        };
        if let Some(store) = channel.external_store_mut() {
            return store.query(table);
        }
        match channel.snapshot_mut() {
            Some(snapshot) => snapshot.query(table),
            None => Vec::new(),
        }
    }

    /// Fetch resolved bytes for one wire format from a channel.
    ///
    /// Locally owned channels answer from the snapshot without touching
    /// the window system. External channels go through the peer proxy;
    /// `same_process` marks transfers whose other end is this process,
    /// which must come back byte-identical and therefore skip wire
    /// conversion.
    pub fn fetch(
        &mut self,
        id: ChannelId,
        format_id: &str,
        same_process: bool,
        ws: &mut dyn WindowSystem,
    ) -> Result<Vec<u8>, FetchError> {
        let table = &self.table;
        let correlator = &mut self.correlator;
        let timeout = self.config.request_timeout;
        let channel = match id {
            ChannelId::Clipboard => &mut self.clipboard,
            ChannelId::Selection => &mut self.selection,
            ChannelId::Drag => &mut self.drag_channel,
        };

        if let Some(snapshot) = channel.snapshot_mut() {
            return snapshot.fetch(format_id, table);
        }

        let store = match channel.external_store_mut() {
            Some(store) => store,
            None => return Err(FetchError::NotPresent(format_id.to_string())),
        };
        let peer = match store.peer() {
            Some(peer) => peer,
            None => return Err(FetchError::NotPresent(format_id.to_string())),
        };

        // Already resolved by an earlier fetch
        if let Some(data) = store.resolved(format_id) {
            return Ok(data);
        }

        let mut proxy = ExternalPeerProxy::new(id, peer, correlator, timeout);
        proxy.fetch_external(ws, store, format_id, table, same_process)
    }

    /// Read view of a channel's current contents.
    pub fn get_for_read(&self, id: ChannelId) -> ReadView<'_> {
        self.channel(id).get_for_read()
    }

    // ------------------------------------------------------------------
    // Event dispatch
    // ------------------------------------------------------------------

    /// Feed one system event through the engine.
    ///
    /// Consumes ownership-loss notifications, inbound data requests and
    /// drag status replies; everything else comes back as
    /// [`EngineNotice::Unhandled`] for the caller's own dispatch.
    pub fn process_event(&mut self, event: Event, ws: &mut dyn WindowSystem) -> Option<EngineNotice> {
        match event {
            Event::OwnershipLost { channel } => {
                self.channel_mut(channel).ownership_lost();
                if channel == ChannelId::Drag {
                    // Losing the drag channel ends both halves of any
                    // negotiation tied to it
                    if self.drag.source.is_dragging() {
                        self.drag.source.cancel(&mut self.drag_channel, ws);
                    }
                    if self.drag.target.is_tracking() {
                        self.drag.target.leave(&mut self.drag_channel, ws);
                    }
                }
                Some(EngineNotice::SelectionCleared(channel))
            }

            Event::DataRequested {
                channel,
                peer,
                format_id,
                key,
            } => {
                let table = &self.table;
                let slot = match channel {
                    ChannelId::Clipboard => &mut self.clipboard,
                    ChannelId::Selection => &mut self.selection,
                    ChannelId::Drag => &mut self.drag_channel,
                };
                if let Err(err) = slot.answer_request(peer, key, &format_id, table, ws) {
                    debug!(%channel, %peer, format_id, %err, "data request answered empty");
                }
                None
            }

            Event::DragStatus {
                peer,
                accepted,
                action,
                possible,
            } => {
                self.drag.source.handle_status(peer, accepted, action, possible);
                None
            }

            Event::DragFinished { peer, .. } => {
                // Only meaningful inside a source's finish wait
                warn!(%peer, "drag finished notification outside a drop wait");
                None
            }

            other => Some(EngineNotice::Unhandled(other)),
        }
    }

    /// Re-dispatch the events deferred during request waits.
    pub fn pump_deferred(&mut self, ws: &mut dyn WindowSystem) -> Vec<EngineNotice> {
        let mut notices = Vec::new();
        for event in self.correlator.take_deferred() {
            if let Some(notice) = self.process_event(event, ws) {
                notices.push(notice);
            }
        }
        notices
    }

    // ------------------------------------------------------------------
    // Drag entry points
    // ------------------------------------------------------------------

    /// Start a drag with `store` as the payload.
    pub fn drag_begin(
        &mut self,
        store: &TransferStore,
        actions: DragActionSet,
        suggested: DragAction,
        ws: &mut dyn WindowSystem,
    ) -> Result<(), DragError> {
        self.drag.source.begin(store, actions, suggested, &mut self.drag_channel, ws)
    }

    /// The pointer was released over the target.
    pub fn drag_finish(&mut self, ws: &mut dyn WindowSystem) -> Result<Option<DragAction>, DragError> {
        self.drag
            .source
            .finish(&mut self.drag_channel, &mut self.correlator, ws, self.config.drop_timeout)
    }

    /// Abandon an outbound drag.
    pub fn drag_cancel(&mut self, ws: &mut dyn WindowSystem) {
        self.drag.source.cancel(&mut self.drag_channel, ws)
    }

    /// A foreign drag entered our surface.
    pub fn drag_enter(
        &mut self,
        peer: PeerId,
        offered_formats: &[String],
        source_actions: DragActionSet,
        suggested: DragAction,
    ) -> Result<(), DragError> {
        self.drag
            .target
            .enter(peer, offered_formats, source_actions, suggested, &mut self.drag_channel, &self.table)
    }

    /// A foreign drag moved over a drop site.
    pub fn drag_motion(
        &mut self,
        modifiers: ModifierState,
        acceptable: &[TransferClass],
        allowed: DragActionSet,
        ws: &mut dyn WindowSystem,
    ) -> Result<DragAction, DragError> {
        self.drag
            .target
            .motion(modifiers, acceptable, allowed, &mut self.drag_channel, &self.table, ws)
    }

    /// The foreign drag dropped; fetch the chosen format.
    pub fn drag_drop(
        &mut self,
        format_id: &str,
        same_process: bool,
        ws: &mut dyn WindowSystem,
    ) -> Result<Vec<u8>, DragError> {
        self.drag.target.drop_payload(
            format_id,
            same_process,
            &mut self.drag_channel,
            &self.table,
            &mut self.correlator,
            ws,
            self.config.request_timeout,
        )
    }

    /// The foreign drag left without dropping.
    pub fn drag_leave(&mut self, ws: &mut dyn WindowSystem) {
        self.drag.target.leave(&mut self.drag_channel, ws)
    }

    /// Flush-before-exit helper: persist every dirty channel, ignoring
    /// systems without a persistence service.
    pub fn flush_all(&mut self, ws: &mut dyn WindowSystem) {
        for id in [ChannelId::Clipboard, ChannelId::Selection, ChannelId::Drag] {
            match self.channel_mut(id).flush(ws) {
                Ok(()) => {}
                Err(PublishError::Unsupported) => {
                    debug!(channel = %id, "no persistence service; contents die with the process")
                }
                Err(err) => warn!(channel = %id, %err, "flush failed"),
            }
        }
    }

    // Timeout override used by tests to keep waits short.
    #[cfg(test)]
    pub(crate) fn set_request_timeout(&mut self, timeout: std::time::Duration) {
        self.config.request_timeout = timeout;
    }
}
