//! Drag-and-drop negotiation.
//!
//! A drag is a short-lived negotiation over the drag channel. The source
//! publishes its store and offers a set of actions; the target tracks the
//! pointer, replies to each motion with whether it would accept a drop
//! and with which action, and on drop fetches the payload through the
//! external-peer proxy. Both roles run their own small state machine and
//! a process can hold both at once (self-drags stay on the fast path via
//! the same-process flag).

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::OwnershipChannel;
use crate::correlator::RequestCorrelator;
use crate::error::DragError;
use crate::formats::FormatTable;
use crate::kind::TransferClass;
use crate::peer::ExternalPeerProxy;
use crate::store::TransferStore;
use crate::system::{Event, PeerId, WindowSystem};

// ============================================================================
// Actions
// ============================================================================

/// What a drop does with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    /// Duplicate the data at the drop site
    Copy,
    /// Transfer the data; the source deletes its copy afterwards
    Move,
    /// Place a reference to the data at the drop site
    Link,
}

impl DragAction {
    fn bit(self) -> u32 {
        match self {
            Self::Copy => 1 << 0,
            Self::Move => 1 << 1,
            Self::Link => 1 << 2,
        }
    }
}

impl fmt::Display for DragAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Link => "link",
        };
        f.write_str(name)
    }
}

/// A set of drag actions, packed into bits.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct DragActionSet(u32);

impl DragActionSet {
    /// The empty set
    pub const NONE: Self = Self(0);
    /// Copy only
    pub const COPY: Self = Self(1 << 0);
    /// Move only
    pub const MOVE: Self = Self(1 << 1);
    /// Link only
    pub const LINK: Self = Self(1 << 2);
    /// Every action
    pub const ALL: Self = Self(0b111);

    /// True when no action is in the set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when `action` is in the set.
    pub fn contains(self, action: DragAction) -> bool {
        self.0 & action.bit() != 0
    }

    /// The set plus `action`.
    #[must_use]
    pub fn with(self, action: DragAction) -> Self {
        Self(self.0 | action.bit())
    }

    /// Actions in either set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Actions in both sets.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Pick the action a drop should perform: the requested action when
    /// the set allows it, otherwise copy, move, link in that order.
    pub fn pick_preferred(self, requested: Option<DragAction>) -> Option<DragAction> {
        if let Some(action) = requested {
            if self.contains(action) {
                return Some(action);
            }
        }
        [DragAction::Copy, DragAction::Move, DragAction::Link]
            .into_iter()
            .find(|a| self.contains(*a))
    }
}

impl fmt::Debug for DragActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for action in [DragAction::Copy, DragAction::Move, DragAction::Link] {
            if self.contains(action) {
                set.entry(&action);
            }
        }
        set.finish()
    }
}

/// Modifier keys sampled at the moment of a motion event.
///
/// Sampled per motion by the caller and passed in each time; the engine
/// never caches modifier state across events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierState {
    /// Shift key held
    pub shift: bool,
    /// Control key held
    pub ctrl: bool,
    /// Alt key held
    pub alt: bool,
}

impl ModifierState {
    /// The action conventionally requested by the held modifiers.
    pub fn requested_action(self) -> Option<DragAction> {
        match (self.ctrl, self.shift) {
            (true, true) => Some(DragAction::Link),
            (true, false) => Some(DragAction::Copy),
            (false, true) => Some(DragAction::Move),
            (false, false) => None,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Which end of the drag this session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRole {
    /// This process started the drag
    Source,
    /// A foreign drag is over this process
    Target,
}

/// The live state of one drag, created when the drag begins and dropped
/// when it concludes.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub role: DragRole,
    /// Actions the negotiation can still settle on
    pub possible_actions: DragActionSet,
    /// The action preferred absent modifier input
    pub suggested_action: DragAction,
    /// What the target has settled on so far, if anything
    pub selected_action: Option<DragAction>,
    /// The other end, once known
    pub peer: Option<PeerId>,
}

// ============================================================================
// Source
// ============================================================================

#[derive(Debug)]
enum SourceState {
    Idle,
    Dragging {
        session: DragSession,
        accepted: bool,
    },
}

/// The outbound half: this process started the drag.
#[derive(Debug)]
pub struct DragSource {
    state: SourceState,
}

impl DragSource {
    /// Create an idle source.
    pub fn new() -> Self {
        Self {
            state: SourceState::Idle,
        }
    }

    /// True while a drag is in flight.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SourceState::Dragging { .. })
    }

    /// The session, while a drag is in flight.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            SourceState::Dragging { session, .. } => Some(session),
            SourceState::Idle => None,
        }
    }

    /// Start a drag: publish `store` on the drag channel and offer
    /// `actions` to whoever the pointer ends up over.
    pub fn begin(
        &mut self,
        store: &TransferStore,
        actions: DragActionSet,
        suggested: DragAction,
        channel: &mut OwnershipChannel,
        ws: &mut dyn WindowSystem,
    ) -> Result<(), DragError> {
        if self.is_dragging() {
            return Err(DragError::InvalidState("drag already in progress"));
        }
        if actions.is_empty() {
            return Err(DragError::NoCompatibleFormat);
        }

        channel.publish(store, ws)?;
        info!(?actions, %suggested, "drag started");
        self.state = SourceState::Dragging {
            session: DragSession {
                role: DragRole::Source,
                possible_actions: actions,
                suggested_action: suggested,
                selected_action: None,
                peer: None,
            },
            accepted: false,
        };
        Ok(())
    }

    /// Fold a target's status reply into the session.
    pub fn handle_status(
        &mut self,
        peer: PeerId,
        target_accepted: bool,
        action: Option<DragAction>,
        possible: DragActionSet,
    ) {
        let SourceState::Dragging { session, accepted } = &mut self.state else {
            debug!(%peer, "drag status outside a drag; dropped");
            return;
        };

        session.peer = Some(peer);
        *accepted = target_accepted;
        if target_accepted {
            session.selected_action = action;
            session.possible_actions = session.possible_actions.intersect(possible);
        } else {
            session.selected_action = None;
        }
    }

    /// The pointer was released: wait for the target to finish fetching
    /// and report the action it performed.
    ///
    /// Returns `Ok(None)` when the target never accepted, rejected the
    /// drop, or fails to finish within `drop_timeout`. A `Move` result
    /// tells the caller to delete the source data; nothing is deleted
    /// here.
    pub fn finish(
        &mut self,
        channel: &mut OwnershipChannel,
        correlator: &mut RequestCorrelator,
        ws: &mut dyn WindowSystem,
        drop_timeout: Duration,
    ) -> Result<Option<DragAction>, DragError> {
        let SourceState::Dragging { session, accepted } = &self.state else {
            return Err(DragError::InvalidState("no drag to finish"));
        };

        if !*accepted {
            debug!("drop released over a rejecting target");
            channel.release(ws);
            self.state = SourceState::Idle;
            return Ok(None);
        }

        let expect_peer = session.peer;
        let result = correlator.wait_for_event(ws, drop_timeout, |event| {
            matches!(event, Event::DragFinished { peer, .. }
                if expect_peer.is_none() || Some(*peer) == expect_peer)
        });

        let performed = match result {
            Ok(Event::DragFinished { action, .. }) => action,
            Ok(_) => None,
            Err(err) => {
                warn!(%err, "target never finished the drop");
                None
            }
        };

        info!(action = ?performed, "drag finished");
        channel.release(ws);
        self.state = SourceState::Idle;
        Ok(performed)
    }

    /// Abandon the drag (escape pressed, pointer grab broken).
    pub fn cancel(&mut self, channel: &mut OwnershipChannel, ws: &mut dyn WindowSystem) {
        if self.is_dragging() {
            debug!("drag cancelled");
            channel.release(ws);
        }
        self.state = SourceState::Idle;
    }
}

impl Default for DragSource {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Target
// ============================================================================

#[derive(Debug)]
enum TargetState {
    Idle,
    Tracking { session: DragSession },
}

/// The inbound half: a drag from elsewhere is over this process.
#[derive(Debug)]
pub struct DragTarget {
    state: TargetState,
}

impl DragTarget {
    /// Create an idle target.
    pub fn new() -> Self {
        Self {
            state: TargetState::Idle,
        }
    }

    /// True while a foreign drag is being tracked.
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TargetState::Tracking { .. })
    }

    /// The session, while tracking.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            TargetState::Tracking { session } => Some(session),
            TargetState::Idle => None,
        }
    }

    /// A drag entered our surface: set up an external store on the drag
    /// channel holding the formats the source advertised.
    pub fn enter(
        &mut self,
        peer: PeerId,
        offered_formats: &[String],
        source_actions: DragActionSet,
        suggested: DragAction,
        channel: &mut OwnershipChannel,
        table: &FormatTable,
    ) -> Result<(), DragError> {
        if self.is_tracking() {
            return Err(DragError::InvalidState("already tracking a drag"));
        }

        let store = channel.pull(Some(peer));
        for format_id in offered_formats {
            store.note_external_format(format_id, table);
        }

        debug!(%peer, formats = offered_formats.len(), "drag entered");
        self.state = TargetState::Tracking {
            session: DragSession {
                role: DragRole::Target,
                possible_actions: source_actions,
                suggested_action: suggested,
                selected_action: None,
                peer: Some(peer),
            },
        };
        Ok(())
    }

    /// A motion update: decide whether a drop here would be accepted and
    /// with which action, and tell the source.
    ///
    /// `acceptable` is what the drop site can consume and `allowed` the
    /// actions it supports; `modifiers` is the key state at this instant.
    /// No format overlap or no action overlap is a hard reject: the
    /// source is told `rejected` and `NoCompatibleFormat` is returned.
    pub fn motion(
        &mut self,
        modifiers: ModifierState,
        acceptable: &[TransferClass],
        allowed: DragActionSet,
        channel: &mut OwnershipChannel,
        table: &FormatTable,
        ws: &mut dyn WindowSystem,
    ) -> Result<DragAction, DragError> {
        let TargetState::Tracking { session } = &mut self.state else {
            return Err(DragError::InvalidState("motion outside a drag"));
        };
        let Some(peer) = session.peer else {
            return Err(DragError::InvalidState("tracking a drag with no peer"));
        };

        let has_format = match channel.external_store_mut() {
            Some(store) => store
                .query(table)
                .iter()
                .any(|kind| acceptable.contains(&kind.class())),
            None => false,
        };

        let actions = session.possible_actions.intersect(allowed);
        if !has_format || actions.is_empty() {
            debug!(%peer, has_format, "rejecting drop position");
            session.selected_action = None;
            ws.post_drag_status(peer, false, None, DragActionSet::NONE);
            return Err(DragError::NoCompatibleFormat);
        }

        let requested = modifiers.requested_action().or(Some(session.suggested_action));
        let action = match actions.pick_preferred(requested) {
            Some(action) => action,
            // Unreachable given the emptiness check, but never panic here
            None => {
                ws.post_drag_status(peer, false, None, DragActionSet::NONE);
                return Err(DragError::NoCompatibleFormat);
            }
        };

        session.selected_action = Some(action);
        ws.post_drag_status(peer, true, Some(action), actions);
        Ok(action)
    }

    /// The drop happened: fetch `format_id` from the source and tell it
    /// the drag is finished.
    ///
    /// Any failure still posts a finished notification (with no action)
    /// so the source is never left waiting for the full drop timeout.
    pub fn drop_payload(
        &mut self,
        format_id: &str,
        same_process: bool,
        channel: &mut OwnershipChannel,
        table: &FormatTable,
        correlator: &mut RequestCorrelator,
        ws: &mut dyn WindowSystem,
        timeout: Duration,
    ) -> Result<Vec<u8>, DragError> {
        let TargetState::Tracking { session } = &self.state else {
            return Err(DragError::InvalidState("drop outside a drag"));
        };
        let Some(peer) = session.peer else {
            return Err(DragError::InvalidState("tracking a drag with no peer"));
        };
        let Some(action) = session.selected_action else {
            // Drop without a prior accepting motion
            ws.post_drag_finished(peer, None);
            self.state = TargetState::Idle;
            return Err(DragError::NoCompatibleFormat);
        };

        let channel_id = channel.id();
        let store = match channel.external_store_mut() {
            Some(store) => store,
            None => {
                ws.post_drag_finished(peer, None);
                self.state = TargetState::Idle;
                return Err(DragError::InvalidState("drag channel holds no external store"));
            }
        };

        let mut proxy = ExternalPeerProxy::new(channel_id, peer, correlator, timeout);
        match proxy.fetch_external(ws, store, format_id, table, same_process) {
            Ok(data) => {
                info!(%peer, format_id, %action, bytes = data.len(), "drop completed");
                ws.post_drag_finished(peer, Some(action));
                self.state = TargetState::Idle;
                Ok(data)
            }
            Err(err) => {
                warn!(%peer, format_id, %err, "drop fetch failed");
                ws.post_drag_finished(peer, None);
                self.state = TargetState::Idle;
                Err(DragError::FetchFailed(err))
            }
        }
    }

    /// The pointer left without dropping, or the source cancelled.
    pub fn leave(&mut self, channel: &mut OwnershipChannel, ws: &mut dyn WindowSystem) {
        if self.is_tracking() {
            debug!("drag left");
            channel.release(ws);
        }
        self.state = TargetState::Idle;
    }
}

impl Default for DragTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// Both halves of drag negotiation for one process.
#[derive(Debug, Default)]
pub struct DragNegotiator {
    /// The outbound half
    pub source: DragSource,
    /// The inbound half
    pub target: DragTarget,
}

impl DragNegotiator {
    /// Create a negotiator with both halves idle.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::TagCodec;
    use crate::formats::{FORMAT_PNG, FORMAT_UTF8};
    use crate::kind::TransferKind;
    use crate::system::ChannelId;
    use crate::testutil::FakeWindowSystem;
    use std::sync::Arc;

    fn table() -> FormatTable {
        FormatTable::new(Arc::new(TagCodec))
    }

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn test_action_set_basics() {
        let set = DragActionSet::COPY.with(DragAction::Link);
        assert!(set.contains(DragAction::Copy));
        assert!(set.contains(DragAction::Link));
        assert!(!set.contains(DragAction::Move));
        assert!(set.intersect(DragActionSet::MOVE).is_empty());
        assert_eq!(set.pick_preferred(Some(DragAction::Move)), Some(DragAction::Copy));
        assert_eq!(set.pick_preferred(Some(DragAction::Link)), Some(DragAction::Link));
        assert_eq!(DragActionSet::NONE.pick_preferred(None), None);
    }

    #[test]
    fn test_modifiers_request_actions() {
        let none = ModifierState::default();
        assert_eq!(none.requested_action(), None);
        let ctrl = ModifierState { ctrl: true, ..Default::default() };
        assert_eq!(ctrl.requested_action(), Some(DragAction::Copy));
        let shift = ModifierState { shift: true, ..Default::default() };
        assert_eq!(shift.requested_action(), Some(DragAction::Move));
        let both = ModifierState { ctrl: true, shift: true, ..Default::default() };
        assert_eq!(both.requested_action(), Some(DragAction::Link));
    }

    #[test]
    fn test_source_begin_requires_actions() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut source = DragSource::new();

        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"payload".to_vec(), &t).unwrap();

        let err = source
            .begin(&store, DragActionSet::NONE, DragAction::Copy, &mut channel, &mut ws)
            .unwrap_err();
        assert!(matches!(err, DragError::NoCompatibleFormat));
        assert!(!source.is_dragging());

        source
            .begin(&store, DragActionSet::ALL, DragAction::Copy, &mut channel, &mut ws)
            .unwrap();
        assert!(source.is_dragging());
        assert!(channel.is_owned());
    }

    #[test]
    fn test_source_finish_without_acceptance() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut correlator = RequestCorrelator::new();
        let mut source = DragSource::new();

        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"payload".to_vec(), &t).unwrap();
        source
            .begin(&store, DragActionSet::ALL, DragAction::Copy, &mut channel, &mut ws)
            .unwrap();

        source.handle_status(PeerId(7), false, None, DragActionSet::NONE);
        let performed = source.finish(&mut channel, &mut correlator, &mut ws, TIMEOUT).unwrap();
        assert_eq!(performed, None);
        assert!(!source.is_dragging());
        assert!(!channel.is_owned());
    }

    #[test]
    fn test_source_finish_reports_target_action() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut correlator = RequestCorrelator::new();
        let mut source = DragSource::new();

        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"payload".to_vec(), &t).unwrap();
        source
            .begin(&store, DragActionSet::COPY.with(DragAction::Move), DragAction::Move, &mut channel, &mut ws)
            .unwrap();

        source.handle_status(PeerId(7), true, Some(DragAction::Move), DragActionSet::ALL);
        ws.push_event(Event::DragFinished {
            peer: PeerId(7),
            action: Some(DragAction::Move),
        });

        let performed = source.finish(&mut channel, &mut correlator, &mut ws, TIMEOUT).unwrap();
        assert_eq!(performed, Some(DragAction::Move));
    }

    #[test]
    fn test_source_finish_timeout_is_none() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut correlator = RequestCorrelator::new();
        let mut source = DragSource::new();

        let mut store = TransferStore::new_local();
        store.store(TransferKind::Text, b"payload".to_vec(), &t).unwrap();
        source
            .begin(&store, DragActionSet::ALL, DragAction::Copy, &mut channel, &mut ws)
            .unwrap();
        source.handle_status(PeerId(7), true, Some(DragAction::Copy), DragActionSet::ALL);

        // Target never posts finished
        let performed = source.finish(&mut channel, &mut correlator, &mut ws, TIMEOUT).unwrap();
        assert_eq!(performed, None);
    }

    #[test]
    fn test_target_rejects_on_no_format_overlap() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut target = DragTarget::new();

        target
            .enter(
                PeerId(3),
                &[FORMAT_PNG.to_string()],
                DragActionSet::ALL,
                DragAction::Copy,
                &mut channel,
                &t,
            )
            .unwrap();

        // Drop site only takes text, source only offers an image
        let err = target
            .motion(
                ModifierState::default(),
                &[TransferClass::Text],
                DragActionSet::ALL,
                &mut channel,
                &t,
                &mut ws,
            )
            .unwrap_err();
        assert!(matches!(err, DragError::NoCompatibleFormat));
        assert_eq!(ws.last_drag_status(), Some((PeerId(3), false, None, DragActionSet::NONE)));
    }

    #[test]
    fn test_target_rejects_on_no_action_overlap() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut target = DragTarget::new();

        target
            .enter(
                PeerId(3),
                &[FORMAT_UTF8.to_string()],
                DragActionSet::MOVE,
                DragAction::Move,
                &mut channel,
                &t,
            )
            .unwrap();

        let err = target
            .motion(
                ModifierState::default(),
                &[TransferClass::Text],
                DragActionSet::LINK,
                &mut channel,
                &t,
                &mut ws,
            )
            .unwrap_err();
        assert!(matches!(err, DragError::NoCompatibleFormat));
    }

    #[test]
    fn test_target_accepts_and_picks_action() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut target = DragTarget::new();

        target
            .enter(
                PeerId(3),
                &[FORMAT_UTF8.to_string()],
                DragActionSet::ALL,
                DragAction::Copy,
                &mut channel,
                &t,
            )
            .unwrap();

        let shift = ModifierState { shift: true, ..Default::default() };
        let action = target
            .motion(shift, &[TransferClass::Text], DragActionSet::ALL, &mut channel, &t, &mut ws)
            .unwrap();
        assert_eq!(action, DragAction::Move);
        assert_eq!(
            ws.last_drag_status(),
            Some((PeerId(3), true, Some(DragAction::Move), DragActionSet::ALL))
        );
    }

    #[test]
    fn test_target_drop_fetches_and_finishes() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut correlator = RequestCorrelator::new();
        let mut target = DragTarget::new();

        target
            .enter(
                PeerId(3),
                &[FORMAT_UTF8.to_string()],
                DragActionSet::ALL,
                DragAction::Copy,
                &mut channel,
                &t,
            )
            .unwrap();
        target
            .motion(
                ModifierState::default(),
                &[TransferClass::Text],
                DragActionSet::ALL,
                &mut channel,
                &t,
                &mut ws,
            )
            .unwrap();

        ws.answer_next_request(|key, _| {
            vec![Event::DataReply {
                key,
                data: "dropped".as_bytes().to_vec(),
            }]
        });

        let data = target
            .drop_payload(FORMAT_UTF8, false, &mut channel, &t, &mut correlator, &mut ws, TIMEOUT)
            .unwrap();
        // UTF8_STRING decodes to native UTF-16LE unicode text
        assert_eq!(data, crate::formats::utf8_to_utf16le("dropped"));
        assert_eq!(ws.last_drag_finished(), Some((PeerId(3), Some(DragAction::Copy))));
        assert!(!target.is_tracking());
    }

    #[test]
    fn test_target_drop_failure_still_finishes() {
        let t = table();
        let mut ws = FakeWindowSystem::new();
        let mut channel = OwnershipChannel::new(ChannelId::Drag);
        let mut correlator = RequestCorrelator::new();
        let mut target = DragTarget::new();

        target
            .enter(
                PeerId(3),
                &[FORMAT_UTF8.to_string()],
                DragActionSet::ALL,
                DragAction::Copy,
                &mut channel,
                &t,
            )
            .unwrap();
        target
            .motion(
                ModifierState::default(),
                &[TransferClass::Text],
                DragActionSet::ALL,
                &mut channel,
                &t,
                &mut ws,
            )
            .unwrap();

        // Source never answers the fetch
        let err = target
            .drop_payload(FORMAT_UTF8, false, &mut channel, &t, &mut correlator, &mut ws, TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, DragError::FetchFailed(_)));
        assert_eq!(ws.last_drag_finished(), Some((PeerId(3), None)));
        assert!(!target.is_tracking());
    }
}
