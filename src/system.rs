//! Window-system seam: channels, peers, events and the backend trait.
//!
//! The engine never talks to a display server directly; a backend
//! implements [`WindowSystem`] and the engine drives it through these
//! types. Tests inject a scripted implementation.

use std::fmt;

use crate::drag::{DragAction, DragActionSet};

/// One of the three independent ownership slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// The system clipboard
    Clipboard,
    /// The primary/transient selection
    Selection,
    /// The drag-and-drop payload
    Drag,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clipboard => "clipboard",
            Self::Selection => "selection",
            Self::Drag => "drag",
        };
        f.write_str(name)
    }
}

/// Opaque handle naming another process (or window acting as one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Token matching an outbound request to its eventual reply event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationKey(pub u64);

/// An outbound cross-process request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOp {
    /// Ask the owning peer which formats it can supply
    QueryTargets {
        /// Channel whose owner is being asked
        channel: ChannelId,
        /// The owning peer
        peer: PeerId,
    },

    /// Ask the owning peer to convert its data into a format
    FetchData {
        /// Channel whose owner is being asked
        channel: ChannelId,
        /// The owning peer
        peer: PeerId,
        /// Requested wire format
        format_id: String,
    },
}

impl RequestOp {
    /// The channel this request targets.
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::QueryTargets { channel, .. } | Self::FetchData { channel, .. } => *channel,
        }
    }

    /// The peer this request targets.
    pub fn peer(&self) -> PeerId {
        match self {
            Self::QueryTargets { peer, .. } | Self::FetchData { peer, .. } => *peer,
        }
    }

    /// The format this request asks for, if any.
    pub fn format_id(&self) -> Option<&str> {
        match self {
            Self::QueryTargets { .. } => None,
            Self::FetchData { format_id, .. } => Some(format_id),
        }
    }
}

/// An event delivered by the window system's queue.
///
/// The queue is a strict FIFO shared with the rest of the UI; events the
/// engine is not waiting for must be preserved, never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Reply to a [`RequestOp::QueryTargets`]
    TargetsReply {
        /// Correlation key of the originating request
        key: CorrelationKey,
        /// Formats the peer can supply
        formats: Vec<String>,
    },

    /// Reply to a [`RequestOp::FetchData`]
    DataReply {
        /// Correlation key of the originating request
        key: CorrelationKey,
        /// The converted bytes
        data: Vec<u8>,
    },

    /// Another process claimed a channel we owned
    OwnershipLost {
        /// The channel whose ownership moved away
        channel: ChannelId,
    },

    /// A peer asks us to supply our published data in a format
    DataRequested {
        /// Channel being read
        channel: ChannelId,
        /// The requesting peer
        peer: PeerId,
        /// Requested wire format
        format_id: String,
        /// Key to answer with via `set_exchange_buffer`
        key: CorrelationKey,
    },

    /// A drag target's reply to a position update (source side)
    DragStatus {
        /// The target peer
        peer: PeerId,
        /// Whether the target would currently accept a drop
        accepted: bool,
        /// The action the target selected, if accepting
        action: Option<DragAction>,
        /// The actions the target could accept
        possible: DragActionSet,
    },

    /// The drag target finished processing a drop (source side)
    DragFinished {
        /// The target peer
        peer: PeerId,
        /// The action the target performed, None if it never accepted
        action: Option<DragAction>,
    },

    /// Queue traffic the engine does not understand (repaints and the
    /// like); preserved for the caller's own dispatch
    Foreign(u64),
}

/// The services the engine consumes from the window system.
///
/// Implementations mediate between this engine and whatever the platform
/// offers (X selections, a portal, or an in-memory fake in tests). All
/// calls are synchronous and non-blocking; long waits happen in the
/// engine's own correlator, never inside the backend.
pub trait WindowSystem {
    /// Assert ownership of a channel. Returns false if the system
    /// refused (another claim raced us, or the channel is locked).
    fn claim_ownership(&mut self, channel: ChannelId) -> bool;

    /// Give up ownership of a channel.
    fn release_ownership(&mut self, channel: ChannelId);

    /// Issue an outbound request and mint its correlation key.
    fn enqueue_request(&mut self, op: RequestOp) -> CorrelationKey;

    /// Pop the next pending event, if any.
    fn poll_event(&mut self) -> Option<Event>;

    /// Answer an inbound [`Event::DataRequested`] with bytes. An empty
    /// buffer means "format not available".
    fn set_exchange_buffer(&mut self, peer: PeerId, key: CorrelationKey, data: Vec<u8>);

    /// Reply to a drag position update (target side): whether a drop
    /// would be accepted, with which action, out of which set.
    fn post_drag_status(&mut self, peer: PeerId, accepted: bool, action: Option<DragAction>, possible: DragActionSet);

    /// Tell the drag source the drop has been fully processed (target
    /// side). `None` means the drop was rejected or failed.
    fn post_drag_finished(&mut self, peer: PeerId, action: Option<DragAction>);

    /// Hand the channel's current contents to a persistence service so
    /// they outlive this process. Returns false when the system offers
    /// no such service.
    fn persist_channel(&mut self, channel: ChannelId) -> bool;
}
