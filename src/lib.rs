//! # pasteboard-core
//!
//! Backend-agnostic data-transfer engine for clipboard, primary
//! selection and drag-and-drop.
//!
//! The engine owns the protocol logic of inter-application data
//! transfer and nothing else:
//!
//! - **[`FormatTable`]** - wire format ↔ [`TransferKind`] registry with
//!   lazy conversion and priority-based shadowing
//! - **[`TransferStore`]** - typed payload container, one native entry
//!   per payload class
//! - **[`OwnershipChannel`]** - publish-equals-snapshot ownership slot,
//!   one each for clipboard, selection and drag
//! - **[`RequestCorrelator`]** - bridges the asynchronous window-system
//!   queue to synchronous request/reply calls, with bounded timeouts
//! - **[`DragNegotiator`]** - source and target drag state machines
//! - **[`Pasteboard`]** - the whole engine behind one context struct
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pasteboard_core::{Pasteboard, TransferStore, TransferKind, ChannelId};
//!
//! let mut pb = Pasteboard::new(codec);
//! let mut store = TransferStore::new_local();
//! store.store(TransferKind::Text, b"hello".to_vec(), pb.table())?;
//! pb.publish(ChannelId::Clipboard, &store, &mut ws)?;
//! assert_eq!(pb.query(ChannelId::Clipboard), vec![TransferKind::Text]);
//! ```
//!
//! ## Architecture
//!
//! The [`WindowSystem`] trait is the seam to the platform: claims,
//! request enqueueing and a polled event queue. Implementations do the
//! actual windowing-system talk while this crate handles negotiation,
//! conversion, correlation and timeouts. Everything is single-threaded
//! and cooperative; "blocking" calls re-enter the event pump and defer
//! unrelated events for the caller to re-dispatch.

#![warn(missing_docs)]

mod channel;
mod config;
mod context;
mod correlator;
mod peer;
mod store;

pub mod codec;
pub mod drag;
pub mod error;
pub mod formats;
pub mod kind;
pub mod system;

#[cfg(test)]
mod testutil;

pub use channel::{ChannelState, OwnershipChannel, ReadView};
pub use config::EngineConfig;
pub use context::{EngineNotice, Pasteboard};
pub use correlator::{Reply, RequestCorrelator};
pub use drag::{DragAction, DragActionSet, DragNegotiator, DragRole, DragSession, DragSource, DragTarget, ModifierState};
pub use error::{ConvertError, DragError, FetchError, PublishError, StoreError, TimeoutError};
pub use formats::FormatTable;
pub use kind::{TransferClass, TransferKind};
pub use peer::ExternalPeerProxy;
pub use store::{FormatEntry, Payload, TransferStore};
pub use system::{ChannelId, CorrelationKey, Event, PeerId, RequestOp, WindowSystem};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codec::StyledTextCodec;
    pub use crate::{
        ChannelId, DragAction, DragActionSet, EngineConfig, Event, FormatTable, Pasteboard, PeerId, TransferKind,
        TransferStore, WindowSystem,
    };
}
