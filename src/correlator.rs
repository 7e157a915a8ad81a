//! Request/reply correlation over the shared event queue.
//!
//! The platform notification model is asynchronous: a request for a
//! peer's data is answered, eventually, by an event on the same FIFO the
//! rest of the UI drains. [`RequestCorrelator`] bridges that to a
//! synchronous call: issue the request, then cooperatively poll the
//! queue until the matching reply arrives or the timeout fires. Events
//! that are not the awaited reply are deferred, never dropped; the
//! caller re-dispatches them via [`take_deferred`](RequestCorrelator::take_deferred).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::TimeoutError;
use crate::system::{ChannelId, CorrelationKey, Event, PeerId, RequestOp, WindowSystem};

/// Sleep granularity while waiting for the queue to fill.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A successfully correlated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Formats the peer can supply
    Targets(Vec<String>),
    /// Converted bytes from the peer
    Data(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRequest {
    key: CorrelationKey,
    peer: PeerId,
    format_id: Option<String>,
}

/// Pending-request table plus the deferred-event FIFO.
///
/// One correlator is shared by all three channels, so a long wait on one
/// channel stalls the others; callers must keep timeouts conservative.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    /// Most recent outstanding request per channel. Replies are only
    /// accepted for the request recorded here; anything else is stale.
    pending: HashMap<ChannelId, PendingRequest>,

    /// Events drained while waiting that belong to someone else.
    deferred: VecDeque<Event>,
}

impl RequestCorrelator {
    /// Create an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue `op` and block cooperatively until its reply or `timeout`.
    ///
    /// Nesting a second wait on the same (channel, peer, format) is a
    /// logic bug: it asserts in debug builds and fails without issuing
    /// the request in release builds. A new request on the same channel
    /// with a different target supersedes the old one; the old reply, if
    /// it ever arrives, is discarded as stale.
    pub fn request_and_wait(
        &mut self,
        ws: &mut dyn WindowSystem,
        op: RequestOp,
        timeout: Duration,
    ) -> Result<Reply, TimeoutError> {
        let channel = op.channel();
        let peer = op.peer();
        let format_id = op.format_id().map(str::to_string);

        if let Some(existing) = self.pending.get(&channel) {
            if existing.peer == peer && existing.format_id == format_id {
                debug_assert!(false, "nested request_and_wait on one correlation key");
                error!(%channel, %peer, ?format_id, "nested request on the same correlation key; refusing");
                return Err(TimeoutError::after(Duration::ZERO));
            }
            debug!(%channel, "superseding outstanding request on channel");
        }

        let key = ws.enqueue_request(op);
        self.pending.insert(
            channel,
            PendingRequest {
                key,
                peer,
                format_id,
            },
        );

        let started = Instant::now();
        loop {
            let mut drained_any = false;
            while let Some(event) = ws.poll_event() {
                drained_any = true;
                if let Some(reply) = self.match_reply(channel, key, event) {
                    self.pending.remove(&channel);
                    return Ok(reply);
                }
            }

            let waited = started.elapsed();
            if waited >= timeout {
                self.pending.remove(&channel);
                warn!(%channel, ?timeout, "request timed out");
                return Err(TimeoutError::after(waited));
            }

            if !drained_any {
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// Wait for an event satisfying `pred`, deferring everything else.
    ///
    /// Used for uncorrelated protocol waits (a drag-finished
    /// notification has no correlation key). Reply events for pending
    /// requests are still classified as stale-or-deferred normally.
    pub fn wait_for_event(
        &mut self,
        ws: &mut dyn WindowSystem,
        timeout: Duration,
        mut pred: impl FnMut(&Event) -> bool,
    ) -> Result<Event, TimeoutError> {
        let started = Instant::now();
        loop {
            let mut drained_any = false;
            while let Some(event) = ws.poll_event() {
                drained_any = true;
                if pred(&event) {
                    return Ok(event);
                }
                self.defer(event);
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(TimeoutError::after(waited));
            }

            if !drained_any {
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// Drain the events deferred during waits, in arrival order.
    ///
    /// The caller must re-dispatch these through its normal event
    /// handling; they were borrowed from the shared queue, not consumed.
    pub fn take_deferred(&mut self) -> Vec<Event> {
        self.deferred.drain(..).collect()
    }

    /// Number of requests currently outstanding.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Classify one event against the awaited reply. Returns the reply
    /// if it matches; otherwise defers or drops (stale) the event.
    fn match_reply(&mut self, channel: ChannelId, key: CorrelationKey, event: Event) -> Option<Reply> {
        match event {
            Event::TargetsReply { key: k, formats } if k == key => Some(Reply::Targets(formats)),
            Event::DataReply { key: k, data } if k == key => Some(Reply::Data(data)),

            // A reply keyed to something we are no longer waiting for:
            // the peer answered after our timeout or after supersession.
            Event::TargetsReply { key: k, .. } | Event::DataReply { key: k, .. } => {
                debug!(%channel, stale_key = k.0, "discarding stale reply");
                None
            }

            other => {
                self.defer(other);
                None
            }
        }
    }

    fn defer(&mut self, event: Event) {
        self.deferred.push_back(event);
    }
}
