//! Scripted in-memory window system for tests.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::drag::{DragAction, DragActionSet};
use crate::system::{ChannelId, CorrelationKey, Event, PeerId, RequestOp, WindowSystem};

type Responder = Box<dyn FnMut(CorrelationKey, &RequestOp) -> Vec<Event>>;

/// A window system whose behavior is scripted per test.
///
/// Requests are answered by queued responder closures, one per request,
/// in order; a request with no responder simply goes unanswered, which
/// is how timeouts are exercised. Everything posted back through the
/// trait is recorded for assertions.
#[derive(Default)]
pub struct FakeWindowSystem {
    next_key: u64,
    deny_claims: bool,
    persistence: bool,
    owned: HashSet<ChannelId>,
    persisted: HashSet<ChannelId>,
    events: VecDeque<Event>,
    responders: VecDeque<Responder>,
    requests: Vec<RequestOp>,
    exchange: HashMap<(PeerId, CorrelationKey), Vec<u8>>,
    drag_status: Vec<(PeerId, bool, Option<DragAction>, DragActionSet)>,
    drag_finished: Vec<(PeerId, Option<DragAction>)>,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or stop refusing) ownership claims.
    pub fn deny_claims(&mut self, deny: bool) {
        self.deny_claims = deny;
    }

    /// Pretend a persistence service is (un)available.
    pub fn enable_persistence(&mut self, enabled: bool) {
        self.persistence = enabled;
    }

    /// Script the answer to the next unanswered request. The closure
    /// receives the minted key and the request, and returns the events
    /// to deliver.
    pub fn answer_next_request(&mut self, responder: impl FnMut(CorrelationKey, &RequestOp) -> Vec<Event> + 'static) {
        self.responders.push_back(Box::new(responder));
    }

    /// Inject an event directly into the queue.
    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Whether a claim is currently held on `channel`.
    pub fn owns(&self, channel: ChannelId) -> bool {
        self.owned.contains(&channel)
    }

    /// Whether `channel` was handed to the persistence service.
    pub fn persisted(&self, channel: ChannelId) -> bool {
        self.persisted.contains(&channel)
    }

    /// How many requests were enqueued so far.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// The requests enqueued so far, in order.
    pub fn requests(&self) -> &[RequestOp] {
        &self.requests
    }

    /// The buffer posted for `(peer, key)`, if any.
    pub fn exchange_buffer(&self, peer: PeerId, key: CorrelationKey) -> Option<Vec<u8>> {
        self.exchange.get(&(peer, key)).cloned()
    }

    /// The most recent drag status posted.
    pub fn last_drag_status(&self) -> Option<(PeerId, bool, Option<DragAction>, DragActionSet)> {
        self.drag_status.last().copied()
    }

    /// The most recent drag-finished notification posted.
    pub fn last_drag_finished(&self) -> Option<(PeerId, Option<DragAction>)> {
        self.drag_finished.last().copied()
    }
}

impl WindowSystem for FakeWindowSystem {
    fn claim_ownership(&mut self, channel: ChannelId) -> bool {
        if self.deny_claims {
            return false;
        }
        self.owned.insert(channel);
        true
    }

    fn release_ownership(&mut self, channel: ChannelId) {
        self.owned.remove(&channel);
    }

    fn enqueue_request(&mut self, op: RequestOp) -> CorrelationKey {
        self.next_key += 1;
        let key = CorrelationKey(self.next_key);
        if let Some(mut responder) = self.responders.pop_front() {
            for event in responder(key, &op) {
                self.events.push_back(event);
            }
        }
        self.requests.push(op);
        key
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn set_exchange_buffer(&mut self, peer: PeerId, key: CorrelationKey, data: Vec<u8>) {
        self.exchange.insert((peer, key), data);
    }

    fn post_drag_status(&mut self, peer: PeerId, accepted: bool, action: Option<DragAction>, possible: DragActionSet) {
        self.drag_status.push((peer, accepted, action, possible));
    }

    fn post_drag_finished(&mut self, peer: PeerId, action: Option<DragAction>) {
        self.drag_finished.push((peer, action));
    }

    fn persist_channel(&mut self, channel: ChannelId) -> bool {
        if !self.persistence {
            return false;
        }
        self.persisted.insert(channel);
        true
    }
}
