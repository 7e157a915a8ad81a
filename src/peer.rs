//! Proxy for data held by another process.
//!
//! When a channel is externally owned, its contents live in the owner's
//! address space and every read is a request/reply exchange through the
//! window system. The proxy issues those exchanges via the correlator,
//! applies the engine's timeout policy, and lands the replies in the
//! channel's external store so later reads are local.

use std::time::Duration;

use tracing::{debug, warn};

use crate::correlator::{Reply, RequestCorrelator};
use crate::error::{FetchError, TimeoutError};
use crate::formats::FormatTable;
use crate::store::TransferStore;
use crate::system::{ChannelId, PeerId, RequestOp, WindowSystem};

/// Read-side proxy for one externally-owned channel.
pub struct ExternalPeerProxy<'a> {
    channel: ChannelId,
    peer: PeerId,
    correlator: &'a mut RequestCorrelator,
    timeout: Duration,
}

impl<'a> ExternalPeerProxy<'a> {
    /// Build a proxy for `peer`'s data on `channel`.
    pub fn new(
        channel: ChannelId,
        peer: PeerId,
        correlator: &'a mut RequestCorrelator,
        timeout: Duration,
    ) -> Self {
        Self {
            channel,
            peer,
            correlator,
            timeout,
        }
    }

    /// Ask the owner which wire formats it offers.
    ///
    /// A silent owner is treated as offering nothing: the timeout is
    /// logged and an empty list returned, so callers see "clipboard is
    /// empty" rather than an error.
    pub fn query_external(
        &mut self,
        ws: &mut dyn WindowSystem,
        store: &mut TransferStore,
        table: &FormatTable,
    ) -> Vec<String> {
        let op = RequestOp::QueryTargets {
            channel: self.channel,
            peer: self.peer,
        };

        let formats = match self.correlator.request_and_wait(ws, op, self.timeout) {
            Ok(Reply::Targets(formats)) => formats,
            Ok(Reply::Data(_)) => {
                warn!(channel = %self.channel, peer = %self.peer, "data reply to a targets query");
                Vec::new()
            }
            Err(err) => {
                warn!(channel = %self.channel, peer = %self.peer, %err, "targets query timed out");
                Vec::new()
            }
        };

        for format_id in &formats {
            store.note_external_format(format_id, table);
        }
        debug!(channel = %self.channel, peer = %self.peer, count = formats.len(), "external formats");
        formats
    }

    /// Fetch one wire format from the owner and resolve it into `store`.
    ///
    /// For cross-process transfers the wire bytes are converted to the
    /// native representation; when `same_process` is set the bytes pass
    /// through untouched, which keeps the round trip byte-identical.
    pub fn fetch_external(
        &mut self,
        ws: &mut dyn WindowSystem,
        store: &mut TransferStore,
        format_id: &str,
        table: &FormatTable,
        same_process: bool,
    ) -> Result<Vec<u8>, FetchError> {
        let op = RequestOp::FetchData {
            channel: self.channel,
            peer: self.peer,
            format_id: format_id.to_string(),
        };

        let data = match self.correlator.request_and_wait(ws, op, self.timeout) {
            Ok(Reply::Data(data)) => data,
            Ok(Reply::Targets(_)) => {
                warn!(channel = %self.channel, peer = %self.peer, format_id, "targets reply to a data fetch");
                return Err(FetchError::PeerUnavailable(TimeoutError::after(Duration::ZERO)));
            }
            Err(err) => {
                warn!(channel = %self.channel, peer = %self.peer, format_id, %err, "data fetch timed out");
                return Err(FetchError::PeerUnavailable(err));
            }
        };

        if data.is_empty() {
            // The owner's way of saying the format is not actually there
            debug!(channel = %self.channel, peer = %self.peer, format_id, "owner returned no data");
            return Err(FetchError::NotPresent(format_id.to_string()));
        }

        if same_process {
            if let Some((kind, _)) = table.lookup_by_format(format_id) {
                store.resolve(format_id, kind, data.clone());
            }
            return Ok(data);
        }

        let (kind, native) = table.convert_from_wire(format_id, &data)?;
        store.resolve(format_id, kind, native.clone());
        Ok(native)
    }
}
