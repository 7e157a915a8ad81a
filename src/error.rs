//! Error types for pasteboard operations.

use std::time::Duration;

use thiserror::Error;

use crate::kind::TransferKind;
use crate::system::ChannelId;

/// Errors from storing data into a transfer store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The kind has no registered wire formats
    #[error("no registered formats for kind '{0}'")]
    Unrepresentable(TransferKind),

    /// Local stores cannot be grown on a peer-backed store
    #[error("cannot store local data into an external store")]
    ExternalStore,

    /// Data size exceeded maximum
    #[error("data size {actual} exceeds maximum {max}")]
    DataSizeExceeded {
        /// Actual size in bytes
        actual: usize,
        /// Maximum allowed size in bytes
        max: usize,
    },
}

/// Errors from publishing or flushing a channel.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The window system refused to hand over ownership
    #[error("window system denied ownership of channel '{0}'")]
    OwnershipDenied(ChannelId),

    /// The window system offers no persistence service
    #[error("channel persistence is not supported")]
    Unsupported,

    /// External stores cannot be published
    #[error("cannot publish an external store")]
    NotLocal,
}

/// Errors from format conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// No converter exists between the native kind and the wire format
    #[error("no conversion from kind '{kind}' to format '{format}'")]
    UnsupportedConversion {
        /// Native kind of the stored data
        kind: TransferKind,
        /// Requested wire format
        format: String,
    },

    /// The styled-text codec reported a failure
    #[error("codec error: {0}")]
    Codec(String),

    /// Wire bytes were not valid for the claimed format
    #[error("malformed data for format '{format}': {reason}")]
    MalformedData {
        /// Wire format the bytes claimed to be
        format: String,
        /// What was wrong with them
        reason: String,
    },

    /// Invalid UTF-8 data
    #[error("invalid UTF-8 data")]
    InvalidUtf8,

    /// Invalid UTF-16 data
    #[error("invalid UTF-16 data")]
    InvalidUtf16,

    /// A wire format this registry knows nothing about
    #[error("unknown format '{0}'")]
    UnknownFormat(String),
}

/// Errors from fetching data out of a store or from a peer.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The format id is not present on the store
    #[error("format '{0}' not present")]
    NotPresent(String),

    /// The owning peer did not answer within the timeout
    #[error("peer did not answer: {0}")]
    PeerUnavailable(#[from] TimeoutError),

    /// Conversion of the data to or from the wire format failed
    #[error("conversion failed: {0}")]
    ConversionFailed(#[from] ConvertError),
}

impl FetchError {
    /// Returns true if this error should degrade to "data absent"
    /// rather than abort the surrounding operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PeerUnavailable(_) | Self::ConversionFailed(_))
    }
}

/// A cross-process request was not answered in time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request timed out after {waited:?}")]
pub struct TimeoutError {
    /// How long the caller waited before giving up
    pub waited: Duration,
}

impl TimeoutError {
    /// Construct a timeout error for the given wait duration.
    pub fn after(waited: Duration) -> Self {
        Self { waited }
    }
}

/// Errors from drag-and-drop negotiation.
#[derive(Error, Debug)]
pub enum DragError {
    /// Source and target share no compatible format; hard reject
    #[error("no compatible format between drag source and target")]
    NoCompatibleFormat,

    /// The negotiator was driven out of sequence
    #[error("invalid drag state: {0}")]
    InvalidState(&'static str),

    /// Publishing the drag payload failed
    #[error("drag publish failed: {0}")]
    PublishFailed(#[from] PublishError),

    /// Fetching the dropped payload failed
    #[error("drop fetch failed: {0}")]
    FetchFailed(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Unrepresentable(TransferKind::Private);
        assert_eq!(err.to_string(), "no registered formats for kind 'private'");

        let err = FetchError::NotPresent("image/png".to_string());
        assert_eq!(err.to_string(), "format 'image/png' not present");
    }

    #[test]
    fn test_fetch_recoverability() {
        let timeout = FetchError::PeerUnavailable(TimeoutError::after(Duration::from_secs(1)));
        assert!(timeout.is_recoverable());

        let missing = FetchError::NotPresent("text/plain".to_string());
        assert!(!missing.is_recoverable());

        let bad = FetchError::ConversionFailed(ConvertError::InvalidUtf16);
        assert!(bad.is_recoverable());
    }
}
