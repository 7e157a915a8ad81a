//! Format registry and wire conversion.
//!
//! This module is the single source of truth mapping [`TransferKind`]s to
//! the wire format identifiers peers understand, with a priority used for
//! tie-breaking and the shadowing rule that decides what a peer believes
//! is on the pasteboard.

use std::sync::Arc;

use tracing::debug;

use crate::codec::StyledTextCodec;
use crate::error::ConvertError;
use crate::kind::TransferKind;

// =============================================================================
// Format identifiers
// =============================================================================

/// Newline-separated file list as file:// URIs
pub const FORMAT_URI_LIST: &str = "text/uri-list";

/// PNG image stream
pub const FORMAT_PNG: &str = "image/png";

/// JPEG image stream
pub const FORMAT_JPEG: &str = "image/jpeg";

/// GIF image stream
pub const FORMAT_GIF: &str = "image/gif";

/// Application object pickles
pub const FORMAT_OBJECTS: &str = "application/x-pasteboard-objects";

/// Application-private blob; never advertised externally
pub const FORMAT_PRIVATE: &str = "application/x-pasteboard-private";

/// Styled-text pickle in its native form
pub const FORMAT_STYLED: &str = "application/x-pasteboard-styled";

/// Rich Text Format
pub const FORMAT_RTF: &str = "text/rtf";

/// HTML text
pub const FORMAT_HTML: &str = "text/html";

/// UTF-8 text (X convention name)
pub const FORMAT_UTF8: &str = "UTF8_STRING";

/// ISO-8859-1 text (X convention name)
pub const FORMAT_STRING: &str = "STRING";

/// Legacy plain-text alias, lowest priority
pub const FORMAT_PLAIN: &str = "text/plain";

// =============================================================================
// Registry
// =============================================================================

/// One row of the format registry: a wire format, the kind it carries,
/// and the priority used when several rows could satisfy a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatMapping {
    /// Wire format identifier
    pub format_id: &'static str,

    /// The kind this format encodes
    pub kind: TransferKind,

    /// Tie-break priority; higher wins
    pub priority: u32,

    /// Never advertised to the window system when true
    pub local_only: bool,
}

/// The static format registry.
///
/// A format id may appear more than once (e.g. `text/rtf` both as the
/// RtfText identity encoding and as a styled-text derivation); the first
/// row for a format id decides how inbound data of that format is
/// classified.
pub const FORMAT_TABLE: &[FormatMapping] = &[
    FormatMapping { format_id: FORMAT_URI_LIST, kind: TransferKind::Files, priority: 5, local_only: false },
    FormatMapping { format_id: FORMAT_PNG, kind: TransferKind::Image, priority: 5, local_only: false },
    FormatMapping { format_id: FORMAT_JPEG, kind: TransferKind::Image, priority: 5, local_only: false },
    FormatMapping { format_id: FORMAT_GIF, kind: TransferKind::Image, priority: 5, local_only: false },
    FormatMapping { format_id: FORMAT_OBJECTS, kind: TransferKind::Objects, priority: 5, local_only: false },
    FormatMapping { format_id: FORMAT_PRIVATE, kind: TransferKind::Private, priority: 5, local_only: true },
    FormatMapping { format_id: FORMAT_STYLED, kind: TransferKind::StyledText, priority: 4, local_only: false },
    FormatMapping { format_id: FORMAT_UTF8, kind: TransferKind::UnicodeText, priority: 3, local_only: false },
    FormatMapping { format_id: FORMAT_STRING, kind: TransferKind::Text, priority: 3, local_only: false },
    FormatMapping { format_id: FORMAT_RTF, kind: TransferKind::StyledText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_RTF, kind: TransferKind::RtfText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_HTML, kind: TransferKind::StyledText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_HTML, kind: TransferKind::HtmlText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_UTF8, kind: TransferKind::StyledText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_STRING, kind: TransferKind::StyledText, priority: 2, local_only: false },
    FormatMapping { format_id: FORMAT_PLAIN, kind: TransferKind::Text, priority: 1, local_only: false },
];

/// The shadowing rule: richer text encodings hide poorer ones of the
/// same class in query results.
///
/// Text and UnicodeText are suppressed when StyledText is already
/// included; Text is suppressed when UnicodeText is already included.
/// Duplicates are always suppressed. This rule determines what a peer
/// application believes is on the pasteboard and must not be relaxed.
pub fn should_include(existing: &[TransferKind], candidate: TransferKind) -> bool {
    if matches!(candidate, TransferKind::Text | TransferKind::UnicodeText)
        && existing.contains(&TransferKind::StyledText)
    {
        return false;
    }

    if candidate == TransferKind::Text && existing.contains(&TransferKind::UnicodeText) {
        return false;
    }

    !existing.contains(&candidate)
}

// =============================================================================
// Format table
// =============================================================================

/// The format registry bound to a styled-text codec.
///
/// Lookup functions consult the static [`FORMAT_TABLE`]; conversion
/// functions additionally run the codec for styled-text derivations.
#[derive(Clone)]
pub struct FormatTable {
    codec: Arc<dyn StyledTextCodec + Send + Sync>,
    max_size: usize,
}

impl FormatTable {
    /// Default maximum payload size: 16 MB.
    pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;

    /// Create a format table bound to the given codec.
    pub fn new(codec: Arc<dyn StyledTextCodec + Send + Sync>) -> Self {
        Self {
            codec,
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }

    /// Create a format table with a custom maximum payload size.
    pub fn with_max_size(codec: Arc<dyn StyledTextCodec + Send + Sync>, max_size: usize) -> Self {
        Self { codec, max_size }
    }

    /// Maximum payload size accepted by stores using this table.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Classify a wire format: the kind it carries and its priority.
    ///
    /// The first registry row for the format id wins, so `text/rtf`
    /// classifies as StyledText (inbound RTF is normalized to the richer
    /// representation).
    pub fn lookup_by_format(&self, format_id: &str) -> Option<(TransferKind, u32)> {
        FORMAT_TABLE
            .iter()
            .find(|m| m.format_id == format_id)
            .map(|m| (m.kind, m.priority))
    }

    /// All registry rows for a kind, highest priority first.
    pub fn lookup_by_kind(&self, kind: TransferKind) -> Vec<&'static FormatMapping> {
        let mut rows: Vec<&'static FormatMapping> = FORMAT_TABLE.iter().filter(|m| m.kind == kind).collect();
        rows.sort_by(|a, b| b.priority.cmp(&a.priority));
        rows
    }

    /// The canonical wire format for a kind (its highest-priority row).
    pub fn native_format(&self, kind: TransferKind) -> Option<&'static str> {
        self.lookup_by_kind(kind).first().map(|m| m.format_id)
    }

    /// The wire formats to advertise for a kind, highest priority first.
    ///
    /// Local-only rows (private payloads) are excluded; they never reach
    /// the window system.
    pub fn wire_formats(&self, kind: TransferKind) -> Vec<&'static str> {
        let mut out = Vec::new();
        for row in self.lookup_by_kind(kind) {
            if !row.local_only && !out.contains(&row.format_id) {
                out.push(row.format_id);
            }
        }
        out
    }

    /// Normalize data at store time.
    ///
    /// Derived text kinds (RTF, HTML) decode to the styled-text pickle so
    /// the native entry is always the richest representation available.
    /// If the codec cannot decode, the kind is kept as-is.
    pub fn normalize(&self, kind: TransferKind, data: Vec<u8>) -> (TransferKind, Vec<u8>) {
        let decoded = match kind {
            TransferKind::RtfText => self.codec.decode_rtf(&data),
            TransferKind::HtmlText => self.codec.decode_html(&data),
            _ => return (kind, data),
        };

        match decoded {
            Ok(pickle) => (TransferKind::StyledText, pickle),
            Err(err) => {
                debug!(kind = %kind, %err, "keeping derived kind un-normalized");
                (kind, data)
            }
        }
    }

    /// Convert native bytes of `kind` into the requested wire format.
    pub fn convert_to_wire(&self, kind: TransferKind, format_id: &str, data: &[u8]) -> Result<Vec<u8>, ConvertError> {
        match (kind, format_id) {
            (TransferKind::Text, FORMAT_STRING) | (TransferKind::Text, FORMAT_PLAIN) => Ok(data.to_vec()),
            (TransferKind::Text, FORMAT_UTF8) => Ok(latin1_to_utf8(data).into_bytes()),

            (TransferKind::UnicodeText, FORMAT_UTF8) => Ok(utf16le_to_utf8(data)?.into_bytes()),
            (TransferKind::UnicodeText, FORMAT_STRING) | (TransferKind::UnicodeText, FORMAT_PLAIN) => {
                Ok(utf8_to_latin1(&utf16le_to_utf8(data)?))
            }

            (TransferKind::StyledText, FORMAT_STYLED) => Ok(data.to_vec()),
            (TransferKind::StyledText, FORMAT_RTF) => self.codec.encode_rtf(data),
            (TransferKind::StyledText, FORMAT_HTML) => self.codec.encode_html(data),
            (TransferKind::StyledText, FORMAT_UTF8) => Ok(self.codec.encode_plain(data)?.into_bytes()),
            (TransferKind::StyledText, FORMAT_STRING) | (TransferKind::StyledText, FORMAT_PLAIN) => {
                Ok(utf8_to_latin1(&self.codec.encode_plain(data)?))
            }

            (TransferKind::RtfText, FORMAT_RTF) => Ok(data.to_vec()),
            (TransferKind::HtmlText, FORMAT_HTML) => Ok(data.to_vec()),

            (TransferKind::Image, FORMAT_PNG)
            | (TransferKind::Image, FORMAT_JPEG)
            | (TransferKind::Image, FORMAT_GIF) => Ok(data.to_vec()),

            (TransferKind::Files, FORMAT_URI_LIST) => paths_to_uri_list(data),

            (TransferKind::Objects, FORMAT_OBJECTS) => Ok(data.to_vec()),
            (TransferKind::Private, FORMAT_PRIVATE) => Ok(data.to_vec()),

            _ => Err(ConvertError::UnsupportedConversion {
                kind,
                format: format_id.to_string(),
            }),
        }
    }

    /// Accept wire bytes from a peer: classify and convert to the native
    /// in-process representation.
    pub fn convert_from_wire(&self, format_id: &str, data: &[u8]) -> Result<(TransferKind, Vec<u8>), ConvertError> {
        match format_id {
            FORMAT_STRING | FORMAT_PLAIN => Ok((TransferKind::Text, data.to_vec())),
            FORMAT_UTF8 => {
                let text = std::str::from_utf8(data).map_err(|_| ConvertError::InvalidUtf8)?;
                Ok((TransferKind::UnicodeText, utf8_to_utf16le(text)))
            }
            FORMAT_STYLED => Ok((TransferKind::StyledText, data.to_vec())),
            FORMAT_RTF => Ok((TransferKind::StyledText, self.codec.decode_rtf(data)?)),
            FORMAT_HTML => Ok((TransferKind::StyledText, self.codec.decode_html(data)?)),
            FORMAT_URI_LIST => Ok((TransferKind::Files, uri_list_to_paths(data)?)),
            FORMAT_PNG | FORMAT_JPEG | FORMAT_GIF => Ok((TransferKind::Image, data.to_vec())),
            FORMAT_OBJECTS => Ok((TransferKind::Objects, data.to_vec())),
            FORMAT_PRIVATE => Ok((TransferKind::Private, data.to_vec())),
            _ => Err(ConvertError::UnknownFormat(format_id.to_string())),
        }
    }
}

impl std::fmt::Debug for FormatTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatTable").field("max_size", &self.max_size).finish()
    }
}

// =============================================================================
// Text encoding helpers
// =============================================================================

/// Decode ISO-8859-1 bytes to a UTF-8 string (total function).
pub(crate) fn latin1_to_utf8(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Encode a UTF-8 string as ISO-8859-1, replacing unrepresentable
/// characters with '?'.
pub(crate) fn utf8_to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Encode a UTF-8 string as UTF-16LE bytes.
pub(crate) fn utf8_to_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}

/// Decode UTF-16LE bytes to a UTF-8 string.
pub(crate) fn utf16le_to_utf8(data: &[u8]) -> Result<String, ConvertError> {
    if data.len() % 2 != 0 {
        return Err(ConvertError::InvalidUtf16);
    }

    let utf16: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&utf16).map_err(|_| ConvertError::InvalidUtf16)
}

// =============================================================================
// File list helpers
// =============================================================================

/// Convert a newline-separated path list to a `text/uri-list` payload.
fn paths_to_uri_list(data: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let text = std::str::from_utf8(data).map_err(|_| ConvertError::InvalidUtf8)?;

    let uris: Vec<String> = text
        .lines()
        .filter(|line| !line.is_empty())
        .map(|path| format!("file://{path}"))
        .collect();

    Ok(uris.join("\r\n").into_bytes())
}

/// Convert a `text/uri-list` payload to a newline-separated path list.
///
/// Comment lines and non-file URIs are skipped per the uri-list format.
fn uri_list_to_paths(data: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let text = std::str::from_utf8(data).map_err(|_| ConvertError::InvalidUtf8)?;

    let paths: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.strip_prefix("file://"))
        .collect();

    if paths.is_empty() {
        return Err(ConvertError::MalformedData {
            format: FORMAT_URI_LIST.to_string(),
            reason: "no file URIs".to_string(),
        });
    }

    Ok(paths.join("\n").into_bytes())
}

// =============================================================================
// Tests
// =============================================================================
