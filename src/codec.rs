//! Styled-text codec seam.
//!
//! RTF and HTML encoding of styled text is the business of an external
//! codec; this engine only needs a pair of pure, fallible functions per
//! encoding. Backends implement [`StyledTextCodec`] and hand it to
//! [`FormatTable`](crate::formats::FormatTable).

use crate::error::ConvertError;

/// Bidirectional converters between the styled-text pickle and its
/// derived encodings.
///
/// All methods are pure: same input, same output, no side effects. A
/// failed decode is an expected condition (malformed external bytes) and
/// must be reported through `ConvertError`, never panicked on.
pub trait StyledTextCodec {
    /// Encode a styled-text pickle as RTF bytes.
    fn encode_rtf(&self, pickle: &[u8]) -> Result<Vec<u8>, ConvertError>;

    /// Decode RTF bytes into a styled-text pickle.
    fn decode_rtf(&self, rtf: &[u8]) -> Result<Vec<u8>, ConvertError>;

    /// Encode a styled-text pickle as HTML bytes.
    fn encode_html(&self, pickle: &[u8]) -> Result<Vec<u8>, ConvertError>;

    /// Decode HTML bytes into a styled-text pickle.
    fn decode_html(&self, html: &[u8]) -> Result<Vec<u8>, ConvertError>;

    /// Flatten a styled-text pickle to plain UTF-8 text.
    fn encode_plain(&self, pickle: &[u8]) -> Result<String, ConvertError>;

    /// Wrap plain UTF-8 text into a styled-text pickle with default styling.
    fn decode_plain(&self, text: &str) -> Result<Vec<u8>, ConvertError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! A trivially reversible codec for exercising conversion paths.

    use super::*;

    /// Tags pickles with prefixes so round-trips are checkable.
    pub struct TagCodec;

    fn strip<'a>(data: &'a [u8], tag: &[u8], format: &str) -> Result<&'a [u8], ConvertError> {
        data.strip_prefix(tag).ok_or_else(|| ConvertError::MalformedData {
            format: format.to_string(),
            reason: "missing tag".to_string(),
        })
    }

    impl StyledTextCodec for TagCodec {
        fn encode_rtf(&self, pickle: &[u8]) -> Result<Vec<u8>, ConvertError> {
            Ok([b"RTF:", pickle].concat())
        }

        fn decode_rtf(&self, rtf: &[u8]) -> Result<Vec<u8>, ConvertError> {
            strip(rtf, b"RTF:", "text/rtf").map(<[u8]>::to_vec)
        }

        fn encode_html(&self, pickle: &[u8]) -> Result<Vec<u8>, ConvertError> {
            Ok([b"HTML:", pickle].concat())
        }

        fn decode_html(&self, html: &[u8]) -> Result<Vec<u8>, ConvertError> {
            strip(html, b"HTML:", "text/html").map(<[u8]>::to_vec)
        }

        fn encode_plain(&self, pickle: &[u8]) -> Result<String, ConvertError> {
            String::from_utf8(pickle.to_vec()).map_err(|_| ConvertError::InvalidUtf8)
        }

        fn decode_plain(&self, text: &str) -> Result<Vec<u8>, ConvertError> {
            Ok(text.as_bytes().to_vec())
        }
    }
}
