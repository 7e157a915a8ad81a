//! Canonical transfer kinds and their classes.
//!
//! A [`TransferKind`] names the encoding-independent category of a payload
//! as the rest of the application sees it. Kinds group into mutually
//! exclusive [`TransferClass`]es; a pasteboard holds at most one native
//! entry per class.

use std::fmt;

/// The canonical, encoding-independent category of a transfer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// Single-byte text in the native encoding (ISO-8859-1)
    Text,
    /// UTF-16LE text
    UnicodeText,
    /// Styled-text pickle (application-native rich text)
    StyledText,
    /// RTF-encoded text
    RtfText,
    /// HTML-encoded text
    HtmlText,
    /// Binary image stream (PNG, JPEG or GIF)
    Image,
    /// Newline-separated list of file paths
    Files,
    /// Application-private binary blob
    Private,
    /// Sequence of application object pickles
    Objects,
}

/// Mutually exclusive payload classes.
///
/// All five text kinds share [`TransferClass::Text`]; the remaining kinds
/// are each their own class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferClass {
    /// Text in any encoding (plain, unicode, styled, RTF, HTML)
    Text,
    /// Image data
    Image,
    /// File lists
    Files,
    /// Application-private data
    Private,
    /// Object pickles
    Objects,
}

impl TransferKind {
    /// The class this kind belongs to.
    pub fn class(self) -> TransferClass {
        match self {
            Self::Text | Self::UnicodeText | Self::StyledText | Self::RtfText | Self::HtmlText => TransferClass::Text,
            Self::Image => TransferClass::Image,
            Self::Files => TransferClass::Files,
            Self::Private => TransferClass::Private,
            Self::Objects => TransferClass::Objects,
        }
    }

    /// Returns true for kinds in the text class.
    pub fn is_text(self) -> bool {
        self.class() == TransferClass::Text
    }

    /// Returns true for derived text kinds (RTF, HTML).
    ///
    /// Derived kinds exist for the caller's benefit only; they are
    /// normalized to styled text on store and never advertised to the
    /// window system as native kinds.
    pub fn is_derived(self) -> bool {
        matches!(self, Self::RtfText | Self::HtmlText)
    }

    /// The script-facing name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::UnicodeText => "unicode",
            Self::StyledText => "styled",
            Self::RtfText => "rtf",
            Self::HtmlText => "html",
            Self::Image => "image",
            Self::Files => "files",
            Self::Private => "private",
            Self::Objects => "objects",
        }
    }

    /// Parse a script-facing name back into a kind.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "unicode" => Some(Self::UnicodeText),
            "styled" => Some(Self::StyledText),
            "rtf" => Some(Self::RtfText),
            "html" => Some(Self::HtmlText),
            "image" => Some(Self::Image),
            "files" => Some(Self::Files),
            "private" => Some(Self::Private),
            "objects" => Some(Self::Objects),
            _ => None,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_kinds_share_class() {
        for kind in [
            TransferKind::Text,
            TransferKind::UnicodeText,
            TransferKind::StyledText,
            TransferKind::RtfText,
            TransferKind::HtmlText,
        ] {
            assert_eq!(kind.class(), TransferClass::Text);
            assert!(kind.is_text());
        }
    }

    #[test]
    fn test_non_text_classes_distinct() {
        assert_eq!(TransferKind::Image.class(), TransferClass::Image);
        assert_eq!(TransferKind::Files.class(), TransferClass::Files);
        assert_eq!(TransferKind::Private.class(), TransferClass::Private);
        assert_eq!(TransferKind::Objects.class(), TransferClass::Objects);
        assert!(!TransferKind::Image.is_text());
    }

    #[test]
    fn test_derived_kinds() {
        assert!(TransferKind::RtfText.is_derived());
        assert!(TransferKind::HtmlText.is_derived());
        assert!(!TransferKind::StyledText.is_derived());
        assert!(!TransferKind::Text.is_derived());
    }

    #[test]
    fn test_name_roundtrip() {
        for kind in [
            TransferKind::Text,
            TransferKind::UnicodeText,
            TransferKind::StyledText,
            TransferKind::RtfText,
            TransferKind::HtmlText,
            TransferKind::Image,
            TransferKind::Files,
            TransferKind::Private,
            TransferKind::Objects,
        ] {
            assert_eq!(TransferKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransferKind::parse("bogus"), None);
    }
}
