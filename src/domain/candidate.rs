//! Unsubscribe link candidates discovered in a message.

use serde::{Deserialize, Serialize};

/// Where in the message a candidate link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkSource {
    /// The RFC 2369 `List-Unsubscribe` header.
    Header,
    /// An anchor in a `text/html` body part.
    BodyHtml,
    /// A URL matched in a `text/plain` body part.
    BodyText,
}

/// What kind of action the link represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// An `http://` or `https://` URL the executor can drive.
    Http,
    /// A `mailto:` target requiring a manual email.
    Mailto,
}

impl LinkKind {
    /// Classifies a link string by its scheme prefix.
    pub fn of(link: &str) -> Self {
        if link
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("mailto:"))
        {
            LinkKind::Mailto
        } else {
            LinkKind::Http
        }
    }
}

/// A single discovered unsubscribe link with its provenance.
///
/// Candidates have no identity beyond their link string within one message;
/// the extractor deduplicates on that string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeCandidate {
    /// The raw link value.
    pub link: String,
    /// Link kind.
    pub kind: LinkKind,
    /// Where the link was found.
    pub source: LinkSource,
}

impl UnsubscribeCandidate {
    /// Creates a candidate, classifying its kind from the link scheme.
    pub fn new(link: impl Into<String>, source: LinkSource) -> Self {
        let link = link.into();
        let kind = LinkKind::of(&link);
        Self { link, kind, source }
    }

    /// Whether the executor can act on this candidate directly.
    pub fn is_actionable(&self) -> bool {
        self.kind == LinkKind::Http
    }
}
