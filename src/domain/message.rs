//! Email message domain types.
//!
//! A fetched message is a read-only view of what the mail API returned:
//! an ordered list of headers plus a tree of MIME body parts. Part data
//! stays in its transfer encoding (url-safe base64) until a consumer
//! decodes it, so a corrupt part can be skipped without losing siblings.

use serde::{Deserialize, Serialize};

use super::MessageId;

/// A single name/value header pair.
///
/// Header order is preserved as received; lookup is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as it appeared on the wire (e.g. "List-Unsubscribe").
    pub name: String,
    /// Raw header value.
    pub value: String,
}

impl Header {
    /// Creates a new header pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One node of the MIME body tree.
///
/// Leaf parts carry transfer-encoded `data`; multipart containers carry
/// nested `parts`. A part may legitimately have neither (e.g. an
/// attachment stub whose data lives behind an attachment ID).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyPart {
    /// MIME type of this part (e.g. "text/html", "multipart/alternative").
    pub mime_type: String,
    /// Inline body data in url-safe base64, if present.
    pub data: Option<String>,
    /// Nested parts for multipart containers.
    pub parts: Vec<BodyPart>,
}

impl BodyPart {
    /// Creates a leaf part with inline data.
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: Some(data.into()),
            parts: Vec::new(),
        }
    }

    /// Creates a multipart container.
    pub fn container(mime_type: impl Into<String>, parts: Vec<BodyPart>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: None,
            parts,
        }
    }
}

/// A fetched email message.
///
/// Immutable once constructed; the unsubscribe pipeline only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Provider-assigned message ID.
    pub id: MessageId,
    /// Short preview of the message content.
    pub snippet: String,
    /// Ordered message headers.
    pub headers: Vec<Header>,
    /// Root of the MIME body tree, if the message has a body.
    pub body: Option<BodyPart>,
}

impl EmailMessage {
    /// Returns the value of the first header matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns the parsed sender address from the `From` header.
    pub fn sender(&self) -> Option<Address> {
        self.header("From").map(Address::parse)
    }
}

/// An email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Email address.
    pub email: String,
    /// Display name (e.g. "Acme Deals").
    pub name: Option<String>,
}

impl Address {
    /// Creates a new address with just an email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Parses an address from a header value like `"Name <email@example.com>"`.
    ///
    /// Falls back to treating the whole value as the address when no angle
    /// brackets are present.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(start) = value.find('<') {
            if let Some(end) = value.find('>') {
                if end > start {
                    let email = value[start + 1..end].trim().to_string();
                    let name = value[..start].trim().trim_matches('"').to_string();
                    return Self {
                        email,
                        name: if name.is_empty() { None } else { Some(name) },
                    };
                }
            }
        }
        Self {
            email: value.to_string(),
            name: None,
        }
    }

    /// Returns the display representation of this address.
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let message = EmailMessage {
            id: MessageId::from("m1"),
            snippet: String::new(),
            headers: vec![Header::new("List-Unsubscribe", "<https://a.com/u>")],
            body: None,
        };

        assert_eq!(message.header("list-unsubscribe"), Some("<https://a.com/u>"));
        assert_eq!(message.header("LIST-UNSUBSCRIBE"), Some("<https://a.com/u>"));
        assert!(message.header("Subject").is_none());
    }

    #[test]
    fn header_lookup_returns_first_match() {
        let message = EmailMessage {
            id: MessageId::from("m1"),
            snippet: String::new(),
            headers: vec![
                Header::new("Received", "first"),
                Header::new("received", "second"),
            ],
            body: None,
        };

        assert_eq!(message.header("Received"), Some("first"));
    }

    #[test]
    fn address_parse_with_display_name() {
        let addr = Address::parse("Acme Deals <deals@acme.example>");
        assert_eq!(addr.email, "deals@acme.example");
        assert_eq!(addr.name, Some("Acme Deals".to_string()));
    }

    #[test]
    fn address_parse_quoted_name() {
        let addr = Address::parse("\"Deals, Acme\" <deals@acme.example>");
        assert_eq!(addr.email, "deals@acme.example");
        assert_eq!(addr.name, Some("Deals, Acme".to_string()));
    }

    #[test]
    fn address_parse_bare_email() {
        let addr = Address::parse("deals@acme.example");
        assert_eq!(addr.email, "deals@acme.example");
        assert!(addr.name.is_none());
    }

    #[test]
    fn sender_reads_from_header() {
        let message = EmailMessage {
            id: MessageId::from("m1"),
            snippet: String::new(),
            headers: vec![Header::new("From", "Acme <deals@acme.example>")],
            body: None,
        };

        let sender = message.sender().unwrap();
        assert_eq!(sender.email, "deals@acme.example");
    }

    #[test]
    fn body_part_constructors() {
        let part = BodyPart::container(
            "multipart/alternative",
            vec![BodyPart::leaf("text/plain", "aGVsbG8")],
        );
        assert_eq!(part.parts.len(), 1);
        assert!(part.data.is_none());
        assert_eq!(part.parts[0].mime_type, "text/plain");
    }
}
