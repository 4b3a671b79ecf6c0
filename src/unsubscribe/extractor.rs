//! Unsubscribe link extraction from fetched messages.
//!
//! The `List-Unsubscribe` header is authoritative when it yields usable
//! links; the body is only scanned when the header gives nothing. Body
//! scanning walks the MIME tree, decoding each text part independently so
//! one corrupt part never costs us its siblings.

use std::collections::HashSet;
use std::sync::OnceLock;

use base64::prelude::*;
use regex::Regex;
use scraper::{Html, Selector};

use super::UNSUBSCRIBE_HREF_PATTERNS;
use crate::domain::{BodyPart, EmailMessage, LinkSource, UnsubscribeCandidate};

fn bracketed_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([^>]*)>").expect("bracket regex must compile"))
}

fn plain_text_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s"]+unsubscribe[^\s">]*"#)
            .expect("plain text link regex must compile")
    })
}

fn raw_content_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s">]+unsubscribe[^\s">]*"#)
            .expect("raw content link regex must compile")
    })
}

fn anchor_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("anchor selector must parse"))
}

/// Insertion-ordered candidate collection, deduplicated by link value.
#[derive(Default)]
struct CandidateSet {
    seen: HashSet<String>,
    items: Vec<UnsubscribeCandidate>,
}

impl CandidateSet {
    fn push(&mut self, link: &str, source: LinkSource) {
        let link = link.trim();
        if link.is_empty() || !self.seen.insert(link.to_string()) {
            return;
        }
        self.items.push(UnsubscribeCandidate::new(link, source));
    }
}

/// Extracts unsubscribe candidates from a message.
///
/// Returns candidates in discovery order, deduplicated by link value. An
/// empty or missing body yields an empty list, not an error.
pub fn extract(message: &EmailMessage) -> Vec<UnsubscribeCandidate> {
    let mut set = CandidateSet::default();

    if scan_list_unsubscribe_header(message, &mut set) {
        // RFC-advertised mechanism takes precedence over body heuristics.
        return set.items;
    }

    if let Some(body) = &message.body {
        scan_part(body, &mut set);
    }

    set.items
}

/// Scans the `List-Unsubscribe` header; returns true when it yielded links.
fn scan_list_unsubscribe_header(message: &EmailMessage, set: &mut CandidateSet) -> bool {
    let Some(value) = message.header("List-Unsubscribe") else {
        return false;
    };

    let mut found = false;
    for captures in bracketed_token_re().captures_iter(value) {
        let token = captures[1].trim();
        if has_supported_scheme(token) {
            set.push(token, LinkSource::Header);
            found = true;
        }
    }

    if found {
        tracing::debug!(
            message_id = %message.id,
            count = set.items.len(),
            "unsubscribe links found in List-Unsubscribe header"
        );
    }
    found
}

fn has_supported_scheme(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
}

/// Recursively scans one node of the MIME tree.
fn scan_part(part: &BodyPart, set: &mut CandidateSet) {
    if let Some(data) = &part.data {
        let mime = part.mime_type.to_ascii_lowercase();
        // "text/html" also contains "text", so check html first.
        if mime.contains("html") {
            if let Some(html) = decode_part_data(data) {
                scan_html(&html, set);
            }
        } else if mime.contains("text") {
            if let Some(text) = decode_part_data(data) {
                scan_plain_text(&text, set);
            }
        }
    }

    for child in &part.parts {
        scan_part(child, set);
    }
}

/// Decodes url-safe base64 part data, tolerating padded input.
///
/// Returns `None` on undecodable data; the caller skips just that part.
fn decode_part_data(data: &str) -> Option<String> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Collects unsubscribe-ish anchors from an HTML part.
fn scan_html(html: &str, set: &mut CandidateSet) {
    // Quoted-printable soft line breaks survive into some payloads and
    // split URLs mid-token; normalize them before parsing.
    let html = html.replace("=\r\n", "").replace("=\n", "");

    let document = Html::parse_document(&html);
    let mut saw_anchor = false;

    for anchor in document.select(anchor_selector()) {
        saw_anchor = true;
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let lower = href.to_ascii_lowercase();

        if lower.starts_with("mailto:") {
            if lower.contains("unsubscribe") {
                set.push(href, LinkSource::BodyHtml);
            }
        } else if UNSUBSCRIBE_HREF_PATTERNS.iter().any(|p| lower.contains(p)) {
            set.push(href, LinkSource::BodyHtml);
        }
    }

    // Content too mangled for the parser to find a single anchor: fall
    // back to a raw scan of the unparsed text.
    if !saw_anchor {
        for m in raw_content_link_re().find_iter(&html) {
            set.push(m.as_str(), LinkSource::BodyHtml);
        }
    }
}

/// Matches bare unsubscribe URLs in a plain text part.
fn scan_plain_text(text: &str, set: &mut CandidateSet) {
    for m in plain_text_link_re().find_iter(text) {
        set.push(m.as_str(), LinkSource::BodyText);
    }
}
