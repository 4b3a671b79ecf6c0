//! Confirmation page classification.
//!
//! Given the HTML a server returned after an unsubscribe attempt, decide
//! whether the attempt actually completed. Pure string/tree inspection,
//! no I/O.
//!
//! Negative phrases are checked before anything else: wording like
//! "please confirm your unsubscription" marks an intermediate page even
//! when success wording appears elsewhere on it.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Phrases that mark an intermediate (not-yet-done) page.
const NEGATIVE_PHRASE_PATTERNS: [&str; 4] = [
    r"\balready\s+(?:un)?subscribed\b",
    r"\b(?:please\s+)?confirm\s+your\s+unsubscription\b",
    r"\bverify\s+unsubscription\b",
    r"\bclick\s+to\s+confirm\b",
];

/// Phrases that mark a completed unsubscribe.
const POSITIVE_PHRASE_PATTERNS: [&str; 5] = [
    r"\b(?:you\s+have\s+been|successfully|success!?)\s+unsubscribed\b",
    r"\bunsubscrib(?:ed|tion)\s+(?:was\s+)?successful(?:ly)?\b",
    r"\b(?:preferences|subscription)\s+updated\b",
    r"\byou\s+are\s+now\s+unsubscribed\b",
    r"\bunsubscribe\s+confirmed\b",
];

/// Selectors for elements that typically carry a confirmation message.
const CONFIRMATION_SELECTORS: [&str; 7] = [
    ".confirmation",
    ".success",
    ".alert-success",
    ".status-msg",
    "#unsubscribe-confirmation",
    r#"[class*="success"]"#,
    r#"[class*="confirm"]"#,
];

/// Keywords a matched element's text must contain to count as confirmation.
const CONFIRMATION_KEYWORDS: [&str; 3] = ["unsub", "success", "confirm"];

fn negative_patterns() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        NEGATIVE_PHRASE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("negative phrase regex must compile"))
            .collect()
    })
}

fn positive_patterns() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        POSITIVE_PHRASE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("positive phrase regex must compile"))
            .collect()
    })
}

fn confirmation_selectors() -> &'static Vec<Selector> {
    static SELS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELS.get_or_init(|| {
        CONFIRMATION_SELECTORS
            .iter()
            .map(|s| Selector::parse(s).expect("confirmation selector must parse"))
            .collect()
    })
}

/// Returns true when the HTML reads as a completed unsubscribe.
///
/// Priority order: negative phrases force `false`; positive phrases force
/// `true`; otherwise confirmation-shaped elements whose text carries an
/// unsubscribe keyword count as confirmation. No match anywhere is `false`.
pub fn is_confirmed(html: &str) -> bool {
    if html.trim().is_empty() {
        return false;
    }

    let content = html.to_lowercase();

    if negative_patterns().iter().any(|re| re.is_match(&content)) {
        return false;
    }

    if positive_patterns().iter().any(|re| re.is_match(&content)) {
        return true;
    }

    let document = Html::parse_document(&content);
    for selector in confirmation_selectors() {
        for element in document.select(selector) {
            let text: String = element.text().collect();
            if CONFIRMATION_KEYWORDS.iter().any(|k| text.contains(k)) {
                return true;
            }
        }
    }

    false
}
