//! Unsubscribe link discovery and execution.
//!
//! This module is the heart of the crate: finding candidate unsubscribe
//! endpoints inside arbitrary (and frequently malformed) email payloads,
//! driving the HTTP interaction against an uncooperative third-party
//! server, and deciding from the returned HTML whether the attempt
//! actually worked.
//!
//! The pieces compose as a pipeline:
//!
//! ```text
//! EmailMessage -> extractor -> UnsubscribeCandidate list
//!                                   |
//!                                   v
//!                  executor (GET / vendor POST / form fallback)
//!                                   |
//!                                   v
//!                  classifier (confirmation page detection)
//! ```
//!
//! Everything here is best-effort by design. A page that only reveals its
//! real unsubscribe action through client-side scripting is out of reach,
//! and no amount of heuristics guarantees success against a given sender.

mod classifier;
mod executor;
mod extractor;
mod forms;

pub use classifier::is_confirmed;
pub use executor::{HttpExecutor, LinkExecutor, DEFAULT_TIMEOUT};
pub use extractor::extract;

/// Substrings that mark an anchor href as an unsubscribe-ish link.
///
/// Matched case-insensitively against the raw href value.
pub(crate) const UNSUBSCRIBE_HREF_PATTERNS: [&str; 10] = [
    "unsubscribe",
    "email_preferences",
    "preferences",
    "optout",
    "opt-out",
    "manage_preferences",
    "emailpreferences",
    "email-preferences",
    "email_optout",
    "email-optout",
];

/// Terms that mark a `<form>` as a plausible unsubscribe form.
pub(crate) const FORM_HINT_TERMS: [&str; 3] = ["unsub", "optout", "preferences"];
