//! Generic unsubscribe form fallback.
//!
//! When the landing page does not read as a confirmation, scan it for a
//! form that looks unsubscribe-related, fill it from its own inputs
//! (synthesizing confirmation fields when the form carries none), and
//! submit it with the declared method. A 200 response counts as fallback
//! success; the content is deliberately not re-classified, this path is
//! best-effort by contract.

use reqwest::header::{ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::FORM_HINT_TERMS;

fn form_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("form").expect("form selector must parse"))
}

fn field_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("input, button").expect("field selector must parse"))
}

/// Submission method declared on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormMethod {
    Get,
    Post,
}

/// A scraped unsubscribe form, ready to submit.
#[derive(Debug, Clone)]
pub(crate) struct UnsubscribeForm {
    /// Raw `action` attribute; may be relative or empty.
    pub action: String,
    pub method: FormMethod,
    /// Field name/value pairs, in document order.
    pub fields: Vec<(String, String)>,
}

/// Scans HTML for forms whose action or markup mentions an unsubscribe term.
pub(crate) fn find_unsubscribe_forms(html: &str) -> Vec<UnsubscribeForm> {
    let document = Html::parse_document(html);
    let mut found = Vec::new();

    for form in document.select(form_selector()) {
        let action = form
            .value()
            .attr("action")
            .unwrap_or_default()
            .trim()
            .to_string();
        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };

        let action_lower = action.to_lowercase();
        let markup_lower = form.html().to_lowercase();
        if !FORM_HINT_TERMS
            .iter()
            .any(|term| action_lower.contains(term) || markup_lower.contains(term))
        {
            continue;
        }

        let mut fields: Vec<(String, String)> = Vec::new();
        for field in form.select(field_selector()) {
            let element = field.value();
            // A lone submit button before any data fields carries nothing.
            if fields.is_empty()
                && element
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("submit"))
            {
                continue;
            }
            let Some(name) = element.attr("name") else {
                continue;
            };
            fields.push((
                name.to_string(),
                element.attr("value").unwrap_or_default().to_string(),
            ));
        }

        if !fields
            .iter()
            .any(|(name, _)| name.to_lowercase().contains("confirm"))
        {
            fields.push(("unsub_confirm".to_string(), "1".to_string()));
            fields.push(("confirm".to_string(), "1".to_string()));
            fields.push(("submit".to_string(), "Unsubscribe".to_string()));
        }

        found.push(UnsubscribeForm {
            action,
            method,
            fields,
        });
    }

    found
}

/// Resolves a form action against the page's final URL.
pub(crate) fn resolve_action(action: &str, base: &Url) -> Option<Url> {
    let lower = action.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(action).ok()
    } else {
        base.join(action).ok()
    }
}

/// Finds and submits the first unsubscribe form on the page.
///
/// Returns true when a form submission came back with HTTP 200.
pub(crate) async fn submit_unsubscribe_form(client: &Client, html: &str, base_url: &str) -> bool {
    let Ok(base) = Url::parse(base_url) else {
        return false;
    };

    for form in find_unsubscribe_forms(html) {
        let Some(target) = resolve_action(&form.action, &base) else {
            continue;
        };

        let origin = base.origin().ascii_serialization();
        let request = match form.method {
            FormMethod::Post => client
                .post(target)
                .header(ORIGIN, origin)
                .header(REFERER, base_url)
                .form(&form.fields),
            FormMethod::Get => client.get(target).query(&form.fields),
        };

        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => return true,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "unsubscribe form submission rejected");
            }
            Err(e) => {
                tracing::debug!(error = %e, "unsubscribe form submission failed");
            }
        }
    }

    false
}
