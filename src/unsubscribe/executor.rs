//! Unsubscribe execution over HTTP.
//!
//! One attempt per link: vendor-specific POST flow for known bulk-mail
//! domains, plain GET with redirect following for everything else, and a
//! generic form-submission fallback when the landing page does not read
//! as a confirmation. Every failure mode is converted into an
//! [`AttemptResult`] carrying a reason; nothing below this boundary is
//! allowed to surface as a panic or an unhandled transport error.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::header::{ORIGIN, REFERER};
use reqwest::StatusCode;
use url::Url;

use super::{classifier, forms};
use crate::domain::AttemptResult;

/// Default bound on every network call made by the executor.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bulk-mail vendor domains that need the dedicated POST flow.
const VENDOR_UNSUBSCRIBE_DOMAINS: [&str; 2] = ["sendgrid.net", "sendgrid.com"];

/// Response fragments the vendor endpoint uses to acknowledge an opt-out.
const VENDOR_SUCCESS_TERMS: [&str; 3] = ["unsubscribed", "success", "thank you"];

/// Browser-like request headers; bare library defaults get rejected by
/// anti-bot layers on many unsubscribe endpoints.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        "upgrade-insecure-requests",
        HeaderValue::from_static("1"),
    );
    headers.insert("dnt", HeaderValue::from_static("1"));
    headers
}

/// Drives one unsubscribe attempt against a link.
///
/// The orchestrator depends on this trait rather than the concrete HTTP
/// implementation so batch logic can be exercised without a network.
#[async_trait]
pub trait LinkExecutor: Send + Sync {
    /// Attempts to unsubscribe via `link`.
    ///
    /// Implementations report expected failures (timeouts, rejections,
    /// unconfirmed pages) inside the `Ok` result; `Err` is reserved for
    /// faults the executor itself did not anticipate.
    async fn attempt(&self, link: &str) -> Result<AttemptResult>;
}

/// The production executor.
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    /// Creates an executor with the default 10 second timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates an executor with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn attempt_link(&self, link: &str) -> AttemptResult {
        let link = link.trim();
        let lower = link.to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            // mailto and friends need a human; the caller surfaces them.
            return AttemptResult::failure(link, format!("Not an actionable HTTP link: {link}"));
        }

        let url = match Url::parse(link) {
            Ok(url) => url,
            Err(e) => return AttemptResult::failure(link, format!("Invalid URL: {e}")),
        };

        if is_vendor_link(&url) {
            return self.sendgrid_unsubscribe(&url, link).await;
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return AttemptResult::failure(link, format!("Request error: {e}")),
        };

        let final_url = response.url().to_string();
        let redirect_info = if final_url != link {
            format!(" (redirected from {link})")
        } else {
            String::new()
        };

        let status = response.status();
        if status != StatusCode::OK {
            return AttemptResult::failure(
                link,
                format!("Request failed with status code {status}{redirect_info}"),
            )
            .with_final_url(final_url);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return AttemptResult::failure(link, format!("Failed to read response body: {e}"))
                    .with_final_url(final_url)
            }
        };

        if classifier::is_confirmed(&body) {
            return AttemptResult::success(link, format!("Successfully unsubscribed{redirect_info}"))
                .with_final_url(final_url);
        }

        if forms::submit_unsubscribe_form(&self.client, &body, &final_url).await {
            return AttemptResult::success(
                link,
                format!("Unsubscribe form submitted{redirect_info}"),
            )
            .with_final_url(final_url);
        }

        AttemptResult::failure(
            link,
            format!(
                "Unsubscribe confirmation not detected{redirect_info}; \
                 you may need to finish manually: {final_url}"
            ),
        )
        .with_final_url(final_url)
    }

    /// SendGrid opt-out endpoints ignore plain GETs; they expect the link's
    /// query parameters re-posted as form data with a confirmation field.
    async fn sendgrid_unsubscribe(&self, url: &Url, link: &str) -> AttemptResult {
        let mut fields: Vec<(String, String)> = Vec::new();
        for (key, value) in url.query_pairs() {
            let key = key.into_owned();
            // First value wins when a key repeats.
            if fields.iter().any(|(k, _)| *k == key) {
                continue;
            }
            fields.push((key, value.into_owned()));
        }
        fields.push(("unsub_confirm".to_string(), "1".to_string()));
        fields.push(("submit".to_string(), "Unsubscribe".to_string()));

        let mut endpoint = url.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        let origin = url.origin().ascii_serialization();

        let response = match self
            .client
            .post(endpoint)
            .header(ORIGIN, origin)
            .header(REFERER, link)
            .form(&fields)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return AttemptResult::failure(link, format!("SendGrid unsubscribe error: {e}"))
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();
        if status != StatusCode::OK {
            return AttemptResult::failure(
                link,
                format!("SendGrid unsubscribe failed with status {status}"),
            )
            .with_final_url(final_url);
        }

        let body = response.text().await.unwrap_or_default().to_lowercase();
        if VENDOR_SUCCESS_TERMS.iter().any(|t| body.contains(t)) {
            AttemptResult::success(link, "Successfully unsubscribed from SendGrid")
                .with_final_url(final_url)
        } else {
            AttemptResult::failure(link, "SendGrid unsubscribe response not confirmed")
                .with_final_url(final_url)
        }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkExecutor for HttpExecutor {
    async fn attempt(&self, link: &str) -> Result<AttemptResult> {
        Ok(self.attempt_link(link).await)
    }
}

fn is_vendor_link(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        VENDOR_UNSUBSCRIBE_DOMAINS
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mailto_link_is_rejected_without_network() {
        let executor = HttpExecutor::new();
        let result = executor
            .attempt("mailto:leave@list.example?subject=unsubscribe")
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.message.contains("Not an actionable HTTP link"));
        assert!(result.final_url.is_none());
    }

    #[tokio::test]
    async fn garbage_link_is_rejected_without_network() {
        let executor = HttpExecutor::new();
        let result = executor.attempt("not a link at all").await.unwrap();

        assert!(!result.success);
    }

    #[tokio::test]
    async fn malformed_http_url_is_rejected() {
        let executor = HttpExecutor::new();
        let result = executor.attempt("http://").await.unwrap();

        assert!(!result.success);
        assert!(result.message.contains("Invalid URL"));
    }

    #[test]
    fn vendor_host_detection() {
        let yes = |s: &str| is_vendor_link(&Url::parse(s).unwrap());
        assert!(yes("https://sendgrid.net/wf/unsubscribe?id=1"));
        assert!(yes("https://links.sendgrid.com/unsub?u=2"));
        assert!(!yes("https://example.com/unsubscribe"));
        // Substring of another host must not count as a vendor match.
        assert!(!yes("https://notsendgrid.net/unsubscribe"));
    }

    #[test]
    fn browser_headers_include_user_agent() {
        let headers = browser_headers();
        assert!(headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
        assert!(headers.get("dnt").is_some());
    }
}
