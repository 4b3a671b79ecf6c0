//! Mail store trait definition.
//!
//! This module defines the [`MailStore`] trait which abstracts the mailbox
//! backend the pipeline reads from and deletes through. The core never
//! implements pagination, auth, or querying itself; it only consumes the
//! message shape a backend hands it.

use async_trait::async_trait;

use crate::domain::{EmailMessage, MessageId};

/// Result type alias for mail store operations.
pub type Result<T> = std::result::Result<T, MailStoreError>;

/// Errors that can occur during mail store operations.
#[derive(Debug, thiserror::Error)]
pub enum MailStoreError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// One page of a message search.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    /// Message IDs on this page, in result order.
    pub ids: Vec<MessageId>,
    /// Opaque cursor for the next page, if more results exist.
    pub next_page_token: Option<String>,
}

/// Trait for mailbox backends.
///
/// Implementations handle authentication, search pagination, message
/// retrieval, and batched deletion. All methods are async and return
/// [`Result`] to surface backend-specific errors.
#[async_trait]
pub trait MailStore: Send + Sync {
    /// Searches for messages matching a query.
    ///
    /// # Arguments
    ///
    /// * `query` - Backend query string (e.g. `from:x@y.com`)
    /// * `max_results` - Page size cap; backends may clamp it further
    /// * `page_token` - Cursor from a previous page, if continuing
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<MessagePage>;

    /// Fetches a complete message including its body tree.
    async fn fetch_message(&self, id: &MessageId) -> Result<EmailMessage>;

    /// Fetches a message's headers only (no body).
    ///
    /// Cheaper than [`fetch_message`](Self::fetch_message) when only sender
    /// or subject information is needed.
    async fn fetch_metadata(&self, id: &MessageId) -> Result<EmailMessage>;

    /// Permanently deletes a batch of messages.
    async fn batch_delete(&self, ids: &[MessageId]) -> Result<()>;
}

#[async_trait]
impl<T: MailStore + ?Sized> MailStore for std::sync::Arc<T> {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<MessagePage> {
        (**self).search(query, max_results, page_token).await
    }

    async fn fetch_message(&self, id: &MessageId) -> Result<EmailMessage> {
        (**self).fetch_message(id).await
    }

    async fn fetch_metadata(&self, id: &MessageId) -> Result<EmailMessage> {
        (**self).fetch_metadata(id).await
    }

    async fn batch_delete(&self, ids: &[MessageId]) -> Result<()> {
        (**self).batch_delete(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let auth = MailStoreError::Authentication("token expired".to_string());
        assert_eq!(auth.to_string(), "authentication failed: token expired");

        let rate = MailStoreError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(rate.to_string().contains("rate limit"));

        let missing = MailStoreError::NotFound("msg-1".to_string());
        assert!(missing.to_string().contains("not found"));
    }

    #[test]
    fn message_page_default_is_empty() {
        let page = MessagePage::default();
        assert!(page.ids.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
