//! Per-sender bulk deletion.
//!
//! Lists every message from a sender (paginated at the API's 500-per-page
//! cap) and deletes them through the batch endpoint in chunks of 1000.
//! Chunk failures are collected rather than fatal, so a transient error
//! mid-way still deletes everything it can.

use crate::domain::MessageId;
use crate::providers::{MailStore, Result};

/// Gmail's cap on IDs per batchDelete call.
pub const DELETE_CHUNK_SIZE: usize = 1000;

/// Page size for sender message listing (API maximum per page).
pub const SENDER_PAGE_SIZE: u32 = 500;

/// Result of one per-sender cleanup run.
#[derive(Debug, Clone)]
pub struct CleanupReport {
    /// Sender the run targeted.
    pub sender: String,
    /// Messages found for the sender.
    pub matched: usize,
    /// Messages actually deleted (equals `matched` on a clean run).
    pub deleted: usize,
    /// Errors encountered per chunk, if any.
    pub errors: Vec<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl CleanupReport {
    /// Whether the run completed without chunk errors.
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary line.
    pub fn message(&self) -> String {
        if self.dry_run {
            format!(
                "Would delete {} messages from {} (dry run)",
                self.matched, self.sender
            )
        } else if self.matched == 0 {
            format!("No messages found from {}", self.sender)
        } else {
            format!("Deleted {} messages from {}", self.deleted, self.sender)
        }
    }
}

/// Service for deleting a sender's mail in bulk.
pub struct CleanupService<M> {
    store: M,
}

impl<M: MailStore> CleanupService<M> {
    /// Creates a new cleanup service over a mail store.
    pub fn new(store: M) -> Self {
        Self { store }
    }

    /// Collects message IDs from a sender, up to `max_messages`.
    pub async fn message_ids_for_sender(
        &self,
        sender: &str,
        max_messages: usize,
    ) -> Result<Vec<MessageId>> {
        let query = format!("from:{sender}");
        let mut ids: Vec<MessageId> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = max_messages.saturating_sub(ids.len());
            if remaining == 0 {
                break;
            }

            let page = self
                .store
                .search(
                    &query,
                    SENDER_PAGE_SIZE.min(remaining as u32),
                    page_token.as_deref(),
                )
                .await?;

            if page.ids.is_empty() {
                break;
            }

            ids.extend(page.ids.into_iter().take(remaining));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    /// Deletes all mail from a sender, chunked through the batch endpoint.
    ///
    /// With `dry_run` set, reports what would be deleted without touching
    /// anything.
    pub async fn delete_from_sender(
        &self,
        sender: &str,
        max_messages: usize,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        let ids = self.message_ids_for_sender(sender, max_messages).await?;
        let matched = ids.len();

        if dry_run || matched == 0 {
            return Ok(CleanupReport {
                sender: sender.to_string(),
                matched,
                deleted: 0,
                errors: Vec::new(),
                dry_run,
            });
        }

        let mut deleted = 0usize;
        let mut errors: Vec<String> = Vec::new();

        for (index, chunk) in ids.chunks(DELETE_CHUNK_SIZE).enumerate() {
            match self.store.batch_delete(chunk).await {
                Ok(()) => {
                    deleted += chunk.len();
                    tracing::info!(sender, deleted, "deleted message chunk");
                }
                Err(e) => {
                    let message = format!("error deleting chunk {}: {e}", index + 1);
                    tracing::error!(sender, error = %e, chunk = index + 1, "chunk delete failed");
                    errors.push(message);
                }
            }
        }

        Ok(CleanupReport {
            sender: sender.to_string(),
            matched,
            deleted,
            errors,
            dry_run: false,
        })
    }
}
