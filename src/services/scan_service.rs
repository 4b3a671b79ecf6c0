//! Promotional sender discovery.
//!
//! Scans the promotions category for mail from senders we have not seen
//! yet, collecting one representative message per sender for the preview
//! list. Only message metadata is fetched here; full bodies are pulled
//! later, and only for the senders the user actually selects.

use std::collections::HashSet;

use crate::domain::{Address, MessageId};
use crate::providers::{MailStore, Result};

/// Search query selecting stale promotional mail.
pub const PROMOTIONS_QUERY: &str =
    "category:promotions older_than:14d -category:updates -category:social -category:forums";

/// Page size for the initial ID sweep.
const SCAN_PAGE_SIZE: u32 = 100;

/// One unique sender discovered during a scan.
#[derive(Debug, Clone)]
pub struct SenderRow {
    /// The message this sender was discovered through.
    pub message_id: MessageId,
    /// Parsed sender address.
    pub sender: Address,
    /// Subject of the representative message.
    pub subject: Option<String>,
    /// Raw `Date` header of the representative message.
    pub date: Option<String>,
}

/// Service for discovering promotional senders.
pub struct ScanService<M> {
    store: M,
}

impl<M: MailStore> ScanService<M> {
    /// Creates a new scan service over a mail store.
    pub fn new(store: M) -> Self {
        Self { store }
    }

    /// Collects up to `max_senders` unique promotional senders.
    ///
    /// Scans at most `max_to_scan` messages, newest first. A message that
    /// fails to load is logged and skipped rather than failing the scan.
    pub async fn promotional_senders(
        &self,
        max_senders: usize,
        max_to_scan: usize,
    ) -> Result<Vec<SenderRow>> {
        let mut rows: Vec<SenderRow> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut scanned = 0usize;

        tracing::info!(max_senders, max_to_scan, "scanning promotional mail");

        loop {
            let remaining = max_to_scan.saturating_sub(scanned);
            if remaining == 0 || rows.len() >= max_senders {
                break;
            }

            let page = self
                .store
                .search(
                    PROMOTIONS_QUERY,
                    SCAN_PAGE_SIZE.min(remaining as u32),
                    page_token.as_deref(),
                )
                .await?;

            if page.ids.is_empty() {
                break;
            }

            for id in &page.ids {
                if scanned >= max_to_scan || rows.len() >= max_senders {
                    return Ok(rows);
                }
                scanned += 1;

                let message = match self.store.fetch_metadata(id).await {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(message_id = %id, error = %e, "skipping unreadable message");
                        continue;
                    }
                };

                let Some(sender) = message.sender() else {
                    continue;
                };
                if sender.email.is_empty() || !seen.insert(sender.email.clone()) {
                    continue;
                }

                rows.push(SenderRow {
                    message_id: id.clone(),
                    sender,
                    subject: message.header("Subject").map(str::to_string),
                    date: message.header("Date").map(str::to_string),
                });
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::info!(senders = rows.len(), scanned, "promotional scan finished");
        Ok(rows)
    }
}
