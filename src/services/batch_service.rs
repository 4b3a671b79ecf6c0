//! Batch orchestration of unsubscribe attempts.
//!
//! Sequences `(link, sender)` pairs through the executor one at a time,
//! deduplicating repeats and aggregating a per-sender outcome map. The
//! only hard failure is the input precondition; everything underneath is
//! caught and recorded so one hostile endpoint never sinks the batch.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::domain::{BatchReport, BatchRequest, BatchSummary, OutcomeStatus, SenderOutcome};
use crate::unsubscribe::LinkExecutor;

/// Errors that fail a whole batch before any pair is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The links and senders sequences differ in length.
    #[error("mismatched batch input: {links} links for {senders} senders")]
    LengthMismatch {
        /// Number of links supplied.
        links: usize,
        /// Number of senders supplied.
        senders: usize,
    },
}

/// Structured events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A batch began processing.
    Started {
        /// Number of `(link, sender)` pairs in the batch.
        pairs: usize,
        /// Whether this is a dry run.
        dry_run: bool,
    },
    /// A network attempt is about to start for a pair.
    AttemptStarted {
        /// Sender being unsubscribed from.
        sender: String,
        /// Link being attempted.
        link: String,
    },
    /// An outcome record was created or updated.
    OutcomeRecorded {
        /// Key the record lives under (sender, possibly duplicate-marked).
        key: String,
        /// Status after this update.
        status: OutcomeStatus,
        /// Message attached to the update.
        message: String,
    },
    /// The batch finished; summary counts are final.
    Completed {
        /// Aggregate counts over all records.
        summary: BatchSummary,
    },
}

/// Observability sink for batch processing.
///
/// Injected into the processor so the core carries no process-wide logging
/// state; the default sink forwards to `tracing`.
pub trait BatchObserver: Send + Sync {
    /// Called for every event, in processing order.
    fn on_event(&self, event: &BatchEvent);
}

/// Default observer that logs events through `tracing`.
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_event(&self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { pairs, dry_run } => {
                tracing::info!(pairs, dry_run, "unsubscribe batch started");
            }
            BatchEvent::AttemptStarted { sender, link } => {
                tracing::info!(%sender, %link, "attempting unsubscribe");
            }
            BatchEvent::OutcomeRecorded { key, status, message } => match status {
                OutcomeStatus::Success | OutcomeStatus::DryRun => {
                    tracing::info!(sender = %key, %status, %message, "outcome recorded");
                }
                _ => {
                    tracing::warn!(sender = %key, %status, %message, "outcome recorded");
                }
            },
            BatchEvent::Completed { summary } => {
                tracing::info!(
                    processed = summary.processed,
                    succeeded = summary.succeeded,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    dry_run = summary.dry_run,
                    "unsubscribe batch completed"
                );
            }
        }
    }
}

/// Sequences unsubscribe attempts and aggregates their outcomes.
pub struct BatchProcessor<E> {
    executor: E,
    observer: Box<dyn BatchObserver>,
}

impl<E: LinkExecutor> BatchProcessor<E> {
    /// Creates a processor that logs through [`TracingObserver`].
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            observer: Box::new(TracingObserver),
        }
    }

    /// Creates a processor with a custom observability sink.
    pub fn with_observer(executor: E, observer: Box<dyn BatchObserver>) -> Self {
        Self { executor, observer }
    }

    /// Returns the executor this processor drives.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Processes a [`BatchRequest`].
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchReport, BatchError> {
        self.process(&request.links, &request.senders, request.dry_run)
            .await
    }

    /// Processes `(link, sender)` pairs in input order.
    ///
    /// Pairs are resolved fully (including network I/O) one at a time. A
    /// blank link or a repeated pair is recorded as skipped without any
    /// network call; with `dry_run` set nothing touches the network at all.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::LengthMismatch`] when the two slices differ in
    /// length; no per-sender records are produced in that case.
    pub async fn process(
        &self,
        links: &[String],
        senders: &[String],
        dry_run: bool,
    ) -> Result<BatchReport, BatchError> {
        if links.len() != senders.len() {
            return Err(BatchError::LengthMismatch {
                links: links.len(),
                senders: senders.len(),
            });
        }

        self.observer.on_event(&BatchEvent::Started {
            pairs: links.len(),
            dry_run,
        });

        let mut outcomes: HashMap<String, SenderOutcome> = HashMap::new();
        // Dedup set is local to this call; nothing survives the batch.
        let mut processed_pairs: HashSet<(String, String)> = HashSet::new();
        let mut duplicate_counts: HashMap<String, usize> = HashMap::new();

        for (link, sender) in links.iter().zip(senders) {
            let link = link.trim();

            if link.is_empty() {
                self.record(
                    &mut outcomes,
                    sender.clone(),
                    OutcomeStatus::Skipped,
                    format!("No unsubscribe link available for {sender}"),
                    None,
                );
                continue;
            }

            if !processed_pairs.insert((sender.clone(), link.to_string())) {
                let count = duplicate_counts.entry(sender.clone()).or_insert(0);
                *count += 1;
                let key = if *count == 1 {
                    format!("{sender} (duplicate)")
                } else {
                    format!("{sender} (duplicate {count})")
                };
                self.record(
                    &mut outcomes,
                    key,
                    OutcomeStatus::Skipped,
                    format!("Duplicate unsubscribe request for {sender} via {link}"),
                    Some(link.to_string()),
                );
                continue;
            }

            if dry_run {
                self.record(
                    &mut outcomes,
                    sender.clone(),
                    OutcomeStatus::DryRun,
                    format!("Would attempt to unsubscribe from {sender} using {link}"),
                    Some(link.to_string()),
                );
                continue;
            }

            self.observer.on_event(&BatchEvent::AttemptStarted {
                sender: sender.clone(),
                link: link.to_string(),
            });

            match self.executor.attempt(link).await {
                Ok(result) => {
                    let (status, message) = if result.success {
                        (
                            OutcomeStatus::Success,
                            format!("Successfully unsubscribed from {sender}"),
                        )
                    } else {
                        (
                            OutcomeStatus::Failed,
                            format!("Failed to unsubscribe from {sender}: {}", result.message),
                        )
                    };
                    self.record(&mut outcomes, sender.clone(), status, message, Some(link.to_string()));
                }
                Err(e) => {
                    self.record(
                        &mut outcomes,
                        sender.clone(),
                        OutcomeStatus::Error,
                        format!("Error unsubscribing from {sender}: {e}"),
                        Some(link.to_string()),
                    );
                }
            }
        }

        let summary = BatchSummary::from_outcomes(outcomes.values());
        self.observer.on_event(&BatchEvent::Completed { summary });

        Ok(BatchReport { outcomes, summary })
    }

    fn record(
        &self,
        outcomes: &mut HashMap<String, SenderOutcome>,
        key: String,
        status: OutcomeStatus,
        message: String,
        link: Option<String>,
    ) {
        let entry = outcomes
            .entry(key.clone())
            .or_insert_with(SenderOutcome::pending);
        entry.absorb(status, message.clone(), link);
        self.observer.on_event(&BatchEvent::OutcomeRecorded {
            key,
            status: entry.status,
            message,
        });
    }
}
