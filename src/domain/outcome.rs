//! Outcome types for unsubscribe attempts and batch runs.
//!
//! The loosely-shaped result dictionaries of ad-hoc unsubscribe scripts are
//! modeled here as a closed status enum with fixed fields, so every consumer
//! is checked exhaustively against the full taxonomy.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single executor invocation against one link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Whether the unsubscribe was confirmed (or the fallback accepted).
    pub success: bool,
    /// Human-readable explanation of what happened.
    pub message: String,
    /// Final URL after redirects, when a request was actually made.
    pub final_url: Option<String>,
    /// The link this attempt was made against.
    pub link: String,
}

impl AttemptResult {
    /// Creates a successful result.
    pub fn success(link: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            final_url: None,
            link: link.into(),
        }
    }

    /// Creates a failed result.
    pub fn failure(link: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            final_url: None,
            link: link.into(),
        }
    }

    /// Attaches the post-redirect URL.
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }
}

/// Status of a per-sender outcome record.
///
/// Within one batch run a record only ever moves forward: once it leaves
/// `Pending` it never returns there, and conflicting terminal results for
/// the same sender collapse into `PartialFailure` instead of overwriting
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Record created, attempt not yet resolved.
    Pending,
    /// Dry-run mode; no network attempt was made.
    DryRun,
    /// The unsubscribe attempt was confirmed.
    Success,
    /// Mixed results across multiple links for the same sender.
    PartialFailure,
    /// The attempt completed but did not succeed.
    Failed,
    /// The executor faulted unexpectedly.
    Error,
    /// The pair was not attempted (blank link or duplicate).
    Skipped,
}

impl OutcomeStatus {
    /// Whether this status counts as resolved (no further transition expected).
    pub fn is_terminal(self) -> bool {
        !matches!(self, OutcomeStatus::Pending)
    }

    /// Whether this status represents a completed-but-unsuccessful attempt.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            OutcomeStatus::PartialFailure | OutcomeStatus::Failed | OutcomeStatus::Error
        )
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeStatus::Pending => "pending",
            OutcomeStatus::DryRun => "dry_run",
            OutcomeStatus::Success => "success",
            OutcomeStatus::PartialFailure => "partial_failure",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Error => "error",
            OutcomeStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Aggregated per-sender record for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderOutcome {
    /// Current status.
    pub status: OutcomeStatus,
    /// Human-readable message for the latest transition.
    pub message: String,
    /// The link used for the attempt, if any.
    pub link: Option<String>,
    /// When this record last changed.
    pub updated_at: DateTime<Utc>,
}

impl SenderOutcome {
    /// Creates a freshly-opened record.
    pub fn pending() -> Self {
        Self {
            status: OutcomeStatus::Pending,
            message: "Processing not started".to_string(),
            link: None,
            updated_at: Utc::now(),
        }
    }

    /// Creates a record directly in a terminal state.
    pub fn resolved(
        status: OutcomeStatus,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            link,
            updated_at: Utc::now(),
        }
    }

    /// Applies a new result to this record, enforcing monotonicity.
    ///
    /// A `Pending` record takes the new status wholesale. A terminal record
    /// that sees a conflicting terminal result (success after failure, or
    /// failure after success) becomes `PartialFailure`; agreeing results
    /// just refresh the message. `Skipped` and `DryRun` never downgrade an
    /// already-resolved record.
    pub fn absorb(&mut self, status: OutcomeStatus, message: String, link: Option<String>) {
        let next = match (self.status, status) {
            (OutcomeStatus::Pending, new) => new,
            // Once results are mixed they stay mixed.
            (OutcomeStatus::PartialFailure, _) => OutcomeStatus::PartialFailure,
            (OutcomeStatus::Success, new) if new.is_failure() => OutcomeStatus::PartialFailure,
            (old, OutcomeStatus::Success) if old.is_failure() => OutcomeStatus::PartialFailure,
            (old, OutcomeStatus::Skipped | OutcomeStatus::DryRun) if old.is_terminal() => old,
            (_, new) => new,
        };

        if next != self.status || next == status {
            self.message = message;
        }
        if link.is_some() {
            self.link = link;
        }
        self.status = next;
        self.updated_at = Utc::now();
    }
}

/// Summary counts for one batch run, for logging and reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total outcome records produced (including duplicate-marked ones).
    pub processed: usize,
    /// Records that resolved as `Success`.
    pub succeeded: usize,
    /// Records skipped without an attempt.
    pub skipped: usize,
    /// Records that resolved as `Failed`, `Error`, or `PartialFailure`.
    pub failed: usize,
    /// Records left in `DryRun`.
    pub dry_run: usize,
}

impl BatchSummary {
    /// Computes summary counts over a set of outcomes.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a SenderOutcome>,
    {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.processed += 1;
            match outcome.status {
                OutcomeStatus::Success => summary.succeeded += 1,
                OutcomeStatus::Skipped => summary.skipped += 1,
                OutcomeStatus::DryRun => summary.dry_run += 1,
                s if s.is_failure() => summary.failed += 1,
                _ => {}
            }
        }
        summary
    }
}

/// Input to one batch orchestration call.
///
/// `links` and `senders` pair up positionally and must be equal length;
/// an unbalanced request is rejected outright with no partial processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Unsubscribe links, one per sender.
    pub links: Vec<String>,
    /// Sender addresses, parallel to `links`.
    pub senders: Vec<String>,
    /// When set, report what would happen without any network attempts.
    pub dry_run: bool,
}

impl BatchRequest {
    /// Creates a new batch request.
    pub fn new(links: Vec<String>, senders: Vec<String>, dry_run: bool) -> Self {
        Self {
            links,
            senders,
            dry_run,
        }
    }

    /// Whether the two sequences pair up one-to-one.
    pub fn is_balanced(&self) -> bool {
        self.links.len() == self.senders.len()
    }
}

/// Result of one batch orchestration call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Per-sender outcomes, keyed by sender address.
    ///
    /// Repeated `(sender, link)` pairs are recorded under a key annotated
    /// as a duplicate so they never overwrite the primary record.
    pub outcomes: HashMap<String, SenderOutcome>,
    /// Aggregate counts over `outcomes`.
    pub summary: BatchSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_record_takes_any_status() {
        let mut outcome = SenderOutcome::pending();
        outcome.absorb(OutcomeStatus::Success, "done".into(), Some("l".into()));
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.message, "done");
        assert_eq!(outcome.link.as_deref(), Some("l"));
    }

    #[test]
    fn success_then_failure_is_partial() {
        let mut outcome =
            SenderOutcome::resolved(OutcomeStatus::Success, "ok", Some("l1".into()));
        outcome.absorb(OutcomeStatus::Failed, "second link failed".into(), Some("l2".into()));
        assert_eq!(outcome.status, OutcomeStatus::PartialFailure);
    }

    #[test]
    fn failure_then_success_is_partial() {
        let mut outcome = SenderOutcome::resolved(OutcomeStatus::Failed, "no", Some("l1".into()));
        outcome.absorb(OutcomeStatus::Success, "second link worked".into(), Some("l2".into()));
        assert_eq!(outcome.status, OutcomeStatus::PartialFailure);
    }

    #[test]
    fn partial_failure_is_sticky() {
        let mut outcome =
            SenderOutcome::resolved(OutcomeStatus::PartialFailure, "mixed", None);
        outcome.absorb(OutcomeStatus::Failed, "third link failed".into(), None);
        assert_eq!(outcome.status, OutcomeStatus::PartialFailure);
    }

    #[test]
    fn terminal_record_never_regresses_to_pending() {
        let mut outcome = SenderOutcome::resolved(OutcomeStatus::Success, "ok", None);
        outcome.absorb(OutcomeStatus::Skipped, "dup".into(), None);
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert!(outcome.status.is_terminal());
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(OutcomeStatus::DryRun.to_string(), "dry_run");
        assert_eq!(OutcomeStatus::PartialFailure.to_string(), "partial_failure");

        let json = serde_json::to_string(&OutcomeStatus::DryRun).unwrap();
        assert_eq!(json, "\"dry_run\"");
    }

    #[test]
    fn summary_counts_by_status() {
        let outcomes = vec![
            SenderOutcome::resolved(OutcomeStatus::Success, "", None),
            SenderOutcome::resolved(OutcomeStatus::Failed, "", None),
            SenderOutcome::resolved(OutcomeStatus::Error, "", None),
            SenderOutcome::resolved(OutcomeStatus::Skipped, "", None),
            SenderOutcome::resolved(OutcomeStatus::DryRun, "", None),
        ];

        let summary = BatchSummary::from_outcomes(outcomes.iter());
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.dry_run, 1);
    }

    #[test]
    fn attempt_result_builders() {
        let result = AttemptResult::failure("https://x.com/u", "confirmation not detected")
            .with_final_url("https://x.com/u/final");
        assert!(!result.success);
        assert_eq!(result.final_url.as_deref(), Some("https://x.com/u/final"));
    }
}
