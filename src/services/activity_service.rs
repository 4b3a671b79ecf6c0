//! Fire-and-forget activity recording.
//!
//! Counts unsubscribes and deletions per user for later reporting. The
//! recorder is strictly best-effort: a failure here is logged and
//! swallowed, never allowed to affect the outcome of the run that
//! produced the counts.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a recorder backend can produce.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Backend that persists cumulative activity counters.
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
    /// Adds the given deltas to the user's counters.
    async fn record(
        &self,
        user_email: &str,
        unsub_delta: i64,
        deleted_delta: i64,
    ) -> Result<(), ActivityError>;
}

/// Service wrapping an optional recorder with fire-and-forget semantics.
pub struct ActivityService {
    recorder: Option<Box<dyn ActivityRecorder>>,
}

impl ActivityService {
    /// Creates a service backed by a recorder.
    pub fn new(recorder: Box<dyn ActivityRecorder>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    /// Creates a no-op service for when recording is not configured.
    pub fn disabled() -> Self {
        Self { recorder: None }
    }

    /// Records activity deltas for a user.
    ///
    /// Negative deltas are clamped to zero and a call with nothing to
    /// record is a no-op. Recorder failures are logged, never surfaced.
    pub async fn record(&self, user_email: &str, unsub_delta: i64, deleted_delta: i64) {
        if user_email.is_empty() || (unsub_delta == 0 && deleted_delta == 0) {
            return;
        }

        let Some(recorder) = &self.recorder else {
            return;
        };

        let unsub = unsub_delta.max(0);
        let deleted = deleted_delta.max(0);

        match recorder.record(user_email, unsub, deleted).await {
            Ok(()) => {
                tracing::info!(
                    user = user_email,
                    unsubscribed = unsub,
                    deleted,
                    "activity recorded"
                );
            }
            Err(e) => {
                tracing::error!(user = user_email, error = %e, "failed to record activity");
            }
        }
    }
}
