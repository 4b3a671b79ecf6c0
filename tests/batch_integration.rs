//! Integration tests for the unsubscribe pipeline.
//!
//! These tests verify the documented end-to-end properties across module
//! boundaries: extraction into candidates, batch orchestration over an
//! executor, and outcome aggregation. Each module contains its own unit
//! tests for detailed logic.

use async_trait::async_trait;
use base64::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sweep::domain::{
    AttemptResult, BodyPart, EmailMessage, Header, LinkKind, LinkSource, MessageId, OutcomeStatus,
};
use sweep::services::BatchProcessor;
use sweep::unsubscribe::{self, LinkExecutor};

// ============================================================================
// Test Executor
// ============================================================================

/// Executor that succeeds for every link and counts network attempts.
#[derive(Default)]
struct CountingExecutor {
    calls: AtomicUsize,
}

#[async_trait]
impl LinkExecutor for CountingExecutor {
    async fn attempt(&self, link: &str) -> anyhow::Result<AttemptResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AttemptResult::success(link, "unsubscribed"))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn b64(content: &str) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(content.as_bytes())
}

// ============================================================================
// Extraction Properties
// ============================================================================

#[test]
fn list_unsubscribe_header_yields_both_links_and_skips_body() {
    let message = EmailMessage {
        id: MessageId::from("m1"),
        snippet: String::new(),
        headers: vec![Header::new(
            "List-Unsubscribe",
            "<https://a.com/x>, <mailto:y@z.com?subject=unsubscribe>",
        )],
        body: Some(BodyPart::leaf(
            "text/html",
            b64(r#"<a href="https://body.example/unsubscribe">u</a>"#),
        )),
    };

    let candidates = unsubscribe::extract(&message);

    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.source == LinkSource::Header));
    assert_eq!(candidates[0].link, "https://a.com/x");
    assert_eq!(candidates[1].kind, LinkKind::Mailto);
}

#[test]
fn html_body_anchor_becomes_body_html_candidate() {
    let message = EmailMessage {
        id: MessageId::from("m2"),
        snippet: String::new(),
        headers: vec![Header::new("From", "Acme <deals@acme.example>")],
        body: Some(BodyPart::leaf(
            "text/html",
            b64(r#"<a href="https://x.com/optout?id=1">Unsubscribe</a>"#),
        )),
    };

    let candidates = unsubscribe::extract(&message);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].link, "https://x.com/optout?id=1");
    assert_eq!(candidates[0].source, LinkSource::BodyHtml);
    assert_eq!(candidates[0].kind, LinkKind::Http);
}

// ============================================================================
// Classifier Properties
// ============================================================================

#[test]
fn success_wording_confirms() {
    assert!(unsubscribe::is_confirmed(
        "<p>You have been successfully unsubscribed</p>"
    ));
}

#[test]
fn negative_pattern_beats_success_wording() {
    assert!(!unsubscribe::is_confirmed(
        "<p>You have been successfully unsubscribed. \
         Please confirm your unsubscription by clicking below.</p>"
    ));
}

// ============================================================================
// Batch Orchestration Properties
// ============================================================================

#[tokio::test]
async fn valid_batch_produces_one_outcome_per_sender() {
    let processor = BatchProcessor::new(CountingExecutor::default());
    let senders = strings(&["s1@example.com", "s2@example.com", "s3@example.com"]);
    let links = strings(&[
        "https://a.com/unsub",
        "https://b.com/unsub",
        "https://c.com/unsub",
    ]);

    let report = processor.process(&links, &senders, false).await.unwrap();

    assert_eq!(report.outcomes.len(), senders.len());
    for sender in &senders {
        assert!(report.outcomes.contains_key(sender), "missing {sender}");
    }
}

#[tokio::test]
async fn length_mismatch_yields_error_and_zero_records() {
    let processor = BatchProcessor::new(CountingExecutor::default());

    let result = processor
        .process(
            &strings(&["https://a.com/unsub", "https://b.com/unsub"]),
            &strings(&["s1@example.com"]),
            false,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(processor_calls(&processor), 0);
}

#[tokio::test]
async fn dry_run_makes_no_network_calls_and_marks_everything_dry_run() {
    let processor = BatchProcessor::new(CountingExecutor::default());
    let links = strings(&["https://example.com/unsub/1", "https://example.com/unsub/2"]);
    let senders = strings(&["s1@example.com", "s2@example.com"]);

    let report = processor.process(&links, &senders, true).await.unwrap();

    assert_eq!(processor_calls(&processor), 0);
    assert_eq!(report.outcomes.len(), 2);
    assert!(report
        .outcomes
        .values()
        .all(|o| o.status == OutcomeStatus::DryRun));
}

#[tokio::test]
async fn whitespace_link_is_skipped_in_both_modes() {
    for dry_run in [false, true] {
        let processor = BatchProcessor::new(CountingExecutor::default());
        let report = processor
            .process(
                &strings(&["", "https://a.com/unsub"]),
                &strings(&["empty@example.com", "ok@example.com"]),
                dry_run,
            )
            .await
            .unwrap();

        assert_eq!(
            report.outcomes["empty@example.com"].status,
            OutcomeStatus::Skipped,
            "dry_run={dry_run}"
        );
    }
}

#[tokio::test]
async fn duplicate_pair_gets_distinct_key_and_original_is_untouched() {
    let processor = BatchProcessor::new(CountingExecutor::default());
    let links = strings(&["https://a.com/unsub", "https://a.com/unsub"]);
    let senders = strings(&["s1@example.com", "s1@example.com"]);

    let report = processor.process(&links, &senders, false).await.unwrap();

    assert_eq!(processor_calls(&processor), 1);
    assert_eq!(
        report.outcomes["s1@example.com"].status,
        OutcomeStatus::Success
    );
    let duplicate = report
        .outcomes
        .iter()
        .find(|(key, _)| key.contains("duplicate"))
        .expect("duplicate-marked record");
    assert_eq!(duplicate.1.status, OutcomeStatus::Skipped);
}

// ============================================================================
// Extraction + Orchestration Combined
// ============================================================================

#[tokio::test]
async fn extracted_links_flow_through_batch() {
    let message = EmailMessage {
        id: MessageId::from("m3"),
        snippet: String::new(),
        headers: vec![],
        body: Some(BodyPart::container(
            "multipart/alternative",
            vec![
                BodyPart::leaf("text/plain", b64("visit https://x.com/unsubscribe?u=1")),
                BodyPart::leaf(
                    "text/html",
                    b64(r#"<a href="https://x.com/unsubscribe?u=1">u</a>"#),
                ),
            ],
        )),
    };

    let candidates = unsubscribe::extract(&message);
    assert_eq!(candidates.len(), 1, "same link found twice must dedup");

    let links = strings(&[candidates[0].link.as_str()]);
    let senders = strings(&["x@example.com"]);

    let executor = Arc::new(CountingExecutor::default());
    let processor = BatchProcessor::new(SharedExecutor(executor.clone()));
    let report = processor.process(&links, &senders, false).await.unwrap();

    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        report.outcomes["x@example.com"].status,
        OutcomeStatus::Success
    );
    assert_eq!(
        report.outcomes["x@example.com"].link.as_deref(),
        Some("https://x.com/unsubscribe?u=1")
    );
}

/// Wrapper so a test can keep a handle on the executor it hands over.
struct SharedExecutor(Arc<CountingExecutor>);

#[async_trait]
impl LinkExecutor for SharedExecutor {
    async fn attempt(&self, link: &str) -> anyhow::Result<AttemptResult> {
        self.0.attempt(link).await
    }
}

fn processor_calls(processor: &BatchProcessor<CountingExecutor>) -> usize {
    processor.executor().calls.load(Ordering::SeqCst)
}
