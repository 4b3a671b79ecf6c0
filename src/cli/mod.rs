//! Interactive terminal menu.
//!
//! Thin glue over the services: scan for promotional senders, let the
//! user pick some by sequence number, then unsubscribe and/or delete.
//! All real logic lives below this layer.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{default_activity_db_path, Settings};
use crate::domain::UnsubscribeCandidate;
use crate::providers::{GmailStore, MailStore};
use crate::services::{
    ActivityService, BatchProcessor, CleanupService, ScanService, SenderRow,
};
use crate::storage::ActivityStore;
use crate::unsubscribe::{self, HttpExecutor};

const BANNER: &str = "=== Gmail Unsubscriber & Cleaner ===";

/// How many recent messages to check per sender when hunting for a link.
const LINK_LOOKUP_LIMIT: u32 = 5;

/// Cap on messages deleted per sender in one run.
const DELETE_CAP: usize = 10_000;

/// Top-level menu actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Unsubscribe from selected senders only.
    Unsubscribe,
    /// Delete mail from selected senders only.
    Delete,
    /// Unsubscribe, then delete.
    Both,
    /// Exit the program.
    Quit,
}

/// Parses a menu choice.
pub fn parse_action(input: &str) -> Option<Action> {
    match input.trim() {
        "1" => Some(Action::Unsubscribe),
        "2" => Some(Action::Delete),
        "3" => Some(Action::Both),
        "4" => Some(Action::Quit),
        _ => None,
    }
}

/// Result of parsing a sequence-number selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The user asked to cancel.
    Quit,
    /// Select every listed sender.
    All,
    /// Individually chosen indices (1-based), with rejected tokens.
    Indices {
        /// Valid indices in input order.
        valid: Vec<usize>,
        /// Tokens that were not usable numbers in range.
        invalid: Vec<String>,
    },
}

/// Parses user input like `"1 3 5"`, `"all"`, or `"quit"`.
///
/// Out-of-range and non-numeric tokens are reported back rather than
/// silently dropped; valid tokens are still usable alongside them.
pub fn parse_selection(input: &str, max_index: usize) -> Selection {
    let input = input.trim().to_lowercase();

    if input == "all" {
        return Selection::All;
    }
    if input == "quit" {
        return Selection::Quit;
    }

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for token in input.split_whitespace() {
        match token.parse::<usize>() {
            Ok(n) if (1..=max_index).contains(&n) => valid.push(n),
            _ => invalid.push(token.to_string()),
        }
    }

    Selection::Indices { valid, invalid }
}

/// Runs the interactive menu loop until the user quits.
pub async fn run(settings: Settings) -> Result<()> {
    println!("{BANNER}");

    let mut store = GmailStore::new(settings.user_id.clone());
    store
        .authenticate()
        .await
        .context("Gmail authentication failed; check stored credentials")?;

    let account_email = match store.profile_email().await {
        Ok(Some(email)) => {
            println!("Logged in as: {email}");
            Some(email)
        }
        Ok(None) | Err(_) => {
            println!("Could not determine account email; activity logging disabled.");
            None
        }
    };

    let store = Arc::new(store);
    let activity = open_activity_service(account_email.is_some()).await;

    if settings.unsubscribe.dry_run {
        println!("DRY RUN mode is on: no unsubscribes or deletions will be performed.");
    }

    loop {
        println!();
        println!("  1. Unsubscribe from senders");
        println!("  2. Delete emails from senders");
        println!("  3. Unsubscribe and delete (both)");
        println!("  4. Quit");

        let choice = prompt("Enter your choice (1-4): ")?;
        let Some(action) = parse_action(&choice) else {
            println!("Invalid choice. Please enter a number between 1 and 4.");
            continue;
        };

        if action == Action::Quit {
            println!("Goodbye.");
            return Ok(());
        }

        let selected = select_senders(&store, &settings).await?;
        if selected.is_empty() {
            continue;
        }

        let mut unsubscribed = 0i64;
        let mut deleted = 0i64;

        if matches!(action, Action::Unsubscribe | Action::Both) {
            unsubscribed = unsubscribe_selected(&store, &selected, &settings).await? as i64;
        }
        if matches!(action, Action::Delete | Action::Both) {
            deleted = delete_selected(&store, &selected, &settings).await? as i64;
        }

        if let Some(email) = &account_email {
            activity.record(email, unsubscribed, deleted).await;
        }
    }
}

/// Opens the activity store, degrading to a disabled service on any problem.
async fn open_activity_service(enabled: bool) -> ActivityService {
    if !enabled {
        return ActivityService::disabled();
    }
    let Some(path) = default_activity_db_path() else {
        return ActivityService::disabled();
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match ActivityStore::open(&path).await {
        Ok(store) => ActivityService::new(Box::new(store)),
        Err(e) => {
            tracing::warn!(error = %e, "activity store unavailable, logging disabled");
            ActivityService::disabled()
        }
    }
}

/// Scans for promotional senders and lets the user pick a subset.
async fn select_senders(
    store: &Arc<GmailStore>,
    settings: &Settings,
) -> Result<Vec<SenderRow>> {
    let scan = ScanService::new(store.clone());
    println!("\nFetching promotional emails...");
    let rows = scan
        .promotional_senders(settings.scan.max_senders, settings.scan.max_emails_to_scan)
        .await?;

    if rows.is_empty() {
        println!("No promotional senders found.");
        return Ok(Vec::new());
    }

    println!("\n=== Promotional senders ===");
    for (i, row) in rows.iter().enumerate() {
        println!(
            "[{}] {} | {}",
            i + 1,
            row.sender.display(),
            row.subject.as_deref().unwrap_or("(No Subject)")
        );
        if let Some(date) = &row.date {
            println!("    {date}");
        }
    }
    println!("\nEnter numbers separated by spaces (e.g. '1 3 5'), 'all', or 'quit'.");

    loop {
        let input = prompt("Enter sequence numbers: ")?;
        let (valid, invalid) = match parse_selection(&input, rows.len()) {
            Selection::Quit => {
                println!("Operation cancelled.");
                return Ok(Vec::new());
            }
            Selection::All => ((1..=rows.len()).collect::<Vec<_>>(), Vec::new()),
            Selection::Indices { valid, invalid } => (valid, invalid),
        };

        for token in &invalid {
            println!("Ignoring invalid selection: {token}");
        }
        if valid.is_empty() {
            println!("No valid selections made.");
            continue;
        }

        let chosen: Vec<SenderRow> = valid.iter().map(|&i| rows[i - 1].clone()).collect();
        println!("\nSelected {} sender(s):", chosen.len());
        for row in &chosen {
            println!("  {}", row.sender.email);
        }

        let confirm = prompt("Proceed with these senders? (yes/no): ")?;
        if confirm.eq_ignore_ascii_case("yes") {
            return Ok(chosen);
        }
        println!("Operation cancelled by user.");
        return Ok(Vec::new());
    }
}

/// Finds the best unsubscribe candidate for a sender's recent mail.
async fn find_unsubscribe_link(
    store: &Arc<GmailStore>,
    sender: &str,
) -> Result<Option<UnsubscribeCandidate>> {
    let query = format!("from:{sender} category:promotions");
    let page = store.search(&query, LINK_LOOKUP_LIMIT, None).await?;
    let Some(id) = page.ids.first() else {
        return Ok(None);
    };

    let message = store.fetch_message(id).await?;
    let candidates = unsubscribe::extract(&message);

    // Prefer something the executor can drive; fall back to mailto so the
    // user at least gets the manual option surfaced.
    let best = candidates
        .iter()
        .find(|c| c.is_actionable())
        .or_else(|| candidates.first())
        .cloned();
    Ok(best)
}

/// Unsubscribes from the selected senders; returns the success count.
async fn unsubscribe_selected(
    store: &Arc<GmailStore>,
    selected: &[SenderRow],
    settings: &Settings,
) -> Result<usize> {
    let mut links: Vec<String> = Vec::new();
    let mut senders: Vec<String> = Vec::new();

    for row in selected {
        let email = row.sender.email.clone();
        match find_unsubscribe_link(store, &email).await {
            Ok(Some(candidate)) if candidate.is_actionable() => {
                links.push(candidate.link);
                senders.push(email);
            }
            Ok(Some(candidate)) => {
                println!(
                    "Mailto unsubscribe for {email}; please send the email manually: {}",
                    candidate.link
                );
            }
            Ok(None) => {
                println!("No unsubscribe link found for {email}");
                // Recorded as skipped by the orchestrator.
                links.push(String::new());
                senders.push(email);
            }
            Err(e) => {
                println!("Error looking up unsubscribe link for {email}: {e}");
            }
        }
    }

    if senders.is_empty() {
        return Ok(0);
    }

    let executor = HttpExecutor::with_timeout(settings.unsubscribe.timeout());
    let processor = BatchProcessor::new(executor);
    let report = processor
        .process(&links, &senders, settings.unsubscribe.dry_run)
        .await?;

    let mut keys: Vec<&String> = report.outcomes.keys().collect();
    keys.sort();
    println!("\n=== Unsubscribe results ===");
    for key in keys {
        let outcome = &report.outcomes[key];
        println!("{key}: {} - {}", outcome.status, outcome.message);
    }
    println!(
        "Processed: {}, succeeded: {}, skipped: {}, failed: {}",
        report.summary.processed,
        report.summary.succeeded,
        report.summary.skipped,
        report.summary.failed
    );

    Ok(report.summary.succeeded)
}

/// Deletes mail from the selected senders; returns the total deleted.
async fn delete_selected(
    store: &Arc<GmailStore>,
    selected: &[SenderRow],
    settings: &Settings,
) -> Result<usize> {
    let cleanup = CleanupService::new(store.clone());
    let mut total = 0usize;

    for row in selected {
        let email = &row.sender.email;
        match cleanup
            .delete_from_sender(email, DELETE_CAP, settings.unsubscribe.dry_run)
            .await
        {
            Ok(report) => {
                println!("{}", report.message());
                for error in &report.errors {
                    println!("  {error}");
                }
                total += report.deleted;
            }
            Err(e) => println!("Error deleting emails from {email}: {e}"),
        }
    }

    Ok(total)
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
