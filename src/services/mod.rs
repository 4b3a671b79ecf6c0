//! Business services layer.
//!
//! Services coordinate the unsubscribe pipeline, mailbox providers, and
//! local storage:
//!
//! ```text
//! CLI
//!  |
//!  v
//! Services  <-- you are here
//!  |
//!  v
//! Providers / Unsubscribe pipeline / Storage
//! ```
//!
//! - [`BatchProcessor`]: sequences unsubscribe attempts and aggregates outcomes
//! - [`ScanService`]: discovers promotional senders
//! - [`CleanupService`]: bulk-deletes a sender's mail
//! - [`ActivityService`]: fire-and-forget usage counters

mod activity_service;
mod batch_service;
mod cleanup_service;
mod scan_service;

pub use activity_service::{ActivityError, ActivityRecorder, ActivityService};
pub use batch_service::{
    BatchError, BatchEvent, BatchObserver, BatchProcessor, TracingObserver,
};
pub use cleanup_service::{CleanupReport, CleanupService, DELETE_CHUNK_SIZE, SENDER_PAGE_SIZE};
pub use scan_service::{ScanService, SenderRow, PROMOTIONS_QUERY};
