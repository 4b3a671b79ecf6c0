//! Domain types for the unsubscribe pipeline.
//!
//! Everything here is plain data: fetched messages, discovered link
//! candidates, and the outcome records a batch run produces. Entities are
//! created fresh per invocation and discarded once the caller has consumed
//! the result; nothing in this module holds persistent state.

mod candidate;
mod message;
mod outcome;
mod types;

pub use candidate::{LinkKind, LinkSource, UnsubscribeCandidate};
pub use message::{Address, BodyPart, EmailMessage, Header};
pub use outcome::{
    AttemptResult, BatchReport, BatchRequest, BatchSummary, OutcomeStatus, SenderOutcome,
};
pub use types::{MessageId, UserId};
