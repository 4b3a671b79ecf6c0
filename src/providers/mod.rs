//! Mailbox backend providers.
//!
//! The pipeline talks to its mailbox through the [`MailStore`] trait;
//! [`GmailStore`] is the production implementation over the Gmail REST API.

mod gmail;
mod traits;

pub use gmail::{GmailCredentials, GmailStore, MAX_PAGE_SIZE};
pub use traits::{MailStore, MailStoreError, MessagePage, Result};
