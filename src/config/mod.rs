//! Configuration and settings management.
//!
//! Settings are environment-driven with sensible defaults; nothing here
//! fails at load time.

mod settings;

pub use settings::{
    default_activity_db_path, ScanSettings, Settings, UnsubscribeSettings,
};
