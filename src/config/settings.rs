//! Application settings.
//!
//! Settings are read from environment variables at startup; unset or
//! unparsable values fall back to their defaults rather than failing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Mailbox owner identifier (`"me"` for the authenticated user).
    pub user_id: UserId,
    /// Promotional scan limits.
    pub scan: ScanSettings,
    /// Unsubscribe execution settings.
    pub unsubscribe: UnsubscribeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: UserId::me(),
            scan: ScanSettings::default(),
            unsubscribe: UnsubscribeSettings::default(),
        }
    }
}

/// Limits for the promotional sender scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Maximum unique senders to collect.
    pub max_senders: usize,
    /// Maximum messages to scan before stopping.
    pub max_emails_to_scan: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_senders: 50,
            max_emails_to_scan: 100,
        }
    }
}

/// Unsubscribe execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeSettings {
    /// When set, report what would happen without any network attempts.
    pub dry_run: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UnsubscribeSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            timeout_secs: 10,
        }
    }
}

impl UnsubscribeSettings {
    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through a key lookup function (testable seam).
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(value) = lookup("USER_ID") {
            if !value.trim().is_empty() {
                settings.user_id = UserId::from(value.trim());
            }
        }
        if let Some(value) = lookup("MAX_SENDERS").and_then(|v| v.parse().ok()) {
            settings.scan.max_senders = value;
        }
        if let Some(value) = lookup("MAX_EMAILS_TO_SCAN").and_then(|v| v.parse().ok()) {
            settings.scan.max_emails_to_scan = value;
        }
        if let Some(value) = lookup("DRY_RUN") {
            settings.unsubscribe.dry_run = parse_bool(&value);
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            settings.unsubscribe.timeout_secs = value;
        }

        settings
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "y" | "yes"
    )
}

/// Default path for the activity counter database.
///
/// Returns `None` when no home directory can be resolved.
pub fn default_activity_db_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "panbanda", "sweep")
        .map(|dirs| dirs.data_dir().join("activity.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.user_id.0, "me");
        assert_eq!(settings.scan.max_senders, 50);
        assert_eq!(settings.scan.max_emails_to_scan, 100);
        assert!(!settings.unsubscribe.dry_run);
        assert_eq!(settings.unsubscribe.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("MAX_SENDERS", "5"),
            ("MAX_EMAILS_TO_SCAN", "25"),
            ("DRY_RUN", "yes"),
            ("REQUEST_TIMEOUT_SECS", "30"),
            ("USER_ID", "someone@example.com"),
        ]));

        assert_eq!(settings.scan.max_senders, 5);
        assert_eq!(settings.scan.max_emails_to_scan, 25);
        assert!(settings.unsubscribe.dry_run);
        assert_eq!(settings.unsubscribe.timeout_secs, 30);
        assert_eq!(settings.user_id.0, "someone@example.com");
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("MAX_SENDERS", "lots"),
            ("REQUEST_TIMEOUT_SECS", ""),
            ("USER_ID", "   "),
        ]));

        assert_eq!(settings.scan.max_senders, 50);
        assert_eq!(settings.unsubscribe.timeout_secs, 10);
        assert_eq!(settings.user_id.0, "me");
    }

    #[test]
    fn bool_parsing_accepts_common_forms() {
        for value in ["true", "1", "t", "y", "yes", "YES", " True "] {
            assert!(parse_bool(value), "{value} should parse as true");
        }
        for value in ["false", "0", "no", "n", "off", ""] {
            assert!(!parse_bool(value), "{value} should parse as false");
        }
    }

    #[test]
    fn settings_roundtrip() {
        let mut settings = Settings::default();
        settings.unsubscribe.dry_run = true;
        settings.scan.max_senders = 7;

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let deserialized: Settings = serde_json::from_str(&json).unwrap();

        assert!(deserialized.unsubscribe.dry_run);
        assert_eq!(deserialized.scan.max_senders, 7);
    }
}
