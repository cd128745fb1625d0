//! The normalized history record shared by all providers.

use chrono::{DateTime, Utc};
use tracing::warn;

/// One historical revision of a package.
///
/// A missing or unparseable timestamp is stored as `None`. Such entries are
/// kept and sort before every dated entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    /// When the revision was made, if known.
    pub timestamp: Option<DateTime<Utc>>,
    /// Title line.
    pub summary: String,
    /// Body, possibly empty.
    pub message: String,
    pub author: String,
    /// Release tag pointing at this revision, possibly empty.
    pub tag: String,
    /// Repository the tagged release belongs to, possibly empty.
    pub repo: String,
}

impl Change {
    /// Returns `false` for entries whose timestamp was absent or unparseable.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Returns `true` if the message carries anything besides whitespace.
    pub fn has_message(&self) -> bool {
        !self.message.trim().is_empty()
    }
}

/// Parses an RFC 3339 timestamp as delivered by GitLab and Atom feeds.
///
/// Empty input yields `None` silently; malformed input is logged and also
/// yields `None`.
///
/// ## Examples
///
/// ```
/// use arch_log_lib::change::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-15T10:30:00+01:00").is_some());
/// assert!(parse_timestamp("").is_none());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            warn!("Problem parsing time '{}' -- ignoring: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracing_test::traced_test;

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_timestamp("2024-01-15T10:30:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
    }

    #[traced_test]
    #[test]
    fn malformed_timestamp_is_flagged_not_fatal() {
        assert_eq!(parse_timestamp("15/01/2024"), None);
        assert!(logs_contain("Problem parsing time '15/01/2024'"));
    }

    #[test]
    fn empty_timestamp_is_absent() {
        let change = Change {
            timestamp: parse_timestamp(""),
            ..Default::default()
        };
        assert!(!change.has_timestamp());
    }

    #[test]
    fn whitespace_message_is_no_message() {
        let change = Change {
            message: " \n ".to_string(),
            ..Default::default()
        };
        assert!(!change.has_message());
    }
}
