//! Bounded in-memory audit trail for team mutations.
//!
//! The trail is process-local and lost on restart. Handles are cheap
//! clones sharing one buffer, so the router hands the same trail to every
//! endpoint and tests inject their own.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use utoipa::ToSchema;

/// Entries retained before the oldest fall off.
const MAX_ENTRIES: usize = 5000;

/// Default window for the per-team view.
const DEFAULT_RECENT_LIMIT: usize = 20;

/// One recorded mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    #[serde(rename = "teamId")]
    pub team_id: String,
    pub action: String,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Newest-first audit trail with a hard capacity.
#[derive(Clone, Debug)]
pub struct AuditTrail {
    entries: Arc<Mutex<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Record a mutation against a team. Recording never fails; a
    /// poisoned buffer drops the entry.
    pub fn record(&self, team_id: &str, action: &str, details: Option<String>) {
        let entry = AuditEntry {
            team_id: team_id.to_string(),
            action: action.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            details,
        };

        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Entries for one team, newest first, at most `limit`.
    #[must_use]
    pub fn recent(&self, team_id: &str, limit: usize) -> Vec<AuditEntry> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|entry| entry.team_id == team_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Entries for one team with the default window.
    #[must_use]
    pub fn recent_default(&self, team_id: &str) -> Vec<AuditEntry> {
        self.recent(team_id, DEFAULT_RECENT_LIMIT)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_record_and_recent() {
        let trail = AuditTrail::new();

        trail.record("team-1", "create", Some("Alpha".to_string()));
        trail.record("team-2", "update", None);
        trail.record("team-1", "delete", None);

        let entries = trail.recent("team-1", 20);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "delete");
        assert_eq!(entries[1].action, "create");
        assert_eq!(entries[1].details.as_deref(), Some("Alpha"));
    }

    #[test]
    fn test_recent_respects_limit() {
        let trail = AuditTrail::new();

        for index in 0..30 {
            trail.record("team-1", &format!("update-{index}"), None);
        }

        assert_eq!(trail.recent("team-1", 5).len(), 5);
        assert_eq!(trail.recent_default("team-1").len(), 20);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let trail = AuditTrail::with_capacity(3);

        for index in 0..5 {
            trail.record("team-1", &format!("update-{index}"), None);
        }

        assert_eq!(trail.len(), 3);

        let entries = trail.recent("team-1", 10);

        assert_eq!(entries[0].action, "update-4");
        assert_eq!(entries[2].action, "update-2");
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let trail = AuditTrail::new();
        let handle = trail.clone();

        handle.record("team-1", "create", None);

        assert_eq!(trail.len(), 1);
        assert_eq!(trail.recent("team-1", 20).len(), 1);
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let trail = AuditTrail::new();

        trail.record("team-1", "create", None);

        let entries = trail.recent("team-1", 1);
        let timestamp = &entries[0].timestamp;

        assert!(timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_serialization_shape() {
        let entry = AuditEntry {
            team_id: "team-1".to_string(),
            action: "create".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            details: None,
        };

        let value = serde_json::to_value(&entry).expect("serialize entry");

        assert_eq!(
            value.get("teamId").and_then(serde_json::Value::as_str),
            Some("team-1")
        );
        assert!(value.get("details").is_none());

        let with_details = AuditEntry {
            details: Some("Alpha".to_string()),
            ..entry
        };
        let value = serde_json::to_value(&with_details).expect("serialize entry");

        assert_eq!(
            value.get("details").and_then(serde_json::Value::as_str),
            Some("Alpha")
        );
    }

    #[test]
    fn test_unknown_team_is_empty() {
        let trail = AuditTrail::new();

        trail.record("team-1", "create", None);

        assert!(trail.recent("missing", 20).is_empty());
    }
}
