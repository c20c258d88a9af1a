//! Expiration Policy Module
//!
//! Policies decide whether an item is expired given its access metadata and
//! a caller-supplied "now". An item carries any number of policies; if any
//! one of them fires, the item is expired (logical OR).

mod file_watch;
mod schedule;

pub use file_watch::FileBaseline;
pub use schedule::ScheduleExpression;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Item State ==
/// The slice of item metadata expiration policies evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct ItemState {
    /// When the item was added (or last overwritten)
    pub created_at: DateTime<Utc>,
    /// When the item was last successfully read
    pub last_accessed: DateTime<Utc>,
}

// == Expiration Policy ==
/// A single expiration condition. Evaluation is pure with respect to its
/// inputs (time, file metadata): policies hold only baseline bookkeeping
/// recorded at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpirationPolicy {
    /// Expires once the current time passes a fixed timestamp.
    /// The boundary is inclusive: the item is still valid at exactly `at`.
    Absolute { at: DateTime<Utc> },

    /// Expires after a period of inactivity; each successful read resets
    /// the window.
    Sliding { idle: Duration },

    /// Expires when a cron-like five-field schedule has matched at least
    /// once since the item was created.
    Schedule { expression: ScheduleExpression },

    /// Expires when a watched file's existence or last-write time no longer
    /// matches the baseline recorded when the policy was built.
    FileChange { baseline: FileBaseline },
}

impl ExpirationPolicy {
    /// Absolute expiration at a fixed timestamp.
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self::Absolute { at }
    }

    /// Sliding (idle-time) expiration.
    pub fn sliding(idle: Duration) -> Self {
        Self::Sliding { idle }
    }

    /// Schedule expiration from a five-field expression such as `"30 2 * * *"`.
    pub fn schedule(expression: &str) -> Result<Self> {
        Ok(Self::Schedule {
            expression: ScheduleExpression::parse(expression)?,
        })
    }

    /// File-dependency expiration; records the watched file's current state
    /// as the baseline.
    pub fn file_change(path: impl AsRef<Path>) -> Self {
        Self::FileChange {
            baseline: FileBaseline::capture(path),
        }
    }

    // == Is Expired ==
    /// Evaluates this policy against the item state at the given instant.
    pub fn is_expired(&self, state: &ItemState, now: DateTime<Utc>) -> bool {
        match self {
            ExpirationPolicy::Absolute { at } => now > *at,
            ExpirationPolicy::Sliding { idle } => {
                let elapsed = now.signed_duration_since(state.last_accessed);
                match chrono::Duration::from_std(*idle) {
                    Ok(window) => elapsed >= window,
                    // An idle window too large for chrono can never elapse
                    Err(_) => false,
                }
            }
            ExpirationPolicy::Schedule { expression } => expression
                .next_occurrence(state.created_at)
                .map(|hit| hit <= now)
                .unwrap_or(false),
            ExpirationPolicy::FileChange { baseline } => baseline.has_changed(),
        }
    }
}

/// Returns true if any of the given policies has fired (OR combination).
pub(crate) fn any_expired(
    policies: &[ExpirationPolicy],
    state: &ItemState,
    now: DateTime<Utc>,
) -> bool {
    policies.iter().any(|p| p.is_expired(state, now))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state_at(created: DateTime<Utc>, accessed: DateTime<Utc>) -> ItemState {
        ItemState {
            created_at: created,
            last_accessed: accessed,
        }
    }

    #[test]
    fn test_absolute_boundary_inclusive() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let policy = ExpirationPolicy::absolute(at);
        let state = state_at(at, at);

        // Valid at exactly the deadline, expired one instant later
        assert!(!policy.is_expired(&state, at));
        assert!(policy.is_expired(&state, at + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_sliding_window_resets_on_access() {
        let policy = ExpirationPolicy::sliding(Duration::from_secs(60));
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        // Accessed 30s ago: inside the window
        let state = state_at(base, base + chrono::Duration::seconds(90));
        assert!(!policy.is_expired(&state, base + chrono::Duration::seconds(120)));

        // Gap of exactly the window: expired
        assert!(policy.is_expired(&state, base + chrono::Duration::seconds(150)));
    }

    #[test]
    fn test_or_combination() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let state = state_at(base, base);
        let now = base + chrono::Duration::hours(1);

        let far = ExpirationPolicy::absolute(base + chrono::Duration::days(1));
        let near = ExpirationPolicy::absolute(base + chrono::Duration::minutes(5));

        assert!(!any_expired(&[far.clone()], &state, now));
        assert!(any_expired(&[far, near], &state, now));
        assert!(!any_expired(&[], &state, now));
    }

    #[test]
    fn test_schedule_policy_fires_after_match() {
        // Daily at 02:30
        let policy = ExpirationPolicy::schedule("30 2 * * *").unwrap();
        let created = Utc.with_ymd_and_hms(2026, 3, 10, 1, 0, 0).unwrap();
        let state = state_at(created, created);

        assert!(!policy.is_expired(&state, Utc.with_ymd_and_hms(2026, 3, 10, 2, 29, 0).unwrap()));
        assert!(policy.is_expired(&state, Utc.with_ymd_and_hms(2026, 3, 10, 2, 30, 0).unwrap()));
        assert!(policy.is_expired(&state, Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_policy_serde_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let watched = dir.path().join("watched.txt");
        std::fs::write(&watched, b"v1").unwrap();

        let policies = vec![
            ExpirationPolicy::absolute(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()),
            ExpirationPolicy::sliding(Duration::from_secs(300)),
            ExpirationPolicy::schedule("0,30 8,17 * * 1,2,3,4,5").unwrap(),
            ExpirationPolicy::file_change(&watched),
        ];
        let json = serde_json::to_string(&policies).unwrap();
        let back: Vec<ExpirationPolicy> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), policies.len());

        // The file baseline must come back intact, including the mtime
        // snapshot, or rehydrated items would misjudge file changes
        match (&policies[3], &back[3]) {
            (
                ExpirationPolicy::FileChange { baseline: original },
                ExpirationPolicy::FileChange { baseline: restored },
            ) => assert_eq!(original, restored),
            other => panic!("file policy did not round-trip: {:?}", other),
        }
    }
}
