//! Per-user rolling operation history backing the behavioral scorer.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// One remembered operation.
#[derive(Debug, Clone)]
struct HistoryEntry {
    operation: String,
    at: DateTime<Utc>,
}

/// Summary of a user's history relative to one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Familiarity {
    /// Total remembered operations for the user
    pub total: usize,
    /// How many of them match the current operation
    pub matching: usize,
}

/// Bounded per-user operation history.
///
/// Entries are capped per user; the oldest entry is evicted on overflow so
/// the history never grows with process lifetime.
pub struct BehaviorHistory {
    capacity: usize,
    entries: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl BehaviorHistory {
    /// Default number of operations remembered per user.
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record an operation for a user.
    pub fn record(&self, user_id: &str, operation: &str) {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        let history = entries.entry(user_id.to_string()).or_default();
        if history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(HistoryEntry {
            operation: operation.to_string(),
            at: Utc::now(),
        });
    }

    /// How familiar an operation is for a user. `None` when no history
    /// exists at all.
    pub fn familiarity(&self, user_id: &str, operation: &str) -> Option<Familiarity> {
        let entries = self.entries.lock().expect("history lock poisoned");
        let history = entries.get(user_id)?;
        if history.is_empty() {
            return None;
        }
        let matching = history
            .iter()
            .filter(|entry| entry.operation == operation)
            .count();
        Some(Familiarity {
            total: history.len(),
            matching,
        })
    }

    /// Timestamps of a user's operations inside the given window, newest
    /// last. Used by the rapid-succession heuristic.
    pub fn recent_timestamps(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let entries = self.entries.lock().expect("history lock poisoned");
        entries
            .get(user_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|entry| entry.at >= since)
                    .map(|entry| entry.at)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for BehaviorHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_none() {
        let history = BehaviorHistory::default();
        assert_eq!(history.familiarity("alice", "transfer"), None);
    }

    #[test]
    fn test_familiarity_counts() {
        let history = BehaviorHistory::default();
        history.record("alice", "transfer");
        history.record("alice", "transfer");
        history.record("alice", "login");

        let familiarity = history.familiarity("alice", "transfer").unwrap();
        assert_eq!(familiarity.total, 3);
        assert_eq!(familiarity.matching, 2);

        let unseen = history.familiarity("alice", "export_keys").unwrap();
        assert_eq!(unseen.matching, 0);
    }

    #[test]
    fn test_capacity_eviction() {
        let history = BehaviorHistory::new(3);
        for _ in 0..5 {
            history.record("alice", "transfer");
        }
        history.record("alice", "login");

        let familiarity = history.familiarity("alice", "transfer").unwrap();
        assert_eq!(familiarity.total, 3);
        assert_eq!(familiarity.matching, 2);
    }

    #[test]
    fn test_histories_are_per_user() {
        let history = BehaviorHistory::default();
        history.record("alice", "transfer");
        assert_eq!(history.familiarity("bob", "transfer"), None);
    }

    #[test]
    fn test_recent_timestamps_window() {
        let history = BehaviorHistory::default();
        history.record("alice", "transfer");
        history.record("alice", "transfer");

        let since = Utc::now() - chrono::Duration::seconds(60);
        assert_eq!(history.recent_timestamps("alice", since).len(), 2);

        let future = Utc::now() + chrono::Duration::seconds(1);
        assert!(history.recent_timestamps("alice", future).is_empty());
    }
}
