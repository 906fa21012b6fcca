//! Bounded, append-only audit trail.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use trustgate_types::{AuditEvent, AuditEventKind};

use crate::{EngineError, Result};

/// Builder-style filter over the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    user_id: Option<String>,
    kind: Option<AuditEventKind>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only events concerning this user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Only events of this kind.
    pub fn of_kind(mut self, kind: AuditEventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only events at or after this instant.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Only events before this instant.
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// At most this many events, newest first.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(user_id) = &self.user_id {
            if &event.user_id != user_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp >= until {
                return false;
            }
        }
        true
    }
}

/// Summary counts over the retained audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditStats {
    /// Events currently retained
    pub total: usize,
    /// Count per event kind
    pub by_kind: HashMap<AuditEventKind, usize>,
    /// Timestamp of the oldest retained event
    pub oldest: Option<DateTime<Utc>>,
    /// Timestamp of the newest retained event
    pub newest: Option<DateTime<Utc>>,
}

/// Lock-protected bounded deque of audit events.
///
/// Retention is enforced on append: events older than the retention window
/// are purged, then the oldest events drop until the size cap holds.
pub struct AuditTrail {
    max_entries: usize,
    retention: Duration,
    events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditTrail {
    pub fn new(max_entries: usize, retention_days: i64) -> Self {
        Self {
            max_entries: max_entries.max(1),
            retention: Duration::days(retention_days.max(1)),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Append one event, purging expired and overflowing entries first.
    pub fn record(&self, event: AuditEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| EngineError::Audit("audit trail lock poisoned".to_string()))?;
        let cutoff = Utc::now() - self.retention;
        while events.front().is_some_and(|front| front.timestamp < cutoff) {
            events.pop_front();
        }
        while events.len() >= self.max_entries {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }

    /// Events matching the query, newest first.
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditEvent> {
        let events = match self.events.lock() {
            Ok(events) => events,
            Err(_) => return Vec::new(),
        };
        let limit = query.limit.unwrap_or(usize::MAX);
        events
            .iter()
            .rev()
            .filter(|event| query.matches(event))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Summary counts over the retained events.
    pub fn stats(&self) -> AuditStats {
        let events = match self.events.lock() {
            Ok(events) => events,
            Err(_) => {
                return AuditStats {
                    total: 0,
                    by_kind: HashMap::new(),
                    oldest: None,
                    newest: None,
                }
            }
        };
        let mut by_kind: HashMap<AuditEventKind, usize> = HashMap::new();
        for event in events.iter() {
            *by_kind.entry(event.kind).or_insert(0) += 1;
        }
        AuditStats {
            total: events.len(),
            by_kind,
            oldest: events.front().map(|event| event.timestamp),
            newest: events.back().map(|event| event.timestamp),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
