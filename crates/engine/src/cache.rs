//! Short-lived decision cache.
//!
//! Decisions are fingerprinted by the identity of the guarded call and kept
//! only for the trust-nothing window. Because an assessment consults the
//! whole rule set, every entry is stamped with the registry generation it
//! was computed against; a lookup under any other generation is a miss, so
//! no decision survives a rule edit.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use trustgate_types::{Assessment, EnforcementDecision, TrustContext};

struct CacheEntry {
    assessment: Assessment,
    /// Registry generation the decision was computed against
    generation: u64,
}

/// TTL cache of assessments keyed by call fingerprint.
pub struct DecisionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stable fingerprint of the identity of a guarded call.
    pub fn fingerprint(context: &TrustContext) -> String {
        let mut hasher = Sha256::new();
        for part in [
            context.user_id.as_str(),
            context.session_id.as_str(),
            context.operation.as_str(),
            context.resource.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0x1f]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Look up a fresh assessment computed against `generation`. Entries
    /// that are stale or from another generation are evicted on the way.
    pub fn get(&self, key: &str, now: DateTime<Utc>, generation: u64) -> Option<Assessment> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => return None,
        };
        match entries.get(key) {
            Some(entry) if entry.generation == generation && entry.assessment.is_fresh(now) => {
                Some(entry.assessment.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store an assessment computed against `generation`. Challenge and
    /// Quarantine decisions depend on one-time verification and are never
    /// stored.
    pub fn store(&self, key: String, assessment: &Assessment, generation: u64) {
        match assessment.recommended_action {
            EnforcementDecision::Challenge | EnforcementDecision::Quarantine => return,
            _ => {}
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    assessment: assessment.clone(),
                    generation,
                },
            );
        }
    }

    /// Eagerly evict every decision not computed against `generation`.
    /// Lookups already reject them; this keeps the map from carrying dead
    /// entries between rule edits.
    pub fn retain_generation(&self, generation: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|_, entry| entry.generation == generation);
            debug!(
                generation,
                evicted = before - entries.len(),
                "decision cache invalidated"
            );
        }
    }

    /// Drop every cached decision.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trustgate_types::RiskLevel;
    use uuid::Uuid;

    fn make_assessment(action: EnforcementDecision, ttl_seconds: i64) -> Assessment {
        let now = Utc::now();
        Assessment {
            assessment_id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            session_id: "sess-1".to_string(),
            operation: "transfer".to_string(),
            resource: "wallet:primary".to_string(),
            overall_trust_score: 0.95,
            risk_level: RiskLevel::Minimal,
            recommended_action: action,
            verification_methods_used: vec![],
            confidence_score: 0.4,
            anomalies_detected: vec![],
            warnings: vec![],
            assessment_time: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            cache_hit: false,
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let a = TrustContext::new("alice", "s1", "transfer", "wallet:primary");
        let b = TrustContext::new("alice", "s1", "transfer", "wallet:primary");
        let c = TrustContext::new("alice", "s1", "transfer", "wallet:backup");
        assert_eq!(DecisionCache::fingerprint(&a), DecisionCache::fingerprint(&b));
        assert_ne!(DecisionCache::fingerprint(&a), DecisionCache::fingerprint(&c));
    }

    #[test]
    fn test_fresh_hit_and_stale_eviction() {
        let cache = DecisionCache::new();
        let assessment = make_assessment(EnforcementDecision::Allow, 30);
        cache.store("k".to_string(), &assessment, 1);

        let now = Utc::now();
        assert!(cache.get("k", now, 1).is_some());

        let later = now + Duration::seconds(31);
        assert!(cache.get("k", later, 1).is_none());
        // Lazy eviction removed the stale entry.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_generation_mismatch_is_a_miss() {
        let cache = DecisionCache::new();
        let assessment = make_assessment(EnforcementDecision::Allow, 30);
        cache.store("k".to_string(), &assessment, 1);

        let now = Utc::now();
        // A rule edit bumped the registry generation: the entry is rejected
        // and evicted even though its TTL has not elapsed.
        assert!(cache.get("k", now, 2).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_challenge_and_quarantine_are_never_stored() {
        let cache = DecisionCache::new();
        cache.store(
            "c".to_string(),
            &make_assessment(EnforcementDecision::Challenge, 30),
            1,
        );
        cache.store(
            "q".to_string(),
            &make_assessment(EnforcementDecision::Quarantine, 30),
            1,
        );
        assert!(cache.is_empty());

        cache.store(
            "d".to_string(),
            &make_assessment(EnforcementDecision::Deny, 30),
            1,
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_generation_evicts_older_entries() {
        let cache = DecisionCache::new();
        cache.store(
            "old".to_string(),
            &make_assessment(EnforcementDecision::Allow, 30),
            1,
        );
        cache.store(
            "current".to_string(),
            &make_assessment(EnforcementDecision::Allow, 30),
            2,
        );

        cache.retain_generation(2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("current", Utc::now(), 2).is_some());
    }
}
