//! Concurrent, validated storage of trust rules.
//!
//! Reads vastly outnumber writes: evaluation takes a read lock and clones the
//! applicable subset, while administrator mutations take the write lock
//! briefly. Every mutation reports the affected policy type so the caller
//! can invalidate its decision cache before any stale decision is served.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use trustgate_types::{PolicyType, RuleStatus, TrustRule};

use crate::{Result, RuleError};

/// Rule sets larger than this are refused on load.
const MAX_RULE_SET_BYTES: usize = 10 * 1024 * 1024;

/// Report of a completed registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleChange {
    /// The rule that was added, updated, or removed
    pub rule_id: String,
    /// Policy type whose cached decisions are now stale
    pub policy_type: PolicyType,
    /// Registry generation after the change
    pub generation: u64,
}

#[derive(Default)]
struct RegistryInner {
    rules: HashMap<String, TrustRule>,
    generation: u64,
}

/// In-memory collection of trust rules with validated CRUD.
#[derive(Default)]
pub struct RuleRegistry {
    inner: RwLock<RegistryInner>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. Validation failures return a structured error and leave
    /// the registry untouched.
    pub async fn add_rule(&self, rule: TrustRule) -> Result<RuleChange> {
        rule.validate().map_err(RuleError::Validation)?;

        let mut inner = self.inner.write().await;
        if inner.rules.contains_key(&rule.id) {
            return Err(RuleError::DuplicateRule(rule.id));
        }
        inner.generation += 1;
        let change = RuleChange {
            rule_id: rule.id.clone(),
            policy_type: rule.policy_type,
            generation: inner.generation,
        };
        info!(rule_id = %rule.id, policy_type = %rule.policy_type, "rule added");
        inner.rules.insert(rule.id.clone(), rule);
        Ok(change)
    }

    /// Replace an existing rule. The stored `updated_at` is refreshed.
    pub async fn update_rule(&self, mut rule: TrustRule) -> Result<RuleChange> {
        rule.validate().map_err(RuleError::Validation)?;

        let mut inner = self.inner.write().await;
        if !inner.rules.contains_key(&rule.id) {
            return Err(RuleError::UnknownRule(rule.id));
        }
        rule.updated_at = Utc::now();
        inner.generation += 1;
        let change = RuleChange {
            rule_id: rule.id.clone(),
            policy_type: rule.policy_type,
            generation: inner.generation,
        };
        info!(rule_id = %rule.id, "rule updated");
        inner.rules.insert(rule.id.clone(), rule);
        Ok(change)
    }

    /// Remove a rule, returning it alongside the change report.
    pub async fn delete_rule(&self, rule_id: &str) -> Result<(TrustRule, RuleChange)> {
        let mut inner = self.inner.write().await;
        let rule = inner
            .rules
            .remove(rule_id)
            .ok_or_else(|| RuleError::UnknownRule(rule_id.to_string()))?;
        inner.generation += 1;
        let change = RuleChange {
            rule_id: rule.id.clone(),
            policy_type: rule.policy_type,
            generation: inner.generation,
        };
        info!(rule_id, "rule deleted");
        Ok((rule, change))
    }

    /// Fetch a rule by id.
    pub async fn get_rule(&self, rule_id: &str) -> Option<TrustRule> {
        self.inner.read().await.rules.get(rule_id).cloned()
    }

    /// All rules, unordered.
    pub async fn list_rules(&self) -> Vec<TrustRule> {
        self.inner.read().await.rules.values().cloned().collect()
    }

    /// Rules eligible for evaluation at `now`: active, unexpired, optionally
    /// filtered by policy type, sorted by descending priority with id as the
    /// deterministic tie-breaker.
    pub async fn applicable_rules(
        &self,
        policy_type: Option<PolicyType>,
        now: DateTime<Utc>,
    ) -> Vec<TrustRule> {
        let inner = self.inner.read().await;
        let mut rules: Vec<TrustRule> = inner
            .rules
            .values()
            .filter(|rule| rule.is_applicable(now))
            .filter(|rule| policy_type.map(|pt| rule.policy_type == pt).unwrap_or(true))
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        debug!(
            count = rules.len(),
            policy_type = ?policy_type,
            "selected applicable rules"
        );
        rules
    }

    /// Current registry generation; bumped by every mutation.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Rule counts keyed by lifecycle status.
    pub async fn counts_by_status(&self) -> HashMap<RuleStatus, usize> {
        let inner = self.inner.read().await;
        let mut counts = HashMap::new();
        for rule in inner.rules.values() {
            *counts.entry(rule.status).or_insert(0) += 1;
        }
        counts
    }

    /// Total number of stored rules.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rules.len()
    }

    /// Whether the registry holds no rules.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rules.is_empty()
    }

    /// Replace the entire rule set from JSON bytes. The whole set is
    /// validated before anything is swapped in; a bad set leaves the current
    /// rules untouched.
    pub async fn load_rules(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Err(RuleError::Load("rule data is empty".to_string()));
        }
        if data.len() > MAX_RULE_SET_BYTES {
            return Err(RuleError::Load(format!(
                "rule data exceeds {} byte limit",
                MAX_RULE_SET_BYTES
            )));
        }

        let rules: Vec<TrustRule> = serde_json::from_slice(data)?;
        let mut errors = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for rule in &rules {
            if let Err(rule_errors) = rule.validate() {
                errors.extend(rule_errors);
            }
            if !seen.insert(rule.id.clone()) {
                errors.push(format!("duplicate rule id: '{}'", rule.id));
            }
        }
        if !errors.is_empty() {
            return Err(RuleError::Validation(errors));
        }

        let mut inner = self.inner.write().await;
        inner.rules = rules.into_iter().map(|rule| (rule.id.clone(), rule)).collect();
        inner.generation += 1;
        info!(count = inner.rules.len(), "rule set loaded");
        Ok(inner.rules.len())
    }

    /// Serialize the full rule set to JSON bytes, ordered by id for stable
    /// output.
    pub async fn save_rules(&self) -> Result<Vec<u8>> {
        let inner = self.inner.read().await;
        let mut rules: Vec<&TrustRule> = inner.rules.values().collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(serde_json::to_vec_pretty(&rules)?)
    }
}
