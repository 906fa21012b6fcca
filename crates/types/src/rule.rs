use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Condition, ModelError, Result};

/// Category of operation a rule governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    AccessControl,
    TransactionLimits,
    KeyUsage,
    Authentication,
    Authorization,
    Audit,
    Compliance,
    Security,
    BusinessLogic,
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessControl => "access_control",
            Self::TransactionLimits => "transaction_limits",
            Self::KeyUsage => "key_usage",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Audit => "audit",
            Self::Compliance => "compliance",
            Self::Security => "security",
            Self::BusinessLogic => "business_logic",
        };
        write!(f, "{}", name)
    }
}

/// Action a rule requests when it matches (deny rules) or fails (scoring rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
    Warn,
    RequireApproval,
    Log,
    Escalate,
    Quarantine,
    RateLimit,
}

impl RuleAction {
    /// Actions whose failure produces a recorded [`crate::Violation`].
    pub fn is_enforcement_relevant(&self) -> bool {
        matches!(self, Self::Deny | Self::Quarantine | Self::Escalate)
    }
}

/// Lifecycle status of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Active,
    Inactive,
    Draft,
    Deprecated,
    Testing,
}

impl Default for RuleStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A pluggable verification check contributing to a rule's trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    SignatureVerification,
    HardwareWallet,
    TimeBased,
    BehavioralAnalysis,
    NetworkAnalysis,
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignatureVerification => "signature_verification",
            Self::HardwareWallet => "hardware_wallet",
            Self::TimeBased => "time_based",
            Self::BehavioralAnalysis => "behavioral_analysis",
            Self::NetworkAnalysis => "network_analysis",
        };
        write!(f, "{}", name)
    }
}

/// A named set of conditions plus an action, weight, and verification methods.
///
/// Weights across a rule set need not sum to 1; aggregation normalizes by the
/// total weight of the rules actually evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustRule {
    /// Unique identifier within a registry
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Category of operation this rule governs
    pub policy_type: PolicyType,
    /// Ordered conditions; all must hold for the rule to match
    pub conditions: Vec<Condition>,
    /// Action when the rule matches (deny) or fails (scoring rules)
    pub action: RuleAction,
    /// Contribution weight in [0, 1]
    pub weight: f64,
    /// Verification methods whose mean score is this rule's contribution
    #[serde(default)]
    pub verification_methods: Vec<VerificationMethod>,
    /// Higher priority evaluates first
    #[serde(default)]
    pub priority: i64,
    /// Lifecycle status; only Active rules are evaluated
    #[serde(default)]
    pub status: RuleStatus,
    /// When the rule was created
    pub created_at: DateTime<Utc>,
    /// When the rule was last updated
    pub updated_at: DateTime<Utc>,
    /// Optional expiry; expired rules are skipped
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TrustRule {
    /// Create a new rule with the given identity and policy type.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        policy_type: PolicyType,
        action: RuleAction,
        weight: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ModelError::InvalidRule(
                "weight must be between 0.0 and 1.0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            policy_type,
            conditions: Vec::new(),
            action,
            weight,
            verification_methods: Vec::new(),
            priority: 0,
            status: RuleStatus::Active,
            created_at: now,
            updated_at: now,
            expires_at: None,
            metadata: HashMap::new(),
        })
    }

    /// Append a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the verification methods.
    pub fn with_methods(mut self, methods: Vec<VerificationMethod>) -> Self {
        self.verification_methods = methods;
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the lifecycle status.
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether the rule participates in evaluation at `now`.
    pub fn is_applicable(&self, now: DateTime<Utc>) -> bool {
        if self.status != RuleStatus::Active {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    /// Structural validation; collects every problem rather than stopping at
    /// the first.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("rule id must not be empty".to_string());
        } else if self.id.len() > 128 {
            // Truncate on char boundaries; byte slicing can split a
            // multibyte character and panic.
            let prefix: String = self.id.chars().take(16).collect();
            errors.push(format!("rule id '{}' exceeds 128 bytes", prefix));
        }
        if self.name.trim().is_empty() {
            errors.push("rule name must not be empty".to_string());
        }
        if self.conditions.is_empty() {
            errors.push(format!("rule '{}' has no conditions", self.id));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            errors.push(format!(
                "rule '{}': weight {} outside [0, 1]",
                self.id, self.weight
            ));
        }
        for condition in &self.conditions {
            if let Err(message) = condition.validate() {
                errors.push(format!("rule '{}': {}", self.id, message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConditionOperator;

    fn make_rule(id: &str) -> TrustRule {
        TrustRule::new(id, "Test rule", PolicyType::AccessControl, RuleAction::Warn, 0.5)
            .unwrap()
            .with_condition(Condition::new("operation", ConditionOperator::Exists, ""))
    }

    #[test]
    fn test_rule_creation_rejects_bad_weight() {
        let result = TrustRule::new("r1", "Bad", PolicyType::Security, RuleAction::Deny, 1.5);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_validation_collects_errors() {
        let mut rule = make_rule("");
        rule.name = String::new();
        rule.conditions.clear();
        let errors = rule.validate().unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_rule_validation_rejects_overlong_multibyte_id() {
        // 50 euro signs are 150 bytes; truncating the id for the error
        // message must not split a multibyte character.
        let rule = make_rule(&"€".repeat(50));
        let errors = rule.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("exceeds 128 bytes")));
    }

    #[test]
    fn test_rule_applicability() {
        let now = Utc::now();
        let rule = make_rule("r1");
        assert!(rule.is_applicable(now));

        let expired = make_rule("r2").with_expiry(now - chrono::Duration::hours(1));
        assert!(!expired.is_applicable(now));

        let inactive = make_rule("r3").with_status(RuleStatus::Inactive);
        assert!(!inactive.is_applicable(now));

        let draft = make_rule("r4").with_status(RuleStatus::Draft);
        assert!(!draft.is_applicable(now));
    }

    #[test]
    fn test_enforcement_relevant_actions() {
        assert!(RuleAction::Deny.is_enforcement_relevant());
        assert!(RuleAction::Quarantine.is_enforcement_relevant());
        assert!(RuleAction::Escalate.is_enforcement_relevant());
        assert!(!RuleAction::Warn.is_enforcement_relevant());
        assert!(!RuleAction::Log.is_enforcement_relevant());
    }

    #[test]
    fn test_rule_serde_round_trip() {
        let rule = make_rule("round-trip")
            .with_methods(vec![
                VerificationMethod::SignatureVerification,
                VerificationMethod::NetworkAnalysis,
            ])
            .with_priority(10)
            .with_metadata("owner", serde_json::json!("compliance"));
        let json = serde_json::to_string(&rule).unwrap();
        let back: TrustRule = serde_json::from_str(&json).unwrap();
        assert_eq!(rule, back);
    }
}
