use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Assessment, RiskLevel, Violation};

/// What an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// A trust assessment completed
    Assessment,
    /// A rule violation was recorded
    Violation,
    /// A rule was created, updated, or deleted
    RuleChange,
    /// An input payload was validated
    InputValidation,
}

/// Append-only record of an assessment, violation, or rule change.
///
/// Events are never mutated after creation; the audit trail retains them for
/// a configured window and then purges them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event
    pub event_id: Uuid,
    /// What kind of occurrence this records
    pub kind: AuditEventKind,
    /// User the event concerns
    pub user_id: String,
    /// Session the event concerns
    pub session_id: String,
    /// The operation involved
    pub operation: String,
    /// Short summary of the outcome, e.g. `deny` or `rule created`
    pub summary: String,
    /// Trust score at the time, when applicable
    #[serde(default)]
    pub trust_score: Option<f64>,
    /// Risk level at the time, when applicable
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Additional structured detail
    #[serde(default)]
    pub detail: HashMap<String, serde_json::Value>,
}

impl AuditEvent {
    /// Build an event from a completed assessment.
    pub fn from_assessment(assessment: &Assessment) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: AuditEventKind::Assessment,
            user_id: assessment.user_id.clone(),
            session_id: assessment.session_id.clone(),
            operation: assessment.operation.clone(),
            summary: assessment.recommended_action.to_string(),
            trust_score: Some(assessment.overall_trust_score),
            risk_level: Some(assessment.risk_level),
            timestamp: assessment.assessment_time,
            detail: HashMap::from([(
                "assessment_id".to_string(),
                serde_json::json!(assessment.assessment_id),
            )]),
        }
    }

    /// Build an event from a recorded violation.
    pub fn from_violation(violation: &Violation) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: AuditEventKind::Violation,
            user_id: violation.user_id.clone(),
            session_id: violation.session_id.clone(),
            operation: violation.operation.clone(),
            summary: format!("violation of rule '{}'", violation.rule_id),
            trust_score: None,
            risk_level: Some(violation.severity),
            timestamp: violation.detected_at,
            detail: HashMap::from([(
                "violation_id".to_string(),
                serde_json::json!(violation.violation_id),
            )]),
        }
    }

    /// Build a rule-change event.
    pub fn rule_change(summary: impl Into<String>, rule_id: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: AuditEventKind::RuleChange,
            user_id: String::new(),
            session_id: String::new(),
            operation: String::new(),
            summary: summary.into(),
            trust_score: None,
            risk_level: None,
            timestamp: Utc::now(),
            detail: HashMap::from([("rule_id".to_string(), serde_json::json!(rule_id))]),
        }
    }

    /// Add a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.detail.insert(key.into(), value);
        self
    }
}
