use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ModelError, Result, VerificationMethod};

/// Discrete risk bucket derived from trust score and anomaly count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
    Extreme,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Extreme => "extreme",
        };
        write!(f, "{}", name)
    }
}

/// Final enforcement decision for a guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementDecision {
    /// Let the operation proceed
    Allow,
    /// Request stronger verification before proceeding
    Challenge,
    /// Isolate the session pending review
    Quarantine,
    /// Refuse the operation
    Deny,
    /// Proceed but record prominently
    Log,
}

impl std::fmt::Display for EnforcementDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Allow => "allow",
            Self::Challenge => "challenge",
            Self::Quarantine => "quarantine",
            Self::Deny => "deny",
            Self::Log => "log",
        };
        write!(f, "{}", name)
    }
}

/// Category of a detected anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    Behavioral,
    Temporal,
    Network,
    Score,
}

/// A heuristically detected irregularity attached to an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    /// Category of anomaly
    pub anomaly_type: AnomalyType,
    /// Severity expressed as a risk level
    pub severity: RiskLevel,
    /// Confidence in the detection (0.0 to 1.0)
    pub confidence: f64,
    /// What was detected
    pub description: String,
    /// When the anomaly was detected
    pub detected_at: DateTime<Utc>,
}

impl AnomalyDetection {
    /// Create a new anomaly detection.
    pub fn new(
        anomaly_type: AnomalyType,
        severity: RiskLevel,
        confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            anomaly_type,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
            detected_at: Utc::now(),
        }
    }
}

/// The outcome of one trust evaluation.
///
/// Produced once per call, immutable, cached by the decision cache, and
/// recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier for this assessment
    pub assessment_id: Uuid,
    /// User the assessment was made for
    pub user_id: String,
    /// Session the assessment was made for
    pub session_id: String,
    /// The guarded operation
    pub operation: String,
    /// The targeted resource
    pub resource: String,
    /// Normalized trust score in [0, 1]
    pub overall_trust_score: f64,
    /// Risk bucket derived from score and anomalies
    pub risk_level: RiskLevel,
    /// The enforcement decision
    pub recommended_action: EnforcementDecision,
    /// Verification methods that contributed to the score
    pub verification_methods_used: Vec<VerificationMethod>,
    /// Confidence in the assessment (0.0 to 1.0)
    pub confidence_score: f64,
    /// Anomalies detected during evaluation
    pub anomalies_detected: Vec<AnomalyDetection>,
    /// Non-fatal warnings gathered during evaluation
    pub warnings: Vec<String>,
    /// When the assessment was produced
    pub assessment_time: DateTime<Utc>,
    /// When the assessment stops being reusable
    pub expires_at: DateTime<Utc>,
    /// Whether this assessment was served from the decision cache
    #[serde(default)]
    pub cache_hit: bool,
}

impl Assessment {
    /// Validate score invariants; used by constructors in the engine crate.
    pub fn check_scores(score: f64, confidence: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&score) {
            return Err(ModelError::InvalidScore(format!(
                "trust score {} outside [0, 1]",
                score
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ModelError::InvalidScore(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        Ok(())
    }

    /// Whether the assessment may still be served from cache at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Record of a rule whose failure carried an enforcement-relevant action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Unique identifier for this violation
    pub violation_id: Uuid,
    /// The rule that failed
    pub rule_id: String,
    /// User the violation was recorded against
    pub user_id: String,
    /// Session in which the violation occurred
    pub session_id: String,
    /// The guarded operation
    pub operation: String,
    /// Severity of the violation
    pub severity: RiskLevel,
    /// When the violation was detected
    pub detected_at: DateTime<Utc>,
    /// When the violation was resolved, if it has been
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Operator notes recorded at resolution
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

impl Violation {
    /// Create an open violation for a failed rule.
    pub fn new(
        rule_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        operation: impl Into<String>,
        severity: RiskLevel,
    ) -> Self {
        Self {
            violation_id: Uuid::new_v4(),
            rule_id: rule_id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            operation: operation.into(),
            severity,
            detected_at: Utc::now(),
            resolved_at: None,
            resolution_notes: None,
        }
    }

    /// Whether the violation is still open.
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Mark the violation resolved. The resolution timestamp and notes are
    /// the only mutation a violation ever receives.
    pub fn resolve(&mut self, notes: impl Into<String>) {
        self.resolved_at = Some(Utc::now());
        self.resolution_notes = Some(notes.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Extreme > RiskLevel::Critical);
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert!(RiskLevel::Low > RiskLevel::Minimal);
    }

    #[test]
    fn test_score_validation() {
        assert!(Assessment::check_scores(0.5, 0.5).is_ok());
        assert!(Assessment::check_scores(1.0, 0.0).is_ok());
        assert!(Assessment::check_scores(1.1, 0.5).is_err());
        assert!(Assessment::check_scores(0.5, -0.1).is_err());
    }

    #[test]
    fn test_violation_lifecycle() {
        let mut violation =
            Violation::new("r1", "alice", "sess-1", "wallet_transfer", RiskLevel::High);
        assert!(violation.is_open());

        violation.resolve("confirmed false positive");
        assert!(!violation.is_open());
        assert!(violation.resolved_at.unwrap() >= violation.detected_at);
        assert_eq!(
            violation.resolution_notes.as_deref(),
            Some("confirmed false positive")
        );
    }

    #[test]
    fn test_anomaly_confidence_is_clamped() {
        let anomaly = AnomalyDetection::new(AnomalyType::Temporal, RiskLevel::Medium, 1.7, "x");
        assert_eq!(anomaly.confidence, 1.0);
    }
}
