//! Shared types for the TrustGate SDK
//!
//! This crate defines the data model consumed by every other crate in the
//! workspace: trust rules and conditions, evaluation contexts, assessments,
//! violations, audit events, and the input-validation payload types.

use thiserror::Error;

mod assessment;
mod audit;
mod condition;
mod context;
mod input;
mod rule;
mod value;

pub use assessment::{
    AnomalyDetection, AnomalyType, Assessment, EnforcementDecision, RiskLevel, Violation,
};
pub use audit::{AuditEvent, AuditEventKind};
pub use condition::{Condition, ConditionOperator};
pub use context::TrustContext;
pub use input::{
    InputData, InputType, ValidationAction, ValidationOutcome, ValidationRule, ValidationVerdict,
};
pub use rule::{PolicyType, RuleAction, RuleStatus, TrustRule, VerificationMethod};
pub use value::FieldValue;

/// Errors that can occur while constructing or validating model types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Minimum trust level a caller can demand for a guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// No trust established
    None,
    /// Basic trust level
    Low,
    /// Moderate trust level
    Medium,
    /// High trust level
    High,
    /// Very high trust level
    VeryHigh,
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::VeryHigh => write!(f, "Very High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_level_ordering() {
        assert!(TrustLevel::VeryHigh > TrustLevel::High);
        assert!(TrustLevel::High > TrustLevel::Medium);
        assert!(TrustLevel::Medium > TrustLevel::Low);
        assert!(TrustLevel::Low > TrustLevel::None);
    }

    #[test]
    fn test_trust_level_default_is_medium() {
        assert_eq!(TrustLevel::default(), TrustLevel::Medium);
    }
}
