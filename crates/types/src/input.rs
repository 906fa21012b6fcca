use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RiskLevel;

/// Declared type of a raw input payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Command,
    FilePath,
    FileUpload,
    Url,
    Password,
    Email,
}

/// A raw payload submitted for validation before it reaches a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    /// Declared payload type; selects which rules apply
    pub input_type: InputType,
    /// The payload itself
    pub content: String,
    /// Payload size; for uploads this may exceed `content.len()`
    pub size_bytes: u64,
}

impl InputData {
    /// Create an input payload, deriving size from the content.
    pub fn new(input_type: InputType, content: impl Into<String>) -> Self {
        let content = content.into();
        let size_bytes = content.len() as u64;
        Self {
            input_type,
            content,
            size_bytes,
        }
    }

    /// Override the payload size (file uploads carry their full size).
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

/// What a validation rule does when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationAction {
    /// Stop processing and report the payload as malicious
    Block,
    /// Strip the matched content and continue as suspicious
    Sanitize,
    /// Record a warning only
    LogOnly,
}

/// A pattern rule applied to raw input payloads.
///
/// Validation rules are data: the built-in defaults can be replaced or
/// extended at runtime without touching the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Unique identifier within a validator
    pub id: String,
    /// Payload type this rule applies to; `None` applies to every type
    #[serde(default)]
    pub input_type: Option<InputType>,
    /// Regex pattern tested against the payload
    pub pattern: String,
    /// What to do on a match
    pub action: ValidationAction,
    /// Severity reported when the rule fires
    pub severity: RiskLevel,
    /// Higher priority evaluates first
    #[serde(default)]
    pub priority: i64,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Maximum allowed payload size; the rule fires when exceeded
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
}

/// Overall verdict for a validated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationVerdict {
    /// No rule matched
    Valid,
    /// Sanitization was applied or a log-only rule fired
    Suspicious,
    /// A blocking rule matched
    Malicious,
}

/// Result of validating one input payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Overall verdict
    pub verdict: ValidationVerdict,
    /// The strongest action taken
    pub action_taken: Option<ValidationAction>,
    /// Content after sanitization, when any was applied
    #[serde(default)]
    pub sanitized_content: Option<String>,
    /// Rules that fired, in evaluation order
    pub matched_rule_ids: Vec<String>,
    /// Non-fatal warnings
    pub warnings: Vec<String>,
    /// When validation completed
    pub validated_at: DateTime<Utc>,
}

impl ValidationOutcome {
    /// Outcome for a payload no rule matched.
    pub fn valid() -> Self {
        Self {
            verdict: ValidationVerdict::Valid,
            action_taken: None,
            sanitized_content: None,
            matched_rule_ids: Vec::new(),
            warnings: Vec::new(),
            validated_at: Utc::now(),
        }
    }

    /// Whether the payload may proceed (possibly sanitized).
    pub fn is_acceptable(&self) -> bool {
        self.verdict != ValidationVerdict::Malicious
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_data_size_derivation() {
        let input = InputData::new(InputType::Text, "hello");
        assert_eq!(input.size_bytes, 5);

        let upload = InputData::new(InputType::FileUpload, "manifest").with_size(1 << 20);
        assert_eq!(upload.size_bytes, 1 << 20);
    }

    #[test]
    fn test_verdict_ordering() {
        assert!(ValidationVerdict::Malicious > ValidationVerdict::Suspicious);
        assert!(ValidationVerdict::Suspicious > ValidationVerdict::Valid);
    }

    #[test]
    fn test_outcome_acceptability() {
        let valid = ValidationOutcome::valid();
        assert!(valid.is_acceptable());

        let mut blocked = ValidationOutcome::valid();
        blocked.verdict = ValidationVerdict::Malicious;
        assert!(!blocked.is_acceptable());
    }

    #[test]
    fn test_validation_rule_serde_round_trip() {
        let rule = ValidationRule {
            id: "sql-keywords".to_string(),
            input_type: Some(InputType::Text),
            pattern: r"(?i)\b(drop|delete)\s+table\b".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::Critical,
            priority: 100,
            description: "SQL injection keywords".to_string(),
            max_size_bytes: None,
        };
        let json = serde_json::to_string(&rule).unwrap();
        let back: ValidationRule = serde_json::from_str(&json).unwrap();
        assert_eq!(rule, back);
    }
}
