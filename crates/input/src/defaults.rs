//! Built-in validation rules for the common injection families.

use trustgate_types::{InputType, RiskLevel, ValidationAction, ValidationRule};

/// Largest upload accepted by the default rule set.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// The default rule set applied by [`crate::InputValidator::with_default_rules`].
///
/// Patterns are intentionally conservative: they target well-known attack
/// markers rather than attempting full grammar detection, so benign prose
/// passes untouched.
pub fn default_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule {
            id: "sql-injection".to_string(),
            input_type: Some(InputType::Text),
            pattern: r"(?i)\b(union\s+select|drop\s+table|insert\s+into|delete\s+from|exec\s*\()|'\s*or\s+'1'\s*=\s*'1|--\s*$".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::Critical,
            priority: 100,
            description: "SQL injection markers".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "xss-script".to_string(),
            input_type: None,
            pattern: r"(?i)<\s*script[^>]*>|javascript\s*:|on(load|error|click|mouseover)\s*=".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::High,
            priority: 90,
            description: "Cross-site scripting markers".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "shell-metacharacters".to_string(),
            input_type: Some(InputType::Command),
            pattern: r"[;&|`]|\$\(".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::High,
            priority: 85,
            description: "Shell command chaining and substitution".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "path-traversal".to_string(),
            input_type: Some(InputType::FilePath),
            pattern: r"\.\./|\.\.\\|%2e%2e".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::High,
            priority: 80,
            description: "Directory traversal sequences".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "null-bytes".to_string(),
            input_type: None,
            pattern: r"\x00".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::Medium,
            priority: 70,
            description: "Embedded null bytes".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "oversize-upload".to_string(),
            input_type: Some(InputType::FileUpload),
            pattern: String::new(),
            action: ValidationAction::Block,
            severity: RiskLevel::Medium,
            priority: 60,
            description: "Upload exceeds the size ceiling".to_string(),
            max_size_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
        },
        ValidationRule {
            id: "embedded-html".to_string(),
            input_type: Some(InputType::Text),
            pattern: r"<[a-zA-Z/][^>]*>".to_string(),
            action: ValidationAction::Sanitize,
            severity: RiskLevel::Low,
            priority: 50,
            description: "HTML tags stripped from plain text".to_string(),
            max_size_bytes: None,
        },
        ValidationRule {
            id: "control-characters".to_string(),
            input_type: Some(InputType::Text),
            pattern: r"[\x01-\x08\x0b\x0c\x0e-\x1f]".to_string(),
            action: ValidationAction::LogOnly,
            severity: RiskLevel::Low,
            priority: 10,
            description: "Non-printable control characters".to_string(),
            max_size_bytes: None,
        },
    ]
}
