//! Condition evaluation and rule storage for the TrustGate SDK
//!
//! This crate provides the two read-heavy building blocks of the engine:
//! - [`ConditionEvaluator`]: a total, fail-closed evaluator for declarative
//!   conditions against a [`trustgate_types::TrustContext`]
//! - [`RuleRegistry`]: a concurrent, validated collection of trust rules
//!   with type-indexed lookup and JSON round-tripping

mod evaluator;
mod registry;

pub use evaluator::ConditionEvaluator;
pub use registry::{RuleChange, RuleRegistry};

use thiserror::Error;

/// Errors that can occur during rule management
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("Unknown rule id: {0}")]
    UnknownRule(String),

    #[error("Rule set load error: {0}")]
    Load(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;
