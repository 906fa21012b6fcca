//! Input validation sub-engine for the TrustGate SDK
//!
//! Validates raw payloads (text, commands, file paths, uploads) against a
//! prioritized set of pattern rules before they reach a handler. Ships with
//! default rules for the common injection families; deployments can replace
//! or extend them at runtime.

mod defaults;
mod validator;

pub use defaults::default_rules;
pub use validator::InputValidator;

use thiserror::Error;

/// Errors that can occur managing validation rules
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid pattern in rule '{id}': {source}")]
    Pattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Validation rule already exists: {0}")]
    DuplicateRule(String),

    #[error("Validation rule not found: {0}")]
    UnknownRule(String),
}

/// Result type for input validation operations
pub type Result<T> = std::result::Result<T, InputError>;
