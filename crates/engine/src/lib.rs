//! Trust evaluation engine for the TrustGate SDK
//!
//! Ties the rule registry, verification scorers, anomaly detector, input
//! validator, decision cache, and audit trail together behind the
//! [`TrustEngine`] facade. One call to [`TrustEngine::assess_trust`]
//! evaluates every applicable rule against a context and returns an
//! immutable [`trustgate_types::Assessment`] carrying the enforcement
//! decision.

mod audit;
mod cache;
mod config;
mod engine;
mod scoring;

pub use audit::{AuditQuery, AuditStats, AuditTrail};
pub use cache::DecisionCache;
pub use config::EngineConfig;
pub use engine::{DecisionCounts, EngineStats, TrustEngine, ViolationFilter};
pub use scoring::{classify_risk, confidence_score, decide};

use thiserror::Error;

/// Errors that can occur in the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Rule error: {0}")]
    Rule(#[from] trustgate_rules::RuleError),

    #[error("Input validation error: {0}")]
    Input(#[from] trustgate_input::InputError),

    #[error("Verification error: {0}")]
    Verify(#[from] trustgate_verify::VerifyError),

    #[error("Data model error: {0}")]
    Model(#[from] trustgate_types::ModelError),

    #[error("Audit error: {0}")]
    Audit(String),

    #[error("Violation not found: {0}")]
    UnknownViolation(uuid::Uuid),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
