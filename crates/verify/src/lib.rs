//! Verification method scorers and anomaly detection for the TrustGate SDK
//!
//! This crate implements the pluggable checks that feed the trust score:
//! - Collaborator traits for signature and hardware-device verification
//!   (the engine never performs cryptography itself)
//! - One scorer per [`trustgate_types::VerificationMethod`], each returning
//!   a partial score plus anomaly and warning strings
//! - Behavioral history tracking and the anomaly heuristics

mod anomaly;
mod collaborators;
mod history;
mod scorers;

pub use anomaly::{AnomalyConfig, AnomalyDetector};
pub use collaborators::{
    AcceptAllAttestor, AcceptAllVerifier, DeviceAttestor, RejectAllAttestor, RejectAllVerifier,
    SignatureVerifier,
};
pub use history::{BehaviorHistory, Familiarity};
pub use scorers::{MethodScore, VerificationSuite, VerifyConfig};

use thiserror::Error;

/// Seconds an assessment or collaborator call stays trusted; nothing is
/// trusted for longer without re-verification.
pub const TRUST_NOTHING_TIMEOUT_SECONDS: u64 = 30;

/// Errors that can occur during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Collaborator call timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, VerifyError>;
