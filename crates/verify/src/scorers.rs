//! One scorer per verification method.
//!
//! Each scorer maps `(method, context)` to a partial score in [0, 1] plus
//! anomaly and warning strings. Scorers never error out of an assessment:
//! missing material, collaborator failures, and timeouts all degrade to a
//! zero score with a warning.

use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use tracing::warn;

use trustgate_types::{
    AnomalyDetection, AnomalyType, RiskLevel, TrustContext, VerificationMethod,
};

use crate::collaborators::{DeviceAttestor, SignatureVerifier};
use crate::history::BehaviorHistory;
use crate::{Result, VerifyError, TRUST_NOTHING_TIMEOUT_SECONDS};

/// Score reported by a hardware attestor that confirms presence. Presence is
/// strong evidence but not a cryptographic binding, so it stays below 1.0.
const HARDWARE_PRESENT_SCORE: f64 = 0.9;

/// Score for an operation outside the configured normal-hours window.
const OFF_HOURS_SCORE: f64 = 0.4;

/// Neutral score when a user has no behavioral history yet.
const NO_HISTORY_SCORE: f64 = 0.5;

/// Configuration for the verification scorers.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Local hours considered normal operating time, `[start, end)`
    pub normal_hours: (u32, u32),
    /// Origin prefixes treated as known-good (e.g. `"10.1."`)
    pub allowed_origins: Vec<String>,
    /// Origin prefixes refused outright
    pub denied_origins: Vec<String>,
    /// Timeout applied to every collaborator call
    pub collaborator_timeout: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            normal_hours: (6, 22),
            allowed_origins: Vec::new(),
            denied_origins: Vec::new(),
            collaborator_timeout: Duration::from_secs(TRUST_NOTHING_TIMEOUT_SECONDS),
        }
    }
}

/// Partial result contributed by one verification method.
#[derive(Debug, Clone)]
pub struct MethodScore {
    /// The method that produced this score
    pub method: VerificationMethod,
    /// Partial trust score in [0, 1]
    pub score: f64,
    /// Anomalies detected while scoring
    pub anomalies: Vec<AnomalyDetection>,
    /// Non-fatal warnings
    pub warnings: Vec<String>,
}

impl MethodScore {
    fn new(method: VerificationMethod, score: f64) -> Self {
        Self {
            method,
            score: score.clamp(0.0, 1.0),
            anomalies: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    fn with_anomaly(mut self, anomaly: AnomalyDetection) -> Self {
        self.anomalies.push(anomaly);
        self
    }
}

/// Owns the collaborators and per-method scoring logic.
pub struct VerificationSuite {
    config: VerifyConfig,
    signer: Arc<dyn SignatureVerifier>,
    attestor: Arc<dyn DeviceAttestor>,
    history: BehaviorHistory,
}

impl VerificationSuite {
    pub fn new(
        config: VerifyConfig,
        signer: Arc<dyn SignatureVerifier>,
        attestor: Arc<dyn DeviceAttestor>,
    ) -> Self {
        Self {
            config,
            signer,
            attestor,
            history: BehaviorHistory::default(),
        }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// The rolling behavior history backing the behavioral scorer.
    pub fn history(&self) -> &BehaviorHistory {
        &self.history
    }

    /// Record a completed operation into the behavior history.
    pub fn record_behavior(&self, context: &TrustContext) {
        self.history.record(&context.user_id, &context.operation);
    }

    /// Score one verification method against a context.
    pub async fn score_method(
        &self,
        method: VerificationMethod,
        context: &TrustContext,
    ) -> MethodScore {
        match method {
            VerificationMethod::SignatureVerification => self.score_signature(context).await,
            VerificationMethod::HardwareWallet => self.score_hardware(context).await,
            VerificationMethod::TimeBased => self.score_time(context),
            VerificationMethod::BehavioralAnalysis => self.score_behavior(context),
            VerificationMethod::NetworkAnalysis => self.score_network(context),
        }
    }

    /// Call the signature collaborator with the configured timeout.
    pub async fn verify_signature_raw(
        &self,
        context: &TrustContext,
        data: &[u8],
        signature: &[u8],
        public_key: &str,
    ) -> Result<bool> {
        let call = self.signer.verify(context, data, signature, public_key);
        match tokio::time::timeout(self.config.collaborator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::Timeout(
                self.config.collaborator_timeout.as_secs(),
            )),
        }
    }

    /// Call the device attestor with the configured timeout.
    pub async fn verify_presence_raw(
        &self,
        context: &TrustContext,
        device_id: &str,
        wallet_type: &str,
    ) -> Result<bool> {
        let call = self.attestor.is_present(context, device_id, wallet_type);
        match tokio::time::timeout(self.config.collaborator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::Timeout(
                self.config.collaborator_timeout.as_secs(),
            )),
        }
    }

    async fn score_signature(&self, context: &TrustContext) -> MethodScore {
        let method = VerificationMethod::SignatureVerification;
        let payload = context
            .request_data
            .get("signed_payload")
            .and_then(|v| v.as_str());
        let signature = context
            .request_data
            .get("signature")
            .and_then(|v| v.as_str());
        let public_key = context
            .request_data
            .get("public_key")
            .and_then(|v| v.as_str());

        let (payload, signature, public_key) = match (payload, signature, public_key) {
            (Some(p), Some(s), Some(k)) => (p, s, k),
            _ => {
                return MethodScore::new(method, 0.0)
                    .with_warning("no signature material in context");
            }
        };

        match self
            .verify_signature_raw(context, payload.as_bytes(), signature.as_bytes(), public_key)
            .await
        {
            Ok(true) => MethodScore::new(method, 1.0),
            Ok(false) => MethodScore::new(method, 0.0).with_warning("signature did not verify"),
            Err(err) => {
                warn!(user_id = %context.user_id, %err, "signature collaborator failed");
                MethodScore::new(method, 0.0)
                    .with_warning(format!("signature verification unavailable: {}", err))
            }
        }
    }

    async fn score_hardware(&self, context: &TrustContext) -> MethodScore {
        let method = VerificationMethod::HardwareWallet;
        let device_id = context
            .device_fingerprint
            .as_deref()
            .or_else(|| context.request_data.get("device_id").and_then(|v| v.as_str()));
        let device_id = match device_id {
            Some(id) => id,
            None => {
                return MethodScore::new(method, 0.0)
                    .with_warning("no device identifier in context");
            }
        };
        let wallet_type = context
            .request_data
            .get("wallet_type")
            .and_then(|v| v.as_str())
            .unwrap_or("generic");

        match self.verify_presence_raw(context, device_id, wallet_type).await {
            Ok(true) => MethodScore::new(method, HARDWARE_PRESENT_SCORE),
            Ok(false) => {
                MethodScore::new(method, 0.0).with_warning("hardware device not present")
            }
            Err(err) => {
                warn!(user_id = %context.user_id, %err, "device attestor failed");
                MethodScore::new(method, 0.0)
                    .with_warning(format!("device attestation unavailable: {}", err))
            }
        }
    }

    fn score_time(&self, context: &TrustContext) -> MethodScore {
        let method = VerificationMethod::TimeBased;
        let hour = context.timestamp.hour();
        let (start, end) = self.config.normal_hours;
        if hour >= start && hour < end {
            MethodScore::new(method, 1.0)
        } else {
            MethodScore::new(method, OFF_HOURS_SCORE).with_warning(format!(
                "operation at hour {} outside normal hours {:02}:00-{:02}:00",
                hour, start, end
            ))
        }
    }

    fn score_behavior(&self, context: &TrustContext) -> MethodScore {
        let method = VerificationMethod::BehavioralAnalysis;
        match self.history.familiarity(&context.user_id, &context.operation) {
            None => MethodScore::new(method, NO_HISTORY_SCORE)
                .with_warning("no behavioral history for user"),
            Some(familiarity) => {
                let frequency = familiarity.matching as f64 / familiarity.total as f64;
                let score = 0.4 + 0.6 * frequency;
                let mut result = MethodScore::new(method, score);
                if familiarity.matching == 0 && familiarity.total >= 10 {
                    result = result.with_anomaly(AnomalyDetection::new(
                        AnomalyType::Behavioral,
                        RiskLevel::Medium,
                        0.7,
                        format!(
                            "operation '{}' never seen in {} recorded operations",
                            context.operation, familiarity.total
                        ),
                    ));
                }
                result
            }
        }
    }

    fn score_network(&self, context: &TrustContext) -> MethodScore {
        let method = VerificationMethod::NetworkAnalysis;
        let ip = match context.source_ip.as_deref() {
            Some(ip) => ip,
            None => {
                return MethodScore::new(method, 0.3).with_warning("no source address in context");
            }
        };

        if self
            .config
            .denied_origins
            .iter()
            .any(|prefix| ip.starts_with(prefix.as_str()))
        {
            return MethodScore::new(method, 0.0).with_anomaly(AnomalyDetection::new(
                AnomalyType::Network,
                RiskLevel::High,
                0.9,
                format!("request from deny-listed origin {}", ip),
            ));
        }
        if ip.starts_with("127.") || ip == "::1" {
            return MethodScore::new(method, 1.0);
        }
        if self
            .config
            .allowed_origins
            .iter()
            .any(|prefix| ip.starts_with(prefix.as_str()))
        {
            return MethodScore::new(method, 0.9);
        }
        if is_private_origin(ip) {
            return MethodScore::new(method, 0.7);
        }
        MethodScore::new(method, 0.4).with_warning(format!("unknown network origin {}", ip))
    }
}

fn is_private_origin(ip: &str) -> bool {
    if ip.starts_with("10.") || ip.starts_with("192.168.") {
        return true;
    }
    // 172.16.0.0/12
    if let Some(rest) = ip.strip_prefix("172.") {
        if let Some((octet, _)) = rest.split_once('.') {
            if let Ok(n) = octet.parse::<u8>() {
                return (16..=31).contains(&n);
            }
        }
    }
    false
}
