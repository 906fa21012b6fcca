//! Engine configuration.

use trustgate_types::TrustLevel;
use trustgate_verify::{AnomalyConfig, VerifyConfig, TRUST_NOTHING_TIMEOUT_SECONDS};

/// Configuration for a [`crate::TrustEngine`] instance.
///
/// The defaults implement the trust-nothing posture: short-lived decisions,
/// bounded audit retention, and a medium trust floor.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scorer configuration (normal hours, origin lists, timeouts)
    pub verify: VerifyConfig,
    /// Anomaly heuristic toggles and thresholds
    pub anomaly: AnomalyConfig,
    /// Seconds a cached decision stays servable
    pub cache_ttl_seconds: u64,
    /// Maximum audit events retained before the oldest are dropped
    pub max_audit_entries: usize,
    /// Days an audit event is retained before purge
    pub audit_retention_days: i64,
    /// Trust level required when the caller does not supply one
    pub default_required_trust: TrustLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify: VerifyConfig::default(),
            anomaly: AnomalyConfig::default(),
            cache_ttl_seconds: TRUST_NOTHING_TIMEOUT_SECONDS,
            max_audit_entries: 10_000,
            audit_retention_days: 30,
            default_required_trust: TrustLevel::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_trust_nothing_posture() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl_seconds, TRUST_NOTHING_TIMEOUT_SECONDS);
        assert_eq!(config.max_audit_entries, 10_000);
        assert_eq!(config.audit_retention_days, 30);
        assert_eq!(config.default_required_trust, TrustLevel::Medium);
    }
}
