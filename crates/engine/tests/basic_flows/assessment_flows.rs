//! Basic assessment flow tests for the engine crate.
//! These tests verify the end-to-end scoring, risk, and decision paths.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use trustgate_engine::{AuditQuery, EngineConfig, TrustEngine};
use trustgate_types::{
    AuditEventKind, Condition, ConditionOperator, EnforcementDecision, PolicyType, RiskLevel,
    RuleAction, TrustContext, TrustLevel, TrustRule, VerificationMethod,
};
use trustgate_verify::{AcceptAllAttestor, AcceptAllVerifier, RejectAllAttestor};

fn make_engine() -> TrustEngine {
    TrustEngine::new(
        EngineConfig::default(),
        Arc::new(AcceptAllVerifier),
        Arc::new(AcceptAllAttestor),
    )
}

fn daytime_context(user: &str, operation: &str) -> TrustContext {
    TrustContext::new(user, "sess-1", operation, "wallet:primary")
        .with_timestamp(Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap())
}

fn verified_rule() -> TrustRule {
    TrustRule::new(
        "verified-transfer",
        "Transfers require signature and device",
        PolicyType::Authentication,
        RuleAction::Warn,
        1.0,
    )
    .unwrap()
    .with_condition(Condition::new(
        "operation",
        ConditionOperator::Equals,
        "wallet_transfer",
    ))
    .with_methods(vec![
        VerificationMethod::SignatureVerification,
        VerificationMethod::HardwareWallet,
    ])
}

#[tokio::test]
async fn test_unverified_night_operation_is_refused() {
    // No rules installed and an operation at 02:00: nothing vouches for
    // this call, so the engine fails closed.
    let engine = make_engine();
    let context = TrustContext::new("alice", "sess-1", "wallet_transfer", "wallet:primary")
        .with_timestamp(Utc.with_ymd_and_hms(2025, 6, 2, 2, 0, 0).unwrap());

    let assessment = engine
        .assess_trust(&context, Some(TrustLevel::Medium))
        .await
        .unwrap();

    assert_eq!(assessment.overall_trust_score, 0.0);
    assert!(assessment.risk_level >= RiskLevel::High);
    assert!(matches!(
        assessment.recommended_action,
        EnforcementDecision::Challenge
            | EnforcementDecision::Quarantine
            | EnforcementDecision::Deny
    ));
}

#[tokio::test]
async fn test_fully_verified_transfer_is_allowed() {
    let engine = make_engine();
    engine.create_rule(verified_rule()).await.unwrap();

    let context = daytime_context("alice", "wallet_transfer")
        .with_device_fingerprint("ledger-1")
        .with_request_data("signed_payload", serde_json::json!("transfer:250"))
        .with_request_data("signature", serde_json::json!("sig-bytes"))
        .with_request_data("public_key", serde_json::json!("key-1"));

    let assessment = engine
        .assess_trust(&context, Some(TrustLevel::Medium))
        .await
        .unwrap();

    // Signature 1.0 and hardware presence 0.9 average to 0.95.
    assert!((assessment.overall_trust_score - 0.95).abs() < 1e-9);
    assert_eq!(assessment.risk_level, RiskLevel::Minimal);
    assert_eq!(assessment.recommended_action, EnforcementDecision::Allow);
    assert!(assessment.anomalies_detected.is_empty());
    assert_eq!(assessment.verification_methods_used.len(), 2);
}

#[tokio::test]
async fn test_absent_device_degrades_to_challenge_or_worse() {
    let engine = TrustEngine::new(
        EngineConfig::default(),
        Arc::new(AcceptAllVerifier),
        Arc::new(RejectAllAttestor),
    );
    engine.create_rule(verified_rule()).await.unwrap();

    let context = daytime_context("alice", "wallet_transfer")
        .with_device_fingerprint("ledger-1")
        .with_request_data("signed_payload", serde_json::json!("transfer:250"))
        .with_request_data("signature", serde_json::json!("sig-bytes"))
        .with_request_data("public_key", serde_json::json!("key-1"));

    let assessment = engine
        .assess_trust(&context, Some(TrustLevel::Medium))
        .await
        .unwrap();

    // Signature 1.0, hardware 0.0: score 0.5 plus a low-score anomaly.
    assert!((assessment.overall_trust_score - 0.5).abs() < 1e-9);
    assert_ne!(assessment.recommended_action, EnforcementDecision::Allow);
    assert!(assessment
        .warnings
        .iter()
        .any(|warning| warning.contains("not present")));
}

#[tokio::test]
async fn test_assessment_is_idempotent_within_ttl() {
    let engine = make_engine();
    engine.create_rule(verified_rule()).await.unwrap();

    let context = daytime_context("alice", "wallet_transfer")
        .with_device_fingerprint("ledger-1")
        .with_request_data("signed_payload", serde_json::json!("transfer:250"))
        .with_request_data("signature", serde_json::json!("sig-bytes"))
        .with_request_data("public_key", serde_json::json!("key-1"));

    let first = engine.assess_trust(&context, None).await.unwrap();
    let second = engine.assess_trust(&context, None).await.unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.overall_trust_score, second.overall_trust_score);
    assert_eq!(first.risk_level, second.risk_level);
    assert_eq!(first.recommended_action, second.recommended_action);

    // The cache hit performed no second audit write.
    let events = engine.audit_events(
        &AuditQuery::new()
            .for_user("alice")
            .of_kind(AuditEventKind::Assessment),
    );
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_higher_required_level_challenges_medium_risk() {
    let engine = make_engine();
    // One passing rule, one failing: aggregate lands in the medium band.
    engine.create_rule(verified_rule()).await.unwrap();
    let failing = TrustRule::new(
        "device-context",
        "Device fingerprint expected",
        PolicyType::AccessControl,
        RuleAction::Warn,
        0.8,
    )
    .unwrap()
    .with_condition(Condition::new(
        "device_fingerprint",
        ConditionOperator::Exists,
        "",
    ));
    engine.create_rule(failing).await.unwrap();

    // Signature and hardware pass but no device fingerprint on the
    // context, so the access-control rule contributes zero.
    let context = daytime_context("alice", "wallet_transfer")
        .with_request_data("device_id", serde_json::json!("ledger-1"))
        .with_request_data("signed_payload", serde_json::json!("transfer:250"))
        .with_request_data("signature", serde_json::json!("sig-bytes"))
        .with_request_data("public_key", serde_json::json!("key-1"));

    let medium = engine
        .assess_trust(&context, Some(TrustLevel::Medium))
        .await
        .unwrap();
    let high = engine
        .assess_trust(&context, Some(TrustLevel::High))
        .await
        .unwrap();

    // Same evidence, stricter caller: the decision can only get harder.
    assert!(medium.overall_trust_score < 0.7);
    assert_ne!(high.recommended_action, EnforcementDecision::Allow);
}

#[tokio::test]
async fn test_rule_round_trip_through_save_and_load() {
    let engine = make_engine();
    engine.create_rule(verified_rule()).await.unwrap();
    let saved = engine.save_rules().await.unwrap();

    let other = make_engine();
    let loaded = other.load_rules(&saved).await.unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(
        other.get_rule("verified-transfer").await.unwrap(),
        engine.get_rule("verified-transfer").await.unwrap()
    );
}
