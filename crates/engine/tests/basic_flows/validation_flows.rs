//! Basic input validation flow tests for the engine crate.
//! These tests verify the default validation rules through the facade.

use std::sync::Arc;

use trustgate_engine::{AuditQuery, EngineConfig, TrustEngine};
use trustgate_types::{
    AuditEventKind, InputData, InputType, RiskLevel, TrustContext, ValidationAction,
    ValidationRule, ValidationVerdict,
};
use trustgate_verify::{AcceptAllAttestor, AcceptAllVerifier};

fn make_engine() -> TrustEngine {
    TrustEngine::new(
        EngineConfig::default(),
        Arc::new(AcceptAllVerifier),
        Arc::new(AcceptAllAttestor),
    )
}

fn make_context() -> TrustContext {
    TrustContext::new("alice", "sess-1", "submit_comment", "post:42")
}

#[tokio::test]
async fn test_sql_injection_payload_is_blocked() {
    let engine = make_engine();
    let outcome = engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Text, "\"; DROP TABLE users;"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.verdict, ValidationVerdict::Malicious);
    assert_eq!(outcome.action_taken, Some(ValidationAction::Block));
    assert!(!outcome.is_acceptable());
}

#[tokio::test]
async fn test_xss_payload_is_blocked() {
    let engine = make_engine();
    let outcome = engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Text, "<script>alert(1)</script>"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.verdict, ValidationVerdict::Malicious);
    assert_eq!(outcome.action_taken, Some(ValidationAction::Block));
}

#[tokio::test]
async fn test_plain_text_passes_all_default_rules() {
    let engine = make_engine();
    let outcome = engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Text, "hello world"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.verdict, ValidationVerdict::Valid);
    assert!(outcome.matched_rule_ids.is_empty());
    assert!(outcome.is_acceptable());
}

#[tokio::test]
async fn test_validation_outcomes_are_audited() {
    let engine = make_engine();
    engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Text, "hello world"),
        )
        .await
        .unwrap();
    engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Text, "<script>alert(1)</script>"),
        )
        .await
        .unwrap();

    let events = engine.audit_events(
        &AuditQuery::new()
            .for_user("alice")
            .of_kind(AuditEventKind::InputValidation),
    );
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_custom_validation_rule_extends_defaults() {
    let engine = make_engine();
    engine
        .input_validator()
        .add_rule(ValidationRule {
            id: "internal-hostnames".to_string(),
            input_type: Some(InputType::Url),
            pattern: r"(?i)\.corp\.internal\b".to_string(),
            action: ValidationAction::Block,
            severity: RiskLevel::High,
            priority: 95,
            description: "Internal hostnames must not appear in URLs".to_string(),
            max_size_bytes: None,
        })
        .await
        .unwrap();

    let outcome = engine
        .validate_input(
            &make_context(),
            &InputData::new(InputType::Url, "https://db1.corp.internal/dump"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.verdict, ValidationVerdict::Malicious);
    assert_eq!(outcome.matched_rule_ids, vec!["internal-hostnames"]);
}
