use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trustgate_engine::{EngineConfig, TrustEngine, ViolationFilter};
use trustgate_types::{
    Condition, ConditionOperator, InputData, InputType, PolicyType, RuleAction, TrustContext,
    TrustRule, VerificationMethod,
};
use trustgate_verify::{AcceptAllAttestor, AcceptAllVerifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    info!("Starting TrustGate SDK demo...");

    // 1. Build an engine with accepting stub collaborators
    let engine = TrustEngine::new(
        EngineConfig::default(),
        Arc::new(AcceptAllVerifier),
        Arc::new(AcceptAllAttestor),
    );

    // 2. Install a scoring rule and an absolute deny rule
    let scoring = TrustRule::new(
        "verified-transfer",
        "Transfers require signature and device",
        PolicyType::Authentication,
        RuleAction::Warn,
        1.0,
    )?
    .with_condition(Condition::new(
        "operation",
        ConditionOperator::Equals,
        "wallet_transfer",
    ))
    .with_methods(vec![
        VerificationMethod::SignatureVerification,
        VerificationMethod::HardwareWallet,
    ]);
    engine.create_rule(scoring).await?;

    let deny = TrustRule::new(
        "block-key-export",
        "Key export is never allowed",
        PolicyType::Security,
        RuleAction::Deny,
        1.0,
    )?
    .with_condition(Condition::new(
        "operation",
        ConditionOperator::Equals,
        "export_keys",
    ))
    .with_priority(100);
    engine.create_rule(deny).await?;

    // 3. A fully verified transfer is allowed
    let transfer = TrustContext::new("alice", "sess-1", "wallet_transfer", "wallet:primary")
        .with_device_fingerprint("ledger-1")
        .with_source_ip("127.0.0.1")
        .with_request_data("signed_payload", serde_json::json!("transfer:250"))
        .with_request_data("signature", serde_json::json!("sig-bytes"))
        .with_request_data("public_key", serde_json::json!("key-1"));
    let assessment = engine.assess_trust(&transfer, None).await?;
    info!(
        "Transfer assessed: score {:.2}, risk {}, decision {}",
        assessment.overall_trust_score, assessment.risk_level, assessment.recommended_action
    );

    // 4. A key export hits the absolute deny rule
    let export = TrustContext::new("alice", "sess-1", "export_keys", "wallet:primary");
    let denied = engine.assess_trust(&export, None).await?;
    info!(
        "Key export assessed: decision {} (risk {})",
        denied.recommended_action, denied.risk_level
    );

    // 5. The input validator blocks an injection attempt
    let payload = InputData::new(InputType::Text, "'; DROP TABLE users;--");
    let outcome = engine.validate_input(&export, &payload).await?;
    info!(
        "Injection payload verdict: {:?} (matched rules: {:?})",
        outcome.verdict, outcome.matched_rule_ids
    );

    // 6. Summarize what the engine recorded
    let stats = engine.get_statistics().await;
    info!("Engine statistics:");
    info!("  Rules installed: {}", stats.total_rules);
    info!(
        "  Assessments: {} allow, {} deny",
        stats.assessments.allow, stats.assessments.deny
    );
    info!(
        "  Violations open: {} (from the deny rule)",
        stats.violations_open
    );
    info!("  Audit events retained: {}", stats.audit_events);

    for violation in engine.get_violations(&ViolationFilter::new().open_only()) {
        info!(
            "  Open violation: rule '{}' severity {}",
            violation.rule_id, violation.severity
        );
    }

    info!("Demo completed successfully!");
    Ok(())
}
