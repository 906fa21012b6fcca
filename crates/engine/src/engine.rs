//! The [`TrustEngine`] facade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use trustgate_input::InputValidator;
use trustgate_rules::{ConditionEvaluator, RuleRegistry};
use trustgate_types::{
    Assessment, AuditEvent, AuditEventKind, EnforcementDecision, InputData, RiskLevel,
    RuleAction, RuleStatus, TrustContext, TrustLevel, TrustRule, ValidationOutcome, Violation,
};
use trustgate_verify::{
    AnomalyDetector, DeviceAttestor, SignatureVerifier, VerificationSuite,
};

use crate::audit::{AuditQuery, AuditStats, AuditTrail};
use crate::cache::DecisionCache;
use crate::config::EngineConfig;
use crate::scoring::{aggregate_score, classify_risk, confidence_score, decide, lift_decision};
use crate::{EngineError, Result};

/// Builder-style filter over recorded violations.
#[derive(Debug, Clone, Default)]
pub struct ViolationFilter {
    user_id: Option<String>,
    rule_id: Option<String>,
    open_only: bool,
}

impl ViolationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only violations recorded against this user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Only violations of this rule.
    pub fn for_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Only violations that have not been resolved.
    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    fn matches(&self, violation: &Violation) -> bool {
        if let Some(user_id) = &self.user_id {
            if &violation.user_id != user_id {
                return false;
            }
        }
        if let Some(rule_id) = &self.rule_id {
            if &violation.rule_id != rule_id {
                return false;
            }
        }
        !(self.open_only && !violation.is_open())
    }
}

/// Counters kept per enforcement decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionCounts {
    pub allow: u64,
    pub challenge: u64,
    pub quarantine: u64,
    pub deny: u64,
    pub log: u64,
    pub cache_hits: u64,
}

impl DecisionCounts {
    fn bump(&mut self, decision: EnforcementDecision) {
        match decision {
            EnforcementDecision::Allow => self.allow += 1,
            EnforcementDecision::Challenge => self.challenge += 1,
            EnforcementDecision::Quarantine => self.quarantine += 1,
            EnforcementDecision::Deny => self.deny += 1,
            EnforcementDecision::Log => self.log += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.allow + self.challenge + self.quarantine + self.deny + self.log
    }
}

/// Point-in-time summary of engine state.
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Rules in the registry
    pub total_rules: usize,
    /// Rule counts per lifecycle status
    pub rules_by_status: HashMap<RuleStatus, usize>,
    /// Assessment counters per decision
    pub assessments: DecisionCounts,
    /// Violations not yet resolved
    pub violations_open: usize,
    /// Violations resolved
    pub violations_resolved: usize,
    /// Decisions currently cached
    pub cache_entries: usize,
    /// Audit events currently retained
    pub audit_events: usize,
}

/// Outcome of evaluating the rule set against one context, before audit and
/// caching.
struct Evaluation {
    score: f64,
    risk: RiskLevel,
    decision: EnforcementDecision,
    methods_used: Vec<trustgate_types::VerificationMethod>,
    anomalies: Vec<trustgate_types::AnomalyDetection>,
    warnings: Vec<String>,
    violations: Vec<Violation>,
}

/// Policy and trust evaluation engine.
///
/// One instance owns its registry, validator, cache, and audit trail; there
/// is no global state. All methods take `&self` and are safe to call
/// concurrently.
pub struct TrustEngine {
    config: EngineConfig,
    registry: RuleRegistry,
    evaluator: ConditionEvaluator,
    suite: VerificationSuite,
    detector: AnomalyDetector,
    validator: InputValidator,
    cache: DecisionCache,
    audit: AuditTrail,
    violations: Mutex<Vec<Violation>>,
    counters: Mutex<DecisionCounts>,
}

impl TrustEngine {
    /// Create an engine with the given collaborators. The input validator
    /// starts with the default rule set; the trust-rule registry starts
    /// empty, which fails closed until rules are installed.
    pub fn new(
        config: EngineConfig,
        signer: Arc<dyn SignatureVerifier>,
        attestor: Arc<dyn DeviceAttestor>,
    ) -> Self {
        let suite = VerificationSuite::new(config.verify.clone(), signer, attestor);
        let detector = AnomalyDetector::new(config.anomaly.clone());
        let audit = AuditTrail::new(config.max_audit_entries, config.audit_retention_days);
        Self {
            config,
            registry: RuleRegistry::new(),
            evaluator: ConditionEvaluator::new(),
            suite,
            detector,
            validator: InputValidator::with_default_rules(),
            cache: DecisionCache::new(),
            audit,
            violations: Mutex::new(Vec::new()),
            counters: Mutex::new(DecisionCounts::default()),
        }
    }

    /// Evaluate every applicable rule against a context and decide.
    ///
    /// `required` is the caller's minimum acceptable trust level; pass
    /// `None` to use the configured default. Fresh cached decisions are
    /// returned with `cache_hit = true` and are not re-audited.
    #[instrument(skip(self, context), fields(user_id = %context.user_id, operation = %context.operation))]
    pub async fn assess_trust(
        &self,
        context: &TrustContext,
        required: Option<TrustLevel>,
    ) -> Result<Assessment> {
        let required = required.unwrap_or(self.config.default_required_trust);
        let now = Utc::now();
        let key = DecisionCache::fingerprint(context);
        // Read the generation before the rules so a concurrent edit can only
        // make the stored entry stale, never let a stale one serve.
        let generation = self.registry.generation().await;

        if let Some(mut cached) = self.cache.get(&key, now, generation) {
            cached.cache_hit = true;
            if let Ok(mut counters) = self.counters.lock() {
                counters.cache_hits += 1;
            }
            return Ok(cached);
        }

        let rules = self.registry.applicable_rules(None, now).await;
        let evaluation = self.evaluate_rules(&rules, context, required).await;

        let assessment = self.build_assessment(context, &evaluation, now)?;

        for violation in &evaluation.violations {
            self.record_violation(violation.clone());
        }

        let mut assessment = assessment;
        if let Err(err) = self.audit.record(AuditEvent::from_assessment(&assessment)) {
            warn!(%err, "audit append failed");
            if matches!(
                assessment.recommended_action,
                EnforcementDecision::Deny | EnforcementDecision::Quarantine
            ) {
                assessment
                    .warnings
                    .push(format!("audit append failed: {}", err));
            }
        }

        if let Ok(mut counters) = self.counters.lock() {
            counters.bump(assessment.recommended_action);
        }
        self.suite.record_behavior(context);
        self.cache.store(key, &assessment, generation);

        info!(
            score = assessment.overall_trust_score,
            risk = %assessment.risk_level,
            decision = %assessment.recommended_action,
            "trust assessed"
        );
        Ok(assessment)
    }

    /// Verify a signature through the collaborator, returning the raw
    /// answer and the partial score it would contribute.
    pub async fn verify_signature(
        &self,
        context: &TrustContext,
        data: &[u8],
        signature: &[u8],
        public_key: &str,
    ) -> Result<(bool, f64)> {
        let verified = self
            .suite
            .verify_signature_raw(context, data, signature, public_key)
            .await?;
        Ok((verified, if verified { 1.0 } else { 0.0 }))
    }

    /// Check hardware-device presence through the collaborator.
    pub async fn verify_hardware_presence(
        &self,
        context: &TrustContext,
        device_id: &str,
        wallet_type: &str,
    ) -> Result<(bool, f64)> {
        let present = self
            .suite
            .verify_presence_raw(context, device_id, wallet_type)
            .await?;
        Ok((present, if present { 0.9 } else { 0.0 }))
    }

    /// Validate a raw input payload against the validation rules. The
    /// outcome is audited.
    pub async fn validate_input(
        &self,
        context: &TrustContext,
        input: &InputData,
    ) -> Result<ValidationOutcome> {
        let outcome = self.validator.validate(input).await;

        let mut event = AuditEvent::rule_change(
            format!("input {}", outcome.verdict_summary()),
            outcome
                .matched_rule_ids
                .first()
                .map(String::as_str)
                .unwrap_or(""),
        );
        event.kind = AuditEventKind::InputValidation;
        event.user_id = context.user_id.clone();
        event.session_id = context.session_id.clone();
        event.operation = context.operation.clone();
        if let Err(err) = self.audit.record(event) {
            warn!(%err, "audit append failed for input validation");
        }
        Ok(outcome)
    }

    /// Direct access to the input validator for rule management.
    pub fn input_validator(&self) -> &InputValidator {
        &self.validator
    }

    // Rule management. Every change bumps the registry generation, which
    // orphans all cached decisions; the eager eviction here just reclaims
    // their memory. Every change is audited.

    pub async fn create_rule(&self, rule: TrustRule) -> Result<()> {
        let change = self.registry.add_rule(rule).await?;
        self.cache.retain_generation(change.generation);
        self.audit_rule_change("rule created", &change.rule_id);
        Ok(())
    }

    pub async fn update_rule(&self, rule: TrustRule) -> Result<()> {
        let change = self.registry.update_rule(rule).await?;
        self.cache.retain_generation(change.generation);
        self.audit_rule_change("rule updated", &change.rule_id);
        Ok(())
    }

    pub async fn delete_rule(&self, rule_id: &str) -> Result<TrustRule> {
        let (rule, change) = self.registry.delete_rule(rule_id).await?;
        self.cache.retain_generation(change.generation);
        self.audit_rule_change("rule deleted", &change.rule_id);
        Ok(rule)
    }

    pub async fn get_rule(&self, rule_id: &str) -> Option<TrustRule> {
        self.registry.get_rule(rule_id).await
    }

    pub async fn list_rules(&self) -> Vec<TrustRule> {
        self.registry.list_rules().await
    }

    /// Dry-run a candidate rule against sample contexts. Nothing is
    /// audited, cached, or recorded as a violation.
    pub async fn test_rule(
        &self,
        rule: &TrustRule,
        contexts: &[TrustContext],
    ) -> Result<Vec<Assessment>> {
        rule.validate()
            .map_err(trustgate_rules::RuleError::Validation)?;

        let rules = std::slice::from_ref(rule);
        let mut assessments = Vec::with_capacity(contexts.len());
        for context in contexts {
            let evaluation = self
                .evaluate_rules(rules, context, self.config.default_required_trust)
                .await;
            assessments.push(self.build_assessment(context, &evaluation, Utc::now())?);
        }
        Ok(assessments)
    }

    /// Replace the rule set from serialized JSON. The whole decision cache
    /// is dropped.
    pub async fn load_rules(&self, data: &[u8]) -> Result<usize> {
        let loaded = self.registry.load_rules(data).await?;
        self.cache.clear();
        self.audit_rule_change(format!("rule set loaded ({} rules)", loaded), "");
        Ok(loaded)
    }

    /// Serialize the rule set to JSON for external storage.
    pub async fn save_rules(&self) -> Result<Vec<u8>> {
        Ok(self.registry.save_rules().await?)
    }

    // Violations.

    /// Violations matching the filter, newest first.
    pub fn get_violations(&self, filter: &ViolationFilter) -> Vec<Violation> {
        let violations = match self.violations.lock() {
            Ok(violations) => violations,
            Err(_) => return Vec::new(),
        };
        violations
            .iter()
            .rev()
            .filter(|violation| filter.matches(violation))
            .cloned()
            .collect()
    }

    /// Resolve an open violation with operator notes.
    pub fn resolve_violation(&self, violation_id: Uuid, notes: impl Into<String>) -> Result<()> {
        let mut violations = self
            .violations
            .lock()
            .map_err(|_| EngineError::Audit("violation store lock poisoned".to_string()))?;
        let violation = violations
            .iter_mut()
            .find(|violation| violation.violation_id == violation_id)
            .ok_or(EngineError::UnknownViolation(violation_id))?;
        violation.resolve(notes);
        Ok(())
    }

    // Observability.

    /// Events matching the query, newest first.
    pub fn audit_events(&self, query: &AuditQuery) -> Vec<AuditEvent> {
        self.audit.query(query)
    }

    /// Summary counts over the audit trail.
    pub fn audit_stats(&self) -> AuditStats {
        self.audit.stats()
    }

    /// Point-in-time summary of engine state.
    pub async fn get_statistics(&self) -> EngineStats {
        let (violations_open, violations_resolved) = match self.violations.lock() {
            Ok(violations) => {
                let open = violations.iter().filter(|v| v.is_open()).count();
                (open, violations.len() - open)
            }
            Err(_) => (0, 0),
        };
        EngineStats {
            total_rules: self.registry.len().await,
            rules_by_status: self.registry.counts_by_status().await,
            assessments: self
                .counters
                .lock()
                .map(|counters| counters.clone())
                .unwrap_or_default(),
            violations_open,
            violations_resolved,
            cache_entries: self.cache.len(),
            audit_events: self.audit.len(),
        }
    }

    // Internals.

    /// Core evaluation over a fixed, priority-ordered rule slice.
    async fn evaluate_rules(
        &self,
        rules: &[TrustRule],
        context: &TrustContext,
        required: TrustLevel,
    ) -> Evaluation {
        let mut warnings = Vec::new();
        let mut anomalies = Vec::new();
        let mut violations = Vec::new();
        let mut methods_used = Vec::new();
        let mut contributions: Vec<(f64, f64)> = Vec::new();
        let mut floor = EnforcementDecision::Allow;

        for rule in rules {
            let mut matched = true;
            for condition in &rule.conditions {
                let (result, mut condition_warnings) =
                    self.evaluator.evaluate_with_warnings(condition, context);
                warnings.append(&mut condition_warnings);
                if !result {
                    matched = false;
                    break;
                }
            }

            // A matched deny rule is absolute: it halts evaluation and
            // cannot be outvoted by high scores elsewhere.
            if rule.action == RuleAction::Deny {
                if matched {
                    violations.push(Violation::new(
                        &rule.id,
                        &context.user_id,
                        &context.session_id,
                        &context.operation,
                        RiskLevel::Extreme,
                    ));
                    return Evaluation {
                        score: 0.0,
                        risk: RiskLevel::Extreme,
                        decision: EnforcementDecision::Deny,
                        methods_used,
                        anomalies,
                        warnings,
                        violations,
                    };
                }
                continue;
            }

            let score = if matched {
                let mut method_scores = Vec::with_capacity(rule.verification_methods.len());
                for method in &rule.verification_methods {
                    let result = self.suite.score_method(*method, context).await;
                    if !methods_used.contains(method) {
                        methods_used.push(*method);
                    }
                    warnings.extend(result.warnings);
                    anomalies.extend(result.anomalies);
                    method_scores.push(result.score);
                }
                if method_scores.is_empty() {
                    // Conditions alone carried the rule.
                    1.0
                } else {
                    method_scores.iter().sum::<f64>() / method_scores.len() as f64
                }
            } else {
                0.0
            };

            let failed = !matched || score <= 0.0;
            if failed && rule.action.is_enforcement_relevant() {
                violations.push(Violation::new(
                    &rule.id,
                    &context.user_id,
                    &context.session_id,
                    &context.operation,
                    classify_risk(score, anomalies.len()),
                ));
                floor = match rule.action {
                    RuleAction::Quarantine => {
                        lift_decision(floor, EnforcementDecision::Quarantine)
                    }
                    RuleAction::Escalate => lift_decision(floor, EnforcementDecision::Challenge),
                    _ => floor,
                };
            }

            contributions.push((score, rule.weight));
        }

        let score = aggregate_score(&contributions);
        anomalies.extend(self.detector.detect(context, score, self.suite.history()));

        let risk = classify_risk(score, anomalies.len());
        let decision = lift_decision(decide(risk, required, !anomalies.is_empty()), floor);

        Evaluation {
            score,
            risk,
            decision,
            methods_used,
            anomalies,
            warnings,
            violations,
        }
    }

    fn build_assessment(
        &self,
        context: &TrustContext,
        evaluation: &Evaluation,
        now: chrono::DateTime<Utc>,
    ) -> Result<Assessment> {
        let confidence = confidence_score(
            evaluation.methods_used.len(),
            evaluation.anomalies.len(),
        );
        Assessment::check_scores(evaluation.score, confidence)?;
        Ok(Assessment {
            assessment_id: Uuid::new_v4(),
            user_id: context.user_id.clone(),
            session_id: context.session_id.clone(),
            operation: context.operation.clone(),
            resource: context.resource.clone(),
            overall_trust_score: evaluation.score,
            risk_level: evaluation.risk,
            recommended_action: evaluation.decision,
            verification_methods_used: evaluation.methods_used.clone(),
            confidence_score: confidence,
            anomalies_detected: evaluation.anomalies.clone(),
            warnings: evaluation.warnings.clone(),
            assessment_time: now,
            expires_at: now + Duration::seconds(self.config.cache_ttl_seconds as i64),
            cache_hit: false,
        })
    }

    fn record_violation(&self, violation: Violation) {
        if let Err(err) = self.audit.record(AuditEvent::from_violation(&violation)) {
            warn!(%err, "audit append failed for violation");
        }
        if let Ok(mut violations) = self.violations.lock() {
            violations.push(violation);
        }
    }

    fn audit_rule_change(&self, summary: impl Into<String>, rule_id: &str) {
        if let Err(err) = self.audit.record(AuditEvent::rule_change(summary, rule_id)) {
            warn!(%err, "audit append failed for rule change");
        }
    }
}

/// Display helper used in input-validation audit summaries.
trait VerdictSummary {
    fn verdict_summary(&self) -> &'static str;
}

impl VerdictSummary for ValidationOutcome {
    fn verdict_summary(&self) -> &'static str {
        match self.verdict {
            trustgate_types::ValidationVerdict::Valid => "valid",
            trustgate_types::ValidationVerdict::Suspicious => "suspicious",
            trustgate_types::ValidationVerdict::Malicious => "blocked",
        }
    }
}
