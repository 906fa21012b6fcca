//! Prioritized pattern matching over raw input payloads.

use std::cmp::Reverse;
use std::collections::HashSet;

use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use trustgate_types::{
    InputData, ValidationAction, ValidationOutcome, ValidationRule, ValidationVerdict,
};

use crate::{InputError, Result};

/// A rule with its pattern compiled once at insert time.
struct CompiledRule {
    rule: ValidationRule,
    /// `None` for size-only rules with an empty pattern
    regex: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: ValidationRule) -> Result<Self> {
        let regex = if rule.pattern.is_empty() {
            None
        } else {
            Some(
                Regex::new(&rule.pattern).map_err(|source| InputError::Pattern {
                    id: rule.id.clone(),
                    source,
                })?,
            )
        };
        Ok(Self { rule, regex })
    }

    /// Whether this rule fires against the current working content.
    fn fires(&self, input: &InputData, content: &str) -> bool {
        if let Some(max) = self.rule.max_size_bytes {
            if input.size_bytes > max {
                return true;
            }
        }
        match &self.regex {
            Some(regex) => regex.is_match(content),
            None => false,
        }
    }
}

/// Validates raw payloads against a prioritized, runtime-editable rule set.
///
/// Rules are held sorted by descending priority; evaluation short-circuits
/// on the first blocking match and otherwise chains sanitizers over a
/// working copy of the content.
pub struct InputValidator {
    rules: RwLock<Vec<CompiledRule>>,
}

impl InputValidator {
    /// Create a validator with no rules; every payload passes.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Create a validator loaded with [`crate::default_rules`].
    pub fn with_default_rules() -> Self {
        let mut compiled: Vec<CompiledRule> = Vec::new();
        for rule in crate::default_rules() {
            // Default patterns are covered by tests; compilation cannot fail.
            if let Ok(entry) = CompiledRule::compile(rule) {
                compiled.push(entry);
            }
        }
        sort_rules(&mut compiled);
        Self {
            rules: RwLock::new(compiled),
        }
    }

    /// Add one rule. Fails on a duplicate id or an invalid pattern.
    pub async fn add_rule(&self, rule: ValidationRule) -> Result<()> {
        let compiled = CompiledRule::compile(rule)?;
        let mut rules = self.rules.write().await;
        if rules.iter().any(|entry| entry.rule.id == compiled.rule.id) {
            return Err(InputError::DuplicateRule(compiled.rule.id));
        }
        debug!(rule_id = %compiled.rule.id, "validation rule added");
        rules.push(compiled);
        sort_rules(&mut rules);
        Ok(())
    }

    /// Remove a rule by id, returning it.
    pub async fn remove_rule(&self, rule_id: &str) -> Result<ValidationRule> {
        let mut rules = self.rules.write().await;
        let position = rules
            .iter()
            .position(|entry| entry.rule.id == rule_id)
            .ok_or_else(|| InputError::UnknownRule(rule_id.to_string()))?;
        Ok(rules.remove(position).rule)
    }

    /// Replace the entire rule set atomically. If any rule fails to compile
    /// or ids collide, the existing set is left untouched.
    pub async fn load_rules(&self, rules: Vec<ValidationRule>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if !seen.insert(rule.id.clone()) {
                return Err(InputError::DuplicateRule(rule.id));
            }
            compiled.push(CompiledRule::compile(rule)?);
        }
        sort_rules(&mut compiled);
        *self.rules.write().await = compiled;
        Ok(())
    }

    /// Snapshot of the current rules in evaluation order.
    pub async fn rules(&self) -> Vec<ValidationRule> {
        self.rules
            .read()
            .await
            .iter()
            .map(|entry| entry.rule.clone())
            .collect()
    }

    /// Validate one payload against the applicable rules.
    pub async fn validate(&self, input: &InputData) -> ValidationOutcome {
        let rules = self.rules.read().await;
        let mut outcome = ValidationOutcome::valid();
        let mut content = input.content.clone();
        let mut sanitized = false;

        for entry in rules.iter() {
            if let Some(rule_type) = entry.rule.input_type {
                if rule_type != input.input_type {
                    continue;
                }
            }
            if !entry.fires(input, &content) {
                continue;
            }
            outcome.matched_rule_ids.push(entry.rule.id.clone());

            match entry.rule.action {
                ValidationAction::Block => {
                    warn!(
                        rule_id = %entry.rule.id,
                        severity = %entry.rule.severity,
                        "input blocked"
                    );
                    outcome.verdict = ValidationVerdict::Malicious;
                    outcome.action_taken = Some(ValidationAction::Block);
                    outcome.sanitized_content = None;
                    return outcome;
                }
                ValidationAction::Sanitize => {
                    if let Some(regex) = &entry.regex {
                        content = regex.replace_all(&content, "").into_owned();
                        sanitized = true;
                    }
                    outcome.verdict = outcome.verdict.max(ValidationVerdict::Suspicious);
                    outcome.action_taken = strongest(outcome.action_taken, ValidationAction::Sanitize);
                }
                ValidationAction::LogOnly => {
                    outcome
                        .warnings
                        .push(format!("rule '{}' matched: {}", entry.rule.id, entry.rule.description));
                    outcome.verdict = outcome.verdict.max(ValidationVerdict::Suspicious);
                    outcome.action_taken = strongest(outcome.action_taken, ValidationAction::LogOnly);
                }
            }
        }

        if sanitized {
            outcome.sanitized_content = Some(content);
        }
        outcome
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Descending priority, then id for a stable order between equal priorities.
fn sort_rules(rules: &mut [CompiledRule]) {
    rules.sort_by(|a, b| {
        Reverse(a.rule.priority)
            .cmp(&Reverse(b.rule.priority))
            .then_with(|| a.rule.id.cmp(&b.rule.id))
    });
}

/// Block outranks Sanitize outranks LogOnly.
fn strongest(
    current: Option<ValidationAction>,
    new: ValidationAction,
) -> Option<ValidationAction> {
    fn rank(action: ValidationAction) -> u8 {
        match action {
            ValidationAction::Block => 2,
            ValidationAction::Sanitize => 1,
            ValidationAction::LogOnly => 0,
        }
    }
    match current {
        Some(existing) if rank(existing) >= rank(new) => Some(existing),
        _ => Some(new),
    }
}
