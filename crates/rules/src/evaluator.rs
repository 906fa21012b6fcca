//! Fail-closed evaluation of a single condition against a context.
//!
//! The evaluator is a total function: unresolvable fields, type mismatches,
//! and malformed patterns all evaluate to `false` (with `not_exists` as the
//! one inversion). An ambiguous condition must never grant extra trust.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;
use tracing::warn;

use trustgate_types::{Condition, ConditionOperator, FieldValue, TrustContext};

/// Evaluates declarative conditions, caching compiled regex patterns.
#[derive(Default)]
pub struct ConditionEvaluator {
    // Failed compilations are cached as None so a bad pattern is reported
    // once, not once per evaluation.
    regex_cache: RwLock<HashMap<String, Option<Regex>>>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a condition against a context. Total; never panics.
    pub fn evaluate(&self, condition: &Condition, context: &TrustContext) -> bool {
        self.evaluate_with_warnings(condition, context).0
    }

    /// Evaluate and collect non-fatal warnings (malformed regex, list
    /// operator without a list operand). Warnings surface on the assessment
    /// without affecting the fail-closed result.
    pub fn evaluate_with_warnings(
        &self,
        condition: &Condition,
        context: &TrustContext,
    ) -> (bool, Vec<String>) {
        let mut warnings = Vec::new();
        let resolved = context.resolve(&condition.field);

        let matched = match condition.operator {
            ConditionOperator::Exists => resolved.is_some(),
            ConditionOperator::NotExists => resolved.is_none(),
            operator => match resolved {
                Some(actual) => self.apply(operator, &actual, condition, &mut warnings),
                None => false,
            },
        };

        (matched, warnings)
    }

    fn apply(
        &self,
        operator: ConditionOperator,
        actual: &FieldValue,
        condition: &Condition,
        warnings: &mut Vec<String>,
    ) -> bool {
        let expected = &condition.value;
        match operator {
            ConditionOperator::Equals => actual == expected,
            // A type mismatch is ambiguous, not an inequality; it fails.
            ConditionOperator::NotEquals => {
                same_variant(actual, expected) && actual != expected
            }
            ConditionOperator::GreaterThan => {
                matches!(actual.compare_numeric(expected), Some(std::cmp::Ordering::Greater))
            }
            ConditionOperator::LessThan => {
                matches!(actual.compare_numeric(expected), Some(std::cmp::Ordering::Less))
            }
            ConditionOperator::GreaterEqual => matches!(
                actual.compare_numeric(expected),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            ConditionOperator::LessEqual => matches!(
                actual.compare_numeric(expected),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
            ConditionOperator::Contains => actual.contains(expected),
            ConditionOperator::NotContains => {
                matches!(actual, FieldValue::String(_) | FieldValue::List(_))
                    && !actual.contains(expected)
            }
            ConditionOperator::StartsWith => match (actual.as_str(), expected.as_str()) {
                (Some(haystack), Some(prefix)) => haystack.starts_with(prefix),
                _ => false,
            },
            ConditionOperator::EndsWith => match (actual.as_str(), expected.as_str()) {
                (Some(haystack), Some(suffix)) => haystack.ends_with(suffix),
                _ => false,
            },
            ConditionOperator::RegexMatch => self.regex_match(actual, condition, warnings),
            ConditionOperator::InList => match expected.as_list() {
                Some(items) => items.iter().any(|item| item == actual),
                None => {
                    warnings.push(format!(
                        "condition on '{}': in_list value is not a list",
                        condition.field
                    ));
                    false
                }
            },
            ConditionOperator::NotInList => match expected.as_list() {
                Some(items) => !items.iter().any(|item| item == actual),
                None => {
                    warnings.push(format!(
                        "condition on '{}': not_in_list value is not a list",
                        condition.field
                    ));
                    false
                }
            },
            // Handled before dispatch.
            ConditionOperator::Exists | ConditionOperator::NotExists => unreachable!(),
        }
    }

    fn regex_match(
        &self,
        actual: &FieldValue,
        condition: &Condition,
        warnings: &mut Vec<String>,
    ) -> bool {
        let haystack = match actual.as_str() {
            Some(s) => s,
            None => return false,
        };
        let pattern = match condition.value.as_str() {
            Some(p) => p,
            None => {
                warnings.push(format!(
                    "condition on '{}': regex_match value is not a string",
                    condition.field
                ));
                return false;
            }
        };

        if let Some(cached) = self
            .regex_cache
            .read()
            .expect("regex cache lock poisoned")
            .get(pattern)
        {
            return match cached {
                Some(regex) => regex.is_match(haystack),
                None => {
                    warnings.push(format!("malformed regex pattern: {}", pattern));
                    false
                }
            };
        }

        let compiled = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern, %err, "failed to compile condition regex");
                warnings.push(format!("malformed regex pattern: {}", pattern));
                None
            }
        };
        let matched = compiled
            .as_ref()
            .map(|regex| regex.is_match(haystack))
            .unwrap_or(false);
        self.regex_cache
            .write()
            .expect("regex cache lock poisoned")
            .insert(pattern.to_string(), compiled);
        matched
    }
}

fn same_variant(a: &FieldValue, b: &FieldValue) -> bool {
    matches!(
        (a, b),
        (FieldValue::Null, FieldValue::Null)
            | (FieldValue::Bool(_), FieldValue::Bool(_))
            | (FieldValue::Number(_), FieldValue::Number(_))
            | (FieldValue::String(_), FieldValue::String(_))
            | (FieldValue::List(_), FieldValue::List(_))
    )
}
