use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Comparison operator applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    RegexMatch,
    InList,
    NotInList,
    Exists,
    NotExists,
}

impl ConditionOperator {
    /// Whether the operator tests field presence rather than a value.
    pub fn is_existence_check(&self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }

    /// Whether the operator requires a numeric operand on both sides.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::LessThan | Self::GreaterEqual | Self::LessEqual
        )
    }
}

/// A single field/operator/value test evaluated against a context.
///
/// `field` is a dot-path into the context, e.g. `request_data.amount` or
/// `timestamp.hour`. Paths that fail to resolve satisfy `not_exists`, fail
/// `exists`, and fail every other operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-path into the evaluation context
    pub field: String,
    /// The comparison to apply
    pub operator: ConditionOperator,
    /// The right-hand operand
    pub value: FieldValue,
}

impl Condition {
    /// Create a new condition.
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Structural validation used when rules are created or loaded.
    pub fn validate(&self) -> Result<(), String> {
        if self.field.trim().is_empty() {
            return Err("condition field must not be empty".to_string());
        }
        match self.operator {
            ConditionOperator::InList | ConditionOperator::NotInList => {
                if self.value.as_list().is_none() {
                    return Err(format!(
                        "condition on '{}': in_list/not_in_list requires a list value",
                        self.field
                    ));
                }
            }
            op if op.is_numeric() => {
                if self.value.as_f64().is_none() {
                    return Err(format!(
                        "condition on '{}': numeric operator requires a numeric value",
                        self.field
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }
}
