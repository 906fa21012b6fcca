use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A typed value resolved from a context field or carried by a condition.
///
/// Context attributes arrive as free-form JSON; resolving them into this
/// tagged union keeps every comparison in the condition evaluator exhaustive
/// and removes stringly-typed matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value; integers are widened to f64
    Number(f64),
    /// String value
    String(String),
    /// Ordered list of values
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Interpret the value as a number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric comparison between two values.
    ///
    /// Returns `None` when either side is non-numeric or NaN; callers treat
    /// that as a failed match, never as an error.
    pub fn compare_numeric(&self, other: &FieldValue) -> Option<Ordering> {
        let lhs = self.as_f64()?;
        let rhs = other.as_f64()?;
        lhs.partial_cmp(&rhs)
    }

    /// Containment check: substring for strings, membership for lists.
    pub fn contains(&self, needle: &FieldValue) -> bool {
        match self {
            FieldValue::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
            FieldValue::List(items) => items.iter().any(|item| item == needle),
            _ => false,
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => {
                FieldValue::Number(n.as_f64().unwrap_or(f64::INFINITY))
            }
            serde_json::Value::String(s) => FieldValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.iter().map(FieldValue::from).collect())
            }
            // Nested objects are not directly comparable; path resolution
            // descends into them before conversion.
            serde_json::Value::Object(_) => FieldValue::Null,
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::from(&value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison() {
        let a = FieldValue::Number(1.5);
        let b = FieldValue::Number(2.0);
        assert_eq!(a.compare_numeric(&b), Some(Ordering::Less));
        assert_eq!(b.compare_numeric(&a), Some(Ordering::Greater));
        assert_eq!(a.compare_numeric(&a.clone()), Some(Ordering::Equal));
    }

    #[test]
    fn test_numeric_comparison_type_mismatch_is_none() {
        let a = FieldValue::String("100".to_string());
        let b = FieldValue::Number(2.0);
        assert_eq!(a.compare_numeric(&b), None);
        assert_eq!(b.compare_numeric(&a), None);
    }

    #[test]
    fn test_string_contains() {
        let haystack = FieldValue::String("wallet_transfer".to_string());
        assert!(haystack.contains(&FieldValue::from("transfer")));
        assert!(!haystack.contains(&FieldValue::from("withdraw")));
        assert!(!haystack.contains(&FieldValue::Number(1.0)));
    }

    #[test]
    fn test_list_contains() {
        let list = FieldValue::List(vec![FieldValue::from("a"), FieldValue::Number(2.0)]);
        assert!(list.contains(&FieldValue::from("a")));
        assert!(list.contains(&FieldValue::Number(2.0)));
        assert!(!list.contains(&FieldValue::from("b")));
    }

    #[test]
    fn test_from_json_value() {
        let json = serde_json::json!({"amount": 250, "tags": ["x", "y"], "ok": true});
        assert_eq!(FieldValue::from(&json["amount"]), FieldValue::Number(250.0));
        assert_eq!(FieldValue::from(&json["ok"]), FieldValue::Bool(true));
        assert_eq!(
            FieldValue::from(&json["tags"]),
            FieldValue::List(vec![FieldValue::from("x"), FieldValue::from("y")])
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let value = FieldValue::List(vec![
            FieldValue::Number(1.0),
            FieldValue::String("two".to_string()),
            FieldValue::Bool(false),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }
}
