use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Immutable snapshot of one guarded call.
///
/// A context is built once by the caller and never mutated; every rule,
/// scorer, and heuristic reads the same view of the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustContext {
    /// Identity of the requesting user
    pub user_id: String,
    /// Session the request belongs to
    pub session_id: String,
    /// The guarded operation, e.g. `wallet_transfer`
    pub operation: String,
    /// The resource the operation targets
    pub resource: String,
    /// When the request was made
    pub timestamp: DateTime<Utc>,
    /// Source network address, if known
    #[serde(default)]
    pub source_ip: Option<String>,
    /// Client user agent, if known
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Device fingerprint, if known
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    /// Operation-specific payload attributes
    #[serde(default)]
    pub request_data: HashMap<String, serde_json::Value>,
    /// Attributes describing the user
    #[serde(default)]
    pub user_context: HashMap<String, serde_json::Value>,
    /// Attributes describing the calling system
    #[serde(default)]
    pub system_context: HashMap<String, serde_json::Value>,
}

impl TrustContext {
    /// Create a context for an operation happening now.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        operation: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            operation: operation.into(),
            resource: resource.into(),
            timestamp: Utc::now(),
            source_ip: None,
            user_agent: None,
            device_fingerprint: None,
            request_data: HashMap::new(),
            user_context: HashMap::new(),
            system_context: HashMap::new(),
        }
    }

    /// Set the request timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the source address.
    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the device fingerprint.
    pub fn with_device_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.device_fingerprint = Some(fingerprint.into());
        self
    }

    /// Add a request payload attribute.
    pub fn with_request_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.request_data.insert(key.into(), value);
        self
    }

    /// Add a user attribute.
    pub fn with_user_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_context.insert(key.into(), value);
        self
    }

    /// Add a system attribute.
    pub fn with_system_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.system_context.insert(key.into(), value);
        self
    }

    /// Resolve a dot-path against this context.
    ///
    /// Fixed attributes (`user_id`, `operation`, `timestamp.hour`, ...) are
    /// checked first, then `request_data.*`, `user_context.*`, and
    /// `system_context.*` with nested map traversal. `None` means the path
    /// does not resolve; it is never an error.
    pub fn resolve(&self, path: &str) -> Option<FieldValue> {
        match path {
            "user_id" => return Some(FieldValue::from(self.user_id.as_str())),
            "session_id" => return Some(FieldValue::from(self.session_id.as_str())),
            "operation" => return Some(FieldValue::from(self.operation.as_str())),
            "resource" => return Some(FieldValue::from(self.resource.as_str())),
            "timestamp" => return Some(FieldValue::from(self.timestamp.to_rfc3339().as_str())),
            "timestamp.hour" => return Some(FieldValue::Number(self.timestamp.hour() as f64)),
            "source_ip" => {
                return self.source_ip.as_deref().map(FieldValue::from);
            }
            "user_agent" => {
                return self.user_agent.as_deref().map(FieldValue::from);
            }
            "device_fingerprint" => {
                return self.device_fingerprint.as_deref().map(FieldValue::from);
            }
            _ => {}
        }

        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root, rest),
            None => return None,
        };
        let map = match root {
            "request_data" => &self.request_data,
            "user_context" => &self.user_context,
            "system_context" => &self.system_context,
            _ => return None,
        };
        resolve_in_map(map, rest)
    }
}

/// Walk the remaining path segments through nested JSON objects.
fn resolve_in_map(
    map: &HashMap<String, serde_json::Value>,
    path: &str,
) -> Option<FieldValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_object() {
        // Objects themselves are not comparable values.
        return None;
    }
    Some(FieldValue::from(current))
}
