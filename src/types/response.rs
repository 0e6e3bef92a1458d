//! Response type definitions
//!
//! Defines the raw dispatcher output and the normalized result contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw response returned by the dispatcher, ready for normalization
///
/// Owned by the caller; carries no back-reference to the session.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Create a new raw response
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }
}

/// A validated structured value plus the open `extra` overflow mapping
///
/// `fields` holds every declared field that was successfully extracted.
/// `extra` preserves payload content not covered by the declared shape:
/// undeclared JSON members, unmapped XML subtrees, uncovered HTML sections,
/// and date strings no interpreter understood. Nothing is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Declared fields that validated
    pub fields: Map<String, Value>,
    /// Payload content outside the declared shape, preserved verbatim
    pub extra: Map<String, Value>,
}

impl NormalizedResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a declared field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up an overflow entry by key
    pub fn get_extra(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Convert the declared fields into a caller-defined type via serde
    pub fn deserialize_into<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}
