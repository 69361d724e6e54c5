//! Context model: request, response, user, label, and custom metadata
//! attached to a transaction.
//!
//! All of these are plain value holders. They are mutated only by the single
//! logical flow that owns the transaction handle and are snapshotted into the
//! finished record when the transaction is delivered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A label value: one of the primitive types allowed in the label map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        LabelValue::String(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        LabelValue::String(value)
    }
}

impl From<bool> for LabelValue {
    fn from(value: bool) -> Self {
        LabelValue::Bool(value)
    }
}

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        LabelValue::Int(value)
    }
}

impl From<f64> for LabelValue {
    fn from(value: f64) -> Self {
        LabelValue::Float(value)
    }
}

/// Captured request metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Captured response metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub finished: bool,
}

/// Captured user identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// All metadata owned by one transaction.
///
/// Keys are unique per map; a later write to the same key overwrites the
/// earlier value. Values are stored verbatim, with no size limit and no
/// truncation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default)]
    pub labels: HashMap<String, LabelValue>,
    #[serde(default)]
    pub custom: HashMap<String, Value>,
}

impl TransactionContext {
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<LabelValue>) {
        self.labels.insert(key.into(), value.into());
    }

    pub fn set_custom(&mut self, key: impl Into<String>, value: Value) {
        self.custom.insert(key.into(), value);
    }

    pub fn label(&self, key: &str) -> Option<&LabelValue> {
        self.labels.get(key)
    }

    pub fn custom(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }
}
