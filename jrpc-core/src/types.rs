//! JSON-RPC 2.0 types
//!
//! This module holds the data that flows through a dispatch:
//!
//! 1. **Id**: correlation identifier of a call
//! 2. **JsonRpcCall**: one call extracted from a decoded request
//! 3. **JsonRpcResponse**: a Call Result or Call Error as sent on the wire
//! 4. **Outcome**: what a whole request produced (single, batch or nothing)
//!
//! # Request IDs
//!
//! The wire allows string, integer or null ids. A call whose id is absent
//! or null is a notification and never receives a response. `Id::Null`
//! only appears in responses that cannot be correlated with a call.

use crate::error::{JsonRpcErrorData, RpcError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Protocol version carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// Serializes as the bare inner value (`"abc"`, `42` or `null`).
///
/// # Examples
///
/// ```rust
/// use jrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Integer identifier
    Number(i64),
    /// Integer identifier above `i64::MAX`
    Unsigned(u64),
    /// No usable identifier
    Null,
}

impl Id {
    /// Read a request id from its JSON form
    ///
    /// Returns `Ok(None)` for a null id (notification). A value that is
    /// neither a string nor an integer (fractions, objects, arrays) is an
    /// invalid request; the error carries a null id.
    pub fn from_json(value: &Value) -> Result<Option<Id>, RpcError> {
        let invalid = || {
            RpcError::invalid_request()
                .with_message("Invalid request: 'id' must be a string or an integer")
        };
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Id::String(s.clone()))),
            Value::Number(n) => n
                .as_i64()
                .map(Id::Number)
                .or_else(|| n.as_u64().map(Id::Unsigned))
                .map(Some)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    /// True for `Id::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }
}

impl Default for Id {
    fn default() -> Self {
        Id::Null
    }
}

impl fmt::Display for Id {
    /// Strings are quoted, numbers bare, null as `null`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Unsigned(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Id::Unsigned(n), Id::Number)
    }
}

impl From<Option<Id>> for Id {
    fn from(id: Option<Id>) -> Self {
        id.unwrap_or(Id::Null)
    }
}

/// One call extracted from a decoded request
///
/// Built by the dispatcher after the envelope check. A missing `params`
/// member is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcCall {
    /// Correlation id, `None` for notifications
    pub id: Option<Id>,
    /// Name of the method to invoke
    pub method: String,
    /// Raw parameters
    pub params: Value,
}

impl JsonRpcCall {
    /// Create a call
    pub fn new(method: impl Into<String>, params: Value, id: Option<Id>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// True when the caller expects no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response message
///
/// Holds either a result or an error, never both. A `null` result is a
/// valid success and is serialized as `"result": null`.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{JsonRpcResponse, Id, RpcError};
/// use serde_json::json;
///
/// let success = JsonRpcResponse::success(json!({"value": 42}), Id::Number(1));
/// assert!(success.is_success());
///
/// let error = RpcError::method_not_found("unknownMethod")
///     .with_id(Id::Number(2))
///     .to_response();
/// assert!(error.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Id of the answered call, `Id::Null` if it could not be determined
    pub id: Id,
    /// Result of the call (success only)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub result: Option<Value>,
    /// Error information (failure only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
}

// A present `"result": null` must stay `Some(Value::Null)`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// True if this response carries a result
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True if this response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What one request produced
///
/// Serializes untagged: a single object, an array, or `null` for
/// `NoContent` (renderers send an empty body in that case).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Response to a single id-bearing call
    Single(JsonRpcResponse),
    /// Responses to the id-bearing items of a batch, in request order
    Batch(Vec<JsonRpcResponse>),
    /// Nothing expects an answer (notifications only)
    NoContent,
}

impl Outcome {
    /// True when there is no body to send
    pub fn is_empty(&self) -> bool {
        match self {
            Outcome::Single(_) => false,
            Outcome::Batch(responses) => responses.is_empty(),
            Outcome::NoContent => true,
        }
    }

    /// The responses contained in this outcome, in order
    pub fn responses(&self) -> &[JsonRpcResponse] {
        match self {
            Outcome::Single(response) => std::slice::from_ref(response),
            Outcome::Batch(responses) => responses,
            Outcome::NoContent => &[],
        }
    }
}
