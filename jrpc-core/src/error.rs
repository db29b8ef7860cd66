//! Error types for jrpc
//!
//! This module defines the closed JSON-RPC error taxonomy and the
//! crate-level error type used by callbacks, schemas and setup code.
//!
//! - **ErrorKind**: the fixed catalog of protocol error kinds and their codes
//! - **RpcError**: one taxonomy error instance (kind, id, message, data)
//! - **JsonRpcErrorData**: the wire format of the `error` member
//! - **Error**: application-level failures, translated to a taxonomy error
//!   at the dispatch boundary
//! - **ValidationErrors**: structured field-level validation failures
//!
//! # Error Codes
//!
//! | Kind | Code | Default message |
//! |---|---|---|
//! | ParseError | -32700 | Parse error |
//! | InvalidRequest | -32600 | Invalid request |
//! | MethodNotFound | -32601 | Method not found |
//! | InvalidParams | -32602 | Invalid params |
//! | InternalError | -32603 | Internal error |
//! | ServerError | -32000 | Server error |
//! | AuthenticationError | -32001 | Authentication error |
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{ErrorKind, Id, RpcError};
//!
//! let error = RpcError::method_not_found("unknownMethod").with_id(Id::Number(7));
//! assert_eq!(error.code(), -32601);
//! assert_eq!(error.kind, ErrorKind::MethodNotFound);
//! assert_eq!(error.message, "Method not found: unknownMethod");
//! ```

use crate::types::{Id, JsonRpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type for jrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of JSON-RPC error kinds
///
/// Each kind owns a fixed numeric code. Codes are part of the protocol
/// contract and never change; a new kind must get a code of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid JSON was received
    ParseError,
    /// The JSON sent is not a valid request object
    InvalidRequest,
    /// The method does not exist
    MethodNotFound,
    /// Invalid method parameters
    InvalidParams,
    /// Unexpected failure while executing a call
    InternalError,
    /// Implementation-defined server error
    ServerError,
    /// The caller could not be authenticated upstream
    AuthenticationError,
}

impl ErrorKind {
    /// Every kind in the catalog
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::ParseError,
        ErrorKind::InvalidRequest,
        ErrorKind::MethodNotFound,
        ErrorKind::InvalidParams,
        ErrorKind::InternalError,
        ErrorKind::ServerError,
        ErrorKind::AuthenticationError,
    ];

    /// Numeric JSON-RPC code of this kind
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::ParseError => -32700,
            ErrorKind::InvalidRequest => -32600,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidParams => -32602,
            ErrorKind::InternalError => -32603,
            ErrorKind::ServerError => -32000,
            ErrorKind::AuthenticationError => -32001,
        }
    }

    /// Message used when an instance does not override it
    pub const fn default_message(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "Parse error",
            ErrorKind::InvalidRequest => "Invalid request",
            ErrorKind::MethodNotFound => "Method not found",
            ErrorKind::InvalidParams => "Invalid params",
            ErrorKind::InternalError => "Internal error",
            ErrorKind::ServerError => "Server error",
            ErrorKind::AuthenticationError => "Authentication error",
        }
    }

    /// Resolve a wire code back to its kind
    ///
    /// Returns `None` for codes outside the catalog (e.g. errors produced
    /// by a remote peer with custom codes).
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.default_message(), self.code())
    }
}

/// A single JSON-RPC error instance
///
/// Carries the kind (and therefore the code), the id of the call it answers,
/// a human-readable message and optional structured data.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{Id, RpcError};
/// use serde_json::json;
///
/// let error = RpcError::invalid_params()
///     .with_id(Id::Number(1))
///     .with_data(json!({"message": ["is required"]}));
///
/// let response = error.to_response();
/// assert!(response.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {message}", code = .kind.code())]
pub struct RpcError {
    /// Kind of the error, fixes the code
    pub kind: ErrorKind,
    /// Id of the originating call, `Id::Null` when unknown
    pub id: Id,
    /// Human-readable message
    pub message: String,
    /// Optional diagnostic payload
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error of the given kind with its default message
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            id: Id::Null,
            message: kind.default_message().to_string(),
            data: None,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(ErrorKind::ParseError)
    }

    /// Invalid request (-32600)
    pub fn invalid_request() -> Self {
        Self::new(ErrorKind::InvalidRequest)
    }

    /// Method not found (-32601), the message names the unresolved method
    pub fn method_not_found(method: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::MethodNotFound)
            .with_message(format!("Method not found: {}", method.as_ref()))
    }

    /// Invalid params (-32602)
    pub fn invalid_params() -> Self {
        Self::new(ErrorKind::InvalidParams)
    }

    /// Internal error (-32603)
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Server error (-32000)
    pub fn server_error() -> Self {
        Self::new(ErrorKind::ServerError)
    }

    /// Authentication error (-32001)
    pub fn authentication_error() -> Self {
        Self::new(ErrorKind::AuthenticationError)
    }

    /// Batch rejected because it holds more than `limit` items
    ///
    /// Always answers with a null id: the batch as a whole has no id.
    pub fn batch_limit_exceeded(limit: usize) -> Self {
        Self::invalid_request()
            .with_message(format!("Batch size limit exceeded: limit={}", limit))
            .with_data(serde_json::json!({ "batch_limit": limit }))
    }

    /// Synthesized for batch items skipped after an earlier failure
    pub fn cancelled() -> Self {
        Self::internal_error().with_message("Cancelled due to previous error")
    }

    /// Set the id of the call this error answers
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }

    /// Override the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach structured diagnostic data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Numeric code of this error
    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// The `error` member as sent on the wire
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        JsonRpcErrorData {
            code: self.code(),
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }

    /// Full error response: `{jsonrpc, id, error: {code, message, data?}}`
    pub fn to_response(&self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.to_error_data(), self.id.clone())
    }
}

impl From<ErrorKind> for RpcError {
    fn from(kind: ErrorKind) -> Self {
        RpcError::new(kind)
    }
}

/// JSON-RPC 2.0 error object as it appears in the `error` member
///
/// `data` is omitted from the serialized form when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Optional additional error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Kind matching this code, if it belongs to the catalog
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(self.code)
    }
}

impl fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Structured validation failures, keyed by field path
///
/// Serializes as a JSON object mapping each path to its messages:
///
/// ```rust
/// use jrpc_core::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("message", "is required");
/// assert_eq!(errors.to_value(), serde_json::json!({"message": ["is required"]}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Error set holding a single message
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    /// Record a message for a field path
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(path.into()).or_default().push(message.into());
    }

    /// True when no failure was recorded
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of distinct failing paths
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Messages recorded for one path
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.fields.get(path).map(Vec::as_slice)
    }

    /// Iterate over `(path, messages)` in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(path, messages)| (path.as_str(), messages.as_slice()))
    }

    /// JSON form used as error `data`
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(path, messages)| {
                    let messages = messages.iter().cloned().map(Value::String).collect();
                    (path.clone(), Value::Array(messages))
                })
                .collect(),
        )
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", path, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Application-level error type for jrpc operations
///
/// Callbacks and schemas return this type. The dispatcher translates it
/// into a taxonomy error before anything reaches the wire:
///
/// - `Rpc` passes through unchanged
/// - `Validation` becomes `InvalidParams` keeping the structured detail
/// - everything else becomes `InternalError` and is logged
///
/// `DuplicateMethod` and `Config` are setup-time failures and never occur
/// while handling a request.
#[derive(Debug, Error)]
pub enum Error {
    /// A taxonomy error raised on purpose
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Failure reported by a validation library
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A callback result did not match the declared output schema
    #[error("Output of `{method}` failed validation: {errors}")]
    InvalidOutput {
        /// Method whose output was rejected
        method: String,
        /// Rejected fields
        errors: ValidationErrors,
    },

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Two methods registered under the same name
    #[error("Method already registered: {0}")]
    DuplicateMethod(String),

    /// Invalid dispatcher or telemetry configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other failure raised by a callback
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error raised by a callback
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(Box::new(error))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::Rpc(RpcError::new(kind))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_error_codes() {
        let expected = [
            (ErrorKind::ParseError, -32700, "Parse error"),
            (ErrorKind::InvalidRequest, -32600, "Invalid request"),
            (ErrorKind::MethodNotFound, -32601, "Method not found"),
            (ErrorKind::InvalidParams, -32602, "Invalid params"),
            (ErrorKind::InternalError, -32603, "Internal error"),
            (ErrorKind::ServerError, -32000, "Server error"),
            (ErrorKind::AuthenticationError, -32001, "Authentication error"),
        ];

        for (kind, code, message) in expected {
            assert_eq!(kind.code(), code);
            assert_eq!(kind.default_message(), message);
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<i32> = ErrorKind::ALL.iter().map(|kind| kind.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_from_code() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(-32099), None);
        assert_eq!(ErrorKind::from_code(1001), None);
    }

    #[test]
    fn test_default_instance() {
        let error = RpcError::invalid_request();

        assert_eq!(error.code(), -32600);
        assert_eq!(error.message, "Invalid request");
        assert_eq!(error.id, Id::Null);
        assert!(error.data.is_none());
    }

    #[test]
    fn test_method_not_found_names_method() {
        let error = RpcError::method_not_found("calculateFoo");

        assert_eq!(error.code(), -32601);
        assert!(error.message.contains("calculateFoo"));
    }

    #[test]
    fn test_batch_limit_exceeded() {
        let error = RpcError::batch_limit_exceeded(5);

        assert_eq!(error.kind, ErrorKind::InvalidRequest);
        assert_eq!(error.id, Id::Null);
        assert_eq!(error.data, Some(json!({"batch_limit": 5})));
    }

    #[test]
    fn test_error_response_shape() {
        let error = RpcError::invalid_params()
            .with_id(Id::Number(123))
            .with_data(json!({"message": ["is required"]}));

        let value = serde_json::to_value(error.to_response()).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 123,
                "error": {
                    "code": -32602,
                    "message": "Invalid params",
                    "data": {"message": ["is required"]}
                }
            })
        );
    }

    #[test]
    fn test_error_response_omits_missing_data() {
        let value = serde_json::to_value(RpcError::internal_error().to_response()).unwrap();

        assert_eq!(value["id"], Value::Null);
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_rpc_error_display() {
        let error = RpcError::method_not_found("unknownMethod");
        let display = format!("{}", error);

        assert!(display.contains("-32601"));
        assert!(display.contains("unknownMethod"));
    }

    #[test]
    fn test_error_data_kind() {
        let data: JsonRpcErrorData =
            serde_json::from_str(r#"{"code":-32001,"message":"Authentication error"}"#).unwrap();

        assert_eq!(data.kind(), Some(ErrorKind::AuthenticationError));
        assert!(data.data.is_none());
    }

    #[test]
    fn test_validation_errors_collect() {
        let mut errors = ValidationErrors::new();
        errors.add("value", "must be an integer");
        errors.add("message", "is required");
        errors.add("message", "must be a string");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("message").unwrap().len(), 2);
        assert_eq!(
            errors.to_value(),
            json!({
                "message": ["is required", "must be a string"],
                "value": ["must be an integer"]
            })
        );
        assert_eq!(
            errors.to_string(),
            "message: is required; message: must be a string; value: must be an integer"
        );
    }

    #[test]
    fn test_validation_errors_serialize_as_object() {
        let errors = ValidationErrors::single("message", "is required");
        let serialized = serde_json::to_value(&errors).unwrap();

        assert_eq!(serialized, errors.to_value());
    }

    #[test]
    fn test_error_conversions() {
        let error: Error = ErrorKind::AuthenticationError.into();
        assert!(matches!(error, Error::Rpc(ref e) if e.code() == -32001));

        let error: Error = ValidationErrors::single("a", "bad").into();
        assert_eq!(error.to_string(), "Validation failed: a: bad");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::other(io);
        assert_eq!(error.to_string(), "file not found");
    }
}
