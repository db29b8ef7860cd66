//! Core JSON-RPC 2.0 types for jrpc
//!
//! This crate holds everything the dispatcher and its hosts share:
//!
//! - **Types**: request ids, calls, responses and the outcome of a request
//! - **Error handling**: the closed error taxonomy and the crate error type
//! - **Observability**: `tracing` subscriber and OpenTelemetry bootstrap
//!
//! It performs no I/O. Decoding the request body and writing the response
//! belong to the host transport; the `jrpc-dispatch` crate turns a decoded
//! body into an [`Outcome`].
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{Id, JsonRpcResponse, Outcome, RpcError};
//! use serde_json::json;
//!
//! let ok = JsonRpcResponse::success(json!({"sum": 8}), Id::Number(1));
//! let failed = RpcError::invalid_params().with_id(Id::Number(2)).to_response();
//!
//! let outcome = Outcome::Batch(vec![ok, failed]);
//! assert_eq!(outcome.responses().len(), 2);
//! ```

pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, ErrorKind, JsonRpcErrorData, Result, RpcError, ValidationErrors};
pub use observability::{init_observability, shutdown_observability, TelemetryConfig};
pub use types::{Id, JsonRpcCall, JsonRpcResponse, Outcome, JSONRPC_VERSION};
