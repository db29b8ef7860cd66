//! jrpc - transport-agnostic JSON-RPC 2.0 dispatch
//!
//! This is the convenience crate that re-exports the jrpc sub-crates.
//!
//! # Architecture
//!
//! - **jrpc-core**: wire types, error taxonomy, telemetry bootstrap
//! - **jrpc-dispatch**: schemas, method registry, dispatcher, batch
//!   processing, HTTP rendering, metrics
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc::{from_fn, AnySchema, CallContext, Dispatcher};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::<CallContext>::builder()
//!         .method("ping", AnySchema, from_fn(|_ctx, _params| async { Ok(json!("pong")) }))
//!         .build()?;
//!
//!     let body = json!([
//!         {"jsonrpc": "2.0", "method": "ping", "id": 1},
//!         {"jsonrpc": "2.0", "method": "ping"}
//!     ]);
//!     let result = dispatcher.handle(Arc::new(CallContext::new(body))).await;
//!     let rendered = dispatcher.renderer().to_response(&result);
//!
//!     assert_eq!(rendered.status, 200);
//!     assert_eq!(rendered.body, r#"[{"jsonrpc":"2.0","id":1,"result":"pong"}]"#);
//!     Ok(())
//! }
//! ```

pub use jrpc_core as core;
pub use jrpc_dispatch as dispatch;

pub use jrpc_core::{Error, ErrorKind, Id, JsonRpcResponse, Outcome, Result, RpcError};
pub use jrpc_dispatch::{
    from_fn, from_typed_fn, AnySchema, BatchFailure, CallContext, DispatchConfig, Dispatcher,
    JsonSchema, RenderedResponse, StatusPolicy, TypedSchema,
};
