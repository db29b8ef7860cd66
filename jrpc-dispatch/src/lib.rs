//! Transport-agnostic JSON-RPC 2.0 dispatcher
//!
//! This crate takes a decoded JSON-RPC payload, routes each call to a
//! registered method, validates params, runs the callback and produces the
//! response together with an HTTP status. Parsing the request body, auth
//! and writing the response stay with the host framework.
//!
//! # Core Features
//!
//! - **Method Registry**: unique method names, frozen after setup
//! - **Validation**: pluggable [`Schema`] for params and results, with JSON
//!   Schema and serde adapters
//! - **Batch Processing**: ordered sequential execution, size limit,
//!   continue or stop on failure
//! - **Error Taxonomy**: every failure becomes a fixed-code JSON-RPC error
//! - **Rendering**: status mapping per error kind or "always 200"
//! - **Observability**: `tracing` spans per dispatch and call, optional
//!   OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc_dispatch::{from_typed_fn, CallContext, Dispatcher, TypedSchema};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Serialize, Deserialize)]
//! struct AddParams { a: i32, b: i32 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::<CallContext>::builder()
//!         .method(
//!             "add",
//!             TypedSchema::<AddParams>::new(),
//!             from_typed_fn(|_ctx, p: AddParams| async move { Ok(p.a + p.b) }),
//!         )
//!         .build()?;
//!
//!     let body = json!({"jsonrpc": "2.0", "method": "add", "params": {"a": 2, "b": 3}, "id": 1});
//!     let result = dispatcher.handle(Arc::new(CallContext::new(body))).await;
//!
//!     let rendered = dispatcher.renderer().to_response(&result);
//!     assert_eq!(rendered.status, 200);
//!     assert_eq!(rendered.body, r#"{"jsonrpc":"2.0","id":1,"result":5}"#);
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! The dispatcher never spawns tasks. Each `handle` call runs on the host's
//! task and batch items are awaited one at a time. `Dispatcher` is `Clone`
//! and can be shared by concurrently served requests; dropping a `handle`
//! future abandons the rest of its batch.

pub mod batch;
pub mod builder;
pub mod config;
pub mod context;
pub mod controller;
pub mod entry;
pub mod handler;
pub mod metrics;
pub mod registry;
pub mod renderer;
pub mod schema;

pub use batch::BatchFailure;
pub use builder::DispatcherBuilder;
pub use config::{DispatchConfig, ErrorExposure, DEFAULT_BATCH_LIMIT};
pub use context::{CallContext, RequestContext};
pub use controller::Dispatcher;
pub use entry::MethodEntry;
pub use handler::{from_fn, from_typed_fn, FnHandler, Handler, HandlerResult};
pub use metrics::DispatchMetrics;
pub use registry::MethodRegistry;
pub use renderer::{
    status_for_kind, RenderedResponse, Renderer, StatusPolicy, TransportContext, CONTENT_TYPE,
};
pub use schema::{schema_fn, AnySchema, FnSchema, JsonSchema, Schema, TypedSchema};
