//! Line-oriented JSON-RPC dispatcher
//!
//! Reads one JSON-RPC payload per stdin line, dispatches it and prints the
//! HTTP status and body that an HTTP host would send.
//!
//! Run with: cargo run --example stdio_dispatch
//!
//! ```text
//! {"jsonrpc":"2.0","method":"public_method","params":{"value":21},"id":1}
//! 200 {"jsonrpc":"2.0","id":1,"result":{"result":42}}
//! ```
//!
//! Settings come from `JRPC_*` environment variables, e.g.
//! `JRPC_BATCH_FAILURE=stop JRPC_STATUS_POLICY=always_ok`.

use jrpc::core::{init_observability, shutdown_observability, TelemetryConfig};
use jrpc::{
    from_fn, from_typed_fn, AnySchema, CallContext, DispatchConfig, Dispatcher, Error,
    JsonSchema, RpcError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Deserialize)]
struct PublicParams {
    value: i64,
}

#[derive(Serialize)]
struct PublicResult {
    result: i64,
}

async fn public_method(_ctx: Arc<CallContext>, params: PublicParams) -> jrpc::Result<PublicResult> {
    Ok(PublicResult {
        result: params.value * 2,
    })
}

fn build(config: DispatchConfig) -> jrpc::Result<Dispatcher<CallContext>> {
    Dispatcher::builder()
        .method(
            "echo",
            JsonSchema::new(&json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            }))?,
            from_fn(|_ctx: Arc<CallContext>, params: Value| async move {
                let message = params["message"].as_str().unwrap_or_default().to_string();
                Ok(json!({ "echo_message": format!("Echo: {}", message) }))
            }),
        )
        .method(
            "public_method",
            JsonSchema::new(&json!({
                "type": "object",
                "properties": {"value": {"type": "integer"}},
                "required": ["value"]
            }))?,
            from_typed_fn(public_method),
        )
        .method(
            "notify_only",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, params: Value| async move {
                tracing::info!(data = %params["data"], "notification received");
                Ok(Value::Null)
            }),
        )
        .method(
            "raise_error",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, _params: Value| async {
                Err(Error::from(RpcError::server_error().with_message("This is a test error")))
            }),
        )
        .configure(config)
        .with_metrics()
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_observability(
        TelemetryConfig::new("jrpc-stdio")
            .with_json_logs(false)
            .with_log_level("warn"),
    )?;

    let dispatcher = build(DispatchConfig::from_env()?)?;
    let renderer = dispatcher.renderer();
    tracing::info!(methods = ?dispatcher.registry().methods(), "ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let rendered = match serde_json::from_str::<Value>(&line) {
            Ok(body) => {
                let result = dispatcher.handle(Arc::new(CallContext::new(body))).await;
                renderer.to_response(&result)
            }
            Err(e) => renderer.to_response(&Err(RpcError::parse_error().with_data(json!({
                "detail": e.to_string()
            })))),
        };

        println!("{} {}", rendered.status, rendered.body);
    }

    shutdown_observability()?;
    Ok(())
}
