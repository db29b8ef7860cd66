//! Shared fixtures for dispatcher integration tests

#![allow(dead_code)]

use jrpc_core::{Error, Outcome, RpcError, ValidationErrors};
use jrpc_dispatch::{
    from_fn, from_typed_fn, AnySchema, CallContext, Dispatcher, DispatcherBuilder, JsonSchema,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Call counters shared with the registered callbacks
#[derive(Clone, Default)]
pub struct Counters {
    pub echo: Arc<AtomicUsize>,
    pub notify: Arc<AtomicUsize>,
    pub public: Arc<AtomicUsize>,
}

impl Counters {
    pub fn echo(&self) -> usize {
        self.echo.load(Ordering::SeqCst)
    }

    pub fn notify(&self) -> usize {
        self.notify.load(Ordering::SeqCst)
    }

    pub fn public(&self) -> usize {
        self.public.load(Ordering::SeqCst)
    }
}

fn object_schema(properties: Value, required: &[&str]) -> JsonSchema {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": properties,
        "required": required,
    }))
    .expect("valid test schema")
}

#[derive(Deserialize)]
struct PublicParams {
    value: i64,
}

#[derive(Deserialize)]
struct TransferParams {
    amount: u64,
}

/// Builder with the standard test methods:
///
/// - `echo` `{message: string}`, needs a principal, output `{echo_message}`
/// - `public_method` `{value: integer}`, output `{result: value * 2}`
/// - `notify_only` `{data: string}`, returns null
/// - `raise_error`, fails with an internal failure
/// - `explode`, panics
/// - `bad_output`, result violates its output schema
/// - `withdraw`, accepts any params, rejects a zero `amount` itself
/// - `transfer`, accepts any params, typed `{amount}` checked by serde
/// - `identity`, accepts any params and returns them
pub fn builder(counters: &Counters) -> DispatcherBuilder<CallContext> {
    let echo_calls = counters.echo.clone();
    let notify_calls = counters.notify.clone();
    let public_calls = counters.public.clone();

    Dispatcher::builder()
        .method_with_output(
            "echo",
            object_schema(json!({"message": {"type": "string"}}), &["message"]),
            object_schema(json!({"echo_message": {"type": "string"}}), &["echo_message"]),
            from_fn(move |ctx: Arc<CallContext>, params: Value| {
                echo_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if ctx.principal().is_none() {
                        return Err(Error::from(RpcError::authentication_error()));
                    }
                    let message = params["message"].as_str().unwrap_or_default();
                    Ok(json!({ "echo_message": format!("Echo: {}", message) }))
                }
            }),
        )
        .method_with_output(
            "public_method",
            object_schema(json!({"value": {"type": "integer"}}), &["value"]),
            object_schema(json!({"result": {"type": "integer"}}), &["result"]),
            from_typed_fn(move |_ctx: Arc<CallContext>, params: PublicParams| {
                public_calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(json!({ "result": params.value * 2 })) }
            }),
        )
        .method(
            "notify_only",
            object_schema(json!({"data": {"type": "string"}}), &["data"]),
            from_fn(move |_ctx: Arc<CallContext>, _params: Value| {
                notify_calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Value::Null) }
            }),
        )
        .method(
            "raise_error",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, _params: Value| async {
                Err(Error::Internal("This is a test error".to_string()))
            }),
        )
        .method(
            "explode",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, _params: Value| async {
                if true {
                    panic!("callback blew up");
                }
                Ok(Value::Null)
            }),
        )
        .method_with_output(
            "bad_output",
            AnySchema,
            object_schema(json!({"result": {"type": "integer"}}), &["result"]),
            from_fn(|_ctx: Arc<CallContext>, _params: Value| async {
                Ok(json!({"result": "not a number"}))
            }),
        )
        .method(
            "withdraw",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, params: Value| async move {
                if params["amount"].as_u64().unwrap_or(0) == 0 {
                    let mut errors = ValidationErrors::single("params.amount", "must be positive");
                    errors.add("params.amount", "must be an integer");
                    return Err(Error::Validation(errors));
                }
                Ok(json!({"withdrawn": params["amount"]}))
            }),
        )
        .method(
            "transfer",
            AnySchema,
            from_typed_fn(|_ctx: Arc<CallContext>, params: TransferParams| async move {
                Ok(json!({"sent": params.amount}))
            }),
        )
        .method(
            "identity",
            AnySchema,
            from_fn(|_ctx: Arc<CallContext>, params: Value| async move { Ok(params) }),
        )
}

/// Dispatcher with the default configuration
pub fn dispatcher(counters: &Counters) -> Dispatcher<CallContext> {
    builder(counters).build().expect("dispatcher should build")
}

/// Request item with an id
pub fn request(method: &str, params: Value, id: impl Into<Value>) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id.into()})
}

/// Request item without an id
pub fn notification(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params})
}

/// Anonymous context around `body`
pub fn anonymous(body: Value) -> Arc<CallContext> {
    Arc::new(CallContext::new(body))
}

/// Authenticated context around `body`
pub fn authenticated(body: Value) -> Arc<CallContext> {
    Arc::new(CallContext::new(body).with_principal("user"))
}

/// Outcome as JSON, `null` for no content
pub fn to_json(outcome: &Outcome) -> Value {
    serde_json::to_value(outcome).expect("outcome serializes")
}
