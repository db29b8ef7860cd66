//! Request dispatch
//!
//! The [`Dispatcher`] is the entry point for one decoded JSON-RPC payload.
//! It classifies the payload, checks the envelope of every item, routes
//! calls through the [`MethodRegistry`], translates failures into taxonomy
//! errors and assembles the [`Outcome`].
//!
//! # Request Flow
//!
//! ```text
//! payload ──► object ──► envelope ──► registry ──► entry ──► Outcome::Single / NoContent
//!        └──► array  ──► limit ──► per item (in order) ──► Outcome::Batch / NoContent
//!        └──► other  ──► Err(InvalidRequest)
//! ```
//!
//! A call without an id (absent or `null`) is a notification: it runs for
//! its side effects and never yields a response, not even on failure.
//!
//! # Failure translation
//!
//! | Callback error | Wire error |
//! |---|---|
//! | `Error::Rpc` | unchanged, id set to the call id |
//! | `Error::Validation` | InvalidParams with the field detail |
//! | anything else, panics | InternalError, logged |

use crate::builder::DispatcherBuilder;
use crate::config::{DispatchConfig, ErrorExposure};
use crate::context::RequestContext;
use crate::metrics::DispatchMetrics;
use crate::registry::MethodRegistry;
use crate::renderer::Renderer;
use futures::FutureExt;
use jrpc_core::{Error, Id, JsonRpcCall, JsonRpcResponse, Outcome, RpcError, JSONRPC_VERSION};
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// JSON-RPC 2.0 dispatcher
///
/// Cheap to clone; clones share the frozen registry. Build one with
/// [`Dispatcher::builder`].
///
/// # Examples
///
/// ```rust
/// use jrpc_dispatch::{from_fn, AnySchema, CallContext, Dispatcher};
/// use jrpc_core::Outcome;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> jrpc_core::Result<()> {
/// let dispatcher = Dispatcher::<CallContext>::builder()
///     .method("ping", AnySchema, from_fn(|_ctx, _params| async { Ok(json!("pong")) }))
///     .build()?;
///
/// let ctx = Arc::new(CallContext::new(json!({"jsonrpc": "2.0", "method": "ping", "id": 1})));
/// let outcome = dispatcher.handle(ctx).await.unwrap();
///
/// match outcome {
///     Outcome::Single(response) => assert_eq!(response.result, Some(json!("pong"))),
///     other => panic!("unexpected outcome: {:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<C> {
    registry: Arc<MethodRegistry<C>>,
    config: DispatchConfig,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<C> Dispatcher<C> {
    pub(crate) fn new(
        registry: MethodRegistry<C>,
        config: DispatchConfig,
        metrics: Option<Arc<DispatchMetrics>>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            metrics,
        }
    }

    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder<C> {
        DispatcherBuilder::new()
    }

    /// Active configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Registered methods
    pub fn registry(&self) -> &MethodRegistry<C> {
        &self.registry
    }

    /// Renderer matching the configured status policy
    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.config.status_policy)
    }

    pub(crate) fn metrics(&self) -> Option<&DispatchMetrics> {
        self.metrics.as_deref()
    }
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    /// Dispatch the payload found in the context's body
    ///
    /// `Err` is returned for failures that concern the request as a whole
    /// (empty batch, batch over the limit, payload neither object nor
    /// array). Failures of individual calls are inside the `Outcome`.
    pub async fn handle(&self, ctx: Arc<C>) -> Result<Outcome, RpcError>
    where
        C: RequestContext,
    {
        let payload = Arc::clone(&ctx);
        self.dispatch(ctx, payload.body()).await
    }

    /// Dispatch an explicit payload
    #[tracing::instrument(skip_all, fields(mode = payload_mode(payload)))]
    pub async fn dispatch(&self, ctx: Arc<C>, payload: &Value) -> Result<Outcome, RpcError> {
        match payload {
            Value::Array(items) => self.process_batch(ctx, items).await,
            Value::Object(_) => Ok(self.process_single(ctx, payload).await),
            _ => {
                tracing::warn!("payload is neither an object nor an array");
                Err(RpcError::invalid_request()
                    .with_message("Invalid request: expected an object or an array"))
            }
        }
    }

    async fn process_single(&self, ctx: Arc<C>, item: &Value) -> Outcome {
        match self.run_item(ctx, item).await.into_response() {
            Some(response) => Outcome::Single(response),
            None => Outcome::NoContent,
        }
    }

    /// Check the envelope of one item and execute it
    pub(crate) async fn run_item(&self, ctx: Arc<C>, item: &Value) -> ItemOutcome {
        let outcome = match parse_call(item) {
            Ok(call) => {
                let reply_to = ReplyTo::from(call.id.clone());
                let result = self.execute_call(ctx, call).await;
                ItemOutcome { reply_to, result }
            }
            Err((reply_to, error)) => {
                tracing::warn!(message = %error.message, "rejected request envelope");
                ItemOutcome {
                    reply_to,
                    result: Err(error),
                }
            }
        };

        if let (Err(error), Some(metrics)) = (&outcome.result, self.metrics()) {
            metrics.record_error(error.code());
        }
        outcome
    }

    #[tracing::instrument(skip_all, fields(method = %call.method, id = ?call.id))]
    async fn execute_call(&self, ctx: Arc<C>, call: JsonRpcCall) -> Result<Value, RpcError> {
        let id = Id::from(call.id.clone());
        let started = Instant::now();

        let execution = self.registry.execute(
            &call.method,
            &id,
            call.params,
            ctx,
            self.config.validate_output,
        );

        let result = match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(self.translate(&call.method, &id, error)),
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                tracing::error!(method = %call.method, id = %id, detail = %detail, "callback panicked");
                Err(self.internal_error(&id, detail, None))
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => tracing::debug!(duration_secs = elapsed, "call succeeded"),
            Err(error) => tracing::warn!(
                code = error.code(),
                message = %error.message,
                notification = call.id.is_none(),
                "call failed"
            ),
        }

        if let Some(metrics) = self.metrics() {
            let outcome = if result.is_ok() { "success" } else { "error" };
            metrics.record_call(&call.method, outcome, elapsed);
        }

        result
    }

    fn translate(&self, method: &str, id: &Id, error: Error) -> RpcError {
        match error {
            Error::Rpc(error) => error.with_id(id.clone()),
            Error::Validation(errors) => RpcError::invalid_params()
                .with_id(id.clone())
                .with_message(format!("Invalid params: {}", errors))
                .with_data(errors.to_value()),
            Error::InvalidOutput { method, errors } => {
                tracing::error!(method = %method, id = %id, errors = %errors, "callback output failed validation");
                let detail = format!("Output of `{}` failed validation", method);
                self.internal_error(id, detail, Some(errors.to_value()))
            }
            other => {
                tracing::error!(method = %method, id = %id, error = %other, "unexpected failure");
                self.internal_error(id, other.to_string(), None)
            }
        }
    }

    fn internal_error(&self, id: &Id, detail: String, errors: Option<Value>) -> RpcError {
        let error = RpcError::internal_error().with_id(id.clone());
        match self.config.error_exposure {
            ErrorExposure::Redacted => error,
            ErrorExposure::Detailed => {
                let mut data = json!({ "detail": detail });
                if let Some(errors) = errors {
                    data["errors"] = errors;
                }
                error.with_message(detail).with_data(data)
            }
        }
    }
}

/// Where the answer to one item goes
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReplyTo {
    /// Respond with this id (`Id::Null` when the item could not be read)
    Id(Id),
    /// Notification, no response
    Nobody,
}

impl From<Option<Id>> for ReplyTo {
    fn from(id: Option<Id>) -> Self {
        match id {
            Some(id) => ReplyTo::Id(id),
            None => ReplyTo::Nobody,
        }
    }
}

impl ReplyTo {
    /// Reply target of a raw item, without checking the rest of it
    pub(crate) fn of(item: &Value) -> Self {
        match item {
            Value::Object(fields) => match fields.get("id").map(Id::from_json) {
                None | Some(Ok(None)) => ReplyTo::Nobody,
                Some(Ok(Some(id))) => ReplyTo::Id(id),
                Some(Err(_)) => ReplyTo::Id(Id::Null),
            },
            _ => ReplyTo::Id(Id::Null),
        }
    }
}

/// Result of one item, before assembly
#[derive(Debug)]
pub(crate) struct ItemOutcome {
    pub(crate) reply_to: ReplyTo,
    pub(crate) result: Result<Value, RpcError>,
}

impl ItemOutcome {
    pub(crate) fn failed(&self) -> bool {
        self.result.is_err()
    }

    pub(crate) fn into_response(self) -> Option<JsonRpcResponse> {
        let ReplyTo::Id(id) = self.reply_to else {
            return None;
        };
        Some(match self.result {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(error) => error.with_id(id).to_response(),
        })
    }
}

/// Envelope check of one item
///
/// `params` is not inspected here; any value goes to the method's input
/// schema, and a missing one is passed as null.
fn parse_call(item: &Value) -> Result<JsonRpcCall, (ReplyTo, RpcError)> {
    let Value::Object(fields) = item else {
        return Err((
            ReplyTo::Id(Id::Null),
            RpcError::invalid_request().with_message("Invalid request: expected an object"),
        ));
    };

    let id = match fields.get("id") {
        Some(value) => Id::from_json(value).map_err(|error| (ReplyTo::Id(Id::Null), error))?,
        None => None,
    };
    let reply_to = ReplyTo::from(id.clone());

    if fields.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err((
            reply_to,
            RpcError::invalid_request().with_message("Invalid request: 'jsonrpc' must be \"2.0\""),
        ));
    }

    let method = match fields.get("method").and_then(Value::as_str) {
        Some(method) if !method.is_empty() => method,
        _ => {
            return Err((
                reply_to,
                RpcError::invalid_request()
                    .with_message("Invalid request: 'method' must be a non-empty string"),
            ))
        }
    };

    let params = fields.get("params").cloned().unwrap_or(Value::Null);
    Ok(JsonRpcCall::new(method, params, id))
}

fn payload_mode(payload: &Value) -> &'static str {
    match payload {
        Value::Array(_) => "batch",
        Value::Object(_) => "single",
        _ => "invalid",
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked".to_string()
    }
}
