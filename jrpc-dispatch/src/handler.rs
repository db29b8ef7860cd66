//! Method callbacks
//!
//! A [`Handler`] is the callable behind a registered method. It receives the
//! request's execution context and the params already accepted by the
//! method's input schema, and resolves to a JSON result or an [`Error`].
//!
//! Handlers are usually built from async closures:
//!
//! 1. **from_fn**: raw `serde_json::Value` params and result
//! 2. **from_typed_fn**: params deserialized into a serde type, result
//!    serialized back
//!
//! # Examples
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, from_typed_fn, CallContext};
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! let ping = from_fn(|_ctx: Arc<CallContext>, _params| async move {
//!     Ok(serde_json::json!("pong"))
//! });
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i32, b: i32 }
//!
//! let add = from_typed_fn(|_ctx: Arc<CallContext>, params: AddParams| async move {
//!     Ok(params.a + params.b)
//! });
//! ```

use jrpc_core::{Error, Result, ValidationErrors};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::schema::ROOT_PATH;

/// Future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Callable behind a registered method
///
/// `C` is the host's execution context type. Implement this directly for
/// stateful handlers; closures go through [`from_fn`] or [`from_typed_fn`].
pub trait Handler<C>: Send + Sync {
    /// Run the method with validated params
    fn call(&self, ctx: Arc<C>, params: Value) -> HandlerResult;
}

/// Adapts an async closure into a [`Handler`]
pub struct FnHandler<F> {
    func: F,
}

impl<C, F, Fut> Handler<C> for FnHandler<F>
where
    F: Fn(Arc<C>, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call(&self, ctx: Arc<C>, params: Value) -> HandlerResult {
        Box::pin((self.func)(ctx, params))
    }
}

/// Handler over raw JSON params and result
pub fn from_fn<C, F, Fut>(func: F) -> Box<dyn Handler<C>>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(FnHandler { func })
}

/// Handler with serde conversion of params and result
///
/// Params that do not deserialize into `P` fail as a validation error
/// (reported to the caller as invalid params). A result that does not
/// serialize fails as `Error::Serialization`.
pub fn from_typed_fn<C, P, R, F, Fut>(func: F) -> Box<dyn Handler<C>>
where
    C: Send + Sync + 'static,
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(Arc<C>, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |ctx: Arc<C>, params: Value| {
        let func = Arc::clone(&func);
        async move {
            let params: P = serde_json::from_value(params)
                .map_err(|e| Error::Validation(ValidationErrors::single(ROOT_PATH, e.to_string())))?;

            let result = func(ctx, params).await?;

            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}
