//! Execution context handed to every callback
//!
//! The host framework builds one context per inbound request (decoded body,
//! authenticated principal, anything else it wants callbacks to see) and
//! passes it to [`Dispatcher::handle`](crate::Dispatcher::handle). The same
//! `Arc` is shared by every call of a batch.

use serde_json::Value;
use std::collections::HashMap;

/// Per-request state supplied by the host
///
/// The only requirement is access to the decoded request body, which is
/// where the dispatcher reads the JSON-RPC payload from.
pub trait RequestContext: Send + Sync + 'static {
    /// Decoded request payload (object or array)
    fn body(&self) -> &Value;
}

impl RequestContext for Value {
    fn body(&self) -> &Value {
        self
    }
}

/// Ready-made request context
///
/// # Examples
///
/// ```rust
/// use jrpc_dispatch::{CallContext, RequestContext};
/// use serde_json::json;
///
/// let ctx = CallContext::new(json!({"jsonrpc": "2.0", "method": "ping", "id": 1}))
///     .with_principal("alice")
///     .with_metadata("remote_addr", json!("10.0.0.7"));
///
/// assert_eq!(ctx.principal(), Some("alice"));
/// assert_eq!(ctx.body()["method"], "ping");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    body: Value,
    principal: Option<String>,
    metadata: HashMap<String, Value>,
}

impl CallContext {
    /// Context around a decoded request body
    pub fn new(body: Value) -> Self {
        Self {
            body,
            principal: None,
            metadata: HashMap::new(),
        }
    }

    /// Attach the identity established by upstream authentication
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Attach a metadata value
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Authenticated principal, if any
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl RequestContext for CallContext {
    fn body(&self) -> &Value {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_context_accessors() {
        let ctx = CallContext::new(json!([1, 2])).with_metadata("trace", json!("abc"));

        assert_eq!(ctx.body(), &json!([1, 2]));
        assert_eq!(ctx.principal(), None);
        assert_eq!(ctx.metadata("trace"), Some(&json!("abc")));
        assert!(ctx.metadata("missing").is_none());
    }

    #[test]
    fn test_value_is_a_context() {
        let body = json!({"method": "echo"});
        assert_eq!(RequestContext::body(&body)["method"], "echo");
    }
}
