//! HTTP rendering of dispatch outcomes
//!
//! The renderer turns an [`Outcome`] or an [`RpcError`] into a status code,
//! a content type and a JSON body, and writes the first two through the
//! host's [`TransportContext`]. It knows nothing about the HTTP library in
//! use.
//!
//! | Result | Status |
//! |---|---|
//! | no content, empty batch | 204 |
//! | success, batch | 200 |
//! | ParseError, InvalidRequest, InvalidParams | 400 |
//! | AuthenticationError | 401 |
//! | MethodNotFound | 404 |
//! | InternalError, ServerError, unknown code | 500 |
//!
//! Under [`StatusPolicy::AlwaysOk`] every error is sent with 200.

use jrpc_core::{Error, ErrorKind, Outcome, RpcError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Content type of every rendered response
pub const CONTENT_TYPE: &str = "application/json";

/// HTTP status convention for error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Status derived from the error kind
    #[default]
    PerKind,
    /// 200 for every error, the body carries the failure
    AlwaysOk,
}

impl FromStr for StatusPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_kind" => Ok(Self::PerKind),
            "always_ok" => Ok(Self::AlwaysOk),
            other => Err(Error::Config(format!("unknown status policy: {}", other))),
        }
    }
}

/// Response metadata sink provided by the host
pub trait TransportContext {
    /// Set the HTTP status code
    fn set_status(&mut self, status: u16);
    /// Set the content type header
    fn set_content_type(&mut self, content_type: &str);
}

/// A transport-independent rendered response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedResponse {
    /// HTTP status code
    pub status: u16,
    /// Content type header
    pub content_type: String,
    /// Serialized body, empty for 204
    pub body: String,
}

impl TransportContext for RenderedResponse {
    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = content_type.to_string();
    }
}

/// Maps outcomes and errors to status and body
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    policy: StatusPolicy,
}

impl Renderer {
    /// Renderer using `policy` for error statuses
    pub fn new(policy: StatusPolicy) -> Self {
        Self { policy }
    }

    /// Status policy in use
    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    /// Status for an error code, honoring the policy
    pub fn status_for_code(&self, code: i32) -> u16 {
        match self.policy {
            StatusPolicy::AlwaysOk => 200,
            StatusPolicy::PerKind => match ErrorKind::from_code(code) {
                Some(kind) => status_for_kind(kind),
                None => 500,
            },
        }
    }

    /// Render the outcome of a dispatch
    ///
    /// A single error response is mapped by its error code. A batch is 200
    /// even when some of its items failed.
    pub fn render(&self, outcome: &Outcome, ctx: &mut dyn TransportContext) -> String {
        ctx.set_content_type(CONTENT_TYPE);

        let status = match outcome {
            _ if outcome.is_empty() => {
                ctx.set_status(204);
                return String::new();
            }
            Outcome::Single(response) => match &response.error {
                Some(error) => self.status_for_code(error.code),
                None => 200,
            },
            _ => 200,
        };

        match serde_json::to_string(outcome) {
            Ok(body) => {
                ctx.set_status(status);
                body
            }
            Err(e) => self.render_fallback(&e, ctx),
        }
    }

    /// Render a request-level error
    pub fn render_error(&self, error: &RpcError, ctx: &mut dyn TransportContext) -> String {
        ctx.set_content_type(CONTENT_TYPE);

        match serde_json::to_string(&error.to_response()) {
            Ok(body) => {
                ctx.set_status(self.status_for_code(error.code()));
                body
            }
            Err(e) => self.render_fallback(&e, ctx),
        }
    }

    /// Render the result of [`Dispatcher::handle`](crate::Dispatcher::handle)
    pub fn render_result(
        &self,
        result: &Result<Outcome, RpcError>,
        ctx: &mut dyn TransportContext,
    ) -> String {
        match result {
            Ok(outcome) => self.render(outcome, ctx),
            Err(error) => self.render_error(error, ctx),
        }
    }

    /// Render into a fresh [`RenderedResponse`]
    pub fn to_response(&self, result: &Result<Outcome, RpcError>) -> RenderedResponse {
        let mut response = RenderedResponse::default();
        let body = self.render_result(result, &mut response);
        response.body = body;
        response
    }

    fn render_fallback(&self, error: &serde_json::Error, ctx: &mut dyn TransportContext) -> String {
        tracing::error!(error = %error, "failed to serialize response body");
        ctx.set_status(500);
        let fallback = RpcError::internal_error().to_response();
        serde_json::to_string(&fallback).unwrap_or_default()
    }
}

/// Per-kind HTTP status
pub fn status_for_kind(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::ParseError | ErrorKind::InvalidRequest | ErrorKind::InvalidParams => 400,
        ErrorKind::MethodNotFound => 404,
        ErrorKind::AuthenticationError => 401,
        ErrorKind::InternalError | ErrorKind::ServerError => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrpc_core::{Id, JsonRpcResponse};
    use serde_json::{json, Value};

    #[test]
    fn test_status_per_kind() {
        let expected = [
            (ErrorKind::ParseError, 400),
            (ErrorKind::InvalidRequest, 400),
            (ErrorKind::MethodNotFound, 404),
            (ErrorKind::InvalidParams, 400),
            (ErrorKind::InternalError, 500),
            (ErrorKind::ServerError, 500),
            (ErrorKind::AuthenticationError, 401),
        ];
        for (kind, status) in expected {
            assert_eq!(status_for_kind(kind), status, "{:?}", kind);
        }

        let renderer = Renderer::default();
        assert_eq!(renderer.status_for_code(-32099), 500);
    }

    #[test]
    fn test_no_content() {
        let renderer = Renderer::default();
        let mut response = RenderedResponse::default();

        let body = renderer.render(&Outcome::NoContent, &mut response);
        assert!(body.is_empty());
        assert_eq!(response.status, 204);
        assert_eq!(response.content_type, CONTENT_TYPE);

        let body = renderer.render(&Outcome::Batch(Vec::new()), &mut response);
        assert!(body.is_empty());
        assert_eq!(response.status, 204);
    }

    #[test]
    fn test_single_success_and_error() {
        let renderer = Renderer::default();

        let ok = Outcome::Single(JsonRpcResponse::success(json!({"a": 1}), Id::Number(1)));
        let rendered = renderer.to_response(&Ok(ok));
        assert_eq!(rendered.status, 200);
        let body: Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(body, json!({"jsonrpc": "2.0", "id": 1, "result": {"a": 1}}));

        let missing = Outcome::Single(
            RpcError::method_not_found("missing")
                .with_id(Id::Number(2))
                .to_response(),
        );
        assert_eq!(renderer.to_response(&Ok(missing)).status, 404);
    }

    #[test]
    fn test_batch_is_ok_with_failed_items() {
        let renderer = Renderer::default();
        let outcome = Outcome::Batch(vec![
            JsonRpcResponse::success(json!(1), Id::Number(1)),
            RpcError::invalid_params().with_id(Id::Number(2)).to_response(),
        ]);

        let rendered = renderer.to_response(&Ok(outcome));
        assert_eq!(rendered.status, 200);
        let body: Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_render_error() {
        let renderer = Renderer::default();
        let rendered = renderer.to_response(&Err(RpcError::batch_limit_exceeded(5)));

        assert_eq!(rendered.status, 400);
        let body: Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["error"]["data"], json!({"batch_limit": 5}));
    }

    #[test]
    fn test_always_ok_policy() {
        let renderer = Renderer::new(StatusPolicy::AlwaysOk);

        let rendered = renderer.to_response(&Err(RpcError::authentication_error()));
        assert_eq!(rendered.status, 200);
        assert_eq!(rendered.content_type, CONTENT_TYPE);

        let rendered = renderer.to_response(&Ok(Outcome::NoContent));
        assert_eq!(rendered.status, 204);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("per_kind".parse::<StatusPolicy>().unwrap(), StatusPolicy::PerKind);
        assert_eq!("ALWAYS_OK".parse::<StatusPolicy>().unwrap(), StatusPolicy::AlwaysOk);
        assert!("sometimes".parse::<StatusPolicy>().is_err());
    }
}
