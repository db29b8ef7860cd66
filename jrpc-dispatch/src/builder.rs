//! Builder for constructing a [`Dispatcher`]
//!
//! Registration happens here and only here: once [`build`] returns, the
//! registry is frozen. A registration mistake (two methods with the same
//! name, an invalid configuration) is reported by [`build`], so it surfaces
//! at startup rather than on some later request.
//!
//! [`build`]: DispatcherBuilder::build
//!
//! # Examples
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, BatchFailure, CallContext, Dispatcher, JsonSchema};
//! use serde_json::json;
//!
//! # fn example() -> jrpc_core::Result<()> {
//! let dispatcher = Dispatcher::<CallContext>::builder()
//!     .method(
//!         "echo",
//!         JsonSchema::new(&json!({
//!             "type": "object",
//!             "properties": {"message": {"type": "string"}},
//!             "required": ["message"]
//!         }))?,
//!         from_fn(|_ctx, params| async move { Ok(json!({"echo_message": params["message"]})) }),
//!     )
//!     .batch_limit(50)
//!     .batch_failure(BatchFailure::Stop)
//!     .build()?;
//!
//! assert!(dispatcher.registry().contains("echo"));
//! # Ok(())
//! # }
//! ```

use crate::batch::BatchFailure;
use crate::config::{DispatchConfig, ErrorExposure};
use crate::controller::Dispatcher;
use crate::entry::MethodEntry;
use crate::handler::Handler;
use crate::metrics::DispatchMetrics;
use crate::registry::MethodRegistry;
use crate::renderer::StatusPolicy;
use crate::schema::Schema;
use jrpc_core::{Error, Result};
use std::sync::Arc;

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder<C> {
    registry: MethodRegistry<C>,
    config: DispatchConfig,
    metrics: Option<Arc<DispatchMetrics>>,
    error: Option<Error>,
}

impl<C> DispatcherBuilder<C> {
    /// Empty builder with the default configuration
    pub fn new() -> Self {
        Self {
            registry: MethodRegistry::new(),
            config: DispatchConfig::default(),
            metrics: None,
            error: None,
        }
    }

    /// Register a method with an input schema
    pub fn method(
        self,
        name: impl Into<String>,
        input_schema: impl Schema + 'static,
        callback: Box<dyn Handler<C>>,
    ) -> Self {
        self.entry(MethodEntry::new(name, input_schema, callback))
    }

    /// Register a method with input and output schemas
    pub fn method_with_output(
        self,
        name: impl Into<String>,
        input_schema: impl Schema + 'static,
        output_schema: impl Schema + 'static,
        callback: Box<dyn Handler<C>>,
    ) -> Self {
        self.entry(MethodEntry::new(name, input_schema, callback).with_output_schema(output_schema))
    }

    /// Register a pre-built entry
    ///
    /// The first registration error is kept and returned by `build`.
    pub fn entry(mut self, entry: MethodEntry<C>) -> Self {
        if let Err(e) = self.registry.add(entry) {
            tracing::error!(error = %e, "method registration failed");
            self.error.get_or_insert(e);
        }
        self
    }

    /// Replace the whole configuration
    pub fn configure(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum batch size
    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.config.batch_limit = limit;
        self
    }

    /// Set the batch failure policy
    pub fn batch_failure(mut self, policy: BatchFailure) -> Self {
        self.config.batch_failure = policy;
        self
    }

    /// Enable or disable output validation
    pub fn validate_output(mut self, enable: bool) -> Self {
        self.config.validate_output = enable;
        self
    }

    /// Set how much of an internal failure callers see
    pub fn error_exposure(mut self, exposure: ErrorExposure) -> Self {
        self.config.error_exposure = exposure;
        self
    }

    /// Set the HTTP status convention
    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.config.status_policy = policy;
        self
    }

    /// Record OpenTelemetry metrics on the global meter
    pub fn with_metrics(mut self) -> Self {
        self.metrics = Some(Arc::new(DispatchMetrics::new()));
        self
    }

    /// Record metrics on the given instruments
    pub fn metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Freeze the registry and create the dispatcher
    pub fn build(self) -> Result<Dispatcher<C>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.validate()?;

        tracing::info!(
            methods = self.registry.len(),
            batch_limit = self.config.batch_limit,
            batch_failure = ?self.config.batch_failure,
            "dispatcher ready"
        );

        Ok(Dispatcher::new(self.registry, self.config, self.metrics))
    }
}

impl<C> Default for DispatcherBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::schema::AnySchema;
    use serde_json::json;

    fn noop() -> Box<dyn Handler<()>> {
        from_fn(|_ctx: Arc<()>, _params| async { Ok(json!(null)) })
    }

    #[test]
    fn test_builder_defaults() {
        let dispatcher = DispatcherBuilder::<()>::new().build().unwrap();
        assert_eq!(dispatcher.config(), &DispatchConfig::default());
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_duplicate_fails_build() {
        let err = DispatcherBuilder::new()
            .method("echo", AnySchema, noop())
            .method("other", AnySchema, noop())
            .method("echo", AnySchema, noop())
            .build()
            .err()
            .unwrap();

        assert!(matches!(err, Error::DuplicateMethod(ref name) if name == "echo"));
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let err = DispatcherBuilder::new()
            .method("echo", AnySchema, noop())
            .batch_limit(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_setters() {
        let dispatcher = DispatcherBuilder::new()
            .method_with_output("echo", AnySchema, AnySchema, noop())
            .batch_limit(7)
            .batch_failure(BatchFailure::Stop)
            .validate_output(true)
            .error_exposure(ErrorExposure::Detailed)
            .status_policy(StatusPolicy::AlwaysOk)
            .with_metrics()
            .build()
            .unwrap();

        let config = dispatcher.config();
        assert_eq!(config.batch_limit, 7);
        assert_eq!(config.batch_failure, BatchFailure::Stop);
        assert!(config.validate_output);
        assert_eq!(config.error_exposure, ErrorExposure::Detailed);
        assert_eq!(config.status_policy, StatusPolicy::AlwaysOk);
        assert_eq!(dispatcher.renderer().policy(), StatusPolicy::AlwaysOk);
        assert!(dispatcher.registry().get("echo").unwrap().has_output_schema());
    }

    #[test]
    fn test_configure_replaces_config() {
        let config = DispatchConfig {
            batch_limit: 3,
            ..Default::default()
        };
        let dispatcher = DispatcherBuilder::<()>::new().configure(config.clone()).build().unwrap();
        assert_eq!(dispatcher.config(), &config);
    }
}
