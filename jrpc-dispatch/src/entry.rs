//! A single registered method
//!
//! A [`MethodEntry`] binds a name to an input schema, an optional output
//! schema and a callback. Executing it runs
//! `validate input -> callback -> validate output (optional)`.

use crate::handler::Handler;
use crate::schema::{AnySchema, Schema};
use jrpc_core::{Error, Id, Result, RpcError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One method known to the dispatcher
pub struct MethodEntry<C> {
    name: String,
    input_schema: Box<dyn Schema>,
    output_schema: Option<Box<dyn Schema>>,
    callback: Box<dyn Handler<C>>,
}

impl<C> MethodEntry<C> {
    /// Entry with an input schema and no output schema
    pub fn new(
        name: impl Into<String>,
        input_schema: impl Schema + 'static,
        callback: Box<dyn Handler<C>>,
    ) -> Self {
        Self {
            name: name.into(),
            input_schema: Box::new(input_schema),
            output_schema: None,
            callback,
        }
    }

    /// Entry accepting any params
    pub fn unchecked(name: impl Into<String>, callback: Box<dyn Handler<C>>) -> Self {
        Self::new(name, AnySchema, callback)
    }

    /// Declare the shape of the callback's result
    pub fn with_output_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.output_schema = Some(Box::new(schema));
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if an output schema is declared
    pub fn has_output_schema(&self) -> bool {
        self.output_schema.is_some()
    }

    /// Validate params, run the callback, optionally validate its result
    ///
    /// Rejected params fail with `InvalidParams` carrying the validation
    /// detail and `id`; the callback is not invoked. A rejected result
    /// fails with [`Error::InvalidOutput`].
    pub async fn execute(
        &self,
        id: &Id,
        params: Value,
        ctx: Arc<C>,
        validate_output: bool,
    ) -> Result<Value> {
        let params = self.input_schema.validate(&params).map_err(|errors| {
            RpcError::invalid_params()
                .with_id(id.clone())
                .with_data(errors.to_value())
        })?;

        let result = self.callback.call(ctx, params).await?;

        match &self.output_schema {
            Some(schema) if validate_output => {
                schema.validate(&result).map_err(|errors| Error::InvalidOutput {
                    method: self.name.clone(),
                    errors,
                })
            }
            _ => Ok(result),
        }
    }
}

impl<C> fmt::Debug for MethodEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("output_schema", &self.output_schema.is_some())
            .finish_non_exhaustive()
    }
}
