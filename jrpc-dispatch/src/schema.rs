//! Parameter and result validation
//!
//! A [`Schema`] is the `validate(value) -> success | failure(errors)` seam
//! between a method and whatever validation library it uses. Success may
//! return a normalized value (defaults filled in, types coerced), which is
//! what the callback receives.
//!
//! Adapters provided here:
//!
//! - [`AnySchema`]: accepts every value unchanged
//! - [`TypedSchema`]: round-trips the value through a serde type
//! - [`JsonSchema`]: a compiled JSON Schema document (`jsonschema` crate)
//! - [`FnSchema`]: any closure, see [`schema_fn`]
//!
//! Failures are reported as [`ValidationErrors`] keyed by field path, with
//! `params` standing for the parameter value as a whole.

use jrpc_core::{Error, Result, ValidationErrors};
use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Path used for failures that concern the whole value
pub const ROOT_PATH: &str = "params";

/// Validation contract used for method input and output
pub trait Schema: Send + Sync {
    /// Check `value`, returning the (possibly normalized) value to use
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationErrors>;
}

/// Accepts any value
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationErrors> {
        Ok(value.clone())
    }
}

/// Validates by deserializing into `T`
///
/// On success the value is re-serialized from `T`, so serde defaults and
/// renames are applied before the callback sees it.
///
/// ```rust
/// use jrpc_dispatch::{Schema, TypedSchema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Page {
///     #[serde(default)]
///     offset: u32,
///     limit: u32,
/// }
///
/// let schema = TypedSchema::<Page>::new();
/// assert_eq!(schema.validate(&json!({"limit": 10})).unwrap(), json!({"offset": 0, "limit": 10}));
/// assert!(schema.validate(&json!({"offset": 1})).is_err());
/// ```
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Create the schema
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedSchema<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationErrors> {
        let typed: T = serde_json::from_value(value.clone())
            .map_err(|e| ValidationErrors::single(ROOT_PATH, e.to_string()))?;
        serde_json::to_value(typed).map_err(|e| ValidationErrors::single(ROOT_PATH, e.to_string()))
    }
}

/// A compiled JSON Schema document
///
/// ```rust
/// use jrpc_dispatch::{JsonSchema, Schema};
/// use serde_json::json;
///
/// let schema = JsonSchema::new(&json!({
///     "type": "object",
///     "properties": {"message": {"type": "string"}},
///     "required": ["message"]
/// }))
/// .unwrap();
///
/// let errors = schema.validate(&json!({})).unwrap_err();
/// assert_eq!(errors.get("message").unwrap(), ["is required"]);
/// ```
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compile a schema document
    ///
    /// An invalid document is a setup-time failure (`Error::Config`).
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::Validator::new(schema)
            .map_err(|e| Error::Config(format!("invalid JSON schema: {}", e)))?;
        Ok(Self { validator })
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for error in self.validator.iter_errors(value) {
            let path = error_path(&error.instance_path.to_string());
            match &error.kind {
                ValidationErrorKind::Required { property } => {
                    let property = property
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| property.to_string());
                    let path = if path == ROOT_PATH {
                        property
                    } else {
                        format!("{}.{}", path, property)
                    };
                    errors.add(path, "is required");
                }
                _ => errors.add(path, error.to_string()),
            }
        }

        if errors.is_empty() {
            Ok(value.clone())
        } else {
            Err(errors)
        }
    }
}

// "/user/name" -> "user.name", "" -> "params"
fn error_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

/// Schema backed by a closure
pub struct FnSchema<F> {
    func: F,
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> std::result::Result<Value, ValidationErrors> + Send + Sync,
{
    fn validate(&self, value: &Value) -> std::result::Result<Value, ValidationErrors> {
        (self.func)(value)
    }
}

/// Wrap a validation closure as a [`Schema`]
///
/// ```rust
/// use jrpc_core::ValidationErrors;
/// use jrpc_dispatch::{schema_fn, Schema};
/// use serde_json::json;
///
/// let positive = schema_fn(|value| match value.as_i64() {
///     Some(n) if n > 0 => Ok(value.clone()),
///     _ => Err(ValidationErrors::single("params", "must be a positive integer")),
/// });
///
/// assert!(positive.validate(&json!(3)).is_ok());
/// assert!(positive.validate(&json!(-3)).is_err());
/// ```
pub fn schema_fn<F>(func: F) -> FnSchema<F>
where
    F: Fn(&Value) -> std::result::Result<Value, ValidationErrors> + Send + Sync,
{
    FnSchema { func }
}
