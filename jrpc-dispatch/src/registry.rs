//! Method registry
//!
//! Maps method names to [`MethodEntry`] values. The registry is filled
//! during setup and then frozen: [`DispatcherBuilder::build`] moves it
//! behind an `Arc` and no mutable access exists afterwards.
//!
//! [`DispatcherBuilder::build`]: crate::DispatcherBuilder::build

use crate::entry::MethodEntry;
use jrpc_core::{Error, Id, Result, RpcError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-keyed collection of methods
pub struct MethodRegistry<C> {
    entries: HashMap<String, MethodEntry<C>>,
}

impl<C> MethodRegistry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register an entry
    ///
    /// Fails with [`Error::DuplicateMethod`] if the name is taken; the
    /// entry already registered is kept.
    pub fn add(&mut self, entry: MethodEntry<C>) -> Result<()> {
        if self.entries.contains_key(entry.name()) {
            return Err(Error::DuplicateMethod(entry.name().to_string()));
        }
        tracing::debug!(method = entry.name(), "method registered");
        self.entries.insert(entry.name().to_string(), entry);
        Ok(())
    }

    /// Look up an entry
    pub fn get(&self, name: &str) -> Option<&MethodEntry<C>> {
        self.entries.get(name)
    }

    /// Check if a method is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `name` and execute it
    ///
    /// An unknown name fails with `MethodNotFound` carrying `id`.
    pub async fn execute(
        &self,
        name: &str,
        id: &Id,
        params: Value,
        ctx: Arc<C>,
        validate_output: bool,
    ) -> Result<Value> {
        let entry = self
            .get(name)
            .ok_or_else(|| RpcError::method_not_found(name).with_id(id.clone()))?;

        entry.execute(id, params, ctx, validate_output).await
    }
}

impl<C> Default for MethodRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use serde_json::json;

    fn constant(name: &str, value: Value) -> MethodEntry<()> {
        MethodEntry::unchecked(
            name,
            from_fn(move |_ctx: Arc<()>, _params| {
                let value = value.clone();
                async move { Ok(value) }
            }),
        )
    }

    #[tokio::test]
    async fn test_registry_basic() {
        let mut registry = MethodRegistry::new();
        registry.add(constant("test", json!({"status": "ok"}))).unwrap();

        assert!(registry.contains("test"));
        assert!(!registry.contains("unknown"));
        assert_eq!(registry.len(), 1);

        let result = registry
            .execute("test", &Id::Number(1), Value::Null, Arc::new(()), false)
            .await
            .unwrap();
        assert_eq!(result, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_duplicate_keeps_first() {
        let mut registry = MethodRegistry::new();
        registry.add(constant("echo", json!(1))).unwrap();

        let err = registry.add(constant("echo", json!(2))).unwrap_err();
        assert!(matches!(err, Error::DuplicateMethod(ref name) if name == "echo"));

        let result = registry
            .execute("echo", &Id::Number(1), Value::Null, Arc::new(()), false)
            .await
            .unwrap();
        assert_eq!(result, json!(1));
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let registry: MethodRegistry<()> = MethodRegistry::default();
        assert!(registry.is_empty());

        let err = registry
            .execute("missing", &Id::Number(2), Value::Null, Arc::new(()), false)
            .await
            .unwrap_err();

        let Error::Rpc(err) = err else {
            panic!("expected a taxonomy error");
        };
        assert_eq!(err.code(), -32601);
        assert_eq!(err.id, Id::Number(2));
        assert_eq!(err.message, "Method not found: missing");
    }

    #[test]
    fn test_methods_sorted() {
        let mut registry = MethodRegistry::new();
        registry.add(constant("b", Value::Null)).unwrap();
        registry.add(constant("a", Value::Null)).unwrap();
        assert_eq!(registry.methods(), vec!["a".to_string(), "b".to_string()]);
    }
}
