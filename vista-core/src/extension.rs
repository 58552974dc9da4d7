//! Extension providers and the by-name function registry.
//!
//! A view calls extension functions as if they were methods of the rendering
//! scope. Such calls are dispatched by name through [`ExtensionRegistry`]:
//! providers are searched in registration order and the first provider that
//! exposes the requested name handles the call.

use std::any::{type_name, TypeId};
use std::fmt;

use thiserror::Error;

use crate::error::ExtensionError;
use crate::types::Value;

/// A provider of named functions callable from views.
///
/// `functions` is the provider's call table; `call` is only invoked with a
/// name taken from that table.
pub trait Extension: Send + Sync + 'static {
    /// Names of the functions this provider exposes.
    fn functions(&self) -> &[&'static str];

    /// Invoke `function` with positional `args`.
    fn call(&self, function: &str, args: &[Value]) -> Result<Value, ExtensionError>;
}

/// Failure to dispatch an extension call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered provider exposes the function.
    #[error("calling an undefined function \"{name}\"")]
    Undefined { name: String },

    /// The provider was found but the function itself failed.
    #[error("extension function \"{function}\" failed: {source}")]
    Failed {
        function: String,
        #[source]
        source: ExtensionError,
    },
}

struct Registered {
    id: TypeId,
    type_name: &'static str,
    provider: Box<dyn Extension>,
}

/// Extension providers keyed by their concrete type.
#[derive(Default)]
pub struct ExtensionRegistry {
    providers: Vec<Registered>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its type identity.
    ///
    /// Registering a second provider of the same type replaces the first one
    /// in place, keeping its original lookup position. Returns `true` when a
    /// provider was replaced.
    pub fn register<E: Extension>(&mut self, provider: E) -> bool {
        let id = TypeId::of::<E>();
        let entry = Registered {
            id,
            type_name: type_name::<E>(),
            provider: Box::new(provider),
        };
        match self.providers.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                tracing::debug!(extension = entry.type_name, "replacing registered extension");
                *slot = entry;
                true
            }
            None => {
                tracing::debug!(extension = entry.type_name, "registering extension");
                self.providers.push(entry);
                false
            }
        }
    }

    /// First provider, in registration order, that exposes `function`.
    pub fn resolve(&self, function: &str) -> Option<&dyn Extension> {
        self.providers
            .iter()
            .find(|r| r.provider.functions().iter().any(|name| *name == function))
            .map(|r| r.provider.as_ref())
    }

    /// Whether any provider exposes `function`.
    pub fn contains(&self, function: &str) -> bool {
        self.resolve(function).is_some()
    }

    /// Resolve `function` and invoke it with `args`.
    pub fn call(&self, function: &str, args: &[Value]) -> Result<Value, DispatchError> {
        let provider = self.resolve(function).ok_or_else(|| DispatchError::Undefined {
            name: function.to_string(),
        })?;
        provider
            .call(function, args)
            .map_err(|source| DispatchError::Failed {
                function: function.to_string(),
                source,
            })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|r| r.type_name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    impl Extension for Upper {
        fn functions(&self) -> &[&'static str] {
            &["upper", "shout"]
        }

        fn call(&self, function: &str, args: &[Value]) -> Result<Value, ExtensionError> {
            let text = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| ExtensionError::invalid_argument(function, "a string"))?;
            match function {
                "shout" => Ok(json!(format!("{}!", text.to_uppercase()))),
                _ => Ok(json!(text.to_uppercase())),
            }
        }
    }

    struct Lower;

    impl Extension for Lower {
        fn functions(&self) -> &[&'static str] {
            &["upper", "lower"]
        }

        fn call(&self, _function: &str, args: &[Value]) -> Result<Value, ExtensionError> {
            Ok(json!(args[0].as_str().unwrap_or_default().to_lowercase()))
        }
    }

    struct Tagged(&'static str);

    impl Extension for Tagged {
        fn functions(&self) -> &[&'static str] {
            &["tag"]
        }

        fn call(&self, _function: &str, _args: &[Value]) -> Result<Value, ExtensionError> {
            Ok(json!(self.0))
        }
    }

    #[test]
    fn call_dispatches_by_name() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Upper);
        assert_eq!(registry.call("upper", &[json!("test")]).unwrap(), json!("TEST"));
        assert_eq!(registry.call("shout", &[json!("hi")]).unwrap(), json!("HI!"));
    }

    #[test]
    fn earlier_provider_wins_for_shared_name() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Upper);
        registry.register(Lower);
        assert_eq!(registry.call("upper", &[json!("MiXed")]).unwrap(), json!("MIXED"));
        assert_eq!(registry.call("lower", &[json!("MiXed")]).unwrap(), json!("mixed"));
    }

    #[test]
    fn same_type_replaces_in_place() {
        let mut registry = ExtensionRegistry::new();
        assert!(!registry.register(Tagged("first")));
        assert!(registry.register(Tagged("second")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.call("tag", &[]).unwrap(), json!("second"));
    }

    #[test]
    fn undefined_function_names_the_function() {
        let registry = ExtensionRegistry::new();
        let err = registry.call("missing", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::Undefined { ref name } if name == "missing"));
        assert!(err.to_string().contains("\"missing\""));
    }

    #[test]
    fn provider_failure_is_wrapped_with_function_name() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Upper);
        let err = registry.call("upper", &[json!(1)]).unwrap_err();
        match err {
            DispatchError::Failed { function, source } => {
                assert_eq!(function, "upper");
                assert!(matches!(source, ExtensionError::InvalidArgument { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
