//! Error types for the container
//!
//! Registration-time errors (cycles, missing keys) are returned before anything
//! is committed, so a failed registration leaves the container untouched.
//! Resolution-time errors are returned from `resolve_sync` directly and from
//! `resolve` through the returned future; only the `try_resolve*` variants
//! swallow them.

use rivet_graph::GraphError;
use thiserror::Error;

use crate::type_info::ARG_PREFIX;

/// Errors that can occur during registration, resolution or injection
#[derive(Debug, Error)]
pub enum DIError {
    /// Nothing is registered under the requested key.
    ///
    /// `history` holds the resolution chain that led to the lookup.
    #[error("{}", unregistered_message(.key, .history))]
    UnregisteredKey { key: String, history: Vec<String> },

    /// The registration would introduce a dependency cycle
    #[error("{key}'s dependencies create a cycle: {source}")]
    CyclicDependency {
        key: String,
        #[source]
        source: GraphError,
    },

    #[error("\"key\" must be passed to register_factory()")]
    MissingFactoryKey,

    #[error("Key not provided while registering instance")]
    MissingInstanceKey,

    #[error("Cannot perform method injection because the object does not have a method \"{method}\"")]
    MethodInjectionTargetMissing { method: String },

    #[error("Cannot perform property injection because the object does not have a property \"{property}\"")]
    PropertyInjectionTargetMissing { property: String },

    /// The type descriptor could not be derived
    #[error("Unable to describe {name}: {reason}")]
    ConstructorParseFailure { name: String, reason: String },

    #[error("Unable to construct class from type {name}")]
    NotConstructable { name: String },

    #[error("{type_name} has no constructor argument at position {position}")]
    MissingArgument { type_name: String, position: usize },

    /// A synchronous resolution reached a factory that returns a future
    #[error("Factory for \"{key}\" is asynchronous and cannot be resolved synchronously")]
    AsyncFactory { key: String },

    #[error("\"{key}\" resolved to {actual}, not {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised by user constructors, factories or injection targets
    #[error(transparent)]
    Component(#[from] anyhow::Error),
}

impl DIError {
    pub(crate) fn unregistered(key: &str, history: &[String]) -> Self {
        DIError::UnregisteredKey {
            key: key.to_string(),
            history: history.to_vec(),
        }
    }

    pub(crate) fn type_mismatch<T>(key: &str, actual: &'static str) -> Self {
        DIError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            actual,
        }
    }
}

/// Result type for container operations
pub type DIResult<T> = Result<T, DIError>;

fn unregistered_message(key: &str, history: &[String]) -> String {
    let mut message = format!("Nothing with key \"{}\" is registered in the container", key);

    if !history.is_empty() {
        let chain = history
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(key))
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(" -> ");
        message.push_str("; error occurred while resolving ");
        message.push_str(&chain);
    }

    if key.starts_with(ARG_PREFIX) {
        message.push_str("; you may be missing a parameter type or a call to register_arg_alias");
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_without_history() {
        let err = DIError::unregistered("Foo", &[]);
        assert_eq!(
            err.to_string(),
            "Nothing with key \"Foo\" is registered in the container"
        );
    }

    #[test]
    fn test_unregistered_with_history() {
        let err = DIError::unregistered("Baz", &["Foo".to_string(), "Bar".to_string()]);
        assert_eq!(
            err.to_string(),
            "Nothing with key \"Baz\" is registered in the container; \
             error occurred while resolving \"Foo\" -> \"Bar\" -> \"Baz\""
        );
    }

    #[test]
    fn test_unregistered_named_argument_hint() {
        let err = DIError::unregistered("$arg:logger", &[]);
        assert!(err
            .to_string()
            .ends_with("; you may be missing a parameter type or a call to register_arg_alias"));
    }

    #[test]
    fn test_cycle_message() {
        let err = DIError::CyclicDependency {
            key: "Baz".to_string(),
            source: GraphError::Cycles(vec![vec!["Foo".into(), "Bar".into()]]),
        };
        assert_eq!(
            err.to_string(),
            "Baz's dependencies create a cycle: Detected 1 cycle:\n  Foo -> Bar -> Foo"
        );
    }

    #[test]
    fn test_method_injection_message() {
        let err = DIError::MethodInjectionTargetMissing {
            method: "setFoo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot perform method injection because the object does not have a method \"setFoo\""
        );
    }
}
