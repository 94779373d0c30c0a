//! Method call interception
//!
//! Interceptors wrap the [`Invocable`] facet of instances built from type
//! registrations. Handlers form an onion: each receives the mutable
//! [`CallContext`] and a `next` continuation; work done after `next` returns
//! runs in reverse registration order. The innermost step calls the real
//! method unless a handler has already recorded an error.
//!
//! A method is intercepted in exactly one mode. The first matching
//! configuration decides whether it is sync or async, and only handlers of
//! configurations with the same mode are chained.

mod chain;
mod context;
mod matcher;
mod proxy;

pub use chain::{
    async_handler, sync_handler, AsyncCallHandler, AsyncHandler, AsyncNext, Interceptor,
    SyncHandler, SyncNext,
};
pub use context::CallContext;
pub use matcher::Matcher;
pub use proxy::{apply_interceptors, InterceptedMethods, InterceptorConfig};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Describes a method exposed through [`Invocable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    /// Accessor-like members opt out of interception
    pub interceptable: bool,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interceptable: true,
        }
    }

    /// Method that is never wrapped by interceptors
    pub fn sealed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interceptable: false,
        }
    }
}

/// Dynamically dispatched methods of a component
#[async_trait]
pub trait Invocable: Send + Sync {
    /// Every method that can be called by name
    fn methods(&self) -> Vec<MethodInfo>;

    fn call_sync(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value>;

    /// Asynchronous dispatch; defaults to the synchronous path
    async fn call(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        self.call_sync(method, args)
    }
}

/// Errors raised by the interception layer itself
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("Method \"{method}\" is intercepted asynchronously and must be called with call()")]
    AsyncMethod { method: String },

    #[error("{type_name} does not expose invocable methods")]
    NotInvocable { type_name: &'static str },

    #[error("{type_name} has no method \"{method}\"")]
    UnknownMethod {
        type_name: &'static str,
        method: String,
    },
}

impl InterceptError {
    /// Convenience for [`Invocable`] implementations rejecting an unknown name
    pub fn unknown_method<T>(method: &str) -> anyhow::Error {
        InterceptError::UnknownMethod {
            type_name: crate::type_info::short_type_name(std::any::type_name::<T>()),
            method: method.to_string(),
        }
        .into()
    }
}
