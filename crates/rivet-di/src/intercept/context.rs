//! Per-call state passed through an interceptor chain

use serde_json::Value;

use crate::instance::Instance;

/// Mutable state of one intercepted call, shared by every handler in the chain
#[derive(Debug)]
pub struct CallContext {
    /// The unwrapped instance the call targets
    pub instance: Instance,
    pub method_name: String,
    pub arguments: Vec<Value>,
    /// Once set, the real method is skipped and the error reaches the caller
    pub error: Option<anyhow::Error>,
    pub return_value: Value,
}

impl CallContext {
    pub fn new(instance: Instance, method_name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            instance,
            method_name: method_name.into(),
            arguments,
            error: None,
            return_value: Value::Null,
        }
    }

    /// Outcome delivered to the caller
    pub fn into_result(self) -> anyhow::Result<Value> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.return_value),
        }
    }
}
