//! Installs interceptors on built instances

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::chain::Interceptor;
use super::matcher::Matcher;
use super::{Invocable, MethodInfo};
use crate::events::{ContainerEvent, EventBus};
use crate::instance::Instance;

/// A matcher paired with the handlers it enables
#[derive(Clone, Debug)]
pub struct InterceptorConfig {
    pub matcher: Matcher,
    pub interceptor: Interceptor,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.is_async() { "Async" } else { "Sync" };
        write!(f, "{}({} handlers)", mode, self.len())
    }
}

/// Invocable facet that routes intercepted methods through their chains
pub struct InterceptedMethods {
    target: Arc<dyn Invocable>,
    instance: Instance,
    routes: HashMap<String, Interceptor>,
    events: EventBus,
}

impl InterceptedMethods {
    pub fn intercepted_methods(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    fn announce(&self, method: &str) {
        self.events.emit_with(|| ContainerEvent::Intercepting {
            instance: self.instance.clone(),
            method: method.to_string(),
        });
    }
}

#[async_trait]
impl Invocable for InterceptedMethods {
    fn methods(&self) -> Vec<MethodInfo> {
        self.target.methods()
    }

    fn call_sync(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        match self.routes.get(method) {
            Some(interceptor) => {
                self.announce(method);
                interceptor.handle_call_sync(&self.instance, method, args, self.target.as_ref())
            }
            None => self.target.call_sync(method, args),
        }
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        match self.routes.get(method) {
            Some(interceptor) => {
                self.announce(method);
                interceptor
                    .handle_call(&self.instance, method, args, self.target.as_ref())
                    .await
            }
            None => self.target.call(method, args).await,
        }
    }
}

/// Wrap the invocable facet of `instance` with every matching configuration.
///
/// Instances without an invocable facet, or with no matching method, are
/// returned unchanged.
pub fn apply_interceptors(instance: Instance, configs: &[InterceptorConfig], events: &EventBus) -> Instance {
    if configs.is_empty() {
        return instance;
    }
    let Some(target) = instance.invocable_facet().cloned() else {
        return instance;
    };

    let mut routes = HashMap::new();
    for method in target.methods() {
        if !method.interceptable {
            continue;
        }

        let mut combined: Option<Interceptor> = None;
        for config in configs {
            if !config.matcher.matches(&instance, &method.name) {
                continue;
            }
            match combined.as_mut() {
                None => combined = Some(config.interceptor.clone()),
                Some(chain) if chain.is_async() == config.interceptor.is_async() => {
                    chain.extend(&config.interceptor)
                }
                Some(_) => {}
            }
        }

        if let Some(interceptor) = combined {
            routes.insert(method.name, interceptor);
        }
    }

    if routes.is_empty() {
        return instance;
    }

    debug!(
        type_name = instance.short_type_name(),
        methods = routes.len(),
        "installing interceptors"
    );
    let proxy = InterceptedMethods {
        target,
        instance: instance.clone(),
        routes,
        events: events.clone(),
    };
    instance.with_invocable(Arc::new(proxy))
}
