//! Instance construction for type registrations

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::context::ResolveContext;
use crate::error::{DIError, DIResult};
use crate::events::{ContainerEvent, EventBus};
use crate::instance::Instance;
use crate::intercept::{apply_interceptors, InterceptorConfig};
use crate::type_info::TypeInfo;

/// Resolves constructor parameters on behalf of the builder
#[async_trait]
pub trait Resolver: Send + Sync {
    fn resolve_sync_in(&self, key: &str, ctx: &mut ResolveContext) -> DIResult<Instance>;

    async fn resolve_in(&self, key: &str, ctx: &mut ResolveContext) -> DIResult<Instance>;
}

/// Resolves constructor parameters, invokes the constructor and installs
/// interceptors on the result
#[derive(Clone)]
pub struct ObjectBuilder {
    events: EventBus,
    interceptors: Arc<RwLock<Vec<InterceptorConfig>>>,
}

impl ObjectBuilder {
    pub fn new(events: EventBus, interceptors: Arc<RwLock<Vec<InterceptorConfig>>>) -> Self {
        Self {
            events,
            interceptors,
        }
    }

    fn begin(&self, info: &TypeInfo) -> DIResult<()> {
        // fail before resolving any parameter
        if !info.is_constructable() {
            return Err(DIError::NotConstructable {
                name: info.name().to_string(),
            });
        }
        trace!(type_name = info.name(), args = info.args().len(), "building");
        self.events.emit_with(|| ContainerEvent::Building {
            type_info: info.clone(),
        });
        Ok(())
    }

    /// Build an instance, resolving parameters left to right by position
    pub fn new_instance_sync(
        &self,
        info: &TypeInfo,
        ctx: &mut ResolveContext,
        resolver: &dyn Resolver,
    ) -> DIResult<Instance> {
        self.begin(info)?;
        let args = info
            .sorted_args()
            .iter()
            .map(|param| resolver.resolve_sync_in(&param.key, ctx))
            .collect::<DIResult<Vec<_>>>()?;
        self.finish(info, args)
    }

    /// Async counterpart; each parameter is awaited before the next starts
    pub async fn new_instance(
        &self,
        info: &TypeInfo,
        ctx: &mut ResolveContext,
        resolver: &dyn Resolver,
    ) -> DIResult<Instance> {
        self.begin(info)?;
        let params = info.sorted_args();
        let mut args = Vec::with_capacity(params.len());
        for param in &params {
            args.push(resolver.resolve_in(&param.key, ctx).await?);
        }
        self.finish(info, args)
    }

    fn finish(&self, info: &TypeInfo, args: Vec<Instance>) -> DIResult<Instance> {
        let instance = info.construct(args)?;
        let configs = self.interceptors.read().clone();
        let instance = apply_interceptors(instance, &configs, &self.events);

        self.events.emit_with(|| ContainerEvent::Built {
            type_info: info.clone(),
            instance: instance.clone(),
        });
        Ok(instance)
    }
}
