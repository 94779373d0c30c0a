//! The inversion-of-control container
//!
//! Registrations map keys to one of: a type descriptor, a ready instance, a
//! factory, or an alias. Every registration adds its dependency edges to a
//! graph that is checked for cycles before anything is committed, so a
//! container never holds a cyclic set of registrations.
//!
//! Resolution is available synchronously and asynchronously. Both paths share
//! the same lookup, lifetime and injection rules; the async path awaits each
//! dependency in turn and is the only one that can drive async factories.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use rivet_graph::Graph;
use tracing::{debug, info, warn};

use crate::builder::{ObjectBuilder, Resolver};
use crate::config::ContainerConfig;
use crate::context::ResolveContext;
use crate::error::{DIError, DIResult};
use crate::events::{ContainerEvent, EventBus, EventListener, RegistrationKind, SubscriptionId};
use crate::instance::Instance;
use crate::intercept::{AsyncHandler, Interceptor, InterceptorConfig, Matcher, SyncHandler};
use crate::lifetime::{Lifetime, LifetimeKind, TransientLifetime};
use crate::registration::{Factory, Registration, RegistrationOptions, Target};
use crate::type_info::{arg_key, Component, TypeInfo};

/// Key under which every container registers itself
pub const CONTAINER_KEY: &str = "container";

struct Inner {
    config: ContainerConfig,
    registrations: RwLock<HashMap<String, Arc<Registration>>>,
    graph: RwLock<Graph>,
    interceptors: Arc<RwLock<Vec<InterceptorConfig>>>,
    events: EventBus,
    builder: ObjectBuilder,
    parent: Option<Weak<Inner>>,
}

enum Lookup {
    Cached(Instance),
    Fresh(Arc<Registration>),
}

/// Shared handle to a container; clones refer to the same registrations
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        let events = EventBus::new(config.trace_events);
        Self::from_parts(config, events, None, HashMap::new(), Graph::new(), Vec::new())
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_parts(
        config: ContainerConfig,
        events: EventBus,
        parent: Option<Weak<Inner>>,
        registrations: HashMap<String, Arc<Registration>>,
        graph: Graph,
        interceptors: Vec<InterceptorConfig>,
    ) -> Self {
        let interceptors = Arc::new(RwLock::new(interceptors));
        let builder = ObjectBuilder::new(events.clone(), interceptors.clone());
        let container = Self {
            inner: Arc::new(Inner {
                config,
                registrations: RwLock::new(registrations),
                graph: RwLock::new(graph),
                interceptors,
                events,
                builder,
                parent,
            }),
        };
        container.register_self();
        container
    }

    /// Registers the resolving container under [`CONTAINER_KEY`]
    fn register_self(&self) {
        self.announce(CONTAINER_KEY, RegistrationKind::Instance);
        let mut graph = self.inner.graph.write();
        // clearing successors cannot introduce a cycle
        graph.add(CONTAINER_KEY, std::iter::empty::<&str>());
        self.inner.registrations.write().insert(
            CONTAINER_KEY.to_string(),
            Arc::new(Registration {
                key: CONTAINER_KEY.to_string(),
                target: Target::Container,
                lifetime: Arc::new(TransientLifetime),
                injections: Vec::new(),
            }),
        );
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// The container this one was created from, while it is still alive
    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self, listener: impl EventListener + 'static) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    fn announce(&self, key: &str, kind: RegistrationKind) {
        self.inner.events.emit_with(|| ContainerEvent::Registering {
            key: key.to_string(),
            kind,
        });
    }

    fn lifetime_or_default(&self, lifetime: Option<Arc<dyn Lifetime>>) -> Arc<dyn Lifetime> {
        lifetime.unwrap_or_else(|| self.inner.config.default_lifetime.create())
    }

    /// Verify edges on a copy of the graph, then commit graph and
    /// registrations together. Nothing changes on error.
    fn commit(
        &self,
        registration: Registration,
        dependencies: &[String],
        arg_alias: Option<&str>,
    ) -> DIResult<()> {
        let key = registration.key.clone();
        let alias = arg_alias.map(|alias| {
            self.announce(&arg_key(alias), RegistrationKind::Alias);
            Registration {
                key: arg_key(alias),
                target: Target::Alias(key.clone()),
                lifetime: Arc::new(TransientLifetime),
                injections: Vec::new(),
            }
        });

        let mut graph = self.inner.graph.write();
        let mut candidate = graph.clone();
        let verified = candidate
            .add_and_verify(&key, dependencies)
            .map(|_| ())
            .map_err(|source| DIError::CyclicDependency {
                key: key.clone(),
                source,
            })
            .and_then(|()| match &alias {
                Some(alias) => candidate
                    .add_and_verify(&alias.key, [&key])
                    .map(|_| ())
                    .map_err(|source| DIError::CyclicDependency {
                        key: alias.key.clone(),
                        source,
                    }),
                None => Ok(()),
            });
        if let Err(err) = verified {
            warn!(container = %self.inner.config.name, key = %key, error = %err, "registration rejected");
            return Err(err);
        }

        let mut registrations = self.inner.registrations.write();
        *graph = candidate;
        registrations.insert(key.clone(), Arc::new(registration));
        if let Some(alias) = alias {
            registrations.insert(alias.key.clone(), Arc::new(alias));
        }

        debug!(container = %self.inner.config.name, key = %key, "registered");
        Ok(())
    }

    /// Register a constructable component under its declared key
    pub fn register_type<T: Component>(&self) -> DIResult<&Self> {
        self.register_type_with::<T>(RegistrationOptions::default())
    }

    pub fn register_type_with<T: Component>(
        &self,
        options: impl Into<RegistrationOptions>,
    ) -> DIResult<&Self> {
        self.register_type_info(TypeInfo::of::<T>()?, options)
    }

    /// Register a type descriptor; an explicit key in `options` renames it
    pub fn register_type_info(
        &self,
        info: TypeInfo,
        options: impl Into<RegistrationOptions>,
    ) -> DIResult<&Self> {
        self.register_type_inner(info, options.into(), None)
    }

    fn register_type_inner(
        &self,
        info: TypeInfo,
        options: RegistrationOptions,
        arg_alias: Option<&str>,
    ) -> DIResult<&Self> {
        let RegistrationOptions {
            key,
            lifetime,
            injections,
        } = options;
        let info = match key {
            Some(key) => info.renamed(&key),
            None => info,
        };
        let key = info.name().to_string();
        self.announce(&key, RegistrationKind::Type);

        let dependencies = info.dependency_keys();
        let registration = Registration {
            key,
            target: Target::Type(info),
            lifetime: self.lifetime_or_default(lifetime),
            injections,
        };
        self.commit(registration, &dependencies, arg_alias)?;
        Ok(self)
    }

    /// Register a ready-made instance.
    ///
    /// Without an explicit key the unqualified type name is used.
    pub fn register_instance(
        &self,
        instance: Instance,
        options: impl Into<RegistrationOptions>,
    ) -> DIResult<&Self> {
        self.register_instance_inner(instance, options.into(), None)
    }

    fn register_instance_inner(
        &self,
        instance: Instance,
        options: RegistrationOptions,
        arg_alias: Option<&str>,
    ) -> DIResult<&Self> {
        let RegistrationOptions {
            key,
            lifetime,
            injections,
        } = options;
        let key = match key {
            Some(key) => key,
            None => derived_key(&instance)?,
        };
        self.announce(&key, RegistrationKind::Instance);

        let registration = Registration {
            key,
            target: Target::Instance(instance),
            lifetime: self.lifetime_or_default(lifetime),
            injections,
        };
        self.commit(registration, &[], arg_alias)?;
        Ok(self)
    }

    /// Register a synchronous factory; `options` must carry a key
    pub fn register_factory<F>(&self, factory: F, options: impl Into<RegistrationOptions>) -> DIResult<&Self>
    where
        F: Fn(&Container) -> DIResult<Instance> + Send + Sync + 'static,
    {
        self.register_factory_inner(Factory::Sync(Arc::new(factory)), options.into(), None)
    }

    /// Register a factory returning a future; only `resolve` can drive it
    pub fn register_async_factory<F, Fut>(
        &self,
        factory: F,
        options: impl Into<RegistrationOptions>,
    ) -> DIResult<&Self>
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DIResult<Instance>> + Send + 'static,
    {
        let factory = Factory::Async(Arc::new(move |container: Container| -> BoxFuture<'static, DIResult<Instance>> {
            Box::pin(factory(container))
        }));
        self.register_factory_inner(factory, options.into(), None)
    }

    fn register_factory_inner(
        &self,
        factory: Factory,
        options: RegistrationOptions,
        arg_alias: Option<&str>,
    ) -> DIResult<&Self> {
        let RegistrationOptions {
            key,
            lifetime,
            injections,
        } = options;
        let key = key.ok_or(DIError::MissingFactoryKey)?;
        self.announce(&key, RegistrationKind::Factory);

        let registration = Registration {
            key,
            target: Target::Factory(factory),
            lifetime: self.lifetime_or_default(lifetime),
            injections,
        };
        self.commit(registration, &[], arg_alias)?;
        Ok(self)
    }

    /// Make `alias` resolve to whatever `key` resolves to
    pub fn register_alias(&self, key: &str, alias: &str) -> DIResult<&Self> {
        self.announce(alias, RegistrationKind::Alias);
        let registration = Registration {
            key: alias.to_string(),
            target: Target::Alias(key.to_string()),
            lifetime: Arc::new(TransientLifetime),
            injections: Vec::new(),
        };
        self.commit(registration, &[key.to_string()], None)?;
        Ok(self)
    }

    /// Satisfy named parameters called `alias` with `key`
    pub fn register_arg_alias(&self, key: &str, alias: &str) -> DIResult<&Self> {
        self.register_alias(key, &arg_key(alias))
    }

    pub fn register_type_and_arg_alias<T: Component>(&self, alias: &str) -> DIResult<&Self> {
        self.register_type_inner(TypeInfo::of::<T>()?, RegistrationOptions::default(), Some(alias))
    }

    pub fn register_instance_and_arg_alias(
        &self,
        instance: Instance,
        options: impl Into<RegistrationOptions>,
        alias: &str,
    ) -> DIResult<&Self> {
        self.register_instance_inner(instance, options.into(), Some(alias))
    }

    pub fn register_factory_and_arg_alias<F>(
        &self,
        factory: F,
        options: impl Into<RegistrationOptions>,
        alias: &str,
    ) -> DIResult<&Self>
    where
        F: Fn(&Container) -> DIResult<Instance> + Send + Sync + 'static,
    {
        self.register_factory_inner(Factory::Sync(Arc::new(factory)), options.into(), Some(alias))
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.inner.registrations.read().contains_key(key)
    }

    pub fn is_type_registered<T: Component>(&self) -> bool {
        self.is_registered(T::component_name())
    }

    pub fn registration(&self, key: &str) -> Option<Arc<Registration>> {
        self.inner.registrations.read().get(key).cloned()
    }

    pub fn registration_count(&self) -> usize {
        self.inner.registrations.read().len()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.registrations.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Declared dependencies of `key`
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        self.inner.graph.read().successors(key)
    }

    /// Graphviz rendering of the dependency graph
    pub fn graph_dot(&self) -> String {
        self.inner.graph.read().to_dot()
    }

    fn lookup(&self, key: &str, ctx: &ResolveContext) -> DIResult<Lookup> {
        self.inner.events.emit_with(|| ContainerEvent::Resolving {
            key: key.to_string(),
        });

        let registration = self
            .registration(key)
            .ok_or_else(|| DIError::unregistered(key, ctx.history()))?;

        if let Some(instance) = registration.lifetime.fetch() {
            self.announce_resolved(key, &instance);
            return Ok(Lookup::Cached(instance));
        }
        Ok(Lookup::Fresh(registration))
    }

    fn announce_resolved(&self, key: &str, instance: &Instance) {
        self.inner.events.emit_with(|| ContainerEvent::Resolved {
            key: key.to_string(),
            instance: instance.clone(),
        });
    }

    /// Hand a fully injected instance to the lifetime.
    ///
    /// When a concurrent resolution stored first, its instance wins.
    fn complete(&self, key: &str, registration: &Registration, instance: Instance) -> Instance {
        registration.lifetime.store(&instance);
        let instance = registration.lifetime.fetch().unwrap_or(instance);
        self.announce_resolved(key, &instance);
        instance
    }

    pub fn resolve_sync(&self, key: &str) -> DIResult<Instance> {
        self.resolve_sync_with(key, &mut ResolveContext::new())
    }

    /// Resolve within an existing resolution chain
    pub fn resolve_sync_with(&self, key: &str, ctx: &mut ResolveContext) -> DIResult<Instance> {
        let registration = match self.lookup(key, ctx)? {
            Lookup::Cached(instance) => return Ok(instance),
            Lookup::Fresh(registration) => registration,
        };

        ctx.push(key);
        let instance = match &registration.target {
            Target::Type(info) => self.inner.builder.new_instance_sync(info, ctx, self)?,
            Target::Instance(instance) => instance.clone(),
            Target::Container => Instance::new(self.clone()),
            Target::Factory(Factory::Sync(factory)) => factory(self)?,
            Target::Factory(Factory::Async(_)) => {
                return Err(DIError::AsyncFactory {
                    key: key.to_string(),
                })
            }
            Target::Alias(target) => self.resolve_sync_with(target, ctx)?,
        };
        ctx.pop();

        for injection in &registration.injections {
            injection.inject_sync(&instance, self)?;
        }
        Ok(self.complete(key, &registration, instance))
    }

    pub async fn resolve(&self, key: &str) -> DIResult<Instance> {
        let mut ctx = ResolveContext::new();
        self.resolve_with(key, &mut ctx).await
    }

    /// Async resolution within an existing resolution chain
    pub fn resolve_with<'a>(
        &'a self,
        key: &'a str,
        ctx: &'a mut ResolveContext,
    ) -> BoxFuture<'a, DIResult<Instance>> {
        Box::pin(async move {
            let registration = match self.lookup(key, ctx)? {
                Lookup::Cached(instance) => return Ok(instance),
                Lookup::Fresh(registration) => registration,
            };

            ctx.push(key);
            let instance = match &registration.target {
                Target::Type(info) => self.inner.builder.new_instance(info, ctx, self).await?,
                Target::Instance(instance) => instance.clone(),
                Target::Container => Instance::new(self.clone()),
                Target::Factory(Factory::Sync(factory)) => factory(self)?,
                Target::Factory(Factory::Async(factory)) => factory(self.clone()).await?,
                Target::Alias(target) => self.resolve_with(target, ctx).await?,
            };
            ctx.pop();

            for injection in &registration.injections {
                injection.inject(&instance, self).await?;
            }
            Ok(self.complete(key, &registration, instance))
        })
    }

    /// Like [`resolve_sync`](Self::resolve_sync) but any failure yields `None`
    pub fn try_resolve_sync(&self, key: &str) -> Option<Instance> {
        self.resolve_sync(key)
            .map_err(|err| debug!(key, error = %err, "try_resolve_sync failed"))
            .ok()
    }

    pub async fn try_resolve(&self, key: &str) -> Option<Instance> {
        self.resolve(key)
            .await
            .map_err(|err| debug!(key, error = %err, "try_resolve failed"))
            .ok()
    }

    /// Resolve `key` and downcast the result
    pub fn resolve_sync_as<T: Any + Send + Sync>(&self, key: &str) -> DIResult<Arc<T>> {
        downcast(key, self.resolve_sync(key)?)
    }

    pub async fn resolve_as<T: Any + Send + Sync>(&self, key: &str) -> DIResult<Arc<T>> {
        downcast(key, self.resolve(key).await?)
    }

    /// Resolve a component by its declared key
    pub fn resolve_type_sync<T: Component>(&self) -> DIResult<Arc<T>> {
        self.resolve_sync_as::<T>(T::component_name())
    }

    pub async fn resolve_type<T: Component>(&self) -> DIResult<Arc<T>> {
        self.resolve_as::<T>(T::component_name()).await
    }

    /// Run the injections registered under `key` (or the instance's type
    /// name) against an instance built elsewhere
    pub fn inject_sync(&self, instance: &Instance, key: Option<&str>) -> DIResult<()> {
        let registration = self.injection_source(instance, key)?;
        for injection in &registration.injections {
            injection.inject_sync(instance, self)?;
        }
        Ok(())
    }

    pub async fn inject(&self, instance: &Instance, key: Option<&str>) -> DIResult<()> {
        let registration = self.injection_source(instance, key)?;
        for injection in &registration.injections {
            injection.inject(instance, self).await?;
        }
        Ok(())
    }

    fn injection_source(&self, instance: &Instance, key: Option<&str>) -> DIResult<Arc<Registration>> {
        let key = key.unwrap_or_else(|| instance.short_type_name());
        self.registration(key)
            .ok_or_else(|| DIError::unregistered(key, &[]))
    }

    /// Start an interception rule for methods selected by `matcher`
    pub fn intercept(&self, matcher: impl Into<Matcher>) -> InterceptBuilder<'_> {
        InterceptBuilder {
            container: self,
            matcher: matcher.into(),
        }
    }

    fn add_interceptor(&self, config: InterceptorConfig) {
        debug!(container = %self.inner.config.name, matcher = ?config.matcher, "interceptor added");
        self.inner.interceptors.write().push(config);
    }

    pub fn interceptor_count(&self) -> usize {
        self.inner.interceptors.read().len()
    }

    /// Child with a copy of this container's registrations, graph and
    /// interceptors. Later changes on either side are not shared, but
    /// registrations copied into the child keep their lifetime caches.
    pub fn create_child_container(&self, inherit_events: bool) -> Container {
        let events = if inherit_events {
            self.inner.events.fork()
        } else {
            EventBus::new(self.inner.config.trace_events)
        };

        let registrations = self.inner.registrations.read().clone();
        let graph = self.inner.graph.read().clone();
        let interceptors = self.inner.interceptors.read().clone();

        let child = Self::from_parts(
            self.inner.config.for_child(inherit_events),
            events,
            Some(Arc::downgrade(&self.inner)),
            registrations,
            graph,
            interceptors,
        );
        info!(
            parent = %self.inner.config.name,
            registrations = child.registration_count(),
            inherit_events,
            "created child container"
        );
        child
    }

    /// Child container following the configured `inherit_events` default
    pub fn create_child(&self) -> Container {
        self.create_child_container(self.inner.config.inherit_events)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.config.name)
            .field("registrations", &self.registration_count())
            .field("interceptors", &self.interceptor_count())
            .finish()
    }
}

#[async_trait]
impl Resolver for Container {
    fn resolve_sync_in(&self, key: &str, ctx: &mut ResolveContext) -> DIResult<Instance> {
        self.resolve_sync_with(key, ctx)
    }

    async fn resolve_in(&self, key: &str, ctx: &mut ResolveContext) -> DIResult<Instance> {
        self.resolve_with(key, ctx).await
    }
}

fn derived_key(instance: &Instance) -> DIResult<String> {
    let key = instance.short_type_name();
    if key.is_empty() || key.starts_with('{') {
        return Err(DIError::MissingInstanceKey);
    }
    Ok(key.to_string())
}

fn downcast<T: Any + Send + Sync>(key: &str, instance: Instance) -> DIResult<Arc<T>> {
    instance
        .downcast::<T>()
        .ok_or_else(|| DIError::type_mismatch::<T>(key, instance.type_name()))
}

/// Completes a [`Container::intercept`] call
pub struct InterceptBuilder<'c> {
    container: &'c Container,
    matcher: Matcher,
}

impl<'c> InterceptBuilder<'c> {
    /// Intercept matching methods with synchronous handlers
    pub fn sync<I>(self, handlers: I) -> &'c Container
    where
        I: IntoIterator<Item = SyncHandler>,
    {
        self.container.add_interceptor(InterceptorConfig {
            matcher: self.matcher,
            interceptor: Interceptor::Sync(handlers.into_iter().collect()),
        });
        self.container
    }

    /// Intercept matching methods with asynchronous handlers
    pub fn asynchronous<I>(self, handlers: I) -> &'c Container
    where
        I: IntoIterator<Item = AsyncHandler>,
    {
        self.container.add_interceptor(InterceptorConfig {
            matcher: self.matcher,
            interceptor: Interceptor::Async(handlers.into_iter().collect()),
        });
        self.container
    }
}

/// Builder for a configured container
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    listeners: Vec<Arc<dyn EventListener>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_lifetime(mut self, kind: LifetimeKind) -> Self {
        self.config.default_lifetime = kind;
        self
    }

    pub fn trace_events(mut self, enabled: bool) -> Self {
        self.config.trace_events = enabled;
        self
    }

    /// Listener subscribed before the container registers itself
    pub fn listener(mut self, listener: impl EventListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> DIResult<Container> {
        self.config.validate()?;
        let events = EventBus::new(self.config.trace_events);
        for listener in self.listeners {
            events.subscribe_arc(listener);
        }
        Ok(Container::from_parts(
            self.config,
            events,
            None,
            HashMap::new(),
            Graph::new(),
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifetime::MemoryLifetime;
    use crate::type_info::TypeInfoBuilder;

    #[derive(Debug)]
    struct Database {
        url: String,
    }

    struct Repository {
        db: Arc<Database>,
    }

    impl Component for Repository {
        fn describe(info: TypeInfoBuilder) -> TypeInfoBuilder {
            info.param("db", "Database").construct(|args| {
                Ok(Instance::new(Repository {
                    db: args.get::<Database>(0)?,
                }))
            })
        }
    }

    fn database() -> Instance {
        Instance::new(Database {
            url: "memory://".to_string(),
        })
    }

    #[test]
    fn test_container_registers_itself() {
        let container = Container::new();
        let resolved = container.resolve_sync_as::<Container>(CONTAINER_KEY).unwrap();
        assert!(Arc::ptr_eq(&resolved.inner, &container.inner));
        assert_eq!(container.registration_count(), 1);
    }

    #[test]
    fn test_resolve_type_with_dependency() {
        let container = Container::new();
        container
            .register_instance(database(), RegistrationOptions::default())
            .unwrap()
            .register_type::<Repository>()
            .unwrap();

        let repo = container.resolve_type_sync::<Repository>().unwrap();
        assert_eq!(repo.db.url, "memory://");
        assert_eq!(container.dependencies_of("Repository"), vec!["Database"]);
    }

    #[test]
    fn test_async_resolve_matches_sync() {
        let container = Container::new();
        container
            .register_instance(database(), RegistrationOptions::default())
            .unwrap()
            .register_type::<Repository>()
            .unwrap();

        let repo = tokio_test::block_on(container.resolve_type::<Repository>()).unwrap();
        assert_eq!(repo.db.url, "memory://");
    }

    #[test]
    fn test_missing_dependency_reports_chain() {
        let container = Container::new();
        container.register_type::<Repository>().unwrap();

        let err = container.resolve_sync("Repository").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Nothing with key \"Database\" is registered in the container; \
             error occurred while resolving \"Repository\" -> \"Database\""
        );
    }

    #[test]
    fn test_default_lifetime_from_config() {
        let container = Container::builder()
            .default_lifetime(LifetimeKind::Memory)
            .build()
            .unwrap();
        container
            .register_instance(database(), RegistrationOptions::default())
            .unwrap()
            .register_type::<Repository>()
            .unwrap();

        let a = container.resolve_sync("Repository").unwrap();
        let b = container.resolve_sync("Repository").unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_memory_lifetime_not_populated_on_failure() {
        let container = Container::new();
        container
            .register_type_with::<Repository>(RegistrationOptions::new().lifetime(MemoryLifetime::new()))
            .unwrap();

        assert!(container.resolve_sync("Repository").is_err());
        container
            .register_instance(database(), RegistrationOptions::default())
            .unwrap();
        assert!(container.resolve_sync("Repository").is_ok());
    }

    #[test]
    fn test_failed_registration_leaves_state_untouched() {
        let container = Container::new();
        container.register_alias("b", "a").unwrap();
        let before = container.keys();

        let err = container.register_alias("a", "b").unwrap_err();
        assert!(matches!(err, DIError::CyclicDependency { .. }));
        assert_eq!(container.keys(), before);
        assert!(container.dependencies_of("b").is_empty());
    }

    #[test]
    fn test_factory_requires_key() {
        let container = Container::new();
        let err = container
            .register_factory(|_| Ok(database()), RegistrationOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "\"key\" must be passed to register_factory()");
    }

    #[test]
    fn test_async_factory_rejected_by_sync_resolve() {
        let container = Container::new();
        container
            .register_async_factory(|_| async { Ok(database()) }, "db")
            .unwrap();
        assert!(matches!(
            container.resolve_sync("db"),
            Err(DIError::AsyncFactory { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_on_downcast() {
        let container = Container::new();
        container.register_instance(database(), "db").unwrap();
        assert!(matches!(
            container.resolve_sync_as::<String>("db"),
            Err(DIError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_child_resolves_itself() {
        let parent = Container::new();
        let child = parent.create_child_container(false);

        let resolved = child.resolve_sync_as::<Container>(CONTAINER_KEY).unwrap();
        assert!(Arc::ptr_eq(&resolved.inner, &child.inner));
        assert!(Arc::ptr_eq(&child.parent().unwrap().inner, &parent.inner));
        assert_eq!(child.name(), "root/child");
    }

    #[test]
    fn test_builder_listener_sees_self_registration() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        Container::builder()
            .listener(move |event: &ContainerEvent| {
                if let ContainerEvent::Registering { key, .. } = event {
                    sink.lock().push(key.clone());
                }
            })
            .build()
            .unwrap();

        assert_eq!(*seen.lock(), vec![CONTAINER_KEY.to_string()]);
    }
}
