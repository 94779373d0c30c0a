//! Inversion-of-control container for Rivet
//!
//! Components are registered under string keys as type descriptors, ready
//! instances, factories or aliases, and resolved with their dependencies
//! wired in. Registration rejects dependency cycles up front; resolution
//! explains missing keys with the full chain that led to them.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rivet_di::prelude::*;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Client {
//!     config: Arc<Config>,
//! }
//!
//! impl Component for Client {
//!     fn describe(info: TypeInfoBuilder) -> TypeInfoBuilder {
//!         info.param("config", "Config").construct(|args| {
//!             Ok(Instance::new(Client { config: args.get::<Config>(0)? }))
//!         })
//!     }
//! }
//!
//! # fn main() -> DIResult<()> {
//! let container = Container::new();
//! container
//!     .register_instance(Instance::new(Config { url: "memory://".into() }), "Config")?
//!     .register_type::<Client>()?;
//!
//! let client = container.resolve_type_sync::<Client>()?;
//! assert_eq!(client.config.url, "memory://");
//! # Ok(())
//! # }
//! ```
//!
//! Beyond plain resolution the container offers:
//!
//! - lifetimes ([`lifetime`]) deciding whether a resolved value is reused
//! - property and method injection after construction ([`injection`])
//! - method call interception on type registrations ([`intercept`])
//! - lifecycle events ([`events`]) and child containers

pub mod builder;
pub mod config;
pub mod container;
pub mod context;
pub mod error;
pub mod events;
pub mod injection;
pub mod instance;
pub mod intercept;
pub mod lifetime;
pub mod registration;
pub mod type_info;

pub use builder::{ObjectBuilder, Resolver};
pub use config::ContainerConfig;
pub use container::{Container, ContainerBuilder, InterceptBuilder, CONTAINER_KEY};
pub use context::ResolveContext;
pub use error::{DIError, DIResult};
pub use events::{ContainerEvent, EventBus, EventListener, RegistrationKind, SubscriptionId};
pub use injection::{Injection, MethodInjection, PropertyInjection, PropertyValueInjection};
pub use instance::{Injectable, Instance};
pub use lifetime::{
    ExternalLifetime, Lifetime, LifetimeKind, MemoryLifetime, ObjectManager, ObjectStore,
    TransientLifetime,
};
pub use registration::{Registration, RegistrationOptions};
pub use type_info::{
    arg_key, key_of, Component, ParamInfo, ParsedAs, ResolvedArgs, TypeInfo, TypeInfoBuilder,
    ARG_PREFIX,
};

/// Everything needed to declare components and wire a container
pub mod prelude {
    pub use crate::container::{Container, ContainerBuilder};
    pub use crate::error::{DIError, DIResult};
    pub use crate::injection::{MethodInjection, PropertyInjection, PropertyValueInjection};
    pub use crate::instance::{Injectable, Instance};
    pub use crate::intercept::{
        async_handler, sync_handler, CallContext, Invocable, Matcher, MethodInfo,
    };
    pub use crate::lifetime::{LifetimeKind, MemoryLifetime, TransientLifetime};
    pub use crate::registration::RegistrationOptions;
    pub use crate::type_info::{Component, ParamInfo, ResolvedArgs, TypeInfo, TypeInfoBuilder};
}
