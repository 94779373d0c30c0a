//! Registration records and options

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::container::Container;
use crate::error::DIResult;
use crate::events::RegistrationKind;
use crate::injection::Injection;
use crate::instance::Instance;
use crate::lifetime::Lifetime;
use crate::type_info::TypeInfo;

/// Synchronous factory; receives the container resolving it
pub type SyncFactory = Arc<dyn Fn(&Container) -> DIResult<Instance> + Send + Sync>;

/// Asynchronous factory
pub type AsyncFactory = Arc<dyn Fn(Container) -> BoxFuture<'static, DIResult<Instance>> + Send + Sync>;

#[derive(Clone)]
pub enum Factory {
    Sync(SyncFactory),
    Async(AsyncFactory),
}

/// What a registration produces
#[derive(Clone)]
pub enum Target {
    Type(TypeInfo),
    Instance(Instance),
    Factory(Factory),
    /// Forwards to another key
    Alias(String),
    /// The container that performs the resolution
    Container,
}

/// A key's entry in the container
pub struct Registration {
    pub(crate) key: String,
    pub(crate) target: Target,
    pub(crate) lifetime: Arc<dyn Lifetime>,
    pub(crate) injections: Vec<Arc<dyn Injection>>,
}

impl Registration {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn lifetime(&self) -> &Arc<dyn Lifetime> {
        &self.lifetime
    }

    pub fn injections(&self) -> &[Arc<dyn Injection>] {
        &self.injections
    }

    /// Kind reported in `registering` events
    pub fn kind(&self) -> RegistrationKind {
        match self.target {
            Target::Type(_) => RegistrationKind::Type,
            Target::Instance(_) | Target::Container => RegistrationKind::Instance,
            Target::Factory(_) => RegistrationKind::Factory,
            Target::Alias(_) => RegistrationKind::Alias,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("injections", &self.injections.len())
            .finish()
    }
}

/// Optional settings accepted by every `register_*` call.
///
/// A bare key converts into options, so `register_instance(i, "db")` works.
#[derive(Clone, Default)]
pub struct RegistrationOptions {
    pub(crate) key: Option<String>,
    pub(crate) lifetime: Option<Arc<dyn Lifetime>>,
    pub(crate) injections: Vec<Arc<dyn Injection>>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn lifetime(mut self, lifetime: impl Lifetime + 'static) -> Self {
        self.lifetime = Some(Arc::new(lifetime));
        self
    }

    /// Share a lifetime object, and therefore its cache, between registrations
    pub fn shared_lifetime(mut self, lifetime: Arc<dyn Lifetime>) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Appended after earlier injections; they run in this order
    pub fn injection(mut self, injection: impl Injection + 'static) -> Self {
        self.injections.push(Arc::new(injection));
        self
    }
}

impl From<&str> for RegistrationOptions {
    fn from(key: &str) -> Self {
        Self::new().key(key)
    }
}

impl From<String> for RegistrationOptions {
    fn from(key: String) -> Self {
        Self::new().key(key)
    }
}

impl From<Option<&str>> for RegistrationOptions {
    fn from(key: Option<&str>) -> Self {
        match key {
            Some(key) => Self::new().key(key),
            None => Self::new(),
        }
    }
}
