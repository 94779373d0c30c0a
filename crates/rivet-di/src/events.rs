//! Container lifecycle events
//!
//! Listeners run synchronously, in subscription order, on the thread that
//! triggered the event. A listener may subscribe or unsubscribe other
//! listeners from inside a callback; the change applies from the next event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::instance::Instance;
use crate::type_info::TypeInfo;

/// Registration flavor reported by [`ContainerEvent::Registering`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationKind {
    Type,
    Instance,
    Factory,
    Alias,
}

#[derive(Debug, Clone)]
pub enum ContainerEvent {
    Registering { key: String, kind: RegistrationKind },
    Resolving { key: String },
    Resolved { key: String, instance: Instance },
    Building { type_info: TypeInfo },
    Built { type_info: TypeInfo, instance: Instance },
    Intercepting { instance: Instance, method: String },
}

impl ContainerEvent {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            ContainerEvent::Registering { .. } => "registering",
            ContainerEvent::Resolving { .. } => "resolving",
            ContainerEvent::Resolved { .. } => "resolved",
            ContainerEvent::Building { .. } => "building",
            ContainerEvent::Built { .. } => "built",
            ContainerEvent::Intercepting { .. } => "intercepting",
        }
    }
}

pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ContainerEvent);
}

impl<F> EventListener for F
where
    F: Fn(&ContainerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ContainerEvent) {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listeners = Vec<(SubscriptionId, Arc<dyn EventListener>)>;

/// Fan-out of container events to listeners.
///
/// Clones share the same listener list.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Listeners>>,
    next_id: Arc<AtomicU64>,
    trace: bool,
}

impl EventBus {
    /// Bus that also logs every event at debug level when `trace` is set
    pub fn new(trace: bool) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    pub fn subscribe(&self, listener: impl EventListener + 'static) -> SubscriptionId {
        self.subscribe_arc(Arc::new(listener))
    }

    pub fn subscribe_arc(&self, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Independent bus starting with a copy of the current listeners
    pub fn fork(&self) -> Self {
        let listeners = self.listeners.read().clone();
        let next_id = self.next_id.load(Ordering::Relaxed);
        Self {
            listeners: Arc::new(RwLock::new(listeners)),
            next_id: Arc::new(AtomicU64::new(next_id)),
            trace: self.trace,
        }
    }

    pub fn emit(&self, event: &ContainerEvent) {
        if self.trace {
            debug!(target: "rivet_di::events", kind = event.name(), ?event);
        }

        let listeners: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.on_event(event);
        }
    }

    /// Build and emit the event only if someone will observe it
    pub fn emit_with(&self, event: impl FnOnce() -> ContainerEvent) {
        if self.trace || self.listener_count() > 0 {
            self.emit(&event());
        }
    }
}
