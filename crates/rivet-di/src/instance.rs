//! Type-erased component values
//!
//! An [`Instance`] is what the container stores and hands out. Besides the
//! value itself it may carry two optional facets: [`Injectable`] for
//! post-construction property and method injection, and
//! [`Invocable`](crate::intercept::Invocable) for dynamically dispatched
//! method calls, which is the surface call interception wraps.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{DIError, DIResult};
use crate::intercept::{InterceptError, Invocable};
use crate::type_info::{short_type_name, ParamInfo};

/// Post-construction injection targets of a component.
///
/// Components mutate through interior mutability, so every method takes
/// `&self`. The defaults report the target as missing.
pub trait Injectable: Send + Sync {
    /// Assign `value` to the property `name`
    fn set_property(&self, name: &str, _value: Instance) -> DIResult<()> {
        Err(DIError::PropertyInjectionTargetMissing {
            property: name.to_string(),
        })
    }

    /// Parameters of the injectable method `name`, or `None` if there is no such method
    fn method_params(&self, _name: &str) -> Option<Vec<ParamInfo>> {
        None
    }

    /// Invoke `name` with arguments ordered by position
    fn call_method(&self, name: &str, _args: Vec<Instance>) -> DIResult<()> {
        Err(DIError::MethodInjectionTargetMissing {
            method: name.to_string(),
        })
    }
}

/// A shared, type-erased component value
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    injectable: Option<Arc<dyn Injectable>>,
    invocable: Option<Arc<dyn Invocable>>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
            injectable: None,
            invocable: None,
        }
    }

    /// Value that also exposes its [`Injectable`] facet
    pub fn injectable<T: Injectable + Any>(value: T) -> Self {
        let value = Arc::new(value);
        Self::from_arc(value.clone()).with_injectable(value)
    }

    /// Value that also exposes its [`Invocable`] facet
    pub fn invocable<T: Invocable + Any>(value: T) -> Self {
        let value = Arc::new(value);
        Self::from_arc(value.clone()).with_invocable(value)
    }

    pub fn with_injectable(mut self, facet: Arc<dyn Injectable>) -> Self {
        self.injectable = Some(facet);
        self
    }

    pub fn with_invocable(mut self, facet: Arc<dyn Invocable>) -> Self {
        self.invocable = Some(facet);
        self
    }

    /// Shared handle to the concrete value.
    ///
    /// Calls made through the returned handle bypass interception.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }

    /// Fully qualified name of the concrete type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Unqualified type name, used as the default registration key
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    /// Whether both handles point at the same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.value) as *const (),
            Arc::as_ptr(&other.value) as *const (),
        )
    }

    pub fn injectable_facet(&self) -> Option<&Arc<dyn Injectable>> {
        self.injectable.as_ref()
    }

    pub fn invocable_facet(&self) -> Option<&Arc<dyn Invocable>> {
        self.invocable.as_ref()
    }

    /// Dispatch `method` synchronously through the (possibly intercepted) invocable facet
    pub fn call_sync(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        self.invocable_or_err()?.call_sync(method, args)
    }

    /// Dispatch `method` through the (possibly intercepted) invocable facet
    pub async fn call(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        self.invocable_or_err()?.call(method, args).await
    }

    fn invocable_or_err(&self) -> Result<&Arc<dyn Invocable>, InterceptError> {
        self.invocable.as_ref().ok_or(InterceptError::NotInvocable {
            type_name: self.type_name,
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("injectable", &self.injectable.is_some())
            .field("invocable", &self.invocable.is_some())
            .finish()
    }
}
