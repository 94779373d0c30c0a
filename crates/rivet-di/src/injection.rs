//! Post-construction injections
//!
//! Injections run after an instance is built (or fetched from a factory or an
//! instance registration) and before it is handed to the lifetime. Each
//! injection resolves with its own [`ResolveContext`] rooted at a label naming
//! the injection target, so failures read like
//! `... while resolving "Foo.bar" -> "Bar"`.

use async_trait::async_trait;

use crate::container::Container;
use crate::context::ResolveContext;
use crate::error::{DIError, DIResult};
use crate::instance::{Injectable, Instance};
use crate::type_info::ParamInfo;

#[async_trait]
pub trait Injection: Send + Sync {
    fn inject_sync(&self, instance: &Instance, container: &Container) -> DIResult<()>;

    async fn inject(&self, instance: &Instance, container: &Container) -> DIResult<()>;
}

fn property_target<'a>(instance: &'a Instance, property: &str) -> DIResult<&'a dyn Injectable> {
    instance
        .injectable_facet()
        .map(|facet| facet.as_ref())
        .ok_or_else(|| DIError::PropertyInjectionTargetMissing {
            property: property.to_string(),
        })
}

/// Assigns a fixed value to a property
pub struct PropertyValueInjection {
    property: String,
    value: Instance,
}

impl PropertyValueInjection {
    pub fn new(property: impl Into<String>, value: Instance) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

#[async_trait]
impl Injection for PropertyValueInjection {
    fn inject_sync(&self, instance: &Instance, _container: &Container) -> DIResult<()> {
        property_target(instance, &self.property)?.set_property(&self.property, self.value.clone())
    }

    async fn inject(&self, instance: &Instance, container: &Container) -> DIResult<()> {
        self.inject_sync(instance, container)
    }
}

/// Resolves `key` and assigns the result to a property
pub struct PropertyInjection {
    property: String,
    key: String,
}

impl PropertyInjection {
    pub fn new(property: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            key: key.into(),
        }
    }

    fn context(&self, instance: &Instance) -> ResolveContext {
        ResolveContext::for_injection(format!("{}.{}", instance.short_type_name(), self.property))
    }
}

#[async_trait]
impl Injection for PropertyInjection {
    fn inject_sync(&self, instance: &Instance, container: &Container) -> DIResult<()> {
        let target = property_target(instance, &self.property)?;
        let mut ctx = self.context(instance);
        let value = container.resolve_sync_with(&self.key, &mut ctx)?;
        target.set_property(&self.property, value)
    }

    async fn inject(&self, instance: &Instance, container: &Container) -> DIResult<()> {
        let target = property_target(instance, &self.property)?;
        let mut ctx = self.context(instance);
        let value = container.resolve_with(&self.key, &mut ctx).await?;
        target.set_property(&self.property, value)
    }
}

/// Calls a method with explicit arguments, or with its parameters resolved
/// from the container when none are given
pub struct MethodInjection {
    method: String,
    args: Option<Vec<Instance>>,
}

impl MethodInjection {
    /// Parameters are resolved from the container
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: None,
        }
    }

    pub fn with_args(method: impl Into<String>, args: Vec<Instance>) -> Self {
        Self {
            method: method.into(),
            args: Some(args),
        }
    }

    fn missing(&self) -> DIError {
        DIError::MethodInjectionTargetMissing {
            method: self.method.clone(),
        }
    }

    /// Target facet and its parameters sorted by position
    fn target<'a>(&self, instance: &'a Instance) -> DIResult<(&'a dyn Injectable, Vec<ParamInfo>)> {
        let facet = instance.injectable_facet().ok_or_else(|| self.missing())?;
        let mut params = facet.method_params(&self.method).ok_or_else(|| self.missing())?;
        params.sort_by_key(|param| param.position);
        Ok((facet.as_ref(), params))
    }

    fn context(&self, instance: &Instance) -> ResolveContext {
        ResolveContext::for_injection(format!("{}.{}()", instance.short_type_name(), self.method))
    }
}

#[async_trait]
impl Injection for MethodInjection {
    fn inject_sync(&self, instance: &Instance, container: &Container) -> DIResult<()> {
        let (target, params) = self.target(instance)?;
        let args = match &self.args {
            Some(args) => args.clone(),
            None => {
                let mut ctx = self.context(instance);
                params
                    .iter()
                    .map(|param| container.resolve_sync_with(&param.key, &mut ctx))
                    .collect::<DIResult<Vec<_>>>()?
            }
        };
        target.call_method(&self.method, args)
    }

    async fn inject(&self, instance: &Instance, container: &Container) -> DIResult<()> {
        let (target, params) = self.target(instance)?;
        let args = match &self.args {
            Some(args) => args.clone(),
            None => {
                let mut ctx = self.context(instance);
                let mut args = Vec::with_capacity(params.len());
                for param in &params {
                    args.push(container.resolve_with(&param.key, &mut ctx).await?);
                }
                args
            }
        };
        target.call_method(&self.method, args)
    }
}
