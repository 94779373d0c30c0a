//! Constructor descriptors
//!
//! A [`TypeInfo`] is the container's view of a constructable component: its
//! resolution key, the ordered constructor parameters and the function that
//! builds the value once those parameters are resolved. Components describe
//! themselves through [`Component::describe`].

use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{DIError, DIResult};
use crate::instance::Instance;

/// Prefix of keys that stand in for named (untyped) constructor parameters
pub const ARG_PREFIX: &str = "$arg:";

/// Builds the key used for a named parameter
pub fn arg_key(name: &str) -> String {
    format!("{}{}", ARG_PREFIX, name)
}

/// How a parameter's resolution key was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedAs {
    /// The parameter names the key of a registered component
    Typed,
    /// Only the parameter name is known; resolved through an argument alias
    Named,
}

/// A single constructor or method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub position: usize,
    pub name: String,
    pub key: String,
    pub parsed_as: ParsedAs,
}

impl ParamInfo {
    /// Parameter resolved through the component registered under `key`
    pub fn typed(position: usize, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
            key: key.into(),
            parsed_as: ParsedAs::Typed,
        }
    }

    /// Parameter resolved through the `$arg:<name>` alias
    pub fn named(position: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            position,
            key: arg_key(&name),
            name,
            parsed_as: ParsedAs::Named,
        }
    }
}

/// Builds an instance from already-resolved constructor arguments
pub type Constructor = Arc<dyn Fn(ResolvedArgs) -> DIResult<Instance> + Send + Sync>;

/// Constructor descriptor for a component
#[derive(Clone)]
pub struct TypeInfo {
    name: String,
    args: Vec<ParamInfo>,
    constructor: Option<Constructor>,
}

impl TypeInfo {
    pub fn builder(name: impl Into<String>) -> TypeInfoBuilder {
        TypeInfoBuilder {
            name: name.into(),
            args: Vec::new(),
            constructor: None,
        }
    }

    /// Descriptor declared by a [`Component`]
    pub fn of<T: Component>() -> DIResult<Self> {
        T::describe(Self::builder(T::component_name())).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order
    pub fn args(&self) -> &[ParamInfo] {
        &self.args
    }

    /// Parameters ordered by position; the stored order is left untouched
    pub fn sorted_args(&self) -> Vec<ParamInfo> {
        let mut args = self.args.clone();
        args.sort_by_key(|arg| arg.position);
        args
    }

    /// Keys this type depends on, in declaration order
    pub fn dependency_keys(&self) -> Vec<String> {
        self.args.iter().map(|arg| arg.key.clone()).collect()
    }

    pub fn is_constructable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Descriptor registered under a different key
    pub(crate) fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Invoke the constructor with arguments ordered by position
    pub fn construct(&self, args: Vec<Instance>) -> DIResult<Instance> {
        let constructor = self.constructor.as_ref().ok_or_else(|| DIError::NotConstructable {
            name: self.name.clone(),
        })?;

        constructor(ResolvedArgs {
            type_name: self.name.clone(),
            args,
        })
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("constructable", &self.is_constructable())
            .finish()
    }
}

/// Incremental [`TypeInfo`] construction
pub struct TypeInfoBuilder {
    name: String,
    args: Vec<ParamInfo>,
    constructor: Option<Constructor>,
}

impl TypeInfoBuilder {
    fn next_position(&self) -> usize {
        self.args.iter().map(|arg| arg.position + 1).max().unwrap_or(0)
    }

    /// Parameter satisfied by the component registered under `key`
    pub fn param(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        let position = self.next_position();
        self.args.push(ParamInfo::typed(position, name, key));
        self
    }

    /// Parameter satisfied by `$arg:<name>`
    pub fn named_param(mut self, name: impl Into<String>) -> Self {
        let position = self.next_position();
        self.args.push(ParamInfo::named(position, name));
        self
    }

    /// Parameter with an explicit position
    pub fn param_info(mut self, param: ParamInfo) -> Self {
        self.args.push(param);
        self
    }

    pub fn construct<F>(mut self, constructor: F) -> Self
    where
        F: Fn(ResolvedArgs) -> DIResult<Instance> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn build(self) -> DIResult<TypeInfo> {
        if self.name.trim().is_empty() {
            return Err(DIError::ConstructorParseFailure {
                name: self.name,
                reason: "a resolution key is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.args.iter().find(|arg| !seen.insert(arg.position)) {
            return Err(DIError::ConstructorParseFailure {
                reason: format!("parameter position {} is declared twice", dup.position),
                name: self.name,
            });
        }

        Ok(TypeInfo {
            name: self.name,
            args: self.args,
            constructor: self.constructor,
        })
    }
}

/// Constructor arguments, ordered by position
#[derive(Debug, Clone)]
pub struct ResolvedArgs {
    type_name: String,
    args: Vec<Instance>,
}

impl ResolvedArgs {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn instance(&self, position: usize) -> DIResult<Instance> {
        self.args
            .get(position)
            .cloned()
            .ok_or_else(|| DIError::MissingArgument {
                type_name: self.type_name.clone(),
                position,
            })
    }

    /// Typed view of the argument at `position`
    pub fn get<T: Any + Send + Sync>(&self, position: usize) -> DIResult<Arc<T>> {
        let instance = self.instance(position)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| DIError::type_mismatch::<T>(&self.type_name, instance.type_name()))
    }

    pub fn into_vec(self) -> Vec<Instance> {
        self.args
    }
}

/// A type that can describe its own constructor to the container
pub trait Component: Any + Send + Sync + Sized {
    /// Resolution key; defaults to the unqualified type name
    fn component_name() -> &'static str {
        short_type_name(type_name::<Self>())
    }

    /// Declare parameters and the constructor on the pre-named builder
    fn describe(info: TypeInfoBuilder) -> TypeInfoBuilder;
}

/// Resolution key of `T`
pub fn key_of<T: Component>() -> &'static str {
    T::component_name()
}

/// Strips module path and generic arguments: `a::b::Foo<c::Bar>` becomes `Foo`
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
