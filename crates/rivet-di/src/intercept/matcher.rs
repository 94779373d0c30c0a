//! Selection of the methods an interceptor applies to

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;

type Predicate = Arc<dyn Fn(&Instance, &str) -> bool + Send + Sync>;

/// Selects which `(instance, method)` pairs an interceptor applies to
#[derive(Clone)]
pub enum Matcher {
    /// Every method with this name, on any type
    Method(String),
    /// Methods of one concrete type, optionally narrowed to a single name
    Type {
        type_id: TypeId,
        type_name: &'static str,
        method: Option<String>,
    },
    Predicate(Predicate),
    Constant(bool),
}

impl Matcher {
    pub fn all() -> Self {
        Matcher::Constant(true)
    }

    pub fn none() -> Self {
        Matcher::Constant(false)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Matcher::Method(name.into())
    }

    pub fn for_type<T: Any>() -> Self {
        Matcher::Type {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            method: None,
        }
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Instance, &str) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(predicate))
    }

    /// Narrow a type matcher to one method; other matchers are returned unchanged
    pub fn with_method(self, name: impl Into<String>) -> Self {
        match self {
            Matcher::Type {
                type_id, type_name, ..
            } => Matcher::Type {
                type_id,
                type_name,
                method: Some(name.into()),
            },
            other => other,
        }
    }

    pub fn matches(&self, instance: &Instance, method: &str) -> bool {
        match self {
            Matcher::Method(name) => name == method,
            Matcher::Type {
                type_id,
                method: wanted,
                ..
            } => {
                instance.value_type_id() == *type_id
                    && wanted.as_deref().map_or(true, |wanted| wanted == method)
            }
            Matcher::Predicate(predicate) => predicate(instance, method),
            Matcher::Constant(value) => *value,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Matcher::Type {
                type_name, method, ..
            } => f
                .debug_struct("Type")
                .field("type_name", type_name)
                .field("method", method)
                .finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
            Matcher::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
        }
    }
}

impl From<&str> for Matcher {
    fn from(name: &str) -> Self {
        Matcher::method(name)
    }
}

impl From<String> for Matcher {
    fn from(name: String) -> Self {
        Matcher::Method(name)
    }
}

impl From<bool> for Matcher {
    fn from(value: bool) -> Self {
        Matcher::Constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repo;
    struct Cache;

    #[test]
    fn test_method_name_matches_any_type() {
        let matcher = Matcher::from("save");
        assert!(matcher.matches(&Instance::new(Repo), "save"));
        assert!(matcher.matches(&Instance::new(Cache), "save"));
        assert!(!matcher.matches(&Instance::new(Repo), "load"));
    }

    #[test]
    fn test_type_matcher() {
        let matcher = Matcher::for_type::<Repo>();
        assert!(matcher.matches(&Instance::new(Repo), "load"));
        assert!(!matcher.matches(&Instance::new(Cache), "load"));

        let narrowed = Matcher::for_type::<Repo>().with_method("save");
        assert!(narrowed.matches(&Instance::new(Repo), "save"));
        assert!(!narrowed.matches(&Instance::new(Repo), "load"));
    }

    #[test]
    fn test_predicate_and_constants() {
        let matcher = Matcher::predicate(|_, method| method.starts_with("get"));
        assert!(matcher.matches(&Instance::new(Repo), "getAll"));
        assert!(!matcher.matches(&Instance::new(Repo), "save"));

        assert!(Matcher::all().matches(&Instance::new(Repo), "x"));
        assert!(!Matcher::none().matches(&Instance::new(Repo), "x"));
    }
}
