//! Binding registry entries

use super::instance::{key_of, Instance, Parameters};
use super::resolver::Resolver;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Factory closure: receives the active resolver and the call's overrides
pub type Factory = Arc<dyn Fn(&mut Resolver<'_>, &Parameters) -> Result<Instance> + Send + Sync>;

/// What a key resolves to
#[derive(Clone)]
pub enum Concrete {
    /// Invoke a closure to produce the instance
    Factory(Factory),
    /// Build (or resolve) another key, typically a class declaration
    Class(String),
    /// Hand out a literal value
    Value(Instance),
}

impl Concrete {
    /// Wrap a factory closure
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>, &Parameters) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Refer to another key
    pub fn class(key: impl Into<String>) -> Self {
        Self::Class(key.into())
    }

    /// Refer to the key of a Rust type
    pub fn class_of<T: ?Sized + 'static>() -> Self {
        Self::Class(key_of::<T>())
    }

    /// Build the class of `T` and hand it out as `Arc<U>`
    ///
    /// Class declarations produce their concrete type; this bridges them to
    /// the trait object a consumer depends on.
    ///
    /// ```rust,ignore
    /// container.bind(key_of::<dyn Logger>(), Concrete::class_as::<FileLogger, dyn Logger>(|l| l));
    /// ```
    pub fn class_as<T, U>(cast: fn(Arc<T>) -> Arc<U>) -> Self
    where
        T: Send + Sync + 'static,
        U: ?Sized + Send + Sync + 'static,
    {
        Self::factory(move |resolver, parameters| {
            let key = key_of::<T>();
            let instance = resolver.resolve(&key, parameters.clone())?;
            let concrete = super::Container::downcast_entry::<T>(&key, instance)?;
            Ok(Instance::new(cast(concrete)))
        })
    }

    /// Hand out the given value
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Value(Instance::value(value))
    }

    /// Hand out the given shared value
    pub fn arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::Value(Instance::new(value))
    }
}

impl From<Instance> for Concrete {
    fn from(instance: Instance) -> Self {
        Self::Value(instance)
    }
}

impl From<&str> for Concrete {
    fn from(key: &str) -> Self {
        Self::Class(key.to_string())
    }
}

impl From<String> for Concrete {
    fn from(key: String) -> Self {
        Self::Class(key)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Class(key) => f.debug_tuple("Class").field(key).finish(),
            Self::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
        }
    }
}

/// How long a resolved instance lives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// New instance per resolution
    Transient,
    /// One instance for the container's lifetime
    Shared,
    /// One instance until `forget_scoped_instances`
    Scoped,
}

impl Lifetime {
    pub fn is_shared(self) -> bool {
        !matches!(self, Self::Transient)
    }
}

/// A registry entry
#[derive(Clone, Debug)]
pub struct Binding {
    pub concrete: Concrete,
    pub lifetime: Lifetime,
}
