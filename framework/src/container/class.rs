//! Class definitions used for constructor auto-wiring
//!
//! Rust has no runtime reflection, so a type that the container should build
//! on its own declares its constructor up front: an ordered parameter list and
//! a builder closure. The `#[injectable]` attribute generates this for you and
//! submits it to the global class catalog, which is how the container falls
//! back to "construct this class directly" for keys nobody bound.
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::container::{Class, Param};
//!
//! let class = Class::of::<Mailer>()
//!     .param(Param::dependency::<dyn Transport>("transport"))
//!     .param(Param::value("from").with_default(|| "noreply@example.com".to_string()))
//!     .builder(|args| {
//!         Ok(Mailer {
//!             transport: args.dependency::<dyn Transport>("transport")?,
//!             from: args.value::<String>("from")?,
//!         })
//!     });
//! container.add_class(class);
//! ```

use super::instance::{key_of, Instance};
use crate::error::{FrameworkError, Result};
use crate::middleware::Middleware;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Builder = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;
type DefaultFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Converts a built instance into a middleware handler
pub type MiddlewareCaster = fn(&Instance) -> Option<Arc<dyn Middleware>>;

/// What a constructor parameter needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Another container entry, resolved by key
    Dependency(String),
    /// A plain value: supplied by an override, a contextual primitive or a default
    Value,
}

/// A single constructor parameter
#[derive(Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<DefaultFn>,
}

impl Param {
    /// A parameter resolved from the container by type
    pub fn dependency<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::dependency_on(name, key_of::<T>())
    }

    /// A parameter resolved from the container by an explicit key
    pub fn dependency_on(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Dependency(key.into()),
            default: None,
        }
    }

    /// A plain value parameter
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Value,
            default: None,
        }
    }

    /// Declare a default value used when nothing else supplies the parameter
    pub fn with_default<T, F>(self, default: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.with_default_instance(move || Instance::value(default()))
    }

    /// Declare a default that produces an already-wrapped instance
    pub fn with_default_instance<F>(mut self, default: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(default));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn default_value(&self) -> Option<Instance> {
        self.default.as_ref().map(|f| f())
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Resolved constructor arguments handed to a class builder
pub struct Arguments {
    class: String,
    values: HashMap<String, Instance>,
}

impl Arguments {
    pub(crate) fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Instance) {
        self.values.insert(name.into(), value);
    }

    /// Get a resolved dependency as `Arc<T>`
    pub fn dependency<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.get(name)?;
        instance.downcast::<T>().ok_or_else(|| {
            FrameworkError::resolution(format!(
                "Parameter [${}] of [{}] resolved to [{}], expected [{}]",
                name,
                self.class,
                instance.type_name(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Get a resolved value parameter by cloning it out
    pub fn value<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<T> {
        self.dependency::<T>(name).map(|arc| (*arc).clone())
    }

    /// Get the raw instance for a parameter
    pub fn get(&self, name: &str) -> Result<&Instance> {
        self.values.get(name).ok_or_else(|| {
            FrameworkError::resolution(format!(
                "Parameter [${}] was not declared for [{}]",
                name, self.class
            ))
        })
    }
}

/// Constructor declaration for a type the container can build directly
#[derive(Clone)]
pub struct Class {
    key: String,
    params: Vec<Param>,
    builder: Option<Builder>,
    middleware: Option<MiddlewareCaster>,
}

impl Class {
    /// Start a declaration keyed by the type's own key
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(key_of::<T>())
    }

    /// Start a declaration under an explicit key
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
            builder: None,
            middleware: None,
        }
    }

    /// Append a constructor parameter (order is preserved)
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Set the constructor body
    pub fn builder<T, F>(mut self, build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(move |args| build(args).map(Instance::value)));
        self
    }

    /// Set a constructor body that wraps its own result, e.g. to store an
    /// `Arc<dyn Trait>`
    pub fn builder_instance<F>(mut self, build: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(build));
        self
    }

    /// Mark the built type as a middleware
    pub fn middleware(mut self, caster: MiddlewareCaster) -> Self {
        self.middleware = Some(caster);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// False for declarations without a constructor body
    pub fn is_instantiable(&self) -> bool {
        self.builder.is_some()
    }

    pub(crate) fn middleware_caster(&self) -> Option<MiddlewareCaster> {
        self.middleware
    }

    pub(crate) fn construct(&self, args: &Arguments) -> Result<Instance> {
        match &self.builder {
            Some(build) => build(args),
            None => Err(FrameworkError::resolution(format!(
                "Target [{}] is not instantiable",
                self.key
            ))),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("key", &self.key)
            .field("params", &self.params)
            .field("instantiable", &self.builder.is_some())
            .finish()
    }
}

/// Types that know how to declare their own constructor
///
/// Usually implemented by `#[injectable]`.
pub trait Injectable: Send + Sync + 'static {
    /// The constructor declaration for this type
    fn class() -> Class;
}

/// Entry for inventory-collected class declarations
///
/// Used internally by the `#[injectable]` macro so unbound keys can still be
/// built.
pub struct ClassEntry {
    /// Function producing the declaration
    pub class: fn() -> Class,
    /// Type name for debugging/logging
    pub name: &'static str,
}

inventory::collect!(ClassEntry);

static CATALOG: Lazy<HashMap<String, Class>> = Lazy::new(|| {
    let mut catalog = HashMap::new();
    for entry in inventory::iter::<ClassEntry> {
        let class = (entry.class)();
        tracing::trace!(class = class.key(), name = entry.name, "catalogued injectable class");
        catalog.insert(class.key().to_string(), class);
    }
    catalog
});

/// Look up an auto-registered class declaration
pub fn catalog_lookup(key: &str) -> Option<Class> {
    CATALOG.get(key).cloned()
}
