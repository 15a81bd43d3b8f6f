//! Type-erased instances and resolution parameters

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Canonical container key for a Rust type
///
/// Typed helpers such as `Container::make_type::<T>()` are sugar over the
/// string-keyed core and use this key.
///
/// ```rust
/// use kit::container::key_of;
///
/// assert!(key_of::<String>().ends_with("String"));
/// ```
pub fn key_of<T: ?Sized + 'static>() -> String {
    std::any::type_name::<T>().to_string()
}

/// A resolved value held by the container
///
/// Wraps an `Arc<T>` behind `dyn Any`, so both concrete types and trait
/// objects (`Arc<dyn Trait>`) can be stored. Cloning an `Instance` is cheap
/// and keeps pointing at the same value.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wrap a shared value
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an owned value
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// Get the stored value as `Arc<T>`, if it has that type
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Check the stored type without cloning
    pub fn is<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.value.is::<Arc<T>>()
    }

    /// `TypeId` of the stored `Arc<T>`
    pub fn type_id(&self) -> TypeId {
        let value: &dyn Any = &*self.value;
        value.type_id()
    }

    /// Name of the stored type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .finish()
    }
}

/// Named override values for a single resolution call
///
/// Overrides are matched against constructor parameters by name and are
/// handed to factory closures untouched.
///
/// # Example
/// ```rust,ignore
/// let report = container.make_with(
///     "report",
///     Parameters::new().with("title", "Quarterly".to_string()),
/// )?;
/// ```
#[derive(Clone, Default, Debug)]
pub struct Parameters {
    values: HashMap<String, Instance>,
}

impl Parameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owned override value
    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), Instance::value(value));
        self
    }

    /// Add an already-wrapped override value
    pub fn with_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Get an override by name
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// Get an owned override by name
    pub fn value<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<T> {
        self.values
            .get(name)
            .and_then(|i| i.downcast::<T>())
            .map(|arc| (*arc).clone())
    }

    /// True when there are no overrides
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn test_downcast_concrete_and_trait_object() {
        let concrete = Instance::value(42u32);
        assert_eq!(concrete.downcast::<u32>().as_deref(), Some(&42));
        assert!(concrete.downcast::<String>().is_none());

        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let erased = Instance::new(greeter);
        assert!(erased.is::<dyn Greeter>());
        assert_eq!(erased.downcast::<dyn Greeter>().unwrap().greet(), "hello");
        assert_eq!(erased.type_name(), std::any::type_name::<dyn Greeter>());
    }

    #[test]
    fn test_clones_share_identity() {
        let a = Instance::value(String::from("shared"));
        let b = a.clone();
        let c = Instance::value(String::from("shared"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_parameters_lookup() {
        let params = Parameters::new().with("limit", 10usize);
        assert_eq!(params.value::<usize>("limit"), Some(10));
        assert_eq!(params.value::<String>("limit"), None);
        assert!(params.get("missing").is_none());
        assert!(Parameters::new().is_empty());
    }
}
