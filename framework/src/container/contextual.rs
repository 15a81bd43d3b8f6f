//! Contextual bindings: "when building X, give Y for Z"

use super::binding::Concrete;
use super::Container;
use std::collections::HashMap;

/// Per-consumer overrides keyed by (consumer, needed abstract)
#[derive(Default, Clone)]
pub(crate) struct ContextualStore {
    bindings: HashMap<String, HashMap<String, Concrete>>,
}

impl ContextualStore {
    pub(crate) fn add(&mut self, consumer: String, needs: String, give: Concrete) {
        self.bindings.entry(consumer).or_default().insert(needs, give);
    }

    pub(crate) fn find(&self, consumer: &str, needs: &str) -> Option<Concrete> {
        self.bindings.get(consumer)?.get(needs).cloned()
    }

    pub(crate) fn clear(&mut self) {
        self.bindings.clear();
    }
}

/// First step of `container.when(consumer)`
///
/// # Example
///
/// ```rust,ignore
/// container
///     .when("reports")
///     .needs(key_of::<dyn Logger>())
///     .give(Concrete::class_of::<FileLogger>());
/// ```
#[must_use = "call .needs(..).give(..) to register the binding"]
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    consumers: Vec<String>,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c Container, consumers: Vec<String>) -> Self {
        Self {
            container,
            consumers,
        }
    }

    /// The abstract key (or `$name` value parameter) being overridden
    pub fn needs(self, abstract_key: impl Into<String>) -> ContextualNeeds<'c> {
        ContextualNeeds {
            container: self.container,
            consumers: self.consumers,
            needs: abstract_key.into(),
        }
    }
}

/// Second step of `container.when(consumer).needs(abstract)`
#[must_use = "call .give(..) to register the binding"]
pub struct ContextualNeeds<'c> {
    container: &'c Container,
    consumers: Vec<String>,
    needs: String,
}

impl<'c> ContextualNeeds<'c> {
    /// Register the implementation for every consumer
    pub fn give(self, implementation: impl Into<Concrete>) {
        let implementation = implementation.into();
        for consumer in &self.consumers {
            self.container
                .add_contextual_binding(consumer, &self.needs, implementation.clone());
        }
    }
}
