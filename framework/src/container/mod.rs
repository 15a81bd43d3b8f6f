//! Application Container for Dependency Injection
//!
//! This module provides Laravel-like service container capabilities:
//! - Bindings: factories, class references and literal values per key
//! - Singletons and scoped instances, constructed at most once
//! - Aliases resolved transitively, with cycle rejection
//! - Contextual bindings: `when(consumer).needs(abstract).give(impl)`
//! - Tags for bulk resolution
//! - Extenders and resolving/resolved observers
//! - Auto-wiring through `#[injectable]` class declarations
//! - Service Providers: bootstrap services with register/boot lifecycle
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::container::{Concrete, Container, Instance};
//!
//! let container = Container::new();
//!
//! // Register a factory per key, shared or not
//! container.singleton("cache", Concrete::factory(|_, _| Ok(Instance::value(MemoryCache::new()))));
//! container.alias("cache.store", "cache")?;
//!
//! // Or register a trait binding by type
//! container.singleton_type::<dyn HttpClient, _>(|_| Ok(Arc::new(RealHttpClient::new())));
//!
//! // Resolve anywhere the container is reachable
//! let client: Arc<dyn HttpClient> = container.make_type::<dyn HttpClient>()?;
//! ```

mod alias;
mod binding;
mod chain;
mod class;
mod contextual;
mod hooks;
mod instance;
pub mod provider;
mod resolver;
mod tags;
pub mod testing;

pub use alias::AliasTable;
pub use binding::{Binding, Concrete, Factory, Lifetime};
pub use class::{
    catalog_lookup, Arguments, Class, ClassEntry, Injectable, MiddlewareCaster,
    Param, ParamKind,
};
pub use contextual::{ContextualBindingBuilder, ContextualNeeds};
pub use hooks::{Callback, Extender};
pub use instance::{key_of, Instance, Parameters};
pub use provider::ServiceProvider;
pub use resolver::Resolver;
pub use tags::TagRegistry;

use crate::error::{FrameworkError, Result};
use chain::ResolutionChain;
use contextual::ContextualStore;
use hooks::Hooks;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

/// The main service container
///
/// Stores type-erased bindings keyed by string. Every table sits behind its own
/// lock, and no lock is held while user code (factories, extenders, callbacks)
/// runs, so those closures may freely call back into the container. Share it
/// as `Arc<Container>` from the composition root.
pub struct Container {
    bindings: RwLock<HashMap<String, Binding>>,
    instances: RwLock<HashMap<String, Instance>>,
    /// Resolve-once cells for shared keys under construction
    cells: Mutex<HashMap<String, Arc<OnceCell<Instance>>>>,
    /// In-flight resolution per thread, joined by nested `make` calls
    chains: Mutex<HashMap<ThreadId, ResolutionChain>>,
    aliases: RwLock<AliasTable>,
    contextual: RwLock<ContextualStore>,
    tags: RwLock<TagRegistry>,
    hooks: RwLock<Hooks>,
    classes: RwLock<HashMap<String, Class>>,
    resolved: RwLock<HashSet<String>>,
    providers: Mutex<Vec<Arc<dyn ServiceProvider>>>,
    booted: AtomicBool,
}

impl Container {
    /// Create a new empty container
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            cells: Mutex::new(HashMap::new()),
            chains: Mutex::new(HashMap::new()),
            aliases: RwLock::new(AliasTable::new()),
            contextual: RwLock::new(ContextualStore::default()),
            tags: RwLock::new(TagRegistry::new()),
            hooks: RwLock::new(Hooks::default()),
            classes: RwLock::new(HashMap::new()),
            resolved: RwLock::new(HashSet::new()),
            providers: Mutex::new(Vec::new()),
            booted: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a binding (new instance per resolution)
    ///
    /// Overwrites any previous binding for `key` and drops a stale cached
    /// instance.
    ///
    /// # Example
    /// ```rust,ignore
    /// container.bind("mailer", Concrete::factory(|r, _| {
    ///     let transport = r.make_type::<dyn Transport>()?;
    ///     Ok(Instance::value(Mailer::new(transport)))
    /// }));
    /// ```
    pub fn bind(&self, key: impl Into<String>, concrete: impl Into<Concrete>) {
        self.register(key.into(), concrete.into(), Lifetime::Transient);
    }

    /// Register a shared binding (constructed once, then cached)
    pub fn singleton(&self, key: impl Into<String>, concrete: impl Into<Concrete>) {
        self.register(key.into(), concrete.into(), Lifetime::Shared);
    }

    /// Register a binding shared until `forget_scoped_instances` is called
    pub fn scoped(&self, key: impl Into<String>, concrete: impl Into<Concrete>) {
        self.register(key.into(), concrete.into(), Lifetime::Scoped);
    }

    /// Register `key` as constructible by itself (no explicit concrete)
    pub fn bind_self(&self, key: impl Into<String>, shared: bool) {
        let key = key.into();
        let lifetime = if shared {
            Lifetime::Shared
        } else {
            Lifetime::Transient
        };
        self.register(key.clone(), Concrete::Class(key), lifetime);
    }

    /// Register a binding only when `key` is not bound yet
    pub fn bind_if(&self, key: impl Into<String>, concrete: impl Into<Concrete>) {
        let key = key.into();
        if !self.bound(&key) {
            self.register(key, concrete.into(), Lifetime::Transient);
        }
    }

    /// Register a shared binding only when `key` is not bound yet
    pub fn singleton_if(&self, key: impl Into<String>, concrete: impl Into<Concrete>) {
        let key = key.into();
        if !self.bound(&key) {
            self.register(key, concrete.into(), Lifetime::Shared);
        }
    }

    fn register(&self, key: String, concrete: Concrete, lifetime: Lifetime) {
        tracing::debug!(key = %key, ?lifetime, "binding registered");
        self.drop_stale_instance(&key);
        self.bindings
            .write()
            .insert(key, Binding { concrete, lifetime });
    }

    fn drop_stale_instance(&self, key: &str) {
        self.instances.write().remove(key);
        self.aliases.write().remove(key);
    }

    /// Store a ready-made instance under `key`
    ///
    /// Subsequent resolutions return exactly this value until it is
    /// overwritten or forgotten, even if a factory is bound for `key`.
    pub fn instance(&self, key: impl Into<String>, instance: Instance) -> Instance {
        let key = key.into();
        tracing::debug!(key = %key, ty = instance.type_name(), "instance registered");
        self.aliases.write().remove(&key);
        self.instances.write().insert(key, instance.clone());
        instance
    }

    /// Bind a factory for a type key (new instance per resolution)
    ///
    /// # Example
    /// ```rust,ignore
    /// container.bind_type::<dyn HttpClient, _>(|_| Ok(Arc::new(RealHttpClient::new())));
    /// ```
    pub fn bind_type<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.bind(key_of::<T>(), Self::typed_factory(factory));
    }

    /// Bind a shared factory for a type key
    pub fn singleton_type<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.singleton(key_of::<T>(), Self::typed_factory(factory));
    }

    /// Store a ready-made instance under its type key
    pub fn instance_of<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) -> Instance {
        self.instance(key_of::<T>(), Instance::new(value))
    }

    fn typed_factory<T, F>(factory: F) -> Concrete
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Concrete::factory(move |resolver, _| factory(resolver).map(Instance::new))
    }

    /// Register `alias` as another name for `target`
    ///
    /// Fails with a configuration error when the alias would point at itself,
    /// directly or through a chain; the table is left unchanged.
    pub fn alias(&self, alias: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let (alias, target) = (alias.into(), target.into());
        self.aliases.write().add(&alias, &target)?;
        tracing::debug!(alias = %alias, target = %target, "alias registered");
        Ok(())
    }

    /// Start a contextual binding for one consumer
    pub fn when(&self, consumer: impl Into<String>) -> ContextualBindingBuilder<'_> {
        self.when_any([consumer.into()])
    }

    /// Start a contextual binding shared by several consumers
    pub fn when_any<I>(&self, consumers: I) -> ContextualBindingBuilder<'_>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let consumers = consumers
            .into_iter()
            .map(|c| self.get_alias(&c.into()))
            .collect();
        ContextualBindingBuilder::new(self, consumers)
    }

    /// Register "when building `consumer`, give `implementation` for `needs`"
    pub fn add_contextual_binding(&self, consumer: &str, needs: &str, implementation: Concrete) {
        let needs = self.get_alias(needs);
        tracing::debug!(consumer, needs = %needs, "contextual binding registered");
        self.contextual
            .write()
            .add(consumer.to_string(), needs, implementation);
    }

    /// Append every key under every tag
    pub fn tag<K, T>(&self, keys: K, tags: T)
    where
        K: IntoIterator,
        K::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.tags.write().tag(keys, tags);
    }

    /// Register a post-construction transform for `key`
    ///
    /// When a shared instance already exists it is transformed immediately.
    pub fn extend<F>(&self, key: &str, extender: F) -> Result<()>
    where
        F: Fn(Instance, &mut Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        let key = self.get_alias(key);
        let existing = self.instances.read().get(&key).cloned();
        match existing {
            Some(instance) => {
                let mut resolver = Resolver::new(self);
                let extended = extender(instance, &mut resolver)?;
                self.instances.write().insert(key, extended);
            }
            None => self.hooks.write().add_extender(key, Arc::new(extender)),
        }
        Ok(())
    }

    /// Observe instances of `key` before they are cached
    pub fn resolving<F>(&self, key: &str, callback: F)
    where
        F: Fn(&Instance, &mut Resolver<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let key = self.get_alias(key);
        self.hooks.write().add_resolving(Some(key), Arc::new(callback));
    }

    /// Observe instances of `key` after they are cached
    pub fn resolved<F>(&self, key: &str, callback: F)
    where
        F: Fn(&Instance, &mut Resolver<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let key = self.get_alias(key);
        self.hooks.write().add_resolved(Some(key), Arc::new(callback));
    }

    /// Observe every resolution before caching
    pub fn resolving_any<F>(&self, callback: F)
    where
        F: Fn(&Instance, &mut Resolver<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.write().add_resolving(None, Arc::new(callback));
    }

    /// Observe every resolution after caching
    pub fn resolved_any<F>(&self, callback: F)
    where
        F: Fn(&Instance, &mut Resolver<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.write().add_resolved(None, Arc::new(callback));
    }

    /// Register an `Injectable` type's declaration explicitly
    pub fn register_class<T: Injectable>(&self) {
        self.add_class(T::class());
    }

    /// Register a class declaration
    pub fn add_class(&self, class: Class) {
        tracing::debug!(class = class.key(), "class registered");
        self.classes.write().insert(class.key().to_string(), class);
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve `key` with named parameter overrides
    pub fn resolve(&self, key: &str, parameters: Parameters) -> Result<Instance> {
        Resolver::new(self).resolve(key, parameters)
    }

    /// Resolve `key`
    ///
    /// # Example
    /// ```rust,ignore
    /// let cache = container.make("cache")?;
    /// ```
    pub fn make(&self, key: &str) -> Result<Instance> {
        self.resolve(key, Parameters::new())
    }

    /// Resolve `key` with named parameter overrides
    pub fn make_with(&self, key: &str, parameters: Parameters) -> Result<Instance> {
        self.resolve(key, parameters)
    }

    /// Resolve `key` and downcast to `Arc<T>`
    pub fn make_as<T: ?Sized + Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>> {
        let instance = self.make(key)?;
        Self::downcast_entry(key, instance)
    }

    /// Resolve a type by its own key
    ///
    /// # Example
    /// ```rust,ignore
    /// let client: Arc<dyn HttpClient> = container.make_type::<dyn HttpClient>()?;
    /// ```
    pub fn make_type<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.make_as::<T>(&key_of::<T>())
    }

    /// Container-interop style accessor
    ///
    /// Behaves like `make`, but a failure for a key the container knows
    /// nothing about is reported as `NotFound`. Circular dependencies are
    /// always reported as such.
    pub fn get(&self, key: &str) -> Result<Instance> {
        match self.make(key) {
            Ok(instance) => Ok(instance),
            Err(err @ FrameworkError::CircularDependency { .. }) => Err(err),
            Err(err) if self.has(key) => Err(err),
            Err(err) => {
                tracing::debug!(key, error = %err, "entry not found");
                Err(FrameworkError::not_found(key))
            }
        }
    }

    /// Resolve every key under `tag`, in registration order
    ///
    /// Unknown tags yield an empty list.
    pub fn tagged(&self, tag: &str) -> Result<Vec<Instance>> {
        let keys = self.tags.read().keys(tag);
        let mut resolver = Resolver::new(self);
        keys.iter().map(|key| resolver.make(key)).collect()
    }

    /// Resolve every key under `tag` and downcast each to `Arc<T>`
    pub fn tagged_as<T: ?Sized + Send + Sync + 'static>(&self, tag: &str) -> Result<Vec<Arc<T>>> {
        let keys = self.tags.read().keys(tag);
        keys.iter().map(|key| self.make_as::<T>(key)).collect()
    }

    pub(crate) fn downcast_entry<T: ?Sized + Send + Sync + 'static>(
        key: &str,
        instance: Instance,
    ) -> Result<Arc<T>> {
        instance.downcast::<T>().ok_or_else(|| {
            FrameworkError::resolution(format!(
                "Entry [{}] resolved to [{}], expected [{}]",
                key,
                instance.type_name(),
                std::any::type_name::<T>()
            ))
        })
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// True if a binding, instance or alias exists for `key`
    pub fn bound(&self, key: &str) -> bool {
        self.bindings.read().contains_key(key)
            || self.instances.read().contains_key(key)
            || self.aliases.read().is_alias(key)
    }

    /// Same as `bound`
    pub fn has(&self, key: &str) -> bool {
        self.bound(key)
    }

    /// True if a type key is bound
    pub fn has_type<T: ?Sized + 'static>(&self) -> bool {
        self.bound(&key_of::<T>())
    }

    /// True once `key` has been resolved at least once (or holds an instance)
    pub fn is_resolved(&self, key: &str) -> bool {
        let key = self.get_alias(key);
        self.resolved.read().contains(&key) || self.instances.read().contains_key(&key)
    }

    /// True if `key` holds an instance or is bound as shared
    pub fn is_shared(&self, key: &str) -> bool {
        let key = self.get_alias(key);
        self.instances.read().contains_key(&key)
            || self
                .bindings
                .read()
                .get(&key)
                .is_some_and(|b| b.lifetime.is_shared())
    }

    pub fn is_alias(&self, key: &str) -> bool {
        self.aliases.read().is_alias(key)
    }

    /// Follow the alias chain for `key`
    pub fn get_alias(&self, key: &str) -> String {
        self.aliases.read().resolve(key)
    }

    /// Snapshot of the registered binding for `key`
    pub fn binding(&self, key: &str) -> Option<Binding> {
        self.bindings.read().get(key).cloned()
    }

    /// Class declaration for `key`: explicit registrations first, then the
    /// `#[injectable]` catalog
    pub fn class(&self, key: &str) -> Option<Class> {
        self.classes
            .read()
            .get(key)
            .cloned()
            .or_else(|| catalog_lookup(key))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Drop the cached instance for `key`
    pub fn forget_instance(&self, key: &str) {
        let key = self.get_alias(key);
        self.instances.write().remove(&key);
    }

    /// Drop the extenders registered for `key`
    pub fn forget_extenders(&self, key: &str) {
        let key = self.get_alias(key);
        self.hooks.write().forget_extenders(&key);
    }

    /// Drop every cached instance
    pub fn forget_instances(&self) {
        self.instances.write().clear();
    }

    /// Drop instances of scoped bindings (call at the end of a request)
    pub fn forget_scoped_instances(&self) {
        let scoped: Vec<String> = self
            .bindings
            .read()
            .iter()
            .filter(|(_, b)| b.lifetime == Lifetime::Scoped)
            .map(|(k, _)| k.clone())
            .collect();
        let mut instances = self.instances.write();
        for key in scoped {
            instances.remove(&key);
        }
    }

    /// Remove every binding, instance, alias, contextual binding, tag and hook
    pub fn flush(&self) {
        self.bindings.write().clear();
        self.instances.write().clear();
        self.cells.lock().clear();
        self.aliases.write().clear();
        self.contextual.write().clear();
        self.tags.write().clear();
        *self.hooks.write() = Hooks::default();
        self.classes.write().clear();
        self.resolved.write().clear();
        tracing::debug!("container flushed");
    }

    /// Register a service provider and run its `register` phase
    ///
    /// If the container has already booted, the provider boots immediately.
    pub fn register_provider<P: ServiceProvider + 'static>(&self, provider: P) -> Result<()> {
        let provider: Arc<dyn ServiceProvider> = Arc::new(provider);
        tracing::debug!(provider = provider.name(), "registering service provider");
        provider.register(self)?;
        self.providers.lock().push(provider.clone());
        if self.booted.load(Ordering::SeqCst) {
            provider.boot(self)?;
        }
        Ok(())
    }

    /// Run every registered provider's `boot` phase once
    pub fn boot(&self) -> Result<()> {
        if self.booted.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let providers = self.providers.lock().clone();
        for provider in providers {
            tracing::debug!(provider = provider.name(), "booting service provider");
            provider.boot(self)?;
        }
        Ok(())
    }

    pub fn is_booted(&self) -> bool {
        self.booted.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Resolver plumbing
    // ------------------------------------------------------------------

    /// Swap the binding and instance stored under `key`, returning the old pair
    pub(crate) fn replace_entry(
        &self,
        key: &str,
        binding: Option<Binding>,
        instance: Option<Instance>,
    ) -> (Option<Binding>, Option<Instance>) {
        let previous_binding = {
            let mut bindings = self.bindings.write();
            match binding {
                Some(binding) => bindings.insert(key.to_string(), binding),
                None => bindings.remove(key),
            }
        };
        let previous_instance = {
            let mut instances = self.instances.write();
            match instance {
                Some(instance) => instances.insert(key.to_string(), instance),
                None => instances.remove(key),
            }
        };
        (previous_binding, previous_instance)
    }

    pub(crate) fn cached_instance(&self, key: &str) -> Option<Instance> {
        self.instances.read().get(key).cloned()
    }

    pub(crate) fn construction_cell(&self, key: &str) -> Arc<OnceCell<Instance>> {
        self.cells
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Run `f` against the calling thread's resolution chain
    ///
    /// The chains lock is held for the duration of `f`; callers only touch
    /// the chain's stacks and never run user code inside.
    pub(crate) fn with_chain<R>(&self, f: impl FnOnce(&mut ResolutionChain) -> R) -> R {
        let thread = std::thread::current().id();
        let mut chains = self.chains.lock();
        let chain = chains.entry(thread).or_default();
        let result = f(chain);
        if chain.is_idle() {
            chains.remove(&thread);
        }
        result
    }

    pub(crate) fn store_shared(&self, key: &str, instance: Instance) {
        self.instances.write().insert(key.to_string(), instance);
        self.cells.lock().remove(key);
    }

    pub(crate) fn mark_resolved(&self, key: &str) {
        self.resolved.write().insert(key.to_string());
    }

    pub(crate) fn find_contextual(&self, consumer: &str, needs: &str) -> Option<Concrete> {
        let contextual = self.contextual.read();
        if let Some(concrete) = contextual.find(consumer, needs) {
            return Some(concrete);
        }
        let aliases = self.aliases.read();
        aliases
            .aliases_of(needs)
            .iter()
            .find_map(|alias| contextual.find(consumer, alias))
    }

    pub(crate) fn extenders(&self, key: &str) -> Vec<Extender> {
        self.hooks.read().extenders(key)
    }

    pub(crate) fn resolving_callbacks(&self, key: &str) -> Vec<Callback> {
        self.hooks.read().resolving(key)
    }

    pub(crate) fn resolved_callbacks(&self, key: &str) -> Vec<Callback> {
        self.hooks.read().resolved(key)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    trait Logger: Send + Sync {
        fn channel(&self) -> &'static str;
    }

    struct NullLogger;
    impl Logger for NullLogger {
        fn channel(&self) -> &'static str {
            "null"
        }
    }

    struct FileLogger;
    impl Logger for FileLogger {
        fn channel(&self) -> &'static str {
            "file"
        }
    }

    struct Reports {
        logger: Arc<dyn Logger>,
    }

    struct Counter(usize);

    fn counting_factory(calls: Arc<AtomicUsize>) -> Concrete {
        Concrete::factory(move |_, _| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(Instance::value(Counter(n)))
        })
    }

    fn logger_container() -> Container {
        let container = Container::new();
        container.add_class(Class::of::<NullLogger>().builder(|_| Ok(NullLogger)));
        container.add_class(Class::of::<FileLogger>().builder(|_| Ok(FileLogger)));
        container.add_class(
            Class::of::<Reports>()
                .param(Param::dependency::<dyn Logger>("logger"))
                .builder(|args| {
                    Ok(Reports {
                        logger: args.dependency::<dyn Logger>("logger")?,
                    })
                }),
        );
        container.bind(
            key_of::<dyn Logger>(),
            Concrete::class_as::<NullLogger, dyn Logger>(|l| l),
        );
        container
    }

    #[test]
    fn test_shared_binding_returns_identical_instance() {
        let container = Container::new();
        let calls = Arc::new(AtomicUsize::new(0));
        container.singleton("counter", counting_factory(calls.clone()));

        let first = container.make("counter").unwrap();
        let second = container.make("counter").unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(container.is_shared("counter"));
    }

    #[test]
    fn test_transient_binding_returns_distinct_instances() {
        let container = Container::new();
        container.bind("counter", counting_factory(Arc::new(AtomicUsize::new(0))));

        let first = container.make_as::<Counter>("counter").unwrap();
        let second = container.make_as::<Counter>("counter").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!((first.0, second.0), (0, 1));
    }

    #[test]
    fn test_alias_chain_resolves_to_target() {
        let container = Container::new();
        container.singleton("c", Concrete::value(7u32));
        container.alias("b", "c").unwrap();
        container.alias("a", "b").unwrap();

        let via_alias = container.make("a").unwrap();
        let direct = container.make("c").unwrap();

        assert!(via_alias.ptr_eq(&direct));
        assert_eq!(container.get_alias("a"), "c");
        assert!(container.bound("a"));
    }

    #[test]
    fn test_self_alias_is_a_configuration_error() {
        let container = Container::new();
        let err = container.alias("a", "a").unwrap_err();

        assert!(matches!(err, FrameworkError::Configuration { .. }));
        assert!(!container.is_alias("a"));
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        let container = Container::new();
        assert!(container.tagged("missing").unwrap().is_empty());
    }

    #[test]
    fn test_tagged_resolves_in_registration_order() {
        let container = Container::new();
        container.bind("cpu", Concrete::value("cpu"));
        container.bind("memory", Concrete::value("memory"));
        container.tag(["cpu", "memory"], ["reports"]);

        let names: Vec<&str> = container
            .tagged_as::<&str>("reports")
            .unwrap()
            .iter()
            .map(|name| **name)
            .collect();
        assert_eq!(names, vec!["cpu", "memory"]);
    }

    #[test]
    fn test_bind_self_builds_the_key_as_a_class() {
        let container = Container::new();
        container.add_class(Class::named("Clock").builder(|_| Ok(Counter(0))));
        container.add_class(Class::named("Registry").builder(|_| Ok(Counter(1))));
        container.bind_self("Clock", false);
        container.bind_self("Registry", true);

        let clock = container.make("Clock").unwrap();
        assert!(!clock.ptr_eq(&container.make("Clock").unwrap()));
        assert_eq!(clock.downcast::<Counter>().unwrap().0, 0);
        assert!(!container.is_shared("Clock"));

        let registry = container.make("Registry").unwrap();
        assert!(registry.ptr_eq(&container.make("Registry").unwrap()));
        assert!(container.is_shared("Registry"));
        assert!(container.bound("Clock") && container.bound("Registry"));
    }

    #[test]
    fn test_tagged_duplicates_follow_the_binding_lifetime() {
        let container = Container::new();
        container.bind("transient", counting_factory(Arc::new(AtomicUsize::new(0))));
        container.singleton("shared", counting_factory(Arc::new(AtomicUsize::new(0))));
        container.tag(["transient", "transient"], ["fresh"]);
        container.tag(["shared", "shared"], ["cached"]);

        let fresh = container.tagged("fresh").unwrap();
        assert_eq!(fresh.len(), 2);
        assert!(!fresh[0].ptr_eq(&fresh[1]));

        let cached = container.tagged("cached").unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached[0].ptr_eq(&cached[1]));
    }

    #[test]
    fn test_contextual_binding_only_applies_to_consumer() {
        let container = logger_container();
        container
            .when(key_of::<Reports>())
            .needs(key_of::<dyn Logger>())
            .give(Concrete::class_as::<FileLogger, dyn Logger>(|l| l));

        let reports = container.make_type::<Reports>().unwrap();
        assert_eq!(reports.logger.channel(), "file");

        let logger = container.make_type::<dyn Logger>().unwrap();
        assert_eq!(logger.channel(), "null");
    }

    #[test]
    fn test_instance_overrides_factory_binding() {
        let container = Container::new();
        container.bind("svc", counting_factory(Arc::new(AtomicUsize::new(0))));
        let obj = container.instance("svc", Instance::value(Counter(99)));

        let resolved = container.make("svc").unwrap();
        assert!(resolved.ptr_eq(&obj));
        assert_eq!(resolved.downcast::<Counter>().unwrap().0, 99);
    }

    #[test]
    fn test_alias_keys_reach_shared_state() {
        let container = Container::new();
        container.singleton("counter", counting_factory(Arc::new(AtomicUsize::new(0))));
        container.alias("count", "counter").unwrap();

        let first = container.make("count").unwrap();
        assert!(container.is_shared("count"));

        container.forget_instance("count");
        assert!(!first.ptr_eq(&container.make("counter").unwrap()));
    }

    #[test]
    fn test_rebinding_drops_stale_instance() {
        let container = Container::new();
        container.instance("svc", Instance::value(1u8));
        container.bind("svc", Concrete::value(2u8));

        assert_eq!(*container.make_as::<u8>("svc").unwrap(), 2);
    }

    #[test]
    fn test_cycle_error_names_both_classes() {
        let container = Container::new();
        container.add_class(
            Class::named("X")
                .param(Param::dependency_on("y", "Y"))
                .builder(|_| Ok(())),
        );
        container.add_class(
            Class::named("Y")
                .param(Param::dependency_on("x", "X"))
                .builder(|_| Ok(())),
        );

        let err = container.make("X").unwrap_err();
        assert!(matches!(err, FrameworkError::CircularDependency { .. }));
        let message = err.to_string();
        assert!(message.contains("X -> Y -> X"), "{}", message);

        // The build stack unwound: an unrelated resolution still works
        container.bind("ok", Concrete::value(1u8));
        assert!(container.make("ok").is_ok());
    }

    #[test]
    fn test_shared_cycle_through_factories_is_detected() {
        let container = Container::new();
        container.singleton("a", Concrete::factory(|r, _| r.make("b")));
        container.singleton("b", Concrete::factory(|r, _| r.make("a")));

        let err = container.make("a").unwrap_err();
        assert!(matches!(err, FrameworkError::CircularDependency { .. }));
        assert!(!container.is_resolved("a"));
    }

    #[test]
    fn test_runaway_factory_recursion_hits_depth_limit() {
        let container = Container::new();
        container.bind("loop", Concrete::factory(|r, _| r.make("loop")));

        let err = container.make("loop").unwrap_err();
        assert!(err.to_string().contains("Maximum resolution depth"));
    }

    #[test]
    fn test_shared_reentry_through_container_is_a_cycle() {
        let container = Container::new();
        container.singleton("a", Concrete::factory(|r, _| r.container().make("a")));

        let err = container.make("a").unwrap_err();
        assert!(matches!(err, FrameworkError::CircularDependency { .. }));
        assert!(err.to_string().contains("a -> a"), "{}", err);

        // The chain unwound: the key can be rebound and resolved afterwards
        container.singleton("a", Concrete::value(1u8));
        assert_eq!(*container.make_as::<u8>("a").unwrap(), 1);
    }

    #[test]
    fn test_transient_reentry_through_container_hits_depth_limit() {
        let container = Container::new();
        container.bind("loop", Concrete::factory(|r, _| r.container().make("loop")));

        let err = container.make("loop").unwrap_err();
        assert!(err.to_string().contains("Maximum resolution depth"));
        assert!(container.make("loop").unwrap_err().to_string().contains("Maximum"));
    }

    #[test]
    fn test_class_cycle_through_nested_make_is_detected() {
        let container = Container::new();
        container.add_class(
            Class::named("X")
                .param(Param::dependency_on("source", "source"))
                .builder(|_| Ok(())),
        );
        container.bind("source", Concrete::factory(|r, _| r.container().make("X")));

        let err = container.make("X").unwrap_err();
        assert!(matches!(err, FrameworkError::CircularDependency { .. }));
        assert!(err.to_string().contains("X -> X"), "{}", err);
    }

    #[test]
    fn test_missing_parameter_names_parameter_and_class() {
        let container = Container::new();
        container.add_class(
            Class::named("Mailer")
                .param(Param::value("from"))
                .builder(|args| args.value::<String>("from")),
        );

        let err = container.make("Mailer").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unresolvable dependency resolving [$from] in class Mailer while building [Mailer]"
        );

        let mailer = container
            .make_with("Mailer", Parameters::new().with("from", "ops@example.com".to_string()))
            .unwrap();
        assert_eq!(*mailer.downcast::<String>().unwrap(), "ops@example.com");
    }

    #[test]
    fn test_default_used_when_dependency_unresolvable() {
        let container = Container::new();
        container.add_class(
            Class::named("Report")
                .param(Param::dependency_on("title", "dyn Title").with_default(|| "untitled"))
                .builder(|args| args.value::<&str>("title")),
        );

        let report = container.make_as::<&str>("Report").unwrap();
        assert_eq!(*report, "untitled");
    }

    #[test]
    fn test_contextual_primitive() {
        let container = Container::new();
        container.add_class(
            Class::named("Report")
                .param(Param::value("pages").with_default(|| 1u32))
                .builder(|args| args.value::<u32>("pages")),
        );
        container.when("Report").needs("$pages").give(Concrete::value(12u32));

        assert_eq!(*container.make_as::<u32>("Report").unwrap(), 12);
    }

    #[test]
    fn test_get_reports_not_found_for_unknown_key() {
        let container = Container::new();
        let err = container.get("nothing.here").unwrap_err();
        assert!(matches!(err, FrameworkError::NotFound { .. }));

        let err = container.make("nothing.here").unwrap_err();
        assert!(matches!(err, FrameworkError::Resolution { .. }));
    }

    #[test]
    fn test_extend_composes_in_order_and_applies_to_existing() {
        let container = Container::new();
        container.bind("greeting", Concrete::value("hello".to_string()));
        container
            .extend("greeting", |i, _| {
                let s = i.downcast::<String>().map(|s| format!("{}, world", s));
                Ok(Instance::value(s.unwrap_or_default()))
            })
            .unwrap();
        container
            .extend("greeting", |i, _| {
                let s = i.downcast::<String>().map(|s| format!("{}!", s));
                Ok(Instance::value(s.unwrap_or_default()))
            })
            .unwrap();

        assert_eq!(*container.make_as::<String>("greeting").unwrap(), "hello, world!");

        container.instance("answer", Instance::value(41u32));
        container
            .extend("answer", |i, _| {
                Ok(Instance::value(i.downcast::<u32>().map_or(0, |n| *n + 1)))
            })
            .unwrap();
        assert_eq!(*container.make_as::<u32>("answer").unwrap(), 42);
    }

    #[test]
    fn test_resolving_fires_before_resolved() {
        let container = Container::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        container.singleton("svc", Concrete::value(1u8));

        let log = events.clone();
        container.resolved("svc", move |_, r| {
            log.lock().push(format!("resolved cached={}", r.container().is_resolved("svc")));
            Ok(())
        });
        let log = events.clone();
        container.resolving_any(move |_, _| {
            log.lock().push("resolving".to_string());
            Ok(())
        });

        container.make("svc").unwrap();
        container.make("svc").unwrap();

        assert_eq!(
            *events.lock(),
            vec!["resolving".to_string(), "resolved cached=true".to_string()]
        );
    }

    #[test]
    fn test_observer_error_propagates() {
        let container = Container::new();
        container.bind("svc", Concrete::value(1u8));
        container.resolving("svc", |_, _| Err(FrameworkError::resolution("rejected")));

        assert_eq!(container.make("svc").unwrap_err().to_string(), "rejected");
    }

    #[test]
    fn test_scoped_instances_are_forgotten() {
        let container = Container::new();
        container.scoped("request.id", counting_factory(Arc::new(AtomicUsize::new(0))));
        container.singleton("app.id", counting_factory(Arc::new(AtomicUsize::new(0))));

        let first = container.make("request.id").unwrap();
        let app = container.make("app.id").unwrap();
        assert!(first.ptr_eq(&container.make("request.id").unwrap()));

        container.forget_scoped_instances();

        assert!(!first.ptr_eq(&container.make("request.id").unwrap()));
        assert!(app.ptr_eq(&container.make("app.id").unwrap()));
    }

    #[test]
    fn test_bind_if_keeps_existing_binding() {
        let container = Container::new();
        container.bind("svc", Concrete::value(1u8));
        container.bind_if("svc", Concrete::value(2u8));
        container.singleton_if("other", Concrete::value(3u8));

        assert_eq!(*container.make_as::<u8>("svc").unwrap(), 1);
        assert_eq!(*container.make_as::<u8>("other").unwrap(), 3);
    }

    #[test]
    fn test_flush_clears_everything() {
        let container = logger_container();
        container.alias("log", key_of::<dyn Logger>()).unwrap();
        container.tag(["log"], ["all"]);
        container.flush();

        assert!(!container.bound("log"));
        assert!(container.tagged("all").unwrap().is_empty());
        assert!(container.make_type::<dyn Logger>().is_err());
    }

    #[test]
    fn test_concurrent_singleton_constructed_once() {
        let container = Arc::new(Container::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        container.singleton(
            "slow",
            Concrete::factory(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(20));
                Ok(Instance::value(Counter(0)))
            }),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.make("slow"))
            })
            .collect();
        let instances: Vec<Instance> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    }
}
