//! Resolution context: build stack, parameter overrides and the resolve algorithm
//!
//! A `Resolver` lives for a single top-level `make` call. It carries the build
//! stack used for contextual lookups and the stack of parameter overrides.
//! Cycle detection and the depth limit live in the thread's resolution chain,
//! which nested `make` calls on the same container join.

use super::binding::Concrete;
use super::chain::{ChainGuard, MAX_DEPTH};
use super::class::{Arguments, Class, Param, ParamKind};
use super::instance::{key_of, Instance, Parameters};
use super::Container;
use crate::error::{FrameworkError, Result};
use std::sync::Arc;

/// Per-call resolution state handed to factories, extenders and callbacks
pub struct Resolver<'c> {
    container: &'c Container,
    /// Class keys currently under construction, outermost first
    build_stack: Vec<String>,
    /// Parameter overrides, one frame per nested `resolve`
    with: Vec<Parameters>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            build_stack: Vec::new(),
            with: Vec::new(),
        }
    }

    /// The container being resolved against
    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Class keys currently under construction, outermost first
    pub fn build_stack(&self) -> &[String] {
        &self.build_stack
    }

    /// Resolve a key without overrides
    pub fn make(&mut self, key: &str) -> Result<Instance> {
        self.resolve(key, Parameters::new())
    }

    /// Resolve a key and downcast it
    pub fn make_as<T: ?Sized + Send + Sync + 'static>(&mut self, key: &str) -> Result<Arc<T>> {
        let instance = self.make(key)?;
        Container::downcast_entry(key, instance)
    }

    /// Resolve a type by its own key
    pub fn make_type<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        self.make_as::<T>(&key_of::<T>())
    }

    /// Resolve `key`, honouring instances, aliases, contextual bindings and the
    /// registry, and falling back to building the key as a class
    pub fn resolve(&mut self, key: &str, parameters: Parameters) -> Result<Instance> {
        let key = self.container.get_alias(key);

        let Some(_depth) = ChainGuard::depth(self.container) else {
            return Err(FrameworkError::resolution_in(
                format!(
                    "Maximum resolution depth of {} exceeded while resolving [{}]",
                    MAX_DEPTH, key
                ),
                &self.build_stack,
            ));
        };

        let contextual = self.contextual_concrete(&key);
        let needs_contextual_build = !parameters.is_empty() || contextual.is_some();

        if !needs_contextual_build {
            if let Some(instance) = self.container.cached_instance(&key) {
                return Ok(instance);
            }
        }

        let binding = self.container.binding(&key);
        let shared = !needs_contextual_build
            && binding.as_ref().is_some_and(|b| b.lifetime.is_shared());
        let concrete = contextual
            .or_else(|| binding.map(|b| b.concrete))
            .unwrap_or_else(|| Concrete::Class(key.clone()));

        tracing::trace!(key = %key, shared, contextual = needs_contextual_build, "resolving");

        self.with.push(parameters);
        let result = if shared {
            self.resolve_shared(&key, concrete)
        } else {
            self.produce(&key, concrete)
                .and_then(|object| self.fire_resolving(&key, object))
                .and_then(|object| self.fire_resolved(&key, object))
        };
        self.with.pop();
        result
    }

    /// Construct a shared instance at most once, even across threads
    fn resolve_shared(&mut self, key: &str, concrete: Concrete) -> Result<Instance> {
        let guard = ChainGuard::constructing(self.container, key)
            .map_err(|cycle| FrameworkError::circular(key, cycle))?;

        let cell = self.container.construction_cell(key);
        if let Some(instance) = self.container.cached_instance(key) {
            return Ok(instance);
        }
        let mut created = false;

        let result = cell
            .get_or_try_init(|| {
                created = true;
                let object = self.produce(key, concrete)?;
                self.fire_resolving(key, object)
            })
            .cloned();
        drop(guard);

        let instance = result?;
        if created {
            self.container.store_shared(key, instance.clone());
            self.fire_resolved(key, instance)
        } else {
            Ok(instance)
        }
    }

    /// Produce a fresh object for `key` and apply its extenders
    fn produce(&mut self, key: &str, concrete: Concrete) -> Result<Instance> {
        let mut object = match concrete {
            Concrete::Factory(factory) => {
                let parameters = self.with.last().cloned().unwrap_or_default();
                factory(self, &parameters)?
            }
            Concrete::Value(value) => value,
            Concrete::Class(class_key) if class_key == key => self.build(&class_key)?,
            Concrete::Class(class_key) => {
                let parameters = self.with.last().cloned().unwrap_or_default();
                self.resolve(&class_key, parameters)?
            }
        };

        for extender in self.container.extenders(key) {
            object = extender(object, self)?;
        }
        Ok(object)
    }

    /// Instantiate a class declaration, auto-wiring its parameters
    fn build(&mut self, class_key: &str) -> Result<Instance> {
        let _building = ChainGuard::building(self.container, class_key)
            .map_err(|cycle| FrameworkError::circular(class_key, cycle))?;

        let class = match self.container.class(class_key) {
            Some(class) if class.is_instantiable() => class,
            Some(_) => {
                return Err(FrameworkError::resolution_in(
                    format!("Target [{}] is not instantiable", class_key),
                    &self.build_stack,
                ))
            }
            None => return Err(self.missing_class(class_key)),
        };

        tracing::debug!(class = class_key, depth = self.build_stack.len(), "building class");

        self.build_stack.push(class_key.to_string());
        let result = self.build_class(&class);
        self.build_stack.pop();
        result
    }

    fn build_class(&mut self, class: &Class) -> Result<Instance> {
        let mut args = Arguments::new(class.key());
        for param in class.params() {
            let value = self.resolve_param(class, param)?;
            args.insert(param.name(), value);
        }
        class.construct(&args)
    }

    fn resolve_param(&mut self, class: &Class, param: &Param) -> Result<Instance> {
        if let Some(value) = self.with.last().and_then(|p| p.get(param.name())) {
            return Ok(value.clone());
        }

        match param.kind() {
            ParamKind::Dependency(key) => match self.resolve(key, Parameters::new()) {
                Ok(value) => Ok(value),
                Err(err @ FrameworkError::CircularDependency { .. }) => Err(err),
                Err(err) => param.default_value().ok_or(err),
            },
            ParamKind::Value => {
                let needs = format!("${}", param.name());
                if let Some(concrete) = self.contextual_concrete(&needs) {
                    return self.contextual_value(concrete);
                }
                param.default_value().ok_or_else(|| {
                    FrameworkError::resolution_in(
                        format!(
                            "Unresolvable dependency resolving [${}] in class {}",
                            param.name(),
                            class.key()
                        ),
                        &self.build_stack,
                    )
                })
            }
        }
    }

    /// Contextual binding for `key` given the class on top of the build stack
    fn contextual_concrete(&self, key: &str) -> Option<Concrete> {
        let consumer = self.build_stack.last()?;
        self.container.find_contextual(consumer, key)
    }

    fn contextual_value(&mut self, concrete: Concrete) -> Result<Instance> {
        match concrete {
            Concrete::Value(value) => Ok(value),
            Concrete::Factory(factory) => factory(self, &Parameters::new()),
            Concrete::Class(key) => self.make(&key),
        }
    }

    fn fire_resolving(&mut self, key: &str, object: Instance) -> Result<Instance> {
        for callback in self.container.resolving_callbacks(key) {
            callback(&object, self)?;
        }
        Ok(object)
    }

    fn fire_resolved(&mut self, key: &str, object: Instance) -> Result<Instance> {
        self.container.mark_resolved(key);
        for callback in self.container.resolved_callbacks(key) {
            callback(&object, self)?;
        }
        Ok(object)
    }

    fn missing_class(&self, key: &str) -> FrameworkError {
        let message = if key.starts_with("dyn ") {
            format!("Target [{}] is not instantiable", key)
        } else {
            format!("Target class [{}] does not exist", key)
        };
        FrameworkError::resolution_in(message, &self.build_stack)
    }
}
