//! Turns middleware descriptors into runnable chains
//!
//! Names are looked up in this order: groups, aliases, then the container.
//! Anything built by the container must implement `Middleware`, either because
//! it was registered here with `register::<M>()`/`alias::<M>()`, because its
//! class was declared with `#[injectable(middleware)]`, or because the
//! container hands out an `Arc<dyn Middleware>` directly.

use super::descriptor::{parse_name, MiddlewareDescriptor};
use super::{dispatch, BoundMiddleware, BoxedMiddleware, Middleware};
use crate::container::{key_of, Container, Instance, MiddlewareCaster};
use crate::error::{FrameworkError, Result};
use crate::http::{HttpResponse, Request, Response};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

fn cast<M: Middleware + 'static>(instance: &Instance) -> Option<BoxedMiddleware> {
    instance.downcast::<M>().map(|m| m as BoxedMiddleware)
}

/// Middleware alias, group and type registry
pub struct MiddlewareResolver {
    container: Arc<Container>,
    aliases: RwLock<HashMap<String, String>>,
    groups: RwLock<HashMap<String, Vec<MiddlewareDescriptor>>>,
    casters: RwLock<HashMap<TypeId, MiddlewareCaster>>,
}

impl MiddlewareResolver {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            aliases: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            casters: RwLock::new(HashMap::new()),
        }
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Teach the resolver that instances of `M` are middleware
    pub fn register<M: Middleware + 'static>(&self) {
        self.casters
            .write()
            .insert(TypeId::of::<Arc<M>>(), cast::<M> as MiddlewareCaster);
    }

    /// Register `name` as a short name for the middleware type `M`
    ///
    /// ```rust,ignore
    /// resolver.alias::<AuthMiddleware>("auth");
    /// ```
    pub fn alias<M: Middleware + 'static>(&self, name: impl Into<String>) {
        self.register::<M>();
        self.alias_key(name, key_of::<M>());
    }

    /// Register `name` as a short name for a container key
    pub fn alias_key(&self, name: impl Into<String>, target: impl Into<String>) {
        let (name, target) = (name.into(), target.into());
        tracing::debug!(alias = %name, target = %target, "middleware alias registered");
        self.aliases.write().insert(name, target);
    }

    /// Register a named group of middleware
    pub fn group<I>(&self, name: impl Into<String>, members: I)
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareDescriptor>,
    {
        let name = name.into();
        let members: Vec<MiddlewareDescriptor> = members.into_iter().map(Into::into).collect();
        tracing::debug!(group = %name, size = members.len(), "middleware group registered");
        self.groups.write().insert(name, members);
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.read().contains_key(name)
    }

    /// Resolve a descriptor into the ordered list of middleware it stands for
    pub fn resolve(&self, descriptor: &MiddlewareDescriptor) -> Result<Vec<BoundMiddleware>> {
        self.expand(descriptor)?
            .iter()
            .map(|member| self.resolve_member(member))
            .collect()
    }

    /// Flatten groups and lists into the single middleware they stand for
    ///
    /// Group members keep their declared order. A group that contains itself,
    /// directly or through other groups, is a configuration error.
    pub fn expand(&self, descriptor: &MiddlewareDescriptor) -> Result<Vec<MiddlewareDescriptor>> {
        let mut members = Vec::new();
        self.expand_into(descriptor, &mut Vec::new(), &mut members)?;
        Ok(members)
    }

    /// Resolve `descriptor` and run `request` through it
    pub fn execute<D>(
        &self,
        descriptor: &MiddlewareDescriptor,
        request: Request,
        destination: D,
    ) -> Result<HttpResponse>
    where
        D: Fn(Request) -> Response,
    {
        let chain = self.resolve(descriptor)?;
        dispatch(&chain, request, &destination)
    }

    fn expand_into(
        &self,
        descriptor: &MiddlewareDescriptor,
        groups: &mut Vec<String>,
        members: &mut Vec<MiddlewareDescriptor>,
    ) -> Result<()> {
        match descriptor {
            MiddlewareDescriptor::Handler { .. } => {
                members.push(descriptor.clone());
                Ok(())
            }
            MiddlewareDescriptor::List(list) => list
                .iter()
                .try_for_each(|item| self.expand_into(item, groups, members)),
            MiddlewareDescriptor::Name(name) => {
                let group = self.groups.read().get(name.trim()).cloned();
                match group {
                    Some(group) => self.expand_group(name.trim(), &group, groups, members),
                    None => {
                        members.push(descriptor.clone());
                        Ok(())
                    }
                }
            }
        }
    }

    fn expand_group(
        &self,
        name: &str,
        group: &[MiddlewareDescriptor],
        groups: &mut Vec<String>,
        members: &mut Vec<MiddlewareDescriptor>,
    ) -> Result<()> {
        if groups.iter().any(|g| g == name) {
            let mut cycle = groups.clone();
            cycle.push(name.to_string());
            return Err(FrameworkError::configuration(format!(
                "Middleware group cycle detected: {}",
                cycle.join(" -> ")
            )));
        }

        groups.push(name.to_string());
        let result = group
            .iter()
            .try_for_each(|member| self.expand_into(member, groups, members));
        groups.pop();
        result
    }

    fn resolve_member(&self, member: &MiddlewareDescriptor) -> Result<BoundMiddleware> {
        match member {
            MiddlewareDescriptor::Handler { name, handler } => {
                Ok(BoundMiddleware::new(name.clone(), handler.clone(), Vec::new()))
            }
            MiddlewareDescriptor::Name(name) => self.resolve_name(name),
            MiddlewareDescriptor::List(_) => Err(FrameworkError::configuration(
                "Middleware lists must be expanded before they are resolved",
            )),
        }
    }

    fn resolve_name(&self, descriptor: &str) -> Result<BoundMiddleware> {
        let (name, params) = parse_name(descriptor)?;
        let target = self
            .aliases
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());

        let instance = self.container.make(&target)?;
        let handler = self.cast(&target, &instance).ok_or_else(|| {
            FrameworkError::configuration(format!(
                "Middleware [{}] resolved to [{}], which does not implement Middleware",
                name,
                instance.type_name()
            ))
        })?;

        Ok(BoundMiddleware::new(name, handler, params))
    }

    fn cast(&self, target: &str, instance: &Instance) -> Option<BoxedMiddleware> {
        if let Some(handler) = instance.downcast::<dyn Middleware>() {
            return Some(handler);
        }
        let registered = self.casters.read().get(&instance.type_id()).copied();
        registered
            .or_else(|| {
                self.container
                    .class(target)
                    .and_then(|class| class.middleware_caster())
            })
            .and_then(|caster| caster(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Class, Concrete};
    use crate::middleware::{middleware_fn, Next};
    use parking_lot::Mutex;

    struct Tagger {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tagger {
        fn handle(&self, request: Request, next: Next<'_>) -> Response {
            self.log.lock().push(self.tag.to_string());
            next(request)
        }

        fn handle_with_params(
            &self,
            request: Request,
            next: Next<'_>,
            params: &[String],
        ) -> Response {
            self.log
                .lock()
                .push(format!("{}:{}", self.tag, params.join(",")));
            next(request)
        }
    }

    fn setup() -> (MiddlewareResolver, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let container = Arc::new(Container::new());
        for tag in ["auth", "csrf", "session"] {
            let log = log.clone();
            container.bind(
                format!("mw.{}", tag),
                Concrete::factory(move |_, _| {
                    Ok(Instance::value(Tagger {
                        tag,
                        log: log.clone(),
                    }))
                }),
            );
        }
        let resolver = MiddlewareResolver::new(container);
        resolver.register::<Tagger>();
        (resolver, log)
    }

    fn run(resolver: &MiddlewareResolver, descriptor: MiddlewareDescriptor) -> Result<HttpResponse> {
        resolver.execute(&descriptor, Request::build("GET", "/").unwrap(), |_| {
            HttpResponse::text("ok").ok()
        })
    }

    #[test]
    fn test_group_of_aliases_with_params() {
        let (resolver, log) = setup();
        resolver.alias_key("auth", "mw.auth");
        resolver.group("web", ["mw.session", "mw.csrf"]);
        resolver.group("admin", vec!["web", "auth:admin,editor"]);

        run(&resolver, "admin".into()).unwrap();

        assert_eq!(*log.lock(), vec!["session", "csrf", "auth:admin,editor"]);
    }

    #[test]
    fn test_group_cycle_is_a_configuration_error() {
        let (resolver, _) = setup();
        resolver.group("a", ["b"]);
        resolver.group("b", ["a"]);

        let err = resolver.resolve(&"a".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Middleware group cycle detected: a -> b -> a"
        );
    }

    #[test]
    fn test_non_middleware_is_a_configuration_error() {
        let (resolver, _) = setup();
        resolver.container().bind("not.middleware", Concrete::value(42u8));

        let err = resolver.resolve(&"not.middleware".into()).unwrap_err();
        assert!(matches!(err, FrameworkError::Configuration { .. }));
    }

    #[test]
    fn test_class_declared_middleware_is_cast() {
        struct Stamp;
        impl Middleware for Stamp {
            fn handle(&self, request: Request, next: Next<'_>) -> Response {
                next(request).map(|r| r.header("X-Stamp", "1"))
            }
        }

        let (resolver, _) = setup();
        resolver
            .container()
            .add_class(Class::named("stamp").builder(|_| Ok(Stamp)).middleware(cast::<Stamp>));

        let response = run(&resolver, "stamp".into()).unwrap();
        assert_eq!(response.get_header("x-stamp"), Some("1"));
    }

    #[test]
    fn test_shared_trait_object_and_closure_handlers() {
        let (resolver, log) = setup();
        let handler = middleware_fn(|request, next| next(request));
        resolver
            .container()
            .instance("passthrough", Instance::new(handler.clone()));
        let list = MiddlewareDescriptor::List(vec![
            "passthrough".into(),
            handler.into(),
            "mw.auth".into(),
        ]);

        let chain = resolver.resolve(&list).unwrap();
        let names: Vec<&str> = chain.iter().map(BoundMiddleware::name).collect();
        assert_eq!(names, vec!["passthrough", "closure", "mw.auth"]);

        run(&resolver, list).unwrap();
        assert_eq!(*log.lock(), vec!["auth"]);
    }

    #[test]
    fn test_unknown_name_is_a_resolution_error() {
        let (resolver, _) = setup();
        let err = resolver.resolve(&"missing".into()).unwrap_err();
        assert!(err.is_resolution());
    }
}
