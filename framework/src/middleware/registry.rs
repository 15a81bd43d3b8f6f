//! Middleware registry: global and route middleware plus the priority table
//!
//! Configure middleware in `bootstrap.rs`, then build the pipeline once and
//! share it.

use super::descriptor::MiddlewareDescriptor;
use super::pipeline::Pipeline;
use super::resolver::MiddlewareResolver;
use super::route_matcher::RouteMatcher;
use super::Middleware;
use crate::container::Container;
use crate::error::Result;
use crate::http::{HttpResponse, Request, Response};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for global and route-scoped middleware
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = MiddlewareRegistry::new(container)
///     .alias::<AuthMiddleware>("auth")
///     .group("web", ["session", "csrf"])
///     .global(["web"])
///     .route("/admin/*", ["auth:admin"])
///     .set_priority("session", 100)
///     .pipeline()?;
/// ```
pub struct MiddlewareRegistry {
    resolver: Arc<MiddlewareResolver>,
    /// Middleware that runs on every request (in order)
    global: Vec<MiddlewareDescriptor>,
    /// Route patterns and the middleware that runs on matching paths
    routes: Vec<(String, Vec<MiddlewareDescriptor>)>,
    priorities: HashMap<String, i32>,
}

impl MiddlewareRegistry {
    /// Create an empty registry resolving against `container`
    pub fn new(container: Arc<Container>) -> Self {
        Self::with_resolver(Arc::new(MiddlewareResolver::new(container)))
    }

    pub fn with_resolver(resolver: Arc<MiddlewareResolver>) -> Self {
        Self {
            resolver,
            global: Vec::new(),
            routes: Vec::new(),
            priorities: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> &Arc<MiddlewareResolver> {
        &self.resolver
    }

    /// Register a short name for the middleware type `M`
    pub fn alias<M: Middleware + 'static>(self, name: impl Into<String>) -> Self {
        self.resolver.alias::<M>(name);
        self
    }

    /// Register a named group of middleware
    pub fn group<I>(self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareDescriptor>,
    {
        self.resolver.group(name, members);
        self
    }

    /// Append global middleware that runs on every request
    ///
    /// Global middleware runs in the order they are added, unless the
    /// priority table says otherwise.
    pub fn global<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareDescriptor>,
    {
        self.global.extend(middleware.into_iter().map(Into::into));
        self
    }

    /// Append a single global middleware value
    ///
    /// ```rust,ignore
    /// m.append(LoggingMiddleware)
    ///  .append(CorsMiddleware)
    /// ```
    pub fn append<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.global.push(MiddlewareDescriptor::handler(middleware));
        self
    }

    /// Attach middleware to paths matching `pattern`
    pub fn route<I>(mut self, pattern: impl Into<String>, middleware: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareDescriptor>,
    {
        self.routes.push((
            pattern.into(),
            middleware.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Set the priority of a middleware name (higher runs first, default 0)
    pub fn set_priority(mut self, name: impl Into<String>, priority: i32) -> Self {
        self.priorities.insert(name.into(), priority);
        self
    }

    /// Get the list of global middleware
    pub fn global_middleware(&self) -> &[MiddlewareDescriptor] {
        &self.global
    }

    fn priority_of(&self, descriptor: &MiddlewareDescriptor) -> Option<i32> {
        descriptor
            .base_name()
            .and_then(|name| self.priorities.get(name))
            .copied()
    }

    /// Expand groups and pair every member with its priority
    ///
    /// A member's own priority wins; otherwise it inherits the priority of
    /// the group it was listed through (default 0).
    fn prioritized(&self, descriptor: &MiddlewareDescriptor) -> Result<Vec<(MiddlewareDescriptor, i32)>> {
        let inherited = self.priority_of(descriptor).unwrap_or(0);
        Ok(self
            .resolver
            .expand(descriptor)?
            .into_iter()
            .map(|member| {
                let priority = self.priority_of(&member).unwrap_or(inherited);
                (member, priority)
            })
            .collect())
    }

    /// Build the pipeline: global entries first, then route entries
    ///
    /// Groups are expanded here, so group and alias registrations made after
    /// this call are not seen by the returned pipeline.
    pub fn pipeline(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(self.resolver.clone());
        for descriptor in &self.global {
            for (member, priority) in self.prioritized(descriptor)? {
                pipeline.add(member, priority);
            }
        }
        for (pattern, middleware) in &self.routes {
            let matcher = RouteMatcher::new([pattern])?;
            for descriptor in middleware {
                for (member, priority) in self.prioritized(descriptor)? {
                    let matcher = matcher.clone();
                    pipeline.add_if(member, move |request| matcher.matches(request.path()), priority);
                }
            }
        }
        Ok(pipeline)
    }

    /// Build the pipeline and run `request` through it
    ///
    /// This rebuilds the pipeline, recompiling every route pattern, on each
    /// call. Servers should call `pipeline()` once at startup and reuse it.
    pub fn handle<D>(&self, request: Request, destination: D) -> Result<HttpResponse>
    where
        D: Fn(Request) -> Response,
    {
        self.pipeline()?.execute(request, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Concrete, Instance};
    use crate::middleware::Next;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct Trace {
        log: Arc<Mutex<Vec<String>>>,
        label: &'static str,
    }

    impl Middleware for Trace {
        fn handle(&self, request: Request, next: Next<'_>) -> Response {
            self.log.lock().push(self.label.to_string());
            next(request)
        }
    }

    fn registry(log: &Arc<Mutex<Vec<String>>>) -> MiddlewareRegistry {
        let container = Arc::new(Container::new());
        for label in ["session", "csrf", "auth"] {
            let log = log.clone();
            container.bind(
                label,
                Concrete::factory(move |_, _| {
                    Ok(Instance::value(Trace {
                        log: log.clone(),
                        label,
                    }))
                }),
            );
        }
        let registry = MiddlewareRegistry::new(container);
        registry.resolver().register::<Trace>();
        registry
    }

    #[test]
    fn test_global_route_and_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&log)
            .group("web", ["csrf"])
            .global(["web", "session"])
            .route("/admin/*", ["auth"])
            .set_priority("session", 50)
            .set_priority("auth", 10);

        let ok = |_: Request| HttpResponse::text("ok").ok();

        registry
            .handle(Request::build("GET", "/admin/users").unwrap(), ok)
            .unwrap();
        assert_eq!(*log.lock(), vec!["session", "auth", "csrf"]);

        log.lock().clear();
        registry
            .handle(Request::build("GET", "/").unwrap(), ok)
            .unwrap();
        assert_eq!(*log.lock(), vec!["session", "csrf"]);
    }

    #[test]
    fn test_group_members_use_their_own_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&log)
            .group("web", ["session", "csrf"])
            .global(["web", "auth"])
            .set_priority("csrf", 100);

        registry
            .handle(Request::build("GET", "/").unwrap(), |_| HttpResponse::new().ok())
            .unwrap();
        assert_eq!(*log.lock(), vec!["csrf", "session", "auth"]);
    }

    #[test]
    fn test_group_priority_is_inherited_by_members() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = registry(&log)
            .group("web", ["session", "csrf"])
            .global(["auth", "web"])
            .set_priority("web", 20)
            .set_priority("auth", 10)
            .set_priority("csrf", 30)
            .pipeline()
            .unwrap();

        assert_eq!(pipeline.len(), 3);
        pipeline
            .execute(Request::build("GET", "/").unwrap(), |_| HttpResponse::new().ok())
            .unwrap();
        assert_eq!(*log.lock(), vec!["csrf", "session", "auth"]);
    }

    #[test]
    fn test_group_cycle_fails_when_building_the_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&log)
            .group("a", ["b"])
            .group("b", ["a"])
            .global(["a"]);

        let err = registry.pipeline().unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"), "{}", err);
    }

    #[test]
    fn test_append_runs_value_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&log).append(Trace {
            log: log.clone(),
            label: "inline",
        });

        assert_eq!(registry.global_middleware().len(), 1);
        registry
            .handle(Request::build("GET", "/").unwrap(), |_| HttpResponse::new().ok())
            .unwrap();
        assert_eq!(*log.lock(), vec!["inline"]);
    }
}
