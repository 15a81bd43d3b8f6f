//! Priority-ordered, conditionally applied middleware

use super::descriptor::MiddlewareDescriptor;
use super::resolver::MiddlewareResolver;
use super::route_matcher::RouteMatcher;
use super::{dispatch, BoundMiddleware};
use crate::error::Result;
use crate::http::{HttpResponse, Request, Response};
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Condition deciding whether an entry applies to a request
pub type Predicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// A middleware with its priority and applicability conditions
#[derive(Clone)]
pub struct MiddlewareEntry {
    descriptor: MiddlewareDescriptor,
    priority: i32,
    predicates: Vec<Predicate>,
}

impl MiddlewareEntry {
    pub fn new(descriptor: impl Into<MiddlewareDescriptor>, priority: i32) -> Self {
        Self {
            descriptor: descriptor.into(),
            priority,
            predicates: Vec::new(),
        }
    }

    /// Add a condition; all conditions must hold
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn descriptor(&self) -> &MiddlewareDescriptor {
        &self.descriptor
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// True if every predicate holds for `request`
    pub fn applies_to(&self, request: &Request) -> bool {
        self.predicates.iter().all(|predicate| predicate(request))
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("descriptor", &self.descriptor)
            .field("priority", &self.priority)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

/// Ordered collection of middleware entries
///
/// On each run the entries that apply to the request are sorted by priority,
/// highest first, keeping insertion order between equal priorities.
///
/// # Example
///
/// ```rust,ignore
/// let mut pipeline = Pipeline::new(resolver);
/// pipeline
///     .add("session", 20)
///     .add_for_routes("auth", ["/admin/*"], 10)?
///     .add_for_methods("csrf", ["POST", "PUT", "DELETE"], 0);
///
/// let response = pipeline.execute(request, |request| controllers::dispatch(request))?;
/// ```
pub struct Pipeline {
    resolver: Arc<MiddlewareResolver>,
    entries: Vec<MiddlewareEntry>,
}

impl Pipeline {
    pub fn new(resolver: Arc<MiddlewareResolver>) -> Self {
        Self {
            resolver,
            entries: Vec::new(),
        }
    }

    /// Append an entry that always applies
    pub fn add(&mut self, middleware: impl Into<MiddlewareDescriptor>, priority: i32) -> &mut Self {
        self.push(MiddlewareEntry::new(middleware, priority))
    }

    /// Append an entry guarded by a predicate
    pub fn add_if<F>(
        &mut self,
        middleware: impl Into<MiddlewareDescriptor>,
        predicate: F,
        priority: i32,
    ) -> &mut Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.push(MiddlewareEntry::new(middleware, priority).when(Arc::new(predicate)))
    }

    /// Append an entry that only applies to matching paths
    pub fn add_for_routes<I>(
        &mut self,
        middleware: impl Into<MiddlewareDescriptor>,
        patterns: I,
        priority: i32,
    ) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let matcher = RouteMatcher::new(patterns)?;
        Ok(self.add_if(middleware, move |request| matcher.matches(request.path()), priority))
    }

    /// Append an entry that applies to every path except matching ones
    pub fn add_except_routes<I>(
        &mut self,
        middleware: impl Into<MiddlewareDescriptor>,
        patterns: I,
        priority: i32,
    ) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let matcher = RouteMatcher::new(patterns)?;
        Ok(self.add_if(middleware, move |request| !matcher.matches(request.path()), priority))
    }

    /// Append an entry that only applies to the given HTTP methods
    pub fn add_for_methods<I>(
        &mut self,
        middleware: impl Into<MiddlewareDescriptor>,
        methods: I,
        priority: i32,
    ) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let methods: Vec<String> = methods
            .into_iter()
            .map(|m| m.as_ref().to_ascii_uppercase())
            .collect();
        self.add_if(
            middleware,
            move |request| {
                let method = request.method().as_str();
                methods.iter().any(|m| m.eq_ignore_ascii_case(method))
            },
            priority,
        )
    }

    /// Append a prepared entry
    pub fn push(&mut self, entry: MiddlewareEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[MiddlewareEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The middleware that would run for `request`, in execution order
    pub fn chain_for(&self, request: &Request) -> Result<Vec<BoundMiddleware>> {
        let mut applicable: Vec<&MiddlewareEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.applies_to(request))
            .collect();
        applicable.sort_by_key(|entry| Reverse(entry.priority));

        let mut chain = Vec::new();
        for entry in applicable {
            chain.extend(self.resolver.resolve(&entry.descriptor)?);
        }
        Ok(chain)
    }

    /// Run `request` through the applicable middleware and then `destination`
    pub fn execute<D>(&self, request: Request, destination: D) -> Result<HttpResponse>
    where
        D: Fn(Request) -> Response,
    {
        let chain = self.chain_for(&request)?;
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            middleware = chain.len(),
            "executing middleware pipeline"
        );
        dispatch(&chain, request, &destination)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("entries", &self.entries)
            .finish()
    }
}
