//! Middleware for Kit framework
//!
//! A middleware receives the request and a `next` continuation. It may act
//! before calling `next`, after it returns, or short-circuit by returning a
//! response of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::{HttpResponse, Middleware, Next, Request, Response};
//!
//! pub struct AuthMiddleware;
//!
//! impl Middleware for AuthMiddleware {
//!     fn handle(&self, request: Request, next: Next<'_>) -> Response {
//!         if request.header("Authorization").is_none() {
//!             return HttpResponse::text("Unauthorized").status(401).ok();
//!         }
//!         next(request)
//!     }
//! }
//! ```

mod descriptor;
mod pipeline;
mod registry;
mod resolver;
mod route_matcher;

pub use descriptor::MiddlewareDescriptor;
pub use pipeline::{MiddlewareEntry, Pipeline, Predicate};
pub use registry::MiddlewareRegistry;
pub use resolver::MiddlewareResolver;
pub use route_matcher::RouteMatcher;

use crate::error::FrameworkError;
use crate::http::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// Continuation that runs the rest of the chain
pub type Next<'a> = &'a dyn Fn(Request) -> Response;

/// Request handling contract
pub trait Middleware: Send + Sync {
    /// Handle the request, calling `next` to continue the chain
    fn handle(&self, request: Request, next: Next<'_>) -> Response;

    /// Handle the request with the parameters from a `name:p1,p2` descriptor
    ///
    /// Defaults to ignoring the parameters.
    fn handle_with_params(&self, request: Request, next: Next<'_>, params: &[String]) -> Response {
        let _ = params;
        self.handle(request, next)
    }
}

/// Shared handle to a middleware
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Convert a middleware into a shared handle
pub fn into_boxed<M: Middleware + 'static>(middleware: M) -> BoxedMiddleware {
    Arc::new(middleware)
}

struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next<'_>) -> Response + Send + Sync,
{
    fn handle(&self, request: Request, next: Next<'_>) -> Response {
        (self.0)(request, next)
    }
}

/// Adapt a closure into a middleware
///
/// ```rust,ignore
/// let timing = middleware_fn(|request, next| {
///     let started = Instant::now();
///     let response = next(request);
///     tracing::info!(elapsed = ?started.elapsed(), "request finished");
///     response
/// });
/// ```
pub fn middleware_fn<F>(handler: F) -> BoxedMiddleware
where
    F: Fn(Request, Next<'_>) -> Response + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(handler))
}

/// A resolved middleware, with its identity and descriptor parameters
#[derive(Clone)]
pub struct BoundMiddleware {
    name: String,
    handler: BoxedMiddleware,
    params: Vec<String>,
}

impl BoundMiddleware {
    pub fn new(name: impl Into<String>, handler: BoxedMiddleware, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            handler,
            params,
        }
    }

    /// Identity reported when this middleware fails
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn handle(&self, request: Request, next: Next<'_>) -> Response {
        if self.params.is_empty() {
            self.handler.handle(request, next)
        } else {
            self.handler.handle_with_params(request, next, &self.params)
        }
    }
}

impl fmt::Debug for BoundMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMiddleware")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Run `request` through `chain`, ending in `destination`
///
/// The first middleware is outermost; each one's `next` runs the remainder of
/// the chain. A failure raised inside a middleware is wrapped with that
/// middleware's name, a failure from `destination` is reported as a handler
/// error, and failures already wrapped deeper in the chain pass through
/// unchanged.
pub fn dispatch<D>(
    chain: &[BoundMiddleware],
    request: Request,
    destination: &D,
) -> Result<crate::http::HttpResponse, FrameworkError>
where
    D: Fn(Request) -> Response + ?Sized,
{
    run(chain, request, destination).map_err(|err| match err.downcast::<FrameworkError>() {
        Ok(err) => *err,
        Err(other) => FrameworkError::handler(other),
    })
}

fn run<D>(chain: &[BoundMiddleware], request: Request, destination: &D) -> Response
where
    D: Fn(Request) -> Response + ?Sized,
{
    match chain.split_first() {
        None => destination(request).map_err(|err| {
            if is_pipeline_failure(&*err) {
                err
            } else {
                Box::new(FrameworkError::handler(err)) as _
            }
        }),
        Some((layer, rest)) => {
            tracing::trace!(middleware = layer.name(), "entering middleware");
            let next = |request: Request| run(rest, request, destination);
            layer.handle(request, &next).map_err(|err| {
                if is_pipeline_failure(&*err) {
                    err
                } else {
                    tracing::debug!(middleware = layer.name(), error = %err, "middleware failed");
                    Box::new(FrameworkError::middleware(layer.name(), err)) as _
                }
            })
        }
    }
}

fn is_pipeline_failure(err: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
    err.downcast_ref::<FrameworkError>()
        .is_some_and(FrameworkError::is_pipeline_failure)
}
