//! Kit: a Laravel-style service container and middleware pipeline
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::{injectable, Container, MiddlewareRegistry, Request};
//! use std::sync::Arc;
//!
//! #[injectable]
//! pub struct Greeter {
//!     #[inject(default = "hello".to_string())]
//!     greeting: String,
//! }
//!
//! let container = Arc::new(Container::new());
//! let greeter = container.make_type::<Greeter>()?;
//!
//! let registry = MiddlewareRegistry::new(container.clone()).global(["session"]);
//! let response = registry.handle(Request::build("GET", "/")?, |_| kit::http::text("ok"))?;
//! ```

// Lets `#[injectable]` expand to `::kit::...` paths inside this crate too
extern crate self as kit;

pub mod config;
pub mod container;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod testing;

pub use config::{AppConfig, Config, ConfigServiceProvider, Environment};
pub use container::{
    key_of, Class, Concrete, Container, Injectable, Instance, Param, Parameters, Resolver,
    ServiceProvider,
};
pub use error::{BoxError, FrameworkError, Result};
pub use http::{HttpResponse, Request, Response};
pub use logging::{LogServiceProvider, Logger};
pub use middleware::{
    middleware_fn, Middleware, MiddlewareDescriptor, MiddlewareRegistry, MiddlewareResolver,
    Next, Pipeline,
};

// Re-export for macro usage
#[doc(hidden)]
pub use inventory;

// Re-export the attribute macros
pub use kit_macros::{injectable, service};
