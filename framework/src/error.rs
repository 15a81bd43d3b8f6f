//! Framework-wide error types
//!
//! Provides a unified error type for the service container and the middleware
//! pipeline. Container failures surface synchronously to the caller; pipeline
//! failures are wrapped so callers can tell "a specific middleware failed" apart
//! from "the pipeline was configured wrong".

use thiserror::Error;

/// Boxed error used at the middleware boundary
///
/// Middleware and destination handlers return this so application code can use
/// `?` on any error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the framework
pub type Result<T, E = FrameworkError> = std::result::Result<T, E>;

/// Framework-wide error type
///
/// # Example
///
/// ```rust,ignore
/// use kit::{Container, FrameworkError};
///
/// fn load(container: &Container) -> Result<(), FrameworkError> {
///     let mailer = container.make("mailer")?;  // Resolution errors propagate
///     // ...
///     Ok(())
/// }
/// ```
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// Identifier requested through `Container::get` is not bound
    #[error("No entry was found for [{key}] in the container")]
    NotFound {
        /// The identifier that was requested
        key: String,
    },

    /// Unresolvable dependency, non-instantiable target or parameter
    #[error("{message}{}", format_chain(.chain))]
    Resolution {
        /// Human readable description of the failure
        message: String,
        /// Build stack at the time of the failure (outermost first)
        chain: Vec<String>,
    },

    /// A constructor dependency graph loops back on itself
    #[error("Circular dependency detected while resolving [{key}]: {}", .chain.join(" -> "))]
    CircularDependency {
        /// The type that was requested a second time
        key: String,
        /// Full cycle, starting at the first occurrence of `key`
        chain: Vec<String>,
    },

    /// Invalid registration or middleware configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },

    /// A middleware's `handle` call failed
    #[error("Middleware [{middleware}] failed: {source}")]
    MiddlewareExecution {
        /// Identity of the middleware that raised the error
        middleware: String,
        /// The original cause
        #[source]
        source: BoxError,
    },

    /// The terminal destination of a pipeline failed
    #[error("Pipeline destination failed: {source}")]
    Handler {
        /// The original cause
        #[source]
        source: BoxError,
    },
}

fn format_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        String::new()
    } else {
        format!(" while building [{}]", chain.join(", "))
    }
}

impl FrameworkError {
    /// Create a NotFound error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a Resolution error without a build chain
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
            chain: Vec::new(),
        }
    }

    /// Create a Resolution error carrying the current build chain
    pub fn resolution_in(message: impl Into<String>, chain: &[String]) -> Self {
        Self::Resolution {
            message: message.into(),
            chain: chain.to_vec(),
        }
    }

    /// Create a CircularDependency error
    pub fn circular(key: impl Into<String>, chain: Vec<String>) -> Self {
        Self::CircularDependency {
            key: key.into(),
            chain,
        }
    }

    /// Create a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a failure raised inside a middleware
    pub fn middleware(middleware: impl Into<String>, source: BoxError) -> Self {
        Self::MiddlewareExecution {
            middleware: middleware.into(),
            source,
        }
    }

    /// Wrap a failure raised by the pipeline destination
    pub fn handler(source: BoxError) -> Self {
        Self::Handler { source }
    }

    /// True for resolution failures, including circular dependencies
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::CircularDependency { .. })
    }

    /// True when the error was raised while running a pipeline
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(self, Self::MiddlewareExecution { .. } | Self::Handler { .. })
    }

    /// Name of the middleware that raised the error, if any
    pub fn middleware_name(&self) -> Option<&str> {
        match self {
            Self::MiddlewareExecution { middleware, .. } => Some(middleware),
            _ => None,
        }
    }
}
