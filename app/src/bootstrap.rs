//! Application Bootstrap
//!
//! The composition root: service providers, container bindings and the
//! middleware configuration all live here.

use crate::middleware::{AuthMiddleware, LoggingMiddleware};
use crate::services::ReportService;
use kit::container::{key_of, Concrete};
use kit::{ConfigServiceProvider, Container, LogServiceProvider, MiddlewareRegistry, Result};
use std::sync::Arc;

/// Build and boot the application container
pub fn container() -> Result<Arc<Container>> {
    let container = Arc::new(Container::new());

    container.register_provider(ConfigServiceProvider::new(env!("CARGO_MANIFEST_DIR")))?;
    container.register_provider(LogServiceProvider)?;

    // One report service per process
    container.singleton(key_of::<ReportService>(), Concrete::class_of::<ReportService>());
    container.alias("reports", key_of::<ReportService>())?;

    container.boot()?;
    Ok(container)
}

/// Global and route middleware
pub fn middleware(container: Arc<Container>) -> Result<MiddlewareRegistry> {
    let registry = MiddlewareRegistry::new(container)
        .alias::<AuthMiddleware>("auth")
        .alias::<LoggingMiddleware>("log")
        .group("web", ["log"])
        .global(["web"])
        .route("/admin/*", ["auth"])
        .set_priority("log", 100);

    // Plain middleware values are bound directly
    registry
        .resolver()
        .container()
        .bind(key_of::<LoggingMiddleware>(), Concrete::value(LoggingMiddleware));

    Ok(registry)
}
