//! Service providers for Kit framework
//!
//! A provider groups related registrations. The container runs `register` as
//! soon as the provider is added, and `boot` once every provider has
//! registered, so `boot` may resolve services other providers bound.
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::container::{Concrete, Container, ServiceProvider};
//!
//! pub struct CacheServiceProvider;
//!
//! impl ServiceProvider for CacheServiceProvider {
//!     fn register(&self, container: &Container) -> kit::Result<()> {
//!         container.singleton("cache", Concrete::class_of::<MemoryCache>());
//!         container.alias("cache.store", "cache")
//!     }
//! }
//!
//! container.register_provider(CacheServiceProvider)?;
//! container.boot()?;
//! ```

use super::Container;
use crate::error::Result;

/// Two-phase registration unit
pub trait ServiceProvider: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Register bindings; must not resolve services from other providers
    fn register(&self, container: &Container) -> Result<()>;

    /// Called once after every provider has registered
    fn boot(&self, _container: &Container) -> Result<()> {
        Ok(())
    }
}
