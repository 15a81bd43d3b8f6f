//! Configuration module for Kit framework
//!
//! This module provides Laravel-like configuration management including:
//! - Automatic `.env` file loading with environment-based precedence
//! - Type-safe configuration structs, stored as container instances
//! - A service provider that wires both into the container
//!
//! # Example
//!
//! ```rust,no_run
//! use kit::{AppConfig, Config, Container};
//!
//! let container = Container::new();
//!
//! // Load .env files and register the default configs
//! Config::init(&container, std::path::Path::new("."));
//!
//! let app = Config::get::<AppConfig>(&container).unwrap();
//! println!("Starting {}", app.name);
//! ```

pub mod env;
pub mod providers;

pub use env::{env, env_optional, env_required, load_dotenv, Environment};
pub use providers::{AppConfig, AppConfigBuilder};

use crate::container::{key_of, Container, ServiceProvider};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config facade over the container
///
/// Each config struct is stored as a shared instance under its type key, so
/// services can also depend on `Arc<AppConfig>` directly.
pub struct Config;

impl Config {
    /// Load `.env` files from `project_root` and register `AppConfig`
    ///
    /// Returns the detected environment.
    pub fn init(container: &Container, project_root: &Path) -> Environment {
        let env = env::load_dotenv(project_root);
        Self::register(container, AppConfig::from_env());
        tracing::debug!(environment = %env, "configuration loaded");
        env
    }

    /// Get a typed config struct
    pub fn get<T: Send + Sync + 'static>(container: &Container) -> Option<Arc<T>> {
        container.make_type::<T>().ok()
    }

    /// Register a config struct, replacing any previous one of the same type
    ///
    /// # Example
    ///
    /// ```rust
    /// use kit::{Config, Container};
    ///
    /// struct CacheConfig {
    ///     ttl_seconds: u64,
    /// }
    ///
    /// let container = Container::new();
    /// Config::register(&container, CacheConfig { ttl_seconds: 60 });
    /// assert_eq!(Config::get::<CacheConfig>(&container).unwrap().ttl_seconds, 60);
    /// ```
    pub fn register<T: Send + Sync + 'static>(container: &Container, config: T) {
        container.instance_of(Arc::new(config));
    }

    /// Check if a config type is registered
    pub fn has<T: 'static>(container: &Container) -> bool {
        container.bound(&key_of::<T>())
    }

    /// Get the current environment
    ///
    /// Falls back to `APP_ENV` when no `AppConfig` is registered.
    pub fn environment(container: &Container) -> Environment {
        Self::get::<AppConfig>(container)
            .map(|c| c.environment.clone())
            .unwrap_or_else(Environment::detect)
    }

    /// Check if running in production environment
    pub fn is_production(container: &Container) -> bool {
        Self::environment(container).is_production()
    }

    /// Check if debug mode is enabled
    pub fn is_debug(container: &Container) -> bool {
        Self::get::<AppConfig>(container)
            .map(|c| c.debug)
            .unwrap_or(true)
    }
}

/// Registers configuration during container bootstrap
pub struct ConfigServiceProvider {
    project_root: PathBuf,
}

impl ConfigServiceProvider {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

impl ServiceProvider for ConfigServiceProvider {
    fn register(&self, container: &Container) -> Result<()> {
        Config::init(container, &self.project_root);
        Ok(())
    }
}
