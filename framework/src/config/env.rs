use crate::error::{FrameworkError, Result};
use std::path::Path;

/// Environment type enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Local
    pub fn detect() -> Self {
        std::env::var("APP_ENV")
            .map(|name| Self::from_name(&name))
            .unwrap_or(Self::Local)
    }

    /// Map an environment name to a variant
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            "testing" => Self::Testing,
            "local" | "" => Self::Local,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Name used in `.env.{name}` files
    pub fn name(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment (local or development)
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Load environment variables from .env files with proper precedence
///
/// Precedence (later entries override earlier ones):
/// 1. .env
/// 2. .env.local
/// 3. .env.{environment}
/// 4. .env.{environment}.local
/// 5. Actual process environment variables
///
/// Missing files are skipped.
pub fn load_dotenv(project_root: &Path) -> Environment {
    let env = Environment::detect();
    let name = env.name();

    // dotenvy never overwrites a variable that is already set, so the most
    // specific file goes first
    let files = [
        format!(".env.{}.local", name),
        format!(".env.{}", name),
        ".env.local".to_string(),
        ".env".to_string(),
    ];
    for file in files {
        let path = project_root.join(&file);
        if dotenvy::from_path(&path).is_ok() {
            tracing::debug!(file = %path.display(), "loaded environment file");
        }
    }

    env
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use kit::config::env;
///
/// let depth: usize = env("KIT_TEST_UNSET_DEPTH", 64);
/// assert_eq!(depth, 64);
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get a required environment variable
///
/// Fails with a configuration error if the variable is not set or cannot be
/// parsed.
///
/// # Example
/// ```
/// use kit::config::env_required;
///
/// let secret: kit::Result<String> = env_required("KIT_TEST_UNSET_SECRET");
/// assert!(secret.is_err());
/// ```
pub fn env_required<T: std::str::FromStr>(key: &str) -> Result<T> {
    env_optional(key).ok_or_else(|| {
        FrameworkError::configuration(format!(
            "Required environment variable {} is not set or invalid",
            key
        ))
    })
}

/// Get an optional environment variable
///
/// # Example
/// ```
/// use kit::config::env_optional;
///
/// let debug: Option<bool> = env_optional("KIT_TEST_UNSET_DEBUG");
/// assert_eq!(debug, None);
/// ```
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
