mod app;

pub use app::{AppConfig, AppConfigBuilder};
