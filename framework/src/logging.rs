//! Application logger with pluggable handlers
//!
//! `Logger` fans records out to registered `LogHandler`s. A handler that fails
//! never fails the caller: the record is re-emitted through `tracing` instead,
//! which is also where records go when no handler is registered.
//!
//! # Example
//!
//! ```rust,ignore
//! let logger = container.make_type::<Logger>()?;
//! logger.info("user signed in", serde_json::json!({ "user_id": 7 }));
//! ```

use crate::config::AppConfig;
use crate::container::{Container, ServiceProvider};
use crate::error::{BoxError, Result};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Severity of a log record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A single log entry
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub level: Level,
    pub channel: String,
    pub message: String,
    pub context: serde_json::Value,
}

/// Destination for log records
pub trait LogHandler: Send + Sync {
    /// Records below this level are skipped
    fn min_level(&self) -> Level {
        Level::Debug
    }

    fn handle(&self, record: &Record) -> std::result::Result<(), BoxError>;
}

/// Channel-scoped logger
pub struct Logger {
    channel: String,
    handlers: RwLock<Vec<Arc<dyn LogHandler>>>,
}

impl Logger {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Add a handler; records go to every handler in registration order
    pub fn push_handler(&self, handler: Arc<dyn LogHandler>) {
        self.handlers.write().push(handler);
    }

    pub fn log(&self, level: Level, message: impl Into<String>, context: serde_json::Value) {
        let record = Record {
            level,
            channel: self.channel.clone(),
            message: message.into(),
            context,
        };

        let handlers = self.handlers.read().clone();
        if handlers.is_empty() {
            emit(&record);
            return;
        }

        for handler in handlers.iter().filter(|h| level >= h.min_level()) {
            if let Err(err) = handler.handle(&record) {
                tracing::warn!(channel = %record.channel, error = %err, "log handler failed");
                emit(&record);
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>, context: serde_json::Value) {
        self.log(Level::Debug, message, context);
    }

    pub fn info(&self, message: impl Into<String>, context: serde_json::Value) {
        self.log(Level::Info, message, context);
    }

    pub fn warning(&self, message: impl Into<String>, context: serde_json::Value) {
        self.log(Level::Warning, message, context);
    }

    pub fn error(&self, message: impl Into<String>, context: serde_json::Value) {
        self.log(Level::Error, message, context);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("channel", &self.channel)
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

fn emit(record: &Record) {
    let (channel, message, context) = (&record.channel, &record.message, &record.context);
    match record.level {
        Level::Debug => tracing::debug!(%channel, %context, "{}", message),
        Level::Info => tracing::info!(%channel, %context, "{}", message),
        Level::Warning => tracing::warn!(%channel, %context, "{}", message),
        Level::Error => tracing::error!(%channel, %context, "{}", message),
    }
}

/// Forwards records to `tracing`
#[derive(Debug, Default)]
pub struct TracingHandler {
    min_level: Option<Level>,
}

impl TracingHandler {
    pub fn at_least(level: Level) -> Self {
        Self {
            min_level: Some(level),
        }
    }
}

impl LogHandler for TracingHandler {
    fn min_level(&self) -> Level {
        self.min_level.unwrap_or(Level::Debug)
    }

    fn handle(&self, record: &Record) -> std::result::Result<(), BoxError> {
        emit(record);
        Ok(())
    }
}

/// Keeps records in memory; handy in tests
#[derive(Debug, Default)]
pub struct MemoryHandler {
    records: Mutex<Vec<Record>>,
}

impl MemoryHandler {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn has(&self, level: Level, message: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message == message)
    }
}

impl LogHandler for MemoryHandler {
    fn handle(&self, record: &Record) -> std::result::Result<(), BoxError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Registers a shared `Logger` named after the application
pub struct LogServiceProvider;

impl ServiceProvider for LogServiceProvider {
    fn register(&self, container: &Container) -> Result<()> {
        container.singleton_type::<Logger, _>(|resolver| {
            let channel = resolver
                .make_type::<AppConfig>()
                .ok()
                .map(|config| config.name.clone())
                .unwrap_or_else(|| "kit".to_string());
            let logger = Logger::new(channel);
            logger.push_handler(Arc::new(TracingHandler::default()));
            Ok(Arc::new(logger))
        });
        Ok(())
    }
}
