use std::any::Any;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

use crate::descriptor::WorkerDescriptor;
use crate::traits::{Worker, WorkerFactory};

inventory::submit! {
    WorkerFactory {
        import_path: ConsoleLog::IMPORT_PATH,
        construct: || Box::new(ConsoleLog::new()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Default, Deserialize)]
struct ConsoleLogMetadata {
    level: Option<LogLevel>,
    prefix: Option<String>,
}

/// Log worker writing through `tracing`
pub struct ConsoleLog {
    name: String,
    level: LogLevel,
    prefix: Option<String>,
}

impl ConsoleLog {
    pub const IMPORT_PATH: &'static str = "hive/log/console";

    pub fn new() -> Self {
        ConsoleLog {
            name: String::new(),
            level: LogLevel::Info,
            prefix: None,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns `false` when the message is below the configured level.
    pub fn write(&self, level: LogLevel, message: &str) -> bool {
        if level < self.level {
            return false;
        }

        let prefix = self.prefix.as_deref().unwrap_or("");
        match level {
            LogLevel::Trace => trace!(worker = %self.name, "{prefix}{message}"),
            LogLevel::Debug => debug!(worker = %self.name, "{prefix}{message}"),
            LogLevel::Info => info!(worker = %self.name, "{prefix}{message}"),
            LogLevel::Warn => warn!(worker = %self.name, "{prefix}{message}"),
            LogLevel::Error => error!(worker = %self.name, "{prefix}{message}"),
        }
        true
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for ConsoleLog {
    async fn init(&mut self, descriptor: &WorkerDescriptor) -> Result<()> {
        let metadata: ConsoleLogMetadata = descriptor.metadata_as()?;
        self.name = descriptor.name.clone();
        self.level = metadata.level.unwrap_or(LogLevel::Info);
        self.prefix = metadata.prefix;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_level_from_metadata() {
        let mut log = ConsoleLog::new();
        let descriptor =
            WorkerDescriptor::new("log1", "Log", ConsoleLog::IMPORT_PATH).with_metadata("level", "warn");
        log.init(&descriptor).await.unwrap();

        assert_eq!(log.level(), LogLevel::Warn);
        assert!(!log.write(LogLevel::Info, "dropped"));
        assert!(log.write(LogLevel::Error, "kept"));
    }

    #[tokio::test]
    async fn test_defaults_to_info() {
        let mut log = ConsoleLog::new();
        log.init(&WorkerDescriptor::new("log1", "Log", ConsoleLog::IMPORT_PATH))
            .await
            .unwrap();
        assert_eq!(log.level(), LogLevel::Info);
        assert!(!log.write(LogLevel::Debug, "dropped"));
    }

    #[tokio::test]
    async fn test_rejects_unknown_level() {
        let mut log = ConsoleLog::new();
        let descriptor =
            WorkerDescriptor::new("log1", "Log", ConsoleLog::IMPORT_PATH).with_metadata("level", "loud");
        assert!(log.init(&descriptor).await.is_err());
    }
}
