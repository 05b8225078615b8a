use std::any::Any;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::descriptor::{WorkerDescriptor, WorkerType};
use crate::registry::RegisteredWorker;
use crate::settings::ServerSettings;
use crate::traits::{Worker, WorkerFactory, WorkerLookup};
use crate::workers::log::{ConsoleLog, LogLevel};

inventory::submit! {
    WorkerFactory {
        import_path: MemoryCache::IMPORT_PATH,
        construct: || Box::new(MemoryCache::new()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoryCacheMetadata {
    /// Milliseconds
    ttl: u64,
    max_entries: Option<usize>,
    /// Named Log worker; the default Log worker otherwise
    log_worker: Option<String>,
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-process key/value cache with per-entry expiry
pub struct MemoryCache {
    name: String,
    ttl: Duration,
    max_entries: Option<usize>,
    log_worker: Option<String>,
    entries: Mutex<HashMap<String, Entry>>,
    log: Mutex<Option<RegisteredWorker>>,
}

impl MemoryCache {
    pub const IMPORT_PATH: &'static str = "hive/cache/memory";

    pub fn new() -> Self {
        MemoryCache {
            name: String::new(),
            ttl: Duration::ZERO,
            max_entries: None,
            log_worker: None,
            entries: Mutex::new(HashMap::new()),
            log: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.set_with_ttl(key, value, self.ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(max) = self.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                entries.retain(|_, entry| entry.expires_at > now);
                if entries.len() >= max {
                    let evicted = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.expires_at)
                        .map(|(key, _)| key.clone());
                    if let Some(evicted) = evicted {
                        entries.remove(&evicted);
                        self.log(LogLevel::Debug, &format!("evicted '{evicted}'"));
                    }
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.lock().remove(key).map(|entry| entry.value)
    }

    /// Live entries; expired ones are purged first
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the Log worker resolved during `after_init`
    pub fn log_worker_name(&self) -> Option<String> {
        self.log.lock().as_ref().map(|w| w.name().to_string())
    }

    fn log(&self, level: LogLevel, message: &str) {
        if let Some(log) = self.log.lock().as_ref() {
            if let Some(console) = log.downcast::<ConsoleLog>() {
                console.write(level, &format!("[{}] {message}", self.name));
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for MemoryCache {
    async fn init(&mut self, descriptor: &WorkerDescriptor) -> Result<()> {
        let metadata: MemoryCacheMetadata = descriptor.metadata_as()?;
        if metadata.ttl == 0 {
            bail!("ttl must be positive");
        }
        if metadata.max_entries == Some(0) {
            bail!("maxEntries must be positive");
        }

        self.name = descriptor.name.clone();
        self.ttl = Duration::from_millis(metadata.ttl);
        self.max_entries = metadata.max_entries;
        self.log_worker = metadata.log_worker;
        Ok(())
    }

    async fn after_init(&self, workers: &[RegisteredWorker], _server: &ServerSettings) -> Result<()> {
        let log = workers
            .get_worker(&WorkerType::Log, self.log_worker.as_deref())
            .ok_or_else(|| anyhow!("Log Worker Not Defined"))?;
        *self.log.lock() = Some(log);
        self.log(LogLevel::Debug, "cache ready");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
