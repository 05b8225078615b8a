use std::any::Any;

use anyhow::Result;
use async_trait::async_trait;

use crate::descriptor::WorkerDescriptor;
use crate::registry::RegisteredWorker;
use crate::settings::ServerSettings;

/// Capability contract every pluggable worker satisfies.
///
/// Type-specific operations (cache get/set, token verify, ...) live on the
/// concrete type and are reached through [`Worker::as_any`].
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Configure the worker from its descriptor. Runs once, before the
    /// worker becomes visible to lookups.
    async fn init(&mut self, descriptor: &WorkerDescriptor) -> Result<()>;

    /// Resolve sibling workers. Every worker of the batch has completed
    /// `init` by the time this is called.
    async fn after_init(&self, workers: &[RegisteredWorker], server: &ServerSettings) -> Result<()> {
        let _ = (workers, server);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

/// Zero-argument constructor submitted at compile time for an import path
pub struct WorkerFactory {
    pub import_path: &'static str,
    pub construct: fn() -> Box<dyn Worker>,
}

inventory::collect!(WorkerFactory);
