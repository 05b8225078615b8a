//! Server bootstrap around the worker registry.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::catalog::WorkerCatalog;
use crate::error::Result;
use crate::registry::WorkerRegistry;
use crate::settings::HiveSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Normal,
    /// Configured workers failed to start; only core workers are registered
    Admin,
}

pub struct HiveServer {
    settings: HiveSettings,
    registry: Arc<WorkerRegistry>,
    mode: ServerMode,
}

impl HiveServer {
    /// Register core workers, then the configured workers.
    ///
    /// A failing core worker is fatal. A failing configured worker drops the
    /// server into [`ServerMode::Admin`] with only core workers registered.
    pub async fn start(settings: HiveSettings, catalog: WorkerCatalog) -> Result<HiveServer> {
        let registry = Arc::new(WorkerRegistry::new(catalog, settings.server.clone()));
        let mode = bring_up(&registry, &settings).await?;
        Ok(HiveServer {
            settings,
            registry,
            mode,
        })
    }

    /// Clear the registry and rerun startup from `settings`.
    ///
    /// Consumers keep their handle from [`registry`](Self::registry). If a
    /// core worker fails the server is left in admin mode and the error is
    /// returned.
    pub async fn rebuild(&mut self, settings: HiveSettings) -> Result<ServerMode> {
        info!(server = %settings.server.name, "Rebuilding hive server");
        self.registry.clear_workers();
        self.registry.set_server(settings.server.clone());

        let outcome = bring_up(&self.registry, &settings).await;
        self.settings = settings;
        match outcome {
            Ok(mode) => {
                self.mode = mode;
                Ok(mode)
            }
            Err(e) => {
                error!(error = %e, "Rebuild failed; server left in admin mode");
                let mut server = self.settings.server.clone();
                server.admin_mode = true;
                self.registry.set_server(server);
                self.mode = ServerMode::Admin;
                Err(e)
            }
        }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &HiveSettings {
        &self.settings
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }
}

async fn bring_up(registry: &WorkerRegistry, settings: &HiveSettings) -> Result<ServerMode> {
    register_core(registry, settings).await?;

    if settings.server.admin_mode {
        warn!("adminMode set; configured workers are not started");
        return Ok(ServerMode::Admin);
    }

    match registry.initialize_batch(settings.workers.iter().cloned()).await {
        Ok(()) => {
            info!(workers = registry.len(), "Hive server ready");
            Ok(ServerMode::Normal)
        }
        Err(e) => {
            error!(error = %e, "Worker initialization failed; starting in admin mode");
            let mut server = settings.server.clone();
            server.admin_mode = true;
            registry.clear_workers();
            registry.set_server(server);
            // core workers are constructed and initialized again
            register_core(registry, settings).await?;
            Ok(ServerMode::Admin)
        }
    }
}

async fn register_core(registry: &WorkerRegistry, settings: &HiveSettings) -> Result<()> {
    for descriptor in &settings.core_workers {
        registry.register_one(descriptor.clone()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{WorkerDescriptor, WorkerType};
    use crate::workers::{ConsoleLog, MemoryCache};

    fn settings() -> HiveSettings {
        HiveSettings {
            core_workers: vec![WorkerDescriptor::new("core-log", "Log", ConsoleLog::IMPORT_PATH)],
            workers: vec![
                WorkerDescriptor::new("cache1", "Cache", MemoryCache::IMPORT_PATH)
                    .with_default()
                    .with_metadata("ttl", 5000),
            ],
            ..HiveSettings::default()
        }
    }

    #[tokio::test]
    async fn test_start_normal() {
        let server = HiveServer::start(settings(), WorkerCatalog::from_inventory())
            .await
            .unwrap();
        assert_eq!(server.mode(), ServerMode::Normal);

        let registry = server.registry();
        let names: Vec<_> = registry
            .all_workers()
            .iter()
            .map(|w| w.name().to_string())
            .collect();
        assert_eq!(names, vec!["core-log", "cache1"]);

        let cache = registry.get_worker(&WorkerType::Cache, None).unwrap();
        assert_eq!(
            cache.downcast::<MemoryCache>().unwrap().log_worker_name().as_deref(),
            Some("core-log")
        );
    }

    #[tokio::test]
    async fn test_failed_worker_falls_back_to_admin() {
        let mut settings = settings();
        settings.workers[0].metadata.clear();

        let server = HiveServer::start(settings, WorkerCatalog::from_inventory())
            .await
            .unwrap();
        assert_eq!(server.mode(), ServerMode::Admin);
        assert!(server.registry().server().admin_mode);
        assert_eq!(server.registry().len(), 1);
        assert!(server.registry().get_worker(&WorkerType::Cache, None).is_none());
    }

    #[tokio::test]
    async fn test_failed_core_worker_is_fatal() {
        let mut settings = settings();
        settings.core_workers[0].import_path = String::new();
        assert!(HiveServer::start(settings, WorkerCatalog::from_inventory()).await.is_err());
    }

    #[tokio::test]
    async fn test_admin_mode_setting_skips_workers() {
        let mut settings = settings();
        settings.server.admin_mode = true;
        let server = HiveServer::start(settings, WorkerCatalog::from_inventory())
            .await
            .unwrap();
        assert_eq!(server.mode(), ServerMode::Admin);
        assert_eq!(server.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_recovers_from_admin() {
        let mut broken = settings();
        broken.workers[0].metadata.clear();
        let mut server = HiveServer::start(broken, WorkerCatalog::from_inventory())
            .await
            .unwrap();
        assert_eq!(server.mode(), ServerMode::Admin);

        let mode = server.rebuild(settings()).await.unwrap();
        assert_eq!(mode, ServerMode::Normal);
        assert_eq!(server.registry().len(), 2);
        assert!(!server.registry().server().admin_mode);
    }

    #[tokio::test]
    async fn test_rebuild_keeps_registry_handle() {
        let mut server = HiveServer::start(settings(), WorkerCatalog::from_inventory())
            .await
            .unwrap();
        let consumer = Arc::clone(server.registry());

        let mut next = settings();
        next.workers.push(
            WorkerDescriptor::new("token", "Token", crate::workers::SharedSecretToken::IMPORT_PATH)
                .with_metadata("tokens", serde_json::json!({ "s3cret": "svc" })),
        );
        server.rebuild(next).await.unwrap();

        assert!(Arc::ptr_eq(&consumer, server.registry()));
        assert_eq!(consumer.len(), 3);
        assert!(consumer.get_worker(&WorkerType::Token, None).is_some());
    }

    #[tokio::test]
    async fn test_admin_fallback_keeps_registry_handle() {
        let mut server = HiveServer::start(settings(), WorkerCatalog::from_inventory())
            .await
            .unwrap();
        let consumer = Arc::clone(server.registry());

        let mut broken = settings();
        broken.workers[0].metadata.clear();
        let mode = server.rebuild(broken).await.unwrap();

        assert_eq!(mode, ServerMode::Admin);
        assert_eq!(consumer.len(), 1);
        assert!(consumer.server().admin_mode);
        assert!(consumer.contains("core-log"));
    }

    #[tokio::test]
    async fn test_rebuild_with_failing_core_worker_enters_admin() {
        let mut server = HiveServer::start(settings(), WorkerCatalog::from_inventory())
            .await
            .unwrap();
        assert_eq!(server.mode(), ServerMode::Normal);

        let mut broken = settings();
        broken.core_workers[0].import_path = String::new();
        assert!(server.rebuild(broken).await.is_err());

        assert_eq!(server.mode(), ServerMode::Admin);
        assert!(server.registry().server().admin_mode);
        assert!(server.registry().is_empty());
        assert!(server.settings().core_workers[0].import_path.is_empty());

        // a good rebuild still recovers
        assert_eq!(server.rebuild(settings()).await.unwrap(), ServerMode::Normal);
        assert_eq!(server.registry().len(), 2);
    }
}
