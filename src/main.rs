use anyhow::{Context, Result};
use tracing::info;

use hive::{HiveServer, HiveSettings, WorkerCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = HiveSettings::from_env().context("failed to load hive settings")?;
    let catalog = WorkerCatalog::from_inventory();
    info!(import_paths = ?catalog.import_paths(), "Worker catalog loaded");

    let server = HiveServer::start(settings, catalog).await?;
    for worker in server.registry().all_workers() {
        info!(
            worker_type = %worker.worker_type(),
            name = %worker.name(),
            default = worker.descriptor.default,
            state = ?worker.state(),
            "Worker"
        );
    }
    info!(
        server = %server.settings().server.name,
        port = server.settings().server.port,
        mode = ?server.mode(),
        "Hive is ready. Press Ctrl-C to exit."
    );

    tokio::signal::ctrl_c().await?;
    info!("Goodbye!");
    Ok(())
}
