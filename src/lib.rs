//! Hive worker runtime
//!
//! Loads typed, named worker instances from configuration, initializes them
//! in two phases and serves type+name lookups for the process lifetime.
//!
//! ```ignore
//! let catalog = WorkerCatalog::from_inventory();
//! let registry = WorkerRegistry::new(catalog, ServerSettings::default());
//! registry.initialize_batch(settings.workers).await?;
//!
//! let log = registry.get_worker(&WorkerType::Log, None);
//! ```

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod server;
pub mod settings;
pub mod traits;
pub mod workers;

pub use catalog::WorkerCatalog;
pub use descriptor::{WorkerDescriptor, WorkerType};
pub use error::{HiveError, Result};
pub use registry::{RegisteredWorker, Registration, WorkerRegistry, WorkerState};
pub use server::{HiveServer, ServerMode};
pub use settings::{HiveSettings, ServerSettings};
pub use traits::{Worker, WorkerFactory, WorkerLookup};
