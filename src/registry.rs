//! WorkerRegistry - the process-wide set of live workers
//!
//! Registration runs in two phases. Phase 1 constructs each enabled
//! descriptor through the [`WorkerCatalog`] and awaits its `init`, in
//! descriptor order. Phase 2 awaits `after_init` on every registered worker,
//! in registration order, so a worker can resolve any sibling during its
//! `after_init`. Both phases are strictly sequential.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::catalog::WorkerCatalog;
use crate::descriptor::{WorkerDescriptor, WorkerType};
use crate::error::{HiveError, Result};
use crate::settings::ServerSettings;
use crate::traits::{Worker, WorkerLookup};

/// Lifecycle of a worker instance. There are no backward transitions.
///
/// `Unconstructed` and `Constructed` only exist while a descriptor is inside
/// the pipeline; a [`RegisteredWorker`] is always `Initialized` or `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkerState {
    Unconstructed,
    Constructed,
    /// `init` succeeded; visible to lookups
    Initialized,
    /// `after_init` succeeded
    Active,
}

/// A descriptor paired with its live instance
#[derive(Clone)]
pub struct RegisteredWorker {
    pub descriptor: Arc<WorkerDescriptor>,
    pub instance: Arc<dyn Worker>,
    state: Arc<Mutex<WorkerState>>,
}

impl RegisteredWorker {
    fn new(descriptor: WorkerDescriptor, instance: Box<dyn Worker>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            instance: Arc::from(instance),
            state: Arc::new(Mutex::new(WorkerState::Initialized)),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn worker_type(&self) -> &WorkerType {
        &self.descriptor.worker_type
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// The concrete instance, if it is a `T`
    pub fn downcast<T: Worker>(&self) -> Option<&T> {
        self.instance.as_any().downcast_ref::<T>()
    }

    fn activate(&self) {
        *self.state.lock() = WorkerState::Active;
    }
}

impl fmt::Debug for RegisteredWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredWorker")
            .field("name", &self.descriptor.name)
            .field("worker_type", &self.descriptor.worker_type)
            .field("default", &self.descriptor.default)
            .field("state", &self.state())
            .finish()
    }
}

/// Outcome of registering a single descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// Same name already registered
    Duplicate,
    Disabled,
}

pub struct WorkerRegistry {
    catalog: WorkerCatalog,
    server: RwLock<ServerSettings>,
    workers: RwLock<Vec<RegisteredWorker>>,
    pipeline: tokio::sync::Mutex<()>,
}

impl WorkerRegistry {
    pub fn new(catalog: WorkerCatalog, server: ServerSettings) -> Self {
        Self {
            catalog,
            server: RwLock::new(server),
            workers: RwLock::new(Vec::new()),
            pipeline: tokio::sync::Mutex::new(()),
        }
    }

    pub fn server(&self) -> ServerSettings {
        self.server.read().clone()
    }

    /// Settings handed to subsequent `after_init` calls
    pub fn set_server(&self, server: ServerSettings) {
        *self.server.write() = server;
    }

    pub fn catalog(&self) -> &WorkerCatalog {
        &self.catalog
    }

    /// Drop every registered worker. Safe on an empty registry.
    pub fn clear_workers(&self) {
        let mut workers = self.workers.write();
        if !workers.is_empty() {
            debug!(count = workers.len(), "Clearing worker registry");
        }
        workers.clear();
    }

    /// Snapshot of all workers in registration order
    pub fn all_workers(&self) -> Vec<RegisteredWorker> {
        self.workers.read().clone()
    }

    pub fn get_worker(
        &self,
        worker_type: &WorkerType,
        name: Option<&str>,
    ) -> Option<RegisteredWorker> {
        self.workers.read().get_worker(worker_type, name)
    }

    pub fn workers_by_type(&self, worker_type: &WorkerType) -> Vec<RegisteredWorker> {
        self.workers.read().workers_by_type(worker_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workers.read().iter().any(|w| w.descriptor.name == name)
    }

    pub fn len(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().is_empty()
    }

    /// Register a list of descriptors (startup path).
    ///
    /// All `init` calls complete before any `after_init` runs; `after_init`
    /// then runs over every registered worker, including those from earlier
    /// calls. The first failure aborts the call. Workers registered before
    /// the failure stay registered.
    pub async fn initialize_batch(
        &self,
        descriptors: impl IntoIterator<Item = WorkerDescriptor>,
    ) -> Result<()> {
        let _pipeline = self.pipeline.lock().await;

        let mut registered = 0usize;
        for descriptor in descriptors {
            if self.register_instance(descriptor).await? == Registration::Registered {
                registered += 1;
            }
        }

        self.run_after_init(self.all_workers()).await?;
        info!(registered = registered, total = self.len(), "Worker batch initialized");
        Ok(())
    }

    /// Register one descriptor and run its `after_init` right away, against
    /// the workers registered so far (incremental path).
    pub async fn register_one(&self, descriptor: WorkerDescriptor) -> Result<Registration> {
        let _pipeline = self.pipeline.lock().await;

        let name = descriptor.name.clone();
        let outcome = self.register_instance(descriptor).await?;
        if outcome == Registration::Registered {
            let worker = self
                .workers
                .read()
                .iter()
                .find(|w| w.descriptor.name == name)
                .cloned();
            self.run_after_init(worker.into_iter().collect()).await?;
        }
        Ok(outcome)
    }

    /// Register one descriptor, leaving `after_init` to the next
    /// [`initialize_batch`](Self::initialize_batch).
    pub async fn register_deferred(&self, descriptor: WorkerDescriptor) -> Result<Registration> {
        let _pipeline = self.pipeline.lock().await;
        self.register_instance(descriptor).await
    }

    pub async fn push_worker(
        &self,
        descriptor: WorkerDescriptor,
        run_after_init_immediately: bool,
    ) -> Result<Registration> {
        if run_after_init_immediately {
            self.register_one(descriptor).await
        } else {
            self.register_deferred(descriptor).await
        }
    }

    /// Phase 1 for a single descriptor: validate, construct, `init`, insert.
    async fn register_instance(&self, descriptor: WorkerDescriptor) -> Result<Registration> {
        if !descriptor.enabled {
            debug!(worker_type = %descriptor.worker_type, name = %descriptor.name, "Skipping disabled worker");
            return Ok(Registration::Disabled);
        }
        if self.contains(&descriptor.name) {
            debug!(worker_type = %descriptor.worker_type, name = %descriptor.name, "Worker already registered");
            return Ok(Registration::Duplicate);
        }
        validate(&descriptor)?;

        let mut instance = self.catalog.construct(&descriptor.import_path).ok_or_else(|| {
            HiveError::init(
                &descriptor.worker_type,
                &descriptor.name,
                HiveError::ModuleNotFound {
                    import_path: descriptor.import_path.clone(),
                },
            )
        })?;

        instance
            .init(&descriptor)
            .await
            .map_err(|e| HiveError::init(&descriptor.worker_type, &descriptor.name, e))?;

        let mut workers = self.workers.write();
        if descriptor.default
            && workers
                .iter()
                .any(|w| w.descriptor.default && w.descriptor.worker_type == descriptor.worker_type)
        {
            warn!(
                worker_type = %descriptor.worker_type,
                name = %descriptor.name,
                "A default worker of this type is already registered; lookups keep the first"
            );
        }
        info!(
            worker_type = %descriptor.worker_type,
            name = %descriptor.name,
            import_path = %descriptor.import_path,
            "Worker registered"
        );
        workers.push(RegisteredWorker::new(descriptor, instance));
        Ok(Registration::Registered)
    }

    /// Phase 2 over `targets`, each receiving a fresh snapshot of the registry.
    async fn run_after_init(&self, targets: Vec<RegisteredWorker>) -> Result<()> {
        let server = self.server();
        for worker in targets {
            let siblings = self.all_workers();
            worker
                .instance
                .after_init(&siblings, &server)
                .await
                .map_err(|e| HiveError::after_init(worker.worker_type(), worker.name(), e))?;
            worker.activate();
        }
        Ok(())
    }
}

impl WorkerLookup for WorkerRegistry {
    fn get_worker(&self, worker_type: &WorkerType, name: Option<&str>) -> Option<RegisteredWorker> {
        WorkerRegistry::get_worker(self, worker_type, name)
    }

    fn workers_by_type(&self, worker_type: &WorkerType) -> Vec<RegisteredWorker> {
        WorkerRegistry::workers_by_type(self, worker_type)
    }
}

impl fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &*self.workers.read())
            .finish()
    }
}

fn validate(descriptor: &WorkerDescriptor) -> Result<()> {
    let invalid = |reason: &str| HiveError::InvalidDescriptor {
        worker_type: descriptor.worker_type.clone(),
        name: descriptor.name.clone(),
        reason: reason.to_string(),
    };

    if descriptor.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    if descriptor.import_path.trim().is_empty() {
        return Err(invalid("importPath is required"));
    }
    Ok(())
}
