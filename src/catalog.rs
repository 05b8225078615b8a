use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::traits::{Worker, WorkerFactory};

pub type WorkerConstructor = Arc<dyn Fn() -> Box<dyn Worker> + Send + Sync>;

/// Import path to constructor map; the seam where workers plug in.
#[derive(Clone, Default)]
pub struct WorkerCatalog {
    constructors: HashMap<String, WorkerConstructor>,
}

impl WorkerCatalog {
    pub fn new() -> WorkerCatalog {
        WorkerCatalog::default()
    }

    /// Every factory submitted with `inventory::submit!` in the binary.
    pub fn from_inventory() -> WorkerCatalog {
        let mut catalog = WorkerCatalog::new();
        for factory in inventory::iter::<WorkerFactory> {
            let construct = factory.construct;
            catalog.register(factory.import_path, move || construct());
        }
        catalog
    }

    /// Add or replace the constructor for `import_path`.
    pub fn register<F>(&mut self, import_path: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Worker> + Send + Sync + 'static,
    {
        let import_path = import_path.into();
        if self
            .constructors
            .insert(import_path.clone(), Arc::new(constructor))
            .is_some()
        {
            debug!(import_path = %import_path, "Replaced worker constructor");
        }
        self
    }

    pub fn construct(&self, import_path: &str) -> Option<Box<dyn Worker>> {
        self.constructors.get(import_path).map(|construct| construct())
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.constructors.contains_key(import_path)
    }

    pub fn import_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for WorkerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerCatalog")
            .field("import_paths", &self.import_paths())
            .finish()
    }
}
