//! Error types for the hive worker runtime

use crate::descriptor::WorkerType;

/// Boxed error carried from a worker implementation into the pipeline.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while loading settings or registering workers.
///
/// Lookup misses are never reported through this type; the lookup
/// operations return `Option`/empty collections instead.
#[derive(Debug, thiserror::Error)]
pub enum HiveError {
    /// The descriptor itself is unusable (missing import path, empty name)
    #[error("Invalid {worker_type} worker '{name}': {reason}")]
    InvalidDescriptor {
        worker_type: WorkerType,
        name: String,
        reason: String,
    },

    /// No constructor is registered under the import path
    #[error("Worker module not found: '{import_path}'")]
    ModuleNotFound { import_path: String },

    /// Construction or `init` failed
    #[error("Worker Factory Init Error: {worker_type} worker '{name}': {source}")]
    Init {
        worker_type: WorkerType,
        name: String,
        #[source]
        source: BoxError,
    },

    /// `after_init` failed
    #[error("Worker After Init Error: {worker_type} worker '{name}': {source}")]
    AfterInit {
        worker_type: WorkerType,
        name: String,
        #[source]
        source: BoxError,
    },

    /// Settings document is structurally valid JSON but unusable
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for registry and settings operations
pub type Result<T> = std::result::Result<T, HiveError>;

impl HiveError {
    pub(crate) fn init(worker_type: &WorkerType, name: &str, err: impl Into<BoxError>) -> Self {
        HiveError::Init {
            worker_type: worker_type.clone(),
            name: name.to_string(),
            source: err.into(),
        }
    }

    pub(crate) fn after_init(
        worker_type: &WorkerType,
        name: &str,
        err: impl Into<BoxError>,
    ) -> Self {
        HiveError::AfterInit {
            worker_type: worker_type.clone(),
            name: name.to_string(),
            source: err.into(),
        }
    }
}
