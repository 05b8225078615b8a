//! Declarative worker records as they appear in configuration.

use std::fmt;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of capability a worker provides.
///
/// The set is open: tags not listed here are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkerType {
    Database,
    Log,
    Cache,
    Token,
    PubSubClient,
    PubSubServer,
    RestEndpointFunction,
    GraphEndpointFunction,
    Feature,
    Encryption,
    FileSystem,
    Config,
    HiveAccount,
    User,
    TaskFunction,
    Other(String),
}

static KNOWN_TYPES: phf::Map<&'static str, WorkerType> = phf::phf_map! {
    "Database" => WorkerType::Database,
    "Log" => WorkerType::Log,
    "Cache" => WorkerType::Cache,
    "Token" => WorkerType::Token,
    "PubSubClient" => WorkerType::PubSubClient,
    "PubSubServer" => WorkerType::PubSubServer,
    "RestEndpointFunction" => WorkerType::RestEndpointFunction,
    "GraphEndpointFunction" => WorkerType::GraphEndpointFunction,
    "Feature" => WorkerType::Feature,
    "Encryption" => WorkerType::Encryption,
    "FileSystem" => WorkerType::FileSystem,
    "Config" => WorkerType::Config,
    "HiveAccount" => WorkerType::HiveAccount,
    "User" => WorkerType::User,
    "TaskFunction" => WorkerType::TaskFunction,
};

impl WorkerType {
    pub fn as_str(&self) -> &str {
        match self {
            WorkerType::Database => "Database",
            WorkerType::Log => "Log",
            WorkerType::Cache => "Cache",
            WorkerType::Token => "Token",
            WorkerType::PubSubClient => "PubSubClient",
            WorkerType::PubSubServer => "PubSubServer",
            WorkerType::RestEndpointFunction => "RestEndpointFunction",
            WorkerType::GraphEndpointFunction => "GraphEndpointFunction",
            WorkerType::Feature => "Feature",
            WorkerType::Encryption => "Encryption",
            WorkerType::FileSystem => "FileSystem",
            WorkerType::Config => "Config",
            WorkerType::HiveAccount => "HiveAccount",
            WorkerType::User => "User",
            WorkerType::TaskFunction => "TaskFunction",
            WorkerType::Other(tag) => tag,
        }
    }
}

impl From<&str> for WorkerType {
    fn from(tag: &str) -> Self {
        KNOWN_TYPES
            .get(tag)
            .cloned()
            .unwrap_or_else(|| WorkerType::Other(tag.to_string()))
    }
}

impl From<String> for WorkerType {
    fn from(tag: String) -> Self {
        match KNOWN_TYPES.get(tag.as_str()) {
            Some(known) => known.clone(),
            None => WorkerType::Other(tag),
        }
    }
}

impl From<WorkerType> for String {
    fn from(worker_type: WorkerType) -> Self {
        match worker_type {
            WorkerType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A worker as described by configuration, before it is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Key into the [`WorkerCatalog`](crate::catalog::WorkerCatalog)
    #[serde(default)]
    pub import_path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub default: bool,
    /// Passed verbatim to the worker's `init`
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WorkerDescriptor {
    pub fn new(
        name: impl Into<String>,
        worker_type: impl Into<WorkerType>,
        import_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            worker_type: worker_type.into(),
            package: None,
            import_path: import_path.into(),
            enabled: true,
            default: false,
            metadata: Map::new(),
        }
    }

    pub fn with_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Deserialize the metadata bag into the shape a worker expects.
    ///
    /// Fails with the serde message (e.g. "missing field `ttl`") wrapped in
    /// the worker's type and name.
    pub fn metadata_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(Value::Object(self.metadata.clone())).with_context(|| {
            format!(
                "invalid metadata for {} worker '{}'",
                self.worker_type, self.name
            )
        })
    }
}
