//! Settings document for a hive server
//!
//! ```json
//! {
//!   "server": { "name": "hive", "port": 4000 },
//!   "coreWorkers": [],
//!   "workers": [
//!     { "name": "log1", "type": "Log", "default": true, "importPath": "hive/log/console" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::descriptor::WorkerDescriptor;
use crate::error::{HiveError, Result};

pub const SETTINGS_PATH_VAR: &str = "HIVE_SETTINGS";
pub const PORT_VAR: &str = "HIVE_PORT";
pub const DEFAULT_SETTINGS_PATH: &str = "hive.json";
pub const DEFAULT_PORT: u16 = 4000;

fn default_server_name() -> String {
    "hive".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Server-level configuration handed to every worker's `after_init`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub admin_mode: bool,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            port: DEFAULT_PORT,
            admin_mode: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveSettings {
    #[serde(default)]
    pub server: ServerSettings,
    /// Registered ahead of `workers`, each with an immediate `after_init`
    #[serde(default)]
    pub core_workers: Vec<WorkerDescriptor>,
    #[serde(default)]
    pub workers: Vec<WorkerDescriptor>,
}

impl HiveSettings {
    pub fn from_json(json: &str) -> Result<HiveSettings> {
        let settings: HiveSettings = serde_json::from_str(json)?;
        settings.check()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<HiveSettings> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading hive settings");
        let json = std::fs::read_to_string(path)?;
        HiveSettings::from_json(&json)
    }

    /// Load from `HIVE_SETTINGS` (default `hive.json`), applying `HIVE_PORT`.
    pub fn from_env() -> Result<HiveSettings> {
        let path = std::env::var(SETTINGS_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
        let mut settings = HiveSettings::load(&path)?;

        if let Ok(port) = std::env::var(PORT_VAR) {
            settings.server.port = port
                .parse()
                .map_err(|_| HiveError::Settings(format!("{PORT_VAR} is not a port: '{port}'")))?;
        }

        Ok(settings)
    }

    /// Structural checks only. Duplicate names are legal (the registry keeps
    /// the first), so they are reported but not rejected.
    fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for descriptor in self.core_workers.iter().chain(&self.workers) {
            if descriptor.name.trim().is_empty() {
                return Err(HiveError::Settings(format!(
                    "{} worker with importPath '{}' has no name",
                    descriptor.worker_type, descriptor.import_path
                )));
            }
            if descriptor.enabled && !seen.insert(descriptor.name.as_str()) {
                warn!(
                    name = %descriptor.name,
                    "Worker name appears more than once; only the first will be registered"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WorkerType;
    use std::io::Write;

    const SETTINGS: &str = r#"{
        "server": { "name": "test-hive", "port": 8080, "region": "eu" },
        "coreWorkers": [
            { "name": "core-log", "type": "Log", "importPath": "hive/log/console" }
        ],
        "workers": [
            { "name": "cache1", "type": "Cache", "default": true,
              "importPath": "hive/cache/memory", "metadata": { "ttl": 5000 } }
        ]
    }"#;

    #[test]
    fn test_parse_settings() {
        let settings = HiveSettings::from_json(SETTINGS).unwrap();
        assert_eq!(settings.server.name, "test-hive");
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.admin_mode);
        assert_eq!(settings.server.extra["region"], "eu");
        assert_eq!(settings.core_workers.len(), 1);
        assert_eq!(settings.workers[0].worker_type, WorkerType::Cache);
        assert_eq!(settings.workers[0].metadata["ttl"], 5000);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = HiveSettings::from_json("{}").unwrap();
        assert_eq!(settings.server, ServerSettings::default());
        assert!(settings.workers.is_empty());
    }

    #[test]
    fn test_nameless_worker_rejected() {
        let err = HiveSettings::from_json(
            r#"{ "workers": [ { "name": " ", "type": "Log", "importPath": "x" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, HiveError::Settings(_)));
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let settings = HiveSettings::from_json(
            r#"{ "workers": [
                { "name": "a", "type": "Log", "importPath": "x" },
                { "name": "a", "type": "Log", "importPath": "y" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(settings.workers.len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SETTINGS.as_bytes()).unwrap();

        let settings = HiveSettings::load(file.path()).unwrap();
        assert_eq!(settings.server.name, "test-hive");
    }

    #[test]
    fn test_load_missing_file() {
        let err = HiveSettings::load("/definitely/not/here/hive.json").unwrap_err();
        assert!(matches!(err, HiveError::Io(_)));
    }
}
