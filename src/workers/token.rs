use std::any::Any;
use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::descriptor::WorkerDescriptor;
use crate::traits::{Worker, WorkerFactory};

inventory::submit! {
    WorkerFactory {
        import_path: SharedSecretToken::IMPORT_PATH,
        construct: || Box::new(SharedSecretToken::new()),
    }
}

#[derive(Debug, Deserialize)]
struct SharedSecretTokenMetadata {
    /// token -> subject
    tokens: HashMap<String, String>,
}

/// Token worker that accepts a fixed set of bearer tokens
pub struct SharedSecretToken {
    tokens: HashMap<String, String>,
}

impl SharedSecretToken {
    pub const IMPORT_PATH: &'static str = "hive/token/shared-secret";

    pub fn new() -> Self {
        SharedSecretToken {
            tokens: HashMap::new(),
        }
    }

    /// Subject the token was issued to.
    ///
    /// The lookup is a plain hash lookup, not a constant-time comparison.
    pub fn verify(&self, token: &str) -> Option<&str> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        self.tokens.get(token).map(String::as_str)
    }
}

impl Default for SharedSecretToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for SharedSecretToken {
    async fn init(&mut self, descriptor: &WorkerDescriptor) -> Result<()> {
        let metadata: SharedSecretTokenMetadata = descriptor.metadata_as()?;
        if metadata.tokens.is_empty() {
            bail!("tokens must not be empty");
        }
        self.tokens = metadata.tokens;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
