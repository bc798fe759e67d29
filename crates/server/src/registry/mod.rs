//! Flat-file donor registry.
//!
//! The registry is one JSON array holding every donor. Each mutation is a
//! full read-modify-write of the document:
//!
//! - `load` never fails. A missing document is created as `[]`; an empty,
//!   unreadable or unparseable one is logged and reset to `[]`. The registry
//!   is a secondary log of donations that were already verified upstream, so
//!   availability wins over preserving a corrupt file.
//! - `save` reports failure as [`RegistryError::WriteFailed`] so the caller
//!   can decide whether a lost record is acceptable.
//!
//! There is no locking across processes. Two processes sharing a registry
//! file can overwrite each other's updates.

pub mod backend;

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};
use we_rise_core::Registry;

pub use backend::{FileBackend, RegistryBackend};

const EMPTY_REGISTRY: &str = "[]";

/// Errors surfaced by the registry store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry document could not be written.
    #[error("failed to write registry {location}: {source}")]
    WriteFailed {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The registry document could not be read.
    #[error("failed to read registry {location}: {source}")]
    ReadFailed {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The registry could not be serialized.
    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads and saves the donor registry through a [`RegistryBackend`].
#[derive(Clone)]
pub struct RegistryStore {
    backend: Arc<dyn RegistryBackend>,
}

impl RegistryStore {
    #[must_use]
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a file on disk.
    #[must_use]
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Load the registry, resetting the document to `[]` when it is missing
    /// or corrupt.
    pub async fn load(&self) -> Registry {
        let contents = match self.backend.read().await {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                debug!(location = %self.location(), "Registry missing, creating empty registry");
                self.reset().await;
                return Registry::new();
            }
            Err(e) => {
                error!(location = %self.location(), error = %e, "Error reading registry, resetting to []");
                self.reset().await;
                return Registry::new();
            }
        };

        if contents.trim().is_empty() {
            warn!(location = %self.location(), "Registry empty, resetting to []");
            self.reset().await;
            return Registry::new();
        }

        match serde_json::from_str::<Registry>(&contents) {
            Ok(registry) => registry,
            Err(e) => {
                error!(location = %self.location(), error = %e, "Error parsing registry, resetting to []");
                self.reset().await;
                Registry::new()
            }
        }
    }

    /// Write the whole registry back, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WriteFailed`] if the backend rejects the write.
    pub async fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        let contents = serde_json::to_string_pretty(registry)?;
        self.write(&contents).await.inspect_err(|e| {
            error!(error = %e, "Error saving registry");
        })
    }

    /// Check that the registry can be read, without self-healing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReadFailed`] if the backend cannot be read.
    pub async fn probe(&self) -> Result<(), RegistryError> {
        self.backend
            .read()
            .await
            .map(|_| ())
            .map_err(|source| RegistryError::ReadFailed {
                location: self.location(),
                source,
            })
    }

    async fn reset(&self) {
        if let Err(e) = self.write(EMPTY_REGISTRY).await {
            error!(error = %e, "Error resetting registry");
        }
    }

    async fn write(&self, contents: &str) -> Result<(), RegistryError> {
        self.backend
            .write(contents)
            .await
            .map_err(|source| RegistryError::WriteFailed {
                location: self.location(),
                source,
            })
    }
}
