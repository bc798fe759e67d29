//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::registry::{FileBackend, RegistryBackend, RegistryStore};
use crate::services::{DonorService, MailError, MailTransport, NotificationService};
use crate::workflow::DonationWorkflow;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the donation workflow and the registry store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    workflow: DonationWorkflow,
    registry: RegistryStore,
}

impl AppState {
    /// Create application state from explicit mail and registry backends.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::InvalidAddress`] if the configured support sender
    /// is not a valid address.
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn MailTransport>,
        backend: Arc<dyn RegistryBackend>,
    ) -> Result<Self, MailError> {
        let registry = RegistryStore::new(backend);
        let notifications = NotificationService::new(&config, transport)?;
        let donors = DonorService::new(registry.clone(), config.campaign.name.clone());
        let workflow = DonationWorkflow::new(notifications, donors, config.registry.record_policy);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                workflow,
                registry,
            }),
        })
    }

    /// Create application state with the registry file from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::InvalidAddress`] if the configured support sender
    /// is not a valid address.
    pub fn with_file_registry(
        config: AppConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, MailError> {
        let backend = Arc::new(FileBackend::new(config.registry.path.clone()));
        Self::new(config, transport, backend)
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the donation workflow.
    #[must_use]
    pub fn workflow(&self) -> &DonationWorkflow {
        &self.inner.workflow
    }

    /// Get a reference to the donor registry store.
    #[must_use]
    pub fn registry(&self) -> &RegistryStore {
        &self.inner.registry
    }
}
