//! Donor upsert service.
//!
//! Wraps the registry's pure upsert in a load-modify-save cycle against the
//! registry store.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use we_rise_core::{NewDonation, UpsertOutcome};

use crate::registry::{RegistryError, RegistryStore};

/// Records donations in the donor registry.
pub struct DonorService {
    store: RegistryStore,
    campaign: String,
    // Serializes read-modify-write cycles within this process. Other
    // processes writing the same file are not covered.
    write_lock: Mutex<()>,
}

impl DonorService {
    #[must_use]
    pub fn new(store: RegistryStore, campaign: impl Into<String>) -> Self {
        Self {
            store,
            campaign: campaign.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Find-or-create the donor and append this donation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the updated registry cannot be saved.
    /// Unreadable or corrupt registries are reset by the store and never
    /// reported here.
    #[instrument(skip_all, fields(email = %donation.email, soulmark = %donation.soulmark))]
    pub async fn upsert(&self, donation: &NewDonation) -> Result<UpsertOutcome, RegistryError> {
        let _guard = self.write_lock.lock().await;

        let mut registry = self.store.load().await;
        let outcome = registry.record_donation(donation, &self.campaign, Utc::now());
        self.store.save(&registry).await?;

        info!(
            created = outcome.created,
            donations = outcome.donation_count,
            "Donation recorded"
        );
        Ok(outcome)
    }
}
