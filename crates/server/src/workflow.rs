//! Donation confirmation workflow.
//!
//! A confirmed donation moves through fixed stages:
//!
//! ```text
//! Received -> Validated -> Notified -> Recorded -> Complete
//! ```
//!
//! The confirmation email is sent before anything is written. If the send
//! fails the donation is never recorded. If recording fails after the email
//! went out, [`RecordPolicy`] decides whether the request still succeeds.

use std::fmt;

use lettre::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, instrument};
use we_rise_core::{Email, NewDonation, Soulmark, UpsertOutcome};

use crate::config::RecordPolicy;
use crate::registry::RegistryError;
use crate::services::{DonorService, MailError, NotificationService};

/// Message returned when a required field is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "email and soulmark are required fields.";

/// Incoming donation confirmation, as posted by the payment flow.
///
/// Every field is optional at this layer; [`DonationRequest::validate`]
/// decides what is actually required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub soulmark: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl DonationRequest {
    /// Check required fields and build a [`NewDonation`].
    ///
    /// Surrounding whitespace is trimmed from `email`, `soulmark` and `name`
    /// before they are stored. A blank `name` is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] if `email` or `soulmark` is
    /// missing or blank, or if `email` is not a plausible address.
    pub fn validate(self) -> Result<NewDonation, WorkflowError> {
        let missing = || WorkflowError::Validation(MISSING_FIELDS_MESSAGE.to_string());

        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let soulmark = self.soulmark.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (Some(email), Some(soulmark)) = (email, soulmark) else {
            return Err(missing());
        };

        let email = Email::parse(email)
            .map_err(|e| WorkflowError::Validation(format!("Invalid email: {e}")))?;
        // The mail transport is stricter than the registry key; reject here
        // what it would refuse after validation.
        email
            .as_str()
            .parse::<Address>()
            .map_err(|e| WorkflowError::Validation(format!("Invalid email: {e}")))?;
        let soulmark = Soulmark::parse(soulmark).map_err(|_| missing())?;

        let name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(NewDonation {
            email,
            name,
            amount: self.amount,
            currency: self.currency,
            soulmark,
            session_id: self.session_id,
        })
    }
}

/// Stages of the donation workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    Received,
    Validated,
    Notified,
    Recorded,
    Complete,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Notified => "notified",
            Self::Recorded => "recorded",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why a donation confirmation did not complete.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request was rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// The confirmation email could not be sent. Nothing was recorded.
    #[error("Failed to send confirmation: {0}")]
    Send(#[source] MailError),

    /// The email went out but the registry write failed.
    #[error("Failed to record donation: {0}")]
    Record(#[source] RegistryError),
}

impl WorkflowError {
    /// The last stage reached before the failure.
    #[must_use]
    pub const fn failed_during(&self) -> WorkflowStage {
        match self {
            Self::Validation(_) => WorkflowStage::Received,
            Self::Send(_) => WorkflowStage::Validated,
            Self::Record(_) => WorkflowStage::Notified,
        }
    }
}

/// Result of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationReceipt {
    /// Registry outcome, or `None` if the write failed under
    /// [`RecordPolicy::BestEffort`].
    pub record: Option<UpsertOutcome>,
}

/// Validates, notifies and records donation confirmations.
pub struct DonationWorkflow {
    notifications: NotificationService,
    donors: DonorService,
    policy: RecordPolicy,
}

impl DonationWorkflow {
    #[must_use]
    pub const fn new(
        notifications: NotificationService,
        donors: DonorService,
        policy: RecordPolicy,
    ) -> Self {
        Self {
            notifications,
            donors,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> RecordPolicy {
        self.policy
    }

    /// Run one donation confirmation end to end.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Validation`] for missing or malformed fields
    /// - [`WorkflowError::Send`] if the email could not be sent
    /// - [`WorkflowError::Record`] if the registry write failed and the
    ///   policy is [`RecordPolicy::Strict`]
    #[instrument(skip_all)]
    pub async fn run(&self, request: DonationRequest) -> Result<DonationReceipt, WorkflowError> {
        let donation = request.validate()?;

        self.notifications
            .send_donation_confirmation(&donation)
            .await
            .map_err(|e| {
                error!(error = %e, stage = %WorkflowStage::Validated, "Confirmation email failed");
                WorkflowError::Send(e)
            })?;

        match self.donors.upsert(&donation).await {
            Ok(outcome) => Ok(DonationReceipt {
                record: Some(outcome),
            }),
            Err(e) => match self.policy {
                RecordPolicy::BestEffort => {
                    error!(
                        error = %e,
                        email = %donation.email,
                        soulmark = %donation.soulmark,
                        "Donation emailed but not recorded"
                    );
                    Ok(DonationReceipt { record: None })
                }
                RecordPolicy::Strict => Err(WorkflowError::Record(e)),
            },
        }
    }
}
