//! Core types for the donor registry.

pub mod donor;
pub mod email;
pub mod registry;
pub mod soulmark;

pub use donor::{DonationEvent, Donor, NewDonation};
pub use email::{Email, EmailError};
pub use registry::{Registry, UpsertOutcome};
pub use soulmark::{Soulmark, SoulmarkError, mask_soulmark};
