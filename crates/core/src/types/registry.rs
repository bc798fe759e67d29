//! The donor registry and its upsert algorithm.
//!
//! The registry is an ordered list of donors. Order is insertion order; it
//! carries no meaning but must survive a load/save round trip. Email
//! uniqueness (case-insensitive) is maintained by only ever adding donors
//! through [`Registry::record_donation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Donor, NewDonation};

/// What a call to [`Registry::record_donation`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// `true` if the donor did not exist before this donation.
    pub created: bool,
    /// Number of donations the donor has after this one.
    pub donation_count: usize,
}

/// Ordered collection of donor records, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry(Vec<Donor>);

impl Registry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn donors(&self) -> &[Donor] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find a donor by email, ignoring case.
    #[must_use]
    pub fn find(&self, email: &str) -> Option<&Donor> {
        self.0.iter().find(|donor| donor.email.matches(email))
    }

    /// Find-or-create the donor for `donation.email` and append the donation.
    ///
    /// A new donor is appended at the end of the registry. For new and
    /// existing donors alike, the name is replaced only by a non-empty name,
    /// `last_contact` is set to `now` and the event is appended to the
    /// donor's history. `created_at` is never touched for existing donors.
    pub fn record_donation(
        &mut self,
        donation: &NewDonation,
        campaign: &str,
        now: DateTime<Utc>,
    ) -> UpsertOutcome {
        let name = donation
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let existing = self
            .0
            .iter()
            .position(|donor| donor.email.matches(donation.email.as_str()));

        let (index, created) = match existing {
            Some(index) => (index, false),
            None => {
                self.0.push(Donor::new(donation.email.clone(), name, now));
                (self.0.len() - 1, true)
            }
        };

        let Some(donor) = self.0.get_mut(index) else {
            unreachable!("donor index {index} came from this registry");
        };

        if let Some(name) = name {
            donor.name = name.to_string();
        }
        donor.last_contact = now;
        donor.donations.push(donation.to_event(campaign, now));

        UpsertOutcome {
            created,
            donation_count: donor.donations.len(),
        }
    }
}

impl From<Vec<Donor>> for Registry {
    fn from(donors: Vec<Donor>) -> Self {
        Self(donors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{Email, Soulmark};

    const CAMPAIGN: &str = "Jamaica We Rise";

    fn donation(email: &str, name: Option<&str>) -> NewDonation {
        NewDonation {
            email: Email::parse(email).unwrap(),
            name: name.map(str::to_string),
            amount: Some(Decimal::new(25, 0)),
            currency: Some("JMD".to_string()),
            soulmark: Soulmark::parse("SM1234567890").unwrap(),
            session_id: None,
        }
    }

    #[test]
    fn test_first_donation_creates_donor() {
        let mut registry = Registry::new();
        let now = Utc::now();

        let outcome = registry.record_donation(&donation("d@x.com", Some("Dee")), CAMPAIGN, now);

        assert_eq!(
            outcome,
            UpsertOutcome {
                created: true,
                donation_count: 1
            }
        );
        let donor = registry.find("d@x.com").unwrap();
        assert_eq!(donor.name, "Dee");
        assert_eq!(donor.created_at, now);
        assert_eq!(donor.donations[0].campaign, CAMPAIGN);
        assert_eq!(donor.donations[0].currency.as_deref(), Some("JMD"));
        assert_eq!(donor.donations[0].timestamp, now);
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let mut registry = Registry::new();
        let now = Utc::now();

        registry.record_donation(&donation("A@X.com", None), CAMPAIGN, now);
        let outcome = registry.record_donation(&donation("a@x.com", None), CAMPAIGN, now);

        assert!(!outcome.created);
        assert_eq!(registry.len(), 1);
        // First-seen casing is kept
        assert_eq!(registry.donors()[0].email.as_str(), "A@X.com");
    }

    #[test]
    fn test_history_grows_with_each_donation() {
        let mut registry = Registry::new();
        let now = Utc::now();

        for _ in 0..5 {
            registry.record_donation(&donation("d@x.com", None), CAMPAIGN, now);
        }

        assert_eq!(registry.find("d@x.com").unwrap().donations.len(), 5);
    }

    #[test]
    fn test_empty_name_keeps_stored_name() {
        let mut registry = Registry::new();
        let now = Utc::now();

        registry.record_donation(&donation("d@x.com", Some("Dee")), CAMPAIGN, now);
        registry.record_donation(&donation("d@x.com", Some("   ")), CAMPAIGN, now);
        registry.record_donation(&donation("d@x.com", None), CAMPAIGN, now);

        assert_eq!(registry.find("d@x.com").unwrap().name, "Dee");
    }

    #[test]
    fn test_latest_name_wins() {
        let mut registry = Registry::new();
        let now = Utc::now();

        registry.record_donation(&donation("d@x.com", Some("Dee")), CAMPAIGN, now);
        registry.record_donation(&donation("d@x.com", Some("Deanna")), CAMPAIGN, now);

        assert_eq!(registry.find("d@x.com").unwrap().name, "Deanna");
    }

    #[test]
    fn test_created_at_is_immutable() {
        let mut registry = Registry::new();
        let first = Utc::now();
        let later = first + Duration::minutes(5);

        registry.record_donation(&donation("d@x.com", None), CAMPAIGN, first);
        registry.record_donation(&donation("d@x.com", None), CAMPAIGN, later);

        let donor = registry.find("d@x.com").unwrap();
        assert_eq!(donor.created_at, first);
        assert_eq!(donor.last_contact, later);
    }

    #[test]
    fn test_new_donors_append_and_preserve_order() {
        let mut registry = Registry::new();
        let now = Utc::now();

        registry.record_donation(&donation("b@x.com", None), CAMPAIGN, now);
        registry.record_donation(&donation("a@x.com", None), CAMPAIGN, now);
        registry.record_donation(&donation("b@x.com", None), CAMPAIGN, now);

        let emails: Vec<_> = registry.donors().iter().map(|d| d.email.as_str()).collect();
        assert_eq!(emails, ["b@x.com", "a@x.com"]);
    }

    #[test]
    fn test_serializes_as_bare_array() {
        let registry = Registry::new();
        assert_eq!(serde_json::to_string(&registry).unwrap(), "[]");
    }
}
