//! Donor records and the donation events they own.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Email, Soulmark};

/// One donor in the registry, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// Identity key, stored as first seen and compared case-insensitively.
    pub email: Email,
    /// Latest non-empty name given for this donor.
    #[serde(default)]
    pub name: String,
    /// Donation history, oldest first. Append-only.
    #[serde(default)]
    pub donations: Vec<DonationEvent>,
    /// First sighting. Never changes after creation.
    pub created_at: DateTime<Utc>,
    /// Time of the most recent donation event.
    pub last_contact: DateTime<Utc>,
}

impl Donor {
    /// Create a donor with no donations.
    #[must_use]
    pub fn new(email: Email, name: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            email,
            name: name.unwrap_or_default().to_string(),
            donations: Vec::new(),
            created_at: now,
            last_contact: now,
        }
    }
}

/// A single recorded contribution, embedded in its [`Donor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationEvent {
    /// Campaign active when the donation was recorded.
    pub campaign: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    /// Persisted exactly as given; no default is filled in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub soulmark: Soulmark,
    /// External payment session reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A validated donation waiting to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    pub email: Email,
    /// `None` when the request carried no name or only whitespace.
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub soulmark: Soulmark,
    pub session_id: Option<String>,
}

impl NewDonation {
    /// Build the event this donation appends to its donor.
    #[must_use]
    pub fn to_event(&self, campaign: &str, now: DateTime<Utc>) -> DonationEvent {
        DonationEvent {
            campaign: campaign.to_string(),
            amount: self.amount,
            currency: self.currency.clone(),
            soulmark: self.soulmark.clone(),
            session_id: self.session_id.clone(),
            timestamp: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_event() -> DonationEvent {
        DonationEvent {
            campaign: "Jamaica We Rise".to_string(),
            amount: Some(Decimal::new(2550, 2)),
            currency: None,
            soulmark: Soulmark::parse("SM1234567890").unwrap(),
            session_id: Some("cs_test_1".to_string()),
            timestamp: "2026-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_event_uses_camel_case_and_omits_absent_fields() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["sessionId"], "cs_test_1");
        assert_eq!(json["soulmark"], "SM1234567890");
        assert_eq!(json["amount"].as_f64(), Some(25.5));
        assert!(json.get("currency").is_none());
    }

    #[test]
    fn test_event_accepts_null_optional_fields() {
        let event: DonationEvent = serde_json::from_str(
            r#"{
                "campaign": "Jamaica We Rise",
                "amount": null,
                "currency": null,
                "soulmark": "SM1234567890",
                "sessionId": null,
                "timestamp": "2026-01-02T03:04:05Z"
            }"#,
        )
        .unwrap();
        assert_eq!(event.amount, None);
        assert_eq!(event.session_id, None);
    }

    #[test]
    fn test_new_donor_defaults() {
        let now = Utc::now();
        let donor = Donor::new(Email::parse("a@x.com").unwrap(), None, now);
        assert_eq!(donor.name, "");
        assert!(donor.donations.is_empty());
        assert_eq!(donor.created_at, now);
        assert_eq!(donor.last_contact, now);
    }
}
