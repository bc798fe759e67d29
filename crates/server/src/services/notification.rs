//! Donation confirmation emails.
//!
//! One email per confirmed donation, sent from the campaign's support
//! address. The soulmark is only ever included in masked form.

use std::sync::Arc;

use askama::Template;
use lettre::message::Mailbox;
use tracing::instrument;
use we_rise_core::NewDonation;

use super::email::{MailError, MailTransport, OutgoingMail, mailbox};
use crate::config::AppConfig;

/// Subject line of the confirmation email.
pub const CONFIRMATION_SUBJECT: &str = "Thank You — Your Donation Has Been Received";

/// Currency shown when the donation did not specify one.
const DISPLAY_CURRENCY: &str = "USD";

/// HTML template for the donation confirmation.
#[derive(Template)]
#[template(path = "email/donation_confirmation.html")]
struct DonationConfirmationHtml<'a> {
    donor_name: Option<&'a str>,
    partial_soulmark: &'a str,
    amount_line: Option<&'a str>,
    dashboard_url: &'a str,
    campaign: &'a str,
}

/// Plain text template for the donation confirmation.
#[derive(Template)]
#[template(path = "email/donation_confirmation.txt")]
struct DonationConfirmationText<'a> {
    donor_name: Option<&'a str>,
    partial_soulmark: &'a str,
    amount_line: Option<&'a str>,
    dashboard_url: &'a str,
    campaign: &'a str,
}

/// Composes and sends donation confirmations.
#[derive(Clone)]
pub struct NotificationService {
    transport: Arc<dyn MailTransport>,
    sender: Mailbox,
    campaign: String,
    dashboard_url: String,
}

impl NotificationService {
    /// Create the service, resolving the support sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::InvalidAddress`] if the support sender address is
    /// not a valid email address.
    pub fn new(config: &AppConfig, transport: Arc<dyn MailTransport>) -> Result<Self, MailError> {
        let sender = mailbox(Some(config.campaign.name.as_str()), config.support_sender())?;

        Ok(Self {
            transport,
            sender,
            campaign: config.campaign.name.clone(),
            dashboard_url: config.campaign.dashboard_url.clone(),
        })
    }

    /// Send the confirmation for `donation`. One attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be composed or the transport fails.
    #[instrument(skip_all, fields(to = %donation.email, soulmark = %donation.soulmark))]
    pub async fn send_donation_confirmation(&self, donation: &NewDonation) -> Result<(), MailError> {
        let mail = self.compose(donation)?;
        self.transport.send(mail).await
    }

    /// Build the confirmation email without sending it.
    ///
    /// # Errors
    ///
    /// Returns error if the recipient is invalid or a template fails to render.
    pub fn compose(&self, donation: &NewDonation) -> Result<OutgoingMail, MailError> {
        let partial_soulmark = donation.soulmark.masked();
        let amount_line = amount_line(donation);
        let donor_name = donation
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let html_body = DonationConfirmationHtml {
            donor_name,
            partial_soulmark: &partial_soulmark,
            amount_line: amount_line.as_deref(),
            dashboard_url: &self.dashboard_url,
            campaign: &self.campaign,
        }
        .render()?;
        let text_body = DonationConfirmationText {
            donor_name,
            partial_soulmark: &partial_soulmark,
            amount_line: amount_line.as_deref(),
            dashboard_url: &self.dashboard_url,
            campaign: &self.campaign,
        }
        .render()?;

        Ok(OutgoingMail {
            from: self.sender.clone(),
            to: mailbox(None, donation.email.as_str())?,
            subject: CONFIRMATION_SUBJECT.to_string(),
            text_body,
            html_body,
        })
    }
}

/// `"<amount> <currency>"` when an amount was given.
fn amount_line(donation: &NewDonation) -> Option<String> {
    let amount = donation.amount?;
    let currency = donation
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DISPLAY_CURRENCY);
    Some(format!("{amount} {currency}"))
}
