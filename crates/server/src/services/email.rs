//! Outbound mail transport.
//!
//! Services hand a fully composed [`OutgoingMail`] to a [`MailTransport`].
//! Production uses SMTP via lettre; tests substitute their own transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{SmtpConfig, SmtpSecurity};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A composed email with plain text and HTML bodies.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Capability to deliver one email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempt delivery once.
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Parse an address into a mailbox, optionally with a display name.
///
/// # Errors
///
/// Returns [`MailError::InvalidAddress`] if `address` is not a valid address.
pub fn mailbox(display_name: Option<&str>, address: &str) -> Result<Mailbox, MailError> {
    let address = address
        .trim()
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))?;
    Ok(Mailbox::new(display_name.map(str::to_string), address))
}

/// SMTP mail transport.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a new SMTP transport from configuration.
    ///
    /// No connection is made until the first send or [`SmtpMailer::verify`].
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured (e.g. TLS setup fails).
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let builder = match config.security {
            SmtpSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
        };

        let mailer = builder.port(config.port).credentials(credentials).build();

        Ok(Self { mailer })
    }

    /// Open a connection to the relay and check it accepts us.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be reached or rejects the login.
    pub async fn verify(&self) -> Result<bool, SmtpError> {
        self.mailer.test_connection().await
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let to = mail.to.email.to_string();
        let message = Message::builder()
            .from(mail.from)
            .to(mail.to)
            .subject(mail.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html_body),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, subject = %mail.subject, "Email sent successfully");
        Ok(())
    }
}
