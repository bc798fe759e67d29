//! Business logic services.
//!
//! # Services
//!
//! - `donors` - Donor registry upserts
//! - `email` - Mail transport (SMTP in production)
//! - `inbox` - Support inbox poller
//! - `notification` - Donation confirmation emails

pub mod donors;
pub mod email;
pub mod inbox;
pub mod notification;

pub use donors::DonorService;
pub use email::{MailError, MailTransport, OutgoingMail, SmtpMailer};
pub use inbox::{InboxError, InboxMessage, InboxPoller, InboxSource, UnconfiguredInbox};
pub use notification::{CONFIRMATION_SUBJECT, NotificationService};
