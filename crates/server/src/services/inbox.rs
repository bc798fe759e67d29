//! Support inbox polling.
//!
//! The poller is selected at startup from [`PollerMode`]. When disabled it
//! only logs; when enabled it runs [`InboxPoller::poll_once`] on a fixed
//! timer in its own task, independent of request handling. It never touches
//! the donor registry.
//!
//! No IMAP client is wired in: [`UnconfiguredInbox`] stands in for the mail
//! source and reports no messages.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::PollerMode;

/// Errors from an inbox source.
#[derive(Debug, Error)]
pub enum InboxError {
    /// The source could not be reached or queried.
    #[error("inbox fetch failed: {0}")]
    Fetch(String),
}

/// A message pulled from the support inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    /// Mailbox-assigned id, increasing with arrival order.
    pub uid: u32,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Capability to fetch inbox messages.
#[async_trait]
pub trait InboxSource: Send + Sync {
    /// Messages with a uid greater than `after_uid` (all messages if `None`).
    async fn fetch_since(&self, after_uid: Option<u32>) -> Result<Vec<InboxMessage>, InboxError>;
}

/// Inbox source used when no IMAP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredInbox;

#[async_trait]
impl InboxSource for UnconfiguredInbox {
    async fn fetch_since(&self, _after_uid: Option<u32>) -> Result<Vec<InboxMessage>, InboxError> {
        warn!("IMAP disabled, skipping inbox polling");
        Ok(Vec::new())
    }
}

/// Polls the support inbox for new messages.
pub struct InboxPoller {
    mode: PollerMode,
    source: Arc<dyn InboxSource>,
    last_seen_uid: Mutex<Option<u32>>,
}

impl InboxPoller {
    #[must_use]
    pub fn new(mode: PollerMode, source: Arc<dyn InboxSource>) -> Self {
        Self {
            mode,
            source,
            last_seen_uid: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> PollerMode {
        self.mode
    }

    /// Fetch and process messages that arrived since the previous poll.
    ///
    /// Returns the number of messages processed. Calling again with no new
    /// mail processes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError`] if the source fails. The watermark is left
    /// unchanged so the same messages are retried on the next poll.
    pub async fn poll_once(&self) -> Result<usize, InboxError> {
        let mut last_seen = self.last_seen_uid.lock().await;

        let watermark = *last_seen;

        let mut messages = self.source.fetch_since(watermark).await?;
        messages.retain(|message| watermark.is_none_or(|seen| message.uid > seen));
        messages.sort_by_key(|message| message.uid);

        for message in &messages {
            info!(
                uid = message.uid,
                from = %message.from,
                subject = %message.subject,
                "Support inbox message received"
            );
            *last_seen = Some(message.uid);
        }

        Ok(messages.len())
    }

    /// Start polling according to the configured mode.
    ///
    /// Returns `None` when polling is disabled. When enabled, the first poll
    /// runs immediately and then once per interval.
    pub fn spawn(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let PollerMode::Enabled { interval } = self.mode else {
            info!("IMAP disabled (ENABLE_IMAP=false), skipping support inbox polling");
            return None;
        };

        info!(
            interval_secs = interval.as_secs_f64(),
            "Support inbox polling enabled"
        );

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_once().await {
                    error!(error = %e, "Support inbox poll failed");
                }
            }
        }))
    }
}
