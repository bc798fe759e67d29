//! Server configuration loaded from environment variables.
//!
//! Configuration is read once at startup into an immutable [`AppConfig`] that
//! is handed to each component. Nothing reads the process environment after
//! that.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SMTP_USER` - SMTP authentication username (also the fallback sender)
//! - `SMTP_PASS` - SMTP authentication password
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 4000)
//! - `CAMPAIGN_NAME` - Campaign display name (default: Jamaica We Rise)
//! - `DASHBOARD_URL` - Donor dashboard link included in confirmation emails
//! - `SMTP_HOST` - SMTP server hostname (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_SECURE` - `true` for implicit TLS, otherwise STARTTLS (default: false)
//! - `ALIAS_SUPPORT` - Sender address for support mail (default: `SMTP_USER`)
//! - `ALIAS_DONATE` - Sender address for donation mail
//! - `ALIAS_INFO` - Sender address for general information mail
//! - `REGISTRY_PATH` - Donor registry file (default: ./registry/donors_verified.json)
//! - `REGISTRY_WRITE_POLICY` - `best-effort` or `strict` (default: best-effort)
//! - `ENABLE_IMAP` - `true` enables support inbox polling (default: false)
//! - `IMAP_POLL_INTERVAL_MS` - Inbox poll interval (default: 60000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.0)

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_CAMPAIGN_NAME: &str = "Jamaica We Rise";
const DEFAULT_DASHBOARD_URL: &str = "https://jamaica-we-rise.vercel.app/iascendai-auth.html";
const DEFAULT_REGISTRY_PATH: &str = "./registry/donors_verified.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Campaign identity used in emails and donation events
    pub campaign: CampaignConfig,
    /// Outbound mail transport
    pub smtp: SmtpConfig,
    /// Sender addresses per mail role
    pub senders: SenderAliases,
    /// Donor registry location and write policy
    pub registry: RegistryConfig,
    /// Support inbox polling
    pub inbox: PollerMode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Campaign identity.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Display name, also stamped on every recorded donation
    pub name: String,
    /// Donor dashboard link
    pub dashboard_url: String,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// TLS from the first byte (usually port 465).
    ImplicitTls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
}

/// SMTP transport configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port
    pub port: u16,
    /// Connection security
    pub security: SmtpSecurity,
    /// SMTP authentication username
    pub username: String,
    /// SMTP authentication password
    pub password: SecretString,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Mail roles that may send from a dedicated alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRole {
    Support,
    Donate,
    Info,
}

/// Sender alias addresses. Unset roles fall back to the SMTP username.
#[derive(Debug, Clone, Default)]
pub struct SenderAliases {
    pub support: Option<String>,
    pub donate: Option<String>,
    pub info: Option<String>,
}

impl SenderAliases {
    /// The address to send from for `role`.
    #[must_use]
    pub fn address_for<'a>(&'a self, role: SenderRole, smtp: &'a SmtpConfig) -> &'a str {
        let alias = match role {
            SenderRole::Support => &self.support,
            SenderRole::Donate => &self.donate,
            SenderRole::Info => &self.info,
        };
        alias.as_deref().unwrap_or(&smtp.username)
    }
}

/// What the donation workflow does when the registry write fails after the
/// confirmation email has already gone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordPolicy {
    /// Log the failure and still report success to the caller.
    #[default]
    BestEffort,
    /// Fail the request.
    Strict,
}

impl FromStr for RecordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected 'best-effort' or 'strict', got '{other}'")),
        }
    }
}

/// Donor registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry JSON file
    pub path: PathBuf,
    /// Behaviour on write failure
    pub record_policy: RecordPolicy,
}

/// Support inbox polling mode, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerMode {
    Disabled,
    Enabled { interval: Duration },
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let host = vars.parsed::<IpAddr>("HOST", "127.0.0.1")?;
        let port = vars.parsed::<u16>("PORT", "4000")?;

        let campaign = CampaignConfig::from_vars(&vars)?;
        let smtp = SmtpConfig::from_vars(&vars)?;
        let senders = SenderAliases {
            support: vars.optional("ALIAS_SUPPORT"),
            donate: vars.optional("ALIAS_DONATE"),
            info: vars.optional("ALIAS_INFO"),
        };
        let registry = RegistryConfig {
            path: PathBuf::from(vars.or_default("REGISTRY_PATH", DEFAULT_REGISTRY_PATH)),
            record_policy: vars.parsed("REGISTRY_WRITE_POLICY", "best-effort")?,
        };
        let inbox = poller_mode(&vars);

        Ok(Self {
            host,
            port,
            campaign,
            smtp,
            senders,
            registry,
            inbox,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: vars.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Address confirmation emails are sent from.
    #[must_use]
    pub fn support_sender(&self) -> &str {
        self.senders.address_for(SenderRole::Support, &self.smtp)
    }
}

impl CampaignConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        let dashboard_url = vars.or_default("DASHBOARD_URL", DEFAULT_DASHBOARD_URL);
        url::Url::parse(&dashboard_url).map_err(|e| {
            ConfigError::InvalidEnvVar("DASHBOARD_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            name: vars.or_default("CAMPAIGN_NAME", DEFAULT_CAMPAIGN_NAME),
            dashboard_url,
        })
    }
}

impl SmtpConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        let security = if vars.flag("SMTP_SECURE") {
            SmtpSecurity::ImplicitTls
        } else {
            SmtpSecurity::StartTls
        };

        Ok(Self {
            host: vars.or_default("SMTP_HOST", "smtp.gmail.com"),
            port: vars.parsed("SMTP_PORT", "587")?,
            security,
            username: vars.required("SMTP_USER")?,
            password: SecretString::from(vars.required("SMTP_PASS")?),
        })
    }
}

/// Zero or unparsable intervals fall back to the default.
fn poller_mode<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> PollerMode {
    if !vars.flag("ENABLE_IMAP") {
        return PollerMode::Disabled;
    }

    let interval_ms = vars
        .optional("IMAP_POLL_INTERVAL_MS")
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

    PollerMode::Enabled {
        interval: Duration::from_millis(interval_ms),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the parsing helpers used above.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// `true` only for a case-insensitive "true".
    fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("SMTP_USER".to_string(), "mailer@example.org".to_string()),
            ("SMTP_PASS".to_string(), "app-password".to_string()),
        ]);
        for (key, value) in pairs {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        AppConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:4000");
        assert_eq!(config.campaign.name, "Jamaica We Rise");
        assert_eq!(config.campaign.dashboard_url, DEFAULT_DASHBOARD_URL);
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.security, SmtpSecurity::StartTls);
        assert_eq!(config.smtp.password.expose_secret(), "app-password");
        assert_eq!(config.registry.path, PathBuf::from(DEFAULT_REGISTRY_PATH));
        assert_eq!(config.registry.record_policy, RecordPolicy::BestEffort);
        assert_eq!(config.inbox, PollerMode::Disabled);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_smtp_credentials() {
        let err = AppConfig::from_vars(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "SMTP_USER"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_invalid_dashboard_url() {
        let err = load(&[("DASHBOARD_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "DASHBOARD_URL"));
    }

    #[test]
    fn test_smtp_secure_flag() {
        let config = load(&[("SMTP_SECURE", "TRUE"), ("SMTP_PORT", "465")]).unwrap();
        assert_eq!(config.smtp.security, SmtpSecurity::ImplicitTls);
        assert_eq!(config.smtp.port, 465);

        let config = load(&[("SMTP_SECURE", "yes")]).unwrap();
        assert_eq!(config.smtp.security, SmtpSecurity::StartTls);
    }

    #[test]
    fn test_support_sender_prefers_alias() {
        let config = load(&[]).unwrap();
        assert_eq!(config.support_sender(), "mailer@example.org");

        let config = load(&[("ALIAS_SUPPORT", "support@werise.org")]).unwrap();
        assert_eq!(config.support_sender(), "support@werise.org");
    }

    #[test]
    fn test_sender_roles_fall_back_independently() {
        let config = load(&[("ALIAS_DONATE", "give@werise.org")]).unwrap();
        assert_eq!(
            config.senders.address_for(SenderRole::Donate, &config.smtp),
            "give@werise.org"
        );
        assert_eq!(
            config.senders.address_for(SenderRole::Info, &config.smtp),
            "mailer@example.org"
        );
    }

    #[test]
    fn test_record_policy_parsing() {
        let config = load(&[("REGISTRY_WRITE_POLICY", "Strict")]).unwrap();
        assert_eq!(config.registry.record_policy, RecordPolicy::Strict);

        let err = load(&[("REGISTRY_WRITE_POLICY", "sometimes")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "REGISTRY_WRITE_POLICY"));
    }

    #[test]
    fn test_poller_mode() {
        let config = load(&[("ENABLE_IMAP", "True")]).unwrap();
        assert_eq!(
            config.inbox,
            PollerMode::Enabled {
                interval: Duration::from_millis(60_000)
            }
        );

        let config = load(&[("ENABLE_IMAP", "true"), ("IMAP_POLL_INTERVAL_MS", "5000")]).unwrap();
        assert_eq!(
            config.inbox,
            PollerMode::Enabled {
                interval: Duration::from_secs(5)
            }
        );

        let config = load(&[("ENABLE_IMAP", "true"), ("IMAP_POLL_INTERVAL_MS", "0")]).unwrap();
        assert_eq!(
            config.inbox,
            PollerMode::Enabled {
                interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            }
        );

        let config = load(&[("ENABLE_IMAP", "false"), ("IMAP_POLL_INTERVAL_MS", "5000")]).unwrap();
        assert_eq!(config.inbox, PollerMode::Disabled);
    }

    #[test]
    fn test_smtp_config_debug_redacts_password() {
        let config = load(&[("SMTP_PASS", "super_secret_smtp_password")]).unwrap();

        let debug_output = format!("{:?}", config.smtp);

        assert!(debug_output.contains("smtp.gmail.com"));
        assert!(debug_output.contains("mailer@example.org"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }
}
