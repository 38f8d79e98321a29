//! Environment-driven configuration.
//!
//! Everything is read once at startup. Missing required variables or values
//! that fail to parse are [`ConfigError`]s and stop the process.

pub mod ai;

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use lettre::message::Mailbox;

use crate::config::ai::GeminiConfig;
use crate::detector::FirstRunPolicy;
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://truthsocial.com/api/v1/accounts/114311127114777163/statuses?exclude_replies=true&with_muted=true";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Trimmed value, with blank treated as unset.
pub(crate) fn optional(lookup: &Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required(lookup: &Lookup<'_>, key: &'static str) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

pub(crate) fn parse_with<T>(
    lookup: &Lookup<'_>,
    key: &'static str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError> {
    match optional(lookup, key) {
        None => Ok(None),
        Some(v) => parse(&v).map(Some).map_err(|reason| ConfigError::Invalid {
            key,
            value: v,
            reason,
        }),
    }
}

pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected true/false, got `{other}`")),
    }
}

fn positive_secs(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be > 0".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn mailbox(s: &str) -> Result<Mailbox, String> {
    s.parse::<Mailbox>().map_err(|e| e.to_string())
}

#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: Mailbox,
    pub app_password: String,
    pub recipient: Mailbox,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender.to_string())
            .field("recipient", &self.recipient.to_string())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api_url: String,
    pub check_interval: Duration,
    pub fetch_timeout: Duration,
    pub focus: Option<String>,
    pub notify_all: bool,
    pub first_run: FirstRunPolicy,
    pub gemini: GeminiConfig,
    pub email: EmailConfig,
    pub metrics_addr: Option<SocketAddr>,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        let api_url = optional(lookup, "API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let check_interval = parse_with(lookup, "CHECK_INTERVAL_SECONDS", positive_secs)?
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);
        let fetch_timeout = parse_with(lookup, "FETCH_TIMEOUT_SECONDS", positive_secs)?
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        let focus = optional(lookup, "FOCUS");
        let notify_all = parse_with(lookup, "NOTIFY_ALL", parse_bool)?.unwrap_or(false);
        let first_run = parse_with(lookup, "FIRST_RUN", |s| s.parse::<FirstRunPolicy>())?
            .unwrap_or_default();
        let metrics_addr = parse_with(lookup, "METRICS_ADDR", |s| {
            s.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;

        let gemini = GeminiConfig::from_lookup(lookup)?;

        let sender = required(lookup, "SENDER_EMAIL")?;
        let app_password = required(lookup, "SENDER_APP_PASSWORD")?;
        let recipient = required(lookup, "RECIPIENT_EMAIL")?;
        let email = EmailConfig {
            smtp_host: optional(lookup, "SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.into()),
            smtp_port: parse_with(lookup, "SMTP_PORT", |s| {
                s.parse::<u16>().map_err(|e| e.to_string())
            })?
            .unwrap_or(DEFAULT_SMTP_PORT),
            sender: mailbox(&sender).map_err(|reason| ConfigError::Invalid {
                key: "SENDER_EMAIL",
                value: sender.clone(),
                reason,
            })?,
            app_password,
            recipient: mailbox(&recipient).map_err(|reason| ConfigError::Invalid {
                key: "RECIPIENT_EMAIL",
                value: recipient.clone(),
                reason,
            })?,
        };

        Ok(Self {
            api_url,
            check_interval: Duration::from_secs(check_interval),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            focus,
            notify_all,
            first_run,
            gemini,
            email,
            metrics_addr,
        })
    }
}
