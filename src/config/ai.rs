// src/config/ai.rs
use std::fmt;
use std::time::Duration;

use super::{optional, parse_with, required, Lookup};
use crate::error::ConfigError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// `None` = unlimited.
    pub daily_limit: Option<u32>,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub(crate) fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        let api_key = required(lookup, "GEMINI_API_KEY")?;
        let model = optional(lookup, "GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into());
        let base_url =
            optional(lookup, "GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into());
        let daily_limit = parse_with(lookup, "GEMINI_DAILY_LIMIT", |s| {
            s.parse::<u32>().map_err(|e| e.to_string())
        })?
        .filter(|n| *n > 0);
        let timeout_secs = parse_with(lookup, "GEMINI_TIMEOUT_SECONDS", |s| {
            s.parse::<u64>()
                .map_err(|e| e.to_string())
                .and_then(|n| if n == 0 { Err("must be > 0".into()) } else { Ok(n) })
        })?
        .unwrap_or(30);

        Ok(Self {
            api_key,
            model,
            base_url,
            daily_limit,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// Keep the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key_len", &self.api_key.len())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("daily_limit", &self.daily_limit)
            .field("timeout", &self.timeout)
            .finish()
    }
}
