//! Startup configuration read from the environment

use crate::dispatch::ReplyFormat;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/chat";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for the counseling service
#[derive(Debug, Clone, PartialEq)]
pub struct CounselConfig {
    /// Respond endpoint the dispatcher posts to
    pub api_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub reply_format: ReplyFormat,
    /// Initial persona name; the counselor when unset
    pub persona: Option<String>,
}

impl Default for CounselConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reply_format: ReplyFormat::default(),
            persona: None,
        }
    }
}

impl CounselConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: present("COUNSEL_API_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.api_url),
            port: parse_or("COUNSEL_PORT", present("COUNSEL_PORT"), defaults.port),
            request_timeout: Duration::from_secs(
                parse_or(
                    "COUNSEL_REQUEST_TIMEOUT_SECS",
                    present("COUNSEL_REQUEST_TIMEOUT_SECS"),
                    defaults.request_timeout.as_secs(),
                )
                .max(1),
            ),
            reply_format: parse_or(
                "COUNSEL_REPLY_FORMAT",
                present("COUNSEL_REPLY_FORMAT"),
                defaults.reply_format,
            ),
            persona: present("COUNSEL_PERSONA").map(|v| v.trim().to_string()),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> T {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
            default
        }
    }
}
