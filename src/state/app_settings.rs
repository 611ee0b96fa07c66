use crate::state::backoff::{Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};
use log::warn;
use mcc_api::client::DEFAULT_BASE_URL;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000";
pub const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_REFRESH: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub ws_url: String,
    pub api_url: String,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
    /// `None` keeps retrying forever.
    pub reconnect_max_attempts: Option<u32>,
    pub refresh_interval: Duration,
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.into(),
            api_url: DEFAULT_BASE_URL.into(),
            reconnect_base: DEFAULT_BASE_DELAY,
            reconnect_max: DEFAULT_MAX_DELAY,
            reconnect_max_attempts: None,
            refresh_interval: DEFAULT_REFRESH,
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or unparseable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            ws_url: text("CCLIVE_WS_URL", defaults.ws_url),
            api_url: text("CCLIVE_API_URL", defaults.api_url),
            reconnect_base: parse_or(&lookup, "CCLIVE_RECONNECT_BASE_MS", defaults.reconnect_base, Duration::from_millis),
            reconnect_max: parse_or(&lookup, "CCLIVE_RECONNECT_MAX_MS", defaults.reconnect_max, Duration::from_millis),
            reconnect_max_attempts: parse_or(&lookup, "CCLIVE_RECONNECT_MAX_ATTEMPTS", defaults.reconnect_max_attempts, Some),
            refresh_interval: parse_or(&lookup, "CCLIVE_REFRESH_SECS", defaults.refresh_interval, Duration::from_secs),
            log_filter: text("CCLIVE_LOG", defaults.log_filter),
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.reconnect_base, self.reconnect_max, self.reconnect_max_attempts)
    }
}

fn parse_or<F, T, R>(lookup: &F, key: &str, default: R, wrap: impl Fn(T) -> R) -> R
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => wrap(value),
        Err(_) => {
            warn!("ignoring {key}={raw}: not a valid number");
            default
        }
    }
}
