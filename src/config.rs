use crate::errors::ConfigError;
use reqwest::Url;
use std::{env, time::Duration};
use tracing::warn;

pub const API_URL_VAR: &str = "DASHBOARD_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "DASHBOARD_REQUEST_TIMEOUT_SECS";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";

/// Where the reporting API lives and how long a single request may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    /// `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            request_timeout: None,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&url)?;

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(0) => {}
                Ok(secs) => config.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!("ignoring {REQUEST_TIMEOUT_VAR}={raw:?}: not a whole number of seconds"),
            }
        }

        Ok(config)
    }
}

/// Endpoint paths are relative (`api/...`), so the base must end in `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&normalized).map_err(|err| ConfigError {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError {
            value: raw.to_string(),
            reason: "expected an http(s) base url".to_string(),
        });
    }

    Ok(url)
}
