//! Client configuration.
//!
//! This module provides the configuration shared by the HTTP client wrapper,
//! the session store and localization setup: the API base URL override, the
//! request timeout and the default locale.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Environment variable supplying the API base URL override.
pub const API_URL_ENV: &str = "PORTAL_API_URL";

/// Request timeout applied to every request (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Portal client configuration.
///
/// # Fields
///
/// - `api_base_url`: absolute base for API requests; `None` means same-origin relative paths
/// - `timeout`: per-request timeout, `DEFAULT_TIMEOUT` unless overridden
/// - `default_locale`: locale used when none is stored
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// API base URL override (e.g. "https://portal.example.com").
    ///
    /// Empty or unset means requests are sent relative to the page origin.
    pub api_base_url: Option<String>,

    /// Request timeout.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,

    /// Locale used when storage holds no preference.
    pub default_locale: Locale,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            timeout: DEFAULT_TIMEOUT,
            default_locale: Locale::En,
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at the given API base URL.
    ///
    /// # Example
    ///
    /// ```
    /// # use portal_client::ClientConfig;
    /// let config = ClientConfig::new("https://portal.example.com/");
    /// assert_eq!(config.api_base_url.as_deref(), Some("https://portal.example.com"));
    /// ```
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(api_base_url)
    }

    /// Loads the config from the environment.
    ///
    /// `PORTAL_API_URL` is read from the process environment first, then from
    /// the value captured at compile time (see `build.rs`). An unset or blank
    /// value yields same-origin requests.
    pub fn from_env() -> Self {
        let base = std::env::var(API_URL_ENV)
            .ok()
            .or_else(|| option_env!("PORTAL_API_URL").map(str::to_string));

        match base {
            Some(base) => {
                tracing::trace!("Using API base URL from environment: {}", base);
                Self::new(base)
            }
            None => {
                tracing::trace!("No API base URL configured, using same-origin requests");
                Self::default()
            }
        }
    }

    /// Sets the API base URL; blank values clear the override.
    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = normalize_base_url(api_base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the default locale.
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    /// Returns true when requests are sent relative to the page origin.
    pub fn is_same_origin(&self) -> bool {
        self.api_base_url.is_none()
    }
}

fn normalize_base_url(raw: String) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).map_err(ser::Error::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
