//! Configuration types for background replacement and candidate sourcing

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};

/// Environment variable holding the removal service API key
pub const REMOVEBG_API_KEY_ENV: &str = "REMOVEBG_API_KEY";
/// Environment variable holding the primary provider access key
pub const UNSPLASH_ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";
/// Environment variable holding the secondary provider API key
pub const PIXABAY_API_KEY_ENV: &str = "PIXABAY_API_KEY";

/// Default number of candidates requested per page
pub const DEFAULT_PAGE_SIZE: usize = 12;
/// Largest page the providers accept without pagination tricks
pub const MAX_PAGE_SIZE: usize = 30;

/// Remote background-removal service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalServiceConfig {
    /// Endpoint receiving the multipart upload
    pub endpoint: String,
    /// Value of the `X-Api-Key` header
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Output size requested from the service
    pub size: String,
}

impl Default for RemovalServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.remove.bg/v1.0/removebg".to_string(),
            api_key: None,
            size: "auto".to_string(),
        }
    }
}

/// Stock photo provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Search endpoint of the provider
    pub endpoint: String,
    /// Provider credential
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Orientation filter sent with every query
    pub orientation: String,
}

impl ProviderConfig {
    /// Primary provider defaults
    #[must_use]
    pub fn unsplash() -> Self {
        Self {
            endpoint: "https://api.unsplash.com/photos/random".to_string(),
            api_key: None,
            orientation: "squarish".to_string(),
        }
    }

    /// Secondary provider defaults
    #[must_use]
    pub fn pixabay() -> Self {
        Self {
            endpoint: "https://pixabay.com/api/".to_string(),
            api_key: None,
            orientation: "horizontal".to_string(),
        }
    }
}

/// Configuration for a studio session and its remote collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Background removal service
    pub removal: RemovalServiceConfig,

    /// Primary candidate provider
    pub primary: ProviderConfig,

    /// Fallback candidate provider
    pub secondary: ProviderConfig,

    /// Candidates requested per page (1-30)
    pub page_size: usize,

    /// Timeout applied to every HTTP request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            removal: RemovalServiceConfig::default(),
            primary: ProviderConfig::unsplash(),
            secondary: ProviderConfig::pixabay(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 30,
        }
    }
}

impl StudioConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backdrop_studio::StudioConfig;
    ///
    /// let config = StudioConfig::builder()
    ///     .page_size(24)
    ///     .removal_api_key("secret")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.page_size, 24);
    /// ```
    #[must_use]
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Build a configuration from the process environment
    ///
    /// Reads `REMOVEBG_API_KEY`, `UNSPLASH_ACCESS_KEY` and `PIXABAY_API_KEY`.
    /// Missing variables leave the corresponding key unset; requests made
    /// without a key fail at the provider with an authorization status.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration using a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        config.removal.api_key = non_empty(REMOVEBG_API_KEY_ENV);
        config.primary.api_key = non_empty(UNSPLASH_ACCESS_KEY_ENV);
        config.secondary.api_key = non_empty(PIXABAY_API_KEY_ENV);
        config
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Page size outside 1-30
    /// - Zero request timeout
    /// - Empty endpoint URLs
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(StudioError::config_value_error(
                "page size",
                self.page_size,
                "1-30",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(StudioError::config_value_error(
                "request timeout",
                self.request_timeout_secs,
                "1 or more seconds",
            ));
        }

        for (name, endpoint) in [
            ("removal endpoint", &self.removal.endpoint),
            ("primary provider endpoint", &self.primary.endpoint),
            ("secondary provider endpoint", &self.secondary.endpoint),
        ] {
            if endpoint.trim().is_empty() {
                return Err(StudioError::invalid_config(format!("{} cannot be empty", name)));
            }
        }

        Ok(())
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for `StudioConfig`
#[derive(Debug, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    /// Start from an existing configuration, e.g. one read from the environment
    #[must_use]
    pub fn from_config(config: StudioConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn removal_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.removal.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn removal_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.removal.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn primary_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.primary.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn primary_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.primary.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn secondary_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.secondary.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn secondary_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.secondary.endpoint = endpoint.into();
        self
    }

    /// Set candidates per page
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set request timeout in seconds
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any `StudioConfig::validate` failure
    pub fn build(self) -> Result<StudioConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
