//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the client.

use serde::{Deserialize, Serialize};

/// Main configuration settings for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target service endpoints
    pub endpoints: EndpointSettings,
    /// HTTP transport configuration
    pub http: HttpSettings,
    /// Retry/backoff configuration
    pub retry: RetrySettings,
    /// Warmup flow configuration
    pub warmup: WarmupSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Site and API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Base URL of the HTML site (landing page, login)
    pub site_url: String,
    /// Base URL of the service API host
    pub api_url: String,
    /// Path fragment that identifies a redirect-to-login, used by the
    /// default session-expiry policy
    pub login_path: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Retry and backoff configuration for transient failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum attempts per request (first try included)
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds, doubled per attempt
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds
    pub max_delay_ms: u64,
}

/// Warmup flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupSettings {
    /// Maximum redirect hops followed within one warmup step
    pub max_redirects: u32,
    /// Token names that must be present for the session to become ready
    pub required_tokens: Vec<String>,
    /// Body substrings that identify a session-invalidated response
    pub session_expired_markers: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            site_url: "https://instantdomainsearch.com".to_string(),
            api_url: "https://api.instantdomainsearch.com".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
        }
    }
}

impl Default for WarmupSettings {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            required_tokens: vec!["csrf".to_string()],
            session_expired_markers: vec!["session expired".to_string()],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: EndpointSettings::default(),
            http: HttpSettings::default(),
            retry: RetrySettings::default(),
            warmup: WarmupSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::config(format!("invalid config file {:?}: {}", path, e)))
    }

    /// Load settings from environment variables on top of defaults
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Overlay environment variables onto these settings
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(site_url) = std::env::var("IDS_SITE_URL") {
            self.endpoints.site_url = site_url;
        }

        if let Ok(api_url) = std::env::var("IDS_API_URL") {
            self.endpoints.api_url = api_url;
        }

        if let Ok(timeout) = std::env::var("IDS_TIMEOUT_SECS") {
            self.http.timeout_secs = timeout
                .parse()
                .map_err(|e| crate::Error::config(format!("invalid IDS_TIMEOUT_SECS: {}", e)))?;
        }

        if let Ok(attempts) = std::env::var("IDS_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = attempts.parse().map_err(|e| {
                crate::Error::config(format!("invalid IDS_RETRY_MAX_ATTEMPTS: {}", e))
            })?;
        }

        if let Ok(redirects) = std::env::var("IDS_WARMUP_MAX_REDIRECTS") {
            self.warmup.max_redirects = redirects.parse().map_err(|e| {
                crate::Error::config(format!("invalid IDS_WARMUP_MAX_REDIRECTS: {}", e))
            })?;
        }

        Ok(self)
    }

    /// Validate settings consistency
    pub fn validate(&self) -> crate::Result<()> {
        url::Url::parse(&self.endpoints.site_url)
            .map_err(|e| crate::Error::config(format!("invalid site_url: {}", e)))?;
        url::Url::parse(&self.endpoints.api_url)
            .map_err(|e| crate::Error::config(format!("invalid api_url: {}", e)))?;

        if self.http.timeout_secs == 0 {
            return Err(crate::Error::config("timeout_secs must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be at least 1"));
        }
        if self.warmup.max_redirects == 0 {
            return Err(crate::Error::config("max_redirects must be at least 1"));
        }
        if self.warmup.required_tokens.is_empty() {
            return Err(crate::Error::config(
                "at least one required token must be configured",
            ));
        }

        Ok(())
    }

    /// Per-attempt request timeout
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.endpoints.site_url, "https://instantdomainsearch.com");
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.warmup.max_redirects, 5);
        assert_eq!(settings.warmup.required_tokens, vec!["csrf".to_string()]);
    }

    #[test]
    fn test_settings_validate_defaults() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut settings = Settings::default();
        settings.endpoints.api_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut settings = Settings::default();
        settings.warmup.max_redirects = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());
    }
}
