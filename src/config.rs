//! Client configuration

use std::time::Duration;

/// Runtime environment the client reports to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: upload failures fall back to a synthetic success
    Development,
    /// Production: failures surface to the caller
    Production,
}

impl Environment {
    /// Lowercase name used in the User-Agent string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, no trailing slash (default: http://localhost:3000)
    pub base_url: String,
    /// App name reported in the User-Agent (default: "bangsamsir")
    pub app_name: String,
    /// Platform segment of the User-Agent (default: the current OS)
    pub platform: String,
    /// Runtime environment (default: Development)
    pub environment: Environment,
    /// Deadline for ordinary JSON requests (default: 15 s)
    pub request_timeout: Duration,
    /// Deadline for photo uploads (default: 30 s)
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            app_name: "bangsamsir".to_string(),
            platform: std::env::consts::OS.to_string(),
            environment: Environment::Development,
            request_timeout: Duration::from_secs(15),
            upload_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("BANGSAMSIR_API_URL") {
            config.base_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("BANGSAMSIR_ENV") {
            if val.eq_ignore_ascii_case("production") {
                config.environment = Environment::Production;
            }
        }

        if let Ok(val) = std::env::var("BANGSAMSIR_PLATFORM") {
            if !val.is_empty() {
                config.platform = val;
            }
        }

        if let Ok(val) = std::env::var("BANGSAMSIR_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("BANGSAMSIR_UPLOAD_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.upload_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// `app/platform/environment` User-Agent value sent with every request
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{}/{}",
            self.app_name,
            self.platform,
            self.environment.as_str()
        )
    }

    /// True when upload fallbacks may synthesize a success
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
