//! Client configuration read from the environment.
//!
//! The backend URL always has a default. Optional subsystems (chat, object
//! storage) expose fallible constructors; a missing variable is reported as
//! [`ConfigError::Missing`] and the caller treats the feature as unavailable.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SUPABASE_BUCKET: &str = "media";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Backend REST client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    /// Per-request timeout for backend, storage and chat calls.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `MALL_API_URL` and `MALL_HTTP_TIMEOUT_SECS`, with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = optional_var("MALL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Ok(Self::new(base_url).with_timeout(timeout_from_env()?))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Chat microservice configuration (`CHAT_API_URL`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = optional_var("CHAT_API_URL").ok_or(ConfigError::Missing("CHAT_API_URL"))?;
        Ok(Self {
            timeout: timeout_from_env()?,
            ..Self::new(base_url)
        })
    }
}

/// Cloudinary unsigned-upload configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    /// Overridable for tests; defaults to the public Cloudinary API.
    pub api_base: String,
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub const API_BASE: &'static str = "https://api.cloudinary.com/v1_1";

    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            api_base: Self::API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let cloud_name =
            optional_var("CLOUDINARY_CLOUD_NAME").ok_or(ConfigError::Missing("CLOUDINARY_CLOUD_NAME"))?;
        let upload_preset = optional_var("CLOUDINARY_UPLOAD_PRESET")
            .ok_or(ConfigError::Missing("CLOUDINARY_UPLOAD_PRESET"))?;
        Ok(Self::new(cloud_name, upload_preset).with_timeout(timeout_from_env()?))
    }
}

/// Supabase storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: trim_base(url.into()),
            anon_key: anon_key.into(),
            bucket: DEFAULT_SUPABASE_BUCKET.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let url = optional_var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = optional_var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        let config = Self::new(url, key).with_timeout(timeout_from_env()?);
        Ok(match optional_var("SUPABASE_BUCKET") {
            Some(bucket) => config.with_bucket(bucket),
            None => config,
        })
    }
}

/// Non-empty value of `name`, if set.
pub(crate) fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeout_from_env() -> Result<Duration, ConfigError> {
    match optional_var("MALL_HTTP_TIMEOUT_SECS") {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                var: "MALL_HTTP_TIMEOUT_SECS",
                reason: e.to_string(),
            }),
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_lose_trailing_slashes() {
        assert_eq!(ClientConfig::new("http://x/api/").base_url, "http://x/api");
        assert_eq!(ChatConfig::new(" http://chat:8000// ").base_url, "http://chat:8000");
        assert_eq!(SupabaseConfig::new("https://p.supabase.co/", "k").bucket, "media");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(CloudinaryConfig::new("mall", "preset").timeout, Duration::from_secs(30));
        assert_eq!(SupabaseConfig::new("https://p.supabase.co", "k").timeout, Duration::from_secs(30));
    }
}
