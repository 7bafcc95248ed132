//! Web server configuration

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_SERVICE_NAME: &str = "mall-portal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// Listen port (env: PORT)
    pub port: u16,
    /// development | staging | production (env: APP_ENV)
    pub environment: String,
    /// Name reported by the health endpoint (env: SERVICE_NAME)
    pub service_name: String,
    /// Externally visible base URL (env: PUBLIC_BASE_URL); derived from the
    /// request when unset
    pub public_base_url: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            public_base_url: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            environment: var("APP_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            service_name: var("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            public_base_url: var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<WebConfig> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        WebConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(load(&[]).unwrap(), WebConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("PORT", "8081"),
            ("APP_ENV", "production"),
            ("PUBLIC_BASE_URL", "https://mall.example.com/"),
            ("SERVICE_NAME", " "),
        ])
        .unwrap();

        assert_eq!(config.port, 8081);
        assert!(config.is_production());
        assert_eq!(config.public_base_url.as_deref(), Some("https://mall.example.com"));
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(load(&[("PORT", "http")]).is_err());
    }
}
