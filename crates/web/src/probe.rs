//! HTTP(S) reachability probes run by the `site-probe` binary.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// Subset of the health body the probe reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthSummary {
    pub status: String,
    #[serde(default)]
    pub ssl: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: String,
    pub status: Option<u16>,
    pub health: Option<HealthSummary>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn ok(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| s < 400)
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.ok() { "ok" } else { "FAIL" };
        write!(f, "[{verdict:>4}] {}", self.url)?;
        if let Some(status) = self.status {
            write!(f, " -> {status}")?;
        }
        if let Some(health) = &self.health {
            write!(f, " (status={}", health.status)?;
            if let Some(ssl) = health.ssl {
                write!(f, ", ssl={ssl}")?;
            }
            write!(f, ")")?;
        }
        if let Some(error) = &self.error {
            write!(f, ": {error}")?;
        }
        Ok(())
    }
}

pub struct Prober {
    http: reqwest::Client,
    health_path: String,
}

impl Prober {
    pub fn new(health_path: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let health_path = format!("/{}", health_path.trim_start_matches('/'));
        Ok(Self { http, health_path })
    }

    /// Probe the site root and the health path of `host` over `scheme`.
    pub async fn probe_host(&self, host: &str, scheme: Scheme) -> Vec<ProbeResult> {
        let base = format!("{}://{}", scheme.as_str(), host.trim_end_matches('/'));
        vec![
            self.probe(format!("{base}/"), false).await,
            self.probe(format!("{base}{}", self.health_path), true).await,
        ]
    }

    async fn probe(&self, url: String, expect_health: bool) -> ProbeResult {
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, "probe failed: {e}");
                return ProbeResult {
                    url,
                    status: None,
                    health: None,
                    error: Some(e.to_string()),
                };
            }
        };

        let status = response.status().as_u16();
        if !expect_health || !response.status().is_success() {
            return ProbeResult {
                url,
                status: Some(status),
                health: None,
                error: None,
            };
        }

        match response.json::<HealthSummary>().await {
            Ok(health) if health.status == "healthy" => ProbeResult {
                url,
                status: Some(status),
                health: Some(health),
                error: None,
            },
            Ok(health) => ProbeResult {
                url,
                status: Some(status),
                error: Some(format!("service reports '{}'", health.status)),
                health: Some(health),
            },
            Err(e) => ProbeResult {
                url,
                status: Some(status),
                health: None,
                error: Some(format!("unexpected health body: {e}")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_render_their_reason() {
        let result = ProbeResult {
            url: "https://mall.example.com/api/health".to_string(),
            status: Some(200),
            health: Some(HealthSummary {
                status: "degraded".to_string(),
                ssl: Some(true),
            }),
            error: Some("service reports 'degraded'".to_string()),
        };
        assert!(!result.ok());
        assert_eq!(
            result.to_string(),
            "[FAIL] https://mall.example.com/api/health -> 200 (status=degraded, ssl=true): service reports 'degraded'"
        );
    }

    #[test]
    fn client_errors_fail() {
        let result = ProbeResult {
            url: "http://x/".to_string(),
            status: Some(404),
            health: None,
            error: None,
        };
        assert!(!result.ok());
    }
}
