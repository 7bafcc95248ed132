//! Pre-deployment checks run by the `deploy-check` binary.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEPLOY_CONFIG: &str = "deploy.toml";
pub const REQUIRED_KEYS: [&str; 3] = ["service", "port", "public_base_url"];

/// Top-level keys of `deploy.toml`; other keys and tables are ignored.
#[derive(Debug, Deserialize)]
struct DeployConfig {
    service: Option<String>,
    port: Option<u16>,
    public_base_url: Option<String>,
}

impl DeployConfig {
    /// Non-empty value of a required key.
    fn value(&self, key: &str) -> Option<String> {
        match key {
            "service" => self.service.clone(),
            "port" => self.port.map(|p| p.to_string()),
            "public_base_url" => self.public_base_url.clone(),
            _ => None,
        }
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Failed,
}

impl CheckStatus {
    fn marker(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warning => "warn",
            CheckStatus::Failed => "FAIL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckItem {
    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub root: PathBuf,
    pub items: Vec<CheckItem>,
}

impl DeployReport {
    pub fn passed(&self) -> bool {
        self.items.iter().all(|i| i.status != CheckStatus::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckItem> {
        self.items.iter().filter(|i| i.status == CheckStatus::Failed)
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "deployment check for {}", self.root.display())?;
        for item in &self.items {
            writeln!(f, "  [{:>4}] {}: {}", item.status.marker(), item.name, item.detail)?;
        }
        let verdict = if self.passed() { "ready to deploy" } else { "NOT ready to deploy" };
        write!(f, "{verdict}")
    }
}

/// Inspect `root` for everything a deployment needs.
pub fn check(root: &Path) -> DeployReport {
    let mut items = Vec::new();

    items.push(if root.join("Cargo.toml").is_file() {
        CheckItem::new("Cargo.toml", CheckStatus::Ok, "present")
    } else {
        CheckItem::new("Cargo.toml", CheckStatus::Failed, "missing")
    });

    items.push(match [".env.example", ".env"].iter().find(|name| root.join(name).is_file()) {
        Some(name) => CheckItem::new("environment template", CheckStatus::Ok, format!("{name} present")),
        None => CheckItem::new(
            "environment template",
            CheckStatus::Warning,
            "neither .env.example nor .env found",
        ),
    });

    let config_path = root.join(DEPLOY_CONFIG);
    match std::fs::read_to_string(&config_path) {
        Ok(text) => match toml::from_str::<DeployConfig>(&text) {
            Ok(config) => {
                items.push(CheckItem::new(DEPLOY_CONFIG, CheckStatus::Ok, "present"));
                for key in REQUIRED_KEYS {
                    items.push(match config.value(key) {
                        Some(value) => CheckItem::new(format!("{DEPLOY_CONFIG}: {key}"), CheckStatus::Ok, value),
                        None => {
                            CheckItem::new(format!("{DEPLOY_CONFIG}: {key}"), CheckStatus::Failed, "missing or empty")
                        }
                    });
                }
            }
            Err(e) => {
                let reason = e.message().to_string();
                items.push(CheckItem::new(DEPLOY_CONFIG, CheckStatus::Failed, format!("invalid: {reason}")));
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            items.push(CheckItem::new(DEPLOY_CONFIG, CheckStatus::Failed, "missing"));
        }
        Err(e) => {
            items.push(CheckItem::new(DEPLOY_CONFIG, CheckStatus::Failed, format!("unreadable: {e}")));
        }
    }

    DeployReport {
        root: root.to_path_buf(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, name: &str, contents: &str) {
        std::fs::write(root.join(name), contents).unwrap();
    }

    #[test]
    fn complete_project_passes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[workspace]\n");
        write(dir.path(), ".env.example", "PORT=3000\n");
        write(
            dir.path(),
            DEPLOY_CONFIG,
            "# deploy\nservice = \"mall-portal\"\nport = 3000\npublic_base_url = 'https://mall.example.com'\n",
        );

        let report = check(dir.path());
        assert!(report.passed(), "{report}");
        assert!(report.items.iter().any(|i| i.detail == "https://mall.example.com"));
    }

    #[test]
    fn missing_deploy_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[workspace]\n");

        let report = check(dir.path());
        assert!(!report.passed());
        let failures: Vec<_> = report.failures().map(|i| i.name.as_str()).collect();
        assert_eq!(failures, [DEPLOY_CONFIG]);
        assert!(report.items.iter().any(|i| i.status == CheckStatus::Warning));
    }

    #[test]
    fn empty_or_sectioned_keys_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "");
        write(dir.path(), ".env", "");
        write(dir.path(), DEPLOY_CONFIG, "service = \"\"\nport = 3000\n[extra]\npublic_base_url = \"x\"\n");

        let report = check(dir.path());
        let failures: Vec<_> = report.failures().map(|i| i.name.clone()).collect();
        assert_eq!(
            failures,
            [format!("{DEPLOY_CONFIG}: service"), format!("{DEPLOY_CONFIG}: public_base_url")]
        );
    }

    #[test]
    fn hashes_inside_quoted_values_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "");
        write(
            dir.path(),
            DEPLOY_CONFIG,
            "service = \"mall#portal\" # name\nport = 8080\npublic_base_url = \"https://mall.example.com/#/home\"\n",
        );

        let report = check(dir.path());
        assert!(report.passed(), "{report}");
        let details: Vec<_> = report.items.iter().map(|i| i.detail.as_str()).collect();
        assert!(details.contains(&"mall#portal"));
        assert!(details.contains(&"8080"));
        assert!(details.contains(&"https://mall.example.com/#/home"));
    }

    #[test]
    fn malformed_config_fails_as_a_whole() {
        for contents in [
            "service = \"unterminated\nport = 3000\npublic_base_url = \"x\"\n",
            "service = \"s\"\nport = 3000\npublic_base_url = [1,\n",
            "service = \"s\"\nport = \"not a number\"\npublic_base_url = \"x\"\n",
        ] {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "Cargo.toml", "");
            write(dir.path(), DEPLOY_CONFIG, contents);

            let report = check(dir.path());
            let failures: Vec<_> = report.failures().collect();
            assert_eq!(failures.len(), 1, "{report}");
            assert_eq!(failures[0].name, DEPLOY_CONFIG);
            assert!(failures[0].detail.starts_with("invalid: "));
        }
    }
}
