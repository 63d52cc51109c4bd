//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/stash.sqlite"
//!
//! [remote]
//! base_url = "http://localhost:3000"
//! # auth_token = "..."
//! # timeout_secs = 60
//!
//! [capture]
//! default_category = "other"
//!
//! [connectivity]
//! probe_interval_secs = 15
//! probe_timeout_secs = 3
//!
//! [notion]            # optional; the server falls back to its own keys
//! api_key = "secret_..."
//! page_id = "..."
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use stash_core::models::DiscoveryType;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub notion: Option<NotionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Origin of the Stash web app, e.g. `https://stash.example.com`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Per-request timeout. Unset means the network stack decides.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    /// Category used for image captures without `--category`.
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
        }
    }
}

fn default_category() -> String {
    DiscoveryType::Other.as_str().to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectivityConfig {
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    /// Upper bound on one reachability check, independent of `remote.timeout_secs`.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_interval() -> u64 {
    15
}

fn default_probe_timeout() -> u64 {
    3
}

/// Notion page that `stash send` forwards items to.
#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub page_id: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let base_url = config.remote.base_url.trim();
    if base_url.is_empty() {
        anyhow::bail!("remote.base_url must not be empty");
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        anyhow::bail!(
            "remote.base_url must start with http:// or https://, got '{}'",
            base_url
        );
    }

    config
        .capture
        .default_category
        .parse::<DiscoveryType>()
        .map_err(|e| anyhow::anyhow!("capture.default_category: {}", e))?;

    if config.connectivity.probe_interval_secs == 0 {
        anyhow::bail!("connectivity.probe_interval_secs must be > 0");
    }
    if config.connectivity.probe_timeout_secs == 0 {
        anyhow::bail!("connectivity.probe_timeout_secs must be > 0");
    }

    if let Some(notion) = &config.notion {
        if notion.api_key.trim().is_empty() || notion.page_id.trim().is_empty() {
            anyhow::bail!("notion.api_key and notion.page_id must both be set");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
[db]
path = "/tmp/stash.sqlite"

[remote]
base_url = "http://localhost:3000"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.capture.default_category, "other");
        assert_eq!(config.connectivity.probe_interval_secs, 15);
        assert_eq!(config.connectivity.probe_timeout_secs, 3);
        assert!(config.notion.is_none());
        assert!(config.remote.auth_token.is_none());
        assert!(config.remote.timeout_secs.is_none());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = parse(&MINIMAL.replace("http://localhost:3000", "localhost:3000")).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_rejects_unknown_category() {
        let toml_str = format!("{}\n[capture]\ndefault_category = \"movies\"\n", MINIMAL);
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("default_category"));
    }

    #[test]
    fn test_rejects_zero_probe_interval() {
        let toml_str = format!("{}\n[connectivity]\nprobe_interval_secs = 0\n", MINIMAL);
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_rejects_zero_probe_timeout() {
        let toml_str = format!("{}\n[connectivity]\nprobe_timeout_secs = 0\n", MINIMAL);
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("probe_timeout_secs"));
    }

    #[test]
    fn test_notion_section() {
        let toml_str = format!(
            "{}\n[notion]\napi_key = \"secret_abc\"\npage_id = \"page-1\"\n",
            MINIMAL
        );
        let notion = parse(&toml_str).unwrap().notion.unwrap();
        assert_eq!(notion.api_key, "secret_abc");
        assert_eq!(notion.page_id, "page-1");

        let toml_str = format!("{}\n[notion]\napi_key = \"\"\npage_id = \"page-1\"\n", MINIMAL);
        assert!(parse(&toml_str).is_err());
    }
}
