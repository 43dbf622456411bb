//! Application configuration.
//!
//! Read from `~/.config/tubelift/config.json`; every field is optional and
//! command-line flags take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tubelift_protocol::PrivacyStatus;
use tubelift_protocol::constants::{
    DEFAULT_BASE_URL, DEFAULT_CATEGORY_ID, DEFAULT_REQUEST_TIMEOUT, MAX_RETRIES,
};
use tubelift_transfer::{DEFAULT_CHUNK_SIZE, RetryPolicy, normalize_chunk_size};
use tubelift_upload::{DriverConfig, MetadataTemplate};

use crate::cli::Cli;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub access_token: String,
    pub api_base_url: String,
    pub chunk_size: usize,
    pub max_retries: u32,
    pub request_timeout_secs: u64,

    // Metadata defaults.
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: MAX_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            title: "Untitled".into(),
            description: String::new(),
            keywords: String::new(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy_status: PrivacyStatus::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location when `None`.
    ///
    /// A missing file yields defaults. So does a malformed one, with a warning.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Overrides file values with the flags that were given.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(token) = &cli.access_token {
            self.access_token = token.clone();
        }
        if let Some(size) = cli.chunk_size {
            self.chunk_size = size;
        }
        if let Some(retries) = cli.max_retries {
            self.max_retries = retries;
        }
        if let Some(title) = &cli.title {
            self.title = title.clone();
        }
        if let Some(description) = &cli.description {
            self.description = description.clone();
        }
        if let Some(keywords) = &cli.keywords {
            self.keywords = keywords.clone();
        }
        if let Some(category) = &cli.category {
            self.category_id = category.clone();
        }
        if let Some(privacy) = cli.privacy_status {
            self.privacy_status = privacy;
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            chunk_size: normalize_chunk_size(self.chunk_size),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            },
        }
    }

    pub fn template(&self) -> MetadataTemplate {
        MetadataTemplate {
            title: self.title.clone(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            category_id: self.category_id.clone(),
            privacy_status: self.privacy_status,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn default_config_path() -> PathBuf {
    config_base_dir().join("tubelift").join("config.json")
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("none.json"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"access_token":"tok","chunk_size":1048576,"privacy_status":"private"}"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.privacy_status, PrivacyStatus::Private);
        assert_eq!(config.max_retries, MAX_RETRIES);
        assert_eq!(config.category_id, "22");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let mut config = AppConfig {
            access_token: "from-file".into(),
            title: "File title".into(),
            ..AppConfig::default()
        };
        let cli = Cli::try_parse_from([
            "tubelift",
            "--file",
            "a.mp4",
            "--access-token",
            "from-flag",
            "--keywords",
            "a,b",
            "--max-retries",
            "3",
        ])
        .unwrap();

        config.apply_cli(&cli);
        assert_eq!(config.access_token, "from-flag");
        assert_eq!(config.title, "File title");
        assert_eq!(config.keywords, "a,b");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn driver_config_normalizes_chunk_size() {
        let config = AppConfig {
            chunk_size: 1_000_000,
            max_retries: 4,
            ..AppConfig::default()
        };
        let driver = config.driver_config();
        assert_eq!(driver.chunk_size, 1_048_576);
        assert_eq!(driver.retry.max_retries, 4);
        assert_eq!(driver.retry.retriable_statuses, vec![500, 502, 503, 504]);
    }

    #[test]
    fn template_carries_metadata() {
        let config = AppConfig {
            title: "Trip".into(),
            keywords: "x, y".into(),
            ..AppConfig::default()
        };
        let template = config.template();
        assert_eq!(template.title, "Trip");
        assert_eq!(template.keywords, "x, y");
        assert_eq!(template.privacy_status, PrivacyStatus::Unlisted);
    }

    #[test]
    fn default_path_is_under_tubelift() {
        let path = default_config_path();
        assert!(path.ends_with("tubelift/config.json") || path.ends_with("tubelift\\config.json"));
    }
}
