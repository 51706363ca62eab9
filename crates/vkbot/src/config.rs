use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::client::Client;
use crate::limits;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub long_poll: LongPollConfig,
}

impl Config {
    /// Load a YAML config file. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// ApiConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Community access token. Usually supplied through the environment
    /// rather than written to the file.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            version: default_api_version(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_api_version() -> String {
    limits::API_VERSION.to_string()
}

fn default_base_url() -> String {
    Client::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    Client::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

// ============================================================================
// LongPollConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LongPollConfig {
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Clamped to 1..=90 when applied.
    #[serde(default = "default_wait")]
    pub wait_seconds: u32,
    /// Added to `wait_seconds` to get the fetch request timeout.
    #[serde(default = "default_timeout_margin")]
    pub timeout_margin_seconds: u64,
    /// Pause after a failed cycle before the next attempt.
    #[serde(default = "default_backoff")]
    pub backoff_seconds: u64,
}

impl Default for LongPollConfig {
    fn default() -> Self {
        Self {
            group_id: None,
            wait_seconds: default_wait(),
            timeout_margin_seconds: default_timeout_margin(),
            backoff_seconds: default_backoff(),
        }
    }
}

impl LongPollConfig {
    pub fn timeout_margin(&self) -> Duration {
        Duration::from_secs(self.timeout_margin_seconds)
    }

    /// Never less than one second.
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_seconds.max(1))
    }
}

fn default_wait() -> u32 {
    limits::LONG_POLL_WAIT_DEFAULT
}

fn default_timeout_margin() -> u64 {
    5
}

fn default_backoff() -> u64 {
    5
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.api.access_token, None);
        assert_eq!(config.api.version, "5.131");
        assert_eq!(config.api.base_url, "https://api.vk.com/method/");
        assert_eq!(config.api.request_timeout_seconds, 30);
        assert_eq!(config.long_poll.group_id, None);
        assert_eq!(config.long_poll.wait_seconds, 25);
        assert_eq!(config.long_poll.timeout_margin(), Duration::from_secs(5));
        assert_eq!(config.long_poll.backoff(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(&missing_path).await.unwrap();
        assert_eq!(config.api.version, "5.131");
        assert_eq!(config.long_poll.wait_seconds, 25);
    }

    #[tokio::test]
    async fn load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api:
  access_token: "token"
  version: "5.199"
  base_url: "http://localhost:9000/method/"
  request_timeout_seconds: 10
long_poll:
  group_id: 12345
  wait_seconds: 60
  timeout_margin_seconds: 3
  backoff_seconds: 1
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.api.access_token.as_deref(), Some("token"));
        assert_eq!(config.api.version, "5.199");
        assert_eq!(config.api.base_url, "http://localhost:9000/method/");
        assert_eq!(config.api.request_timeout_seconds, 10);
        assert_eq!(config.long_poll.group_id, Some(12345));
        assert_eq!(config.long_poll.wait_seconds, 60);
        assert_eq!(config.long_poll.timeout_margin_seconds, 3);
        assert_eq!(config.long_poll.backoff_seconds, 1);
    }

    #[tokio::test]
    async fn load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
long_poll:
  group_id: 7
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.long_poll.group_id, Some(7));
        assert_eq!(config.long_poll.wait_seconds, 25); // default
        assert_eq!(config.api.version, "5.131"); // default
        assert_eq!(config.api.access_token, None); // default
    }

    #[tokio::test]
    async fn zero_backoff_is_raised_to_one_second() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
long_poll:
  backoff_seconds: 0
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.long_poll.backoff_seconds, 0);
        assert_eq!(config.long_poll.backoff(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path()).await;
        assert!(result.is_err());
    }

    #[test]
    fn config_error_display() {
        let io_error = ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ));
        assert!(io_error.to_string().contains("failed to read config file"));
    }
}
