//! Configuration management for gazette.
//!
//! Configuration is read from `~/.config/gazette/config.toml` (or the path
//! given with `--config`). If the default file doesn't exist, a commented
//! default configuration is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use crate::fetcher::DEFAULT_MAX_ATTEMPTS;

pub const DEFAULT_WINDOW: &str = "24h";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public channel handles, processed in order.
    pub channels: Vec<String>,
    /// One handle per line; appended after `channels`.
    pub channels_file: Option<PathBuf>,
    pub window: String,
    pub cache_dir: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
    pub embed_thumbnails: bool,
    pub gateway: GatewayConfig,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            channels_file: None,
            window: DEFAULT_WINDOW.to_string(),
            cache_dir: None,
            dump_dir: None,
            embed_thumbnails: true,
            gateway: GatewayConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/".to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// An explicit path must exist. A missing default file is created with
    /// comments and defaults are returned. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::from_toml(&content, &config_path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.window()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/gazette/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("gazette").join("config.toml"))
    }

    /// The configured window as a duration.
    pub fn window(&self) -> Result<Duration, ConfigError> {
        let secs = parse_window(&self.window).map_err(ConfigError::InvalidWindow)?;
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| ConfigError::InvalidWindow(format!("Window too large: {}", self.window)))
    }

    /// The configured cache directory, or `~/.cache/gazette/thumbnails`.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let cache = dirs::cache_dir().ok_or(ConfigError::NoConfigDir)?;
                Ok(cache.join("gazette").join("thumbnails"))
            }
        }
    }

    /// All handles to collect: inline ones first, then the channels file.
    pub fn channel_handles(&self) -> Result<Vec<String>, ConfigError> {
        let mut handles: Vec<String> = self
            .channels
            .iter()
            .filter_map(|h| normalize_handle(h))
            .collect();

        if let Some(path) = &self.channels_file {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            handles.extend(parse_channel_list(&content));
        }

        Ok(handles)
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# gazette configuration

# Public channel handles to collect, in order.
channels = []

# Optional file with one handle per line (# starts a comment).
# channels_file = "/home/me/channels.txt"

# How far back to read: "24h", "30m", "2d", "90s" or plain seconds.
window = "24h"

# Thumbnail cache (default: ~/.cache/gazette/thumbnails)
# cache_dir = "/tmp/gazette"

# Write every fetched raw message here as JSON.
# dump_dir = "/tmp/gazette-dump"

# Inline thumbnails into the page as base64.
embed_thumbnails = true

[gateway]
base_url = "http://127.0.0.1:8080/"
# token = "secret"
timeout_secs = 30

[retry]
# Attempts per remote call before giving up.
max_attempts = 5
"##
        .to_string()
    }
}

/// Parse a window string like "24h", "30m", "2d", "90s" or raw seconds.
pub fn parse_window(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (digits, unit) = if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, 60)
    } else if let Some(days) = s.strip_suffix('d') {
        (days, 86400)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else {
        (s.as_str(), 1)
    };

    let value = digits
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("Invalid window: {}. Use format like '24h', '30m', '2d'", s))?;
    if value == 0 {
        return Err(format!("Window must be positive: {}", s));
    }
    value
        .checked_mul(unit)
        .ok_or_else(|| format!("Window too large: {}", s))
}

/// Handles from a channel list file, skipping blanks and comments.
pub fn parse_channel_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .filter_map(normalize_handle)
        .collect()
}

fn normalize_handle(raw: &str) -> Option<String> {
    let handle = raw.trim().trim_start_matches('@');
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    InvalidWindow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert!(config.channels.is_empty());
        assert_eq!(config.window().unwrap(), Duration::hours(24));
        assert!(config.embed_thumbnails);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.gateway.timeout_secs, 30);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
channels = ["@rustlang", "tokio"]
window = "2d"

[gateway]
base_url = "https://gw.example.com/api/"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.channel_handles().unwrap(), vec!["rustlang", "tokio"]);
        assert_eq!(config.window().unwrap(), Duration::days(2));
        assert_eq!(config.gateway.base_url, "https://gw.example.com/api/");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.window, "24h");
        assert!(config.dump_dir.is_none());
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("24h"), Ok(86400));
        assert_eq!(parse_window("30m"), Ok(1800));
        assert_eq!(parse_window("2d"), Ok(172800));
        assert_eq!(parse_window("90s"), Ok(90));
        assert_eq!(parse_window("600"), Ok(600));
        assert_eq!(parse_window(" 1H "), Ok(3600));
        assert!(parse_window("").is_err());
        assert!(parse_window("0h").is_err());
        assert!(parse_window("soon").is_err());
        assert!(parse_window("-1h").is_err());
    }

    #[test]
    fn test_out_of_range_window_is_error() {
        for window in ["200000000000d", "18446744073709551615"] {
            let config = Config {
                window: window.into(),
                ..Config::default()
            };
            assert!(
                matches!(config.window(), Err(ConfigError::InvalidWindow(_))),
                "{}",
                window
            );
        }
    }

    #[test]
    fn test_invalid_window_rejected_on_load() {
        let err = Config::from_toml("window = \"yesterday\"", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow(_)));
    }

    #[test]
    fn test_channel_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("channels.txt");
        fs::write(&list, "# news\nfirst\n\n  @second  # mirror\n#disabled\n").unwrap();

        let config = Config {
            channels: vec!["inline".into()],
            channels_file: Some(list),
            ..Config::default()
        };

        assert_eq!(
            config.channel_handles().unwrap(),
            vec!["inline", "first", "second"]
        );
    }

    #[test]
    fn test_missing_channel_list_is_error() {
        let config = Config {
            channels_file: Some(PathBuf::from("/definitely/not/here.txt")),
            ..Config::default()
        };
        assert!(matches!(
            config.channel_handles(),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gazette.toml");
        fs::write(&path, "channels = [\"a\"]\nembed_thumbnails = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.channels, vec!["a"]);
        assert!(!config.embed_thumbnails);

        let missing = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/var/cache/thumbs")),
            ..Config::default()
        };
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/var/cache/thumbs"));
    }
}
