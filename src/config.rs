//! Configuration file parser for ~/.config/buildfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::util::validate_url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A key holds a value the publisher cannot work with.
    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level publisher configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote directory listing that names one sub-directory per build.
    pub listing_url: String,

    /// Local directory the release artifacts are uploaded into.
    pub artifact_dir: PathBuf,

    /// Public base URL the artifacts are downloadable from.
    pub base_url: String,

    /// Repository browse URL; the build id is appended to it.
    pub browse_url: String,

    /// Contact line shown under every RSS item.
    pub contact: String,

    /// Filename prefix shared by all artifacts, e.g. `org.tmatesoft.svn`.
    pub artifact_prefix: String,

    /// Where rendered feeds are cached, one file per variant.
    pub cache_dir: PathBuf,

    /// Cache lifetime in minutes. 0 = entries never expire.
    pub cache_ttl_minutes: u64,

    /// Timeout for the TCP reachability probe.
    pub probe_timeout_secs: u64,

    /// Timeout for a full content request.
    pub fetch_timeout_secs: u64,

    pub rss10_items: usize,
    pub rss20_items: usize,
    pub html_items: usize,

    pub channel_title: String,
    pub channel_link: String,
    pub channel_description: String,

    /// Listen address for `buildfeed serve`.
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: "http://teamcity.svnkit.com/svnkit/trunk/".to_string(),
            artifact_dir: PathBuf::from("/var/www/svnkit.com/download"),
            base_url: "https://svnkit.com/download/".to_string(),
            browse_url: "https://svn.svnkit.com/repos/svnkit/tags/".to_string(),
            contact: "Questions and bug reports: support@svnkit.com".to_string(),
            artifact_prefix: "org.tmatesoft.svn".to_string(),
            cache_dir: PathBuf::from("/var/cache/buildfeed"),
            cache_ttl_minutes: 0,
            probe_timeout_secs: 3,
            fetch_timeout_secs: 30,
            rss10_items: 5,
            rss20_items: 5,
            html_items: 3,
            channel_title: "SVNKit Builds".to_string(),
            channel_link: "https://svnkit.com/".to_string(),
            channel_description: "Latest SVNKit builds and their changes".to_string(),
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 17] = [
        "listing_url",
        "artifact_dir",
        "base_url",
        "browse_url",
        "contact",
        "artifact_prefix",
        "cache_dir",
        "cache_ttl_minutes",
        "probe_timeout_secs",
        "fetch_timeout_secs",
        "rss10_items",
        "rss20_items",
        "html_items",
        "channel_title",
        "channel_link",
        "channel_description",
        "bind",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    ///
    /// The result is not validated; call [`Config::validate`] before use.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            listing = %config.listing_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("listing_url", &self.listing_url),
            ("base_url", &self.base_url),
            ("browse_url", &self.browse_url),
            ("channel_link", &self.channel_link),
        ] {
            validate_url(value).map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })?;
        }

        for (key, value) in [
            ("rss10_items", self.rss10_items),
            ("rss20_items", self.rss20_items),
            ("html_items", self.html_items),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        for (key, value) in [
            ("probe_timeout_secs", self.probe_timeout_secs),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "timeouts must be non-zero".to_string(),
                });
            }
        }

        if self.artifact_prefix.is_empty() || self.artifact_prefix.contains('/') {
            return Err(ConfigError::Invalid {
                key: "artifact_prefix",
                reason: "must be a non-empty filename fragment".to_string(),
            });
        }

        Ok(())
    }

    /// `None` when expiry is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_minutes > 0).then(|| Duration::from_secs(self.cache_ttl_minutes * 60))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.artifact_prefix, "org.tmatesoft.svn");
        assert_eq!(config.cache_ttl_minutes, 0);
        assert!(config.cache_ttl().is_none());
        assert_eq!(config.rss10_items, 5);
        assert_eq!(config.rss20_items, 5);
        assert_eq!(config.html_items, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_file_returns_default() {
        let (_dir, path) = write_config("");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.html_items, 3);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (_dir, path) = write_config("   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.rss20_items, 5);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (_dir, path) = write_config("html_items = 7\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.html_items, 7);
        assert_eq!(config.rss10_items, 5);
        assert_eq!(config.artifact_prefix, "org.tmatesoft.svn");
    }

    #[test]
    fn test_full_config() {
        let content = r#"
listing_url = "http://builds.internal:8111/trunk/"
artifact_dir = "/srv/download"
base_url = "https://example.org/dl"
browse_url = "https://example.org/svn/tags"
contact = "mail me"
artifact_prefix = "com.example.lib"
cache_dir = "/tmp/feeds"
cache_ttl_minutes = 15
probe_timeout_secs = 1
fetch_timeout_secs = 10
rss10_items = 2
rss20_items = 4
html_items = 1
channel_title = "Example"
channel_link = "https://example.org/"
channel_description = "Example builds"
bind = "0.0.0.0:9000"
"#;
        let (_dir, path) = write_config(content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.listing_url, "http://builds.internal:8111/trunk/");
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/download"));
        assert_eq!(config.artifact_prefix, "com.example.lib");
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(900)));
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.rss20_items, 4);
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (_dir, path) = write_config("this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (_dir, path) = write_config("html_items = 2\ntotally_fake_key = true\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.html_items, 2);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (_dir, path) = write_config("html_items = \"three\"\n");
        assert!(Config::load(&path).is_err());
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let (_dir, path) = write_config(&"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_validate_rejects_bad_listing_url() {
        let config = Config {
            listing_url: "ftp://builds.example.com/".to_string(),
            ..Config::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "listing_url"),
            other => panic!("Expected Invalid listing_url, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_items() {
        let config = Config {
            rss20_items: 0,
            ..Config::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "rss20_items"),
            other => panic!("Expected Invalid rss20_items, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_names_the_zero_timeout() {
        for key in ["probe_timeout_secs", "fetch_timeout_secs"] {
            let mut config = Config::default();
            match key {
                "probe_timeout_secs" => config.probe_timeout_secs = 0,
                _ => config.fetch_timeout_secs = 0,
            }
            match config.validate() {
                Err(ConfigError::Invalid { key: reported, .. }) => assert_eq!(reported, key),
                other => panic!("Expected Invalid {key}, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_validate_rejects_prefix_with_slash() {
        let config = Config {
            artifact_prefix: "../evil".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
