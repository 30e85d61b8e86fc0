//! Keywarden configuration.
//!
//! Configuration is assembled once at startup (the binary fills it from
//! command-line flags and environment variables) and never reloaded.

use crate::keys::generator::KeyScheme;
use crate::manager::DEFAULT_KEY_DURATION_SECS;
use crate::rotation::DEFAULT_ROTATION_INTERVAL;
use crate::KeywardenError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default namespace under the platform data directory.
pub const DEFAULT_NAMESPACE: &str = "keywarden";

/// Where key records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Volatile in-process store.
    Memory,
    /// One JSON file per key under the given directory.
    /// `None` means `dirs::data_dir()/keywarden/keys`.
    File(Option<PathBuf>),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File(None)
    }
}

/// Store backend selector as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// In-memory store.
    Memory,
    /// File store.
    #[default]
    File,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => f.write_str("memory"),
            StoreKind::File => f.write_str("file"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = KeywardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            other => Err(KeywardenError::ConfigError(format!(
                "unknown store '{}', expected 'memory' or 'file'",
                other
            ))),
        }
    }
}

/// Rotation interval for a whole number of hours. Zero disables rotation.
///
/// # Errors
/// - `ConfigError` - The interval does not fit in a `Duration` of seconds
pub fn rotation_interval_from_hours(hours: u64) -> Result<Option<Duration>, KeywardenError> {
    if hours == 0 {
        return Ok(None);
    }
    hours
        .checked_mul(60 * 60)
        .map(|secs| Some(Duration::from_secs(secs)))
        .ok_or_else(|| {
            KeywardenError::ConfigError(format!(
                "rotation interval of {} hours is too large",
                hours
            ))
        })
}

/// Configuration for a Keywarden service.
#[derive(Debug, Clone)]
pub struct KeywardenConfig {
    /// Record store backend.
    pub store: StoreConfig,

    /// Webhook URL for lifecycle notifications. `None` disables them.
    pub webhook_url: Option<String>,

    /// HTTP listen port.
    pub port: u16,

    /// Lifetime of keys issued without an explicit duration, in seconds.
    pub default_duration_secs: i64,

    /// Format of issued keys.
    pub key_scheme: KeyScheme,

    /// Rotation interval of the current key served at `/key`.
    /// `None` disables the rotating key.
    pub rotation_interval: Option<Duration>,

    /// Format of the rotating key.
    pub rotation_scheme: KeyScheme,
}

impl Default for KeywardenConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            webhook_url: None,
            port: DEFAULT_PORT,
            default_duration_secs: DEFAULT_KEY_DURATION_SECS,
            key_scheme: KeyScheme::Grouped,
            rotation_interval: Some(DEFAULT_ROTATION_INTERVAL),
            rotation_scheme: KeyScheme::Uuid,
        }
    }
}

impl KeywardenConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeywardenError> {
        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(KeywardenError::ConfigError(format!(
                    "webhook_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        if self.default_duration_secs <= 0 {
            return Err(KeywardenError::ConfigError(format!(
                "default_duration_secs must be positive, got {}",
                self.default_duration_secs
            )));
        }
        if self.rotation_interval.is_some_and(|d| d.is_zero()) {
            return Err(KeywardenError::ConfigError(
                "rotation_interval cannot be zero".to_string(),
            ));
        }
        if let StoreConfig::File(Some(dir)) = &self.store {
            if dir.as_os_str().is_empty() {
                return Err(KeywardenError::ConfigError(
                    "store directory cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = KeywardenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_duration_secs, 86_400);
        assert_eq!(config.rotation_interval, Some(Duration::from_secs(43_200)));
    }

    #[test]
    fn test_rejects_non_http_webhook() {
        let config = KeywardenConfig {
            webhook_url: Some("ftp://example.com/hook".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(KeywardenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_accepts_https_webhook() {
        let config = KeywardenConfig {
            webhook_url: Some("https://discord.com/api/webhooks/1/abc".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_default_duration() {
        let config = KeywardenConfig {
            default_duration_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rotation_interval_from_hours() {
        assert_eq!(rotation_interval_from_hours(0).unwrap(), None);
        assert_eq!(
            rotation_interval_from_hours(12).unwrap(),
            Some(Duration::from_secs(43_200))
        );
        assert!(matches!(
            rotation_interval_from_hours(u64::MAX),
            Err(KeywardenError::ConfigError(_))
        ));
        assert!(rotation_interval_from_hours(u64::MAX / 3600).is_ok());
        assert!(rotation_interval_from_hours(u64::MAX / 3600 + 1).is_err());
    }

    #[test]
    fn test_rejects_zero_rotation_interval() {
        let config = KeywardenConfig {
            rotation_interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let disabled = KeywardenConfig {
            rotation_interval: None,
            ..Default::default()
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_store_dir() {
        let config = KeywardenConfig {
            store: StoreConfig::File(Some(PathBuf::new())),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert_eq!("FILE".parse::<StoreKind>().unwrap(), StoreKind::File);
        assert!("redis".parse::<StoreKind>().is_err());
    }
}
