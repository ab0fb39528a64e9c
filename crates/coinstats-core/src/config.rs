//! File-backed configuration with hot reload.
//!
//! The poller reads an immutable [`AppConfig`] snapshot per cycle. When the
//! backing JSON file changes, a fresh snapshot is parsed and swapped in
//! atomically; readers holding the old one are unaffected.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use arc_swap::ArcSwap;
use coinstats_warehouse::StoreConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub poll: PollConfig,
    pub exchanges: ExchangesConfig,
}

/// Read once at startup; later reloads do not rebind the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: None,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub request_timeout_ms: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangesConfig {
    pub luno: LunoConfig,
    pub bitstamp: EndpointConfig,
    pub kraken: KrakenConfig,
    pub bitfinex: TickerEndpointConfig,
    pub bitsquare: TickerEndpointConfig,
    pub btcc: TickerEndpointConfig,
    pub okcoin: TickerEndpointConfig,
    pub poloniex: EndpointConfig,
}

/// A single-request exchange. An empty `url` leaves it unconfigured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
}

/// One request per ticker, `url + ticker`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerEndpointConfig {
    pub url: String,
    /// Comma separated, e.g. `btcusd,ltcbtc`.
    pub tickers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunoConfig {
    pub url: String,
    /// Volume stored when the vendor omits its rolling 24h volume.
    pub default_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KrakenConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    pub pairs: String,
}

impl Default for KrakenConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            pairs: String::from("XXBTZEUR,XXBTZUSD,XXBTZGBP"),
        }
    }
}

impl KrakenConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl AppConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    /// Parse a config file, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `$COINSTATS_HOME/config.json`, with the home defaulting to `~/.config/coinstats`.
pub fn default_config_path() -> PathBuf {
    StoreConfig::default().coinstats_home.join("config.json")
}

/// Shared, hot-swappable configuration.
pub struct ConfigHandle {
    path: Option<PathBuf>,
    current: ArcSwap<AppConfig>,
    modified: Mutex<Option<SystemTime>>,
}

impl ConfigHandle {
    /// A handle that never reloads.
    pub fn fixed(config: AppConfig) -> Self {
        Self {
            path: None,
            current: ArcSwap::from_pointee(config),
            modified: Mutex::new(None),
        }
    }

    /// Load `path` (defaults if missing) and watch it for changes.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = AppConfig::load_or_default(&path)?;
        let modified = modified_time(&path);
        Ok(Self {
            path: Some(path),
            current: ArcSwap::from_pointee(config),
            modified: Mutex::new(modified),
        })
    }

    pub fn snapshot(&self) -> Arc<AppConfig> {
        self.current.load_full()
    }

    /// Re-read the file when its modification time moved. On error the
    /// previous snapshot stays in place.
    pub fn reload_if_changed(&self) -> Result<bool, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };

        let mut last_seen = self
            .modified
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = modified_time(path);
        if current.is_none() || current == *last_seen {
            return Ok(false);
        }

        let config = AppConfig::load(path)?;
        self.current.store(Arc::new(config));
        *last_seen = current;
        info!(path = %path.display(), "configuration reloaded");
        Ok(true)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn partial_files_fill_in_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"exchanges": {"bitfinex": {"url": "https://api.bitfinex.test/v1/pubticker/", "tickers": "btcusd"}}}"#,
        )
        .expect("write config");

        let config = AppConfig::load(&path).expect("load");
        assert_eq!(config.poll.interval_secs, 600);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.exchanges.bitfinex.tickers, "btcusd");
        assert_eq!(config.exchanges.kraken.pairs, "XXBTZEUR,XXBTZUSD,XXBTZGBP");
        assert!(config.exchanges.luno.url.is_empty());
    }

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempdir().expect("tempdir");
        let config = AppConfig::load_or_default(&temp.path().join("absent.json")).expect("defaults");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").expect("write config");

        let error = AppConfig::load(&path).expect_err("parse failure");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn kraken_needs_both_credentials() {
        let mut kraken = KrakenConfig::default();
        assert!(!kraken.has_credentials());
        kraken.api_key = String::from("key");
        assert!(!kraken.has_credentials());
        kraken.api_secret = String::from("secret");
        assert!(kraken.has_credentials());
    }

    #[test]
    fn reload_swaps_snapshot_and_keeps_old_one_on_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"poll": {"interval_secs": 30}}"#).expect("write config");

        let handle = ConfigHandle::from_file(&path).expect("handle");
        let before = handle.snapshot();
        assert_eq!(before.poll.interval_secs, 30);
        assert!(!handle.reload_if_changed().expect("unchanged"));

        let file = fs::File::options().write(true).open(&path).expect("open");
        fs::write(&path, r#"{"poll": {"interval_secs": 45}}"#).expect("rewrite config");
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .expect("bump mtime");

        assert!(handle.reload_if_changed().expect("changed"));
        assert_eq!(handle.snapshot().poll.interval_secs, 45);
        assert_eq!(before.poll.interval_secs, 30);

        fs::write(&path, "{ broken").expect("break config");
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .expect("bump mtime again");
        assert!(handle.reload_if_changed().is_err());
        assert_eq!(handle.snapshot().poll.interval_secs, 45);
    }
}
