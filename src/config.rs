use crate::constants::{
    DEFAULT_ADDR, DEFAULT_BASE_IRI, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_CONFIG_PATH, DEFAULT_DB_PATH,
    DEFAULT_STATIC_DIR,
};
use crate::error::{Result, UrlShareError};
use crate::repository::{KeyEncoding, KeyFormat};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port`; a bare `:port` listens on all interfaces. Defaults to loopback.
    pub addr: String,
    pub base_iri: String,
    pub static_dir: PathBuf,
    pub addressing: Addressing,
}

/// How an inbound request is turned into a lookup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// The last path segment is the key; generated keys are bare sequence numbers.
    #[default]
    Short,
    /// The full external IRI is the key; generated keys carry the base IRI.
    External,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub key_encoding: KeyEncoding,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the daily-rotated JSON log file. Console only when unset.
    pub dir: Option<PathBuf>,
    /// Emit console lines as JSON instead of the human-readable format.
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            base_iri: DEFAULT_BASE_IRI.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            addressing: Addressing::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            key_encoding: KeyEncoding::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load from `path`, or from `urlshare.toml` when it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            UrlShareError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.base_iri()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = &self.server.addr;
        let full = if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.clone()
        };
        full.parse()
            .map_err(|e| UrlShareError::Config(format!("invalid listen address '{addr}': {e}")))
    }

    pub fn base_iri(&self) -> Result<Url> {
        let raw = &self.server.base_iri;
        let url = Url::parse(raw)
            .map_err(|e| UrlShareError::Config(format!("invalid base IRI '{raw}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(UrlShareError::Config(format!(
                "base IRI '{raw}' cannot be used as a base"
            )));
        }
        Ok(url)
    }

    pub fn key_format(&self) -> Result<KeyFormat> {
        let encoding = self.store.key_encoding;
        Ok(match self.server.addressing {
            Addressing::Short => KeyFormat::short(encoding),
            Addressing::External => KeyFormat::prefixed(self.base_iri()?.as_str(), encoding),
        })
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store.busy_timeout_ms)
    }
}
