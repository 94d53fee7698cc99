use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use delegate::{InMemoryDelegate, VideoDelegate, YtDlpDelegate};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_YTDLP: &str = "yt-dlp";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("HOST must be an IP address, got {0:?}")]
    InvalidHost(String),

    #[error("YTDLP_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),

    #[error("DELEGATE must be `ytdlp` or `memory`, got {0:?}")]
    UnknownDelegate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateKind {
    YtDlp,
    /// Seeded fixture data, no network
    Memory,
}

/// Runtime settings, read once from the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub delegate: DelegateKind,
    pub ytdlp_path: PathBuf,
    pub ytdlp_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Unset and blank are the same thing
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let host = match var("HOST") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(raw))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let ytdlp_timeout = match var("YTDLP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => None,
        };

        let delegate = match var("DELEGATE").as_deref().map(str::trim) {
            None | Some("ytdlp") | Some("yt-dlp") => DelegateKind::YtDlp,
            Some("memory") => DelegateKind::Memory,
            Some(other) => return Err(ConfigError::UnknownDelegate(other.to_string())),
        };

        Ok(Self {
            host,
            port,
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            delegate,
            ytdlp_path: var("YTDLP_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP)),
            ytdlp_timeout,
        })
    }

    pub fn build_delegate(&self) -> Arc<dyn VideoDelegate> {
        match self.delegate {
            DelegateKind::YtDlp => Arc::new(
                YtDlpDelegate::new(self.ytdlp_path.clone()).with_timeout(self.ytdlp_timeout),
            ),
            DelegateKind::Memory => Arc::new(InMemoryDelegate::new()),
        }
    }
}
