use reqwest::Url;
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/board.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SHIFT_BOARD_API_URL is not a valid URL: {0}")]
    InvalidApiUrl(String),
    #[error("SHIFT_BOARD_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Hosted board API; `None` serves the board from `data_path`.
    pub api_url: Option<Url>,
    pub data_path: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_url = match lookup("SHIFT_BOARD_API_URL").filter(|value| !value.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidApiUrl(raw))?),
            None => None,
        };

        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let timeout = match lookup("SHIFT_BOARD_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            api_url,
            data_path,
            timeout,
        })
    }
}
