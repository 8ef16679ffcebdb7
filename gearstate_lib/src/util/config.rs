use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_METRICS_ADDR: &str = "127.0.0.1:9091";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration, read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub token: Option<String>,
    pub api_base: String,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub metrics_addr: String,
    pub event_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            metrics_addr: DEFAULT_METRICS_ADDR.to_string(),
            event_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            token: env::var("BOT_TOKEN").ok().filter(|token| !token.is_empty()),
            api_base: env::var("API_BASE").unwrap_or(defaults.api_base),
            max_retries: parse_var("MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            request_timeout: parse_var("REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            metrics_addr: env::var("METRICS_ADDR").unwrap_or(defaults.metrics_addr),
            event_file: env::var("EVENT_FILE").ok(),
        };

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}
