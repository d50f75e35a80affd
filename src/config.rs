use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::api::polygon::PolygonClient;

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not configured")]
    Missing(&'static str),
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Expected HTTP Basic credentials
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Process-wide settings, read once at start-up
#[derive(Clone)]
pub struct AppConfig {
    pub polygon_api_key: String,
    pub polygon_base_url: String,
    pub credentials: BasicCredentials,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub cache_max_age_secs: u64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("polygon_api_key", &"<redacted>")
            .field("polygon_base_url", &self.polygon_base_url)
            .field("credentials", &self.credentials)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("cache_max_age_secs", &self.cache_max_age_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let polygon_api_key = get("POLYGON_API_KEY").ok_or(ConfigError::Missing("POLYGON_API_KEY"))?;
        let password =
            get("BASIC_AUTH_PASSWORD").ok_or(ConfigError::Missing("BASIC_AUTH_PASSWORD"))?;
        let username = get("BASIC_AUTH_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = parse_secs(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                expected: "greater than zero",
                value: "0".to_string(),
            });
        }
        let cache_max_age_secs = parse_secs(
            get("CACHE_MAX_AGE_SECS"),
            "CACHE_MAX_AGE_SECS",
            DEFAULT_CACHE_MAX_AGE_SECS,
        )?;

        Ok(Self {
            polygon_api_key,
            polygon_base_url: get("POLYGON_BASE_URL")
                .unwrap_or_else(|| PolygonClient::DEFAULT_BASE_URL.to_string()),
            credentials: BasicCredentials { username, password },
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            cache_max_age_secs,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_secs(value: Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
            name,
            expected: "a whole number of seconds",
            value,
        }),
        None => Ok(default),
    }
}
