//! Credentials and environment URL, resolved once at startup.
//!
//! TOOL_CLIENT_ID / TOOL_CLIENT_SECRET / TOOL_ENV_URL are all required.
//! A `.env` file is honored (process env wins) via `load_dotenv`.

use thiserror::Error;
use url::Url;

pub const CLIENT_ID_VAR: &str = "TOOL_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "TOOL_CLIENT_SECRET";
pub const ENV_URL_VAR: &str = "TOOL_ENV_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is not a valid http(s) URL: {value}")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct ConnectConfig {
    pub client_id: String,
    pub client_secret: String,
    pub env_url: Url,
}

impl std::fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("env_url", &self.env_url.as_str())
            .finish()
    }
}

impl ConnectConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary lookup (process env in production, a map in tests).
    /// Variables are checked in the order id, secret, URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let client_id = required(CLIENT_ID_VAR)?;
        let client_secret = required(CLIENT_SECRET_VAR)?;
        let raw_url = required(ENV_URL_VAR)?;

        Ok(Self {
            client_id,
            client_secret,
            env_url: parse_env_url(&raw_url)?,
        })
    }

    /// Base URL without trailing slash, for display and URL joining.
    pub fn base_url(&self) -> &str {
        self.env_url.as_str().trim_end_matches('/')
    }

    /// First 8 characters of the client id, for the startup banner.
    pub fn client_id_prefix(&self) -> String {
        self.client_id.chars().take(8).collect()
    }
}

fn parse_env_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        var: ENV_URL_VAR,
        value: raw.to_string(),
    };
    let url = Url::parse(raw.trim_end_matches('/')).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Load `.env` from the working directory (or a parent) if one exists.
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    dotenvy::dotenv().ok()
}
