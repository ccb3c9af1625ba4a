use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "invest-public-api.tinkoff.ru:443";
pub const DEFAULT_APP_NAME: &str = "tinvest-mcp";

pub const ENV_TOKEN: &str = "TINKOFF_TOKEN";
pub const ENV_ENDPOINT: &str = "TINKOFF_ENDPOINT";
pub const ENV_APP_NAME: &str = "APP_NAME";
pub const ENV_ACCOUNT_ID: &str = "TINKOFF_ACCOUNT_ID";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("auth token is not set (TINKOFF_TOKEN)")]
    MissingToken,
}

/// Top-level layout of the optional TOML configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub broker: BrokerSettings,
}

/// Unresolved broker settings from one source. Every field is optional;
/// blank values count as absent.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BrokerSettings {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub app_name: Option<String>,
    /// Explicit operating account. Used as-is, never checked against the backend.
    pub account_id: Option<String>,
}

impl BrokerSettings {
    /// Reads the environment variable names through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            token: lookup(ENV_TOKEN),
            endpoint: lookup(ENV_ENDPOINT),
            app_name: lookup(ENV_APP_NAME),
            account_id: lookup(ENV_ACCOUNT_ID),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layers `upper` over `self`; non-blank values in `upper` win.
    pub fn overlay(self, upper: BrokerSettings) -> Self {
        Self {
            token: non_blank(upper.token).or_else(|| non_blank(self.token)),
            endpoint: non_blank(upper.endpoint).or_else(|| non_blank(self.endpoint)),
            app_name: non_blank(upper.app_name).or_else(|| non_blank(self.app_name)),
            account_id: non_blank(upper.account_id).or_else(|| non_blank(self.account_id)),
        }
    }

    /// Applies defaults and requires a token.
    pub fn resolve(self) -> Result<BrokerConfig, ConfigError> {
        let token = non_blank(self.token).ok_or(ConfigError::MissingToken)?;
        Ok(BrokerConfig {
            token,
            endpoint: non_blank(self.endpoint).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            app_name: non_blank(self.app_name).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            account_id: non_blank(self.account_id),
        })
    }
}

impl fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("app_name", &self.app_name)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Process configuration for the brokerage connection. Read once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub token: String,
    /// `host:port`, or a full `http(s)://` base URL.
    pub endpoint: String,
    pub app_name: String,
    pub account_id: Option<String>,
}

impl BrokerConfig {
    pub fn is_sandbox(&self) -> bool {
        self.endpoint.contains("sandbox")
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("app_name", &self.app_name)
            .field("account_id", &self.account_id)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
