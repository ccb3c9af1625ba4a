//! Tinkoff Invest tools served over the Model Context Protocol.
//!
//! The binary wires configuration, the gateway client and the session
//! together; [`protocol::McpServer`] answers JSON-RPC requests and
//! [`transport`] carries them over stdio or HTTP.

pub use tinvest_bridge as bridge;
pub use tinvest_client as client;
pub use tinvest_models as models;

pub mod protocol;
pub mod transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tinvest_bridge::{BootstrapError, Session};
use tinvest_client::{Broker, RestClient};
use tinvest_models::{BrokerConfig, BrokerSettings, FileConfig};

/// Load the nearest `.env`, searching the working directory and its ancestors.
pub fn load_dotenv() -> Result<PathBuf, dotenvy::Error> {
    dotenvy::dotenv()
}

/// Parse the `[broker]` table of a TOML config file.
pub fn parse_file_config(raw: &str) -> Result<BrokerSettings, toml::de::Error> {
    let file: FileConfig = toml::from_str(raw)?;
    Ok(file.broker)
}

/// File settings (if any) overlaid by the process environment.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BrokerConfig> {
    let from_file = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            parse_file_config(&raw)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => BrokerSettings::default(),
    };
    let config = from_file
        .overlay(BrokerSettings::from_env())
        .resolve()
        .map_err(BootstrapError::from)?;
    Ok(config)
}

/// Connect to the gateway and resolve the operating account.
pub async fn build_session(config: &BrokerConfig) -> Result<Session, BootstrapError> {
    let client = RestClient::connect(config)
        .await
        .map_err(BootstrapError::Connect)?;
    let broker: Arc<dyn Broker> = Arc::new(client);
    Session::bootstrap(broker, config.account_id.as_deref()).await
}
