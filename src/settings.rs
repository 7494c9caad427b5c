use config::{Config, ConfigError, File};
use ethers::types::Address;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Factory {
    /// Factory contract whose PoolCreated events announce new pools.
    pub address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metadata {
    /// Per-call budget for the four token metadata reads; a call that blows
    /// it is treated as reverted, not retried.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout_secs() -> u64 {
    8
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub factory: Factory,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Settings {
    /// Loads `config/default.toml` (when present) layered under `APP__`
    /// environment overrides, e.g. `APP__FACTORY__ADDRESS`.
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn factory_address(&self) -> anyhow::Result<Address> {
        self.factory
            .address
            .parse::<Address>()
            .map_err(|e| anyhow::anyhow!("Invalid factory address '{}': {}", self.factory.address, e))
    }
}
