use std::collections::HashSet;
use std::path::Path;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::gas::EvmGasType;
use crate::domain::network::{NetworkConfig, NetworkName};

/// Assembler configuration loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct AssemblerConfig {
    pub networks: Vec<NetworkSection>,
    /// Public addresses that may never receive withdrawn or unshielded funds.
    #[serde(default)]
    pub blocked_addresses: Vec<Address>,
}

/// One `[[networks]]` entry.
#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    pub name: NetworkName,
    /// Defaults to the network's well-known chain id.
    pub chain_id: Option<u64>,
    /// Defaults to the network's usual fee model.
    pub default_gas_type: Option<EvmGasType>,
    pub proxy_contract: Address,
    pub relay_adapt_contract: Address,
}

impl NetworkSection {
    pub fn network_config(&self) -> NetworkConfig {
        let mut config =
            NetworkConfig::new(self.name, self.proxy_contract, self.relay_adapt_contract);
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(gas_type) = self.default_gas_type {
            config.default_gas_type = gas_type;
        }
        config
    }
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AssemblerConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[networks]] entry is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for network in &self.networks {
            let name = network.name;
            if !seen.insert(name) {
                return Err(ConfigError::Validation(format!(
                    "{name}: network configured more than once"
                )));
            }
            if network.chain_id == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "{name}: chain_id must be non-zero"
                )));
            }
            if network.relay_adapt_contract == network.proxy_contract {
                return Err(ConfigError::Validation(format!(
                    "{name}: relay_adapt_contract must differ from proxy_contract"
                )));
            }
        }

        Ok(())
    }

    pub fn network_configs(&self) -> Vec<NetworkConfig> {
        self.networks.iter().map(NetworkSection::network_config).collect()
    }
}
