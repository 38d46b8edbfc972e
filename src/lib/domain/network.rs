use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::gas::EvmGasType;

/// Networks the shielded pool is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkName {
    Ethereum,
    EthereumSepolia,
    Polygon,
    Arbitrum,
    BnbChain,
    Hardhat,
}

impl NetworkName {
    pub fn default_chain_id(self) -> u64 {
        match self {
            NetworkName::Ethereum => 1,
            NetworkName::EthereumSepolia => 11_155_111,
            NetworkName::Polygon => 137,
            NetworkName::Arbitrum => 42_161,
            NetworkName::BnbChain => 56,
            NetworkName::Hardhat => 31_337,
        }
    }

    pub fn default_gas_type(self) -> EvmGasType {
        match self {
            NetworkName::BnbChain => EvmGasType::Type0,
            _ => EvmGasType::Type2,
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkName::Ethereum => "ethereum",
            NetworkName::EthereumSepolia => "ethereum_sepolia",
            NetworkName::Polygon => "polygon",
            NetworkName::Arbitrum => "arbitrum",
            NetworkName::BnbChain => "bnb_chain",
            NetworkName::Hardhat => "hardhat",
        };
        f.write_str(name)
    }
}

/// Per-network deployment and fee-model settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: NetworkName,
    pub chain_id: u64,
    pub default_gas_type: EvmGasType,
    /// Shielded pool proxy that receives standard `transact` calls.
    pub proxy_contract: Address,
    /// Relay adapt contract used for base-token unwrapping and cross-contract calls.
    pub relay_adapt_contract: Address,
}

impl NetworkConfig {
    /// Build a config with the network's default chain id and gas type.
    pub fn new(name: NetworkName, proxy_contract: Address, relay_adapt_contract: Address) -> Self {
        Self {
            name,
            chain_id: name.default_chain_id(),
            default_gas_type: name.default_gas_type(),
            proxy_contract,
            relay_adapt_contract,
        }
    }

    /// Gas type a transaction must use on this network.
    ///
    /// Public-wallet sends use the network default. Relayer sends are always
    /// priced with `gasPrice`, so EIP-1559 networks fall back to type 1.
    pub fn gas_type_for(&self, send_with_public_wallet: bool) -> EvmGasType {
        if send_with_public_wallet {
            return self.default_gas_type;
        }
        match self.default_gas_type {
            EvmGasType::Type2 => EvmGasType::Type1,
            other => other,
        }
    }
}
