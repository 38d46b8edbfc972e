use std::fmt;

use serde::{Deserialize, Serialize};

/// EVM transaction envelope type, which decides the fee fields a transaction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvmGasType {
    /// Legacy transaction priced with `gasPrice`.
    Type0,
    /// Access-list transaction, still priced with `gasPrice`.
    Type1,
    /// EIP-1559 transaction priced with a max fee and a priority fee.
    Type2,
}

impl EvmGasType {
    /// The `type` byte of the transaction envelope.
    pub fn as_u8(self) -> u8 {
        match self {
            EvmGasType::Type0 => 0,
            EvmGasType::Type1 => 1,
            EvmGasType::Type2 => 2,
        }
    }
}

impl fmt::Display for EvmGasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type{}", self.as_u8())
    }
}

/// Late-bound gas parameters supplied right before broadcast.
///
/// Gas details are not part of a proof's statement, so they can be merged
/// into a cached proved transaction without invalidating it.
///
/// Fee fields use the JSON-RPC quantity encoding (`"0x..."`, decimal strings
/// and JSON numbers are accepted on input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "evm_gas_type", rename_all = "lowercase")]
pub enum TransactionGasDetails {
    Type0 {
        gas_estimate: u64,
        #[serde(with = "alloy::serde::quantity")]
        gas_price: u128,
    },
    Type1 {
        gas_estimate: u64,
        #[serde(with = "alloy::serde::quantity")]
        gas_price: u128,
    },
    Type2 {
        gas_estimate: u64,
        #[serde(with = "alloy::serde::quantity")]
        max_fee_per_gas: u128,
        #[serde(with = "alloy::serde::quantity")]
        max_priority_fee_per_gas: u128,
    },
}

impl TransactionGasDetails {
    pub fn evm_gas_type(&self) -> EvmGasType {
        match self {
            TransactionGasDetails::Type0 { .. } => EvmGasType::Type0,
            TransactionGasDetails::Type1 { .. } => EvmGasType::Type1,
            TransactionGasDetails::Type2 { .. } => EvmGasType::Type2,
        }
    }

    pub fn gas_estimate(&self) -> u64 {
        match *self {
            TransactionGasDetails::Type0 { gas_estimate, .. }
            | TransactionGasDetails::Type1 { gas_estimate, .. }
            | TransactionGasDetails::Type2 { gas_estimate, .. } => gas_estimate,
        }
    }
}
