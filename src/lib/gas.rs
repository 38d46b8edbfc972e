//! Merge late-bound gas details into a proved transaction.

use alloy::rpc::types::TransactionRequest;

use crate::domain::gas::{EvmGasType, TransactionGasDetails};
use crate::domain::network::{NetworkConfig, NetworkName};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GasError {
    #[error("unsupported gas model on {network}: expected {expected}, got {provided}")]
    UnsupportedGasModel {
        network: NetworkName,
        expected: EvmGasType,
        provided: EvmGasType,
    },
}

/// Gas limit for an estimate, padded by 20%.
pub fn padded_gas_limit(gas_estimate: u64) -> u64 {
    gas_estimate.saturating_add(gas_estimate / 5)
}

/// Copy of `transaction` with the gas fields set from `details`.
///
/// Only `transaction_type`, `gas` and the fee fields change. Fails when the
/// details do not have the shape the network expects for this wallet mode.
pub fn apply_gas_details(
    network: &NetworkConfig,
    transaction: &TransactionRequest,
    details: &TransactionGasDetails,
    send_with_public_wallet: bool,
) -> Result<TransactionRequest, GasError> {
    let expected = network.gas_type_for(send_with_public_wallet);
    let provided = details.evm_gas_type();
    if expected != provided {
        return Err(GasError::UnsupportedGasModel {
            network: network.name,
            expected,
            provided,
        });
    }

    let mut merged = transaction.clone();
    merged.transaction_type = Some(provided.as_u8());
    merged.gas = Some(padded_gas_limit(details.gas_estimate()));
    match *details {
        TransactionGasDetails::Type0 { gas_price, .. }
        | TransactionGasDetails::Type1 { gas_price, .. } => {
            merged.gas_price = Some(gas_price);
            merged.max_fee_per_gas = None;
            merged.max_priority_fee_per_gas = None;
        }
        TransactionGasDetails::Type2 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
            ..
        } => {
            merged.gas_price = None;
            merged.max_fee_per_gas = Some(max_fee_per_gas);
            merged.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        }
    }
    Ok(merged)
}
