use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol_types::SolValue;

use crate::domain::relay_adapt::{RelayAdaptAction, RelayAdaptRandom};
use crate::ports::relay_adapt::{RelayAdaptContract, RelayAdaptError};
use crate::ports::TransactionBatch;

/// Relay adapt parameter derivation computed in-process.
///
/// The parameters are `keccak256(abi.encode(nullifiers, txCount, random, action))`,
/// matching what the contract recomputes when the relay call executes.
#[derive(Debug, Clone)]
pub struct LocalRelayAdapt {
    address: Address,
}

impl LocalRelayAdapt {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

/// Parameter hash for a batch, action and random.
pub fn relay_adapt_params(
    batch: &TransactionBatch,
    action: &RelayAdaptAction,
    random: RelayAdaptRandom,
) -> B256 {
    let nullifiers = batch.nullifiers();
    let tx_count = U256::from(batch.transactions.len());
    let encoded = match action {
        RelayAdaptAction::UnwrapBaseToken { destination } => {
            (nullifiers, tx_count, random.0, *destination).abi_encode()
        }
        RelayAdaptAction::CrossContractCalls {
            shield_token_addresses,
            calls,
        } => (
            nullifiers,
            tx_count,
            random.0,
            shield_token_addresses.clone(),
            calls.clone(),
        )
            .abi_encode(),
    };
    keccak256(encoded)
}

impl RelayAdaptContract for LocalRelayAdapt {
    fn address(&self) -> Address {
        self.address
    }

    async fn derive_params(
        &self,
        dummy: &TransactionBatch,
        action: &RelayAdaptAction,
        random: RelayAdaptRandom,
    ) -> Result<B256, RelayAdaptError> {
        if dummy.transactions.is_empty() {
            return Err(RelayAdaptError::EmptyBatch);
        }
        Ok(relay_adapt_params(dummy, action, random))
    }
}
