use std::future::Future;

use alloy::primitives::{Address, B256};

use super::TransactionBatch;
use crate::domain::relay_adapt::{RelayAdaptAction, RelayAdaptRandom};

/// Port for the relay adapt contract of one network.
///
/// Implementations:
/// - `LocalRelayAdapt` (computes the parameter hash in-process)
pub trait RelayAdaptContract: Send + Sync {
    fn address(&self) -> Address;

    /// Derive the adapt parameters committing `action` to the nullifiers of a
    /// dummy batch and a fresh random.
    fn derive_params(
        &self,
        dummy: &TransactionBatch,
        action: &RelayAdaptAction,
        random: RelayAdaptRandom,
    ) -> impl Future<Output = Result<B256, RelayAdaptError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayAdaptError {
    #[error("dummy batch has no transactions")]
    EmptyBatch,

    #[error("contract call failed: {0}")]
    Contract(String),
}
