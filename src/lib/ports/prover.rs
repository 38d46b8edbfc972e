use std::future::Future;

use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;

use super::{ProofMode, ProveRequest, TransactionBatch};
use crate::domain::network::NetworkConfig;
use crate::domain::relay_adapt::{RelayAdaptAction, RelayAdaptRandom};

/// Receives proving progress, monotonically non-decreasing in `[0, 1]`.
pub type ProgressCallback<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Port for the proving engine.
///
/// Implementations:
/// - `MockProver` (deterministic, in-process)
/// - an engine binding that selects notes and runs the circuit
pub trait TransactionProver: Send + Sync {
    /// Select notes and prove the request.
    ///
    /// Can take seconds to minutes in `Full` mode. There is no cancellation:
    /// callers await completion or failure.
    fn prove_transactions(
        &self,
        request: &ProveRequest,
        mode: ProofMode,
        progress: ProgressCallback<'_>,
    ) -> impl Future<Output = Result<TransactionBatch, ProverError>> + Send;

    /// Build the unsigned `transact` call for a directly proved batch.
    fn populate_transact(
        &self,
        batch: &TransactionBatch,
        network: &NetworkConfig,
    ) -> impl Future<Output = Result<TransactionRequest, ProverError>> + Send;

    /// Build the unsigned relay adapt call for a batch bound to `random`.
    fn populate_relay_adapt(
        &self,
        batch: &TransactionBatch,
        network: &NetworkConfig,
        action: &RelayAdaptAction,
        random: RelayAdaptRandom,
    ) -> impl Future<Output = Result<TransactionRequest, ProverError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("insufficient balance for token {0}")]
    InsufficientBalance(Address),

    #[error("no wallet for id: {0}")]
    WalletNotFound(String),

    #[error("proof generation failed: {0}")]
    ProofFailed(String),

    #[error("transaction population failed: {0}")]
    Populate(String),
}
