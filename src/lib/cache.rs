//! Single-slot cache of the most recent fully proved transaction.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy::rpc::types::TransactionRequest;
use tracing::{debug, warn};

use crate::domain::gas::TransactionGasDetails;
use crate::domain::network::NetworkConfig;
use crate::domain::proved::{ParamMismatch, ProofParams, ProvedTransaction};
use crate::gas::{apply_gas_details, GasError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cannot cache a transaction with a 'from' address.")]
    InvalidCacheWrite,
}

/// Why a cached proof cannot be reused for a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No proof found.")]
    NoProofFound,

    #[error("Mismatch: {0}.")]
    Mismatch(ParamMismatch),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopulateError {
    #[error("Invalid proof for this transaction. {0}")]
    InvalidCachedProof(ValidationError),

    #[error(transparent)]
    UnsupportedGasModel(#[from] GasError),

    #[error("network is not configured")]
    UnknownNetwork,
}

/// Holds at most one proved transaction.
///
/// Writes replace the whole entry, so readers see either the previous entry or
/// the new one. A poisoned lock is recovered for the same reason.
#[derive(Debug, Default)]
pub struct ProofCache {
    slot: RwLock<Option<ProvedTransaction>>,
}

impl ProofCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<ProvedTransaction>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<ProvedTransaction>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the slot with `entry`.
    ///
    /// The populated transaction must be unsigned: a `from` address is bound
    /// only at broadcast.
    pub fn store(&self, entry: ProvedTransaction) -> Result<(), CacheError> {
        if entry.populated_transaction.from.is_some() {
            return Err(CacheError::InvalidCacheWrite);
        }
        debug!(proof_type = %entry.proof_type(), "caching proved transaction");
        *self.write() = Some(entry);
        Ok(())
    }

    /// Replace the slot with `entry`, or empty it with `None`.
    pub fn set(&self, entry: Option<ProvedTransaction>) -> Result<(), CacheError> {
        match entry {
            Some(entry) => self.store(entry),
            None => {
                self.clear();
                Ok(())
            }
        }
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    /// The current entry, without re-checking it against anything.
    pub fn retrieve(&self) -> Option<ProvedTransaction> {
        self.read().clone()
    }

    /// Check `candidate` against the cached parameters, stopping at the first mismatch.
    pub fn validate(&self, candidate: &ProofParams) -> Result<(), ValidationError> {
        check(self.read().as_ref(), candidate).map(|_| ())
    }

    /// Validate `params`, then return the cached transaction with `gas_details` merged in.
    ///
    /// Validation and the read of the transaction happen under one lock, so a
    /// concurrent store cannot swap the entry in between.
    pub fn populate_proved_transaction(
        &self,
        network: &NetworkConfig,
        params: &ProofParams,
        gas_details: &TransactionGasDetails,
    ) -> Result<TransactionRequest, PopulateError> {
        let slot = self.read();
        let entry = check(slot.as_ref(), params).map_err(PopulateError::InvalidCachedProof)?;
        let merged = apply_gas_details(
            network,
            &entry.populated_transaction,
            gas_details,
            params.send_with_public_wallet,
        )?;
        Ok(merged)
    }
}

fn check<'a>(
    entry: Option<&'a ProvedTransaction>,
    candidate: &ProofParams,
) -> Result<&'a ProvedTransaction, ValidationError> {
    let Some(entry) = entry else {
        warn!("{}", ValidationError::NoProofFound);
        return Err(ValidationError::NoProofFound);
    };
    match entry.params.first_mismatch(candidate) {
        None => Ok(entry),
        Some(field) => {
            let err = ValidationError::Mismatch(field);
            warn!(proof_type = %candidate.proof_type, "{err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::{Address, TxKind, U256};

    use super::*;
    use crate::domain::network::NetworkName;
    use crate::domain::proof_type::ProofType;
    use crate::domain::token::TokenAmount;

    fn params(amount: u64) -> ProofParams {
        ProofParams {
            proof_type: ProofType::Transfer,
            railgun_wallet_id: "wallet-w".into(),
            show_sender_address_to_recipient: false,
            memo_text: Some("rent".into()),
            token_amount_recipients: vec![
                TokenAmount::new(Address::repeat_byte(0xAA), U256::from(amount))
                    .with_recipient("0zk1recipientr"),
                TokenAmount::new(Address::repeat_byte(0xBB), U256::from(3))
                    .with_recipient("0zk1recipientq"),
            ],
            nft_amount_recipients: vec![],
            relay_adapt_unshield_token_amounts: None,
            relay_adapt_shield_token_addresses: None,
            cross_contract_calls_serialized: None,
            relayer_fee_token_amount_recipient: None,
            send_with_public_wallet: true,
            overall_batch_min_gas_price: None,
        }
    }

    fn entry(params: ProofParams) -> ProvedTransaction {
        ProvedTransaction {
            params,
            populated_transaction: TransactionRequest {
                to: Some(TxKind::Call(Address::repeat_byte(0x11))),
                ..Default::default()
            },
        }
    }

    fn network() -> NetworkConfig {
        NetworkConfig::new(
            NetworkName::Hardhat,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
        )
    }

    fn type2() -> TransactionGasDetails {
        TransactionGasDetails::Type2 {
            gas_estimate: 100_000,
            max_fee_per_gas: 30,
            max_priority_fee_per_gas: 2,
        }
    }

    #[test]
    fn empty_cache_reports_no_proof() {
        let cache = ProofCache::new();
        let err = cache.validate(&params(10)).unwrap_err();
        assert_eq!(err, ValidationError::NoProofFound);
        assert_eq!(err.to_string(), "No proof found.");
    }

    #[test]
    fn stored_params_validate() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        assert_eq!(cache.validate(&params(10)), Ok(()));
    }

    #[test]
    fn permuted_recipients_still_validate() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        let mut permuted = params(10);
        permuted.token_amount_recipients.reverse();
        assert_eq!(cache.validate(&permuted), Ok(()));
    }

    #[test]
    fn mismatch_names_the_field() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        let err = cache.validate(&params(11)).unwrap_err();
        assert_eq!(err, ValidationError::Mismatch(ParamMismatch::TokenAmountRecipients));
        assert_eq!(err.to_string(), "Mismatch: tokenAmountRecipients.");
    }

    #[test]
    fn store_rejects_sender_for_every_proof_type() {
        let cache = ProofCache::new();
        for proof_type in [
            ProofType::Transfer,
            ProofType::Unshield,
            ProofType::UnshieldBaseToken,
            ProofType::CrossContractCalls,
            ProofType::Withdraw,
            ProofType::WithdrawBaseToken,
        ] {
            let mut p = params(10);
            p.proof_type = proof_type;
            let mut signed = entry(p);
            signed.populated_transaction.from = Some(Address::repeat_byte(0x99));
            assert_eq!(cache.store(signed), Err(CacheError::InvalidCacheWrite));
        }
        assert!(cache.retrieve().is_none());
    }

    #[test]
    fn set_none_clears() {
        let cache = ProofCache::new();
        cache.set(Some(entry(params(10)))).unwrap();
        assert!(cache.retrieve().is_some());
        cache.set(None).unwrap();
        assert!(cache.retrieve().is_none());
    }

    #[test]
    fn populate_merges_gas_without_touching_params() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        let tx = cache
            .populate_proved_transaction(&network(), &params(10), &type2())
            .unwrap();
        assert_eq!(tx.gas, Some(120_000));
        assert_eq!(tx.from, None);

        let cached = cache.retrieve().unwrap();
        assert_eq!(cached.params, params(10));
        assert_eq!(cached.populated_transaction.gas, None);
    }

    #[test]
    fn populate_reports_mismatch_reason() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        let err = cache
            .populate_proved_transaction(&network(), &params(11), &type2())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid proof for this transaction. Mismatch: tokenAmountRecipients."
        );
    }

    #[test]
    fn populate_rejects_wrong_gas_shape() {
        let cache = ProofCache::new();
        cache.store(entry(params(10))).unwrap();
        let legacy = TransactionGasDetails::Type0 {
            gas_estimate: 100_000,
            gas_price: 5,
        };
        let err = cache
            .populate_proved_transaction(&network(), &params(10), &legacy)
            .unwrap_err();
        assert!(matches!(err, PopulateError::UnsupportedGasModel(_)));
    }

    #[test]
    fn readers_see_whole_entries() {
        let cache = Arc::new(ProofCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for amount in 0..200u64 {
                    cache.store(entry(params(amount))).unwrap();
                }
            })
        };
        for _ in 0..200 {
            if let Some(seen) = cache.retrieve() {
                assert_eq!(seen.params.token_amount_recipients.len(), 2);
            }
        }
        writer.join().unwrap();
        assert_eq!(cache.validate(&params(199)), Ok(()));
    }
}
