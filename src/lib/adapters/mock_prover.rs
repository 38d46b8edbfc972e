use std::collections::HashMap;

use alloy::primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::{SolCall, SolValue};
use tokio::sync::Mutex;

use super::abi::{snark_transactions, IRelayAdapt, IShieldedPool};
use crate::domain::network::NetworkConfig;
use crate::domain::relay_adapt::{RelayAdaptAction, RelayAdaptRandom};
use crate::ports::prover::{ProgressCallback, ProverError, TransactionProver};
use crate::ports::{ProofMode, ProveRequest, ProvedTransact, TransactionBatch};

/// Words of pseudo-proof emitted per transaction.
const PROOF_WORDS: usize = 8;

/// A proving call as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedProof {
    pub mode: ProofMode,
    pub request: ProveRequest,
}

#[derive(Debug, Clone)]
struct Failure {
    mode: Option<ProofMode>,
    message: String,
}

/// Deterministic in-process stand-in for the proving engine.
///
/// Nullifiers depend only on the wallet and the spent amounts, so a dummy
/// proof and the final proof of the same request spend the same notes.
/// Every call is recorded for inspection.
#[derive(Debug, Default)]
pub struct MockProver {
    calls: Mutex<Vec<RecordedProof>>,
    failure: Option<Failure>,
    balances: HashMap<Address, U256>,
    sender: Option<Address>,
}

impl MockProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every proving call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(Failure {
                mode: None,
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// Fail only the calls made in `mode`.
    pub fn failing_in(mode: ProofMode, message: impl Into<String>) -> Self {
        Self {
            failure: Some(Failure {
                mode: Some(mode),
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// Limit the spendable balance of `token`. Tokens without a limit are unbounded.
    pub fn with_balance(mut self, token: Address, amount: U256) -> Self {
        self.balances.insert(token, amount);
        self
    }

    /// Populate transactions with `from` set, as a misbehaving engine would.
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Every proving call received so far, in order.
    pub async fn calls(&self) -> Vec<RecordedProof> {
        self.calls.lock().await.clone()
    }

    fn check_balances(&self, request: &ProveRequest) -> Result<(), ProverError> {
        let mut spent: HashMap<Address, U256> = HashMap::new();
        let fee = request.relayer_fee.iter();
        for entry in request.token_amount_recipients.iter().chain(fee) {
            let total = spent.entry(entry.token_address).or_default();
            *total = total.saturating_add(entry.amount);
        }
        for (token, total) in spent {
            if let Some(balance) = self.balances.get(&token) {
                if total > *balance {
                    return Err(ProverError::InsufficientBalance(token));
                }
            }
        }
        Ok(())
    }

    fn bound_params_hash(request: &ProveRequest) -> B256 {
        let (adapt_contract, adapt_params) = request
            .adapt_id
            .map(|adapt| (adapt.contract, adapt.parameters))
            .unwrap_or_default();
        let fee = request
            .relayer_fee
            .as_ref()
            .map(|fee| fee.amount)
            .unwrap_or_default();
        let min_gas_price = U256::from(request.overall_batch_min_gas_price.unwrap_or_default());
        keccak256((adapt_contract, adapt_params, fee, min_gas_price).abi_encode())
    }

    fn pseudo_proof(mode: ProofMode, seed: B256) -> Bytes {
        match mode {
            ProofMode::Dummy => Bytes::from(vec![0u8; PROOF_WORDS * 32]),
            ProofMode::Full => {
                let mut word = seed;
                let mut proof = Vec::with_capacity(PROOF_WORDS * 32);
                for _ in 0..PROOF_WORDS {
                    word = keccak256(word);
                    proof.extend_from_slice(word.as_slice());
                }
                Bytes::from(proof)
            }
        }
    }

    fn unsigned_call(&self, to: Address, input: Vec<u8>) -> TransactionRequest {
        TransactionRequest {
            from: self.sender,
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(Bytes::from(input)),
            ..Default::default()
        }
    }
}

fn ensure_full(batch: &TransactionBatch) -> Result<(), ProverError> {
    if batch.mode == ProofMode::Dummy {
        return Err(ProverError::Populate(
            "dummy proofs cannot be populated for broadcast".into(),
        ));
    }
    Ok(())
}

impl TransactionProver for MockProver {
    async fn prove_transactions(
        &self,
        request: &ProveRequest,
        mode: ProofMode,
        progress: ProgressCallback<'_>,
    ) -> Result<TransactionBatch, ProverError> {
        self.calls.lock().await.push(RecordedProof {
            mode,
            request: request.clone(),
        });

        if let Some(failure) = &self.failure {
            if failure.mode.map_or(true, |m| m == mode) {
                return Err(ProverError::ProofFailed(failure.message.clone()));
            }
        }
        if request.encryption_key.expose().is_empty() {
            return Err(ProverError::WalletNotFound(request.railgun_wallet_id.clone()));
        }
        self.check_balances(request)?;

        let outputs: Vec<(Address, U256, &str)> = request
            .token_amount_recipients
            .iter()
            .map(|t| (t.token_address, t.amount, t.recipient_address.as_str()))
            .chain(
                request
                    .nft_amount_recipients
                    .iter()
                    .map(|n| (n.nft_address, n.amount, n.recipient_address.as_str())),
            )
            .collect();
        if outputs.is_empty() {
            return Err(ProverError::ProofFailed("nothing to prove".into()));
        }

        let report = |value: f64| {
            if mode == ProofMode::Full {
                progress(value);
            }
        };
        report(0.0);

        let bound_params_hash = Self::bound_params_hash(request);
        let total = outputs.len();
        let mut transactions = Vec::with_capacity(total);
        for (index, (token, amount, recipient)) in outputs.into_iter().enumerate() {
            let index = U256::from(index);
            let nullifier = keccak256(
                (request.railgun_wallet_id.clone(), token, amount, index).abi_encode(),
            );
            let commitment =
                keccak256((recipient.to_string(), token, amount, index).abi_encode());
            let seed = keccak256((nullifier, commitment, bound_params_hash).abi_encode());
            transactions.push(ProvedTransact {
                nullifiers: vec![nullifier],
                commitments: vec![commitment],
                bound_params_hash,
                proof: Self::pseudo_proof(mode, seed),
            });
            report(transactions.len() as f64 / total as f64);
        }

        Ok(TransactionBatch { mode, transactions })
    }

    async fn populate_transact(
        &self,
        batch: &TransactionBatch,
        network: &NetworkConfig,
    ) -> Result<TransactionRequest, ProverError> {
        ensure_full(batch)?;
        let call = IShieldedPool::transactCall {
            transactions: snark_transactions(batch),
        };
        Ok(self.unsigned_call(network.proxy_contract, call.abi_encode()))
    }

    async fn populate_relay_adapt(
        &self,
        batch: &TransactionBatch,
        network: &NetworkConfig,
        action: &RelayAdaptAction,
        random: RelayAdaptRandom,
    ) -> Result<TransactionRequest, ProverError> {
        ensure_full(batch)?;
        let transactions = snark_transactions(batch);
        let input = match action {
            RelayAdaptAction::UnwrapBaseToken { destination } => {
                IRelayAdapt::unwrapBaseTokenCall {
                    transactions,
                    destination: *destination,
                    random: random.0,
                }
                .abi_encode()
            }
            RelayAdaptAction::CrossContractCalls {
                shield_token_addresses,
                calls,
            } => IRelayAdapt::relayCall {
                transactions,
                random: random.0,
                shieldTokens: shield_token_addresses.clone(),
                calls: calls.clone(),
            }
            .abi_encode(),
        };
        Ok(self.unsigned_call(network.relay_adapt_contract, input))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::domain::network::NetworkName;
    use crate::domain::proof_type::ProofType;
    use crate::domain::token::TokenAmount;
    use crate::domain::wallet::EncryptionKey;

    fn request(amount: u64) -> ProveRequest {
        ProveRequest {
            proof_type: ProofType::Transfer,
            network: NetworkName::Hardhat,
            railgun_wallet_id: "wallet-w".into(),
            encryption_key: EncryptionKey::new("key"),
            memo_text: None,
            show_sender_address_to_recipient: false,
            token_amount_recipients: vec![TokenAmount::new(
                Address::repeat_byte(0xAA),
                U256::from(amount),
            )
            .with_recipient("0zk1recipient")],
            nft_amount_recipients: vec![],
            relayer_fee: None,
            send_with_public_wallet: true,
            overall_batch_min_gas_price: None,
            adapt_id: None,
        }
    }

    fn network() -> NetworkConfig {
        NetworkConfig::new(
            NetworkName::Hardhat,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
        )
    }

    #[tokio::test]
    async fn dummy_and_full_spend_the_same_notes() {
        let prover = MockProver::new();
        let dummy = prover
            .prove_transactions(&request(10), ProofMode::Dummy, &|_| {})
            .await
            .unwrap();
        let full = prover
            .prove_transactions(&request(10), ProofMode::Full, &|_| {})
            .await
            .unwrap();
        assert_eq!(dummy.nullifiers(), full.nullifiers());
        assert_ne!(dummy.transactions[0].proof, full.transactions[0].proof);
        assert_eq!(prover.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn full_mode_reports_monotonic_progress() {
        let prover = MockProver::new();
        let seen = StdMutex::new(Vec::new());
        let record = |value: f64| seen.lock().unwrap().push(value);
        prover
            .prove_transactions(&request(10), ProofMode::Full, &record)
            .await
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn insufficient_balance_is_reported() {
        let prover = MockProver::new().with_balance(Address::repeat_byte(0xAA), U256::from(5));
        let result = prover
            .prove_transactions(&request(10), ProofMode::Full, &|_| {})
            .await;
        assert!(matches!(result, Err(ProverError::InsufficientBalance(_))));
    }

    #[tokio::test]
    async fn wallet_cannot_be_opened_without_key() {
        let prover = MockProver::new();
        let mut locked = request(10);
        locked.encryption_key = EncryptionKey::new("");
        let result = prover
            .prove_transactions(&locked, ProofMode::Full, &|_| {})
            .await;
        assert!(matches!(result, Err(ProverError::WalletNotFound(id)) if id == "wallet-w"));
    }

    #[tokio::test]
    async fn populate_targets_proxy_without_sender() {
        let prover = MockProver::new();
        let batch = prover
            .prove_transactions(&request(10), ProofMode::Full, &|_| {})
            .await
            .unwrap();
        let tx = prover.populate_transact(&batch, &network()).await.unwrap();
        assert_eq!(tx.to, Some(TxKind::Call(Address::repeat_byte(0x11))));
        assert_eq!(tx.from, None);
        let input = tx.input.input().unwrap();
        assert_eq!(&input[..4], IShieldedPool::transactCall::SELECTOR.as_slice());
    }

    #[tokio::test]
    async fn dummy_batch_cannot_be_populated() {
        let prover = MockProver::new();
        let batch = prover
            .prove_transactions(&request(10), ProofMode::Dummy, &|_| {})
            .await
            .unwrap();
        let result = prover.populate_transact(&batch, &network()).await;
        assert!(matches!(result, Err(ProverError::Populate(_))));
    }
}
