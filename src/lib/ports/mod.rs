pub mod address;
pub mod prover;
pub mod relay_adapt;

use alloy::primitives::{Bytes, B256};

use crate::domain::network::NetworkName;
use crate::domain::proof_type::ProofType;
use crate::domain::relay_adapt::AdaptId;
use crate::domain::token::{NftAmountRecipient, TokenAmountRecipient};
use crate::domain::wallet::EncryptionKey;

/// Whether the engine computes a real proof or a cheap placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMode {
    /// Non-binding proof used only to learn the transaction shape. Never broadcast.
    Dummy,
    Full,
}

/// One proved shielded-pool transaction as returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvedTransact {
    /// Nullifiers of the notes this transaction spends
    pub nullifiers: Vec<B256>,
    /// Commitments of the notes it creates
    pub commitments: Vec<B256>,
    /// Hash of the bound parameters (adapt id, fee, unshield data)
    pub bound_params_hash: B256,
    /// Serialized proof
    pub proof: Bytes,
}

/// The set of transactions produced for a single proof request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBatch {
    pub mode: ProofMode,
    pub transactions: Vec<ProvedTransact>,
}

impl TransactionBatch {
    /// Nullifiers grouped per transaction, in order.
    pub fn nullifiers(&self) -> Vec<Vec<B256>> {
        self.transactions
            .iter()
            .map(|tx| tx.nullifiers.clone())
            .collect()
    }
}

/// Everything the engine needs to prove a request.
#[derive(Debug, Clone)]
pub struct ProveRequest {
    pub proof_type: ProofType,
    pub network: NetworkName,
    pub railgun_wallet_id: String,
    pub encryption_key: EncryptionKey,
    pub memo_text: Option<String>,
    pub show_sender_address_to_recipient: bool,
    /// Recipients as seen by the circuit. For relay-adapt proofs this is the
    /// relay contract, not the end user.
    pub token_amount_recipients: Vec<TokenAmountRecipient>,
    pub nft_amount_recipients: Vec<NftAmountRecipient>,
    pub relayer_fee: Option<TokenAmountRecipient>,
    pub send_with_public_wallet: bool,
    pub overall_batch_min_gas_price: Option<u128>,
    /// Public input binding the proof to a relay call. Absent for direct proofs
    /// and for the dummy phase.
    pub adapt_id: Option<AdaptId>,
}
