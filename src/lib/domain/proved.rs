use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};

use super::compare::{
    compare_nft_amount_recipients, compare_strings, compare_token_amount_recipient,
    compare_token_amount_recipients, compare_token_amounts,
};
use super::proof_type::ProofType;
use super::token::{NftAmountRecipient, TokenAmount, TokenAmountRecipient};

/// The economic statement a proof attests to.
///
/// Every field here is checked before a cached proof may be reused; gas
/// details are deliberately absent because they are bound at broadcast time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofParams {
    pub proof_type: ProofType,
    pub railgun_wallet_id: String,
    pub show_sender_address_to_recipient: bool,
    pub memo_text: Option<String>,
    pub token_amount_recipients: Vec<TokenAmountRecipient>,
    pub nft_amount_recipients: Vec<NftAmountRecipient>,
    pub relay_adapt_unshield_token_amounts: Option<Vec<TokenAmount>>,
    pub relay_adapt_shield_token_addresses: Option<Vec<String>>,
    pub cross_contract_calls_serialized: Option<Vec<String>>,
    pub relayer_fee_token_amount_recipient: Option<TokenAmountRecipient>,
    pub send_with_public_wallet: bool,
    pub overall_batch_min_gas_price: Option<u128>,
}

/// Field of [`ProofParams`] that differed from the cached proof.
///
/// `Display` yields the camelCase field name used in mismatch reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParamMismatch {
    #[error("proofType")]
    ProofType,
    #[error("railgunWalletID")]
    RailgunWalletId,
    #[error("showSenderAddressToRecipient")]
    ShowSenderAddressToRecipient,
    #[error("memoText")]
    MemoText,
    #[error("tokenAmountRecipients")]
    TokenAmountRecipients,
    #[error("nftAmountRecipients")]
    NftAmountRecipients,
    #[error("relayAdaptUnshieldTokenAmounts")]
    RelayAdaptUnshieldTokenAmounts,
    #[error("relayAdaptShieldTokenAddresses")]
    RelayAdaptShieldTokenAddresses,
    #[error("crossContractCallsSerialized")]
    CrossContractCallsSerialized,
    #[error("relayerFeeTokenAmountRecipient")]
    RelayerFeeTokenAmountRecipient,
    #[error("sendWithPublicWallet")]
    SendWithPublicWallet,
    #[error("overallBatchMinGasPrice")]
    OverallBatchMinGasPrice,
}

impl ProofParams {
    /// First field, in checking order, where `candidate` differs from `self`.
    ///
    /// Checking stops at the first mismatch. Transfer-only disclosures are
    /// compared only for transfers, and token amount recipients are skipped
    /// for cross-contract calls.
    pub fn first_mismatch(&self, candidate: &ProofParams) -> Option<ParamMismatch> {
        if self.proof_type != candidate.proof_type {
            return Some(ParamMismatch::ProofType);
        }
        if self.railgun_wallet_id != candidate.railgun_wallet_id {
            return Some(ParamMismatch::RailgunWalletId);
        }
        let proof_type = candidate.proof_type;
        if proof_type.carries_transfer_disclosures() {
            if self.show_sender_address_to_recipient != candidate.show_sender_address_to_recipient {
                return Some(ParamMismatch::ShowSenderAddressToRecipient);
            }
            if self.memo_text != candidate.memo_text {
                return Some(ParamMismatch::MemoText);
            }
        }
        if proof_type.binds_token_amount_recipients()
            && !compare_token_amount_recipients(
                &candidate.token_amount_recipients,
                &self.token_amount_recipients,
            )
        {
            return Some(ParamMismatch::TokenAmountRecipients);
        }
        if !compare_nft_amount_recipients(
            &candidate.nft_amount_recipients,
            &self.nft_amount_recipients,
        ) {
            return Some(ParamMismatch::NftAmountRecipients);
        }
        if !compare_token_amounts(
            candidate.relay_adapt_unshield_token_amounts.as_deref(),
            self.relay_adapt_unshield_token_amounts.as_deref(),
        ) {
            return Some(ParamMismatch::RelayAdaptUnshieldTokenAmounts);
        }
        if !compare_strings(
            candidate.relay_adapt_shield_token_addresses.as_deref(),
            self.relay_adapt_shield_token_addresses.as_deref(),
        ) {
            return Some(ParamMismatch::RelayAdaptShieldTokenAddresses);
        }
        if !compare_strings(
            candidate.cross_contract_calls_serialized.as_deref(),
            self.cross_contract_calls_serialized.as_deref(),
        ) {
            return Some(ParamMismatch::CrossContractCallsSerialized);
        }
        if !compare_token_amount_recipient(
            self.relayer_fee_token_amount_recipient.as_ref(),
            candidate.relayer_fee_token_amount_recipient.as_ref(),
        ) {
            return Some(ParamMismatch::RelayerFeeTokenAmountRecipient);
        }
        if self.send_with_public_wallet != candidate.send_with_public_wallet {
            return Some(ParamMismatch::SendWithPublicWallet);
        }
        if self.overall_batch_min_gas_price != candidate.overall_batch_min_gas_price {
            return Some(ParamMismatch::OverallBatchMinGasPrice);
        }
        None
    }
}

/// A fully proved, unsigned transaction and the parameters it was proved over.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvedTransaction {
    pub params: ProofParams,
    /// Unsigned and unfunded. The sender is bound only at broadcast time.
    pub populated_transaction: TransactionRequest,
}

impl ProvedTransaction {
    pub fn proof_type(&self) -> ProofType {
        self.params.proof_type
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::*;
    use crate::domain::token::NftTokenType;

    fn transfer_params() -> ProofParams {
        let token = TokenAmount::new(Address::repeat_byte(0xAA), U256::from(10));
        ProofParams {
            proof_type: ProofType::Transfer,
            railgun_wallet_id: "wallet-w".into(),
            show_sender_address_to_recipient: true,
            memo_text: Some("rent".into()),
            token_amount_recipients: vec![token.with_recipient("0zk1recipient")],
            nft_amount_recipients: vec![NftAmountRecipient {
                nft_address: Address::repeat_byte(0xBB),
                nft_token_type: NftTokenType::Erc721,
                token_sub_id: U256::from(7),
                amount: U256::from(1),
                recipient_address: "0zk1recipient".into(),
            }],
            relay_adapt_unshield_token_amounts: Some(vec![token.clone()]),
            relay_adapt_shield_token_addresses: Some(vec!["0xshield".into()]),
            cross_contract_calls_serialized: Some(vec!["0xcall".into()]),
            relayer_fee_token_amount_recipient: Some(
                TokenAmount::new(Address::repeat_byte(0xAA), U256::from(1)).with_recipient("0zk1relayer"),
            ),
            send_with_public_wallet: false,
            overall_batch_min_gas_price: Some(1_000),
        }
    }

    type Perturbation = Box<dyn Fn(&mut ProofParams)>;

    fn perturb(f: impl Fn(&mut ProofParams) + 'static) -> Perturbation {
        Box::new(f)
    }

    /// One perturbation per checked field, paired with the expected reason.
    fn perturbations() -> Vec<(ParamMismatch, Perturbation)> {
        vec![
            (ParamMismatch::ProofType, perturb(|p| p.proof_type = ProofType::Unshield)),
            (ParamMismatch::RailgunWalletId, perturb(|p| p.railgun_wallet_id = "other".into())),
            (
                ParamMismatch::ShowSenderAddressToRecipient,
                perturb(|p| p.show_sender_address_to_recipient = false),
            ),
            (ParamMismatch::MemoText, perturb(|p| p.memo_text = None)),
            (
                ParamMismatch::TokenAmountRecipients,
                perturb(|p| p.token_amount_recipients[0].amount = U256::from(11)),
            ),
            (
                ParamMismatch::NftAmountRecipients,
                perturb(|p| p.nft_amount_recipients.clear()),
            ),
            (
                ParamMismatch::RelayAdaptUnshieldTokenAmounts,
                perturb(|p| p.relay_adapt_unshield_token_amounts = None),
            ),
            (
                ParamMismatch::RelayAdaptShieldTokenAddresses,
                perturb(|p| p.relay_adapt_shield_token_addresses = Some(vec!["0xother".into()])),
            ),
            (
                ParamMismatch::CrossContractCallsSerialized,
                perturb(|p| p.cross_contract_calls_serialized = Some(vec![])),
            ),
            (
                ParamMismatch::RelayerFeeTokenAmountRecipient,
                perturb(|p| p.relayer_fee_token_amount_recipient = None),
            ),
            (
                ParamMismatch::SendWithPublicWallet,
                perturb(|p| p.send_with_public_wallet = true),
            ),
            (
                ParamMismatch::OverallBatchMinGasPrice,
                perturb(|p| p.overall_batch_min_gas_price = None),
            ),
        ]
    }

    #[test]
    fn identical_params_match() {
        let params = transfer_params();
        assert_eq!(params.first_mismatch(&params.clone()), None);
    }

    #[test]
    fn each_single_field_perturbation_is_named() {
        let cached = transfer_params();
        for (expected, apply) in perturbations() {
            let mut candidate = cached.clone();
            apply(&mut candidate);
            assert_eq!(cached.first_mismatch(&candidate), Some(expected), "{expected}");
        }
    }

    #[test]
    fn first_mismatch_wins() {
        let cached = transfer_params();
        let mut candidate = cached.clone();
        candidate.memo_text = Some("different".into());
        candidate.send_with_public_wallet = true;
        assert_eq!(cached.first_mismatch(&candidate), Some(ParamMismatch::MemoText));
    }

    #[test]
    fn disclosures_ignored_outside_transfers() {
        let mut cached = transfer_params();
        cached.proof_type = ProofType::Unshield;
        let mut candidate = cached.clone();
        candidate.memo_text = Some("ignored".into());
        candidate.show_sender_address_to_recipient = false;
        assert_eq!(cached.first_mismatch(&candidate), None);
    }

    #[test]
    fn cross_contract_calls_skip_token_recipients() {
        let mut cached = transfer_params();
        cached.proof_type = ProofType::CrossContractCalls;
        let mut candidate = cached.clone();
        candidate.token_amount_recipients.clear();
        assert_eq!(cached.first_mismatch(&candidate), None);
    }

    #[test]
    fn reordered_recipients_match() {
        let mut cached = transfer_params();
        cached.token_amount_recipients.push(
            TokenAmount::new(Address::repeat_byte(0xCC), U256::from(3)).with_recipient("0zk1other"),
        );
        let mut candidate = cached.clone();
        candidate.token_amount_recipients.reverse();
        assert_eq!(cached.first_mismatch(&candidate), None);
    }

    fn erc1155(sub_id: u64, amount: u64, recipient: &str) -> NftAmountRecipient {
        NftAmountRecipient {
            nft_address: Address::repeat_byte(0xDD),
            nft_token_type: NftTokenType::Erc1155,
            token_sub_id: U256::from(sub_id),
            amount: U256::from(amount),
            recipient_address: recipient.into(),
        }
    }

    #[test]
    fn reordered_nft_recipients_match() {
        let mut cached = transfer_params();
        cached.nft_amount_recipients.push(erc1155(1, 5, "0zk1recipient"));
        cached.nft_amount_recipients.push(erc1155(2, 3, "0zk1other"));
        let mut candidate = cached.clone();
        candidate.nft_amount_recipients.rotate_left(1);
        assert_ne!(candidate.nft_amount_recipients, cached.nft_amount_recipients);
        assert_eq!(cached.first_mismatch(&candidate), None);
    }

    #[test]
    fn nft_duplicate_counts_must_agree() {
        let mut cached = transfer_params();
        cached.nft_amount_recipients = vec![
            erc1155(1, 5, "0zk1recipient"),
            erc1155(1, 5, "0zk1recipient"),
            erc1155(2, 3, "0zk1other"),
        ];
        let mut candidate = cached.clone();
        candidate.nft_amount_recipients = vec![
            erc1155(2, 3, "0zk1other"),
            erc1155(1, 5, "0zk1recipient"),
            erc1155(2, 3, "0zk1other"),
        ];
        assert_eq!(
            cached.first_mismatch(&candidate),
            Some(ParamMismatch::NftAmountRecipients)
        );
    }

    #[test]
    fn mismatch_display_uses_field_name() {
        assert_eq!(ParamMismatch::RailgunWalletId.to_string(), "railgunWalletID");
        assert_eq!(ParamMismatch::TokenAmountRecipients.to_string(), "tokenAmountRecipients");
    }
}
