use alloy_primitives::Address;

use super::network::NetworkName;
use super::proof_type::ProofType;
use super::proved::ProofParams;
use super::token::{NftAmountRecipient, TokenAmount, TokenAmountRecipient};
use super::wallet::EncryptionKey;

/// Settings shared by every proof request.
#[derive(Debug, Clone)]
pub struct ProofContext {
    pub network: NetworkName,
    pub railgun_wallet_id: String,
    pub encryption_key: EncryptionKey,
    /// Shielded address of the relayer collecting the fee, if one is used.
    pub relayer_railgun_address: Option<String>,
    pub relayer_fee_token_amount: Option<TokenAmount>,
    pub send_with_public_wallet: bool,
    pub overall_batch_min_gas_price: Option<u128>,
}

impl ProofContext {
    pub fn new(
        network: NetworkName,
        railgun_wallet_id: impl Into<String>,
        encryption_key: EncryptionKey,
    ) -> Self {
        Self {
            network,
            railgun_wallet_id: railgun_wallet_id.into(),
            encryption_key,
            relayer_railgun_address: None,
            relayer_fee_token_amount: None,
            send_with_public_wallet: true,
            overall_batch_min_gas_price: None,
        }
    }

    /// Pay `fee` to the relayer at `relayer_railgun_address` instead of sending publicly.
    pub fn with_relayer(mut self, relayer_railgun_address: impl Into<String>, fee: TokenAmount) -> Self {
        self.relayer_railgun_address = Some(relayer_railgun_address.into());
        self.relayer_fee_token_amount = Some(fee);
        self.send_with_public_wallet = false;
        self
    }

    pub fn with_overall_batch_min_gas_price(mut self, min_gas_price: u128) -> Self {
        self.overall_batch_min_gas_price = Some(min_gas_price);
        self
    }

    /// The relayer fee as a triple, when both the fee and the relayer are known.
    pub fn relayer_fee(&self) -> Option<TokenAmountRecipient> {
        match (&self.relayer_fee_token_amount, &self.relayer_railgun_address) {
            (Some(fee), Some(relayer)) => Some(fee.with_recipient(relayer.as_str())),
            _ => None,
        }
    }
}

/// A request for one proof, typed by proof kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofRequest {
    Transfer {
        token_amount_recipients: Vec<TokenAmountRecipient>,
        nft_amount_recipients: Vec<NftAmountRecipient>,
        memo_text: Option<String>,
        show_sender_address_to_recipient: bool,
    },
    Unshield {
        token_amount_recipients: Vec<TokenAmountRecipient>,
        nft_amount_recipients: Vec<NftAmountRecipient>,
    },
    UnshieldBaseToken {
        public_wallet_address: String,
        wrapped_token_amount: TokenAmount,
    },
    CrossContractCalls {
        relay_adapt_unshield_token_amounts: Vec<TokenAmount>,
        relay_adapt_shield_token_addresses: Vec<String>,
        cross_contract_calls_serialized: Vec<String>,
    },
    Withdraw {
        to_wallet_address: String,
        token_amounts: Vec<TokenAmount>,
    },
    WithdrawBaseToken {
        to_wallet_address: String,
        wrapped_token_amount: TokenAmount,
    },
}

impl ProofRequest {
    pub fn proof_type(&self) -> ProofType {
        match self {
            ProofRequest::Transfer { .. } => ProofType::Transfer,
            ProofRequest::Unshield { .. } => ProofType::Unshield,
            ProofRequest::UnshieldBaseToken { .. } => ProofType::UnshieldBaseToken,
            ProofRequest::CrossContractCalls { .. } => ProofType::CrossContractCalls,
            ProofRequest::Withdraw { .. } => ProofType::Withdraw,
            ProofRequest::WithdrawBaseToken { .. } => ProofType::WithdrawBaseToken,
        }
    }

    /// The parameter set a successful proof of this request is cached under.
    ///
    /// Callers validating before broadcast can rebuild the same set from the
    /// same context and request.
    pub fn proof_params(&self, ctx: &ProofContext) -> ProofParams {
        let mut params = ProofParams {
            proof_type: self.proof_type(),
            railgun_wallet_id: ctx.railgun_wallet_id.clone(),
            show_sender_address_to_recipient: false,
            memo_text: None,
            token_amount_recipients: Vec::new(),
            nft_amount_recipients: Vec::new(),
            relay_adapt_unshield_token_amounts: None,
            relay_adapt_shield_token_addresses: None,
            cross_contract_calls_serialized: None,
            relayer_fee_token_amount_recipient: ctx.relayer_fee(),
            send_with_public_wallet: ctx.send_with_public_wallet,
            overall_batch_min_gas_price: ctx.overall_batch_min_gas_price,
        };

        match self {
            ProofRequest::Transfer {
                token_amount_recipients,
                nft_amount_recipients,
                memo_text,
                show_sender_address_to_recipient,
            } => {
                params.token_amount_recipients = token_amount_recipients.clone();
                params.nft_amount_recipients = nft_amount_recipients.clone();
                params.memo_text = memo_text.clone();
                params.show_sender_address_to_recipient = *show_sender_address_to_recipient;
            }
            ProofRequest::Unshield {
                token_amount_recipients,
                nft_amount_recipients,
            } => {
                params.token_amount_recipients = token_amount_recipients
                    .iter()
                    .map(|recipient| TokenAmountRecipient {
                        recipient_address: canonical_public_address(&recipient.recipient_address),
                        ..recipient.clone()
                    })
                    .collect();
                params.nft_amount_recipients = nft_amount_recipients
                    .iter()
                    .map(|recipient| NftAmountRecipient {
                        recipient_address: canonical_public_address(&recipient.recipient_address),
                        ..recipient.clone()
                    })
                    .collect();
            }
            ProofRequest::UnshieldBaseToken {
                public_wallet_address: destination,
                wrapped_token_amount,
            }
            | ProofRequest::WithdrawBaseToken {
                to_wallet_address: destination,
                wrapped_token_amount,
            } => {
                params.token_amount_recipients =
                    vec![wrapped_token_amount.with_recipient(canonical_public_address(destination))];
            }
            ProofRequest::CrossContractCalls {
                relay_adapt_unshield_token_amounts,
                relay_adapt_shield_token_addresses,
                cross_contract_calls_serialized,
            } => {
                params.relay_adapt_unshield_token_amounts =
                    Some(relay_adapt_unshield_token_amounts.clone());
                params.relay_adapt_shield_token_addresses =
                    Some(relay_adapt_shield_token_addresses.clone());
                params.cross_contract_calls_serialized = Some(cross_contract_calls_serialized.clone());
            }
            ProofRequest::Withdraw {
                to_wallet_address,
                token_amounts,
            } => {
                let destination = canonical_public_address(to_wallet_address);
                params.token_amount_recipients = token_amounts
                    .iter()
                    .map(|token_amount| token_amount.with_recipient(destination.as_str()))
                    .collect();
            }
        }
        params
    }
}

/// Checksummed spelling of a public address, so any casing of the same
/// address yields the same params. Unparseable input is kept verbatim.
fn canonical_public_address(address: &str) -> String {
    address
        .parse::<Address>()
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| address.to_string())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::*;

    fn ctx() -> ProofContext {
        ProofContext::new(NetworkName::Hardhat, "wallet-w", EncryptionKey::new("key"))
    }

    #[test]
    fn withdraw_params_attach_destination_to_every_amount() {
        let weth = TokenAmount::new(Address::repeat_byte(0x01), U256::from(5));
        let dai = TokenAmount::new(Address::repeat_byte(0x02), U256::from(6));
        let request = ProofRequest::Withdraw {
            to_wallet_address: "0x1111111111111111111111111111111111111111".into(),
            token_amounts: vec![weth, dai],
        };
        let params = request.proof_params(&ctx());
        assert_eq!(params.proof_type, ProofType::Withdraw);
        assert_eq!(params.token_amount_recipients.len(), 2);
        assert!(params
            .token_amount_recipients
            .iter()
            .all(|t| t.recipient_address == "0x1111111111111111111111111111111111111111"));
        assert!(params.send_with_public_wallet);
        assert_eq!(params.relayer_fee_token_amount_recipient, None);
    }

    #[test]
    fn public_destinations_are_cached_checksummed() {
        let lower = "0xfa7093cdd9ee6932b4eb2c9e1cde7ce00b1fa4b9";
        let checksummed = lower.parse::<Address>().unwrap().to_string();
        assert_ne!(lower, checksummed);

        let amount = TokenAmount::new(Address::repeat_byte(0x01), U256::from(5));
        let withdraw = |to: &str| ProofRequest::Withdraw {
            to_wallet_address: to.into(),
            token_amounts: vec![amount.clone()],
        };
        let params = withdraw(lower).proof_params(&ctx());
        assert_eq!(params.token_amount_recipients[0].recipient_address, checksummed);
        assert_eq!(params, withdraw(checksummed.as_str()).proof_params(&ctx()));

        let unshield = ProofRequest::Unshield {
            token_amount_recipients: vec![amount.with_recipient(lower.to_uppercase().replace("0X", "0x"))],
            nft_amount_recipients: vec![],
        };
        assert_eq!(
            unshield.proof_params(&ctx()).token_amount_recipients[0].recipient_address,
            checksummed
        );
    }

    #[test]
    fn unparseable_destination_is_kept_verbatim() {
        assert_eq!(canonical_public_address("not-an-address"), "not-an-address");
    }

    #[test]
    fn relayer_context_sets_fee_and_disables_public_send() {
        let fee = TokenAmount::new(Address::repeat_byte(0x01), U256::from(1));
        let ctx = ctx().with_relayer("0zk1relayer", fee.clone());
        let request = ProofRequest::WithdrawBaseToken {
            to_wallet_address: "0x2222222222222222222222222222222222222222".into(),
            wrapped_token_amount: TokenAmount::new(Address::repeat_byte(0x03), U256::from(9)),
        };
        let params = request.proof_params(&ctx);
        assert!(!params.send_with_public_wallet);
        assert_eq!(
            params.relayer_fee_token_amount_recipient,
            Some(fee.with_recipient("0zk1relayer"))
        );
        assert_eq!(
            params.token_amount_recipients[0].recipient_address,
            "0x2222222222222222222222222222222222222222"
        );
    }

    #[test]
    fn cross_contract_calls_fill_relay_fields_only() {
        let request = ProofRequest::CrossContractCalls {
            relay_adapt_unshield_token_amounts: vec![TokenAmount::new(
                Address::repeat_byte(0x01),
                U256::from(3),
            )],
            relay_adapt_shield_token_addresses: vec!["0xshield".into()],
            cross_contract_calls_serialized: vec!["0xcalldata".into()],
        };
        let params = request.proof_params(&ctx());
        assert!(params.token_amount_recipients.is_empty());
        assert_eq!(params.cross_contract_calls_serialized, Some(vec!["0xcalldata".to_string()]));
    }
}
