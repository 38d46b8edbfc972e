use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An ERC-20 amount without a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token_address: Address,
    pub amount: U256,
}

impl TokenAmount {
    pub fn new(token_address: Address, amount: U256) -> Self {
        Self {
            token_address,
            amount,
        }
    }

    /// Attach a recipient, producing the triple a proof attests to.
    pub fn with_recipient(&self, recipient_address: impl Into<String>) -> TokenAmountRecipient {
        TokenAmountRecipient {
            token_address: self.token_address,
            amount: self.amount,
            recipient_address: recipient_address.into(),
        }
    }
}

/// A (token, amount, recipient) triple.
///
/// The recipient is kept as the string the caller supplied: a shielded
/// address for transfers, a public address for unshields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmountRecipient {
    pub token_address: Address,
    pub amount: U256,
    pub recipient_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NftTokenType {
    Erc721,
    Erc1155,
}

/// An NFT (contract, sub id, amount, recipient) entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NftAmountRecipient {
    pub nft_address: Address,
    pub nft_token_type: NftTokenType,
    pub token_sub_id: U256,
    pub amount: U256,
    pub recipient_address: String,
}
