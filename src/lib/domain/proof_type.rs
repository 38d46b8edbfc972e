use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of shielded transaction a proof was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofType {
    Transfer,
    Unshield,
    UnshieldBaseToken,
    CrossContractCalls,
    Withdraw,
    WithdrawBaseToken,
}

/// How a proof type is proved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvingPipeline {
    /// A single full proof straight from the request.
    Direct,
    /// Dummy proof, relay-adapt parameter derivation, then a full proof bound
    /// to the resulting adapt id.
    RelayAdapt,
}

impl ProofType {
    pub fn pipeline(self) -> ProvingPipeline {
        match self {
            ProofType::Transfer | ProofType::Unshield | ProofType::Withdraw => {
                ProvingPipeline::Direct
            }
            ProofType::UnshieldBaseToken
            | ProofType::CrossContractCalls
            | ProofType::WithdrawBaseToken => ProvingPipeline::RelayAdapt,
        }
    }

    /// Whether sender disclosure and memo text are part of the proof statement.
    pub fn carries_transfer_disclosures(self) -> bool {
        matches!(self, ProofType::Transfer)
    }

    /// Cross-contract calls describe value through the relay-adapt fields,
    /// not through token amount recipients.
    pub fn binds_token_amount_recipients(self) -> bool {
        !matches!(self, ProofType::CrossContractCalls)
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
