use alloy::sol;

use crate::ports::{ProvedTransact, TransactionBatch};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct SnarkTransaction {
        bytes32[] nullifiers;
        bytes32[] commitments;
        bytes32 boundParamsHash;
        bytes proof;
    }

    interface IShieldedPool {
        function transact(SnarkTransaction[] transactions) external;
    }

    interface IRelayAdapt {
        function unwrapBaseToken(
            SnarkTransaction[] transactions,
            address destination,
            bytes16 random
        ) external;

        function relay(
            SnarkTransaction[] transactions,
            bytes16 random,
            string[] shieldTokens,
            string[] calls
        ) external payable;
    }
}

impl From<&ProvedTransact> for SnarkTransaction {
    fn from(tx: &ProvedTransact) -> Self {
        Self {
            nullifiers: tx.nullifiers.clone(),
            commitments: tx.commitments.clone(),
            boundParamsHash: tx.bound_params_hash,
            proof: tx.proof.clone(),
        }
    }
}

/// ABI form of every transaction in a batch.
pub fn snark_transactions(batch: &TransactionBatch) -> Vec<SnarkTransaction> {
    batch.transactions.iter().map(SnarkTransaction::from).collect()
}
