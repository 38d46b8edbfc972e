use alloy_primitives::{Address, B128, B256};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length in bytes of the per-attempt relay-adapt random.
pub const RELAY_ADAPT_RANDOM_LEN: usize = 16;

/// Fresh random mixed into relay-adapt parameters.
///
/// A new value is drawn for every proof attempt so two dummy proofs can never
/// collide on the same adapt parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayAdaptRandom(pub B128);

impl RelayAdaptRandom {
    pub fn generate() -> Self {
        let mut bytes = [0u8; RELAY_ADAPT_RANDOM_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(B128::from(bytes))
    }
}

/// Public input binding a final proof to one relay contract and parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdaptId {
    pub contract: Address,
    pub parameters: B256,
}

/// What the relay adapt contract does with the unshielded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayAdaptAction {
    /// Unwrap the wrapped base token and send it to `destination`.
    UnwrapBaseToken { destination: Address },
    /// Execute serialized calls, then shield the listed tokens back.
    CrossContractCalls {
        shield_token_addresses: Vec<String>,
        calls: Vec<String>,
    },
}
