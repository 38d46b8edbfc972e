use crate::ports::address::RailgunAddressValidator;

const PREFIX: &str = "0zk1";
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Structural check for shielded addresses: `0zk1` prefix followed by a
/// lowercase bech32m data part.
///
/// Does not verify the checksum; the engine rejects undecodable addresses
/// when it builds the note.
#[derive(Debug, Clone)]
pub struct Bech32AddressValidator {
    min_data_len: usize,
}

impl Bech32AddressValidator {
    pub fn new(min_data_len: usize) -> Self {
        Self { min_data_len }
    }
}

impl Default for Bech32AddressValidator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl RailgunAddressValidator for Bech32AddressValidator {
    fn is_valid(&self, address: &str) -> bool {
        let Some(data) = address.strip_prefix(PREFIX) else {
            return false;
        };
        data.len() >= self.min_data_len && data.chars().all(|c| BECH32_CHARSET.contains(c))
    }
}
