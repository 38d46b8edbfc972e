pub mod compare;
pub mod gas;
pub mod network;
pub mod proof_type;
pub mod proved;
pub mod relay_adapt;
pub mod request;
pub mod token;
pub mod wallet;
