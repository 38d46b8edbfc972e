pub mod abi;
pub mod address;
pub mod mock_prover;
pub mod relay_adapt;
