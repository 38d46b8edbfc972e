//! Proof reuse and two-phase proof assembly for shielded-pool transactions.
//!
//! A zero-knowledge proof is expensive to compute, so the most recent fully
//! proved transaction is kept in a single-slot [`cache::ProofCache`] together
//! with the exact parameters it was proved over. Before broadcast, the caller's
//! current parameters are validated against that set and late-bound gas
//! details are merged into the cached transaction. Any mismatch means re-prove.
//!
//! Proof types that route value through the relay adapt contract are proved
//! twice by the [`assembler::ProofAssembler`]: a dummy proof to learn the
//! transaction shape, then a final proof bound to the derived relay-adapt
//! parameters.

pub mod adapters;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod domain;
pub mod gas;
pub mod ports;
