//! Privacy pool core: lib.rs
//!
//! Off-chain half of a shielded pool on Solana. Deposits grow two lean Merkle
//! accumulators (state commitments and approved labels); a withdrawal pulls an
//! inclusion proof from each, assembles the circuit inputs, runs the prover and
//! encodes the resulting Groth16 proof for the on-chain verifier.

#[macro_use]
pub mod utils;

pub mod constants;
pub mod error;
pub mod field;
pub mod hasher;
pub mod merkle;
pub mod prover;
pub mod state;
pub mod withdrawal;
pub mod zk_verifier;

pub use error::{PoolError, Result};
pub use field::Fr;
pub use hasher::{Hasher, PoseidonHasher};
pub use merkle::{pad_siblings, verify_proof, InclusionProof, LeanAccumulator, SharedAccumulator};
pub use prover::{
    prove_withdrawal, prove_withdrawals_parallel, ProverConfig, ProvingEngine, SnarkjsProver,
};
pub use state::RootHistory;
pub use withdrawal::{
    Commitment, RagequitInputs, WithdrawalInputBuilder, WithdrawalInputs, WithdrawalRequest,
};
pub use zk_verifier::{encode_verifier_payload, ProofArtifact};
