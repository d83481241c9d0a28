//! Proof artifacts and their encoding for the on-chain Groth16 verifier.

pub mod solana_verifier;
pub mod types;

#[cfg(feature = "real-crypto")]
pub mod groth16;

// Re-export encoders
pub use solana_verifier::{
    decode_verifier_payload,
    encode_g1_for_verifier,
    encode_g2_for_verifier,
    encode_proof,
    encode_public_signal,
    encode_public_signals,
    encode_verifier_payload,
    EncodedProof,
    VerifierPayload,
};

// Re-export types
pub use types::{
    public_signals_from_json,
    ProofArtifact,
    RagequitPublicSignals,
    SnarkjsProof,
    WithdrawPublicSignals,
};

#[cfg(feature = "real-crypto")]
pub use groth16::OffchainVerifier;
