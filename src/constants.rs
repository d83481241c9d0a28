//! Protocol-wide constants


// ==================================
// BN254 moduli
// ==================================

/// Scalar-field modulus `r` (decimal). Every leaf, node and public signal is below it.
pub const SCALAR_FIELD_MODULUS_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Base-field modulus `q` (big-endian). Curve-point coordinates live below it.
pub const BASE_FIELD_MODULUS_BE: [u8; 32] = [
    0x30,0x64,0x4e,0x72,0xe1,0x31,0xa0,0x29,0xb8,0x50,0x45,0xb6,0x81,0x81,0x58,0x5d,
    0x97,0x81,0x6a,0x91,0x68,0x71,0xca,0x8d,0x3c,0x20,0x8c,0x16,0xd8,0x7c,0xfd,0x47,
];

// ==========================
// Accumulator configuration
// ==========================

/// Sibling arrays handed to the withdrawal circuit are padded to this depth.
pub const MAX_TREE_DEPTH: usize = 32;

/// How many historical state roots are accepted for a withdrawal.
pub const ROOT_HISTORY_SIZE: usize = 64;

// ==================================
// Groth16 / BN254 byte-size helpers
// ==================================

/// Field element size in bytes (BN254 Fr)
pub const FIELD_BYTES: usize = 32;
/// G1 point = (x,y) = 2 * 32
pub const G1_BYTES: usize = 64;
/// G2 point = (x.im, x.re, y.im, y.re) = 4 * 32
pub const G2_BYTES: usize = 128;
/// Groth16 proof bytes = A(G1) + B(G2) + C(G1)
pub const PROOF_BYTES_LEN: usize = G1_BYTES + G2_BYTES + G1_BYTES; // 256
/// Little-endian u32 prefix carrying the public-signal count.
pub const SIGNAL_COUNT_BYTES: usize = 4;

// =====================================================
// Public-signal counts (must match the circuits)
// =====================================================

/// withdraw publicSignals count:
/// [withdrawnValue, stateRoot, stateTreeDepth, ASPRoot, ASPTreeDepth, context,
///  newCommitmentHash, existingNullifierHash]
pub const NPUB_WITHDRAW: usize = 8;

/// ragequit publicSignals count:
/// [value, label, commitmentHash, nullifierHash]
pub const NPUB_RAGEQUIT: usize = 4;

/// Positions inside the withdraw signal vector.
pub mod withdraw_idx {
    pub const WITHDRAWN_VALUE: usize         = 0;
    pub const STATE_ROOT: usize              = 1;
    pub const STATE_TREE_DEPTH: usize        = 2;
    pub const ASP_ROOT: usize                = 3;
    pub const ASP_TREE_DEPTH: usize          = 4;
    pub const CONTEXT: usize                 = 5;
    pub const NEW_COMMITMENT_HASH: usize     = 6;
    pub const EXISTING_NULLIFIER_HASH: usize = 7;
}

/// Positions inside the ragequit signal vector.
pub mod ragequit_idx {
    pub const VALUE: usize           = 0;
    pub const LABEL: usize           = 1;
    pub const COMMITMENT_HASH: usize = 2;
    pub const NULLIFIER_HASH: usize  = 3;
}

// ============
// Derivations
// ============

/// Domain tag prepended when hashing a withdrawal into its context value.
pub const WITHDRAWAL_CONTEXT_DOMAIN: &[u8] = b"IPrivacyPool.Withdrawal";

/// Widest Poseidon instance the circom parameters cover.
pub const MAX_POSEIDON_INPUTS: usize = 12;
