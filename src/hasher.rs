//! Hashing capabilities consumed by the accumulator and the withdrawal builder.
//!
//! `H(a, b)` builds accumulator nodes; `P([x1..xk])` builds commitments and
//! nullifier hashes. Both are injected through [`Hasher`] so tests can swap in a
//! cheap deterministic stub.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::keccak;
use ark_ff::PrimeField;
use light_poseidon::{Poseidon, PoseidonHasher as _};

use crate::constants::{MAX_POSEIDON_INPUTS, WITHDRAWAL_CONTEXT_DOMAIN};
use crate::error::{PoolError, Result};
use crate::field::Fr;

pub trait Hasher: Send + Sync {
    /// Two-to-one node hash `H(left, right)`.
    fn hash_pair(&self, left: &Fr, right: &Fr) -> Result<Fr>;

    /// Variadic hash `P(inputs)` over a short tuple.
    fn hash(&self, inputs: &[Fr]) -> Result<Fr>;
}

/// Circom-compatible Poseidon over BN254 (same parameters as circomlib and the
/// Solana poseidon syscall).
#[derive(Debug, Default, Clone, Copy)]
pub struct PoseidonHasher;

impl Hasher for PoseidonHasher {
    fn hash_pair(&self, left: &Fr, right: &Fr) -> Result<Fr> {
        self.hash(&[*left, *right])
    }

    fn hash(&self, inputs: &[Fr]) -> Result<Fr> {
        if inputs.is_empty() || inputs.len() > MAX_POSEIDON_INPUTS {
            return Err(PoolError::invalid(format!(
                "poseidon arity {} outside 1..={MAX_POSEIDON_INPUTS}",
                inputs.len()
            )));
        }
        let mut poseidon = Poseidon::<Fr>::new_circom(inputs.len())
            .map_err(|e| PoolError::invalid(format!("poseidon init: {e}")))?;
        poseidon
            .hash(inputs)
            .map_err(|e| PoolError::invalid(format!("poseidon hash: {e}")))
    }
}

// ─── Protocol derivations ───

/// `P([nullifier, secret])`
pub fn precommitment<H: Hasher + ?Sized>(hasher: &H, nullifier: &Fr, secret: &Fr) -> Result<Fr> {
    hasher.hash(&[*nullifier, *secret])
}

/// `P([value, label, precommitment])`
pub fn commitment_hash<H: Hasher + ?Sized>(
    hasher: &H,
    value: u64,
    label: &Fr,
    precommitment: &Fr,
) -> Result<Fr> {
    hasher.hash(&[Fr::from(value), *label, *precommitment])
}

/// `P([nullifier])`, published when the commitment is spent.
pub fn nullifier_hash<H: Hasher + ?Sized>(hasher: &H, nullifier: &Fr) -> Result<Fr> {
    hasher.hash(&[*nullifier])
}

/// Keccak-256 digest read as a little-endian integer and reduced mod r.
fn keccak_to_field(parts: &[&[u8]]) -> Fr {
    Fr::from_le_bytes_mod_order(&keccak::hashv(parts).to_bytes())
}

/// Label for the `nonce`-th deposit in a pool: `keccak256(scope || nonce_le) mod r`.
pub fn compute_label(scope: &[u8; 32], nonce: u64) -> Fr {
    keccak_to_field(&[scope.as_slice(), nonce.to_le_bytes().as_slice()])
}

/// Binds a proof to one withdrawal request so it cannot be replayed against another.
/// Must agree with the context the on-chain `withdraw` handler derives.
pub fn compute_context(processooor: &Pubkey, data: &[u8], scope: &[u8; 32]) -> Fr {
    keccak_to_field(&[WITHDRAWAL_CONTEXT_DOMAIN, processooor.as_ref(), data, scope.as_slice()])
}
