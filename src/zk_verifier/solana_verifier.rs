//! Byte layout expected by the on-chain Groth16 verifier (alt_bn128 syscalls).
//! - every 32B limb is BIG-ENDIAN
//! - A is sent negated (y := q - y); C is not
//! - G2 limbs go imaginary-first: x.c1 | x.c0 | y.c1 | y.c0
//! - public signals: 32B BE each, after a u32 LE count
//!
//! The little-endian canonical form in `crate::field` is for records and logs only;
//! nothing here accepts it.

use anchor_lang::prelude::*;
use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use bytemuck::{Pod, Zeroable};

use crate::constants::{
    BASE_FIELD_MODULUS_BE, FIELD_BYTES, G1_BYTES, G2_BYTES, PROOF_BYTES_LEN, SIGNAL_COUNT_BYTES,
};
use crate::error::{PoolError, Result};
use crate::field::{field_from_be_bytes, prime_from_be, prime_to_be, Fr};
use crate::utils::hex_lower;
use crate::zk_verifier::types::ProofArtifact;

// -------------------- Little helpers (BE limb math) -------------------------

/// y := (q - y) mod q (big-endian limb). If y == 0, keep 0.
fn negate_fq_be_in_place(y: &mut [u8; 32]) {
    if y.iter().all(|&b| b == 0) {
        return;
    }
    let mut borrow = 0i32;
    for i in (0..32).rev() {
        let mut diff = BASE_FIELD_MODULUS_BE[i] as i32 - y[i] as i32 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        y[i] = diff as u8;
    }
}

/// Strict `q - y` on a big-endian coordinate; `y` must already be below `q`.
pub fn negate_fq_be(y: &[u8; 32]) -> Result<[u8; 32]> {
    if y.as_slice() >= BASE_FIELD_MODULUS_BE.as_slice() {
        return Err(PoolError::FieldElementOutOfRange(format!("0x{}", hex_lower(y))));
    }
    let mut out = *y;
    negate_fq_be_in_place(&mut out);
    Ok(out)
}

/// swap 32B block at i with 32B block at j (requires i + 32 <= j)
fn swap32_in_place(slice: &mut [u8], i: usize, j: usize) {
    debug_assert!(i + 32 <= j);
    let (left, right) = slice.split_at_mut(j);
    let (li, r0) = (&mut left[i..i + 32], &mut right[0..32]);
    let mut tmp = [0u8; 32];
    tmp.copy_from_slice(li);
    li.copy_from_slice(r0);
    r0.copy_from_slice(&tmp);
}

/// c0|c1 per coordinate <-> c1|c0 per coordinate. Its own inverse.
fn swap_g2_inner_limbs_be(mut b: [u8; 128]) -> [u8; 128] {
    swap32_in_place(&mut b, 0, 32);
    swap32_in_place(&mut b, 64, 96);
    b
}

fn fq_from_be(bytes: &[u8]) -> Result<Fq> {
    let limb: [u8; FIELD_BYTES] = bytes
        .try_into()
        .map_err(|_| PoolError::invalid("coordinate limb must be 32 bytes"))?;
    prime_from_be(&limb)
}

// -------------------- Encoders ---------------------------------------------

/// `x | y` big-endian; with `negate_y` the point is sent as `-P`.
/// The point at infinity is 64 zero bytes.
pub fn encode_g1_for_verifier(point: &G1Affine, negate_y: bool) -> [u8; G1_BYTES] {
    let mut out = [0u8; G1_BYTES];
    if point.infinity {
        return out;
    }
    let mut y = prime_to_be(&point.y);
    if negate_y {
        negate_fq_be_in_place(&mut y);
    }
    out[..32].copy_from_slice(&prime_to_be(&point.x));
    out[32..].copy_from_slice(&y);
    out
}

/// `x.c1 | x.c0 | y.c1 | y.c0`, each big-endian.
pub fn encode_g2_for_verifier(point: &G2Affine) -> [u8; G2_BYTES] {
    let mut natural = [0u8; G2_BYTES];
    if point.infinity {
        return natural;
    }
    natural[0..32].copy_from_slice(&prime_to_be(&point.x.c0));
    natural[32..64].copy_from_slice(&prime_to_be(&point.x.c1));
    natural[64..96].copy_from_slice(&prime_to_be(&point.y.c0));
    natural[96..128].copy_from_slice(&prime_to_be(&point.y.c1));
    swap_g2_inner_limbs_be(natural)
}

/// 32 big-endian bytes. Not interchangeable with `field_to_canonical_bytes`.
pub fn encode_public_signal(x: &Fr) -> [u8; FIELD_BYTES] {
    prime_to_be(x)
}

pub fn encode_public_signals(signals: &[Fr]) -> Vec<[u8; FIELD_BYTES]> {
    signals.iter().map(encode_public_signal).collect()
}

/// Strict inverse of [`encode_public_signal`].
pub fn decode_public_signal(bytes: &[u8; FIELD_BYTES]) -> Result<Fr> {
    field_from_be_bytes(bytes)
}

// -------------------- Decoders (diagnostics) -------------------------------

fn check_g1(point: G1Affine) -> Result<G1Affine> {
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PoolError::invalid("G1 point is not on the curve"));
    }
    Ok(point)
}

fn check_g2(point: G2Affine) -> Result<G2Affine> {
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PoolError::invalid("G2 point is not on the curve"));
    }
    Ok(point)
}

/// Reverse of [`encode_g1_for_verifier`]; `negated` undoes the sign flip.
pub fn decode_g1_from_verifier(bytes: &[u8; G1_BYTES], negated: bool) -> Result<G1Affine> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G1Affine::zero());
    }
    let x = fq_from_be(&bytes[..32])?;
    let mut y = fq_from_be(&bytes[32..])?;
    if negated {
        y = -y;
    }
    check_g1(G1Affine::new_unchecked(x, y))
}

pub fn decode_g2_from_verifier(bytes: &[u8; G2_BYTES]) -> Result<G2Affine> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G2Affine::zero());
    }
    let natural = swap_g2_inner_limbs_be(*bytes);
    let x = Fq2::new(fq_from_be(&natural[0..32])?, fq_from_be(&natural[32..64])?);
    let y = Fq2::new(fq_from_be(&natural[64..96])?, fq_from_be(&natural[96..128])?);
    check_g2(G2Affine::new_unchecked(x, y))
}

// -------------------- Proof blob -------------------------------------------

/// `A(-) | B | C`, exactly as the instruction carries it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct EncodedProof {
    pub a: [u8; G1_BYTES],
    pub b: [u8; G2_BYTES],
    pub c: [u8; G1_BYTES],
}

impl EncodedProof {
    pub const LEN: usize = PROOF_BYTES_LEN;

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        bytemuck::try_from_bytes(bytes).map_err(|e| {
            PoolError::invalid(format!("proof blob must be {PROOF_BYTES_LEN} bytes: {e:?}"))
        })
    }
}

pub fn encode_proof(artifact: &ProofArtifact) -> EncodedProof {
    EncodedProof {
        a: encode_g1_for_verifier(&artifact.a, true),
        b: encode_g2_for_verifier(&artifact.b),
        c: encode_g1_for_verifier(&artifact.c, false),
    }
}

/// Inverse of [`encode_proof`], including the on-curve checks.
pub fn decode_proof(encoded: &EncodedProof) -> Result<ProofArtifact> {
    Ok(ProofArtifact {
        a: decode_g1_from_verifier(&encoded.a, true)?,
        b: decode_g2_from_verifier(&encoded.b)?,
        c: decode_g1_from_verifier(&encoded.c, false)?,
    })
}

// -------------------- Instruction payload -----------------------------------

/// Borsh image of the verifier instruction arguments.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifierPayload {
    pub proof_a: [u8; G1_BYTES],
    pub proof_b: [u8; G2_BYTES],
    pub proof_c: [u8; G1_BYTES],
    pub public_signals: Vec<[u8; FIELD_BYTES]>,
}

impl VerifierPayload {
    pub fn new(artifact: &ProofArtifact, signals: &[Fr]) -> Self {
        let proof = encode_proof(artifact);
        Self {
            proof_a: proof.a,
            proof_b: proof.b,
            proof_c: proof.c,
            public_signals: encode_public_signals(signals),
        }
    }

    pub fn encoded_len(&self) -> usize {
        PROOF_BYTES_LEN + SIGNAL_COUNT_BYTES + self.public_signals.len() * FIELD_BYTES
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.serialize(&mut out)?;
        Ok(out)
    }
}

/// `A(64) | B(128) | C(64) | count: u32 LE | count x 32B BE`.
pub fn encode_verifier_payload(artifact: &ProofArtifact, signals: &[Fr]) -> Result<Vec<u8>> {
    let payload = VerifierPayload::new(artifact, signals);
    let bytes = payload.to_bytes()?;
    trace!(
        "payload: {} bytes, {} public signals",
        bytes.len(),
        payload.public_signals.len()
    );
    Ok(bytes)
}

pub fn decode_verifier_payload(bytes: &[u8]) -> Result<(ProofArtifact, Vec<Fr>)> {
    let payload = VerifierPayload::try_from_slice(bytes)
        .map_err(|e| PoolError::invalid(format!("malformed verifier payload: {e}")))?;
    let artifact = decode_proof(&EncodedProof {
        a: payload.proof_a,
        b: payload.proof_b,
        c: payload.proof_c,
    })?;
    let signals = payload
        .public_signals
        .iter()
        .map(decode_public_signal)
        .collect::<Result<Vec<_>>>()?;
    Ok((artifact, signals))
}

// ---- Raw slicing (no curve checks) ------------------------------------------

pub fn parse_proof_bytes(proof: &[u8]) -> Result<(&[u8; 64], &[u8; 128], &[u8; 64])> {
    if proof.len() != PROOF_BYTES_LEN {
        return Err(PoolError::invalid("bad proof len"));
    }
    let a = proof[0..64].try_into().map_err(|_| PoolError::invalid("bad 64B"))?;
    let b = proof[64..192].try_into().map_err(|_| PoolError::invalid("bad 128B"))?;
    let c = proof[192..256].try_into().map_err(|_| PoolError::invalid("bad 64B"))?;
    Ok((a, b, c))
}

pub fn parse_public_signals_exact(bytes: &[u8]) -> Result<Vec<[u8; 32]>> {
    if bytes.len() % FIELD_BYTES != 0 {
        return Err(PoolError::invalid("public inputs len not multiple of 32"));
    }
    bytes
        .chunks_exact(FIELD_BYTES)
        .map(|chunk| chunk.try_into().map_err(|_| PoolError::invalid("bad 32B slice")))
        .collect()
}

pub fn extract_public_input(signals: &[[u8; 32]], idx: usize) -> Result<[u8; 32]> {
    signals.get(idx).copied().ok_or_else(|| {
        PoolError::invalid(format!("public input {idx} out of {}", signals.len()))
    })
}

/// Amount signals are u64 values in the low 8 bytes of a BE limb.
pub fn extract_amount_u64(signals: &[[u8; 32]], idx: usize) -> Result<u64> {
    let limb = extract_public_input(signals, idx)?;
    let (high, low) = limb.split_at(FIELD_BYTES - 8);
    if high.iter().any(|&b| b != 0) {
        return Err(PoolError::invalid(format!("public input {idx} does not fit in u64")));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(low);
    Ok(u64::from_be_bytes(word))
}
