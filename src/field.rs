//! BN254 scalar-field helpers.
//!
//! Two byte orders are in play and they are not interchangeable:
//! - canonical (little-endian) bytes, the interchange format between off-chain
//!   records and diagnostics;
//! - big-endian bytes, the only order the on-chain verifier accepts.
//!
//! Every decoder here is strict: a value at or above the modulus is rejected with
//! `FieldElementOutOfRange` instead of being reduced.

use ark_ff::{BigInt, BigInteger, PrimeField};
use num_bigint::BigUint;

use crate::constants::FIELD_BYTES;
use crate::error::{PoolError, Result};
use crate::utils::hex_lower;

pub use ark_bn254::Fr;

// -------------------- limb plumbing (generic over Fr / Fq) -------------------

fn bigint_from_le(le: &[u8; FIELD_BYTES]) -> BigInt<4> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(le.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(word);
    }
    BigInt::new(limbs)
}

pub(crate) fn prime_from_le<F>(le: &[u8; FIELD_BYTES]) -> Result<F>
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    F::from_bigint(bigint_from_le(le)).ok_or_else(|| {
        let mut be = *le;
        be.reverse();
        PoolError::FieldElementOutOfRange(format!("0x{}", hex_lower(&be)))
    })
}

pub(crate) fn prime_from_be<F>(be: &[u8; FIELD_BYTES]) -> Result<F>
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    let mut le = *be;
    le.reverse();
    prime_from_le(&le)
}

pub(crate) fn prime_to_be<F>(x: &F) -> [u8; FIELD_BYTES]
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    let mut out = [0u8; FIELD_BYTES];
    out.copy_from_slice(&x.into_bigint().to_bytes_be());
    out
}

pub(crate) fn prime_to_le<F>(x: &F) -> [u8; FIELD_BYTES]
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    let mut out = [0u8; FIELD_BYTES];
    out.copy_from_slice(&x.into_bigint().to_bytes_le());
    out
}

/// Parse the decimal strings circom/snarkjs emit.
pub(crate) fn prime_from_decimal<F>(s: &str) -> Result<F>
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    let digits = s.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PoolError::invalid(format!("not a decimal field element: {s:?}")));
    }
    let value = BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| PoolError::invalid(format!("not a decimal field element: {s:?}")))?;

    let bytes = value.to_bytes_le();
    if bytes.len() > FIELD_BYTES {
        return Err(PoolError::FieldElementOutOfRange(digits.to_string()));
    }
    let mut le = [0u8; FIELD_BYTES];
    le[..bytes.len()].copy_from_slice(&bytes);
    prime_from_le(&le).map_err(|_| PoolError::FieldElementOutOfRange(digits.to_string()))
}

pub(crate) fn prime_to_decimal<F>(x: &F) -> String
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    BigUint::from_bytes_be(&prime_to_be(x)).to_string()
}

// -------------------- scalar-field API ---------------------------------------

/// 32 little-endian bytes; round-trips through [`bytes_to_field`].
pub fn field_to_canonical_bytes(x: &Fr) -> [u8; FIELD_BYTES] {
    prime_to_le(x)
}

/// Inverse of [`field_to_canonical_bytes`].
pub fn bytes_to_field(le: &[u8; FIELD_BYTES]) -> Result<Fr> {
    prime_from_le(le)
}

/// Big-endian decoding, the order public signals travel in.
pub fn field_from_be_bytes(be: &[u8; FIELD_BYTES]) -> Result<Fr> {
    prime_from_be(be)
}

pub fn field_from_decimal(s: &str) -> Result<Fr> {
    prime_from_decimal(s)
}

pub fn field_to_decimal(x: &Fr) -> String {
    prime_to_decimal(x)
}

/// Narrow a signal to a token amount.
pub fn field_to_u64(x: &Fr) -> Result<u64> {
    let be = prime_to_be(x);
    let (high, low) = be.split_at(FIELD_BYTES - 8);
    if high.iter().any(|&b| b != 0) {
        return Err(PoolError::invalid(format!(
            "field element {} does not fit in u64",
            field_to_decimal(x)
        )));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(low);
    Ok(u64::from_be_bytes(word))
}

/// Short hex form used in logs and error messages.
pub fn field_hex(x: &Fr) -> String {
    format!("0x{}", hex_lower(&prime_to_be(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALAR_FIELD_MODULUS_DEC;
    use ark_ff::Zero;

    #[test]
    fn test_modulus_matches_protocol_constant() {
        let modulus = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le());
        assert_eq!(modulus.to_string(), SCALAR_FIELD_MODULUS_DEC);
    }

    #[test]
    fn test_canonical_bytes_are_little_endian() {
        let bytes = field_to_canonical_bytes(&Fr::from(0x0102u64));
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], 0x01);
        assert!(bytes[2..].iter().all(|&b| b == 0));
        assert_eq!(bytes_to_field(&bytes).unwrap(), Fr::from(0x0102u64));
    }

    #[test]
    fn test_bytes_to_field_rejects_modulus() {
        let modulus = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le());
        let mut le = [0u8; 32];
        le.copy_from_slice(&modulus.to_bytes_le());
        assert!(matches!(
            bytes_to_field(&le),
            Err(PoolError::FieldElementOutOfRange(_))
        ));
        assert!(matches!(
            bytes_to_field(&[0xff; 32]),
            Err(PoolError::FieldElementOutOfRange(_))
        ));
    }

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(field_from_decimal("0").unwrap(), Fr::zero());
        assert_eq!(field_from_decimal("2000000000").unwrap(), Fr::from(2_000_000_000u64));
        assert!(matches!(
            field_from_decimal(SCALAR_FIELD_MODULUS_DEC),
            Err(PoolError::FieldElementOutOfRange(_))
        ));
        assert!(matches!(field_from_decimal(""), Err(PoolError::InvalidArgument(_))));
        assert!(matches!(field_from_decimal("-1"), Err(PoolError::InvalidArgument(_))));
        assert!(matches!(field_from_decimal("0x10"), Err(PoolError::InvalidArgument(_))));
    }

    #[test]
    fn test_decimal_formatting() {
        let x = Fr::from(1_000_000_000u64);
        assert_eq!(field_to_decimal(&x), "1000000000");
        assert_eq!(field_to_decimal(&Fr::zero()), "0");
        let max = -Fr::from(1u64);
        assert_eq!(field_from_decimal(&field_to_decimal(&max)).unwrap(), max);
    }

    #[test]
    fn test_field_to_u64() {
        assert_eq!(field_to_u64(&Fr::from(u64::MAX)).unwrap(), u64::MAX);
        assert!(field_to_u64(&(Fr::from(u64::MAX) + Fr::from(1u64))).is_err());
    }
}
