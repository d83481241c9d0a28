// types.rs - proof artifact and the typed public-signal sets of both circuits

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use serde::{Deserialize, Serialize};

use crate::constants::{ragequit_idx, withdraw_idx, NPUB_RAGEQUIT, NPUB_WITHDRAW};
use crate::error::{PoolError, Result};
use crate::field::{
    field_from_decimal, field_to_decimal, field_to_u64, prime_from_decimal, prime_to_decimal, Fr,
};

/// Groth16 proof `(A, B, C)` as produced by the proving engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofArtifact {
    pub a: G1Affine,
    pub b: G2Affine,
    pub c: G1Affine,
}

impl ProofArtifact {
    /// Parse a snarkjs / rapidsnark `proof.json`.
    pub fn from_snarkjs_json(json: &str) -> Result<Self> {
        let proof: SnarkjsProof = serde_json::from_str(json)?;
        proof.to_artifact()
    }
}

/// Circom's JSON form. Coordinates are decimal strings; rapidsnark emits
/// projective `["x", "y", "1"]`, snarkjs may emit affine `["x", "y"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    /// `[[x.c0, x.c1], [y.c0, y.c1], [z.c0, z.c1]]`, real limb first.
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

fn fq(s: &str) -> Result<Fq> {
    prime_from_decimal(s)
}

/// `None` = affine, `Some(true)` = point at infinity.
fn projective_marker(z: Option<&[String]>, what: &str) -> Result<Option<bool>> {
    let Some(z) = z else { return Ok(None) };
    let limbs: Vec<&str> = z.iter().map(|s| s.trim()).collect();
    match limbs.as_slice() {
        ["1"] | ["1", "0"] => Ok(Some(false)),
        ["0"] | ["0", "0"] => Ok(Some(true)),
        _ => Err(PoolError::invalid(format!("{what}: projective z must be 1, got {limbs:?}"))),
    }
}

fn g1_from_strings(coords: &[String], what: &str) -> Result<G1Affine> {
    if !(2..=3).contains(&coords.len()) {
        return Err(PoolError::invalid(format!("{what}: expected 2 or 3 coordinates")));
    }
    if projective_marker(coords.get(2..3), what)? == Some(true) {
        return Ok(G1Affine::zero());
    }
    let point = G1Affine::new_unchecked(fq(&coords[0])?, fq(&coords[1])?);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PoolError::invalid(format!("{what}: point is not on the curve")));
    }
    Ok(point)
}

fn fq2_from_strings(limbs: &[String], what: &str) -> Result<Fq2> {
    match limbs {
        [c0, c1] => Ok(Fq2::new(fq(c0)?, fq(c1)?)),
        _ => Err(PoolError::invalid(format!("{what}: expected [real, imaginary]"))),
    }
}

fn g2_from_strings(coords: &[Vec<String>], what: &str) -> Result<G2Affine> {
    if !(2..=3).contains(&coords.len()) {
        return Err(PoolError::invalid(format!("{what}: expected 2 or 3 coordinates")));
    }
    if projective_marker(coords.get(2).map(Vec::as_slice), what)? == Some(true) {
        return Ok(G2Affine::zero());
    }
    let point = G2Affine::new_unchecked(
        fq2_from_strings(&coords[0], what)?,
        fq2_from_strings(&coords[1], what)?,
    );
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PoolError::invalid(format!("{what}: point is not on the curve")));
    }
    Ok(point)
}

fn g1_to_strings(p: &G1Affine) -> Vec<String> {
    if p.infinity {
        return vec!["0".into(), "1".into(), "0".into()];
    }
    vec![prime_to_decimal(&p.x), prime_to_decimal(&p.y), "1".into()]
}

fn g2_to_strings(p: &G2Affine) -> Vec<Vec<String>> {
    if p.infinity {
        return vec![
            vec!["0".into(), "0".into()],
            vec!["1".into(), "0".into()],
            vec!["0".into(), "0".into()],
        ];
    }
    vec![
        vec![prime_to_decimal(&p.x.c0), prime_to_decimal(&p.x.c1)],
        vec![prime_to_decimal(&p.y.c0), prime_to_decimal(&p.y.c1)],
        vec!["1".into(), "0".into()],
    ]
}

impl SnarkjsProof {
    pub fn to_artifact(&self) -> Result<ProofArtifact> {
        if let Some(curve) = &self.curve {
            if curve != "bn128" && curve != "bn254" {
                return Err(PoolError::invalid(format!("unsupported curve {curve}")));
            }
        }
        Ok(ProofArtifact {
            a: g1_from_strings(&self.pi_a, "pi_a")?,
            b: g2_from_strings(&self.pi_b, "pi_b")?,
            c: g1_from_strings(&self.pi_c, "pi_c")?,
        })
    }

    pub fn from_artifact(artifact: &ProofArtifact) -> Self {
        Self {
            pi_a: g1_to_strings(&artifact.a),
            pi_b: g2_to_strings(&artifact.b),
            pi_c: g1_to_strings(&artifact.c),
            protocol: Some("groth16".into()),
            curve: Some("bn128".into()),
        }
    }
}

/// Parse snarkjs `public.json`: an array of decimal strings, order untouched.
pub fn public_signals_from_json(json: &str) -> Result<Vec<Fr>> {
    let raw: Vec<String> = serde_json::from_str(json)?;
    raw.iter().map(|s| field_from_decimal(s)).collect()
}

pub fn public_signals_to_json(signals: &[Fr]) -> Result<String> {
    let raw: Vec<String> = signals.iter().map(field_to_decimal).collect();
    Ok(serde_json::to_string(&raw)?)
}

fn check_arity(signals: &[Fr], expected: usize, circuit: &str) -> Result<()> {
    if signals.len() != expected {
        return Err(PoolError::invalid(format!(
            "{circuit} expects {expected} public signals, got {}",
            signals.len()
        )));
    }
    Ok(())
}

/// Withdraw circuit outputs, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawPublicSignals {
    pub withdrawn_value: Fr,
    pub state_root: Fr,
    pub state_tree_depth: Fr,
    pub asp_root: Fr,
    pub asp_tree_depth: Fr,
    pub context: Fr,
    pub new_commitment_hash: Fr,
    pub existing_nullifier_hash: Fr,
}

impl WithdrawPublicSignals {
    pub fn from_signals(signals: &[Fr]) -> Result<Self> {
        check_arity(signals, NPUB_WITHDRAW, "withdraw")?;
        Ok(Self {
            withdrawn_value: signals[withdraw_idx::WITHDRAWN_VALUE],
            state_root: signals[withdraw_idx::STATE_ROOT],
            state_tree_depth: signals[withdraw_idx::STATE_TREE_DEPTH],
            asp_root: signals[withdraw_idx::ASP_ROOT],
            asp_tree_depth: signals[withdraw_idx::ASP_TREE_DEPTH],
            context: signals[withdraw_idx::CONTEXT],
            new_commitment_hash: signals[withdraw_idx::NEW_COMMITMENT_HASH],
            existing_nullifier_hash: signals[withdraw_idx::EXISTING_NULLIFIER_HASH],
        })
    }

    pub fn to_vec(&self) -> Vec<Fr> {
        let mut out = vec![Fr::from(0u64); NPUB_WITHDRAW];
        out[withdraw_idx::WITHDRAWN_VALUE] = self.withdrawn_value;
        out[withdraw_idx::STATE_ROOT] = self.state_root;
        out[withdraw_idx::STATE_TREE_DEPTH] = self.state_tree_depth;
        out[withdraw_idx::ASP_ROOT] = self.asp_root;
        out[withdraw_idx::ASP_TREE_DEPTH] = self.asp_tree_depth;
        out[withdraw_idx::CONTEXT] = self.context;
        out[withdraw_idx::NEW_COMMITMENT_HASH] = self.new_commitment_hash;
        out[withdraw_idx::EXISTING_NULLIFIER_HASH] = self.existing_nullifier_hash;
        out
    }

    pub fn withdrawn_amount(&self) -> Result<u64> {
        field_to_u64(&self.withdrawn_value)
    }
}

impl TryFrom<&[Fr]> for WithdrawPublicSignals {
    type Error = PoolError;

    fn try_from(signals: &[Fr]) -> Result<Self> {
        Self::from_signals(signals)
    }
}

/// Ragequit circuit outputs: `value, label, commitmentHash, nullifierHash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagequitPublicSignals {
    pub value: Fr,
    pub label: Fr,
    pub commitment_hash: Fr,
    pub nullifier_hash: Fr,
}

impl RagequitPublicSignals {
    pub fn from_signals(signals: &[Fr]) -> Result<Self> {
        check_arity(signals, NPUB_RAGEQUIT, "ragequit")?;
        Ok(Self {
            value: signals[ragequit_idx::VALUE],
            label: signals[ragequit_idx::LABEL],
            commitment_hash: signals[ragequit_idx::COMMITMENT_HASH],
            nullifier_hash: signals[ragequit_idx::NULLIFIER_HASH],
        })
    }

    pub fn to_vec(&self) -> Vec<Fr> {
        let mut out = vec![Fr::from(0u64); NPUB_RAGEQUIT];
        out[ragequit_idx::VALUE] = self.value;
        out[ragequit_idx::LABEL] = self.label;
        out[ragequit_idx::COMMITMENT_HASH] = self.commitment_hash;
        out[ragequit_idx::NULLIFIER_HASH] = self.nullifier_hash;
        out
    }
}

impl TryFrom<&[Fr]> for RagequitPublicSignals {
    type Error = PoolError;

    fn try_from(signals: &[Fr]) -> Result<Self> {
        Self::from_signals(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;

    fn sample() -> ProofArtifact {
        ProofArtifact {
            a: (G1Affine::generator() * Fr::from(11u64)).into_affine(),
            b: (G2Affine::generator() * Fr::from(12u64)).into_affine(),
            c: (G1Affine::generator() * Fr::from(13u64)).into_affine(),
        }
    }

    #[test]
    fn test_snarkjs_json_roundtrip() {
        let artifact = sample();
        let json = serde_json::to_string(&SnarkjsProof::from_artifact(&artifact)).unwrap();
        assert!(json.contains("\"pi_a\""));
        assert_eq!(ProofArtifact::from_snarkjs_json(&json).unwrap(), artifact);
    }

    #[test]
    fn test_affine_form_is_accepted() {
        let artifact = sample();
        let mut proof = SnarkjsProof::from_artifact(&artifact);
        proof.pi_a.truncate(2);
        proof.pi_b.truncate(2);
        proof.pi_c.truncate(2);
        assert_eq!(proof.to_artifact().unwrap(), artifact);
    }

    #[test]
    fn test_projective_z_must_be_one() {
        let mut proof = SnarkjsProof::from_artifact(&sample());
        proof.pi_a[2] = "2".into();
        assert!(matches!(proof.to_artifact(), Err(PoolError::InvalidArgument(_))));
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let mut proof = SnarkjsProof::from_artifact(&sample());
        proof.pi_c[1] = "5".into();
        assert!(matches!(proof.to_artifact(), Err(PoolError::InvalidArgument(_))));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        assert!(matches!(
            ProofArtifact::from_snarkjs_json("{\"pi_a\": 3}"),
            Err(PoolError::Json(_))
        ));
    }

    #[test]
    fn test_public_signals_json() {
        let signals = public_signals_from_json(r#"["1000000000", "0", "3"]"#).unwrap();
        assert_eq!(signals, vec![Fr::from(1_000_000_000u64), Fr::from(0u64), Fr::from(3u64)]);
        assert_eq!(
            public_signals_from_json(&public_signals_to_json(&signals).unwrap()).unwrap(),
            signals
        );
        assert!(matches!(
            public_signals_from_json(r#"["abc"]"#),
            Err(PoolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_signal_arity() {
        let eight: Vec<Fr> = (0..8u64).map(Fr::from).collect();
        let w = WithdrawPublicSignals::from_signals(&eight).unwrap();
        assert_eq!(w.context, Fr::from(5u64));
        assert_eq!(w.existing_nullifier_hash, Fr::from(7u64));
        assert_eq!(w.to_vec(), eight);
        assert_eq!(w.withdrawn_amount().unwrap(), 0);

        assert!(RagequitPublicSignals::from_signals(&eight).is_err());
        let r = RagequitPublicSignals::try_from(&eight[..4]).unwrap();
        assert_eq!(r.nullifier_hash, Fr::from(3u64));
        assert_eq!(r.to_vec(), eight[..4].to_vec());
        assert!(WithdrawPublicSignals::try_from(&eight[..4]).is_err());
    }
}
