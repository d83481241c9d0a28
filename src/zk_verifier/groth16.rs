//! Off-chain pairing check, run before a payload is submitted (`real-crypto`).

use ark_bn254::Bn254;
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;

use crate::error::{PoolError, Result};
use crate::field::Fr;
use crate::zk_verifier::types::ProofArtifact;

pub struct OffchainVerifier {
    pvk: PreparedVerifyingKey<Bn254>,
    n_public: usize,
}

impl OffchainVerifier {
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self> {
        let n_public = vk
            .gamma_abc_g1
            .len()
            .checked_sub(1)
            .ok_or_else(|| PoolError::invalid("verifying key has no IC points"))?;
        Ok(Self {
            pvk: prepare_verifying_key(vk),
            n_public,
        })
    }

    /// `bytes` is an arkworks uncompressed `VerifyingKey<Bn254>`.
    pub fn from_vk_bytes(bytes: &[u8]) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_uncompressed(bytes)
            .map_err(|e| PoolError::invalid(format!("verifying key: {e}")))?;
        Self::new(&vk)
    }

    pub fn n_public(&self) -> usize {
        self.n_public
    }

    pub fn verify(&self, artifact: &ProofArtifact, signals: &[Fr]) -> Result<()> {
        if signals.len() != self.n_public {
            return Err(PoolError::invalid(format!(
                "verifying key expects {} public signals, got {}",
                self.n_public,
                signals.len()
            )));
        }
        let proof = Proof::<Bn254> {
            a: artifact.a,
            b: artifact.b,
            c: artifact.c,
        };
        let ok = Groth16::<Bn254>::verify_proof(&self.pvk, &proof, signals)
            .map_err(|e| PoolError::ProvingFailed(format!("pairing check errored: {e}")))?;
        if !ok {
            trace!("groth16: proof rejected by off-chain check");
            return Err(PoolError::ProvingFailed(
                "proof rejected by off-chain pairing check".into(),
            ));
        }
        Ok(())
    }
}
