//! Withdrawal and ragequit input assembly.
//!
//! The builder validates everything the circuit would otherwise reject slowly
//! (over-spend, a state leaf that is not this commitment, an unapproved label) and
//! produces the record handed to the proving engine.

use serde::Serialize;

use crate::constants::MAX_TREE_DEPTH;
use crate::error::{PoolError, Result};
use crate::field::{field_hex, field_to_decimal, Fr};
use crate::hasher::{commitment_hash, nullifier_hash, precommitment, Hasher};
use crate::merkle::{pad_siblings, InclusionProof};
use crate::zk_verifier::types::{RagequitPublicSignals, WithdrawPublicSignals};

/// Preimage of a commitment held by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment {
    pub value: u64,
    pub label: Fr,
    pub nullifier: Fr,
    pub secret: Fr,
}

impl Commitment {
    pub fn precommitment<H: Hasher + ?Sized>(&self, hasher: &H) -> Result<Fr> {
        precommitment(hasher, &self.nullifier, &self.secret)
    }

    /// The leaf this commitment occupies in the state tree.
    pub fn hash<H: Hasher + ?Sized>(&self, hasher: &H) -> Result<Fr> {
        commitment_hash(hasher, self.value, &self.label, &self.precommitment(hasher)?)
    }

    pub fn nullifier_hash<H: Hasher + ?Sized>(&self, hasher: &H) -> Result<Fr> {
        nullifier_hash(hasher, &self.nullifier)
    }
}

/// Everything a caller supplies for one withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub existing: Commitment,
    pub withdrawn_value: u64,
    pub new_nullifier: Fr,
    pub new_secret: Fr,
    pub state_proof: InclusionProof,
    pub admission_proof: InclusionProof,
    pub context: Fr,
}

/// Ordered record consumed by the withdraw circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalInputs {
    // public
    pub withdrawn_value: u64,
    pub state_root: Fr,
    pub state_tree_depth: u64,
    pub asp_root: Fr,
    pub asp_tree_depth: u64,
    pub context: Fr,
    // private
    pub label: Fr,
    pub existing_value: u64,
    pub existing_nullifier: Fr,
    pub existing_secret: Fr,
    pub new_nullifier: Fr,
    pub new_secret: Fr,
    pub state_siblings: Vec<Fr>,
    pub state_index: u64,
    pub asp_siblings: Vec<Fr>,
    pub asp_index: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawCircuitInput {
    withdrawn_value: String,
    state_root: String,
    state_tree_depth: String,
    #[serde(rename = "ASPRoot")]
    asp_root: String,
    #[serde(rename = "ASPTreeDepth")]
    asp_tree_depth: String,
    context: String,
    label: String,
    existing_value: String,
    existing_nullifier: String,
    existing_secret: String,
    new_nullifier: String,
    new_secret: String,
    state_siblings: Vec<String>,
    state_index: String,
    #[serde(rename = "ASPSiblings")]
    asp_siblings: Vec<String>,
    #[serde(rename = "ASPIndex")]
    asp_index: String,
}

fn decimals(xs: &[Fr]) -> Vec<String> {
    xs.iter().map(field_to_decimal).collect()
}

impl WithdrawalInputs {
    /// The six inputs the prover supplies as public, in circuit order.
    pub fn public_inputs(&self) -> [Fr; 6] {
        [
            Fr::from(self.withdrawn_value),
            self.state_root,
            Fr::from(self.state_tree_depth),
            self.asp_root,
            Fr::from(self.asp_tree_depth),
            self.context,
        ]
    }

    pub fn remaining_value(&self) -> Result<u64> {
        self.existing_value.checked_sub(self.withdrawn_value).ok_or_else(|| {
            PoolError::withdrawal(format!(
                "withdrawn value {} exceeds existing value {}",
                self.withdrawn_value, self.existing_value
            ))
        })
    }

    /// The full signal vector a correct proof must carry.
    pub fn expected_public_signals<H: Hasher + ?Sized>(
        &self,
        hasher: &H,
    ) -> Result<WithdrawPublicSignals> {
        let change = Commitment {
            value: self.remaining_value()?,
            label: self.label,
            nullifier: self.new_nullifier,
            secret: self.new_secret,
        };
        Ok(WithdrawPublicSignals {
            withdrawn_value: Fr::from(self.withdrawn_value),
            state_root: self.state_root,
            state_tree_depth: Fr::from(self.state_tree_depth),
            asp_root: self.asp_root,
            asp_tree_depth: Fr::from(self.asp_tree_depth),
            context: self.context,
            new_commitment_hash: change.hash(hasher)?,
            existing_nullifier_hash: nullifier_hash(hasher, &self.existing_nullifier)?,
        })
    }

    /// Circom input file: every value a decimal string.
    pub fn to_circuit_json(&self) -> Result<String> {
        let input = WithdrawCircuitInput {
            withdrawn_value: self.withdrawn_value.to_string(),
            state_root: field_to_decimal(&self.state_root),
            state_tree_depth: self.state_tree_depth.to_string(),
            asp_root: field_to_decimal(&self.asp_root),
            asp_tree_depth: self.asp_tree_depth.to_string(),
            context: field_to_decimal(&self.context),
            label: field_to_decimal(&self.label),
            existing_value: self.existing_value.to_string(),
            existing_nullifier: field_to_decimal(&self.existing_nullifier),
            existing_secret: field_to_decimal(&self.existing_secret),
            new_nullifier: field_to_decimal(&self.new_nullifier),
            new_secret: field_to_decimal(&self.new_secret),
            state_siblings: decimals(&self.state_siblings),
            state_index: self.state_index.to_string(),
            asp_siblings: decimals(&self.asp_siblings),
            asp_index: self.asp_index.to_string(),
        };
        Ok(serde_json::to_string_pretty(&input)?)
    }
}

pub struct WithdrawalInputBuilder<'h, H: Hasher + ?Sized> {
    hasher: &'h H,
    max_tree_depth: usize,
}

impl<'h, H: Hasher + ?Sized> WithdrawalInputBuilder<'h, H> {
    pub fn new(hasher: &'h H) -> Self {
        Self {
            hasher,
            max_tree_depth: MAX_TREE_DEPTH,
        }
    }

    pub fn with_max_tree_depth(mut self, max_tree_depth: usize) -> Self {
        self.max_tree_depth = max_tree_depth;
        self
    }

    pub fn build(&self, request: &WithdrawalRequest) -> Result<WithdrawalInputs> {
        let existing = &request.existing;

        if request.withdrawn_value > existing.value {
            return Err(PoolError::withdrawal(format!(
                "withdrawn value {} exceeds existing value {}",
                request.withdrawn_value, existing.value
            )));
        }

        let leaf = existing.hash(self.hasher)?;
        if request.state_proof.leaf != leaf {
            return Err(PoolError::withdrawal(format!(
                "state proof leaf {} is not the commitment {}",
                field_hex(&request.state_proof.leaf),
                field_hex(&leaf)
            )));
        }
        if request.admission_proof.leaf != existing.label {
            return Err(PoolError::withdrawal(format!(
                "admission proof leaf {} is not the label {}",
                field_hex(&request.admission_proof.leaf),
                field_hex(&existing.label)
            )));
        }

        request.state_proof.verify(self.hasher)?;
        request.admission_proof.verify(self.hasher)?;

        let inputs = WithdrawalInputs {
            withdrawn_value: request.withdrawn_value,
            state_root: request.state_proof.root,
            state_tree_depth: request.state_proof.depth() as u64,
            asp_root: request.admission_proof.root,
            asp_tree_depth: request.admission_proof.depth() as u64,
            context: request.context,
            label: existing.label,
            existing_value: existing.value,
            existing_nullifier: existing.nullifier,
            existing_secret: existing.secret,
            new_nullifier: request.new_nullifier,
            new_secret: request.new_secret,
            state_siblings: pad_siblings(&request.state_proof.siblings, self.max_tree_depth)?,
            state_index: request.state_proof.index,
            asp_siblings: pad_siblings(&request.admission_proof.siblings, self.max_tree_depth)?,
            asp_index: request.admission_proof.index,
        };

        trace!(
            "withdrawal: built inputs, withdrawn={}, state depth={}, asp depth={}",
            inputs.withdrawn_value,
            inputs.state_tree_depth,
            inputs.asp_tree_depth
        );
        Ok(inputs)
    }
}

/// Ragequit spends a commitment back to its original depositor; no tree proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagequitInputs {
    pub existing: Commitment,
    pub public_signals: RagequitPublicSignals,
}

#[derive(Serialize)]
struct RagequitCircuitInput {
    value: String,
    label: String,
    nullifier: String,
    secret: String,
}

impl RagequitInputs {
    pub fn build<H: Hasher + ?Sized>(existing: &Commitment, hasher: &H) -> Result<Self> {
        Ok(Self {
            existing: *existing,
            public_signals: RagequitPublicSignals {
                value: Fr::from(existing.value),
                label: existing.label,
                commitment_hash: existing.hash(hasher)?,
                nullifier_hash: existing.nullifier_hash(hasher)?,
            },
        })
    }

    pub fn to_circuit_json(&self) -> Result<String> {
        let input = RagequitCircuitInput {
            value: self.existing.value.to_string(),
            label: field_to_decimal(&self.existing.label),
            nullifier: field_to_decimal(&self.existing.nullifier),
            secret: field_to_decimal(&self.existing.secret),
        };
        Ok(serde_json::to_string_pretty(&input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::LeanAccumulator;
    use ark_ff::Zero;

    #[derive(Debug, Clone, Copy)]
    struct StubHasher;

    impl Hasher for StubHasher {
        fn hash_pair(&self, left: &Fr, right: &Fr) -> Result<Fr> {
            Ok(*left * Fr::from(3u64) + *right * Fr::from(5u64) + Fr::from(7u64))
        }

        fn hash(&self, inputs: &[Fr]) -> Result<Fr> {
            Ok(inputs
                .iter()
                .fold(Fr::from(1u64), |acc, x| acc * Fr::from(31u64) + x))
        }
    }

    fn existing() -> Commitment {
        Commitment {
            value: 2_000_000_000,
            label: Fr::from(77u64),
            nullifier: Fr::from(1001u64),
            secret: Fr::from(2002u64),
        }
    }

    fn request(withdrawn_value: u64) -> WithdrawalRequest {
        let existing = existing();

        let mut state = LeanAccumulator::new(StubHasher);
        state.insert(Fr::from(5u64)).unwrap();
        let index = state.insert(existing.hash(&StubHasher).unwrap()).unwrap();
        state.insert(Fr::from(6u64)).unwrap();

        let mut asp = LeanAccumulator::new(StubHasher);
        asp.insert(existing.label).unwrap();

        WithdrawalRequest {
            existing,
            withdrawn_value,
            new_nullifier: Fr::from(3003u64),
            new_secret: Fr::from(4004u64),
            state_proof: state.generate_proof(index).unwrap(),
            admission_proof: asp.generate_proof(0).unwrap(),
            context: Fr::from(9u64),
        }
    }

    #[test]
    fn test_build_orders_and_pads() {
        let inputs = WithdrawalInputBuilder::new(&StubHasher)
            .build(&request(1_000_000_000))
            .unwrap();
        assert_eq!(inputs.state_tree_depth, 2);
        assert_eq!(inputs.asp_tree_depth, 0);
        assert_eq!(inputs.state_index, 1);
        assert_eq!(inputs.state_siblings.len(), MAX_TREE_DEPTH);
        assert_eq!(inputs.asp_siblings, vec![Fr::zero(); MAX_TREE_DEPTH]);
        assert_eq!(
            inputs.public_inputs(),
            [
                Fr::from(1_000_000_000u64),
                inputs.state_root,
                Fr::from(2u64),
                existing().label,
                Fr::from(0u64),
                Fr::from(9u64),
            ]
        );
        assert_eq!(inputs.remaining_value().unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_full_withdrawal_is_allowed() {
        let inputs = WithdrawalInputBuilder::new(&StubHasher)
            .build(&request(2_000_000_000))
            .unwrap();
        assert_eq!(inputs.remaining_value().unwrap(), 0);
    }

    #[test]
    fn test_over_spend_rejected() {
        let err = WithdrawalInputBuilder::new(&StubHasher)
            .build(&request(3_000_000_000))
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidWithdrawal(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_wrong_state_leaf_rejected() {
        let mut req = request(1);
        req.existing.secret = Fr::from(1u64);
        assert!(matches!(
            WithdrawalInputBuilder::new(&StubHasher).build(&req),
            Err(PoolError::InvalidWithdrawal(_))
        ));
    }

    #[test]
    fn test_unapproved_label_rejected() {
        let mut req = request(1);
        req.admission_proof.leaf = Fr::from(78u64);
        assert!(matches!(
            WithdrawalInputBuilder::new(&StubHasher).build(&req),
            Err(PoolError::InvalidWithdrawal(_))
        ));
    }

    #[test]
    fn test_inconsistent_proof_is_root_mismatch() {
        let mut req = request(1);
        req.state_proof.root += Fr::from(1u64);
        assert!(matches!(
            WithdrawalInputBuilder::new(&StubHasher).build(&req),
            Err(PoolError::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_depth_beyond_bound_rejected() {
        let builder = WithdrawalInputBuilder::new(&StubHasher).with_max_tree_depth(1);
        assert!(matches!(
            builder.build(&request(1)),
            Err(PoolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_expected_signals_use_change_commitment() {
        let inputs = WithdrawalInputBuilder::new(&StubHasher).build(&request(500)).unwrap();
        let signals = inputs.expected_public_signals(&StubHasher).unwrap();

        let change = Commitment {
            value: 2_000_000_000 - 500,
            label: existing().label,
            nullifier: Fr::from(3003u64),
            secret: Fr::from(4004u64),
        };
        assert_eq!(signals.new_commitment_hash, change.hash(&StubHasher).unwrap());
        assert_eq!(
            signals.existing_nullifier_hash,
            existing().nullifier_hash(&StubHasher).unwrap()
        );
        assert_eq!(signals.withdrawn_amount().unwrap(), 500);
        assert_eq!(&signals.to_vec()[..6], &inputs.public_inputs()[..]);
    }

    #[test]
    fn test_circuit_json_signal_names() {
        let inputs = WithdrawalInputBuilder::new(&StubHasher)
            .build(&request(1_000_000_000))
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&inputs.to_circuit_json().unwrap()).unwrap();
        for key in [
            "withdrawnValue", "stateRoot", "stateTreeDepth", "ASPRoot", "ASPTreeDepth", "context",
            "label", "existingValue", "existingNullifier", "existingSecret", "newNullifier",
            "newSecret", "stateSiblings", "stateIndex", "ASPSiblings", "ASPIndex",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["withdrawnValue"], "1000000000");
        assert_eq!(json["stateIndex"], "1");
        assert_eq!(json["ASPSiblings"].as_array().unwrap().len(), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_ragequit_signals() {
        let rq = RagequitInputs::build(&existing(), &StubHasher).unwrap();
        let signals = rq.public_signals.to_vec();
        assert_eq!(signals.len(), 4);
        assert_eq!(signals[0], Fr::from(2_000_000_000u64));
        assert_eq!(signals[1], existing().label);
        assert_eq!(signals[2], existing().hash(&StubHasher).unwrap());

        let json: serde_json::Value = serde_json::from_str(&rq.to_circuit_json().unwrap()).unwrap();
        assert_eq!(json["value"], "2000000000");
    }
}
