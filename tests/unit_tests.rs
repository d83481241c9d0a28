//! Accumulator, hashing and root-history behaviour through the public API

use ark_ff::Zero;
use privacy_pool_core::{
    constants::*,
    field::{bytes_to_field, field_from_decimal, field_to_canonical_bytes},
    hasher::{compute_label, Hasher, PoseidonHasher},
    merkle::{depth_for, pad_siblings, verify_proof, LeanAccumulator, SharedAccumulator},
    Fr, PoolError, RootHistory,
};

fn poseidon_tree(values: &[u64]) -> LeanAccumulator {
    let mut tree: LeanAccumulator = LeanAccumulator::default();
    for &v in values {
        tree.insert(Fr::from(v)).unwrap();
    }
    tree
}

#[test]
fn test_depth_formula() {
    assert_eq!(depth_for(0), 0);
    assert_eq!(depth_for(1), 0);
    assert_eq!(depth_for(2), 1);
    assert_eq!(depth_for(3), 2);
    assert_eq!(depth_for(4), 2);
    assert_eq!(depth_for(5), 3);
    assert_eq!(depth_for(1 << 20), 20);
    assert_eq!(depth_for((1 << 20) + 1), 21);
    assert_eq!(depth_for(u64::MAX), 64);
}

#[test]
fn test_single_leaf_root_is_the_leaf() {
    let tree = poseidon_tree(&[42]);
    assert_eq!(tree.root(), Fr::from(42u64));
    assert_eq!(tree.depth(), 0);
}

#[test]
fn test_poseidon_roots_follow_lean_rule() {
    let h = PoseidonHasher;
    let (a, b, c) = (Fr::from(1u64), Fr::from(2u64), Fr::from(3u64));
    let tree = poseidon_tree(&[1, 2, 3]);

    let ab = h.hash_pair(&a, &b).unwrap();
    assert_eq!(tree.root(), h.hash_pair(&ab, &c).unwrap());
    assert_ne!(
        tree.root(),
        h.hash_pair(&ab, &h.hash_pair(&c, &Fr::zero()).unwrap()).unwrap()
    );
}

#[test]
fn test_five_leaf_scenario_with_poseidon() {
    let tree = poseidon_tree(&[11, 22, 33, 44, 55]);
    assert_eq!(tree.size(), 5);
    assert_eq!(tree.depth(), 3);

    let proof = tree.generate_proof(2).unwrap();
    assert_eq!(proof.siblings.len(), 3);

    let padded = pad_siblings(&proof.siblings, MAX_TREE_DEPTH).unwrap();
    assert_eq!(padded.len(), 32);
    assert_eq!(
        verify_proof(&PoseidonHasher, &proof.leaf, proof.index, &padded, tree.depth()).unwrap(),
        tree.root()
    );
}

#[test]
fn test_all_proofs_verify_with_poseidon() {
    let values: Vec<u64> = (1..=9).collect();
    let tree = poseidon_tree(&values);
    for index in 0..tree.size() {
        let proof = tree.generate_proof(index).unwrap();
        proof.verify(&PoseidonHasher).unwrap();
        tree.check_proof(&proof).unwrap();
    }
    assert!(matches!(
        tree.generate_proof(9),
        Err(PoolError::IndexOutOfRange { index: 9, size: 9 })
    ));
}

#[test]
fn test_order_sensitivity() {
    assert_ne!(poseidon_tree(&[3, 4]).root(), poseidon_tree(&[4, 3]).root());
}

#[test]
fn test_independent_trees_do_not_share_state() {
    let mut state: LeanAccumulator = LeanAccumulator::default();
    let mut asp: LeanAccumulator = LeanAccumulator::default();
    state.insert(Fr::from(1u64)).unwrap();
    state.insert(Fr::from(2u64)).unwrap();
    asp.insert(Fr::from(9u64)).unwrap();

    assert_eq!(state.size(), 2);
    assert_eq!(asp.size(), 1);
    assert_eq!(asp.root(), Fr::from(9u64));
}

#[test]
fn test_shared_accumulator_is_cloneable_handle() {
    let shared: SharedAccumulator = SharedAccumulator::new(LeanAccumulator::default());
    let other = shared.clone();
    other.insert(Fr::from(5u64)).unwrap();
    other.insert(Fr::from(6u64)).unwrap();
    assert_eq!(shared.size(), 2);
    assert_eq!(shared.root(), other.root());
    shared.generate_proof(1).unwrap().verify(&PoseidonHasher).unwrap();
}

#[test]
fn test_root_history_accepts_recent_roots() {
    let mut tree: LeanAccumulator = LeanAccumulator::default();
    let mut history = RootHistory::new();
    let mut roots = Vec::new();
    for v in 0..(ROOT_HISTORY_SIZE as u64 + 1) {
        tree.insert(Fr::from(v + 100)).unwrap();
        history.insert_root(&tree.root());
        roots.push(tree.root());
    }
    assert_eq!(history.len(), ROOT_HISTORY_SIZE);
    assert!(!history.contains_root(&roots[0]));
    assert!(history.contains_root(&roots[1]));
    assert_eq!(history.latest().unwrap(), Some(tree.root()));
}

#[test]
fn test_canonical_bytes_roundtrip_and_strictness() {
    let x = field_from_decimal("123456789012345678901234567890").unwrap();
    assert_eq!(bytes_to_field(&field_to_canonical_bytes(&x)).unwrap(), x);
    assert!(matches!(
        field_from_decimal(SCALAR_FIELD_MODULUS_DEC),
        Err(PoolError::FieldElementOutOfRange(_))
    ));
}

#[test]
fn test_labels_land_in_field() {
    let scope = [0xffu8; 32];
    for nonce in 0..4 {
        let label = compute_label(&scope, nonce);
        assert_eq!(bytes_to_field(&field_to_canonical_bytes(&label)).unwrap(), label);
    }
}
