//! Lean incremental Merkle accumulator.
//!
//! Append-only binary tree with dynamic depth. A node without a right sibling is
//! carried to its parent unchanged; only a complete pair is hashed. Proof siblings
//! keep the zero element in the positions where no sibling exists, and verification
//! treats a zero sibling as "carry unchanged".
//!
//! Nodes live in an arena of per-level rows, `nodes[level][index]`; level `l` holds
//! `ceil(size / 2^l)` entries.
//!
//! Leaves must be nonzero and distinct. A zero leaf would surface as a zero sibling
//! and be skipped during verification.

use std::collections::HashMap;
use std::sync::Arc;

use ark_ff::Zero;
use parking_lot::RwLock;

use crate::constants::MAX_TREE_DEPTH;
use crate::error::{PoolError, Result};
use crate::field::{field_hex, Fr};
use crate::hasher::{Hasher, PoseidonHasher};

/// `0` for up to one leaf, `ceil(log2(size))` otherwise.
pub fn depth_for(size: u64) -> usize {
    if size <= 1 {
        0
    } else {
        (u64::BITS - (size - 1).leading_zeros()) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub leaf: Fr,
    pub index: u64,
    /// `siblings[i]` pairs with the path node at level `i`; zero where none exists.
    pub siblings: Vec<Fr>,
    pub root: Fr,
}

impl InclusionProof {
    /// Depth of the accumulator when the proof was taken.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Recompute the root from the proof alone and compare it to `self.root`.
    pub fn verify<H: Hasher + ?Sized>(&self, hasher: &H) -> Result<()> {
        let computed = verify_proof(hasher, &self.leaf, self.index, &self.siblings, self.depth())?;
        if computed != self.root {
            return Err(PoolError::RootMismatch {
                expected: field_hex(&self.root),
                computed: field_hex(&computed),
            });
        }
        Ok(())
    }

    pub fn padded_siblings(&self, max_depth: usize) -> Result<Vec<Fr>> {
        pad_siblings(&self.siblings, max_depth)
    }
}

/// Recompute a root from `leaf` and the first `depth` siblings.
///
/// Needs no accumulator: the verifying side only ever holds the proof.
pub fn verify_proof<H: Hasher + ?Sized>(
    hasher: &H,
    leaf: &Fr,
    index: u64,
    siblings: &[Fr],
    depth: usize,
) -> Result<Fr> {
    if siblings.len() < depth {
        return Err(PoolError::invalid(format!(
            "{} siblings supplied for depth {depth}",
            siblings.len()
        )));
    }

    let mut node = *leaf;
    let mut idx = index;
    for sibling in &siblings[..depth] {
        if !sibling.is_zero() {
            node = if idx & 1 == 1 {
                hasher.hash_pair(sibling, &node)?
            } else {
                hasher.hash_pair(&node, sibling)?
            };
        }
        idx >>= 1;
    }
    Ok(node)
}

/// Append zero elements until `siblings` has `max_depth` entries.
pub fn pad_siblings(siblings: &[Fr], max_depth: usize) -> Result<Vec<Fr>> {
    if siblings.len() > max_depth {
        return Err(PoolError::invalid(format!(
            "{} siblings exceed max depth {max_depth}",
            siblings.len()
        )));
    }
    let mut padded = Vec::with_capacity(max_depth);
    padded.extend_from_slice(siblings);
    padded.resize(max_depth, Fr::zero());
    Ok(padded)
}

#[derive(Debug)]
pub struct LeanAccumulator<H: Hasher = PoseidonHasher> {
    hasher: H,
    nodes: Vec<Vec<Fr>>,
    /// leaf -> index
    positions: HashMap<Fr, u64>,
    max_depth: Option<usize>,
}

impl Default for LeanAccumulator<PoseidonHasher> {
    fn default() -> Self {
        Self::new(PoseidonHasher)
    }
}

impl<H: Hasher> LeanAccumulator<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            nodes: vec![Vec::new()],
            positions: HashMap::new(),
            max_depth: None,
        }
    }

    /// Refuses inserts once `2^max_depth` leaves are stored.
    pub fn with_max_depth(hasher: H, max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::new(hasher)
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn size(&self) -> u64 {
        self.leaves().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn depth(&self) -> usize {
        depth_for(self.size())
    }

    /// Zero when empty, the leaf itself for a single leaf, else node `(depth, 0)`.
    pub fn root(&self) -> Fr {
        self.nodes
            .get(self.depth())
            .and_then(|row| row.first())
            .copied()
            .unwrap_or_else(Fr::zero)
    }

    pub fn leaves(&self) -> &[Fr] {
        self.nodes.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf(&self, index: u64) -> Option<Fr> {
        usize::try_from(index).ok().and_then(|i| self.leaves().get(i)).copied()
    }

    pub fn index_of(&self, leaf: &Fr) -> Option<u64> {
        self.positions.get(leaf).copied()
    }

    /// Append `leaf` and rehash its path; returns the assigned index.
    pub fn insert(&mut self, leaf: Fr) -> Result<u64> {
        if leaf.is_zero() {
            return Err(PoolError::invalid("zero leaf"));
        }
        if let Some(existing) = self.positions.get(&leaf) {
            return Err(PoolError::invalid(format!(
                "leaf {} already present at index {existing}",
                field_hex(&leaf)
            )));
        }

        let index = self.size();
        if let Some(max) = self.max_depth {
            if max < 64 && index >= (1u64 << max) {
                return Err(PoolError::invalid(format!(
                    "accumulator is full ({index} leaves, max depth {max})"
                )));
            }
        }

        let new_depth = depth_for(index + 1);

        // Hash the whole path before touching the arena so a hasher failure
        // leaves the tree as it was.
        let mut path = Vec::with_capacity(new_depth + 1);
        let mut node = leaf;
        let mut idx = index as usize;
        for level in 0..new_depth {
            path.push(node);
            if idx & 1 == 1 {
                let left = self.nodes[level][idx - 1];
                node = self.hasher.hash_pair(&left, &node)?;
            }
            idx >>= 1;
        }
        path.push(node);

        while self.nodes.len() <= new_depth {
            self.nodes.push(Vec::new());
        }
        let mut idx = index as usize;
        for (level, value) in path.into_iter().enumerate() {
            let row = &mut self.nodes[level];
            if idx < row.len() {
                row[idx] = value;
            } else {
                debug_assert_eq!(idx, row.len());
                row.push(value);
            }
            idx >>= 1;
        }

        self.positions.insert(leaf, index);

        trace!(
            "accumulator: leaf {} inserted, depth={}, root={}",
            index,
            new_depth,
            field_hex(&self.root())
        );
        Ok(index)
    }

    pub fn generate_proof(&self, index: u64) -> Result<InclusionProof> {
        let size = self.size();
        let leaf = self
            .leaf(index)
            .ok_or(PoolError::IndexOutOfRange { index, size })?;

        let depth = self.depth();
        let mut siblings = Vec::with_capacity(depth);
        let mut idx = index as usize;
        for row in &self.nodes[..depth] {
            siblings.push(row.get(idx ^ 1).copied().unwrap_or_else(Fr::zero));
            idx >>= 1;
        }

        Ok(InclusionProof {
            leaf,
            index,
            siblings,
            root: self.root(),
        })
    }

    /// The proof must both recompute its own root and match the current one.
    pub fn check_proof(&self, proof: &InclusionProof) -> Result<()> {
        proof.verify(&self.hasher)?;
        let root = self.root();
        if proof.root != root {
            return Err(PoolError::RootMismatch {
                expected: field_hex(&root),
                computed: field_hex(&proof.root),
            });
        }
        Ok(())
    }
}

/// Cloneable handle serializing writers and letting readers share a snapshot.
///
/// `parking_lot`'s lock parks new readers once a writer is queued, so a steady
/// stream of proof requests cannot starve deposits.
#[derive(Debug)]
pub struct SharedAccumulator<H: Hasher = PoseidonHasher> {
    inner: Arc<RwLock<LeanAccumulator<H>>>,
}

impl<H: Hasher> Clone for SharedAccumulator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Hasher> SharedAccumulator<H> {
    pub fn new(accumulator: LeanAccumulator<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(accumulator)),
        }
    }

    pub fn insert(&self, leaf: Fr) -> Result<u64> {
        self.inner.write().insert(leaf)
    }

    pub fn root(&self) -> Fr {
        self.inner.read().root()
    }

    pub fn depth(&self) -> usize {
        self.inner.read().depth()
    }

    pub fn size(&self) -> u64 {
        self.inner.read().size()
    }

    pub fn generate_proof(&self, index: u64) -> Result<InclusionProof> {
        self.inner.read().generate_proof(index)
    }

    /// Run `f` against one consistent snapshot (no insert can interleave).
    pub fn read<R>(&self, f: impl FnOnce(&LeanAccumulator<H>) -> R) -> R {
        f(&self.inner.read())
    }
}

/// Pads to the circuit's fixed sibling count.
pub fn pad_to_circuit_depth(siblings: &[Fr]) -> Result<Vec<Fr>> {
    pad_siblings(siblings, MAX_TREE_DEPTH)
}
