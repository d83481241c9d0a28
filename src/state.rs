use anchor_lang::prelude::*;

use crate::constants::{FIELD_BYTES, ROOT_HISTORY_SIZE};
use crate::error::Result;
use crate::field::{field_from_be_bytes, Fr};
use crate::zk_verifier::solana_verifier::encode_public_signal;

/// Recent state roots a withdrawal may be proven against.
///
/// Roots are kept in the verifier's big-endian signal encoding, oldest first.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RootHistory {
    pub roots: Vec<[u8; 32]>,
}

impl RootHistory {
    pub const SIZE: usize = 4 + (ROOT_HISTORY_SIZE * FIELD_BYTES);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_root(&mut self, root: &Fr) {
        let encoded = encode_public_signal(root);
        if !self.roots.contains(&encoded) {
            if self.roots.len() >= ROOT_HISTORY_SIZE {
                self.roots.remove(0); // drop oldest
            }
            self.roots.push(encoded);
        }
    }

    pub fn contains_root(&self, root: &Fr) -> bool {
        self.roots.contains(&encode_public_signal(root))
    }

    pub fn latest(&self) -> Result<Option<Fr>> {
        self.roots.last().map(field_from_be_bytes).transpose()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
