//! Identity Merkle tree and membership proofs.
//!
//! The tree is a fixed-depth binary tree over identity commitments,
//! hashed with the Poseidon sponge so membership can be proven in-circuit.
//! Empty subtrees are filled with precomputed zero hashes.

use lib_crypto::{poseidon_hash_pair, Fp, Hash256};
use serde::{Deserialize, Serialize};

/// Depth of the identity tree: 2^20 identities per tree.
pub const IDENTITY_TREE_DEPTH: usize = 20;

/// Membership proof: one sibling per level plus the path bit for that
/// level (0 = current node is the left child, 1 = the right child).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MerkleProof {
    pub siblings: Vec<Fp>,
    pub path_bits: Vec<bool>,
}

impl MerkleProof {
    /// An empty proof is the "no proof attempted" sentinel used by claim
    /// construction.
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Folds the path from `leaf` up to the root. Sibling order per level
    /// follows the path bit: when the current node is on the right, the
    /// sibling is absorbed first.
    pub fn compute_root(&self, leaf: Fp) -> Fp {
        let mut current = leaf;
        for (i, sibling) in self.siblings.iter().enumerate() {
            let on_right = self.path_bits.get(i).copied().unwrap_or(false);
            current = if on_right {
                poseidon_hash_pair(sibling, &current)
            } else {
                poseidon_hash_pair(&current, sibling)
            };
        }
        current
    }
}

/// In-memory identity tree.
///
/// Leaves are appended in registration order; the tree recomputes levels
/// on demand, padding odd levels with the zero hash of that level. Full
/// nodes keep this in the identity subsystem; the consensus core only
/// ever sees roots and proofs.
#[derive(Debug, Clone)]
pub struct IdentityTree {
    depth: usize,
    leaves: Vec<Fp>,
    zero_hashes: Vec<Fp>,
}

impl IdentityTree {
    pub fn new(depth: usize) -> Self {
        let mut zero_hashes = Vec::with_capacity(depth + 1);
        zero_hashes.push(Fp::ZERO);
        for level in 0..depth {
            let below = zero_hashes[level];
            zero_hashes.push(poseidon_hash_pair(&below, &below));
        }
        IdentityTree {
            depth,
            leaves: Vec::new(),
            zero_hashes,
        }
    }

    pub fn with_default_depth() -> Self {
        IdentityTree::new(IDENTITY_TREE_DEPTH)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Appends a commitment, returning its leaf index.
    pub fn insert(&mut self, commitment: Fp) -> usize {
        debug_assert!(self.leaves.len() < (1usize << self.depth), "identity tree full");
        self.leaves.push(commitment);
        self.leaves.len() - 1
    }

    /// Current root over all inserted leaves.
    pub fn root(&self) -> Fp {
        let mut level: Vec<Fp> = self.leaves.clone();
        for depth_level in 0..self.depth {
            let zero = self.zero_hashes[depth_level];
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut i = 0;
            while i < level.len() {
                let left = level[i];
                let right = if i + 1 < level.len() { level[i + 1] } else { zero };
                next.push(poseidon_hash_pair(&left, &right));
                i += 2;
            }
            if next.is_empty() {
                next.push(poseidon_hash_pair(&zero, &zero));
            }
            level = next;
        }
        level[0]
    }

    /// Root in hash form, as published to the consensus layer.
    pub fn root_hash(&self) -> Hash256 {
        Hash256::from_bytes(self.root().to_bytes_le())
    }

    /// Builds the membership proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_bits = Vec::with_capacity(self.depth);

        let mut level: Vec<Fp> = self.leaves.clone();
        let mut idx = index;
        for depth_level in 0..self.depth {
            let zero = self.zero_hashes[depth_level];
            let sibling_idx = idx ^ 1;
            let sibling = level.get(sibling_idx).copied().unwrap_or(zero);
            siblings.push(sibling);
            path_bits.push(idx & 1 == 1);

            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut i = 0;
            while i < level.len() {
                let left = level[i];
                let right = if i + 1 < level.len() { level[i + 1] } else { zero };
                next.push(poseidon_hash_pair(&left, &right));
                i += 2;
            }
            if next.is_empty() {
                next.push(poseidon_hash_pair(&zero, &zero));
            }
            level = next;
            idx /= 2;
        }

        Some(MerkleProof { siblings, path_bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_recomputes_root() {
        let mut tree = IdentityTree::new(6);
        let leaves: Vec<Fp> = (1..=5u64).map(Fp::from_u64).collect();
        for leaf in &leaves {
            tree.insert(*leaf);
        }

        let root = tree.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.prove(i).unwrap();
            assert_eq!(proof.siblings.len(), 6);
            assert_eq!(proof.compute_root(*leaf), root, "leaf {i}");
        }
    }

    #[test]
    fn test_wrong_leaf_fails_root_check() {
        let mut tree = IdentityTree::new(6);
        tree.insert(Fp::from_u64(10));
        tree.insert(Fp::from_u64(11));

        let proof = tree.prove(0).unwrap();
        assert_ne!(proof.compute_root(Fp::from_u64(99)), tree.root());
    }

    #[test]
    fn test_root_changes_on_insert() {
        let mut tree = IdentityTree::new(6);
        tree.insert(Fp::from_u64(1));
        let before = tree.root();
        tree.insert(Fp::from_u64(2));
        assert_ne!(before, tree.root());
    }

    #[test]
    fn test_prove_out_of_range() {
        let tree = IdentityTree::new(6);
        assert!(tree.prove(0).is_none());
    }

    #[test]
    fn test_empty_proof_sentinel() {
        assert!(MerkleProof::default().is_empty());
    }
}
