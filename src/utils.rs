//! Hashing and Merkle tree construction.
//!
//! Odd levels are padded by pairing the last node with itself, and the leaf
//! level is always hashed at least once, so a single leaf `L` yields the
//! root `SHA-256(L || L)`. Proof generation and verification use the same
//! rule.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AnchorError, Result};
use crate::types::{Leaf, MerkleProof, ZERO_DIGEST};

/// SHA-256 hash helper.
pub fn sha256(data: &[u8]) -> Leaf {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash two nodes together: `SHA-256(left || right)`.
pub fn hash_pair(left: &Leaf, right: &Leaf) -> Leaf {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Number of hashing rounds between the leaves and the root.
///
/// Zero for an empty tree, otherwise `max(1, ceil(log2 n))`.
pub fn tree_depth(num_leaves: usize) -> usize {
    match num_leaves {
        0 => 0,
        n => (n.next_power_of_two().trailing_zeros() as usize).max(1),
    }
}

/// Compute the root over `leaves` from scratch.
pub fn merkle_root(leaves: &[Leaf]) -> Leaf {
    if leaves.is_empty() {
        return ZERO_DIGEST;
    }

    let mut level = leaves.to_vec();
    loop {
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
        if level.len() == 1 {
            return level[0];
        }
    }
}

/// Fold a sibling path into a candidate root.
pub fn compute_proof_root(leaf: &Leaf, siblings: &[Leaf], path: &[bool]) -> Leaf {
    let mut current = *leaf;
    for (sibling, is_left) in siblings.iter().zip(path) {
        current = if *is_left {
            hash_pair(sibling, &current)
        } else {
            hash_pair(&current, sibling)
        };
    }
    current
}

/// Check a proof against `root`.
///
/// When `leaf_count` is known the proof must have exactly
/// `tree_depth(leaf_count)` steps; an empty proof never verifies.
pub(crate) fn check_proof(
    leaf: &Leaf,
    siblings: &[Leaf],
    path: &[bool],
    root: &Leaf,
    leaf_count: Option<usize>,
) -> Result<()> {
    if siblings.len() != path.len() {
        return Err(AnchorError::MalformedProof {
            proof_len: siblings.len(),
            path_len: path.len(),
        });
    }
    if siblings.is_empty() {
        return Err(AnchorError::ProofInvalid);
    }
    if let Some(count) = leaf_count {
        if siblings.len() != tree_depth(count) {
            return Err(AnchorError::ProofInvalid);
        }
    }

    let computed = compute_proof_root(leaf, siblings, path);
    if bool::from(computed[..].ct_eq(&root[..])) {
        Ok(())
    } else {
        Err(AnchorError::ProofInvalid)
    }
}

/// Merkle tree holding every level, leaves first.
///
/// Appends only touch the rightmost node of each level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Leaf>>,
}

impl MerkleTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from leaves level by level (one hash per interior node).
    pub fn from_leaves(leaves: &[Leaf]) -> Self {
        if leaves.is_empty() {
            return Self::new();
        }
        let mut levels = vec![leaves.to_vec()];
        loop {
            let level = &levels[levels.len() - 1];
            if levels.len() > 1 && level.len() == 1 {
                break;
            }
            let upper = level
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(upper);
        }
        Self { levels }
    }

    /// Append a leaf and refresh the right spine up to the root.
    pub fn push(&mut self, leaf: Leaf) {
        match self.levels.first_mut() {
            Some(leaves) => leaves.push(leaf),
            None => self.levels.push(vec![leaf]),
        }

        let mut k = 0;
        loop {
            let level = &self.levels[k];
            if k > 0 && level.len() == 1 {
                break;
            }
            let pair_start = (level.len() - 1) & !1;
            let left = level[pair_start];
            let right = level.get(pair_start + 1).copied().unwrap_or(left);
            let parent = hash_pair(&left, &right);
            let parent_index = pair_start / 2;

            if self.levels.len() == k + 1 {
                self.levels.push(Vec::new());
            }
            let upper = &mut self.levels[k + 1];
            if parent_index < upper.len() {
                upper[parent_index] = parent;
            } else {
                upper.push(parent);
            }
            k += 1;
        }
    }

    /// The leaves in insertion order.
    pub fn leaves(&self) -> &[Leaf] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves().len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the Merkle root (all-zero for an empty tree).
    pub fn root(&self) -> Leaf {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(ZERO_DIGEST)
    }

    /// Number of hashing rounds between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Generate a Merkle proof for the leaf at `leaf_index`.
    pub fn prove(&self, leaf_index: usize) -> Option<MerkleProof> {
        let leaf = *self.leaves().get(leaf_index)?;

        let depth = self.depth();
        let mut siblings = Vec::with_capacity(depth);
        let mut path = Vec::with_capacity(depth);
        let mut index = leaf_index;

        for level in &self.levels[..depth] {
            let is_right_child = index % 2 == 1;
            let sibling = if is_right_child {
                level[index - 1]
            } else {
                level.get(index + 1).copied().unwrap_or(level[index])
            };
            siblings.push(sibling);
            path.push(is_right_child);
            index /= 2;
        }

        Some(MerkleProof::new(leaf, leaf_index, siblings, path))
    }
}
