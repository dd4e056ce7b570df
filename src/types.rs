//! Core types for Merkle anchor operations.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Digest width in bytes (SHA-256).
pub const HASH_SIZE: usize = 32;

/// A fixed-size digest: one tree entry, an interior node or a root.
pub type Leaf = [u8; HASH_SIZE];

/// The empty-tree sentinel root.
pub const ZERO_DIGEST: Leaf = [0u8; HASH_SIZE];

/// 32-byte identifier (record address or signer key), displayed as hex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Build an address from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Inclusion proof for a single leaf.
///
/// `path[i] == false` places `siblings[i]` on the right of the running
/// digest, `true` places it on the left.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The proven leaf
    pub(crate) leaf: Leaf,
    /// Position of the leaf in insertion order
    pub(crate) leaf_index: usize,
    /// Sibling digests from leaf level to root
    pub(crate) siblings: Vec<Leaf>,
    /// Direction bits, one per sibling
    pub(crate) path: Vec<bool>,
}

impl MerkleProof {
    /// Create a new Merkle proof.
    pub fn new(leaf: Leaf, leaf_index: usize, siblings: Vec<Leaf>, path: Vec<bool>) -> Self {
        Self { leaf, leaf_index, siblings, path }
    }

    /// Get the proven leaf.
    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }

    /// Get the leaf index.
    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    /// Get the sibling digests.
    pub fn siblings(&self) -> &[Leaf] {
        &self.siblings
    }

    /// Get the direction bits.
    pub fn path(&self) -> &[bool] {
        &self.path
    }

    /// Number of hashing steps.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Verify against a known root without an anchor record.
    pub fn verify(&self, root: &Leaf) -> Result<()> {
        crate::utils::check_proof(&self.leaf, &self.siblings, &self.path, root, None)
    }

    /// Split into `(leaf, siblings, path)` for the anchor's `verify_proof`.
    pub fn into_parts(self) -> (Leaf, Vec<Leaf>, Vec<bool>) {
        (self.leaf, self.siblings, self.path)
    }
}
