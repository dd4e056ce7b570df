//! Anchor state and its serialized record layout.
//!
//! Record layout (little-endian):
//! ```text
//! discriminator (8) || root (32) || leaf_count (u32) || len (u32) || leaves (32 * len)
//! ```
//! An empty or all-zero blob is an uninitialized record.

use crate::error::{AnchorError, Result};
use crate::types::{Leaf, MerkleProof, HASH_SIZE};
use crate::utils::MerkleTree;

use super::event::LeafInserted;

/// Tags a blob as an initialized anchor record.
pub const DISCRIMINATOR: [u8; 8] = *b"mrklanch";

const HEADER_LEN: usize = DISCRIMINATOR.len() + HASH_SIZE + 4 + 4;

/// Leaves, leaf count and root of one anchor.
///
/// `leaf_count == leaves().len()` and `root == merkle_root(leaves())` hold
/// after every completed operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleAnchorState {
    tree: MerkleTree,
    leaf_count: u32,
    root: Leaf,
}

impl MerkleAnchorState {
    /// Fresh state: no leaves, zero count, zero root.
    pub fn new() -> Self {
        Self::default()
    }

    /// The leaves in insertion order.
    pub fn leaves(&self) -> &[Leaf] {
        self.tree.leaves()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u32 {
        self.leaf_count
    }

    /// Current root (all-zero when empty).
    pub fn root(&self) -> &Leaf {
        &self.root
    }

    /// Hashing rounds a proof against this state must take.
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Index of the first occurrence of `leaf`.
    pub fn position(&self, leaf: &Leaf) -> Option<usize> {
        self.leaves().iter().position(|l| l == leaf)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> Result<MerkleProof> {
        self.tree.prove(index).ok_or(AnchorError::LeafOutOfRange {
            index,
            leaf_count: self.leaf_count as usize,
        })
    }

    /// Append one leaf and refresh the root. Capacity is the caller's check.
    pub(crate) fn append(&mut self, leaf: Leaf) -> LeafInserted {
        self.tree.push(leaf);
        self.leaf_count += 1;
        self.root = self.tree.root();
        LeafInserted {
            leaf,
            index: self.leaf_count - 1,
            root: self.root,
        }
    }

    /// Encode to the record layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let leaves = self.leaves();
        let mut out = Vec::with_capacity(HEADER_LEN + leaves.len() * HASH_SIZE);
        out.extend_from_slice(&DISCRIMINATOR);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.leaf_count.to_le_bytes());
        out.extend_from_slice(&(leaves.len() as u32).to_le_bytes());
        for leaf in leaves {
            out.extend_from_slice(leaf);
        }
        out
    }

    /// Decode from the record layout, rejecting blobs whose count or root
    /// disagree with the stored leaves.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(AnchorError::codec(format!(
                "record is {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let (disc, rest) = bytes.split_at(DISCRIMINATOR.len());
        if disc != &DISCRIMINATOR[..] {
            return Err(AnchorError::codec("discriminator mismatch"));
        }

        let (root_bytes, rest) = rest.split_at(HASH_SIZE);
        let (count_bytes, rest) = rest.split_at(4);
        let (len_bytes, body) = rest.split_at(4);

        let mut root = [0u8; HASH_SIZE];
        root.copy_from_slice(root_bytes);
        let leaf_count = read_u32(count_bytes);
        let len = read_u32(len_bytes) as usize;

        if len.checked_mul(HASH_SIZE) != Some(body.len()) {
            return Err(AnchorError::codec(format!(
                "{} leaves declared, found {} leaf bytes",
                len,
                body.len()
            )));
        }
        if leaf_count as usize != len {
            return Err(AnchorError::codec(format!(
                "leaf_count {} disagrees with {} stored leaves",
                leaf_count, len
            )));
        }

        let leaves: Vec<Leaf> = body
            .chunks_exact(HASH_SIZE)
            .map(|chunk| {
                let mut leaf = [0u8; HASH_SIZE];
                leaf.copy_from_slice(chunk);
                leaf
            })
            .collect();
        let tree = MerkleTree::from_leaves(&leaves);
        if tree.root() != root {
            return Err(AnchorError::codec("stored root does not match leaves"));
        }

        Ok(Self { tree, leaf_count, root })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// A record slot: either never initialized or holding an active anchor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AnchorAccount {
    #[default]
    Uninitialized,
    Active(MerkleAnchorState),
}

impl AnchorAccount {
    /// Whether `initialize` has run.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Borrow the active state.
    pub fn state(&self) -> Result<&MerkleAnchorState> {
        match self {
            Self::Active(state) => Ok(state),
            Self::Uninitialized => Err(AnchorError::NotInitialized),
        }
    }

    /// Mutably borrow the active state.
    pub fn state_mut(&mut self) -> Result<&mut MerkleAnchorState> {
        match self {
            Self::Active(state) => Ok(state),
            Self::Uninitialized => Err(AnchorError::NotInitialized),
        }
    }

    /// Encode; uninitialized records encode to an empty blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Active(state) => state.to_bytes(),
            Self::Uninitialized => Vec::new(),
        }
    }

    /// Decode; empty and all-zero blobs are uninitialized.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(|b| *b == 0) {
            return Ok(Self::Uninitialized);
        }
        MerkleAnchorState::from_bytes(bytes).map(Self::Active)
    }
}
