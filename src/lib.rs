//! # Merkle Anchor
//!
//! A bounded-capacity, append-only leaf store that maintains a single
//! SHA-256 Merkle root and verifies inclusion proofs against it.
//!
//! ## Features
//!
//! - **Append-only**: `initialize`, `insert_leaf`, `verify_proof`, nothing else
//! - **Bounded**: inserts past `max_leaves` fail with `TreeFull` and change nothing
//! - **Atomic**: every failure path leaves leaves, count and root untouched
//! - **Observable**: each committed insert emits a `LeafInserted` event to an
//!   injected sink
//!
//! ## Quick Start
//!
//! ```rust
//! use merkle_anchor::{AnchorAccount, AnchorConfig, MerkleAnchor};
//!
//! let mut account = AnchorAccount::default();
//! let mut anchor = MerkleAnchor::with_sink(AnchorConfig::default(), Vec::new()).unwrap();
//!
//! anchor.initialize(&mut account).unwrap();
//! anchor.insert_leaf(&mut account, [1u8; 32]).unwrap();
//! anchor.insert_leaf(&mut account, [2u8; 32]).unwrap();
//!
//! // Sibling [2; 32] sits to the right of leaf [1; 32].
//! assert!(anchor.verify_proof(&account, &[1u8; 32], &[[2u8; 32]], &[false]).is_ok());
//! assert!(anchor.verify_proof(&account, &[1u8; 32], &[[3u8; 32]], &[false]).is_err());
//! ```
//!
//! ## Tree shape
//!
//! Nodes are `SHA-256(left || right)`. An unpaired node at the end of a
//! level is paired with itself, and the leaf level is always hashed at
//! least once, so one leaf `L` gives the root `SHA-256(L || L)`. The empty
//! tree's root is 32 zero bytes.

pub mod anchor;
pub mod config;
pub mod error;
pub mod runtime;
pub mod types;
pub mod utils;

pub use anchor::{
    AnchorAccount, AnchorEvent, EventSink, LeafInserted, ListenerRegistry, MerkleAnchor,
    MerkleAnchorState, NoopSink,
};
pub use config::{AnchorConfig, DEFAULT_MAX_LEAVES};
pub use error::{AnchorError, Result};
pub use runtime::{AnchorService, AnchorStore, MemoryStore};
pub use types::{Address, Leaf, MerkleProof, HASH_SIZE, ZERO_DIGEST};
pub use utils::{hash_pair, merkle_root, MerkleTree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_full_flow() {
        let mut account = AnchorAccount::default();
        let mut anchor =
            MerkleAnchor::with_sink(AnchorConfig::with_max_leaves(8), Vec::new()).unwrap();
        anchor.initialize(&mut account).unwrap();

        for i in 0..8u8 {
            anchor.insert_leaf(&mut account, [i; 32]).unwrap();
        }
        let state = account.state().unwrap();
        assert_eq!(state.leaf_count(), 8);
        assert_eq!(*state.root(), merkle_root(state.leaves()));

        for i in 0..8 {
            let (leaf, proof, path) = state.prove(i).unwrap().into_parts();
            assert!(anchor.verify_proof(&account, &leaf, &proof, &path).is_ok());
        }

        assert!(matches!(
            anchor.insert_leaf(&mut account, [9u8; 32]),
            Err(AnchorError::TreeFull { capacity: 8 })
        ));
        assert_eq!(anchor.sink().len(), 8);
    }
}
