//! Merkle anchor module.
//!
//! A bounded, append-only leaf store with a cached root and inclusion
//! proof verification.

pub mod event;
pub mod processor;
pub mod state;

pub use event::{AnchorEvent, EventSink, LeafInserted, ListenerId, ListenerRegistry, NoopSink};
pub use processor::{initialize, insert_leaf, verify_proof, MerkleAnchor};
pub use state::{AnchorAccount, MerkleAnchorState};
