//! Error types for Merkle anchor operations.
//!
//! Provides strongly-typed errors for the anchor core and its collaborators
//! using `thiserror`.

use thiserror::Error;

/// Errors that can occur during Merkle anchor operations.
#[derive(Debug, Error)]
pub enum AnchorError {
    /// Operation attempted on a record that was never initialized.
    #[error("Anchor not initialized")]
    NotInitialized,
    /// `initialize` called on an active record.
    #[error("Anchor already initialized")]
    AlreadyInitialized,
    /// Insert attempted at capacity.
    #[error("TreeFull: anchor holds the maximum of {capacity} leaves")]
    TreeFull { capacity: usize },
    /// Proof and path lengths disagree.
    #[error("Malformed proof: {proof_len} siblings but {path_len} path bits")]
    MalformedProof { proof_len: usize, path_len: usize },
    /// Recomputed digest does not match the stored root.
    #[error("Proof invalid: recomputed digest does not match the anchor root")]
    ProofInvalid,
    /// Leaf rejected by configuration (all-zero leaf).
    #[error("Invalid leaf: all-zero leaves are not accepted")]
    InvalidLeaf,
    /// Proof requested for a position past the end of the tree.
    #[error("Leaf index {index} out of range ({leaf_count} leaves)")]
    LeafOutOfRange { index: usize, leaf_count: usize },
    /// Signer is not allowed to mutate the record.
    #[error("Unauthorized signer {signer}")]
    Unauthorized { signer: String },
    /// No record stored under the given id.
    #[error("Record {id} not found")]
    RecordNotFound { id: String },
    /// A record already exists under the given id.
    #[error("Record {id} already exists")]
    RecordExists { id: String },
    /// Stored state blob could not be decoded.
    #[error("Codec error: {reason}")]
    Codec { reason: String },
    /// Configuration rejected by validation.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    /// JSON config or event payload could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// File I/O Error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnchorError {
    /// Whether this error belongs to the core taxonomy (as opposed to the
    /// store, authorization or configuration layers).
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::AlreadyInitialized
                | Self::TreeFull { .. }
                | Self::MalformedProof { .. }
                | Self::ProofInvalid
                | Self::InvalidLeaf
        )
    }

    pub(crate) fn codec(reason: impl Into<String>) -> Self {
        Self::Codec { reason: reason.into() }
    }
}

/// Result type alias for Merkle anchor operations.
pub type Result<T> = core::result::Result<T, AnchorError>;
