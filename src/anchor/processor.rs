//! The three anchor operations.
//!
//! Each one runs to completion synchronously. Failures leave the account
//! untouched and emit nothing.

use crate::config::AnchorConfig;
use crate::error::{AnchorError, Result};
use crate::types::{Leaf, ZERO_DIGEST};
use crate::utils::check_proof;

use super::event::{AnchorEvent, EventSink, LeafInserted, NoopSink};
use super::state::{AnchorAccount, MerkleAnchorState};

/// Move an account from `Uninitialized` to `Active` with an empty tree.
pub fn initialize(account: &mut AnchorAccount) -> Result<()> {
    if account.is_active() {
        return Err(AnchorError::AlreadyInitialized);
    }
    *account = AnchorAccount::Active(MerkleAnchorState::new());
    Ok(())
}

/// Append `leaf`, refresh the root and emit `LeafInserted` to `sink`.
pub fn insert_leaf<E: EventSink + ?Sized>(
    account: &mut AnchorAccount,
    leaf: Leaf,
    config: &AnchorConfig,
    sink: &mut E,
) -> Result<LeafInserted> {
    let state = account.state_mut()?;

    let capacity = config.max_leaves.min(u32::MAX as usize);
    if state.leaf_count() as usize >= capacity {
        return Err(AnchorError::TreeFull { capacity });
    }
    if config.reject_zero_leaf && leaf == ZERO_DIGEST {
        return Err(AnchorError::InvalidLeaf);
    }

    let event = state.append(leaf);
    sink.emit(AnchorEvent::LeafInserted(event));
    Ok(event)
}

/// Check that `leaf` folds up through `proof`/`path` to the stored root.
///
/// `path[i] == false` means `proof[i]` sits to the right of the running
/// digest. The proof must span the full tree depth.
pub fn verify_proof(
    account: &AnchorAccount,
    leaf: &Leaf,
    proof: &[Leaf],
    path: &[bool],
) -> Result<()> {
    let state = account.state()?;
    check_proof(
        leaf,
        proof,
        path,
        state.root(),
        Some(state.leaf_count() as usize),
    )
}

/// An anchor bound to its configuration and notification sink.
///
/// The account itself is passed into every call.
#[derive(Debug)]
pub struct MerkleAnchor<E = NoopSink> {
    config: AnchorConfig,
    sink: E,
}

impl MerkleAnchor<NoopSink> {
    /// Anchor that discards notifications.
    pub fn new(config: AnchorConfig) -> Result<Self> {
        Self::with_sink(config, NoopSink)
    }
}

impl<E: EventSink> MerkleAnchor<E> {
    /// Anchor that forwards notifications to `sink`.
    pub fn with_sink(config: AnchorConfig, sink: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, sink })
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    pub fn into_sink(self) -> E {
        self.sink
    }

    /// See [`initialize`].
    pub fn initialize(&self, account: &mut AnchorAccount) -> Result<()> {
        initialize(account)
    }

    /// See [`insert_leaf`].
    pub fn insert_leaf(&mut self, account: &mut AnchorAccount, leaf: Leaf) -> Result<LeafInserted> {
        insert_leaf(account, leaf, &self.config, &mut self.sink)
    }

    /// See [`verify_proof`].
    pub fn verify_proof(
        &self,
        account: &AnchorAccount,
        leaf: &Leaf,
        proof: &[Leaf],
        path: &[bool],
    ) -> Result<()> {
        verify_proof(account, leaf, proof, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash_pair;

    fn active() -> AnchorAccount {
        let mut account = AnchorAccount::Uninitialized;
        initialize(&mut account).unwrap();
        account
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let mut account = active();
        assert!(matches!(
            initialize(&mut account),
            Err(AnchorError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_operations_require_initialize() {
        let mut account = AnchorAccount::Uninitialized;
        let mut events = Vec::new();
        let config = AnchorConfig::default();

        assert!(matches!(
            insert_leaf(&mut account, [1u8; 32], &config, &mut events),
            Err(AnchorError::NotInitialized)
        ));
        assert!(matches!(
            verify_proof(&account, &[1u8; 32], &[[2u8; 32]], &[false]),
            Err(AnchorError::NotInitialized)
        ));
        assert!(events.is_empty());
        assert_eq!(account, AnchorAccount::Uninitialized);
    }

    #[test]
    fn test_two_leaf_scenario() {
        let mut account = active();
        let mut anchor = MerkleAnchor::with_sink(AnchorConfig::default(), Vec::new()).unwrap();
        let (l1, l2) = ([1u8; 32], [2u8; 32]);

        anchor.insert_leaf(&mut account, l1).unwrap();
        assert_eq!(*account.state().unwrap().root(), hash_pair(&l1, &l1));

        anchor.insert_leaf(&mut account, l2).unwrap();
        assert_eq!(*account.state().unwrap().root(), hash_pair(&l1, &l2));

        assert!(anchor.verify_proof(&account, &l1, &[l2], &[false]).is_ok());
        assert!(matches!(
            anchor.verify_proof(&account, &l1, &[[3u8; 32]], &[false]),
            Err(AnchorError::ProofInvalid)
        ));
        assert_eq!(anchor.sink().len(), 2);
    }

    #[test]
    fn test_full_tree_rejects_without_mutation() {
        let mut account = active();
        let mut events = Vec::new();
        let config = AnchorConfig::with_max_leaves(3);
        for i in 0..3u8 {
            insert_leaf(&mut account, [i; 32], &config, &mut events).unwrap();
        }
        let before = account.clone();

        let result = insert_leaf(&mut account, [9u8; 32], &config, &mut events);
        assert!(matches!(result, Err(AnchorError::TreeFull { capacity: 3 })));
        assert_eq!(account, before);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_zero_leaf_rejection_is_opt_in() {
        let mut account = active();
        let mut sink = NoopSink;
        let strict = AnchorConfig {
            reject_zero_leaf: true,
            ..AnchorConfig::default()
        };

        assert!(matches!(
            insert_leaf(&mut account, ZERO_DIGEST, &strict, &mut sink),
            Err(AnchorError::InvalidLeaf)
        ));
        let lenient = AnchorConfig::default();
        assert!(insert_leaf(&mut account, ZERO_DIGEST, &lenient, &mut sink).is_ok());
    }

    #[test]
    fn test_verify_on_empty_tree_fails() {
        let account = active();
        assert!(matches!(
            verify_proof(&account, &ZERO_DIGEST, &[], &[]),
            Err(AnchorError::ProofInvalid)
        ));
        assert!(matches!(
            verify_proof(&account, &ZERO_DIGEST, &[ZERO_DIGEST], &[false]),
            Err(AnchorError::ProofInvalid)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(MerkleAnchor::new(AnchorConfig::with_max_leaves(0)).is_err());
    }
}
