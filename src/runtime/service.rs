//! Anchor service: the anchor core wired to a store, an authorizer and an
//! event sink.
//!
//! Events produced inside a transaction are buffered and reach the sink
//! only after the store commits. The sink lock is taken before the store
//! releases the record, so per-record delivery follows commit order.
//!
//! Every mutating call decodes the record blob, which rebuilds the tree in
//! O(n) hashes for n leaves. The O(log n) append applies within one decoded
//! state, as with [`crate::MerkleAnchor`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::anchor::{
    self, AnchorAccount, AnchorEvent, EventSink, LeafInserted, MerkleAnchorState, NoopSink,
};
use crate::config::AnchorConfig;
use crate::error::{AnchorError, Result};
use crate::types::{Address, Leaf, MerkleProof};

use super::authority::{AuthorityOnly, Authorizer};
use super::store::{AnchorStore, RecordId};

pub struct AnchorService<S, A = AuthorityOnly, E = NoopSink> {
    store: S,
    authorizer: A,
    config: AnchorConfig,
    sink: Mutex<E>,
}

impl<S: AnchorStore> AnchorService<S, AuthorityOnly, NoopSink> {
    /// Service with owner-only inserts and no observers.
    pub fn new(store: S, config: AnchorConfig) -> Result<Self> {
        Self::with_parts(store, AuthorityOnly, config, NoopSink)
    }
}

impl<S, A, E> AnchorService<S, A, E>
where
    S: AnchorStore,
    A: Authorizer,
    E: EventSink,
{
    pub fn with_parts(store: S, authorizer: A, config: AnchorConfig, sink: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            authorizer,
            config,
            sink: Mutex::new(sink),
        })
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` with exclusive access to the sink (e.g. to subscribe).
    pub fn with_sink<T>(&self, f: impl FnOnce(&mut E) -> T) -> T {
        f(&mut *self.lock_sink())
    }

    /// Allocate the record if needed and initialize it for `authority`.
    ///
    /// A denied signer leaves no record behind.
    pub fn initialize(&self, id: RecordId, authority: Address) -> Result<()> {
        let result = self.allocate(id, authority).and_then(|()| {
            self.store.transact(&id, |owner, data| {
                self.check_signer(owner, &authority)?;
                let mut account = AnchorAccount::from_bytes(data)?;
                anchor::initialize(&mut account)?;
                *data = account.to_bytes();
                Ok(())
            })
        });

        match &result {
            Ok(()) => info!(record = %id, authority = %authority, "anchor initialized"),
            Err(e) => warn!(record = %id, error = %e, "initialize rejected"),
        }
        result
    }

    /// Authorize `signer`, append `leaf` atomically, then notify the sink.
    pub fn insert_leaf(&self, id: &RecordId, signer: &Address, leaf: Leaf) -> Result<LeafInserted> {
        let mut pending: Vec<AnchorEvent> = Vec::new();

        let result = self.store.transact(id, |owner, data| {
            self.check_signer(owner, signer)?;
            let mut account = AnchorAccount::from_bytes(data)?;
            let event = anchor::insert_leaf(&mut account, leaf, &self.config, &mut pending)?;
            *data = account.to_bytes();
            Ok((event, self.lock_sink()))
        });

        match result {
            Ok((event, mut sink)) => {
                info!(
                    record = %id,
                    index = event.index,
                    root = %hex::encode(event.root),
                    "leaf inserted"
                );
                for e in pending {
                    sink.emit(e);
                }
                Ok(event)
            }
            Err(e) => {
                warn!(record = %id, leaf = %hex::encode(leaf), error = %e, "insert rejected");
                Err(e)
            }
        }
    }

    /// Verify an inclusion proof against the record's current root.
    pub fn verify_proof(
        &self,
        id: &RecordId,
        leaf: &Leaf,
        proof: &[Leaf],
        path: &[bool],
    ) -> Result<()> {
        let account = self.account(id)?;
        let result = anchor::verify_proof(&account, leaf, proof, path);
        debug!(record = %id, leaf = %hex::encode(leaf), valid = result.is_ok(), "proof checked");
        result
    }

    /// Verify a proof produced by [`AnchorService::prove`].
    pub fn verify(&self, id: &RecordId, proof: &MerkleProof) -> Result<()> {
        self.verify_proof(id, proof.leaf(), proof.siblings(), proof.path())
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn prove(&self, id: &RecordId, index: usize) -> Result<MerkleProof> {
        self.account(id)?.state()?.prove(index)
    }

    /// Decoded snapshot of the record's state.
    pub fn state(&self, id: &RecordId) -> Result<MerkleAnchorState> {
        match self.account(id)? {
            AnchorAccount::Active(state) => Ok(state),
            AnchorAccount::Uninitialized => Err(AnchorError::NotInitialized),
        }
    }

    fn lock_sink(&self) -> MutexGuard<'_, E> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the record for `authority` unless it already exists.
    fn allocate(&self, id: RecordId, authority: Address) -> Result<()> {
        match self.store.load(&id) {
            Ok(_) => return Ok(()),
            Err(AnchorError::RecordNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        // A fresh record is owned by `authority` itself.
        self.check_signer(&authority, &authority)?;
        match self.store.create(id, authority, Vec::new()) {
            Ok(()) | Err(AnchorError::RecordExists { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn account(&self, id: &RecordId) -> Result<AnchorAccount> {
        let record = self.store.load(id)?;
        AnchorAccount::from_bytes(&record.data)
    }

    fn check_signer(&self, authority: &Address, signer: &Address) -> Result<()> {
        if self.authorizer.authorize(authority, signer) {
            Ok(())
        } else {
            Err(AnchorError::Unauthorized {
                signer: signer.to_string(),
            })
        }
    }
}
