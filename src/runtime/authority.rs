//! Authorization checks run before any mutating anchor operation.

use crate::types::Address;

/// Decides whether `signer` may mutate a record owned by `authority`.
pub trait Authorizer {
    fn authorize(&self, authority: &Address, signer: &Address) -> bool;
}

/// Only the record's authority may mutate it.
#[derive(Copy, Clone, Debug, Default)]
pub struct AuthorityOnly;

impl Authorizer for AuthorityOnly {
    fn authorize(&self, authority: &Address, signer: &Address) -> bool {
        authority == signer
    }
}

/// Any signer may mutate any record.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _authority: &Address, _signer: &Address) -> bool {
        true
    }
}
