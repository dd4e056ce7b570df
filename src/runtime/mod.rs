pub mod authority;
pub mod service;
pub mod store;

pub use authority::{AllowAll, AuthorityOnly, Authorizer};
pub use service::AnchorService;
pub use store::{AnchorStore, MemoryStore, RecordId, StoredRecord};
