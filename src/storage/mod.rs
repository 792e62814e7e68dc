//! Storage mechanisms for persisting and retrieving credential records

pub mod memory;
pub mod traits;

// Re-export the storage interface and the in-memory backend
pub use memory::MemoryCredentialStore;
pub use traits::{CredentialRecord, CredentialStore};
