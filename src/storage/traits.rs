//! Abstract storage interface for credential records
//!
//! The credential service only reads records and requests targeted updates;
//! any relational or in-memory backend can sit behind this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// Stored credential of an admin account
#[derive(Clone, Serialize)]
pub struct CredentialRecord {
    pub id: String,
    /// Unique login name
    pub identity: String,
    /// Argon2 PHC string, salt and parameters embedded
    #[serde(skip_serializing)]
    pub secret_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("secret_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Credential persistence interface
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get a record by its identity
    async fn find_credential_by_identity(&self, identity: &str) -> Result<Option<CredentialRecord>>;

    /// Create a new record; fails with `DuplicateIdentity` if the identity exists
    async fn create_credential(&self, identity: &str, secret_hash: String) -> Result<CredentialRecord>;

    /// Replace the stored hash of an existing record, but only while it still equals
    /// `expected_hash`; otherwise fails with `InvalidCredential` and changes nothing
    async fn update_credential_secret(
        &self,
        identity: &str,
        expected_hash: &str,
        new_hash: String,
    ) -> Result<()>;

    /// Rename a record; fails with `DuplicateIdentity` if `new_identity` belongs to another record
    async fn update_credential_identity(&self, old_identity: &str, new_identity: &str) -> Result<()>;

    /// Health check for the storage backend
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
