//! In-memory credential storage for development and testing
//!
//! Every write happens under a single lock, so an update is either fully
//! applied or not applied at all.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::*;
use crate::error::{AuthError, Result};

/// In-memory credential storage keyed by identity
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    records: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_credential_by_identity(&self, identity: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(identity).cloned())
    }

    async fn create_credential(&self, identity: &str, secret_hash: String) -> Result<CredentialRecord> {
        let mut records = self.records.write().await;

        if records.contains_key(identity) {
            return Err(AuthError::DuplicateIdentity);
        }

        let record = CredentialRecord {
            id: Uuid::new_v4().to_string(),
            identity: identity.to_string(),
            secret_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        records.insert(identity.to_string(), record.clone());

        Ok(record)
    }

    async fn update_credential_secret(
        &self,
        identity: &str,
        expected_hash: &str,
        new_hash: String,
    ) -> Result<()> {
        let mut records = self.records.write().await;

        match records.get_mut(identity) {
            // Another change landed since the old secret was checked
            Some(record) if record.secret_hash != expected_hash => Err(AuthError::InvalidCredential),
            Some(record) => {
                record.secret_hash = new_hash;
                Ok(())
            }
            None => Err(AuthError::UnknownIdentity),
        }
    }

    async fn update_credential_identity(&self, old_identity: &str, new_identity: &str) -> Result<()> {
        let mut records = self.records.write().await;

        if old_identity == new_identity {
            return if records.contains_key(old_identity) {
                Ok(())
            } else {
                Err(AuthError::UnknownIdentity)
            };
        }

        // Uniqueness is re-checked under the same lock as the rename
        if records.contains_key(new_identity) {
            return Err(AuthError::DuplicateIdentity);
        }

        let mut record = records.remove(old_identity).ok_or(AuthError::UnknownIdentity)?;
        record.identity = new_identity.to_string();
        records.insert(new_identity.to_string(), record);

        Ok(())
    }
}
