use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::CredentialRecord;

/// Represents an authenticated admin account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique account identifier
    pub id: String,
    /// Login name, the token subject
    pub username: String,
    pub is_active: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<&CredentialRecord> for User {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.identity.clone(),
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

impl From<CredentialRecord> for User {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            username: record.identity,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}
