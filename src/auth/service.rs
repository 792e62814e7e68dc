//! Credential verification, access token issuance and account changes
//!
//! The service owns no mutable state: it holds the signing key, a hasher and
//! a handle to the credential store. Argon2 work runs on the blocking pool so
//! a login never stalls the async workers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::password::SecretHasher;
use crate::auth::token::TokenManager;
use crate::auth::user::User;
use crate::config::ServiceConfig;
use crate::constants::{DEFAULT_TOKEN_TTL_MINUTES, MIN_IDENTITY_LENGTH, MIN_SECRET_LENGTH, TOKEN_TYPE};
use crate::error::{AuthError, Result};
use crate::security_logger::{SecurityEvent, SecurityLogger};
use crate::storage::{CredentialRecord, CredentialStore};

/// Successful login response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: String) -> Self {
        Self {
            access_token: token,
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Credential & token service
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<SecretHasher>,
    tokens: TokenManager,
    security_logger: Arc<SecurityLogger>,
    token_ttl: Duration,
}

impl CredentialService {
    /// Create a service around an existing store, token manager and hasher
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenManager, hasher: SecretHasher) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            tokens,
            security_logger: Arc::new(SecurityLogger::default()),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_MINUTES * 60),
        }
    }

    /// Build the service from configuration with the default Argon2 cost
    pub fn from_config(config: &ServiceConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let service = Self::new(store, TokenManager::new(&config.jwt_secret), SecretHasher::new()?)
            .with_token_ttl(config.token_ttl)
            .with_security_logger(Arc::new(SecurityLogger::new(config.development_mode)));
        Ok(service)
    }

    /// Override the default 24h token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_security_logger(mut self, logger: Arc<SecurityLogger>) -> Self {
        self.security_logger = logger;
        self
    }

    pub fn security_logger(&self) -> Arc<SecurityLogger> {
        self.security_logger.clone()
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    async fn hash_secret(&self, secret: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&secret)).await?
    }

    /// Look up the record and check the secret. Unknown identities still pay one derivation.
    async fn verify_record(&self, identity: &str, candidate: &str) -> Result<Option<CredentialRecord>> {
        let record = self.store.find_credential_by_identity(identity).await?;
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();

        tokio::task::spawn_blocking(move || match record {
            Some(record) if hasher.verify(&candidate, &record.secret_hash) => Some(record),
            Some(_) => None,
            None => {
                hasher.verify_dummy(&candidate);
                None
            }
        })
        .await
        .map_err(AuthError::from)
    }

    /// True only when `identity` exists and `candidate` matches its stored hash
    pub async fn verify(&self, identity: &str, candidate: &str) -> Result<bool> {
        Ok(self.verify_record(identity, candidate).await?.is_some())
    }

    /// Issue a signed token for an already verified identity; `None` uses the configured ttl
    pub fn issue(&self, identity: &str, ttl: Option<Duration>) -> Result<String> {
        self.tokens.issue(identity, ttl.unwrap_or(self.token_ttl))
    }

    /// Verify credentials and hand out a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        match self.verify_record(username, password).await? {
            Some(record) => {
                let token = self.issue(&record.identity, None)?;
                self.security_logger
                    .log_event(SecurityEvent::LoginSucceeded { identity: record.identity })
                    .await;
                Ok(AccessToken::bearer(token))
            }
            None => {
                self.security_logger
                    .log_event(SecurityEvent::LoginFailed { identity: username.to_string() })
                    .await;
                Err(AuthError::InvalidCredential)
            }
        }
    }

    /// Resolve a bearer token to the account it was issued for
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let result = self.resolve_token(token).await;
        if let Err(ref e) = result {
            if e.is_token_failure() {
                self.security_logger
                    .log_event(SecurityEvent::TokenRejected { reason: e.to_string() })
                    .await;
            }
        }
        result
    }

    async fn resolve_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.validate_token(token)?;
        let subject = claims.sub.ok_or(AuthError::MissingSubject)?;

        match self.store.find_credential_by_identity(&subject).await? {
            Some(record) => Ok(User::from(record)),
            None => Err(AuthError::UnknownIdentity),
        }
    }

    /// Replace the secret of `current_identity` after re-checking the old one
    pub async fn change_secret(&self, current_identity: &str, old_secret: &str, new_secret: &str) -> Result<()> {
        let result = self.try_change_secret(current_identity, old_secret, new_secret).await;
        match &result {
            Ok(()) => {
                self.security_logger
                    .log_event(SecurityEvent::SecretChanged { identity: current_identity.to_string() })
                    .await;
            }
            Err(e) => {
                self.security_logger
                    .log_event(SecurityEvent::ChangeRejected {
                        identity: current_identity.to_string(),
                        operation: "Password change".to_string(),
                        reason: e.to_string(),
                    })
                    .await;
            }
        }
        result
    }

    async fn try_change_secret(&self, current_identity: &str, old_secret: &str, new_secret: &str) -> Result<()> {
        let record = self
            .verify_record(current_identity, old_secret)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        if new_secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(AuthError::PolicyViolation(format!(
                "Password must be at least {} characters long",
                MIN_SECRET_LENGTH
            )));
        }

        let new_hash = self.hash_secret(new_secret).await?;
        self.store
            .update_credential_secret(current_identity, &record.secret_hash, new_hash)
            .await
    }

    /// Rename `current_identity` after confirming its secret
    pub async fn change_identity(&self, current_identity: &str, new_identity: &str, confirm_secret: &str) -> Result<()> {
        let result = self.try_change_identity(current_identity, new_identity, confirm_secret).await;
        match &result {
            Ok(()) => {
                self.security_logger
                    .log_event(SecurityEvent::IdentityChanged {
                        old_identity: current_identity.to_string(),
                        new_identity: new_identity.to_string(),
                    })
                    .await;
            }
            Err(e) => {
                self.security_logger
                    .log_event(SecurityEvent::ChangeRejected {
                        identity: current_identity.to_string(),
                        operation: "Username change".to_string(),
                        reason: e.to_string(),
                    })
                    .await;
            }
        }
        result
    }

    async fn try_change_identity(&self, current_identity: &str, new_identity: &str, confirm_secret: &str) -> Result<()> {
        if !self.verify(current_identity, confirm_secret).await? {
            return Err(AuthError::InvalidCredential);
        }

        if new_identity.chars().count() < MIN_IDENTITY_LENGTH {
            return Err(AuthError::PolicyViolation(format!(
                "Username must be at least {} characters long",
                MIN_IDENTITY_LENGTH
            )));
        }

        if new_identity == current_identity {
            return Ok(());
        }

        if self.store.find_credential_by_identity(new_identity).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        // The store re-checks uniqueness atomically with the rename
        self.store.update_credential_identity(current_identity, new_identity).await
    }

    /// Create a new account with the same policies as the change operations
    pub async fn register(&self, identity: &str, secret: &str) -> Result<User> {
        if identity.chars().count() < MIN_IDENTITY_LENGTH {
            return Err(AuthError::PolicyViolation(format!(
                "Username must be at least {} characters long",
                MIN_IDENTITY_LENGTH
            )));
        }
        if secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(AuthError::PolicyViolation(format!(
                "Password must be at least {} characters long",
                MIN_SECRET_LENGTH
            )));
        }

        let hash = self.hash_secret(secret).await?;
        let record = self.store.create_credential(identity, hash).await?;

        self.security_logger
            .log_event(SecurityEvent::AccountCreated { identity: record.identity.clone() })
            .await;

        Ok(User::from(record))
    }

    /// True when the credential store can serve lookups
    pub async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }

    /// Create the bootstrap admin account if it does not exist yet.
    /// Returns true when an account was created.
    pub async fn ensure_account(&self, identity: &str, secret: &str) -> Result<bool> {
        if self.store.find_credential_by_identity(identity).await?.is_some() {
            log::debug!("Bootstrap account already present, leaving it untouched");
            return Ok(false);
        }

        let hash = self.hash_secret(secret).await?;
        match self.store.create_credential(identity, hash).await {
            Ok(record) => {
                self.security_logger
                    .log_event(SecurityEvent::AccountCreated { identity: record.identity })
                    .await;
                Ok(true)
            }
            // Lost a race against a concurrent creator
            Err(AuthError::DuplicateIdentity) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
