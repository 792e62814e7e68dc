//! Portfolio Auth - credential verification and bearer tokens for the
//! admin panel of a personal portfolio site
//!
//! This library provides Argon2id credential checks, stateless HS256
//! access tokens and the warp routes that expose them.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod security;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use auth::{CredentialService, TokenManager, User};
pub use config::ServiceConfig;
pub use error::{AuthError, Result};
pub use storage::{CredentialRecord, CredentialStore, MemoryCredentialStore};
