//! Authentication: secret hashing, access tokens and the credential service

pub mod password;
pub mod service;
pub mod token;
pub mod user;

// Re-export main components
pub use password::SecretHasher;
pub use service::{AccessToken, CredentialService};
pub use token::{extract_bearer_token, Claims, TokenManager};
pub use user::User;
