use std::error::Error;
use std::fmt;

use warp::http::StatusCode;

#[derive(Debug)]
pub enum AuthError {
    // Credential errors
    InvalidCredential,
    DuplicateIdentity,
    PolicyViolation(String),

    // Token errors
    MalformedToken(String),
    BadSignature,
    Expired,
    MissingSubject,
    UnknownIdentity,

    // Infrastructure errors
    Storage(String),
    Hashing(String),
    Config(String),
    Internal(String),
}

impl AuthError {
    /// True for failures of `authenticate` that the HTTP layer turns into a bearer challenge
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::BadSignature
                | Self::Expired
                | Self::MissingSubject
                | Self::UnknownIdentity
        )
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredential | Self::DuplicateIdentity | Self::PolicyViolation(_) => {
                StatusCode::BAD_REQUEST
            }
            e if e.is_token_failure() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never reveals which token check failed;
    /// policy violations carry the rule that was broken.
    pub fn public_message(&self) -> &str {
        match self {
            Self::InvalidCredential => "Invalid credentials",
            Self::DuplicateIdentity => "This username is already taken",
            Self::PolicyViolation(rule) => rule.as_str(),
            e if e.is_token_failure() => "Could not validate credentials",
            _ => "An internal server error occurred",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "Invalid credential"),
            Self::DuplicateIdentity => write!(f, "Identity already in use"),
            Self::PolicyViolation(msg) => write!(f, "Policy violation: {}", msg),
            Self::MalformedToken(msg) => write!(f, "Malformed token: {}", msg),
            Self::BadSignature => write!(f, "Token signature verification failed"),
            Self::Expired => write!(f, "Token expired"),
            Self::MissingSubject => write!(f, "Token has no subject"),
            Self::UnknownIdentity => write!(f, "Token subject does not match any credential"),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
            Self::Hashing(msg) => write!(f, "Hashing error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error for AuthError {}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            // A foreign algorithm can never verify against our key
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidToken => AuthError::MalformedToken("invalid JWT structure".to_string()),
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::MalformedToken(format!("missing required claim '{}'", claim))
            }
            _ => AuthError::MalformedToken(format!("JWT error: {}", err)),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::Hashing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {}", err))
    }
}

// Generic result type for the credential service
pub type Result<T> = std::result::Result<T, AuthError>;
