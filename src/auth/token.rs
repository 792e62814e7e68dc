use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::constants::MAX_TOKEN_LENGTH;
use crate::error::{AuthError, Result};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account identity). Optional so a missing subject is reported as such.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time (as UTC timestamp)
    pub exp: u64,
    /// Issued at (as UTC timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Token identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Creates claims for an identity issued at `now` and valid for `ttl`
    pub fn new(identity: &str, now: u64, ttl: Duration) -> Self {
        Self {
            sub: Some(identity.to_string()),
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    /// Expired once `now` strictly exceeds `exp`
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.exp
    }
}

/// Current UTC time as a unix timestamp
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Signs and verifies HS256 access tokens with one process-wide key
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenManager {
    /// Creates a new token manager with a secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_token_at` after the signature, with no leeway
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Generates a JWT token for the given claims
    pub fn generate_token(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Issues a token for `identity` valid for `ttl` from now
    pub fn issue(&self, identity: &str, ttl: Duration) -> Result<String> {
        self.generate_token(&Claims::new(identity, unix_now(), ttl))
    }

    /// Validates signature, expiry and subject against the current time
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.validate_token_at(token, unix_now())
    }

    /// Validates a token as of the unix timestamp `now`.
    /// No claim is read before the signature has been verified.
    pub fn validate_token_at(&self, token: &str, now: u64) -> Result<Claims> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::MalformedToken("token too long".to_string()));
        }
        if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(AuthError::MalformedToken("token contains invalid characters".to_string()));
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }

        match claims.sub.as_deref() {
            Some(sub) if !sub.is_empty() => Ok(claims),
            _ => Err(AuthError::MissingSubject),
        }
    }
}

/// Extracts bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "unit-test-signing-key-with-enough-length-0123";

    #[test]
    fn test_claims_expiry_is_strict() {
        let claims = Claims::new("admin", 1_000, Duration::from_secs(0));
        assert_eq!(claims.exp, 1_000);
        assert!(!claims.is_expired_at(1_000));
        assert!(claims.is_expired_at(1_001));
    }

    #[test]
    fn test_each_token_gets_an_identifier() {
        let a = Claims::new("admin", 0, Duration::from_secs(60));
        let b = Claims::new("admin", 0, Duration::from_secs(60));
        assert!(a.jti.is_some());
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_issue_and_validate() {
        let manager = TokenManager::new(KEY);
        let token = manager.issue("admin", Duration::from_secs(3600)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("admin"));
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_expiry_checked_against_supplied_time() {
        let manager = TokenManager::new(KEY);
        let token = manager
            .generate_token(&Claims::new("admin", 5_000, Duration::from_secs(10)))
            .unwrap();

        assert!(manager.validate_token_at(&token, 5_010).is_ok());
        assert!(matches!(
            manager.validate_token_at(&token, 5_011),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_missing_subject() {
        let manager = TokenManager::new(KEY);
        let mut claims = Claims::new("admin", unix_now(), Duration::from_secs(60));
        claims.sub = None;
        let token = manager.generate_token(&claims).unwrap();

        assert!(matches!(
            manager.validate_token(&token),
            Err(AuthError::MissingSubject)
        ));

        claims.sub = Some(String::new());
        let token = manager.generate_token(&claims).unwrap();
        assert!(matches!(
            manager.validate_token(&token),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_structurally_invalid_tokens() {
        let manager = TokenManager::new(KEY);

        for token in ["", "abc", "invalid.token", "a.b.c", "not a token"] {
            assert!(
                matches!(manager.validate_token(token), Err(AuthError::MalformedToken(_))),
                "expected MalformedToken for {:?}",
                token
            );
        }

        let oversized = "a".repeat(MAX_TOKEN_LENGTH + 1);
        assert!(matches!(
            manager.validate_token(&oversized),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_foreign_key_is_bad_signature() {
        let issuer = TokenManager::new("another-signing-key-with-enough-length-4567");
        let verifier = TokenManager::new(KEY);
        let token = issuer.issue("admin", Duration::from_secs(60)).unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let issuer = TokenManager::new("another-signing-key-with-enough-length-4567");
        let verifier = TokenManager::new(KEY);
        let token = issuer
            .generate_token(&Claims::new("admin", 0, Duration::from_secs(0)))
            .unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let manager = TokenManager::new(KEY);
        let claims = Claims::new("admin", unix_now(), Duration::from_secs(60));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager.validate_token(&token),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi".to_string()));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc".to_string()));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }
}
