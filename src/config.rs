//! Service configuration module
//! Loads the signing key, token lifetime and bootstrap account from the environment

use crate::constants::{
    DEFAULT_ADMIN_USERNAME, DEFAULT_AUTH_MIN_DURATION_MS, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_TOKEN_TTL_MINUTES, MIN_SIGNING_KEY_LENGTH,
};
use crate::error::{AuthError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Service configuration parameters
#[derive(Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// HS256 key for token signing/validation
    pub jwt_secret: String,
    /// Lifetime of issued access tokens
    pub token_ttl: Duration,
    /// Account created at startup when missing
    pub admin_username: String,
    pub admin_password: Option<String>,
    /// Failed logins are padded to at least this duration
    pub auth_min_duration: Duration,
    /// Development mode (identities appear in security logs)
    pub development_mode: bool,
    /// Expose the account creation endpoint
    pub allow_registration: bool,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("auth_min_duration", &self.auth_min_duration)
            .field("development_mode", &self.development_mode)
            .field("allow_registration", &self.allow_registration)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        panic!("ServiceConfig::default() is not allowed for security reasons. Use ServiceConfig::from_env() instead.");
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

impl ServiceConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            jwt_secret: "test-jwt-key-only-for-unit-tests-never-use-in-production".to_string(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_MINUTES * 60),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: Some("admin".to_string()),
            auth_min_duration: Duration::from_millis(0),
            development_mode: true,
            allow_registration: false,
        }
    }

    /// Validate that the signing key meets security requirements
    fn validate_jwt_secret(secret: &str) -> Result<()> {
        if secret.len() < MIN_SIGNING_KEY_LENGTH {
            return Err(AuthError::Config(format!(
                "JWT secret must be at least {} characters long",
                MIN_SIGNING_KEY_LENGTH
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "fixed-for-development",
            "test-jwt-key",
            "default",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(AuthError::Config(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AuthError::Config(
                "JWT secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("PORTFOLIO_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("PORTFOLIO_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let jwt_secret = env::var("PORTFOLIO_JWT_SECRET")
            .or_else(|_| env::var("SECRET_KEY"))
            .map_err(|_| {
                AuthError::Config(
                    "PORTFOLIO_JWT_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let ttl_minutes = env::var("PORTFOLIO_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);

        let admin_username = env::var("PORTFOLIO_ADMIN_USERNAME")
            .or_else(|_| env::var("ADMIN_USERNAME"))
            .unwrap_or(DEFAULT_ADMIN_USERNAME.to_string());

        let admin_password = env::var("PORTFOLIO_ADMIN_PASSWORD")
            .or_else(|_| env::var("ADMIN_PASSWORD"))
            .ok()
            .filter(|p| !p.is_empty());

        let auth_min_duration_ms = env::var("PORTFOLIO_AUTH_MIN_DURATION_MS")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(DEFAULT_AUTH_MIN_DURATION_MS);

        let development_mode = env_flag("PORTFOLIO_DEVELOPMENT_MODE");
        let allow_registration = env_flag("PORTFOLIO_ALLOW_REGISTRATION");

        Self::validate_jwt_secret(&jwt_secret)?;

        if ttl_minutes == 0 {
            return Err(AuthError::Config(
                "PORTFOLIO_TOKEN_TTL_MINUTES must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_minutes * 60),
            admin_username,
            admin_password,
            auth_min_duration: Duration::from_millis(auth_min_duration_ms),
            development_mode,
            allow_registration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "ServiceConfig::default() is not allowed for security reasons")]
    fn test_default_panics() {
        let _ = ServiceConfig::default();
    }

    #[test]
    fn test_for_testing_works_in_tests() {
        let config = ServiceConfig::for_testing();
        assert!(config.jwt_secret.contains("test"));
        assert!(config.development_mode);
        assert_eq!(config.token_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn test_testing_key_is_rejected_by_validation() {
        let config = ServiceConfig::for_testing();
        assert!(ServiceConfig::validate_jwt_secret(&config.jwt_secret).is_err());
    }

    #[test]
    fn test_validate_jwt_secret() {
        assert!(ServiceConfig::validate_jwt_secret("short").is_err());
        assert!(ServiceConfig::validate_jwt_secret(&"a".repeat(40)).is_err());
        assert!(ServiceConfig::validate_jwt_secret("your-secret-key-here-fixed-for-development").is_err());
        assert!(ServiceConfig::validate_jwt_secret("q8Jd/3kLz0x+Vn7Tb2Yw9Hc4Rm6Fp1Gs5Ua").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServiceConfig::for_testing();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(&config.jwt_secret));
        assert!(rendered.contains("<redacted>"));
    }
}
