// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

// Token lifetime and wire format
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 24 * 60;
pub const TOKEN_TYPE: &str = "bearer";
pub const MAX_TOKEN_LENGTH: usize = 2048;

// Credential policy
pub const MIN_SECRET_LENGTH: usize = 4;
pub const MIN_IDENTITY_LENGTH: usize = 3;
pub const MIN_SIGNING_KEY_LENGTH: usize = 32;

// Bootstrap admin account
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

// Minimum wall time of a login response
pub const DEFAULT_AUTH_MIN_DURATION_MS: u64 = 100;
