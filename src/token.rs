use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Role claim value for administrator tokens.
pub const ROLE_ADMIN: &str = "admin";
/// Role claim value for end-user tokens.
pub const ROLE_USER: &str = "user";

/// Claims
///
/// The signed payload carried by every bearer token. `sub` is either an
/// admin-key value or a username, disambiguated by `role`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: admin-key value or username.
    pub sub: String,
    /// Role claim: "admin" or "user".
    pub role: String,
    /// Issued At timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp. Tokens past this instant must not be accepted.
    pub exp: usize,
}

/// TokenService
///
/// Single source of truth for token signature and expiry. The HS256 key and
/// algorithm are fixed for the process lifetime; rotating the secret
/// invalidates all outstanding tokens, which is acceptable because tokens
/// are short-lived.
///
/// Verification here is purely cryptographic/temporal. Checking the subject
/// against the credential store's live active flags is the principal
/// resolver's job.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, exp_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::minutes(exp_minutes),
        }
    }

    /// Signs a token for an administrator key.
    pub fn issue_for_admin_key(&self, key_value: &str) -> Result<String, ApiError> {
        self.issue(key_value, ROLE_ADMIN, Utc::now())
    }

    /// Signs a token for a registered user.
    pub fn issue_for_user(&self, username: &str) -> Result<String, ApiError> {
        self.issue(username, ROLE_USER, Utc::now())
    }

    /// Embeds subject and role, stamps iat/exp relative to `now`, and signs.
    pub fn issue(
        &self,
        subject: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.expiry).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))
    }

    /// Pure signature and expiry check; does not consult the credential store.
    ///
    /// Every failure mode (bad signature, malformed token, expired) collapses
    /// into the same `Unauthorized` so callers cannot probe which one it was.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized)
    }
}
