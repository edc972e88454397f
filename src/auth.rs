use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    error::ApiError,
    repository::RepositoryState,
    token::{ROLE_ADMIN, ROLE_USER, TokenService},
};

/// Literal scheme prefix required on the Authorization header, matched
/// case-sensitively. At least one space must follow the keyword; any extra
/// run of whitespace around the token is tolerated.
const BEARER_PREFIX: &str = "Bearer ";

/// Role
///
/// Closed two-variant role of a resolved principal. Kept as a tagged type so
/// the admin bypass lives in one place instead of string comparisons
/// scattered through the resource services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// Principal
///
/// The resolved identity of an authenticated request: role plus subject
/// (admin-key value or username). Ephemeral, derived per request, never
/// persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub role: Role,
    pub subject: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// authorize
///
/// The single ownership decision point consumed by every resource operation.
///
/// Admin always passes. Otherwise every required owner must be present and
/// equal to the principal's subject. The slice has one entry for
/// create/read/delete and two for update-with-reparenting (owner of the
/// existing resource and owner of the update's target) — both must match
/// even when they coincide.
pub fn authorize(
    principal: &Principal,
    required_owners: &[Option<&str>],
    denied: &str,
) -> Result<(), ApiError> {
    if principal.is_admin() {
        return Ok(());
    }
    let subject = principal.subject.as_str();
    if required_owners.iter().all(|owner| *owner == Some(subject)) {
        Ok(())
    } else {
        Err(ApiError::forbidden(denied))
    }
}

/// Principal Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making Principal usable as a
/// function argument in any authenticated handler and as the guard inside
/// the auth middleware.
///
/// The resolution steps:
/// 1. Extract the bearer token from the Authorization header.
/// 2. Verify signature and expiry through the TokenService.
/// 3. Re-check the subject against the credential store's live active flags,
///    so deactivating a key or user revokes access immediately, unexpired
///    tokens included.
///
/// Rejection: 401 with the generic `{"message": "invalid token"}` body on
/// any failure. The login and registration routes never pass through this
/// extractor.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        // 1. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        // 2. Signature and expiry
        let claims = tokens.verify(token)?;
        let subject = claims.sub.trim();
        if subject.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        // 3. Live credential-store check, on every request (no caching).
        match claims.role.as_str() {
            ROLE_ADMIN => {
                repo.find_active_admin_key(subject)
                    .await?
                    .ok_or(ApiError::Unauthorized)?;
                Ok(Principal {
                    role: Role::Admin,
                    subject: subject.to_string(),
                })
            }
            ROLE_USER => {
                repo.find_active_user(subject)
                    .await?
                    .ok_or(ApiError::Unauthorized)?;
                Ok(Principal {
                    role: Role::User,
                    subject: subject.to_string(),
                })
            }
            // Unknown or missing role claim.
            _ => Err(ApiError::Unauthorized),
        }
    }
}
