use crate::{error::ApiError, repository::RepositoryState};

/// Admin keys materialized into the credential store at startup. They are
/// never created through the API; only their `active` flag changes later.
pub const DEFAULT_ADMIN_KEYS: [&str; 3] = [
    "ADMIN-KEY-1-20251230",
    "ADMIN-KEY-2-20251230",
    "ADMIN-KEY-3-20251230",
];

/// seed_admin_keys
///
/// Idempotent upsert of the default admin keys, run once during process
/// initialization. Repeated startups do not duplicate rows.
pub async fn seed_admin_keys(repo: &RepositoryState) -> Result<(), ApiError> {
    for key in DEFAULT_ADMIN_KEYS {
        repo.seed_admin_key(key).await?;
    }
    tracing::info!("admin keys initialized: {:?}", DEFAULT_ADMIN_KEYS);
    Ok(())
}
