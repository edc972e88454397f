/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules so
/// access control is applied explicitly at the module level (via Axum
/// layers) instead of per handler.

/// Routes reachable without a credential: health probe, logins, registration.
pub mod public;

/// Routes protected by the `Principal` extractor middleware.
/// Requires a valid bearer token on every request.
pub mod authenticated;
