use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints that must be reachable without a prior credential:
/// the liveness probe and the entry points that hand out credentials in the
/// first place. Everything else in the API sits behind the token filter.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login/admin
        // Exchanges a seeded admin key for a bearer token.
        .route("/api/login/admin", post(handlers::login_admin))
        // POST /api/login
        // Exchanges username/password for a bearer token.
        .route("/api/login", post(handlers::login_user))
        // POST /api/register
        // Creates an account together with its linked customer.
        .route("/api/register", post(handlers::register))
}
