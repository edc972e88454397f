use axum::{
    Json,
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod token;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::Principal;
use error::ApiError;
use routes::{authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point.
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use token::TokenService;

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application from the `#[utoipa::path]` and `ToSchema` annotations.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login_admin, handlers::login_user, handlers::register, handlers::hello,
        handlers::list_customers, handlers::get_customer, handlers::create_customer,
        handlers::update_customer, handlers::delete_customer,
        handlers::list_orders, handlers::get_order, handlers::create_order,
        handlers::update_order, handlers::delete_order,
        handlers::list_notes, handlers::get_note, handlers::create_note,
        handlers::update_note, handlers::delete_note,
        handlers::list_products, handlers::get_product, handlers::create_product,
        handlers::update_product, handlers::delete_product,
    ),
    components(
        schemas(
            models::AdminLoginRequest, models::UserLoginRequest, models::RegisterRequest,
            models::TokenResponse, models::UserResponse,
            models::CustomerRequest, models::CustomerResponse,
            models::OrderRequest, models::OrderResponse,
            models::OrderNoteRequest, models::OrderNoteResponse,
            models::ProductRequest, models::ProductResponse,
            error::ErrorEnvelope,
        )
    ),
    tags(
        (name = "order-portal", description = "Order Management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all essential
/// application services and configuration, shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: credential store, ownership resolvers, resource CRUD.
    pub repo: RepositoryState,
    /// Token service: issues and verifies signed bearer tokens.
    pub tokens: TokenService,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull individual components out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated route group. Extracting
/// `Principal` runs the full resolution (scheme check, signature + expiry,
/// live credential-store lookup); failure rejects with 401 before any
/// handler executes. Resolution is repeated on every request, so
/// deactivating a key or user takes effect immediately.
async fn auth_middleware(_principal: Principal, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// error_boundary
///
/// The single translator from `ApiError` to the standard error envelope.
/// `ApiError::into_response` stashes the error in the response extensions;
/// this middleware re-renders the body with the request path filled in.
/// 401 responses keep their compact `{"message": ...}` shape.
async fn error_boundary(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    match response.extensions().get::<ApiError>() {
        Some(err) if !matches!(err, ApiError::Unauthorized) => {
            let err = err.clone();
            (err.status(), Json(err.envelope(&path))).into_response()
        }
        _ => response,
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied (login/registration must be
        // reachable without a prior credential).
        .merge(public::public_routes())
        // Authenticated routes: protected by the token filter.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    // 3. Error envelope, observability, and correlation layers
    base_router
        .layer(middleware::from_fn(error_boundary))
        .layer(
            ServiceBuilder::new()
                // Request ID generation for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request tracing spanning the whole request/response lifecycle.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Return the generated x-request-id header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the tracing span per request: includes the `x-request-id`
/// header (if present) alongside the HTTP method and URI so every log line
/// for one request correlates by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
