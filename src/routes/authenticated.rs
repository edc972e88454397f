use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines every route that requires a resolved principal. The `Principal`
/// extractor middleware layered above this module guarantees all handlers
/// run with a validated identity; role and ownership checks then happen per
/// operation through the central authorization engine.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/hello
        // Authenticated smoke test.
        .route("/api/hello", get(handlers::hello))
        // --- Customers (reads owner-scoped, writes admin-only) ---
        .route(
            "/api/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/api/customers/{uid}",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        // --- Orders (owner-scoped through the customer link) ---
        .route(
            "/api/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route(
            "/api/orders/{uid}",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        // --- Order notes (owner-scoped through note -> order -> customer) ---
        .route(
            "/api/order-notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route(
            "/api/order-notes/{uid}",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
        // --- Products (no ownership dimension) ---
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/api/products/{uid}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}
