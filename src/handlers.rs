use crate::{
    AppState,
    auth::{Principal, authorize},
    error::ApiError,
    models::{
        AdminLoginRequest, Customer, CustomerDraft, CustomerRequest, CustomerResponse, NoteDraft,
        OrderDraft, OrderNoteRequest, OrderNoteResponse, OrderRequest, OrderResponse, Product,
        ProductDraft, ProductRequest, ProductResponse, RegisterRequest, TokenResponse,
        UserLoginRequest, UserResponse,
    },
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// NoteFilter
///
/// Accepted query parameters for the note listing endpoint
/// (GET /api/order-notes?orderUid=...).
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NoteFilter {
    /// Optional filter restricting the listing to a single order.
    pub order_uid: Option<String>,
}

// --- Validation Helpers ---
//
// Required fields arrive as Option so their absence maps to 400 here,
// before any lookup or side effect.

fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("{field} must not be blank"))),
    }
}

/// Format check on an opaque identifier. Runs before existence, which runs
/// before ownership.
fn parse_uid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid uid: {raw}")))
}

fn validate_customer(req: CustomerRequest) -> Result<CustomerDraft, ApiError> {
    Ok(CustomerDraft {
        name: require(req.name, "name")?,
        contact_method: req.contact_method,
    })
}

fn validate_order(req: OrderRequest) -> Result<OrderDraft, ApiError> {
    Ok(OrderDraft {
        summary: require(req.summary, "summary")?,
        product_name: require(req.product_name, "productName")?,
        customer_uid: parse_uid(&require(req.customer_uid, "customerUid")?)?,
        order_time: req.order_time.unwrap_or_else(Utc::now),
    })
}

fn validate_note(req: OrderNoteRequest) -> Result<NoteDraft, ApiError> {
    let order_uid = parse_uid(&require(req.order_uid, "orderUid")?)?;
    let message = require(req.message, "message")?;
    if message.len() > 1024 {
        return Err(ApiError::bad_request("message must not exceed 1024 characters"));
    }
    Ok(NoteDraft { order_uid, message })
}

fn validate_product(req: ProductRequest) -> Result<ProductDraft, ApiError> {
    let name = require(req.name, "name")?;
    if name.len() > 128 {
        return Err(ApiError::bad_request("name must not exceed 128 characters"));
    }
    if let Some(desc) = &req.description {
        if desc.len() > 2048 {
            return Err(ApiError::bad_request("description must not exceed 2048 characters"));
        }
    }
    let unit_price = req
        .unit_price
        .ok_or_else(|| ApiError::bad_request("unitPrice must not be blank"))?;
    if unit_price.is_sign_negative() {
        return Err(ApiError::bad_request("unitPrice must not be negative"));
    }
    if unit_price.scale() > 2 {
        return Err(ApiError::bad_request("unitPrice allows at most 2 decimal places"));
    }
    Ok(ProductDraft {
        name,
        description: req.description,
        unit_price,
        active: req.active,
    })
}

/// Ownership constraint threaded into mutating queries: admins write
/// unconstrained, users only through rows they own.
fn owner_constraint(principal: &Principal) -> Option<&str> {
    if principal.is_admin() {
        None
    } else {
        Some(principal.subject.as_str())
    }
}

// --- Password Hashing ---

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::internal("password hashing failed"))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// --- Auth Handlers ---

/// login_admin
///
/// [Public Route] Exchanges a valid, active admin key for a bearer token.
/// A missing or unknown key is 401, not 400: the endpoint gives no hint
/// whether the key exists.
#[utoipa::path(
    post,
    path = "/api/login/admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Unknown or inactive key")
    )
)]
pub async fn login_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let key = payload
        .admin_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    state
        .repo
        .find_active_admin_key(key)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let token = state.tokens.issue_for_admin_key(key)?;
    Ok(Json(TokenResponse { token }))
}

/// login_user
///
/// [Public Route] Verifies username/password against the stored hash and
/// issues a user token. Inactive accounts fail exactly like wrong passwords.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = UserLoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<UserLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = require(payload.username, "username")?;
    let password = require(payload.password, "password")?;

    let user = state
        .repo
        .find_active_user(username.trim())
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = state.tokens.issue_for_user(&user.username)?;
    Ok(Json(TokenResponse { token }))
}

/// register
///
/// [Public Route] Creates a new account plus its linked customer record in
/// one transaction. Duplicate usernames are a deterministic 409.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = require(payload.username, "username")?;
    let username = username.trim();
    let password = require(payload.password, "password")?;

    if state.repo.username_exists(username).await? {
        return Err(ApiError::conflict("username already taken"));
    }

    let hash = hash_password(&password)?;
    let user = state.repo.create_user_with_customer(username, &hash).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// hello
///
/// [Authenticated Route] Smoke-test greeting.
#[utoipa::path(
    get,
    path = "/api/hello",
    responses((status = 200, description = "Greeting"))
)]
pub async fn hello(_principal: Principal) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello, World!" }))
}

// --- Customer Handlers ---
//
// Customers are admin-managed: writes route every non-admin into Forbidden
// through the central engine (no owner can ever satisfy `None`). Reads are
// owner-scoped like everything else.

/// list_customers
///
/// [Authenticated Route] Admin sees every customer; a user sees only the
/// customers linked to their own account.
#[utoipa::path(
    get,
    path = "/api/customers",
    responses((status = 200, description = "Customers", body = [CustomerResponse]))
)]
pub async fn list_customers(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.repo.list_customers(owner_constraint(&principal)).await?;
    Ok(Json(customers))
}

/// get_customer
#[utoipa::path(
    get,
    path = "/api/customers/{uid}",
    params(("uid" = String, Path, description = "Customer UID")),
    responses(
        (status = 200, description = "Found", body = CustomerResponse),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_customer(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let customer: Customer = state
        .repo
        .get_customer(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("customer not found: {uid}")))?;
    authorize(
        &principal,
        &[customer.owner_username.as_deref()],
        "no access to this customer",
    )?;
    Ok(Json(customer.into()))
}

/// create_customer
///
/// [Admin-only] Creates a customer with no linked account (owner stays null).
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Created", body = CustomerResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_customer(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    authorize(&principal, &[None], "customers are admin-managed")?;
    let draft = validate_customer(payload)?;
    let customer = state.repo.create_customer(draft).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// update_customer
#[utoipa::path(
    put,
    path = "/api/customers/{uid}",
    params(("uid" = String, Path, description = "Customer UID")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Updated", body = CustomerResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_customer(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(payload): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    authorize(&principal, &[None], "customers are admin-managed")?;
    let uid = parse_uid(&uid)?;
    let draft = validate_customer(payload)?;
    let customer = state
        .repo
        .update_customer(uid, draft)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("customer not found: {uid}")))?;
    Ok(Json(customer.into()))
}

/// delete_customer
#[utoipa::path(
    delete,
    path = "/api/customers/{uid}",
    params(("uid" = String, Path, description = "Customer UID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_customer(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&principal, &[None], "customers are admin-managed")?;
    let uid = parse_uid(&uid)?;
    if state.repo.delete_customer(uid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("customer not found: {uid}")))
    }
}

// --- Order Handlers ---

/// list_orders
///
/// [Authenticated Route] Admin sees all orders; a user sees only orders of
/// customers they own.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses((status = 200, description = "Orders", body = [OrderResponse]))
)]
pub async fn list_orders(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.repo.list_orders(owner_constraint(&principal)).await?;
    Ok(Json(orders))
}

/// create_order
///
/// [Authenticated Route] Creates an order under the given customer. A user
/// may only do so for their own customer.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Created", body = OrderResponse),
        (status = 403, description = "Foreign customer"),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn create_order(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let draft = validate_order(payload)?;
    let customer_uid = draft.customer_uid;

    let target = state
        .repo
        .customer_owner(customer_uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("customer not found: {customer_uid}")))?;
    authorize(
        &principal,
        &[target.owner_username.as_deref()],
        "orders may only be created for your own customers",
    )?;

    let order = state.repo.create_order(draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// get_order
#[utoipa::path(
    get,
    path = "/api/orders/{uid}",
    params(("uid" = String, Path, description = "Order UID")),
    responses(
        (status = 200, description = "Found", body = OrderResponse),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_order(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let owner = state
        .repo
        .order_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {uid}")))?;
    authorize(
        &principal,
        &[owner.owner_username.as_deref()],
        "no access to this order",
    )?;
    let order = state
        .repo
        .get_order_response(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {uid}")))?;
    Ok(Json(order))
}

/// update_order
///
/// [Authenticated Route] Full replace; moving the order to another customer
/// re-evaluates ownership of both the current and the target customer. The
/// repository re-checks both inside the UPDATE itself.
#[utoipa::path(
    put,
    path = "/api/orders/{uid}",
    params(("uid" = String, Path, description = "Order UID")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Updated", body = OrderResponse),
        (status = 403, description = "Not owner of order or target customer"),
        (status = 404, description = "Order or customer not found")
    )
)]
pub async fn update_order(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(payload): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let draft = validate_order(payload)?;
    let customer_uid = draft.customer_uid;

    let existing = state
        .repo
        .order_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {uid}")))?;
    let target = state
        .repo
        .customer_owner(customer_uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("customer not found: {customer_uid}")))?;
    authorize(
        &principal,
        &[
            existing.owner_username.as_deref(),
            target.owner_username.as_deref(),
        ],
        "orders may only be modified by their owner",
    )?;

    let order = state
        .repo
        .update_order(uid, draft, owner_constraint(&principal))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {uid}")))?;
    Ok(Json(order))
}

/// delete_order
#[utoipa::path(
    delete,
    path = "/api/orders/{uid}",
    params(("uid" = String, Path, description = "Order UID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_order(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uid = parse_uid(&uid)?;
    let owner = state
        .repo
        .order_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {uid}")))?;
    authorize(
        &principal,
        &[owner.owner_username.as_deref()],
        "orders may only be deleted by their owner",
    )?;
    if state
        .repo
        .delete_order(uid, owner_constraint(&principal))
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("order not found: {uid}")))
    }
}

// --- Order Note Handlers ---

/// list_notes
///
/// [Authenticated Route] Without a filter, admin sees every note and a user
/// sees the notes of their own orders. With an `orderUid` filter, a user
/// must own that order.
#[utoipa::path(
    get,
    path = "/api/order-notes",
    params(NoteFilter),
    responses(
        (status = 200, description = "Notes", body = [OrderNoteResponse]),
        (status = 403, description = "Filtered order not owned")
    )
)]
pub async fn list_notes(
    principal: Principal,
    State(state): State<AppState>,
    Query(filter): Query<NoteFilter>,
) -> Result<Json<Vec<OrderNoteResponse>>, ApiError> {
    let raw = filter.order_uid.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let notes = match raw {
        None => state.repo.list_notes(owner_constraint(&principal)).await?,
        Some(raw) => {
            let order_uid = parse_uid(raw)?;
            if !principal.is_admin() {
                let owner = state
                    .repo
                    .order_owner(order_uid)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("order not found: {order_uid}")))?;
                authorize(
                    &principal,
                    &[owner.owner_username.as_deref()],
                    "no access to this order's notes",
                )?;
            }
            state.repo.list_notes_for_order(order_uid).await?
        }
    };
    Ok(Json(notes))
}

/// create_note
#[utoipa::path(
    post,
    path = "/api/order-notes",
    request_body = OrderNoteRequest,
    responses(
        (status = 201, description = "Created", body = OrderNoteResponse),
        (status = 403, description = "Foreign order"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn create_note(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<OrderNoteRequest>,
) -> Result<(StatusCode, Json<OrderNoteResponse>), ApiError> {
    let draft = validate_note(payload)?;
    let order_uid = draft.order_uid;

    let owner = state
        .repo
        .order_owner(order_uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {order_uid}")))?;
    authorize(
        &principal,
        &[owner.owner_username.as_deref()],
        "notes may only be added to your own orders",
    )?;

    let note = state.repo.create_note(draft).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// get_note
#[utoipa::path(
    get,
    path = "/api/order-notes/{uid}",
    params(("uid" = String, Path, description = "Note UID")),
    responses(
        (status = 200, description = "Found", body = OrderNoteResponse),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_note(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<OrderNoteResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let owner = state
        .repo
        .note_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("note not found: {uid}")))?;
    authorize(
        &principal,
        &[owner.owner_username.as_deref()],
        "no access to this note",
    )?;
    let note = state
        .repo
        .get_note_response(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("note not found: {uid}")))?;
    Ok(Json(note))
}

/// update_note
///
/// [Authenticated Route] Full replace; reparenting the note onto another
/// order re-evaluates ownership of both the current and the target order,
/// and the repository re-checks both inside the UPDATE.
#[utoipa::path(
    put,
    path = "/api/order-notes/{uid}",
    params(("uid" = String, Path, description = "Note UID")),
    request_body = OrderNoteRequest,
    responses(
        (status = 200, description = "Updated", body = OrderNoteResponse),
        (status = 403, description = "Not owner of note's order or target order"),
        (status = 404, description = "Note or order not found")
    )
)]
pub async fn update_note(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(payload): Json<OrderNoteRequest>,
) -> Result<Json<OrderNoteResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let draft = validate_note(payload)?;
    let order_uid = draft.order_uid;

    let existing = state
        .repo
        .note_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("note not found: {uid}")))?;
    let target = state
        .repo
        .order_owner(order_uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order not found: {order_uid}")))?;
    authorize(
        &principal,
        &[
            existing.owner_username.as_deref(),
            target.owner_username.as_deref(),
        ],
        "notes may only be modified by the owner of their order",
    )?;

    let note = state
        .repo
        .update_note(uid, draft, owner_constraint(&principal))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("note not found: {uid}")))?;
    Ok(Json(note))
}

/// delete_note
#[utoipa::path(
    delete,
    path = "/api/order-notes/{uid}",
    params(("uid" = String, Path, description = "Note UID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_note(
    principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uid = parse_uid(&uid)?;
    let owner = state
        .repo
        .note_owner(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("note not found: {uid}")))?;
    authorize(
        &principal,
        &[owner.owner_username.as_deref()],
        "notes may only be deleted by the owner of their order",
    )?;
    if state
        .repo
        .delete_note(uid, owner_constraint(&principal))
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("note not found: {uid}")))
    }
}

// --- Product Handlers ---
//
// Products have no ownership dimension; any authenticated principal may
// manage the catalog.

/// list_products
#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "Products", body = [ProductResponse]))
)]
pub async fn list_products(
    _principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.repo.list_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// get_product
#[utoipa::path(
    get,
    path = "/api/products/{uid}",
    params(("uid" = String, Path, description = "Product UID")),
    responses(
        (status = 200, description = "Found", body = ProductResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_product(
    _principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let product: Product = state
        .repo
        .get_product(uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("product not found: {uid}")))?;
    Ok(Json(product.into()))
}

/// create_product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 400, description = "Invalid fields")
    )
)]
pub async fn create_product(
    _principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let draft = validate_product(payload)?;
    let product = state.repo.create_product(draft).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// update_product
#[utoipa::path(
    put,
    path = "/api/products/{uid}",
    params(("uid" = String, Path, description = "Product UID")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_product(
    _principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let uid = parse_uid(&uid)?;
    let draft = validate_product(payload)?;
    let product = state
        .repo
        .update_product(uid, draft)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("product not found: {uid}")))?;
    Ok(Json(product.into()))
}

/// delete_product
#[utoipa::path(
    delete,
    path = "/api/products/{uid}",
    params(("uid" = String, Path, description = "Product UID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_product(
    _principal: Principal,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uid = parse_uid(&uid)?;
    if state.repo.delete_product(uid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("product not found: {uid}")))
    }
}
