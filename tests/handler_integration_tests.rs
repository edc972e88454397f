use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use order_portal::{
    AppState,
    bootstrap,
    config::AppConfig,
    create_router,
    error::ApiError,
    models::{
        AdminApiKey, Customer, CustomerDraft, CustomerResponse, NoteDraft, Order, OrderDraft,
        OrderNote, OrderNoteResponse, OrderResponse, OwnerProjection, Product, ProductDraft, User,
    },
    repository::{Repository, RepositoryState},
    token::TokenService,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_KEY: &str = "ADMIN-KEY-1-20251230";
const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- In-Memory Repository ---
//
// Mirrors the Postgres implementation's semantics, including the owner
// constraints compiled into mutating operations, so the full router can be
// exercised without a database.

#[derive(Default)]
struct Inner {
    admin_keys: Vec<AdminApiKey>,
    users: Vec<User>,
    next_user_id: i64,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    notes: Vec<OrderNote>,
    products: Vec<Product>,
}

#[derive(Default)]
struct InMemoryRepo {
    inner: Mutex<Inner>,
}

impl InMemoryRepo {
    /// Test hook: flips the active flag to exercise live revocation.
    fn deactivate_user(&self, username: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.username == username) {
            user.active = false;
        }
    }

    /// Test hook: reads a note's current parent order.
    fn note_order_uid(&self, uid: Uuid) -> Option<Uuid> {
        let inner = self.inner.lock().unwrap();
        inner.notes.iter().find(|n| n.uid == uid).map(|n| n.order_uid)
    }
}

fn customer_owner_of(inner: &Inner, uid: Uuid) -> Option<Option<String>> {
    inner
        .customers
        .iter()
        .find(|c| c.uid == uid)
        .map(|c| c.owner_username.clone())
}

fn order_owner_of(inner: &Inner, uid: Uuid) -> Option<Option<String>> {
    inner
        .orders
        .iter()
        .find(|o| o.uid == uid)
        .and_then(|o| customer_owner_of(inner, o.customer_uid))
}

fn note_owner_of(inner: &Inner, uid: Uuid) -> Option<Option<String>> {
    inner
        .notes
        .iter()
        .find(|n| n.uid == uid)
        .and_then(|n| order_owner_of(inner, n.order_uid))
}

fn order_response_of(inner: &Inner, order: &Order) -> Option<OrderResponse> {
    let customer = inner.customers.iter().find(|c| c.uid == order.customer_uid)?;
    Some(OrderResponse {
        uid: order.uid,
        summary: order.summary.clone(),
        product_name: order.product_name.clone(),
        customer_uid: order.customer_uid,
        customer_name: customer.name.clone(),
        order_time: order.order_time,
    })
}

fn note_response_of(inner: &Inner, note: &OrderNote) -> Option<OrderNoteResponse> {
    let order = inner.orders.iter().find(|o| o.uid == note.order_uid)?;
    Some(OrderNoteResponse {
        uid: note.uid,
        order_uid: note.order_uid,
        order_summary: order.summary.clone(),
        message: note.message.clone(),
        created_at: note.created_at,
    })
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn find_active_admin_key(&self, value: &str) -> Result<Option<AdminApiKey>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .admin_keys
            .iter()
            .find(|k| k.key_value == value && k.active)
            .cloned())
    }

    async fn find_active_user(&self, username: &str) -> Result<Option<User>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username && u.active)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().any(|u| u.username == username))
    }

    async fn create_user_with_customer(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.username == username) {
            return Err(ApiError::conflict("username already taken"));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            active: true,
        };
        inner.users.push(user.clone());
        inner.customers.push(Customer {
            uid: Uuid::new_v4(),
            name: username.to_string(),
            contact_method: None,
            owner_username: Some(username.to_string()),
            created_at: Utc::now(),
        });
        Ok(user)
    }

    async fn seed_admin_key(&self, value: &str) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.admin_keys.iter().any(|k| k.key_value == value) {
            inner.admin_keys.push(AdminApiKey {
                key_value: value.to_string(),
                active: true,
            });
        }
        Ok(())
    }

    async fn customer_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(customer_owner_of(&inner, uid).map(|owner_username| OwnerProjection { owner_username }))
    }

    async fn order_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(order_owner_of(&inner, uid).map(|owner_username| OwnerProjection { owner_username }))
    }

    async fn note_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(note_owner_of(&inner, uid).map(|owner_username| OwnerProjection { owner_username }))
    }

    async fn list_customers(&self, owner: Option<&str>) -> Result<Vec<CustomerResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .customers
            .iter()
            .filter(|c| owner.is_none() || c.owner_username.as_deref() == owner)
            .map(|c| CustomerResponse {
                uid: c.uid,
                name: c.name.clone(),
                contact_method: c.contact_method.clone(),
                created_at: c.created_at,
            })
            .collect())
    }

    async fn get_customer(&self, uid: Uuid) -> Result<Option<Customer>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.customers.iter().find(|c| c.uid == uid).cloned())
    }

    async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let customer = Customer {
            uid: Uuid::new_v4(),
            name: draft.name,
            contact_method: draft.contact_method,
            owner_username: None,
            created_at: Utc::now(),
        };
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        uid: Uuid,
        draft: CustomerDraft,
    ) -> Result<Option<Customer>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(customer) = inner.customers.iter_mut().find(|c| c.uid == uid) else {
            return Ok(None);
        };
        customer.name = draft.name;
        customer.contact_method = draft.contact_method;
        Ok(Some(customer.clone()))
    }

    async fn delete_customer(&self, uid: Uuid) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.customers.len();
        inner.customers.retain(|c| c.uid != uid);
        Ok(inner.customers.len() < before)
    }

    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .filter(|o| {
                owner.is_none()
                    || customer_owner_of(&inner, o.customer_uid)
                        .map(|found| found.as_deref() == owner)
                        .unwrap_or(false)
            })
            .filter_map(|o| order_response_of(&inner, o))
            .collect())
    }

    async fn get_order_response(&self, uid: Uuid) -> Result<Option<OrderResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .find(|o| o.uid == uid)
            .and_then(|o| order_response_of(&inner, o)))
    }

    async fn create_order(&self, draft: OrderDraft) -> Result<OrderResponse, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let order = Order {
            uid: Uuid::new_v4(),
            summary: draft.summary,
            product_name: draft.product_name,
            customer_uid: draft.customer_uid,
            order_time: draft.order_time,
        };
        inner.orders.push(order.clone());
        order_response_of(&inner, &order)
            .ok_or_else(|| ApiError::internal("order references missing customer"))
    }

    async fn update_order(
        &self,
        uid: Uuid,
        draft: OrderDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderResponse>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        // Same predicate the SQL UPDATE carries: the caller must own both the
        // order's current customer and the target customer.
        if let Some(owner) = owner {
            let existing_ok = inner
                .orders
                .iter()
                .find(|o| o.uid == uid)
                .and_then(|o| customer_owner_of(&inner, o.customer_uid))
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            let target_ok = customer_owner_of(&inner, draft.customer_uid)
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            if !existing_ok || !target_ok {
                return Ok(None);
            }
        }
        let Some(index) = inner.orders.iter().position(|o| o.uid == uid) else {
            return Ok(None);
        };
        inner.orders[index].summary = draft.summary;
        inner.orders[index].product_name = draft.product_name;
        inner.orders[index].customer_uid = draft.customer_uid;
        inner.orders[index].order_time = draft.order_time;
        let order = inner.orders[index].clone();
        Ok(order_response_of(&inner, &order))
    }

    async fn delete_order(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(owner) = owner {
            let owned = order_owner_of(&inner, uid)
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            if !owned {
                return Ok(false);
            }
        }
        let before = inner.orders.len();
        inner.orders.retain(|o| o.uid != uid);
        Ok(inner.orders.len() < before)
    }

    async fn list_notes(&self, owner: Option<&str>) -> Result<Vec<OrderNoteResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .notes
            .iter()
            .filter(|n| {
                owner.is_none()
                    || note_owner_of(&inner, n.uid)
                        .map(|found| found.as_deref() == owner)
                        .unwrap_or(false)
            })
            .filter_map(|n| note_response_of(&inner, n))
            .collect())
    }

    async fn list_notes_for_order(
        &self,
        order_uid: Uuid,
    ) -> Result<Vec<OrderNoteResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .notes
            .iter()
            .filter(|n| n.order_uid == order_uid)
            .filter_map(|n| note_response_of(&inner, n))
            .collect())
    }

    async fn get_note_response(&self, uid: Uuid) -> Result<Option<OrderNoteResponse>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .notes
            .iter()
            .find(|n| n.uid == uid)
            .and_then(|n| note_response_of(&inner, n)))
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<OrderNoteResponse, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let note = OrderNote {
            uid: Uuid::new_v4(),
            order_uid: draft.order_uid,
            message: draft.message,
            created_at: Utc::now(),
        };
        inner.notes.push(note.clone());
        note_response_of(&inner, &note)
            .ok_or_else(|| ApiError::internal("note references missing order"))
    }

    async fn update_note(
        &self,
        uid: Uuid,
        draft: NoteDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderNoteResponse>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(owner) = owner {
            let existing_ok = note_owner_of(&inner, uid)
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            let target_ok = order_owner_of(&inner, draft.order_uid)
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            if !existing_ok || !target_ok {
                return Ok(None);
            }
        }
        let Some(index) = inner.notes.iter().position(|n| n.uid == uid) else {
            return Ok(None);
        };
        inner.notes[index].order_uid = draft.order_uid;
        inner.notes[index].message = draft.message;
        let note = inner.notes[index].clone();
        Ok(note_response_of(&inner, &note))
    }

    async fn delete_note(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(owner) = owner {
            let owned = note_owner_of(&inner, uid)
                .map(|found| found.as_deref() == Some(owner))
                .unwrap_or(false);
            if !owned {
                return Ok(false);
            }
        }
        let before = inner.notes.len();
        inner.notes.retain(|n| n.uid != uid);
        Ok(inner.notes.len() < before)
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.clone())
    }

    async fn get_product(&self, uid: Uuid) -> Result<Option<Product>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.iter().find(|p| p.uid == uid).cloned())
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let product = Product {
            uid: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            unit_price: draft.unit_price,
            active: draft.active.unwrap_or(true),
            created_at: Utc::now(),
        };
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        uid: Uuid,
        draft: ProductDraft,
    ) -> Result<Option<Product>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(product) = inner.products.iter_mut().find(|p| p.uid == uid) else {
            return Ok(None);
        };
        product.name = draft.name;
        product.description = draft.description;
        product.unit_price = draft.unit_price;
        if let Some(active) = draft.active {
            product.active = active;
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, uid: Uuid) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.products.len();
        inner.products.retain(|p| p.uid != uid);
        Ok(inner.products.len() < before)
    }
}

// --- Test App Scaffolding ---

struct TestApp {
    router: Router,
    repo: Arc<InMemoryRepo>,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepo::default());
    let repo_state = repo.clone() as RepositoryState;
    bootstrap::seed_admin_keys(&repo_state)
        .await
        .expect("seeding admin keys");

    let state = AppState {
        repo: repo_state,
        tokens: TokenService::new(TEST_JWT_SECRET, 120),
        config: AppConfig::default(),
    };
    TestApp {
        router: create_router(state),
        repo,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn admin_token(app: &TestApp) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login/admin",
        None,
        Some(json!({ "adminKey": ADMIN_KEY })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn register_and_login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Registration links exactly one customer to the account; fetch its uid.
async fn own_customer_uid(app: &TestApp, token: &str) -> String {
    let (status, body) = send(app, Method::GET, "/api/customers", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    list[0]["uid"].as_str().unwrap().to_string()
}

async fn create_order(app: &TestApp, token: &str, customer_uid: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/orders",
        Some(token),
        Some(json!({
            "summary": "monthly restock",
            "productName": "Widget",
            "customerUid": customer_uid,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["uid"].as_str().unwrap().to_string()
}

async fn create_note(app: &TestApp, token: &str, order_uid: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/order-notes",
        Some(token),
        Some(json!({ "orderUid": order_uid, "message": "call before delivery" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["uid"].as_str().unwrap().to_string()
}

// --- Tests ---

#[tokio::test]
async fn admin_login_and_customer_listing() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    register_and_login(&app, "alice", "pass1").await;
    register_and_login(&app, "bob", "pass2").await;

    let (status, body) = send(&app, Method::GET, "/api/customers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    // Admin sees both account-linked customers.
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_admin_key_is_unauthorized() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login/admin",
        None,
        Some(json!({ "adminKey": "no-such-key" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn admin_key_with_surrounding_whitespace_still_logs_in() {
    let app = spawn_app().await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login/admin",
        None,
        Some(json!({ "adminKey": format!("  {ADMIN_KEY}  ") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_with_missing_fields_is_bad_request() {
    let app = spawn_app().await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    register_and_login(&app, "alice", "pass1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let app = spawn_app().await;
    register_and_login(&app, "alice", "pass1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": "alice", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn registration_links_a_customer_to_the_account() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;

    let (status, body) = send(&app, Method::GET, "/api/customers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "alice");
}

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let app = spawn_app().await;
    let (status, body) = send(&app, Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // 401 keeps the compact body shape.
    assert!(body["message"].is_string());
    assert!(body.get("path").is_none());
}

#[tokio::test]
async fn user_creates_order_under_own_customer() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;
    let customer_uid = own_customer_uid(&app, &token).await;

    let order_uid = create_order(&app, &token, &customer_uid).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{order_uid}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customerName"], "alice");
    assert_eq!(body["summary"], "monthly restock");
}

#[tokio::test]
async fn user_cannot_create_order_for_foreign_customer() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;
    let bobs_customer = own_customer_uid(&app, &bob).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&alice),
        Some(json!({
            "summary": "sneaky",
            "productName": "Widget",
            "customerUid": bobs_customer,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn foreign_user_gets_403_but_admin_deletes_fine() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;
    let admin = admin_token(&app).await;

    let customer_uid = own_customer_uid(&app, &alice).await;
    let order_uid = create_order(&app, &alice, &customer_uid).await;

    // A non-owner probing a real foreign uid gets 403, not 404.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_uid}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin bypasses ownership entirely.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_uid}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_uid_is_400_and_unknown_uid_is_404() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/orders/not-a-uuid",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let random = Uuid::new_v4();
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{random}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_update_cannot_reparent_to_foreign_customer() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;

    let alices_customer = own_customer_uid(&app, &alice).await;
    let bobs_customer = own_customer_uid(&app, &bob).await;
    let order_uid = create_order(&app, &alice, &alices_customer).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_uid}"),
        Some(&alice),
        Some(json!({
            "summary": "moved",
            "productName": "Widget",
            "customerUid": bobs_customer,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The order still belongs to alice's customer.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{order_uid}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customerUid"], alices_customer);
}

#[tokio::test]
async fn customer_writes_are_admin_only() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let admin = admin_token(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(&alice),
        Some(json!({ "name": "Walk-in", "contactMethod": "phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(&admin),
        Some(json!({ "name": "Walk-in", "contactMethod": "phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uid = body["uid"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/customers/{uid}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/customers/{uid}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn user_cannot_read_foreign_or_unowned_customer() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;
    let admin = admin_token(&app).await;

    let bobs_customer = own_customer_uid(&app, &bob).await;
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/customers/{bobs_customer}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin-created customer has no owner; no user may read it.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(&admin),
        Some(json!({ "name": "Walk-in" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let unowned = body["uid"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/customers/{unowned}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn note_reparent_to_foreign_order_is_forbidden_and_unpersisted() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;

    let alices_customer = own_customer_uid(&app, &alice).await;
    let bobs_customer = own_customer_uid(&app, &bob).await;
    let alices_order = create_order(&app, &alice, &alices_customer).await;
    let bobs_order = create_order(&app, &bob, &bobs_customer).await;
    let note_uid = create_note(&app, &alice, &alices_order).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/order-notes/{note_uid}"),
        Some(&alice),
        Some(json!({ "orderUid": bobs_order, "message": "moved" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The persisted note still points at alice's order.
    let stored = app.repo.note_order_uid(Uuid::parse_str(&note_uid).unwrap());
    assert_eq!(stored, Some(Uuid::parse_str(&alices_order).unwrap()));
}

#[tokio::test]
async fn note_listing_is_owner_scoped() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;
    let admin = admin_token(&app).await;

    let alices_customer = own_customer_uid(&app, &alice).await;
    let bobs_customer = own_customer_uid(&app, &bob).await;
    let alices_order = create_order(&app, &alice, &alices_customer).await;
    let bobs_order = create_order(&app, &bob, &bobs_customer).await;
    create_note(&app, &alice, &alices_order).await;
    create_note(&app, &bob, &bobs_order).await;

    // Admin, no filter: everything.
    let (status, body) = send(&app, Method::GET, "/api/order-notes", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    // User, no filter: own notes only.
    let (status, body) = send(&app, Method::GET, "/api/order-notes", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // User filtering their own order: allowed.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/order-notes?orderUid={alices_order}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // User filtering a foreign order: forbidden.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/order-notes?orderUid={bobs_order}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Malformed filter: format check precedes everything else.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/order-notes?orderUid=not-a-uuid",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivating_a_user_revokes_outstanding_tokens() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;

    let (status, _) = send(&app, Method::GET, "/api/hello", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.repo.deactivate_user("alice");

    // Same, still-unexpired token: rejected on the very next request.
    let (status, _) = send(&app, Method::GET, "/api/hello", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_crud_for_any_authenticated_principal() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({ "name": "Widget", "description": "standard widget", "unitPrice": "19.99" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["active"], true);
    let uid = body["uid"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/products/{uid}"),
        Some(&token),
        Some(json!({ "name": "Widget v2", "unitPrice": "24.50", "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Widget v2");
    assert_eq!(body["active"], false);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/products/{uid}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/products/{uid}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_price_validation() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "pass1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({ "name": "Widget", "unitPrice": "-1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({ "name": "Widget", "unitPrice": "1.999" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn forbidden_responses_carry_the_standard_envelope() {
    let app = spawn_app().await;
    let alice = register_and_login(&app, "alice", "pass1").await;
    let bob = register_and_login(&app, "bob", "pass2").await;

    let customer_uid = own_customer_uid(&app, &alice).await;
    let order_uid = create_order(&app, &alice, &customer_uid).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_uid}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
    assert_eq!(body["error"], "Forbidden");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(body["path"], format!("/api/orders/{order_uid}"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_probe_needs_no_credential() {
    let app = spawn_app().await;
    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
