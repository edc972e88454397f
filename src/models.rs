use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminApiKey
///
/// A seeded administrator credential from the `admin_api_keys` table.
/// Identity is the key value itself; only the `active` flag ever changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct AdminApiKey {
    pub key_value: String,
    pub active: bool,
}

/// User
///
/// A registered account from the `users` table. The username is immutable and
/// unique; `active` gates every authorization decision live, so flipping it
/// revokes access even for unexpired tokens.
///
/// Not `Serialize`: the password hash must never leave the process. API
/// output goes through [`UserResponse`].
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub active: bool,
}

/// Customer
///
/// A customer record from the `customers` table. `owner_username` is null only
/// for customers created directly by an admin without a linked account; for
/// registration-created customers it is set once and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Customer {
    pub uid: Uuid,
    pub name: String,
    pub contact_method: Option<String>,
    pub owner_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order
///
/// An order row from the `customer_orders` table. Always references an
/// existing customer; its owner is never stored here, it is derived through
/// the customer on every check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Order {
    pub uid: Uuid,
    pub summary: String,
    pub product_name: String,
    pub customer_uid: Uuid,
    pub order_time: DateTime<Utc>,
}

/// OrderNote
///
/// A note row from the `order_notes` table, attached to exactly one order at
/// all times. Ownership is two hops away (note -> order -> customer).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct OrderNote {
    pub uid: Uuid,
    pub order_uid: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Product
///
/// Catalog item from the `products` table. No ownership dimension.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Product {
    pub uid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// OwnerProjection
///
/// Result row of an ownership-resolver query. The outer `Option` (record
/// exists or not) lives at the repository call site; a `None` here means the
/// record exists but is not linked to any user account.
#[derive(Debug, Clone, FromRow, Default)]
pub struct OwnerProjection {
    pub owner_username: Option<String>,
}

// --- Request Payloads (Input Schemas) ---
//
// Required fields are modeled as Option and checked in the handlers so a
// missing field maps to 400, not a deserializer rejection.

/// AdminLoginRequest
///
/// Input payload for POST /api/login/admin.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    pub admin_key: Option<String>,
}

/// UserLoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// RegisterRequest
///
/// Input payload for POST /api/register.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// CustomerRequest
///
/// Input payload for customer create/update. Admin-managed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub contact_method: Option<String>,
}

/// OrderRequest
///
/// Input payload for order create/update. `customer_uid` arrives as a string
/// and is format-validated before any lookup. `order_time` defaults to now
/// when absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub summary: Option<String>,
    pub product_name: Option<String>,
    pub customer_uid: Option<String>,
    pub order_time: Option<DateTime<Utc>>,
}

/// OrderNoteRequest
///
/// Input payload for note create/update. On update, a changed `order_uid`
/// reparents the note and re-evaluates ownership on both ends.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderNoteRequest {
    pub order_uid: Option<String>,
    pub message: Option<String>,
}

/// ProductRequest
///
/// Input payload for product create/update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub active: Option<bool>,
}

// --- Validated Write Payloads (Repository Inputs) ---
//
// Produced by the handlers once required fields and identifier formats have
// been checked; the repository never sees raw request payloads.

/// CustomerDraft
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub contact_method: Option<String>,
}

/// OrderDraft
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub summary: String,
    pub product_name: String,
    pub customer_uid: Uuid,
    pub order_time: DateTime<Utc>,
}

/// NoteDraft
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub order_uid: Uuid,
    pub message: String,
}

/// ProductDraft
///
/// `active: None` means "leave as is" on update and "default true" on create.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub active: Option<bool>,
}

// --- Response Schemas (Output) ---

/// TokenResponse
///
/// Output of both login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TokenResponse {
    pub token: String,
}

/// UserResponse
///
/// Public summary of a registered account. Never includes the hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub active: bool,
}

/// CustomerResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub uid: Uuid,
    pub name: String,
    pub contact_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// OrderResponse
///
/// Order enriched with the customer's name (a join in the repository).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub uid: Uuid,
    pub summary: String,
    pub product_name: String,
    pub customer_uid: Uuid,
    pub customer_name: String,
    pub order_time: DateTime<Utc>,
}

/// OrderNoteResponse
///
/// Note enriched with the parent order's summary (a join in the repository).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderNoteResponse {
    pub uid: Uuid,
    pub order_uid: Uuid,
    pub order_summary: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// ProductResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub uid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            uid: c.uid,
            name: c.name,
            contact_method: c.contact_method,
            created_at: c.created_at,
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            uid: p.uid,
            name: p.name,
            description: p.description,
            unit_price: p.unit_price,
            active: p.active,
            created_at: p.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            active: u.active,
        }
    }
}
