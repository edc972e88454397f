use crate::{
    error::ApiError,
    models::{
        AdminApiKey, Customer, CustomerDraft, CustomerResponse, NoteDraft, OrderDraft,
        OrderNoteResponse, OrderResponse, OwnerProjection, Product, ProductDraft, User,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations: credential-store
/// lookups, ownership-resolver projections, and resource CRUD. Handlers
/// interact with the data layer only through this trait so tests can swap in
/// an in-memory implementation.
///
/// Mutating methods take an optional `owner` constraint. `None` means no
/// constraint (admin); `Some(username)` compiles the ownership requirement
/// into the write itself, so the authorization decision and the side effect
/// share one consistency scope.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    // Live lookups against current active flags; executed on every request.
    async fn find_active_admin_key(&self, value: &str) -> Result<Option<AdminApiKey>, ApiError>;
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn username_exists(&self, username: &str) -> Result<bool, ApiError>;
    // Creates the account and its linked customer in one transaction.
    async fn create_user_with_customer(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, ApiError>;
    // Idempotent upsert used by startup seeding.
    async fn seed_admin_key(&self, value: &str) -> Result<(), ApiError>;

    // --- Ownership Resolvers ---
    // Fresh per-call projections; ownership is never cached or denormalized.
    async fn customer_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError>;
    async fn order_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError>;
    async fn note_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError>;

    // --- Customers ---
    async fn list_customers(&self, owner: Option<&str>) -> Result<Vec<CustomerResponse>, ApiError>;
    async fn get_customer(&self, uid: Uuid) -> Result<Option<Customer>, ApiError>;
    async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, ApiError>;
    async fn update_customer(
        &self,
        uid: Uuid,
        draft: CustomerDraft,
    ) -> Result<Option<Customer>, ApiError>;
    async fn delete_customer(&self, uid: Uuid) -> Result<bool, ApiError>;

    // --- Orders ---
    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderResponse>, ApiError>;
    async fn get_order_response(&self, uid: Uuid) -> Result<Option<OrderResponse>, ApiError>;
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderResponse, ApiError>;
    async fn update_order(
        &self,
        uid: Uuid,
        draft: OrderDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderResponse>, ApiError>;
    async fn delete_order(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError>;

    // --- Order Notes ---
    async fn list_notes(&self, owner: Option<&str>) -> Result<Vec<OrderNoteResponse>, ApiError>;
    async fn list_notes_for_order(
        &self,
        order_uid: Uuid,
    ) -> Result<Vec<OrderNoteResponse>, ApiError>;
    async fn get_note_response(&self, uid: Uuid) -> Result<Option<OrderNoteResponse>, ApiError>;
    async fn create_note(&self, draft: NoteDraft) -> Result<OrderNoteResponse, ApiError>;
    async fn update_note(
        &self,
        uid: Uuid,
        draft: NoteDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderNoteResponse>, ApiError>;
    async fn delete_note(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError>;

    // --- Products ---
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;
    async fn get_product(&self, uid: Uuid) -> Result<Option<Product>, ApiError>;
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError>;
    async fn update_product(
        &self,
        uid: Uuid,
        draft: ProductDraft,
    ) -> Result<Option<Product>, ApiError>;
    async fn delete_product(&self, uid: Uuid) -> Result<bool, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_RESPONSE_SELECT: &str = r#"
    SELECT o.uid, o.summary, o.product_name, o.customer_uid,
           c.name AS customer_name, o.order_time
    FROM customer_orders o
    JOIN customers c ON o.customer_uid = c.uid
"#;

const NOTE_RESPONSE_SELECT: &str = r#"
    SELECT n.uid, n.order_uid, o.summary AS order_summary, n.message, n.created_at
    FROM order_notes n
    JOIN customer_orders o ON n.order_uid = o.uid
"#;

#[async_trait]
impl Repository for PostgresRepository {
    // --- CREDENTIAL STORE ---

    async fn find_active_admin_key(&self, value: &str) -> Result<Option<AdminApiKey>, ApiError> {
        let key = sqlx::query_as::<_, AdminApiKey>(
            "SELECT key_value, active FROM admin_api_keys WHERE key_value = $1 AND active = true",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(key)
    }

    async fn find_active_user(&self, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, active FROM users WHERE username = $1 AND active = true",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// create_user_with_customer
    ///
    /// Inserts the account and its linked customer in one transaction. The
    /// customer carries the username as both name and owner. A concurrent
    /// duplicate registration surfaces as the unique-violation code and is
    /// mapped to Conflict rather than Internal.
    async fn create_user_with_customer(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, active)
               VALUES ($1, $2, true)
               RETURNING id, username, password_hash, active"#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
            Some(code) if code == "23505" => ApiError::conflict("username already taken"),
            _ => ApiError::from(e),
        })?;

        sqlx::query(
            r#"INSERT INTO customers (uid, name, contact_method, owner_username, created_at)
               VALUES ($1, $2, NULL, $3, NOW())"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(username)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn seed_admin_key(&self, value: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO admin_api_keys (key_value, active)
               VALUES ($1, true)
               ON CONFLICT (key_value) DO NOTHING"#,
        )
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- OWNERSHIP RESOLVERS ---

    async fn customer_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let row = sqlx::query_as::<_, OwnerProjection>(
            "SELECT owner_username FROM customers WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn order_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let row = sqlx::query_as::<_, OwnerProjection>(
            r#"SELECT c.owner_username
               FROM customer_orders o
               JOIN customers c ON o.customer_uid = c.uid
               WHERE o.uid = $1"#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn note_owner(&self, uid: Uuid) -> Result<Option<OwnerProjection>, ApiError> {
        let row = sqlx::query_as::<_, OwnerProjection>(
            r#"SELECT c.owner_username
               FROM order_notes n
               JOIN customer_orders o ON n.order_uid = o.uid
               JOIN customers c ON o.customer_uid = c.uid
               WHERE n.uid = $1"#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // --- CUSTOMERS ---

    async fn list_customers(&self, owner: Option<&str>) -> Result<Vec<CustomerResponse>, ApiError> {
        let customers = sqlx::query_as::<_, CustomerResponse>(
            r#"SELECT uid, name, contact_method, created_at
               FROM customers
               WHERE $1::text IS NULL OR owner_username = $1
               ORDER BY created_at ASC"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    async fn get_customer(&self, uid: Uuid) -> Result<Option<Customer>, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"SELECT uid, name, contact_method, owner_username, created_at
               FROM customers WHERE uid = $1"#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    /// create_customer
    ///
    /// Admin-created customer: no linked account, owner stays null.
    async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"INSERT INTO customers (uid, name, contact_method, owner_username, created_at)
               VALUES ($1, $2, $3, NULL, NOW())
               RETURNING uid, name, contact_method, owner_username, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.contact_method)
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    /// update_customer
    ///
    /// Replaces name and contact method. The owner link is immutable here.
    async fn update_customer(
        &self,
        uid: Uuid,
        draft: CustomerDraft,
    ) -> Result<Option<Customer>, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"UPDATE customers SET name = $2, contact_method = $3
               WHERE uid = $1
               RETURNING uid, name, contact_method, owner_username, created_at"#,
        )
        .bind(uid)
        .bind(draft.name)
        .bind(draft.contact_method)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn delete_customer(&self, uid: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM customers WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- ORDERS ---

    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderResponse>, ApiError> {
        let sql = format!(
            "{ORDER_RESPONSE_SELECT} WHERE $1::text IS NULL OR c.owner_username = $1 \
             ORDER BY o.order_time DESC"
        );
        let orders = sqlx::query_as::<_, OrderResponse>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    async fn get_order_response(&self, uid: Uuid) -> Result<Option<OrderResponse>, ApiError> {
        let sql = format!("{ORDER_RESPONSE_SELECT} WHERE o.uid = $1");
        let order = sqlx::query_as::<_, OrderResponse>(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn create_order(&self, draft: OrderDraft) -> Result<OrderResponse, ApiError> {
        let uid = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO customer_orders (uid, summary, product_name, customer_uid, order_time)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING uid"#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.summary)
        .bind(draft.product_name)
        .bind(draft.customer_uid)
        .bind(draft.order_time)
        .fetch_one(&self.pool)
        .await?;

        self.get_order_response(uid)
            .await?
            .ok_or_else(|| ApiError::internal("order vanished after insert"))
    }

    /// update_order
    ///
    /// Full replace, including a possible move to another customer. When an
    /// owner constraint is given, the WHERE clause requires the caller to own
    /// both the order's current customer and the target customer, so a
    /// concurrent reassignment cannot slip between check and write.
    async fn update_order(
        &self,
        uid: Uuid,
        draft: OrderDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderResponse>, ApiError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"UPDATE customer_orders o
               SET summary = $2, product_name = $3, customer_uid = $4, order_time = $5
               WHERE o.uid = $1
                 AND ($6::text IS NULL OR (
                       EXISTS (SELECT 1 FROM customers c
                               WHERE c.uid = o.customer_uid AND c.owner_username = $6)
                   AND EXISTS (SELECT 1 FROM customers t
                               WHERE t.uid = $4 AND t.owner_username = $6)))
               RETURNING o.uid"#,
        )
        .bind(uid)
        .bind(draft.summary)
        .bind(draft.product_name)
        .bind(draft.customer_uid)
        .bind(draft.order_time)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(uid) => self.get_order_response(uid).await,
            None => Ok(None),
        }
    }

    async fn delete_order(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"DELETE FROM customer_orders o
               WHERE o.uid = $1
                 AND ($2::text IS NULL OR EXISTS (
                       SELECT 1 FROM customers c
                       WHERE c.uid = o.customer_uid AND c.owner_username = $2))"#,
        )
        .bind(uid)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- ORDER NOTES ---

    async fn list_notes(&self, owner: Option<&str>) -> Result<Vec<OrderNoteResponse>, ApiError> {
        let sql = format!(
            "{NOTE_RESPONSE_SELECT} JOIN customers c ON o.customer_uid = c.uid \
             WHERE $1::text IS NULL OR c.owner_username = $1 \
             ORDER BY n.created_at ASC"
        );
        let notes = sqlx::query_as::<_, OrderNoteResponse>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn list_notes_for_order(
        &self,
        order_uid: Uuid,
    ) -> Result<Vec<OrderNoteResponse>, ApiError> {
        let sql = format!("{NOTE_RESPONSE_SELECT} WHERE n.order_uid = $1 ORDER BY n.created_at ASC");
        let notes = sqlx::query_as::<_, OrderNoteResponse>(&sql)
            .bind(order_uid)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn get_note_response(&self, uid: Uuid) -> Result<Option<OrderNoteResponse>, ApiError> {
        let sql = format!("{NOTE_RESPONSE_SELECT} WHERE n.uid = $1");
        let note = sqlx::query_as::<_, OrderNoteResponse>(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<OrderNoteResponse, ApiError> {
        let uid = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO order_notes (uid, order_uid, message, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING uid"#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.order_uid)
        .bind(draft.message)
        .fetch_one(&self.pool)
        .await?;

        self.get_note_response(uid)
            .await?
            .ok_or_else(|| ApiError::internal("note vanished after insert"))
    }

    /// update_note
    ///
    /// Full replace, including a possible reparent onto another order. The
    /// owner constraint requires ownership of both the note's current order
    /// and the target order inside the same statement.
    async fn update_note(
        &self,
        uid: Uuid,
        draft: NoteDraft,
        owner: Option<&str>,
    ) -> Result<Option<OrderNoteResponse>, ApiError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"UPDATE order_notes n
               SET order_uid = $2, message = $3
               WHERE n.uid = $1
                 AND ($4::text IS NULL OR (
                       EXISTS (SELECT 1 FROM customer_orders o
                               JOIN customers c ON o.customer_uid = c.uid
                               WHERE o.uid = n.order_uid AND c.owner_username = $4)
                   AND EXISTS (SELECT 1 FROM customer_orders t
                               JOIN customers tc ON t.customer_uid = tc.uid
                               WHERE t.uid = $2 AND tc.owner_username = $4)))
               RETURNING n.uid"#,
        )
        .bind(uid)
        .bind(draft.order_uid)
        .bind(draft.message)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(uid) => self.get_note_response(uid).await,
            None => Ok(None),
        }
    }

    async fn delete_note(&self, uid: Uuid, owner: Option<&str>) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"DELETE FROM order_notes n
               WHERE n.uid = $1
                 AND ($2::text IS NULL OR EXISTS (
                       SELECT 1 FROM customer_orders o
                       JOIN customers c ON o.customer_uid = c.uid
                       WHERE o.uid = n.order_uid AND c.owner_username = $2))"#,
        )
        .bind(uid)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- PRODUCTS ---

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let products = sqlx::query_as::<_, Product>(
            r#"SELECT uid, name, description, unit_price, active, created_at
               FROM products ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, uid: Uuid) -> Result<Option<Product>, ApiError> {
        let product = sqlx::query_as::<_, Product>(
            r#"SELECT uid, name, description, unit_price, active, created_at
               FROM products WHERE uid = $1"#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError> {
        let product = sqlx::query_as::<_, Product>(
            r#"INSERT INTO products (uid, name, description, unit_price, active, created_at)
               VALUES ($1, $2, $3, $4, COALESCE($5, true), NOW())
               RETURNING uid, name, description, unit_price, active, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.unit_price)
        .bind(draft.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn update_product(
        &self,
        uid: Uuid,
        draft: ProductDraft,
    ) -> Result<Option<Product>, ApiError> {
        let product = sqlx::query_as::<_, Product>(
            r#"UPDATE products
               SET name = $2, description = $3, unit_price = $4,
                   active = COALESCE($5, active)
               WHERE uid = $1
               RETURNING uid, name, description, unit_price, active, created_at"#,
        )
        .bind(uid)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.unit_price)
        .bind(draft.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, uid: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM products WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
