//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Ownership Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart line access rule                            │
//! │                                                                         │
//! │   user ──► carts (user_id, status = 'in_progress') ──► cart_lines      │
//! │                                                                         │
//! │   Every line lookup that originates from a request goes through         │
//! │   line_for_user(): line id + requesting user + open status. A line      │
//! │   in someone else's cart, or in an already validated cart, simply       │
//! │   does not exist from the caller's point of view.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The repository exposes primitives; quantity/stock policy lives with the
//! callers in `boutique_core` and the API handlers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use boutique_core::{Cart, CartLine, CartStatus, Money};

/// A cart line joined with the catalog columns the cart view needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLineDetail {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price captured when the line was added.
    pub unit_price_cents: i64,
    /// Current stock of the product, for short-stock warnings.
    pub stock_quantity: i64,
    /// Whether the product is still active.
    pub product_active: bool,
}

impl CartLineDetail {
    /// Captured unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line sub-total: quantity × captured unit price.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// True when the line asks for more units than are currently in stock.
    #[inline]
    pub fn exceeds_stock(&self) -> bool {
        self.quantity > self.stock_quantity
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    // =========================================================================
    // Carts
    // =========================================================================

    /// Finds the user's open cart, if any.
    pub async fn open_cart(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM carts
            WHERE user_id = ?1 AND status = 'in_progress'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Finds the user's open cart, creating an empty one if none exists.
    pub async fn get_or_create_open_cart(&self, user_id: &str) -> DbResult<Cart> {
        if let Some(cart) = self.open_cart(user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: Some(user_id.to_string()),
            status: CartStatus::InProgress,
            created_at: now,
            updated_at: now,
        };

        debug!(cart_id = %cart.id, user_id = %user_id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.status.as_str())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Bumps a cart's updated_at after a line mutation.
    pub async fn touch_cart(&self, cart_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE carts SET updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Cart Lines
    // =========================================================================

    /// Finds the line for a given product within a cart.
    pub async fn find_line(&self, cart_id: &str, product_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, product_id, quantity, unit_price_cents, added_at
            FROM cart_lines
            WHERE cart_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Finds a line by id, scoped to the requesting user's open cart.
    ///
    /// Returns None both for unknown ids and for lines the user does not
    /// own, so callers cannot probe other users' carts.
    pub async fn line_for_user(&self, line_id: &str, user_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT l.id, l.cart_id, l.product_id, l.quantity, l.unit_price_cents, l.added_at
            FROM cart_lines l
            JOIN carts c ON c.id = l.cart_id
            WHERE l.id = ?1 AND c.user_id = ?2 AND c.status = 'in_progress'
            "#,
        )
        .bind(line_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Inserts a new cart line.
    pub async fn insert_line(&self, line: &CartLine) -> DbResult<()> {
        debug!(
            line_id = %line.id,
            cart_id = %line.cart_id,
            product_id = %line.product_id,
            quantity = line.quantity,
            "Inserting cart line"
        );

        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, cart_id, product_id, quantity, unit_price_cents, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&line.id)
        .bind(&line.cart_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.added_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a line's quantity.
    pub async fn update_line_quantity(&self, line_id: &str, quantity: i64) -> DbResult<()> {
        debug!(line_id = %line_id, quantity, "Updating cart line quantity");

        let result = sqlx::query("UPDATE cart_lines SET quantity = ?1 WHERE id = ?2")
            .bind(quantity)
            .bind(line_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Deletes a cart line.
    pub async fn delete_line(&self, line_id: &str) -> DbResult<()> {
        debug!(line_id = %line_id, "Deleting cart line");

        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1")
            .bind(line_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Counts the lines in a cart.
    pub async fn count_lines(&self, cart_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE cart_id = ?1")
            .bind(cart_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Lists a cart's lines joined with product name and stock, in the
    /// order they were added.
    pub async fn line_details(&self, cart_id: &str) -> DbResult<Vec<CartLineDetail>> {
        let details = sqlx::query_as::<_, CartLineDetail>(
            r#"
            SELECT l.id, l.cart_id, l.product_id,
                   p.name AS product_name,
                   l.quantity, l.unit_price_cents,
                   p.stock_quantity,
                   p.is_active AS product_active
            FROM cart_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.cart_id = ?1
            ORDER BY l.added_at, l.id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }
}

/// Builds a cart line with generated id and current timestamp.
pub fn new_cart_line(
    cart_id: &str,
    product_id: &str,
    quantity: i64,
    unit_price_cents: i64,
) -> CartLine {
    CartLine {
        id: Uuid::new_v4().to_string(),
        cart_id: cart_id.to_string(),
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
        added_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{generate_product_id, new_category};
    use boutique_core::Product;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, sale_cents: i64, stock: i64) -> Product {
        let category = new_category(&format!("cat-{name}"), "");
        db.catalog().insert_category(&category).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            description: String::new(),
            category_id: category.id,
            variant_id: None,
            purchase_price_cents: sale_cents / 2,
            sale_price_cents: sale_cents,
            stock_quantity: stock,
            minimum_stock: 5,
            barcode: None,
            image_path: None,
            on_promotion: false,
            promo_price_cents: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.catalog().insert_product(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;

        let first = db.carts().get_or_create_open_cart("alice").await.unwrap();
        let second = db.carts().get_or_create_open_cart("alice").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.status, CartStatus::InProgress);
    }

    #[tokio::test]
    async fn test_open_carts_are_per_user() {
        let db = test_db().await;

        let alice = db.carts().get_or_create_open_cart("alice").await.unwrap();
        let bob = db.carts().get_or_create_open_cart("bob").await.unwrap();
        assert_ne!(alice.id, bob.id);

        let found = db.carts().open_cart("alice").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
    }

    #[tokio::test]
    async fn test_insert_and_find_line() {
        let db = test_db().await;
        let product = seed_product(&db, "Eau minérale", 1500, 10).await;
        let cart = db.carts().get_or_create_open_cart("alice").await.unwrap();

        let line = new_cart_line(&cart.id, &product.id, 2, 1500);
        db.carts().insert_line(&line).await.unwrap();

        let found = db
            .carts()
            .find_line(&cart.id, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.quantity, 2);
        assert_eq!(found.unit_price_cents, 1500);
    }

    #[tokio::test]
    async fn test_duplicate_product_line_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "Eau minérale", 1500, 10).await;
        let cart = db.carts().get_or_create_open_cart("alice").await.unwrap();

        db.carts()
            .insert_line(&new_cart_line(&cart.id, &product.id, 1, 1500))
            .await
            .unwrap();
        let err = db
            .carts()
            .insert_line(&new_cart_line(&cart.id, &product.id, 1, 1500))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_line_for_user_hides_other_users_lines() {
        let db = test_db().await;
        let product = seed_product(&db, "Eau minérale", 1500, 10).await;
        let cart = db.carts().get_or_create_open_cart("alice").await.unwrap();

        let line = new_cart_line(&cart.id, &product.id, 1, 1500);
        db.carts().insert_line(&line).await.unwrap();

        assert!(db
            .carts()
            .line_for_user(&line.id, "alice")
            .await
            .unwrap()
            .is_some());
        assert!(db
            .carts()
            .line_for_user(&line.id, "bob")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_line() {
        let db = test_db().await;
        let product = seed_product(&db, "Eau minérale", 1500, 10).await;
        let cart = db.carts().get_or_create_open_cart("alice").await.unwrap();

        let line = new_cart_line(&cart.id, &product.id, 1, 1500);
        db.carts().insert_line(&line).await.unwrap();

        db.carts().update_line_quantity(&line.id, 5).await.unwrap();
        let found = db
            .carts()
            .find_line(&cart.id, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.quantity, 5);

        db.carts().delete_line(&line.id).await.unwrap();
        assert!(db
            .carts()
            .find_line(&cart.id, &product.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(db.carts().count_lines(&cart.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_line_is_not_found() {
        let db = test_db().await;

        let err = db
            .carts()
            .update_line_quantity("no-such-line", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_line_details_join_products() {
        let db = test_db().await;
        let water = seed_product(&db, "Eau minérale", 1500, 10).await;
        let juice = seed_product(&db, "Jus d'orange", 2500, 1).await;
        let cart = db.carts().get_or_create_open_cart("alice").await.unwrap();

        db.carts()
            .insert_line(&new_cart_line(&cart.id, &water.id, 2, 1500))
            .await
            .unwrap();
        db.carts()
            .insert_line(&new_cart_line(&cart.id, &juice.id, 3, 2500))
            .await
            .unwrap();

        let details = db.carts().line_details(&cart.id).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].product_name, "Eau minérale");
        assert_eq!(details[0].subtotal().cents(), 3000);
        assert!(!details[0].exceeds_stock());
        // juice: quantity 3 but stock 1
        assert!(details[1].exceeds_stock());

        let total: i64 = details.iter().map(|d| d.subtotal().cents()).sum();
        assert_eq!(total, 3000 + 7500);
    }
}
