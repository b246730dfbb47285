//! # Order Repository
//!
//! Checkout and order history.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     POST /panier/commander/                             │
//! │                                                                         │
//! │  resolve open cart id (pool query, outside the transaction)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ──► claim: UPDATE carts SET status='validated'                   │
//! │  │             WHERE id=? AND status='in_progress'                      │
//! │  │         0 rows → ROLLBACK → already-validated conflict               │
//! │  │                                                                      │
//! │  ├──► load lines (JOIN products)      0 rows → ROLLBACK → empty cart    │
//! │  │                                                                      │
//! │  ├──► per line: UPDATE products                                         │
//! │  │        SET stock_quantity = stock_quantity - qty                     │
//! │  │        WHERE id=? AND stock_quantity >= qty                          │
//! │  │    0 rows → ROLLBACK → insufficient stock                            │
//! │  │                                                                      │
//! │  ├──► INSERT order  (number CMD-YYYYMMDD-NNNN, frozen total)            │
//! │  ├──► INSERT sales  (one ledger row per line)                           │
//! │  │                                                                      │
//! │  ▼                                                                      │
//! │  COMMIT ──► Order                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The claim is deliberately the FIRST statement of the transaction. Under
//! WAL, a deferred transaction snapshots the database at its first read, and
//! a write after a stale read fails with `SQLITE_BUSY_SNAPSHOT`. Resolving
//! the cart id on the plain pool first means two racing checkouts both reach
//! the claim, exactly one flips the status, and the loser sees zero rows
//! instead of a busy error.
//!
//! The stock decrement carries its own `stock_quantity >= qty` guard, so
//! over-selling is impossible and the `stock_quantity >= 0` CHECK constraint
//! is never the thing that saves us. Any failure after the claim rolls the
//! whole transaction back, which also restores the cart to `in_progress`.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use boutique_core::{CoreError, Money, Order, OrderStatus};

/// Errors surfaced by checkout: domain rules or database failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Db(DbError::from(err))
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// One line of an order, read back from the sales ledger.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl OrderLine {
    /// Captured unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Frozen line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Cart line joined with live product columns, read inside the checkout
/// transaction.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLine {
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    stock_quantity: i64,
}

/// Repository for checkout and order history.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Converts the user's open cart into an order.
    ///
    /// All-or-nothing: stock checks, the stock decrements, the order row and
    /// the sale ledger rows commit together or not at all. On any failure the
    /// cart stays `in_progress` with its lines intact.
    pub async fn checkout(&self, user_id: &str) -> CheckoutResult<Order> {
        // Resolved on the pool, not in the transaction. See module docs.
        let cart_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM carts
            WHERE user_id = ?1 AND status = 'in_progress'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let Some(cart_id) = cart_id else {
            return Err(CoreError::CartNotFound(user_id.to_string()).into());
        };

        debug!(user_id = %user_id, cart_id = %cart_id, "Starting checkout");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Claim first: exactly one of two racing checkouts wins this UPDATE.
        let claimed = sqlx::query(
            r#"
            UPDATE carts SET status = 'validated', updated_at = ?1
            WHERE id = ?2 AND status = 'in_progress'
            "#,
        )
        .bind(now)
        .bind(&cart_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            let current_status: String =
                sqlx::query_scalar("SELECT status FROM carts WHERE id = ?1")
                    .bind(&cart_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(DbError::from)?
                    .unwrap_or_else(|| "deleted".to_string());
            return Err(CoreError::InvalidCartStatus {
                cart_id,
                current_status,
            }
            .into());
        }

        let lines = sqlx::query_as::<_, CheckoutLine>(
            r#"
            SELECT l.product_id,
                   p.name AS product_name,
                   l.quantity,
                   l.unit_price_cents,
                   p.stock_quantity
            FROM cart_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.cart_id = ?1
            ORDER BY l.added_at, l.id
            "#,
        )
        .bind(&cart_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Err(CoreError::EmptyCart.into());
        }

        // Conditional decrement per line. The guard re-checks live stock at
        // checkout time, catching drift since the line was added.
        for line in &lines {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - ?1, updated_at = ?2
                WHERE id = ?3 AND stock_quantity >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(CoreError::InsufficientStock {
                    name: line.product_name.clone(),
                    available: line.stock_quantity,
                    requested: line.quantity,
                }
                .into());
            }
        }

        let order_number = next_order_number(&mut tx, now).await?;
        let total_cents: i64 = lines.iter().map(|l| l.quantity * l.unit_price_cents).sum();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            cart_id,
            order_number,
            status: OrderStatus::Pending,
            total_cents,
            delivery_date: None,
            notes: String::new(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (id, cart_id, order_number, status, total_cents,
                                delivery_date, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.cart_id)
        .bind(&order.order_number)
        .bind(order.status.as_str())
        .bind(order.total_cents)
        .bind(order.delivery_date)
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        // Ledger fan-out, same transaction: one immutable sale row per line.
        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO sales (id, product_id, quantity, unit_price_cents,
                                   total_cents, order_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.quantity * line.unit_price_cents)
            .bind(&order.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            lines = lines.len(),
            total = %order.total(),
            "Checkout complete"
        );

        Ok(order)
    }

    // =========================================================================
    // Order History
    // =========================================================================

    /// Lists a user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT o.id, o.cart_id, o.order_number, o.status, o.total_cents,
                   o.delivery_date, o.notes, o.created_at
            FROM orders o
            JOIN carts c ON c.id = o.cart_id
            WHERE c.user_id = ?1
            ORDER BY o.created_at DESC, o.order_number DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets one order, scoped to its owner. Another user's order id returns
    /// None, indistinguishable from an unknown id.
    pub async fn order_for_user(&self, order_id: &str, user_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT o.id, o.cart_id, o.order_number, o.status, o.total_cents,
                   o.delivery_date, o.notes, o.created_at
            FROM orders o
            JOIN carts c ON c.id = o.cart_id
            WHERE o.id = ?1 AND c.user_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists an order's lines from the sales ledger, with product names.
    pub async fn lines_for_order(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT s.product_id,
                   p.name AS product_name,
                   s.quantity,
                   s.unit_price_cents,
                   s.total_cents
            FROM sales s
            JOIN products p ON p.id = s.product_id
            WHERE s.order_id = ?1
            ORDER BY s.created_at, s.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Counts all orders.
    pub async fn count_orders(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Next order number for the day: `CMD-YYYYMMDD-NNNN`.
///
/// Counted inside the checkout transaction, which holds the database write
/// lock, so two orders can never draw the same sequence number.
async fn next_order_number(
    tx: &mut Transaction<'_, Sqlite>,
    now: DateTime<Utc>,
) -> Result<String, DbError> {
    let prefix = format!("CMD-{}-", now.format("%Y%m%d"));

    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_number LIKE ?1 || '%'")
            .bind(&prefix)
            .fetch_one(&mut **tx)
            .await?;

    Ok(format!("{prefix}{:04}", existing + 1))
}

// =============================================================================
// Unit Tests
// =============================================================================
