//! # Sale Repository
//!
//! Read access to the sales ledger.
//!
//! Sales are written exclusively by checkout (same transaction as the order)
//! and never mutated afterwards; everything here is a query. The export
//! projection joins product and category names so the CSV writer never has
//! to chase references.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use boutique_core::Money;

/// One ledger row shaped for the CSV export: date, product, category,
/// quantity, unit price, total amount.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleExportRow {
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub category_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl SaleExportRow {
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

/// Repository for sales ledger queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists every ledger row with product and category names, newest first.
    pub async fn export_rows(&self) -> DbResult<Vec<SaleExportRow>> {
        let rows = sqlx::query_as::<_, SaleExportRow>(
            r#"
            SELECT s.created_at,
                   p.name AS product_name,
                   c.name AS category_name,
                   s.quantity,
                   s.unit_price_cents,
                   s.total_cents
            FROM sales s
            JOIN products p ON p.id = s.product_id
            JOIN categories c ON c.id = p.category_id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::cart::new_cart_line;
    use crate::repository::catalog::{generate_product_id, new_category};
    use boutique_core::Product;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, category: &str, name: &str, sale_cents: i64) -> Product {
        let cat = new_category(category, "");
        db.catalog().insert_category(&cat).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            description: String::new(),
            category_id: cat.id,
            variant_id: None,
            purchase_price_cents: (sale_cents / 2).max(1),
            sale_price_cents: sale_cents,
            stock_quantity: 50,
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

    async fn buy(db: &Database, user: &str, product: &Product, quantity: i64) {
        let cart = db.carts().get_or_create_open_cart(user).await.unwrap();
        db.carts()
            .insert_line(&new_cart_line(
                &cart.id,
                &product.id,
                quantity,
                product.sale_price_cents,
            ))
            .await
            .unwrap();
        db.orders().checkout(user).await.unwrap();
    }

    #[tokio::test]
    async fn test_export_empty_ledger() {
        let db = test_db().await;
        assert!(db.sales().export_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_joins_names_newest_first() {
        let db = test_db().await;
        let water = seed_product(&db, "Boissons", "Eau minérale", 1500).await;
        let rice = seed_product(&db, "Épicerie", "Riz parfumé", 8000).await;

        buy(&db, "alice", &water, 2).await;
        buy(&db, "bob", &rice, 1).await;

        let rows = db.sales().export_rows().await.unwrap();
        assert_eq!(rows.len(), 2);

        // Newest first: bob's purchase happened last
        assert_eq!(rows[0].product_name, "Riz parfumé");
        assert_eq!(rows[0].category_name, "Épicerie");
        assert_eq!(rows[0].quantity, 1);
        assert_eq!(rows[0].total_cents, 8000);

        assert_eq!(rows[1].product_name, "Eau minérale");
        assert_eq!(rows[1].category_name, "Boissons");
        assert_eq!(rows[1].unit_price_cents, 1500);
        assert_eq!(rows[1].total_cents, 3000);
        assert_eq!(rows[1].total().to_string(), "30.00 €");
    }
}
