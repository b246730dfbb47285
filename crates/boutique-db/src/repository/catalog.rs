//! # Catalog Repository
//!
//! Database operations for categories, variants and products.
//!
//! ## Listing Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 GET /catalogue/ filter pipeline                         │
//! │                                                                         │
//! │  is_active = 1                      ← always                            │
//! │       │                                                                 │
//! │       ├── categorie=<id>           ← optional category filter           │
//! │       ├── recherche=<substring>    ← name OR description, LIKE '%…%'    │
//! │       ├── promotion=1              ← only products on promotion         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY name → LIMIT page_size OFFSET (page-1)×page_size              │
//! │                                                                         │
//! │  Substring semantics: "Eau" matches "Eau minérale" and                  │
//! │  "Pack d'eau x6" (ASCII case-insensitive, the SQLite LIKE default).     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use boutique_core::{Category, Product, Variant};

/// Filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Restrict to one category.
    pub category_id: Option<String>,

    /// Substring match against name and description.
    pub search: Option<String>,

    /// Only products currently flagged on promotion.
    pub promotion_only: bool,

    /// 1-based page number. Out-of-range values clamp.
    pub page: u32,

    /// Page size. The API layer supplies the configured value.
    pub page_size: u32,
}

/// One page of the product listing, with pagination metadata.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total matching products across all pages.
    pub total: i64,
    /// The page actually served (after clamping).
    pub page: u32,
    /// Total number of pages (at least 1).
    pub page_count: u32,
}

/// A product joined with its category and variant names, for detail views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductDetail {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: String,
    pub variant_name: Option<String>,
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Categories & Variants
    // =========================================================================

    /// Lists active categories, ordered by name.
    pub async fn categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, image_path, is_active, created_at
            FROM categories
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Inserts a category.
    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, image_path, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_path)
        .bind(category.is_active)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a variant.
    pub async fn insert_variant(&self, variant: &Variant) -> DbResult<()> {
        debug!(id = %variant.id, name = %variant.name, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO variants (id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.name)
        .bind(&variant.description)
        .bind(variant.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Lists active products with catalog filters and pagination.
    ///
    /// Out-of-range pages clamp to the last page rather than erroring, so a
    /// stale pagination link still renders something sensible.
    pub async fn list_products(&self, filter: &CatalogFilter) -> DbResult<ProductPage> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string();

        debug!(
            category = ?filter.category_id,
            search = %search,
            promotion = filter.promotion_only,
            page = filter.page,
            "Listing products"
        );

        const WHERE_CLAUSE: &str = r#"
            WHERE is_active = 1
              AND (?1 IS NULL OR category_id = ?1)
              AND (?2 = '' OR name LIKE '%' || ?2 || '%' OR description LIKE '%' || ?2 || '%')
              AND (?3 = 0 OR on_promotion = 1)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {WHERE_CLAUSE}"))
                .bind(&filter.category_id)
                .bind(&search)
                .bind(filter.promotion_only)
                .fetch_one(&self.pool)
                .await?;

        let page_size = filter.page_size.max(1);
        let page_count = ((total.max(0) as u32).div_ceil(page_size)).max(1);
        let page = filter.page.clamp(1, page_count);
        let offset = (page - 1) as i64 * page_size as i64;

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT id, name, description, category_id, variant_id,
                   purchase_price_cents, sale_price_cents,
                   stock_quantity, minimum_stock, barcode, image_path,
                   on_promotion, promo_price_cents, is_active,
                   created_at, updated_at
            FROM products
            {WHERE_CLAUSE}
            ORDER BY name, id
            LIMIT ?4 OFFSET ?5
            "#
        ))
        .bind(&filter.category_id)
        .bind(&search)
        .bind(filter.promotion_only)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProductPage {
            products,
            total,
            page,
            page_count,
        })
    }

    /// Gets an active product by id. Inactive products are invisible here,
    /// which is what makes the detail route 404 on them.
    pub async fn active_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category_id, variant_id,
                   purchase_price_cents, sale_price_cents,
                   stock_quantity, minimum_stock, barcode, image_path,
                   on_promotion, promo_price_cents, is_active,
                   created_at, updated_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product joined with category and variant names.
    pub async fn product_detail(&self, id: &str) -> DbResult<Option<ProductDetail>> {
        let detail = sqlx::query_as::<_, ProductDetail>(
            r#"
            SELECT p.id, p.name, p.description, p.category_id, p.variant_id,
                   p.purchase_price_cents, p.sale_price_cents,
                   p.stock_quantity, p.minimum_stock, p.barcode, p.image_path,
                   p.on_promotion, p.promo_price_cents, p.is_active,
                   p.created_at, p.updated_at,
                   c.name AS category_name,
                   v.name AS variant_name
            FROM products p
            JOIN categories c ON c.id = p.category_id
            LEFT JOIN variants v ON v.id = p.variant_id
            WHERE p.id = ?1 AND p.is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Inserts a product.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category_id, variant_id,
                purchase_price_cents, sale_price_cents,
                stock_quantity, minimum_stock, barcode, image_path,
                on_promotion, promo_price_cents, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.variant_id)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock_quantity)
        .bind(product.minimum_stock)
        .bind(&product.barcode)
        .bind(&product.image_path)
        .bind(product.on_promotion)
        .bind(product.promo_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts all products (active or not). Used by the seeder to stay
    /// idempotent.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new category ID.
pub fn generate_category_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new variant ID.
pub fn generate_variant_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a category with generated id and current timestamp.
pub fn new_category(name: &str, description: &str) -> Category {
    Category {
        id: generate_category_id(),
        name: name.to_string(),
        description: description.to_string(),
        image_path: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Builds a variant with generated id and current timestamp.
pub fn new_variant(name: &str, description: &str) -> Variant {
    Variant {
        id: generate_variant_id(),
        name: name.to_string(),
        description: description.to_string(),
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
