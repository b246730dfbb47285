//! # Stats Repository
//!
//! Read-only aggregation for the staff dashboard.
//!
//! ## Time Windows
//! ```text
//!                                              now
//!   ───────────────────────────────────────────┬──────► time
//!   │         │         │         │            │
//!   │ bucket3 │ bucket2 │ bucket1 │  last 30d  │   forecast = mean of
//!   │ -120d   │ -90d    │ -60d    │  -30d      │   buckets 1..3
//!
//!   today        = UTC midnight → now
//!   last 7 days  = now − 7d  → now      (rolling, not calendar)
//!   last 30 days = now − 30d → now
//!   last 365d    = now − 365d → now
//!   daily trend  = 7 calendar days, oldest first, labels dd/mm
//! ```
//!
//! Everything is recomputed per request straight from the ledger and the
//! product table. No caching, no materialized rollups: the data sets this
//! serves stay small enough that a handful of indexed scans per request is
//! cheaper than keeping aggregates consistent with checkout.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Row counts shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct EntityCounts {
    pub active_products: i64,
    pub active_categories: i64,
    pub total_orders: i64,
    pub validated_carts: i64,
    pub pending_orders: i64,
}

/// Ledger aggregate over one time window.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct PeriodSales {
    pub total_cents: i64,
    pub sale_count: i64,
}

/// Per-period sales, one entry per dashboard window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesTotals {
    pub today: PeriodSales,
    pub last_7_days: PeriodSales,
    pub last_30_days: PeriodSales,
    pub last_365_days: PeriodSales,
}

/// Rollup line for one active category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryStat {
    pub id: String,
    pub name: String,
    pub product_count: i64,
    pub stock_value_cents: i64,
    pub sales_30d_cents: i64,
}

/// One of the top products by sales amount over the last 30 days.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProduct {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub amount_cents: i64,
}

/// Sale-price spread over active products.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct PriceStats {
    pub min_cents: i64,
    pub max_cents: i64,
    pub avg_cents: f64,
}

/// Stock-level spread over active products.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct StockStats {
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub avg_quantity: f64,
}

/// Unit-margin spread (sale − purchase) over active products.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct MarginStats {
    pub min_cents: i64,
    pub max_cents: i64,
}

/// One day of the 7-day trend.
#[derive(Debug, Clone)]
pub struct DailySales {
    /// Day label, `dd/mm`.
    pub label: String,
    pub total_cents: i64,
}

/// Everything the dashboard shows, assembled in one pass.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub counts: EntityCounts,
    pub sales: SalesTotals,
    /// Σ stock × purchase price over active products.
    pub stock_value_cents: i64,
    /// Active products at or under their minimum stock.
    pub low_stock_count: i64,
    pub categories: Vec<CategoryStat>,
    pub top_products: Vec<TopProduct>,
    pub price_stats: PriceStats,
    pub stock_stats: StockStats,
    pub margin_stats: MarginStats,
    /// Mean of the three most recent full 30-day buckets before the
    /// current one. Fractional cents, rounded at the presentation layer.
    pub forecast_cents: f64,
    /// 7 entries, oldest day first.
    pub daily_trend: Vec<DailySales>,
}

/// Repository for dashboard aggregation queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Computes the full dashboard in one call.
    pub async fn dashboard(&self) -> DbResult<DashboardStats> {
        let now = Utc::now();
        let thirty_days_ago = now - Duration::days(30);

        debug!("Computing dashboard statistics");

        let counts = self.entity_counts().await?;
        let sales = SalesTotals {
            today: self.sales_since(start_of_day(now)).await?,
            last_7_days: self.sales_since(now - Duration::days(7)).await?,
            last_30_days: self.sales_since(thirty_days_ago).await?,
            last_365_days: self.sales_since(now - Duration::days(365)).await?,
        };

        let stock_value_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(stock_quantity * purchase_price_cents), 0)
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE is_active = 1 AND stock_quantity <= minimum_stock
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let categories = self.category_stats(thirty_days_ago).await?;
        let top_products = self.top_products(thirty_days_ago, 10).await?;

        let price_stats = sqlx::query_as::<_, PriceStats>(
            r#"
            SELECT COALESCE(MIN(sale_price_cents), 0) AS min_cents,
                   COALESCE(MAX(sale_price_cents), 0) AS max_cents,
                   CAST(COALESCE(AVG(sale_price_cents), 0) AS REAL) AS avg_cents
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let stock_stats = sqlx::query_as::<_, StockStats>(
            r#"
            SELECT COALESCE(MIN(stock_quantity), 0) AS min_quantity,
                   COALESCE(MAX(stock_quantity), 0) AS max_quantity,
                   CAST(COALESCE(AVG(stock_quantity), 0) AS REAL) AS avg_quantity
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let margin_stats = sqlx::query_as::<_, MarginStats>(
            r#"
            SELECT COALESCE(MIN(sale_price_cents - purchase_price_cents), 0) AS min_cents,
                   COALESCE(MAX(sale_price_cents - purchase_price_cents), 0) AS max_cents
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let forecast_cents = self.forecast(now).await?;
        let daily_trend = self.daily_trend(now).await?;

        Ok(DashboardStats {
            counts,
            sales,
            stock_value_cents,
            low_stock_count,
            categories,
            top_products,
            price_stats,
            stock_stats,
            margin_stats,
            forecast_cents,
            daily_trend,
        })
    }

    // =========================================================================
    // Component Queries
    // =========================================================================

    async fn entity_counts(&self) -> DbResult<EntityCounts> {
        let counts = sqlx::query_as::<_, EntityCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE is_active = 1) AS active_products,
                (SELECT COUNT(*) FROM categories WHERE is_active = 1) AS active_categories,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM carts WHERE status = 'validated') AS validated_carts,
                (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn sales_since(&self, since: DateTime<Utc>) -> DbResult<PeriodSales> {
        let period = sqlx::query_as::<_, PeriodSales>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) AS total_cents,
                   COUNT(*) AS sale_count
            FROM sales
            WHERE created_at >= ?1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(period)
    }

    async fn sales_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn category_stats(&self, since: DateTime<Utc>) -> DbResult<Vec<CategoryStat>> {
        let stats = sqlx::query_as::<_, CategoryStat>(
            r#"
            SELECT c.id,
                   c.name,
                   COUNT(p.id) AS product_count,
                   COALESCE(SUM(p.stock_quantity * p.purchase_price_cents), 0) AS stock_value_cents,
                   COALESCE((
                       SELECT SUM(s.total_cents)
                       FROM sales s
                       JOIN products sp ON sp.id = s.product_id
                       WHERE sp.category_id = c.id AND s.created_at >= ?1
                   ), 0) AS sales_30d_cents
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id AND p.is_active = 1
            WHERE c.is_active = 1
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn top_products(&self, since: DateTime<Utc>, limit: i64) -> DbResult<Vec<TopProduct>> {
        let top = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.id,
                   p.name,
                   SUM(s.quantity) AS quantity,
                   SUM(s.total_cents) AS amount_cents
            FROM sales s
            JOIN products p ON p.id = s.product_id
            WHERE s.created_at >= ?1
            GROUP BY p.id, p.name
            ORDER BY amount_cents DESC, p.name
            LIMIT ?2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(top)
    }

    async fn forecast(&self, now: DateTime<Utc>) -> DbResult<f64> {
        let mut sum = 0i64;
        for bucket in 1..=3i64 {
            let end = now - Duration::days(30 * bucket);
            let start = now - Duration::days(30 * (bucket + 1));
            sum += self.sales_between(start, end).await?;
        }

        Ok(sum as f64 / 3.0)
    }

    async fn daily_trend(&self, now: DateTime<Utc>) -> DbResult<Vec<DailySales>> {
        let mut trend = Vec::with_capacity(7);
        for back in (0..7i64).rev() {
            let day = now.date_naive() - Duration::days(back);
            let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
            let end = start + Duration::days(1);

            trend.push(DailySales {
                label: day.format("%d/%m").to_string(),
                total_cents: self.sales_between(start, end).await?,
            });
        }

        Ok(trend)
    }
}

/// UTC midnight of the given instant's day.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

// =============================================================================
// Unit Tests
// =============================================================================
