//! Staff dashboard endpoint.
//!
//! One read-only aggregation recomputed per request. The repository does
//! the SQL; this module only reshapes the result into camelCase JSON.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use boutique_db::DashboardStats;

use crate::auth::StaffUser;
use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsResponse {
    pub active_products: i64,
    pub active_categories: i64,
    pub total_orders: i64,
    pub validated_carts: i64,
    pub pending_orders: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSalesResponse {
    pub total_cents: i64,
    pub sale_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesResponse {
    pub today: PeriodSalesResponse,
    pub last_7_days: PeriodSalesResponse,
    pub last_30_days: PeriodSalesResponse,
    pub last_365_days: PeriodSalesResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatResponse {
    pub id: String,
    pub name: String,
    pub product_count: i64,
    pub stock_value_cents: i64,
    pub sales_30d_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductResponse {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatsResponse {
    pub min_cents: i64,
    pub max_cents: i64,
    pub avg_cents: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatsResponse {
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub avg_quantity: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginStatsResponse {
    pub min_cents: i64,
    pub max_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesResponse {
    /// Day label, `dd/mm`.
    pub label: String,
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub counts: CountsResponse,
    pub sales: SalesResponse,
    pub stock_value_cents: i64,
    pub low_stock_count: i64,
    pub categories: Vec<CategoryStatResponse>,
    pub top_products: Vec<TopProductResponse>,
    pub price_stats: PriceStatsResponse,
    pub stock_stats: StockStatsResponse,
    pub margin_stats: MarginStatsResponse,
    /// Mean of the three trailing full 30-day buckets, fractional cents.
    pub forecast_cents: f64,
    /// 7 entries, oldest day first.
    pub daily_trend: Vec<DailySalesResponse>,
}

fn dashboard_response(stats: DashboardStats) -> DashboardResponse {
    DashboardResponse {
        counts: CountsResponse {
            active_products: stats.counts.active_products,
            active_categories: stats.counts.active_categories,
            total_orders: stats.counts.total_orders,
            validated_carts: stats.counts.validated_carts,
            pending_orders: stats.counts.pending_orders,
        },
        sales: SalesResponse {
            today: PeriodSalesResponse {
                total_cents: stats.sales.today.total_cents,
                sale_count: stats.sales.today.sale_count,
            },
            last_7_days: PeriodSalesResponse {
                total_cents: stats.sales.last_7_days.total_cents,
                sale_count: stats.sales.last_7_days.sale_count,
            },
            last_30_days: PeriodSalesResponse {
                total_cents: stats.sales.last_30_days.total_cents,
                sale_count: stats.sales.last_30_days.sale_count,
            },
            last_365_days: PeriodSalesResponse {
                total_cents: stats.sales.last_365_days.total_cents,
                sale_count: stats.sales.last_365_days.sale_count,
            },
        },
        stock_value_cents: stats.stock_value_cents,
        low_stock_count: stats.low_stock_count,
        categories: stats
            .categories
            .into_iter()
            .map(|c| CategoryStatResponse {
                id: c.id,
                name: c.name,
                product_count: c.product_count,
                stock_value_cents: c.stock_value_cents,
                sales_30d_cents: c.sales_30d_cents,
            })
            .collect(),
        top_products: stats
            .top_products
            .into_iter()
            .map(|p| TopProductResponse {
                id: p.id,
                name: p.name,
                quantity: p.quantity,
                amount_cents: p.amount_cents,
            })
            .collect(),
        price_stats: PriceStatsResponse {
            min_cents: stats.price_stats.min_cents,
            max_cents: stats.price_stats.max_cents,
            avg_cents: stats.price_stats.avg_cents,
        },
        stock_stats: StockStatsResponse {
            min_quantity: stats.stock_stats.min_quantity,
            max_quantity: stats.stock_stats.max_quantity,
            avg_quantity: stats.stock_stats.avg_quantity,
        },
        margin_stats: MarginStatsResponse {
            min_cents: stats.margin_stats.min_cents,
            max_cents: stats.margin_stats.max_cents,
        },
        forecast_cents: stats.forecast_cents,
        daily_trend: stats
            .daily_trend
            .into_iter()
            .map(|d| DailySalesResponse {
                label: d.label,
                total_cents: d.total_cents,
            })
            .collect(),
    }
}

// =============================================================================
// Handler
// =============================================================================

/// GET /dashboard/ returns aggregated statistics; staff only.
#[tracing::instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let stats = state.db.stats().dashboard().await?;
    Ok(Json(dashboard_response(stats)))
}
