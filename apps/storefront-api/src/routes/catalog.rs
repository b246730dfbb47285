//! Catalog browsing endpoints.
//!
//! Public (no authentication): the catalog is the storefront window.
//! Purchase prices and margins never appear in these responses.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use boutique_core::validation::validate_search_query;
use boutique_core::{Category, CoreError, Product};
use boutique_db::CatalogFilter;

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Query string of `GET /catalogue/`. Parameter names match the French UI.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Category id filter.
    pub categorie: Option<String>,

    /// Substring search against name and description.
    pub recherche: Option<String>,

    /// Any non-empty value restricts the listing to promotions.
    pub promotion: Option<String>,

    /// 1-based page. Non-numeric values fall back to page 1, out-of-range
    /// values clamp to the last page.
    pub page: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: String,
    /// What the buyer pays now (promo-aware).
    pub price_cents: i64,
    /// Regular sale price, shown struck through while discounted.
    pub regular_price_cents: i64,
    pub on_promotion: bool,
    pub discount_percent: Option<f64>,
    pub stock_quantity: i64,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPageResponse {
    pub products: Vec<ProductResponse>,
    pub categories: Vec<CategoryResponse>,
    pub total: i64,
    pub page: u32,
    pub page_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub category_name: String,
    pub variant_name: Option<String>,
}

fn category_response(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        description: category.description,
        image_path: category.image_path,
    }
}

fn product_response(product: Product) -> ProductResponse {
    let price_cents = product.display_price().cents();
    let discount_percent = product.discount_percent();

    ProductResponse {
        id: product.id,
        name: product.name,
        description: product.description,
        category_id: product.category_id,
        price_cents,
        regular_price_cents: product.sale_price_cents,
        on_promotion: product.on_promotion,
        discount_percent,
        stock_quantity: product.stock_quantity,
        image_path: product.image_path,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /catalogue/ returns the paginated active-product listing with filters.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPageResponse>, ApiError> {
    let search = match query.recherche.as_deref() {
        Some(raw) => {
            let cleaned = validate_search_query(raw).map_err(CoreError::from)?;
            (!cleaned.is_empty()).then_some(cleaned)
        }
        None => None,
    };

    let filter = CatalogFilter {
        category_id: query.categorie.filter(|c| !c.is_empty()),
        search,
        promotion_only: query.promotion.as_deref().is_some_and(|v| !v.is_empty()),
        page: query
            .page
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(1),
        page_size: state.config.page_size,
    };

    let page = state.db.catalog().list_products(&filter).await?;
    let categories = state.db.catalog().categories().await?;

    Ok(Json(CatalogPageResponse {
        products: page.products.into_iter().map(product_response).collect(),
        categories: categories.into_iter().map(category_response).collect(),
        total: page.total,
        page: page.page,
        page_count: page.page_count,
    }))
}

/// GET /produit/{id}/ returns one product in detail; 404 when missing or inactive.
#[tracing::instrument(skip(state))]
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let detail = state
        .db
        .catalog()
        .product_detail(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id))?;

    Ok(Json(ProductDetailResponse {
        product: product_response(detail.product),
        category_name: detail.category_name,
        variant_name: detail.variant_name,
    }))
}
