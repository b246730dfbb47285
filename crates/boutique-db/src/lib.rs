//! # boutique-db: Database Layer for the Boutique Storefront
//!
//! This crate provides database access for the storefront.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (GET /catalogue/, POST /panier/commander/, ...)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   boutique-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CartRepo       │    │ 0001_init    │  │   │
//! │  │   │ Connection    │    │ OrderRepo      │    │ 0002_promo   │  │   │
//! │  │   │ Management    │    │ SaleRepo       │    │              │  │   │
//! │  │   └───────────────┘    │ StatsRepo      │    └──────────────┘  │   │
//! │  │                        └────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, cart, order, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boutique_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/boutique.db");
//! let db = Database::new(config).await?;
//!
//! let page = db.catalog().list_products(&CatalogFilter::default()).await?;
//! let order = db.orders().checkout("user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::{CartLineDetail, CartRepository};
pub use repository::catalog::{CatalogFilter, CatalogRepository, ProductDetail, ProductPage};
pub use repository::order::{CheckoutError, CheckoutResult, OrderLine, OrderRepository};
pub use repository::sale::{SaleExportRow, SaleRepository};
pub use repository::stats::{DashboardStats, StatsRepository};
