//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.   │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.catalog().list_products(&filter)                            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CatalogRepository                                                      │
//! │  ├── list_products(&self, filter)                                       │
//! │  ├── active_product(&self, id)                                          │
//! │  ├── insert_product(&self, product)                                     │
//! │  └── ...                                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • SQL is isolated in one place                                         │
//! │  • The checkout transaction has a single owner                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Categories, variants, product listing
//! - [`cart::CartRepository`] - Open-cart lifecycle and line mutations
//! - [`order::OrderRepository`] - The checkout transaction and order reads
//! - [`sale::SaleRepository`] - Sales-ledger reads (export)
//! - [`stats::StatsRepository`] - Dashboard aggregation

pub mod cart;
pub mod catalog;
pub mod order;
pub mod sale;
pub mod stats;
