//! # storefront-api: HTTP API for the Boutique Storefront
//!
//! Customer-facing JSON API over axum. French route paths mirror the
//! storefront's navigation.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Flow                                    │
//! │                                                                         │
//! │  Client                                                                 │
//! │    │  Authorization: Bearer <jwt>                                       │
//! │    ▼                                                                    │
//! │  TraceLayer ──► CorsLayer ──► Router                                    │
//! │                                 │                                       │
//! │                      ┌──────────┼──────────────┐                        │
//! │                      ▼          ▼              ▼                        │
//! │                 /catalogue   /panier/*    /dashboard                    │
//! │                  (public)   (CurrentUser) (StaffUser)                   │
//! │                      │          │              │                        │
//! │                      └──────────┼──────────────┘                        │
//! │                                 ▼                                       │
//! │                      boutique-db repositories                           │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                          SQLite (WAL)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Route Map
//!
//! | Method | Path                           | Auth       |
//! |--------|--------------------------------|------------|
//! | GET    | `/`                            | optional   |
//! | GET    | `/health`                      | none       |
//! | GET    | `/catalogue/`                  | none       |
//! | GET    | `/produit/{id}/`               | none       |
//! | GET    | `/panier/`                     | user       |
//! | POST   | `/panier/ajouter/{id}/`        | user       |
//! | POST   | `/panier/modifier/{id}/`       | user       |
//! | POST   | `/panier/retirer/{id}/`        | user       |
//! | POST   | `/panier/commander/`           | user       |
//! | GET    | `/mes-commandes/`              | user       |
//! | GET    | `/commande/{id}/`              | user       |
//! | GET    | `/dashboard/`                  | staff      |
//! | GET    | `/export-ventes/`              | staff      |

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use boutique_db::Database;

use auth::JwtManager;
use config::ApiConfig;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    /// Assembles the state from a connected database and the loaded config.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState { db, jwt, config }
    }
}

/// Creates the axum application router with all routes and shared state.
///
/// Trailing slashes are part of the route paths (axum does not redirect),
/// matching the storefront's canonical URLs.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::home::index))
        .route("/health", get(routes::health::check))
        .route("/catalogue/", get(routes::catalog::list))
        .route("/produit/{id}/", get(routes::catalog::detail))
        .route("/panier/", get(routes::cart::view))
        .route("/panier/ajouter/{product_id}/", post(routes::cart::add))
        .route("/panier/modifier/{line_id}/", post(routes::cart::update))
        .route("/panier/retirer/{line_id}/", post(routes::cart::remove))
        .route("/panier/commander/", post(routes::cart::checkout))
        .route("/mes-commandes/", get(routes::orders::list))
        .route("/commande/{id}/", get(routes::orders::detail))
        .route("/dashboard/", get(routes::dashboard::stats))
        .route("/export-ventes/", get(routes::export::sales_csv))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
