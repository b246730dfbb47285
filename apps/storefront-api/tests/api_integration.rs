//! Integration tests for the storefront API.
//!
//! Each test builds the full router over a fresh in-memory database and
//! drives it with `tower::ServiceExt::oneshot`, so the whole stack runs:
//! extractors, handlers, repositories, SQLite. The concurrency test uses
//! a file-backed database because a true checkout race needs more than
//! one connection.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use boutique_core::Product;
use boutique_db::repository::catalog::{generate_product_id, new_category};
use boutique_db::{Database, DbConfig};
use storefront_api::config::ApiConfig;
use storefront_api::{create_app, AppState};

// =============================================================================
// Test Setup
// =============================================================================

fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_path: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_lifetime_secs: 3600,
        page_size: 12,
        log_filter: "info".to_string(),
    }
}

async fn setup() -> (axum::Router, Arc<AppState>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let state = Arc::new(AppState::new(db, test_config()));
    let app = create_app(state.clone());
    (app, state)
}

fn test_product(name: &str, category_id: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        name: name.to_string(),
        description: String::new(),
        category_id: category_id.to_string(),
        variant_id: None,
        purchase_price_cents: price_cents / 2,
        sale_price_cents: price_cents,
        stock_quantity: stock,
        minimum_stock: 5,
        barcode: None,
        image_path: None,
        on_promotion: false,
        promo_price_cents: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Seeds one category with two products. Returns (category, A, B) ids.
/// Produit A: 150.00, stock 10. Produit B: 300.00, stock 5.
async fn seed_catalog(state: &AppState) -> (String, String, String) {
    let category = new_category("Boissons", "");
    state.db.catalog().insert_category(&category).await.unwrap();

    let a = test_product("Produit A", &category.id, 15_000, 10);
    let b = test_product("Produit B", &category.id, 30_000, 5);
    state.db.catalog().insert_product(&a).await.unwrap();
    state.db.catalog().insert_product(&b).await.unwrap();

    (category.id, a.id, b.id)
}

fn user_token(state: &AppState) -> String {
    state
        .jwt
        .generate_access_token("user-1", "alice", false)
        .unwrap()
}

fn staff_token(state: &AppState) -> String {
    state
        .jwt
        .generate_access_token("admin-1", "admin", true)
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_auth(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_auth_empty(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Adds a product to the user's cart and asserts success.
async fn add_to_cart(app: &axum::Router, token: &str, product_id: &str, quantity: i64) {
    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/ajouter/{product_id}/"),
            token,
            serde_json::json!({ "quantite": quantity }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Health & Home
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");
    assert_eq!(json["service"], "storefront-api");
}

#[tokio::test]
async fn test_home_anonymous_gets_welcome() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Bienvenue à la boutique");
}

#[tokio::test]
async fn test_home_authenticated_redirects_to_catalog() {
    let (app, state) = setup().await;
    let token = user_token(&state);

    let response = app.oneshot(get_auth("/", &token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/catalogue/");
}

#[tokio::test]
async fn test_home_invalid_token_treated_as_anonymous() {
    let (app, _) = setup().await;

    let response = app
        .oneshot(get_auth("/", "not-a-valid-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_listing() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;

    let response = app.oneshot(get("/catalogue/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageCount"], 1);
    assert_eq!(json["products"].as_array().unwrap().len(), 2);
    assert_eq!(json["categories"].as_array().unwrap().len(), 1);

    let first = &json["products"][0];
    assert_eq!(first["name"], "Produit A");
    assert_eq!(first["priceCents"], 15_000);
    assert_eq!(first["stockQuantity"], 10);
    // Purchase price is internal; it must never appear on public routes
    assert!(first.get("purchasePriceCents").is_none());
}

#[tokio::test]
async fn test_catalog_search_filter() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;

    let response = app
        .oneshot(get("/catalogue/?recherche=A"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["products"][0]["name"], "Produit A");
}

#[tokio::test]
async fn test_catalog_search_too_long_rejected() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;

    let query = "x".repeat(150);
    let response = app
        .oneshot(get(&format!("/catalogue/?recherche={query}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_failed");
}

#[tokio::test]
async fn test_catalog_category_filter() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;

    let other = new_category("Épicerie", "");
    state.db.catalog().insert_category(&other).await.unwrap();
    let c = test_product("Riz 1kg", &other.id, 4_000, 20);
    state.db.catalog().insert_product(&c).await.unwrap();

    let response = app
        .oneshot(get(&format!("/catalogue/?categorie={}", other.id)))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["products"][0]["name"], "Riz 1kg");
}

#[tokio::test]
async fn test_catalog_promotion_filter_and_display_price() {
    let (app, state) = setup().await;
    let (category_id, _, _) = seed_catalog(&state).await;

    let mut promo = test_product("Jus d'orange", &category_id, 15_000, 8);
    promo.on_promotion = true;
    promo.promo_price_cents = Some(12_000);
    state.db.catalog().insert_product(&promo).await.unwrap();

    let response = app.oneshot(get("/catalogue/?promotion=1")).await.unwrap();

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    let product = &json["products"][0];
    assert_eq!(product["name"], "Jus d'orange");
    assert_eq!(product["priceCents"], 12_000);
    assert_eq!(product["regularPriceCents"], 15_000);
    assert_eq!(product["onPromotion"], true);
    assert_eq!(product["discountPercent"], 20.0);
}

#[tokio::test]
async fn test_catalog_page_clamps() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;

    let response = app.clone().oneshot(get("/catalogue/?page=99")).await.unwrap();

    let json = body_json(response).await;
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageCount"], 1);

    // Non-numeric pages fall back to the first page instead of erroring
    let response = app.oneshot(get("/catalogue/?page=abc")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["page"], 1);
}

#[tokio::test]
async fn test_product_detail() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;

    let response = app
        .oneshot(get(&format!("/produit/{product_a}/")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["name"], "Produit A");
    assert_eq!(json["categoryName"], "Boissons");
    assert_eq!(json["priceCents"], 15_000);
}

#[tokio::test]
async fn test_inactive_product_hidden() {
    let (app, state) = setup().await;
    let (category_id, _, _) = seed_catalog(&state).await;

    let mut retired = test_product("Produit retiré", &category_id, 5_000, 3);
    retired.is_active = false;
    state.db.catalog().insert_product(&retired).await.unwrap();

    let listing = body_json(app.clone().oneshot(get("/catalogue/")).await.unwrap()).await;
    assert_eq!(listing["total"], 2);

    let response = app
        .oneshot(get(&format!("/produit/{}/", retired.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
    assert!(json["error"]["message"].is_string());
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_requires_authentication() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;

    let response = app.clone().oneshot(get("/panier/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/panier/ajouter/{product_a}/"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_add_and_view() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/ajouter/{product_a}/"),
            &token,
            serde_json::json!({ "quantite": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cart = body_json(response).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["quantity"], 2);
    assert_eq!(cart["lines"][0]["unitPriceCents"], 15_000);
    assert_eq!(cart["lines"][0]["subtotalCents"], 30_000);
    assert_eq!(cart["totalCents"], 30_000);

    // Adding the same product again merges into the existing line
    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/ajouter/{product_a}/"),
            &token,
            serde_json::json!({ "quantite": 1 }),
        ))
        .await
        .unwrap();
    let cart = body_json(response).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["quantity"], 3);
    assert_eq!(cart["totalCents"], 45_000);

    let response = app.oneshot(get_auth("/panier/", &token)).await.unwrap();
    let cart = body_json(response).await;
    assert_eq!(cart["totalCents"], 45_000);
}

#[tokio::test]
async fn test_cart_add_without_body_defaults_to_one() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .oneshot(post_auth_empty(
            &format!("/panier/ajouter/{product_a}/"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cart = body_json(response).await;
    assert_eq!(cart["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_cart_add_unknown_product() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .oneshot(post_auth(
            "/panier/ajouter/no-such-product/",
            &token,
            serde_json::json!({ "quantite": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_add_insufficient_stock() {
    let (app, state) = setup().await;
    let (_, _, product_b) = seed_catalog(&state).await;
    let token = user_token(&state);

    // Produit B has stock 5
    let response = app
        .oneshot(post_auth(
            &format!("/panier/ajouter/{product_b}/"),
            &token,
            serde_json::json!({ "quantite": 6 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "insufficient_stock");
}

#[tokio::test]
async fn test_cart_add_resulting_quantity_checked() {
    let (app, state) = setup().await;
    let (_, _, product_b) = seed_catalog(&state).await;
    let token = user_token(&state);

    // 3 + 3 exceeds stock 5 even though each request alone fits
    add_to_cart(&app, &token, &product_b, 3).await;

    let response = app
        .oneshot(post_auth(
            &format!("/panier/ajouter/{product_b}/"),
            &token,
            serde_json::json!({ "quantite": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cart_add_invalid_quantities() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);
    let uri = format!("/panier/ajouter/{product_a}/");

    for body in [
        serde_json::json!({ "quantite": 0 }),
        serde_json::json!({ "quantite": -4 }),
        serde_json::json!({ "quantite": 1000 }),
        serde_json::json!({ "quantite": 2.5 }),
        // Far beyond i64; fails deserialization rather than wrapping
        serde_json::json!({ "quantite": 1e30 }),
    ] {
        let response = app
            .clone()
            .oneshot(post_auth(&uri, &token, body.clone()))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for body {body}"
        );
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_failed");
    }
}

#[tokio::test]
async fn test_cart_malformed_json_rejected() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/panier/ajouter/{product_a}/"))
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_update_and_remove_line() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    add_to_cart(&app, &token, &product_a, 2).await;

    let cart = body_json(app.clone().oneshot(get_auth("/panier/", &token)).await.unwrap()).await;
    let line_id = cart["lines"][0]["id"].as_str().unwrap().to_string();

    // Replace the quantity
    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/modifier/{line_id}/"),
            &token,
            serde_json::json!({ "quantite": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert_eq!(cart["lines"][0]["quantity"], 5);
    assert_eq!(cart["totalCents"], 75_000);

    // Zero removes the line
    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/modifier/{line_id}/"),
            &token,
            serde_json::json!({ "quantite": 0 }),
        ))
        .await
        .unwrap();
    let cart = body_json(response).await;
    assert!(cart["lines"].as_array().unwrap().is_empty());
    assert_eq!(cart["totalCents"], 0);

    // retirer deletes unconditionally
    add_to_cart(&app, &token, &product_a, 1).await;
    let cart = body_json(app.clone().oneshot(get_auth("/panier/", &token)).await.unwrap()).await;
    let line_id = cart["lines"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_auth_empty(
            &format!("/panier/retirer/{line_id}/"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert!(cart["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_update_exceeding_stock_rejected() {
    let (app, state) = setup().await;
    let (_, _, product_b) = seed_catalog(&state).await;
    let token = user_token(&state);

    add_to_cart(&app, &token, &product_b, 2).await;
    let cart = body_json(app.clone().oneshot(get_auth("/panier/", &token)).await.unwrap()).await;
    let line_id = cart["lines"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_auth(
            &format!("/panier/modifier/{line_id}/"),
            &token,
            serde_json::json!({ "quantite": 6 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cart_line_hidden_from_other_users() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let alice = user_token(&state);
    let bob = state
        .jwt
        .generate_access_token("user-2", "bob", false)
        .unwrap();

    add_to_cart(&app, &alice, &product_a, 1).await;
    let cart = body_json(app.clone().oneshot(get_auth("/panier/", &alice)).await.unwrap()).await;
    let line_id = cart["lines"][0]["id"].as_str().unwrap().to_string();

    // Bob cannot see, modify or remove Alice's line; always 404
    let response = app
        .clone()
        .oneshot(post_auth(
            &format!("/panier/modifier/{line_id}/"),
            &bob,
            serde_json::json!({ "quantite": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(post_auth_empty(&format!("/panier/retirer/{line_id}/"), &bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice's line is untouched
    let cart = body_json(app.oneshot(get_auth("/panier/", &alice)).await.unwrap()).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_order() {
    let (app, state) = setup().await;
    let (_, product_a, product_b) = seed_catalog(&state).await;
    let token = user_token(&state);

    add_to_cart(&app, &token, &product_a, 2).await;
    add_to_cart(&app, &token, &product_b, 1).await;

    let response = app
        .clone()
        .oneshot(post_auth_empty("/panier/commander/", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = body_json(response).await;
    assert_eq!(order["totalCents"], 60_000);
    assert_eq!(order["status"], "pending");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("CMD-"));
    assert_eq!(order["lines"].as_array().unwrap().len(), 2);

    // Stock was decremented
    let detail = body_json(
        app.clone()
            .oneshot(get(&format!("/produit/{product_a}/")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["stockQuantity"], 8);

    let detail = body_json(
        app.clone()
            .oneshot(get(&format!("/produit/{product_b}/")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["stockQuantity"], 4);

    // The open cart was consumed; the next view starts a fresh one
    let cart = body_json(app.oneshot(get_auth("/panier/", &token)).await.unwrap()).await;
    assert!(cart["lines"].as_array().unwrap().is_empty());
    assert_eq!(cart["totalCents"], 0);
}

#[tokio::test]
async fn test_checkout_empty_cart_rejected() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;
    let token = user_token(&state);

    // Viewing the cart creates an empty open cart
    let response = app.clone().oneshot(get_auth("/panier/", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_auth_empty("/panier/commander/", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_failed");
}

#[tokio::test]
async fn test_checkout_without_cart_not_found() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .oneshot(post_auth_empty("/panier/commander/", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_keeps_cart_open() {
    let (app, state) = setup().await;
    let (_, _, product_b) = seed_catalog(&state).await;
    let alice = user_token(&state);
    let bob = state
        .jwt
        .generate_access_token("user-2", "bob", false)
        .unwrap();

    // Both users want 3 of Produit B (stock 5); only one can win
    add_to_cart(&app, &alice, &product_b, 3).await;
    add_to_cart(&app, &bob, &product_b, 3).await;

    let response = app
        .clone()
        .oneshot(post_auth_empty("/panier/commander/", &alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_auth_empty("/panier/commander/", &bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "insufficient_stock");

    // Bob's cart is still open with its line, now flagged against stock
    let cart = body_json(app.clone().oneshot(get_auth("/panier/", &bob)).await.unwrap()).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["exceedsStock"], true);

    // Stock reflects only the successful checkout
    let detail = body_json(
        app.oneshot(get(&format!("/produit/{product_b}/")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["stockQuantity"], 2);
}

#[tokio::test]
async fn test_checkout_total_frozen_after_reprice() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    add_to_cart(&app, &token, &product_a, 2).await;

    let order = body_json(
        app.clone()
            .oneshot(post_auth_empty("/panier/commander/", &token))
            .await
            .unwrap(),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["totalCents"], 30_000);

    // Reprice the product after the fact
    sqlx::query("UPDATE products SET sale_price_cents = 99900 WHERE id = ?1")
        .bind(&product_a)
        .execute(state.db.pool())
        .await
        .unwrap();

    let order = body_json(
        app.oneshot(get_auth(&format!("/commande/{order_id}/"), &token))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(order["totalCents"], 30_000);
    assert_eq!(order["lines"][0]["unitPriceCents"], 15_000);
}

#[tokio::test]
async fn test_concurrent_checkout_yields_one_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront.db");

    let db = Database::new(DbConfig::new(&path)).await.unwrap();
    let state = Arc::new(AppState::new(db, test_config()));
    let app = create_app(state.clone());

    let (_, product_a, _) = seed_catalog(&state).await;
    let token = user_token(&state);

    add_to_cart(&app, &token, &product_a, 2).await;

    let (first, second) = tokio::join!(
        app.clone()
            .oneshot(post_auth_empty("/panier/commander/", &token)),
        app.clone()
            .oneshot(post_auth_empty("/panier/commander/", &token)),
    );
    let statuses = [first.unwrap().status(), second.unwrap().status()];

    // Exactly one checkout wins; the loser conflicts (or, if it resolves
    // the cart after the winner commits, sees no open cart at all)
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::CREATED)
            .count(),
        1,
        "statuses: {statuses:?}"
    );
    assert!(statuses
        .iter()
        .all(|s| [StatusCode::CREATED, StatusCode::CONFLICT, StatusCode::NOT_FOUND].contains(s)));

    let orders = body_json(app.oneshot(get_auth("/mes-commandes/", &token)).await.unwrap()).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    state.db.close().await;
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_history_scoped_to_user() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let alice = user_token(&state);
    let bob = state
        .jwt
        .generate_access_token("user-2", "bob", false)
        .unwrap();

    add_to_cart(&app, &alice, &product_a, 1).await;
    let order = body_json(
        app.clone()
            .oneshot(post_auth_empty("/panier/commander/", &alice))
            .await
            .unwrap(),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Alice sees her order
    let orders = body_json(
        app.clone()
            .oneshot(get_auth("/mes-commandes/", &alice))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["totalCents"], 15_000);

    let detail = body_json(
        app.clone()
            .oneshot(get_auth(&format!("/commande/{order_id}/"), &alice))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["lines"].as_array().unwrap().len(), 1);
    assert_eq!(detail["lines"][0]["productName"], "Produit A");

    // Bob sees neither the list entry nor the detail
    let orders = body_json(
        app.clone()
            .oneshot(get_auth("/mes-commandes/", &bob))
            .await
            .unwrap(),
    )
    .await;
    assert!(orders.as_array().unwrap().is_empty());

    let response = app
        .oneshot(get_auth(&format!("/commande/{order_id}/"), &bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Dashboard & Export (staff)
// =============================================================================

#[tokio::test]
async fn test_dashboard_requires_staff() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app.clone().oneshot(get("/dashboard/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_auth("/dashboard/", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "forbidden");
}

#[tokio::test]
async fn test_dashboard_aggregates() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let user = user_token(&state);
    let staff = staff_token(&state);

    add_to_cart(&app, &user, &product_a, 2).await;
    let response = app
        .clone()
        .oneshot(post_auth_empty("/panier/commander/", &user))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_auth("/dashboard/", &staff)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["counts"]["activeProducts"], 2);
    assert_eq!(json["counts"]["activeCategories"], 1);
    assert_eq!(json["counts"]["totalOrders"], 1);
    assert_eq!(json["counts"]["validatedCarts"], 1);
    assert_eq!(json["counts"]["pendingOrders"], 1);
    assert_eq!(json["sales"]["today"]["totalCents"], 30_000);
    assert_eq!(json["sales"]["today"]["saleCount"], 1);
    assert_eq!(json["topProducts"][0]["name"], "Produit A");
    assert_eq!(json["dailyTrend"].as_array().unwrap().len(), 7);
    assert_eq!(json["dailyTrend"][6]["totalCents"], 30_000);
}

#[tokio::test]
async fn test_export_requires_staff() {
    let (app, state) = setup().await;
    seed_catalog(&state).await;
    let token = user_token(&state);

    let response = app
        .oneshot(get_auth("/export-ventes/", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_export_sales_csv() {
    let (app, state) = setup().await;
    let (_, product_a, _) = seed_catalog(&state).await;
    let user = user_token(&state);
    let staff = staff_token(&state);

    add_to_cart(&app, &user, &product_a, 2).await;
    let response = app
        .clone()
        .oneshot(post_auth_empty("/panier/commander/", &user))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get_auth("/export-ventes/", &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"ventes.csv\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = csv.lines();

    assert_eq!(
        lines.next().unwrap(),
        "Date,Produit,Catégorie,Quantité,Prix unitaire,Montant total"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("Produit A"));
    assert!(row.contains("Boissons"));
    assert!(row.ends_with(",2,150.00,300.00"));
}
