//! # Seed Data Generator
//!
//! Populates the database with a small French boutique catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p boutique-db --bin seed
//!
//! # Specify database path
//! cargo run -p boutique-db --bin seed -- --db ./data/boutique.db
//! ```
//!
//! ## Generated Data
//! - 5 categories (Boissons, Épicerie, Snacks, Produits laitiers, Hygiène)
//! - A handful of size/packaging variants
//! - ~50 products with purchase/sale prices in cents, deterministic stock
//!   levels and barcodes, and every fifth product on promotion
//!
//! Seeding is skipped when the database already contains products, so the
//! binary is safe to run repeatedly.

use std::env;

use chrono::Utc;

use boutique_core::Product;
use boutique_db::repository::catalog::{generate_product_id, new_category, new_variant};
use boutique_db::{Database, DbConfig};

/// Categories with their products: (name, purchase cents, sale cents).
const CATEGORIES: &[(&str, &str, &[(&str, i64, i64)])] = &[
    (
        "Boissons",
        "Eaux, sodas, jus et boissons chaudes",
        &[
            ("Eau minérale 1.5L", 30, 80),
            ("Eau gazeuse 1L", 40, 110),
            ("Jus d'orange 1L", 120, 250),
            ("Jus de pomme 1L", 110, 230),
            ("Soda cola 33cl", 35, 120),
            ("Soda citron 33cl", 35, 120),
            ("Thé glacé pêche 1L", 90, 210),
            ("Café moulu 250g", 280, 520),
            ("Thé vert 20 sachets", 150, 320),
            ("Sirop de menthe 75cl", 180, 380),
        ],
    ),
    (
        "Épicerie",
        "Produits secs et conserves",
        &[
            ("Riz parfumé 1kg", 140, 320),
            ("Pâtes torsades 500g", 60, 150),
            ("Pâtes spaghetti 500g", 60, 150),
            ("Farine de blé 1kg", 70, 160),
            ("Sucre en poudre 1kg", 90, 190),
            ("Huile de tournesol 1L", 220, 420),
            ("Conserve de tomates 400g", 60, 140),
            ("Conserve de maïs 300g", 70, 160),
            ("Lentilles vertes 500g", 110, 240),
            ("Miel de fleurs 250g", 320, 650),
            ("Confiture de fraises 370g", 180, 390),
            ("Céréales au chocolat 375g", 210, 450),
        ],
    ),
    (
        "Snacks",
        "Biscuits, chips et confiseries",
        &[
            ("Chips nature 135g", 80, 190),
            ("Chips barbecue 135g", 85, 200),
            ("Biscuits sablés 200g", 95, 220),
            ("Cookies pépites 200g", 120, 280),
            ("Barre chocolatée", 40, 110),
            ("Bonbons assortis 250g", 130, 290),
            ("Cacahuètes grillées 200g", 110, 250),
            ("Crackers salés 100g", 70, 170),
        ],
    ),
    (
        "Produits laitiers",
        "Lait, fromages et yaourts",
        &[
            ("Lait demi-écrémé 1L", 60, 130),
            ("Lait entier 1L", 65, 140),
            ("Yaourt nature x4", 90, 210),
            ("Yaourt aux fruits x4", 110, 250),
            ("Beurre doux 250g", 180, 350),
            ("Crème fraîche 20cl", 90, 200),
            ("Fromage râpé 200g", 160, 340),
            ("Camembert 250g", 170, 360),
        ],
    ),
    (
        "Hygiène",
        "Soin et entretien du quotidien",
        &[
            ("Savon de Marseille 300g", 110, 260),
            ("Gel douche 250ml", 140, 320),
            ("Shampooing 300ml", 160, 380),
            ("Dentifrice 75ml", 90, 220),
            ("Brosse à dents", 60, 160),
            ("Mouchoirs x10", 80, 180),
            ("Papier toilette x6", 190, 420),
            ("Lessive liquide 1.5L", 380, 790),
        ],
    ),
];

/// Packaging variants, assigned to every third product.
const VARIANTS: &[(&str, &str)] = &[
    ("Format standard", "Conditionnement individuel"),
    ("Lot de 2", "Deux unités sous film"),
    ("Format familial", "Grand conditionnement"),
    ("Pack découverte", "Assortiment promotionnel"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./boutique_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Boutique Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./boutique_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Boutique Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.catalog().count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let start = std::time::Instant::now();

    let mut variant_ids = Vec::with_capacity(VARIANTS.len());
    for (name, description) in VARIANTS {
        let variant = new_variant(name, description);
        db.catalog().insert_variant(&variant).await?;
        variant_ids.push(variant.id);
    }
    println!("  {} variants", variant_ids.len());

    let mut generated = 0usize;
    for (name, description, products) in CATEGORIES {
        let category = new_category(name, description);
        db.catalog().insert_category(&category).await?;

        for (product_name, purchase_cents, sale_cents) in *products {
            let product = generate_product(
                &category.id,
                &variant_ids,
                product_name,
                *purchase_cents,
                *sale_cents,
                generated,
            );

            if let Err(e) = db.catalog().insert_product(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            generated += 1;
        }

        println!("  {} ({} products)", name, products.len());
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Seeded {} products across {} categories in {:?}",
        generated,
        CATEGORIES.len(),
        elapsed
    );

    let page = db
        .catalog()
        .list_products(&boutique_db::CatalogFilter {
            promotion_only: true,
            page: 1,
            page_size: 100,
            ..Default::default()
        })
        .await?;
    println!("  {} products on promotion", page.total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a single product with deterministic stock, barcode and promotion
/// assignment, so repeated seeds of a fresh database produce the same
/// catalog.
fn generate_product(
    category_id: &str,
    variant_ids: &[String],
    name: &str,
    purchase_cents: i64,
    sale_cents: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // Every third product carries a packaging variant
    let variant_id = if seed % 3 == 0 {
        Some(variant_ids[seed / 3 % variant_ids.len()].clone())
    } else {
        None
    };

    // Stock 5-64, low for some products so the dashboard has data
    let stock_quantity = 5 + ((seed * 7) % 60) as i64;

    // EAN-13 style barcode with a French prefix (checksum not valid)
    let barcode = Some(format!("300{:010}", seed + 1));

    // Every fifth product on promotion at 15% off
    let (on_promotion, promo_price_cents) = if seed % 5 == 4 {
        (true, Some(sale_cents * 85 / 100))
    } else {
        (false, None)
    };

    Product {
        id: generate_product_id(),
        name: name.to_string(),
        description: format!("{name}, référence boutique."),
        category_id: category_id.to_string(),
        variant_id,
        purchase_price_cents: purchase_cents,
        sale_price_cents: sale_cents,
        stock_quantity,
        minimum_stock: 10,
        barcode,
        image_path: None,
        on_promotion,
        promo_price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
