//! # Seed Data Generator
//!
//! Populates a development database with products for one organization.
//!
//! ## Usage
//! ```bash
//! # 500 products for org "dev-org" (default)
//! cargo run -p pospro-db --bin seed
//!
//! # Custom amount and organization
//! cargo run -p pospro-db --bin seed -- --count 2000 --org acme
//!
//! # Specify database path
//! cargo run -p pospro-db --bin seed -- --db ./data/pospro.db
//! ```
//!
//! ## Generated Products
//! - Tracked goods across beverage, snack, dairy and grocery categories
//! - A handful of untracked services (gift wrap, delivery, bag fee)
//!
//! Each tracked product has:
//! - Unique SKU: `{CATEGORY}-{NAME}-{INDEX}`
//! - EAN-13 shaped barcode (checksum not valid)
//! - Price: 1.99 - 9.99 plus a size addon, every third one on sale
//! - Stock: 0 - 100, low-stock threshold 5
//! - VAT: 0%, 8%, 18%

use std::env;

use pospro_db::{Database, DbConfig, NewProduct};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola",
            "Pepsi",
            "Sprite",
            "Fanta",
            "Red Bull",
            "Mineral Water",
            "Orange Juice",
            "Apple Juice",
            "Iced Tea",
            "Ayran",
        ],
    ),
    (
        "SNK",
        &[
            "Potato Chips",
            "Pretzels",
            "Chocolate Bar",
            "Gummy Bears",
            "Biscuits",
            "Peanuts",
            "Popcorn",
            "Wafer",
            "Crackers",
            "Granola Bar",
        ],
    ),
    (
        "DRY",
        &[
            "Whole Milk",
            "Skim Milk",
            "Cheddar Cheese",
            "White Cheese",
            "Butter",
            "Greek Yogurt",
            "Cream",
            "Eggs",
            "Kefir",
            "Labneh",
        ],
    ),
    (
        "GRO",
        &[
            "White Bread",
            "Pasta",
            "Rice",
            "Lentils",
            "Canned Tomatoes",
            "Olive Oil",
            "Flour",
            "Sugar",
            "Tea",
            "Coffee",
        ],
    ),
];

/// Size variants and their price addon in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("Family", 350),
    ("Multipack", 500),
];

/// Untracked services: (sku, name, price cents)
const SERVICES: &[(&str, &str, i64)] = &[
    ("SRV-GIFTWRAP", "Gift Wrap", 150),
    ("SRV-DELIVERY", "Home Delivery", 1_500),
    ("SRV-BAG", "Carrier Bag", 25),
];

/// VAT rates in basis points
const VAT_RATES: &[u32] = &[0, 800, 1800];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./pospro_dev.db");
    let mut organization_id = String::from("dev-org");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--org" | "-o" => {
                if i + 1 < args.len() {
                    organization_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("PosPro Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of tracked products (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./pospro_dev.db)");
                println!("  -o, --org <ID>     Organization id (default: dev-org)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PosPro Seed Data Generator");
    println!("=============================");
    println!("Database:     {}", db_path);
    println!("Organization: {}", organization_id);
    println!("Products:     {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(&organization_id).await?;
    if existing > 0 {
        println!("⚠ Organization already has {} products", existing);
        println!("  Skipping seed to avoid duplicate SKUs.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category_code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(
                    &organization_id,
                    category_code,
                    name,
                    size_name,
                    *price_addon,
                    seed,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    for (sku, name, price_cents) in SERVICES {
        let service = NewProduct::new(&organization_id, *sku, *name, *price_cents)
            .vat_bps(1800)
            .untracked();
        if let Err(e) = db.products().insert(&service).await {
            eprintln!("Failed to insert {}: {}", sku, e);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} products and {} services in {:?}",
        generated,
        SERVICES.len(),
        elapsed
    );

    let low = db.products().low_stock(&organization_id, 1_000).await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one tracked product from a deterministic seed.
fn generate_product(
    organization_id: &str,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    let compact: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect();
    let sku = format!("{}-{}-{:04}", category, compact.to_uppercase(), seed);

    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    let mut product = NewProduct::new(
        organization_id,
        sku,
        format!("{} {}", name, size),
        price_cents,
    )
    .barcode(format!("869{:010}", seed))
    .vat_bps(VAT_RATES[seed % VAT_RATES.len()])
    .stock((seed % 101) as i64)
    .low_stock_threshold(5);

    if seed % 3 == 0 {
        product = product.sale_price(price_cents * 90 / 100);
    }

    product
}
