//! # Demo Tenant Seeder
//!
//! Populates a database with a small warung: staff, a few ready-made
//! products, a few made-to-order products and the raw materials they use.
//!
//! ## Usage
//! ```bash
//! # Seed ./warungin.db (or WARUNGIN_DATABASE_PATH)
//! cargo run -p warungin-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p warungin-db --bin seed -- --db ./data/demo.db --tenant warung-bu-sri
//!
//! # Also ring up one order so the audit tables are not empty
//! cargo run -p warungin-db --bin seed -- --order
//! ```

use chrono::Utc;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use warungin_core::{
    ConversionRate, CreateOrderRequest, OrderLineRequest, Product, RawMaterial, Role, User,
};
use warungin_db::{DbConfig, EngineConfig, FulfillmentEngine, LinkMaterialRequest};

const DEFAULT_TENANT: &str = "warung-demo";

/// (sku, name, price, cost, tax bps, stock)
const READY_MADE: &[(&str, &str, i64, i64, u32, i64)] = &[
    ("AQUA-600", "Aqua 600ml", 4_000, 2_800, 0, 48),
    ("TEH-BTL", "Teh Botol Sosro", 5_000, 3_500, 1_100, 24),
    ("KRP-SGK", "Kerupuk Singkong", 2_000, 1_200, 0, 6),
];

/// (name, unit, stock, min level, price per unit)
const MATERIALS: &[(&str, &str, &str, &str, i64)] = &[
    ("Beras", "kg", "25", "5", 14_000),
    ("Telur", "butir", "60", "12", 2_000),
    ("Kopi Bubuk", "kg", "1.5", "0.5", 180_000),
    ("Gula Pasir", "kg", "4", "1", 16_000),
    ("Minyak Goreng", "liter", "0.8", "1", 18_000),
];

/// (sku, name, price, tax bps, recipe of (material, quantity, used unit, rate ppm))
type Recipe = &'static [(&'static str, &'static str, &'static str, i64)];
const MADE_TO_ORDER: &[(&str, &str, i64, u32, Recipe)] = &[
    (
        "NSG-TLR",
        "Nasi Goreng Telur",
        18_000,
        1_000,
        &[
            ("Beras", "200", "g", 1_000),
            ("Telur", "1", "butir", 1_000_000),
            ("Minyak Goreng", "30", "ml", 1_000),
        ],
    ),
    (
        "KOPI-TBK",
        "Kopi Tubruk",
        6_000,
        0,
        &[
            ("Kopi Bubuk", "15", "g", 1_000),
            ("Gula Pasir", "20", "g", 1_000),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,warungin_db=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut config = EngineConfig::from_env()?;
    let mut tenant_id = DEFAULT_TENANT.to_string();
    let mut place_order = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--order" | "-o" => place_order = true,
            "--help" | "-h" => {
                println!("Warungin Demo Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./warungin.db)");
                println!("  -t, --tenant <ID>      Tenant to seed (default: {DEFAULT_TENANT})");
                println!("  -o, --order            Ring up one demo order afterwards");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Warungin Demo Seeder");
    println!("====================");
    println!("Database: {}", config.db.database_path.display());
    println!("Tenant:   {tenant_id}");
    println!();

    let engine = FulfillmentEngine::connect(config).await?;
    let db = engine.db();

    let existing = db.products().count(&tenant_id).await?;
    if existing > 0 {
        println!("Tenant already has {existing} products, skipping seed.");
        return Ok(());
    }

    let now = Utc::now();

    let mut cashier_id = String::new();
    for (name, role) in [
        ("Sari", Role::Cashier),
        ("Budi", Role::Manager),
        ("Bu Sri", Role::Owner),
    ] {
        let user = User {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            name: name.to_string(),
            role,
            is_active: true,
        };
        db.users().insert(&user).await?;
        if user.role == Role::Cashier {
            cashier_id = user.id.clone();
        }
    }
    println!("Created 3 users");

    let mut ready_ids = Vec::new();
    for &(sku, name, price_cents, cost_cents, tax_rate_bps, stock_qty) in READY_MADE {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            sku: sku.to_string(),
            name: name.to_string(),
            price_cents,
            cost_cents,
            tax_rate_bps,
            stock_qty,
            use_material_stock: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        ready_ids.push(product.id);
    }
    println!("Created {} ready-made products", READY_MADE.len());

    let mut materials = Vec::new();
    for &(name, unit, stock, min, unit_price_cents) in MATERIALS {
        let material = RawMaterial {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            name: name.to_string(),
            unit: unit.to_string(),
            stock_qty: stock.parse()?,
            min_stock_level: min.parse()?,
            unit_price_cents,
            created_at: now,
            updated_at: now,
        };
        db.materials().insert(&material).await?;
        materials.push(material);
    }
    println!("Created {} raw materials", MATERIALS.len());

    let mut made_ids = Vec::new();
    for &(sku, name, price_cents, tax_rate_bps, recipe) in MADE_TO_ORDER {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            sku: sku.to_string(),
            name: name.to_string(),
            price_cents,
            cost_cents: 0,
            tax_rate_bps,
            stock_qty: 0,
            use_material_stock: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;

        for &(material_name, quantity, used_unit, rate_ppm) in recipe {
            let Some(material) = materials.iter().find(|m| m.name == material_name) else {
                continue;
            };
            engine
                .link_material(
                    &tenant_id,
                    None,
                    LinkMaterialRequest {
                        product_id: product.id.clone(),
                        material_id: material.id.clone(),
                        quantity_used: quantity.parse()?,
                        used_unit: used_unit.to_string(),
                        conversion_rate: Some(ConversionRate::from_ppm(rate_ppm)),
                    },
                )
                .await?;
        }
        made_ids.push(product.id);
    }
    println!("Created {} made-to-order products", MADE_TO_ORDER.len());

    for product_id in &made_ids {
        let stock = engine.available_stock(&tenant_id, product_id).await?;
        info!(product_id = %product_id, available = stock.available, "Sellable from materials");
    }

    if place_order {
        let mut items: Vec<OrderLineRequest> = made_ids
            .iter()
            .map(|product_id| OrderLineRequest {
                product_id: product_id.clone(),
                quantity: 1,
            })
            .collect();
        if let Some(first) = ready_ids.first() {
            items.push(OrderLineRequest {
                product_id: first.clone(),
                quantity: 2,
            });
        }

        let order = engine
            .create_order(
                &tenant_id,
                &cashier_id,
                CreateOrderRequest {
                    items,
                    ..Default::default()
                },
            )
            .await?;
        println!(
            "Placed {} (order #{}) for {}",
            order.transaction.invoice_number,
            order.transaction.order_number,
            order.transaction.total()
        );
    }

    let summary = engine.inventory_summary(&tenant_id).await?;
    println!();
    println!(
        "Inventory: {} products, {} ok, {} low, {} out",
        summary.total_products, summary.ok_count, summary.low_stock_count, summary.out_of_stock_count
    );
    let alerts = engine.material_alerts(&tenant_id).await?;
    println!(
        "Material alerts: {} low, {} out",
        alerts.low_stock.len(),
        alerts.out_of_stock.len()
    );
    println!();
    println!("Seed complete!");

    Ok(())
}
