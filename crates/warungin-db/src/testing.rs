//! Fixtures shared by the unit tests of this crate.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use warungin_core::clock::ManualClock;
use warungin_core::{ConversionRate, MaterialQty, Product, ProductMaterial, RawMaterial, Role, User};

use crate::config::EngineSettings;
use crate::engine::FulfillmentEngine;
use crate::pool::{Database, DbConfig};
use crate::repository::RecipeRepository;

pub(crate) const TENANT: &str = "warung-test";
pub(crate) const CASHIER: &str = "7b0f1c52-3e4a-4d8e-9a61-2f5c9e0d1a11";

/// 10:00 in Jakarta.
pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) async fn db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) async fn engine() -> (FulfillmentEngine, Arc<ManualClock>) {
    engine_with(EngineSettings::default()).await
}

pub(crate) async fn engine_with(settings: EngineSettings) -> (FulfillmentEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let engine = FulfillmentEngine::with_clock(db().await, settings, clock.clone());
    (engine, clock)
}

fn product(sku: &str, price_cents: i64, stock_qty: i64) -> Product {
    Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        sku: sku.to_string(),
        name: sku.to_string(),
        price_cents,
        cost_cents: 0,
        tax_rate_bps: 0,
        stock_qty,
        use_material_stock: false,
        is_active: true,
        created_at: start(),
        updated_at: start(),
    }
}

async fn save_product(db: &Database, product: Product) -> Product {
    db.products().insert(&product).await.expect("insert product");
    product
}

pub(crate) async fn manual_product(db: &Database, sku: &str, price: i64, stock: i64) -> Product {
    save_product(db, product(sku, price, stock)).await
}

pub(crate) async fn product_with_tax(
    db: &Database,
    sku: &str,
    price: i64,
    tax_bps: u32,
    stock: i64,
) -> Product {
    let mut p = product(sku, price, stock);
    p.tax_rate_bps = tax_bps;
    save_product(db, p).await
}

pub(crate) async fn manual_product_costing(
    db: &Database,
    sku: &str,
    price: i64,
    cost: i64,
    stock: i64,
) -> Product {
    let mut p = product(sku, price, stock);
    p.cost_cents = cost;
    save_product(db, p).await
}

pub(crate) async fn material_product(db: &Database, sku: &str, price: i64) -> Product {
    let mut p = product(sku, price, 0);
    p.use_material_stock = true;
    save_product(db, p).await
}

async fn save_material(db: &Database, name: &str, stock: &str, min: &str, unit_price: i64) -> RawMaterial {
    let material = RawMaterial {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        name: name.to_string(),
        unit: "kg".to_string(),
        stock_qty: stock.parse().expect("material stock"),
        min_stock_level: min.parse().expect("material minimum"),
        unit_price_cents: unit_price,
        created_at: start(),
        updated_at: start(),
    };
    db.materials().insert(&material).await.expect("insert material");
    material
}

pub(crate) async fn material(db: &Database, name: &str, stock: &str) -> RawMaterial {
    save_material(db, name, stock, "0", 0).await
}

pub(crate) async fn material_priced(
    db: &Database,
    name: &str,
    stock: &str,
    unit_price: i64,
) -> RawMaterial {
    save_material(db, name, stock, "0", unit_price).await
}

pub(crate) async fn material_with_min(db: &Database, name: &str, stock: &str, min: &str) -> RawMaterial {
    save_material(db, name, stock, min, 0).await
}

/// Links `qty` (in grams or kilograms, per `rate_ppm`) of a material into a recipe.
pub(crate) async fn link(
    db: &Database,
    product_id: &str,
    material_id: &str,
    qty: &str,
    rate_ppm: i64,
) -> ProductMaterial {
    let quantity: MaterialQty = qty.parse().expect("link quantity");
    let unit = if rate_ppm == 1_000_000 { "kg" } else { "g" };
    let mut conn = db.pool().acquire().await.expect("connection");
    RecipeRepository::upsert_link(
        &mut conn,
        product_id,
        material_id,
        quantity,
        unit,
        ConversionRate::from_ppm(rate_ppm),
        start(),
    )
    .await
    .expect("insert link")
}

pub(crate) async fn user(db: &Database, role: Role, is_active: bool) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        name: format!("{} test", role.as_str()),
        role,
        is_active,
    };
    db.users().insert(&user).await.expect("insert user");
    user
}
