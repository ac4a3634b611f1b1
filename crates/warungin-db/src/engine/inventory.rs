//! Read-only stock views. Nothing here opens a transaction.

use std::collections::HashMap;

use tracing::debug;

use warungin_core::availability::{self, AvailableStock};
use warungin_core::inventory::{
    CostBreakdown, InventoryFilter, InventoryItem, InventorySummary, MaterialAlerts,
};
use warungin_core::{CoreError, Product, RecipeComponent};

use super::FulfillmentEngine;
use crate::error::EngineResult;

impl FulfillmentEngine {
    /// Sellable quantity of one product with its per-material breakdown.
    pub async fn available_stock(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> EngineResult<AvailableStock> {
        let product = self.product(tenant_id, product_id).await?;
        let components = self.db.recipes().components(tenant_id, product_id).await?;
        Ok(availability::available_stock(&product, &components))
    }

    /// Inventory listing ordered by name.
    pub async fn inventory(
        &self,
        tenant_id: &str,
        filter: InventoryFilter,
    ) -> EngineResult<Vec<InventoryItem>> {
        let products = self
            .db
            .products()
            .list(tenant_id, filter.include_inactive)
            .await?;

        let mut recipes: HashMap<String, Vec<RecipeComponent>> = HashMap::new();
        for row in self.db.recipes().all_components(tenant_id).await? {
            recipes.entry(row.product_id).or_default().push(row.component);
        }

        let threshold = self.settings.low_stock_threshold;
        let items: Vec<InventoryItem> = products
            .iter()
            .map(|product| {
                let components = recipes.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
                let available = availability::available_stock(product, components);
                InventoryItem::build(product, components, &available, threshold)
            })
            .filter(|item| filter.matches(item))
            .collect();

        debug!(tenant_id = %tenant_id, count = items.len(), "Built inventory listing");
        Ok(items)
    }

    /// Counts by status and total stock value over active products.
    pub async fn inventory_summary(&self, tenant_id: &str) -> EngineResult<InventorySummary> {
        let items = self.inventory(tenant_id, InventoryFilter::default()).await?;
        Ok(InventorySummary::from_items(&items))
    }

    pub async fn material_alerts(&self, tenant_id: &str) -> EngineResult<MaterialAlerts> {
        let materials = self.db.materials().list(tenant_id).await?;
        Ok(MaterialAlerts::from_materials(&materials))
    }

    /// What one unit of the product costs to make, and its margin.
    pub async fn product_cost(&self, tenant_id: &str, product_id: &str) -> EngineResult<CostBreakdown> {
        let product = self.product(tenant_id, product_id).await?;
        let components = self.db.recipes().components(tenant_id, product_id).await?;
        Ok(CostBreakdown::compute(&product, &components))
    }

    async fn product(&self, tenant_id: &str, product_id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get(tenant_id, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;
    use crate::testing;
    use warungin_core::inventory::{InventoryFilter, StockStatus};
    use warungin_core::MaterialQty;

    #[tokio::test]
    async fn test_available_stock_breakdown() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let product = testing::material_product(db, "MARTABAK", 30_000).await;
        let flour = testing::material(db, "Tepung", "2").await;
        let eggs = testing::material(db, "Telur", "30").await;
        testing::link(db, &product.id, &flour.id, "250", 1_000).await; // 0.25 kg
        testing::link(db, &product.id, &eggs.id, "4", 1_000_000).await;

        let stock = engine.available_stock(testing::TENANT, &product.id).await.unwrap();
        assert!(stock.use_material_stock);
        assert_eq!(stock.available, 7);
        let can_make: Vec<i64> = stock.materials.iter().map(|m| m.can_make).collect();
        assert_eq!(can_make, [8, 7]);
        assert_eq!(stock.materials[0].actual_usage, "0.25".parse().unwrap());

        let manual = testing::manual_product(db, "AQUA", 4_000, 12).await;
        let stock = engine.available_stock(testing::TENANT, &manual.id).await.unwrap();
        assert_eq!(stock.available, 12);
        assert!(stock.materials.is_empty());

        let err = engine.available_stock("other", &manual.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_material_product_without_links_is_out() {
        let (engine, _clock) = testing::engine().await;
        let product = testing::material_product(engine.db(), "KOSONG", 1_000).await;
        let stock = engine.available_stock(testing::TENANT, &product.id).await.unwrap();
        assert_eq!(stock.available, 0);
    }

    #[tokio::test]
    async fn test_inventory_listing_and_summary() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let plenty = testing::manual_product_costing(db, "AIR", 3_000, 1_000, 40).await;
        let low = testing::manual_product_costing(db, "SUSU", 8_000, 5_000, 3).await;
        let out = testing::manual_product_costing(db, "YOGURT", 9_000, 6_000, 0).await;
        let bread = testing::material_product(db, "ROTI", 10_000).await;
        let flour = testing::material_priced(db, "Tepung", "6", 12_000).await;
        testing::link(db, &bread.id, &flour.id, "0.5", 1_000_000).await;

        let items = engine.inventory(testing::TENANT, InventoryFilter::default()).await.unwrap();
        let by_sku = |sku: &str| items.iter().find(|i| i.sku == sku).unwrap().clone();

        assert_eq!(by_sku("AIR").status, StockStatus::Ok);
        assert_eq!(by_sku("SUSU").status, StockStatus::Low);
        assert_eq!(by_sku("YOGURT").status, StockStatus::Out);

        let roti = by_sku("ROTI");
        assert_eq!(roti.available_stock, 12);
        assert_eq!(roti.status, StockStatus::Ok);
        // no stored cost: 0.5 kg at 12_000 per kg
        assert_eq!(roti.unit_cost_cents, 6_000);
        assert_eq!(roti.stock_value_cents, 72_000);

        let summary = engine.inventory_summary(testing::TENANT).await.unwrap();
        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.ok_count, 2);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.out_of_stock_count, 1);
        assert_eq!(summary.total_stock_value_cents, 40 * 1_000 + 3 * 5_000 + 72_000);

        let filtered = engine
            .inventory(
                testing::TENANT,
                InventoryFilter {
                    status: Some(StockStatus::Low),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].product_id, low.id);

        let searched = engine
            .inventory(
                testing::TENANT,
                InventoryFilter {
                    search: Some("yog".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].product_id, out.id);
        assert_ne!(plenty.id, out.id);
    }

    #[tokio::test]
    async fn test_material_alerts() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        testing::material_with_min(db, "Gula", "0.5", "1").await;
        testing::material_with_min(db, "Garam", "0", "1").await;
        testing::material_with_min(db, "Tepung", "10", "1").await;

        let alerts = engine.material_alerts(testing::TENANT).await.unwrap();
        assert_eq!(alerts.low_stock.len(), 1);
        assert_eq!(alerts.low_stock[0].name, "Gula");
        assert_eq!(alerts.out_of_stock.len(), 1);
        assert_eq!(alerts.out_of_stock[0].stock_qty, MaterialQty::zero());
    }

    #[tokio::test]
    async fn test_product_cost() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let coffee = testing::material_product(db, "KOPI-SUSU", 18_000).await;
        let beans = testing::material_priced(db, "Kopi", "5", 250_000).await;
        let milk = testing::material_priced(db, "Susu", "10", 20_000).await;
        testing::link(db, &coffee.id, &beans.id, "0.018", 1_000_000).await;
        testing::link(db, &coffee.id, &milk.id, "0.15", 1_000_000).await;

        let cost = engine.product_cost(testing::TENANT, &coffee.id).await.unwrap();
        assert_eq!(cost.lines.len(), 2);
        assert_eq!(cost.lines[0].cost_cents, 4_500);
        assert_eq!(cost.lines[1].cost_cents, 3_000);
        assert_eq!(cost.total_cost_cents, 7_500);
        assert_eq!(cost.margin_cents, 10_500);
    }
}
