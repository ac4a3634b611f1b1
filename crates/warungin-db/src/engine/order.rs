//! # Order Processor
//!
//! Checkout as one unit of work.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CreateOrderRequest                                                     │
//! │       │ validate_order_request (cart size, quantities, amounts)        │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │ next_order_number  ← first write, holds the lock from here     │
//! │       │ next_invoice_seq                                                │
//! │       ▼                                                                 │
//! │  for each line (1-based):                                               │
//! │       │ load product ─────────── missing → "line n: Product … not found"│
//! │       │ product stock −qty ───── manual & short → InsufficientStock     │
//! │       │ recipe materials −usage ─ short → InsufficientMaterial          │
//! │       │                           no usable link → InsufficientStock    │
//! │       │ price line (subtotal, per-line tax)                             │
//! │       ▼                                                                 │
//! │  totals (discount ≤ subtotal, tax override)                             │
//! │       │ INSERT transaction + items                                      │
//! │       ▼                                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};
use uuid::Uuid;

use warungin_core::material::StockDirection;
use warungin_core::pricing::{price_line, summarize};
use warungin_core::sequence::{day_key, format_invoice_number};
use warungin_core::validation::{validate_order_request, validate_uuid};
use warungin_core::{
    CoreError, CreateOrderRequest, Money, OrderDetail, Transaction, TransactionItem,
    TransactionStatus,
};

use super::stock;
use super::FulfillmentEngine;
use crate::error::{EngineError, EngineResult};
use crate::repository::{sequence, ProductRepository, TransactionRepository};

impl FulfillmentEngine {
    /// Rings up a sale.
    ///
    /// Either everything happens (stock, materials, counters, transaction,
    /// items) or nothing does.
    pub async fn create_order(
        &self,
        tenant_id: &str,
        user_id: &str,
        request: CreateOrderRequest,
    ) -> EngineResult<OrderDetail> {
        validate_order_request(&request)?;
        validate_uuid("user_id", user_id)?;

        let now = self.now();
        let day = self.business_day(now);
        let business_day = day_key(day);

        let mut tx = self.db.pool().begin().await?;

        let order_number = sequence::next_order_number(&mut *tx, tenant_id, &business_day).await?;
        let invoice_seq = sequence::next_invoice_seq(&mut *tx, &business_day).await?;

        let mut lines = Vec::with_capacity(request.items.len());
        for (idx, line) in request.items.iter().enumerate() {
            let line_no = idx + 1;

            let product = ProductRepository::find(&mut *tx, tenant_id, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()).at_line(line_no))?;

            stock::move_product_stock(
                &mut *tx,
                tenant_id,
                &product,
                line.quantity,
                StockDirection::Deduct,
                now,
            )
            .await
            .map_err(|e: EngineError| e.at_line(line_no))?;

            let deltas = stock::apply_recipe(
                &mut *tx,
                tenant_id,
                &product.id,
                line.quantity,
                StockDirection::Deduct,
                self.settings.allow_negative_material_stock,
                now,
            )
            .await
            .map_err(|e: EngineError| e.at_line(line_no))?;

            // Availability reports 0 for a recipe with no usable link.
            if product.use_material_stock && deltas.is_empty() {
                warn!(product_id = %product.id, "Material-driven product has no usable recipe");
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: 0,
                    requested: line.quantity,
                }
                .at_line(line_no)
                .into());
            }

            debug!(line = line_no, product_id = %product.id, quantity = line.quantity, "Line reserved");
            lines.push(price_line(line_no as i64, &product, line.quantity));
        }

        let totals = summarize(
            &lines,
            Money::from_cents(request.discount_cents),
            request.tax_override_cents.map(Money::from_cents),
        )?;

        let sale = Transaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            invoice_number: format_invoice_number(day, invoice_seq),
            order_number,
            business_day,
            user_id: user_id.to_string(),
            customer_id: request.customer_id,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            status: TransactionStatus::Completed,
            payment_method: request.payment_method,
            created_at: now,
            updated_at: now,
        };
        TransactionRepository::insert(&mut *tx, &sale).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = TransactionItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: sale.id.clone(),
                line_no: line.line_no,
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
                tax_cents: line.tax.cents(),
                created_at: now,
            };
            TransactionRepository::insert_item(&mut *tx, &item).await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            transaction_id = %sale.id,
            invoice = %sale.invoice_number,
            order_number = sale.order_number,
            total = %totals.total,
            lines = items.len(),
            "Order completed"
        );

        Ok(OrderDetail {
            transaction: sale,
            items,
        })
    }

    pub async fn get_order(&self, tenant_id: &str, transaction_id: &str) -> EngineResult<OrderDetail> {
        self.db
            .transactions()
            .get_detail(tenant_id, transaction_id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(transaction_id.to_string()).into())
    }

    /// Newest first.
    pub async fn list_orders(&self, tenant_id: &str, limit: u32) -> EngineResult<Vec<Transaction>> {
        Ok(self.db.transactions().list(tenant_id, limit).await?)
    }
}
