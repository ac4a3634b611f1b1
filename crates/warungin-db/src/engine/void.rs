//! # Void Engine
//!
//! `completed → voided`, once. Authorization comes from the
//! [`VoidPolicy`](warungin_core::void_policy::VoidPolicy) capability table;
//! the effects (status flip, stock and material restoration, audit rows)
//! commit together or not at all.

use tracing::{info, warn};
use uuid::Uuid;

use warungin_core::audit::{
    ActivityDetails, AuditAction, AuditSnapshot, TransactionAuditLog, TransactionSnapshot,
};
use warungin_core::material::StockDirection;
use warungin_core::validation::{validate_reason, validate_uuid};
use warungin_core::{Actor, CoreError, OrderDetail, TransactionStatus, VoidRequest};

use super::stock;
use super::{ActivityContext, FulfillmentEngine};
use crate::error::EngineResult;
use crate::repository::{AuditRepository, ProductRepository, TransactionRepository};

impl FulfillmentEngine {
    /// Voids a completed sale on behalf of an already-resolved actor.
    pub async fn void_order(&self, tenant_id: &str, request: VoidRequest) -> EngineResult<OrderDetail> {
        let reason = validate_reason(&request.reason)?;
        validate_uuid("transaction_id", &request.transaction_id)?;
        let actor = request.actor;
        let id = request.transaction_id.as_str();

        let detail = self.get_order(tenant_id, id).await?;
        if detail.transaction.is_voided() {
            warn!(transaction_id = %id, user_id = %actor.user_id, "Transaction already voided");
            return Err(CoreError::AlreadyVoided(id.to_string()).into());
        }

        let now = self.now();
        if let Err(denied) =
            self.settings
                .void_policy
                .authorize(&actor.role, detail.transaction.created_at, now)
        {
            warn!(
                transaction_id = %id,
                user_id = %actor.user_id,
                role = %actor.role,
                reason = %denied,
                "Void denied"
            );
            return Err(denied.into());
        }

        let mut tx = self.db.pool().begin().await?;

        if !TransactionRepository::mark_voided(&mut *tx, tenant_id, id, now).await? {
            warn!(transaction_id = %id, "Lost race to another void");
            return Err(CoreError::AlreadyVoided(id.to_string()).into());
        }

        for item in &detail.items {
            // Nothing is restored unless every line can be.
            let Some(product) =
                ProductRepository::find(&mut *tx, tenant_id, &item.product_id).await?
            else {
                warn!(
                    transaction_id = %id,
                    product_id = %item.product_id,
                    "Product gone; void rolled back"
                );
                return Err(CoreError::ProductNotFound(item.product_id.clone()).into());
            };
            stock::move_product_stock(
                &mut *tx,
                tenant_id,
                &product,
                item.quantity,
                StockDirection::Restore,
                now,
            )
            .await?;

            stock::apply_recipe(
                &mut *tx,
                tenant_id,
                &item.product_id,
                item.quantity,
                StockDirection::Restore,
                self.settings.allow_negative_material_stock,
                now,
            )
            .await?;
        }

        let snapshot = TransactionSnapshot::from(&detail);
        let audit = TransactionAuditLog {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            transaction_id: id.to_string(),
            action: AuditAction::Void,
            reason: reason.clone(),
            old_values: AuditSnapshot::Transaction(snapshot.clone()).to_json()?,
            new_values: AuditSnapshot::status(TransactionStatus::Voided).to_json()?,
            user_id: actor.user_id.clone(),
            ip_address: actor.ip_address.clone(),
            created_at: now,
        };
        AuditRepository::insert_transaction_log(&mut *tx, &audit).await?;

        let context = ActivityContext {
            tenant_id,
            user_id: Some(&actor.user_id),
            ip_address: actor.ip_address.as_deref(),
            at: now,
        };
        let activity = context.entry(
            "transaction",
            id,
            format!("Voided {}", detail.transaction.invoice_number),
            &ActivityDetails::Void { reason, snapshot },
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            transaction_id = %id,
            invoice = %detail.transaction.invoice_number,
            user_id = %actor.user_id,
            role = %actor.role,
            "Transaction voided"
        );

        self.get_order(tenant_id, id).await
    }

    /// Resolves `user_id` through the user directory, then voids.
    pub async fn void_order_as_user(
        &self,
        tenant_id: &str,
        transaction_id: &str,
        reason: &str,
        user_id: &str,
        ip_address: Option<&str>,
    ) -> EngineResult<OrderDetail> {
        let user = self
            .db
            .users()
            .get(tenant_id, user_id)
            .await?
            .ok_or_else(|| CoreError::UnknownActor(user_id.to_string()))?;

        if !user.is_active {
            warn!(user_id = %user_id, "Inactive user attempted a void");
            return Err(CoreError::InactiveActor(user_id.to_string()).into());
        }

        let mut actor = Actor::new(user.id, user.role);
        if let Some(ip) = ip_address {
            actor = actor.with_ip(ip);
        }

        self.void_order(
            tenant_id,
            VoidRequest {
                transaction_id: transaction_id.to_string(),
                reason: reason.to_string(),
                actor,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::error::ErrorCode;
    use crate::testing;
    use warungin_core::audit::{ActivityAction, ActivityDetails, AuditAction, AuditSnapshot};
    use warungin_core::{
        Actor, CoreError, CreateOrderRequest, MaterialQty, OrderDetail, OrderLineRequest, Role,
        TransactionStatus, VoidRequest,
    };

    use crate::FulfillmentEngine;

    async fn sell(engine: &FulfillmentEngine, lines: &[(&str, i64)]) -> OrderDetail {
        let request = CreateOrderRequest {
            items: lines
                .iter()
                .map(|(id, quantity)| OrderLineRequest {
                    product_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            ..Default::default()
        };
        engine
            .create_order(testing::TENANT, testing::CASHIER, request)
            .await
            .unwrap()
    }

    fn void_as(role: Role, transaction_id: &str) -> VoidRequest {
        VoidRequest {
            transaction_id: transaction_id.to_string(),
            reason: "customer changed mind".to_string(),
            actor: Actor::new(testing::CASHIER, role).with_ip("10.0.0.7"),
        }
    }

    #[tokio::test]
    async fn test_scenario_manual_stock_void_restores() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let product = testing::manual_product(db, "ES-TEH", 5_000, 10).await;

        let sale = sell(&engine, &[(&product.id, 3)]).await;
        let voided = engine
            .void_order(testing::TENANT, void_as(Role::Cashier, &sale.transaction.id))
            .await
            .unwrap();

        assert_eq!(voided.transaction.status, TransactionStatus::Voided);
        let stored = db.products().get(testing::TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 10);
    }

    #[tokio::test]
    async fn test_scenario_material_void_restores() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let product = testing::material_product(db, "ROTI", 8_000).await;
        let flour = testing::material(db, "Tepung", "20").await;
        testing::link(db, &product.id, &flour.id, "2", 1_000_000).await;

        let sale = sell(&engine, &[(&product.id, 4)]).await;
        engine
            .void_order(testing::TENANT, void_as(Role::Cashier, &sale.transaction.id))
            .await
            .unwrap();

        let flour = db.materials().get(testing::TENANT, &flour.id).await.unwrap().unwrap();
        assert_eq!(flour.stock_qty, MaterialQty::from_units(20));
        let product = db.products().get(testing::TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(product.stock_qty, 0);
    }

    #[tokio::test]
    async fn test_round_trip_restores_fractional_materials_exactly() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let latte = testing::material_product(db, "LATTE", 25_000).await;
        let cake = testing::manual_product(db, "BROWNIS", 15_000, 7).await;
        let milk = testing::material(db, "Susu", "3.333333").await;
        let beans = testing::material(db, "Kopi", "1.000001").await;
        testing::link(db, &latte.id, &milk.id, "150", 1_000).await;
        testing::link(db, &latte.id, &beans.id, "18.5", 1_000).await;
        // a manual-stock product may still consume a material
        testing::link(db, &cake.id, &milk.id, "0.05", 0).await;

        let sale = sell(&engine, &[(&latte.id, 3), (&cake.id, 2), (&latte.id, 1)]).await;

        let milk_after = db.materials().get(testing::TENANT, &milk.id).await.unwrap().unwrap();
        assert_eq!(milk_after.stock_qty, "2.633333".parse().unwrap());

        engine
            .void_order(testing::TENANT, void_as(Role::Manager, &sale.transaction.id))
            .await
            .unwrap();

        for (id, before) in [(&milk.id, milk.stock_qty), (&beans.id, beans.stock_qty)] {
            let now = db.materials().get(testing::TENANT, id).await.unwrap().unwrap();
            assert_eq!(now.stock_qty, before);
        }
        let cake = db.products().get(testing::TENANT, &cake.id).await.unwrap().unwrap();
        assert_eq!(cake.stock_qty, 7);
    }

    #[tokio::test]
    async fn test_void_with_deleted_product_changes_nothing() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let bread = testing::material_product(db, "ROTI", 8_000).await;
        let flour = testing::material(db, "Tepung", "20").await;
        testing::link(db, &bread.id, &flour.id, "2", 1_000_000).await;
        let drink = testing::manual_product(db, "ES-TEH", 5_000, 10).await;

        let sale = sell(&engine, &[(&bread.id, 1), (&drink.id, 2)]).await;
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(&drink.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = engine
            .void_order(testing::TENANT, void_as(Role::Manager, &sale.transaction.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ProductNotFound(id)) if *id == drink.id));

        let stored = engine.get_order(testing::TENANT, &sale.transaction.id).await.unwrap();
        assert_eq!(stored.transaction.status, TransactionStatus::Completed);
        let flour = db.materials().get(testing::TENANT, &flour.id).await.unwrap().unwrap();
        assert_eq!(flour.stock_qty, MaterialQty::from_units(18));
        let trail = engine
            .transaction_audit_trail(testing::TENANT, &sale.transaction.id)
            .await
            .unwrap();
        assert!(trail.is_empty());
    }

    #[tokio::test]
    async fn test_double_void_is_a_conflict_without_effects() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let product = testing::manual_product(db, "NASI", 10_000, 10).await;
        let sale = sell(&engine, &[(&product.id, 2)]).await;
        let id = sale.transaction.id.clone();

        engine.void_order(testing::TENANT, void_as(Role::Cashier, &id)).await.unwrap();
        let err = engine
            .void_order(testing::TENANT, void_as(Role::Owner, &id))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(matches!(err.as_core(), Some(CoreError::AlreadyVoided(_))));

        let stored = db.products().get(testing::TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 10);
        let trail = engine.transaction_audit_trail(testing::TENANT, &id).await.unwrap();
        assert_eq!(trail.len(), 1);
    }

    #[tokio::test]
    async fn test_audit_rows_carry_snapshot_and_actor() {
        let (engine, _clock) = testing::engine().await;
        let product = testing::manual_product(engine.db(), "SATE", 20_000, 10).await;
        let sale = sell(&engine, &[(&product.id, 2)]).await;
        let id = sale.transaction.id.clone();

        engine.void_order(testing::TENANT, void_as(Role::Cashier, &id)).await.unwrap();

        let trail = engine.transaction_audit_trail(testing::TENANT, &id).await.unwrap();
        let row = &trail[0];
        assert_eq!(row.action, AuditAction::Void);
        assert_eq!(row.reason, "customer changed mind");
        assert_eq!(row.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(row.new_values, r#"{"status":"voided"}"#);
        match row.old_snapshot().unwrap() {
            AuditSnapshot::Transaction(snapshot) => {
                assert_eq!(snapshot.status, TransactionStatus::Completed);
                assert_eq!(snapshot.total_cents, 40_000);
                assert_eq!(snapshot.items.len(), 1);
                assert_eq!(snapshot.items[0].quantity, 2);
            }
            other => panic!("expected full snapshot, got {other:?}"),
        }

        let activity = engine.activity_log(testing::TENANT, 10).await.unwrap();
        let void = activity
            .iter()
            .find(|a| a.action == ActivityAction::Void)
            .unwrap();
        assert_eq!(void.entity_id, id);
        assert!(matches!(
            void.parsed_details().unwrap(),
            ActivityDetails::Void { .. }
        ));
    }

    #[tokio::test]
    async fn test_authorization_boundaries() {
        let (engine, clock) = testing::engine().await;
        let product = testing::manual_product(engine.db(), "KOPI", 5_000, 50).await;

        let cases = [
            (Role::Cashier, Duration::minutes(4) + Duration::seconds(59), Ok(())),
            (Role::Cashier, Duration::minutes(5) + Duration::seconds(1), Err("manager")),
            (Role::Manager, Duration::hours(23) + Duration::minutes(59), Ok(())),
            (Role::Manager, Duration::hours(24) + Duration::minutes(1), Err("owner")),
            (Role::Owner, Duration::days(90), Ok(())),
        ];

        for (role, age, expected) in cases {
            let sale = sell(&engine, &[(&product.id, 1)]).await;
            clock.advance(age);

            let result = engine
                .void_order(testing::TENANT, void_as(role.clone(), &sale.transaction.id))
                .await;
            match expected {
                Ok(()) => assert!(result.is_ok(), "{role} at {age} should pass"),
                Err(approver) => {
                    let err = result.unwrap_err();
                    assert_eq!(err.code(), ErrorCode::PermissionDenied);
                    match err.as_core() {
                        Some(CoreError::VoidNotPermitted { approver: got, .. }) => {
                            assert_eq!(got, approver)
                        }
                        other => panic!("unexpected error: {other:?}"),
                    }
                    let still = engine
                        .get_order(testing::TENANT, &sale.transaction.id)
                        .await
                        .unwrap();
                    assert_eq!(still.transaction.status, TransactionStatus::Completed);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_void_validation() {
        let (engine, _clock) = testing::engine().await;
        let product = testing::manual_product(engine.db(), "MIE", 5_000, 5).await;
        let sale = sell(&engine, &[(&product.id, 1)]).await;

        let mut blank = void_as(Role::Owner, &sale.transaction.id);
        blank.reason = "   ".to_string();
        let err = engine.void_order(testing::TENANT, blank).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let missing = void_as(Role::Owner, &uuid::Uuid::new_v4().to_string());
        let err = engine.void_order(testing::TENANT, missing).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let other_tenant = engine
            .void_order("other", void_as(Role::Owner, &sale.transaction.id))
            .await
            .unwrap_err();
        assert_eq!(other_tenant.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_void_as_user_resolves_the_directory() {
        let (engine, _clock) = testing::engine().await;
        let db = engine.db();
        let product = testing::manual_product(db, "BAKSO", 12_000, 5).await;
        let manager = testing::user(db, Role::Manager, true).await;
        let former = testing::user(db, Role::Owner, false).await;

        let sale = sell(&engine, &[(&product.id, 1)]).await;
        let id = sale.transaction.id.as_str();

        let unknown = engine
            .void_order_as_user(testing::TENANT, id, "wrong item", &uuid::Uuid::new_v4().to_string(), None)
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), ErrorCode::PermissionDenied);

        let inactive = engine
            .void_order_as_user(testing::TENANT, id, "wrong item", &former.id, None)
            .await
            .unwrap_err();
        assert!(matches!(inactive.as_core(), Some(CoreError::InactiveActor(_))));

        let voided = engine
            .void_order_as_user(testing::TENANT, id, "wrong item", &manager.id, Some("192.168.1.20"))
            .await
            .unwrap();
        assert!(voided.transaction.is_voided());

        let trail = engine.transaction_audit_trail(testing::TENANT, id).await.unwrap();
        assert_eq!(trail[0].user_id, manager.id);
        assert_eq!(trail[0].ip_address.as_deref(), Some("192.168.1.20"));
    }
}
