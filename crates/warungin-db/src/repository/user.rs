//! # User Directory
//!
//! Read-only to the engine apart from `insert`, which seeding and tests use.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::error::DbResult;
use warungin_core::{Role, User};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks a user up within a tenant.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, role, is_active FROM users WHERE id = ? AND tenant_id = ?",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> DbResult<User> {
            let role: String = row.try_get("role")?;
            Ok(User {
                id: row.try_get("id")?,
                tenant_id: row.try_get("tenant_id")?,
                name: row.try_get("name")?,
                role: Role::from(role),
                is_active: row.try_get("is_active")?,
            })
        })
        .transpose()
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO users (id, tenant_id, name, role, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.tenant_id)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_role_round_trip() {
        let db = testing::db().await;
        let barista = testing::user(&db, Role::Other("barista".to_string()), true).await;

        let stored = db.users().get(testing::TENANT, &barista.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Other("barista".to_string()));
        assert!(stored.is_active);

        assert!(db.users().get("other", &barista.id).await.unwrap().is_none());
    }
}
