use crate::admin::model::{Admin, Permission, Role};
use crate::client::Client;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::Error;
use sqlx::types::Json;

const ADMIN_COLUMNS: &str = r#"
    address, role, permissions, is_active, last_login, login_count, created_at, updated_at
"#;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // ADMINS
    // ---------------------------

    /// Refreshes the cached record after a successful owner check. The first
    /// login creates it with `role` and `permissions`; later ones only bump the
    /// login bookkeeping.
    pub async fn record_login(
        &self,
        address: &str,
        role: Role,
        permissions: &[Permission],
        at: DateTime<Utc>,
    ) -> Result<Admin, Error> {
        let query = format!(
            r#"
            INSERT INTO admins (
                address, role, permissions, is_active, last_login, login_count,
                created_at, updated_at
            )
            VALUES (?, ?, ?, 1, ?, 1, ?, ?)
            ON CONFLICT (address) DO UPDATE SET
                is_active = 1,
                last_login = excluded.last_login,
                login_count = admins.login_count + 1,
                updated_at = excluded.updated_at
            RETURNING {ADMIN_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(address)
            .bind(role)
            .bind(Json(permissions))
            .bind(at)
            .bind(at)
            .bind(at)
            .fetch_one(self.client.pool())
            .await
    }

    pub async fn get(&self, address: &str) -> Result<Option<Admin>, Error> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE address = ?");
        sqlx::query_as(&query).bind(address).fetch_optional(self.client.pool()).await
    }

    pub async fn list(&self) -> Result<Vec<Admin>, Error> {
        let query =
            format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at ASC, address ASC");
        sqlx::query_as(&query).fetch_all(self.client.pool()).await
    }

    /// Marks every cached admin other than `owner` inactive, e.g. after an
    /// ownership transfer on the ledger.
    pub async fn deactivate_others(&self, owner: &str) -> Result<u64, Error> {
        let query = r#"
            UPDATE admins SET is_active = 0, updated_at = ?
            WHERE address != ? AND is_active = 1
            "#;
        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(owner)
            .execute(self.client.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
