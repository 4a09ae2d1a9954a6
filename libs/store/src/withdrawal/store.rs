use crate::client::Client;
use crate::page::{Page, Paginated};
use crate::withdrawal::model::{NewWithdrawal, Withdrawal};
use chrono::Utc;
use eyre::Result;
use sqlx::Error;

const WITHDRAWAL_COLUMNS: &str =
    "transaction_hash, recipient, amount, timestamp, block_number, log_index, recorded_at";

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // WITHDRAWALS
    // ---------------------------

    pub async fn insert(&self, withdrawal: &NewWithdrawal) -> Result<Withdrawal, Error> {
        let query = format!(
            r#"
            INSERT INTO withdrawals (
                transaction_hash, recipient, amount, timestamp, block_number, log_index, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {WITHDRAWAL_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(&withdrawal.transaction_hash)
            .bind(&withdrawal.recipient)
            .bind(withdrawal.amount)
            .bind(withdrawal.timestamp)
            .bind(withdrawal.block_number)
            .bind(withdrawal.log_index)
            .bind(Utc::now())
            .fetch_one(self.client.pool())
            .await
    }

    pub async fn get(&self, transaction_hash: &str) -> Result<Option<Withdrawal>, Error> {
        let query =
            format!("SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals WHERE transaction_hash = ?");
        sqlx::query_as(&query).bind(transaction_hash).fetch_optional(self.client.pool()).await
    }

    pub async fn list(&self, page: &Page) -> Result<Paginated<Withdrawal>, Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM withdrawals")
            .fetch_one(self.client.pool())
            .await?;
        let query = format!(
            r#"
            SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals
            ORDER BY timestamp DESC, block_number DESC, log_index DESC
            LIMIT ? OFFSET ?
            "#
        );
        let items = sqlx::query_as(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.client.pool())
            .await?;

        Ok(Paginated::new(items, page, total))
    }

    pub async fn all(&self) -> Result<Vec<Withdrawal>, Error> {
        let query = format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals ORDER BY block_number ASC, log_index ASC"
        );
        sqlx::query_as(&query).fetch_all(self.client.pool()).await
    }
}
