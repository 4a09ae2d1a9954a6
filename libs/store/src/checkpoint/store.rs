use crate::checkpoint::model::{Checkpoint, NewCheckpoint};
use crate::client::Client;
use alloy::primitives::BlockNumber;
use chrono::Utc;
use eyre::Result;
use sqlx::Error;

const CHECKPOINT_COLUMNS: &str = "block_number, block_hash, parent_hash, recorded_at";

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // SCAN CURSOR
    // ---------------------------

    /// Returns false when the same block was already checkpointed.
    pub async fn save(&self, checkpoint: &NewCheckpoint) -> Result<bool, Error> {
        let query = r#"
            INSERT INTO checkpoints (block_number, block_hash, parent_hash, recorded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (block_number, block_hash) DO NOTHING
            "#;
        let result = sqlx::query(query)
            .bind(checkpoint.block_number)
            .bind(&checkpoint.block_hash)
            .bind(&checkpoint.parent_hash)
            .bind(Utc::now())
            .execute(self.client.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Highest checkpointed block. Saving an older block never moves it back.
    pub async fn last(&self) -> Result<Option<Checkpoint>, Error> {
        let query = format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints
            ORDER BY block_number DESC, id DESC
            LIMIT 1"
        );
        sqlx::query_as(&query).fetch_optional(self.client.pool()).await
    }

    pub async fn at_block(&self, block_number: BlockNumber) -> Result<Option<Checkpoint>, Error> {
        let query = format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints
            WHERE block_number = ?
            ORDER BY id DESC
            LIMIT 1"
        );
        sqlx::query_as(&query)
            .bind(block_number as i64)
            .fetch_optional(self.client.pool())
            .await
    }
}
