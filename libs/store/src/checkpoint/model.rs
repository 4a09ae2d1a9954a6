use alloy::primitives::{BlockHash, BlockNumber};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::utils::canonical_hash;

/// Scan cursor: every ledger event up to and including `block_number` has been
/// applied to the projections.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Checkpoint {
    pub block_number: i64,
    pub block_hash: String,
    pub parent_hash: String,
    pub recorded_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn block_number(&self) -> BlockNumber {
        self.block_number as BlockNumber
    }

    /// First block a resumed scan has to pull.
    pub fn resume_block(&self) -> BlockNumber {
        self.block_number() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckpoint {
    pub block_number: i64,
    pub block_hash: String,
    pub parent_hash: String,
}

impl NewCheckpoint {
    pub fn new(block_number: BlockNumber, block_hash: &BlockHash, parent_hash: &BlockHash) -> Self {
        Self {
            block_number: block_number as i64,
            block_hash: canonical_hash(block_hash),
            parent_hash: canonical_hash(parent_hash),
        }
    }
}
