use alloy::primitives::BlockNumber;
use std::time::Duration;

use crate::retry::RetryPolicy;

#[derive(Debug)]
pub struct Args {
    /// Overrides the last checkpoint as the backfill start.
    pub from_block: Option<BlockNumber>,
    /// Blocks between checkpoints in the live tail.
    pub checkpoint_interval: u64,
    /// Blocks per backfill chunk; defaults to `checkpoint_interval`.
    pub backfill_checkpoint_interval: Option<u64>,
    pub poll_interval: Duration,
    pub min_confirmations: u64,
    pub retry: RetryPolicy,
}

impl Args {
    pub fn backfill_chunk_size(&self) -> u64 {
        self.backfill_checkpoint_interval.unwrap_or(self.checkpoint_interval).max(1)
    }
}
