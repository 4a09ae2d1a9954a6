use clap::Parser;
use clap::{arg, command};
use std::time::Duration;

use crate::cli::read::{Database, Node, Tuning};

#[derive(Parser, Debug)]
#[command(about = "Backfill confirmed history, then follow the ledger", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub node: Node,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub tuning: Tuning,

    /// Start block; defaults to the block after the last checkpoint
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Checkpoint interval in blocks
    #[arg(long, default_value_t = 100)]
    pub checkpoint_interval: u64,

    /// Backfill chunk size in blocks; defaults to the checkpoint interval
    #[arg(long)]
    pub backfill_checkpoint_interval: Option<u64>,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_interval: u64,
}

impl Args {
    // map CLI args to Engine Args
    pub fn engine_args(&self) -> engine::args::Args {
        engine::args::Args {
            from_block: self.from_block,
            checkpoint_interval: self.checkpoint_interval,
            backfill_checkpoint_interval: self.backfill_checkpoint_interval,
            poll_interval: Duration::from_millis(self.poll_interval),
            min_confirmations: self.tuning.min_confirmations,
            retry: self.tuning.retry_policy(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Apply a block range once and print a report", long_about = None)]
pub struct Reconcile {
    #[command(flatten)]
    pub node: Node,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub tuning: Tuning,

    #[arg(long)]
    pub from_block: u64,

    /// Inclusive; clamped to the confirmed tip
    #[arg(long)]
    pub to_block: u64,

    /// Blocks per ledger query
    #[arg(long, default_value_t = 1_000)]
    pub chunk_size: u64,
}
