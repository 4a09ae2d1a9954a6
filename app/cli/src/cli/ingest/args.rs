use alloy::primitives::TxHash;
use clap::Parser;
use clap::{arg, command};

use crate::cli::read::{Database, Node, Tuning, parse_tx_hash};

#[derive(Parser, Debug)]
#[command(about = "Wait for a transaction to confirm and ingest its events", long_about = None)]
pub struct Record {
    #[command(flatten)]
    pub node: Node,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub tuning: Tuning,

    #[arg(long, value_parser = parse_tx_hash)]
    pub tx_hash: TxHash,

    /// Seconds to wait for confirmation
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Confirmation poll interval in milliseconds
    #[arg(long, default_value_t = 1_000)]
    pub poll_interval: u64,
}

#[derive(Parser, Debug)]
#[command(about = "Set off-chain annotations on a recorded donation", long_about = None)]
pub struct Annotate {
    #[command(flatten)]
    pub database: Database,

    #[arg(long, value_parser = parse_tx_hash)]
    pub tx_hash: TxHash,

    /// Hide the donor in public listings
    #[arg(long)]
    pub anonymous: Option<bool>,

    #[arg(long)]
    pub donor_name: Option<String>,

    #[arg(long)]
    pub donor_email: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Re-assert a campaign's active flag from the ledger", long_about = None)]
pub struct SyncStatus {
    #[command(flatten)]
    pub node: Node,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub tuning: Tuning,

    #[arg(long)]
    pub campaign_id: u64,
}
