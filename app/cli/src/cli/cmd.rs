use clap::command;
use clap::{Parser, Subcommand};

use crate::cli::admin::args::Admin;
use crate::cli::engine::args::{Args, Reconcile};
use crate::cli::ingest::args::{Annotate, Record, SyncStatus};
use crate::cli::ledger::args::LedgerQuery;
use crate::cli::query::args::Query;

#[derive(Parser, Debug)]
#[command(name = "donation-indexer")]
#[command(
    about = "Keeps an off-chain donation store reconciled with the DonationTracker ledger",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the reconciliation engine
    Engine(Args),
    Reconcile(Reconcile),
    Record(Record),
    Annotate(Annotate),
    SyncStatus(SyncStatus),
    Admin(Admin),
    Select(Query),
    Ledger(LedgerQuery),
}
