use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};

use crate::cli::read::{Node, parse_address, parse_tx_hash};

#[derive(Parser, Debug)]
#[command(about = "Read contract state straight from the ledger", long_about = None)]
pub struct LedgerQuery {
    #[command(flatten)]
    pub node: Node,

    #[command(subcommand)]
    pub read: LedgerRead,
}

#[derive(Debug, Subcommand)]
pub enum LedgerRead {
    /// Balance held by the contract
    TotalFunds,
    /// Every address that ever donated
    Donors,
    /// Current contract owner
    Owner,
    /// Campaign counter and, with --id, one campaign
    Campaigns {
        #[arg(long)]
        id: Option<u64>,
    },
    /// Chain ID, network name and latest block
    Network,
    /// A transaction and its receipt
    Transaction {
        #[arg(long, value_parser = parse_tx_hash)]
        tx_hash: TxHash,
    },
    /// Balance, nonce and whether code is deployed
    Address {
        #[arg(long, value_parser = parse_address)]
        address: Address,
    },
    /// Current gas price and EIP-1559 fee estimates, in gwei
    GasPrice,
}
