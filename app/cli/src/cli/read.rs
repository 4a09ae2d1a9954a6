use alloy::primitives::{Address, TxHash};
use alloy::transports::http::reqwest::Url;
use chain::rpc::NodeClient;
use clap::Args;
use engine::retry::RetryPolicy;
use eyre::Result;
use std::time::Duration;
use store::client::Client;
use store::utils;

pub fn parse_address(input: &str) -> Result<Address, String> {
    utils::parse_address(input).map_err(|e| e.to_string())
}

pub fn parse_tx_hash(input: &str) -> Result<TxHash, String> {
    utils::parse_tx_hash(input).map_err(|e| e.to_string())
}

#[derive(Args, Debug, Clone)]
pub struct Node {
    /// Node Provider connection string
    #[arg(short, long, env = "DONATION_INDEXER_RPC_URL")]
    pub rpc_url: String,

    /// DonationTracker contract address
    #[arg(short, long, env = "DONATION_INDEXER_CONTRACT", value_parser = parse_address)]
    pub contract: Address,
}

impl Node {
    pub fn client(&self) -> Result<NodeClient> {
        Ok(NodeClient::new(Url::parse(&self.rpc_url)?, self.contract))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Database {
    /// SQLite connection string
    #[arg(short, long, env = "DONATION_INDEXER_DB_URL")]
    pub db_url: String,
}

impl Database {
    pub async fn client(&self) -> Result<Client> {
        Ok(Client::init(&self.db_url).await?)
    }
}

#[derive(Args, Debug, Clone)]
pub struct Tuning {
    /// Blocks on top of a transaction's block, itself included, before it counts
    #[arg(long, default_value_t = 1)]
    pub min_confirmations: u64,

    /// Attempts for transient store and node failures
    #[arg(long, default_value_t = 5)]
    pub retry_attempts: u32,

    /// First retry delay in milliseconds
    #[arg(long, default_value_t = 100)]
    pub retry_initial_delay: u64,

    /// Retry delay cap in milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub retry_max_delay: u64,
}

impl Tuning {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry_initial_delay),
            max_delay: Duration::from_millis(self.retry_max_delay),
            ..RetryPolicy::default()
        }
    }
}
