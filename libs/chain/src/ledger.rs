use alloy::primitives::{Address, BlockHash, BlockNumber, TxHash, U256};
use eyre::Result;

use crate::events::LedgerEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub number: BlockNumber,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub timestamp: u64,
}

/// What the ledger currently knows about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Unknown,
    Pending,
    Reverted { block_number: BlockNumber },
    Included { block_number: BlockNumber, block_hash: BlockHash, transaction_index: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCampaign {
    pub campaign_id: u64,
    pub beneficiary: Address,
    pub target_amount: U256,
    pub is_active: bool,
}

/// Inclusive block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl BlockRange {
    pub fn new(from: BlockNumber, to: BlockNumber) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, block_number: BlockNumber) -> bool {
        self.from <= block_number && block_number <= self.to
    }
}

/// Read access to the ledger. Every operation that needs the chain receives
/// this capability explicitly.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    async fn latest_block_number(&self) -> Result<BlockNumber>;

    async fn block(&self, number: BlockNumber) -> Result<Option<BlockRef>>;

    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus>;

    /// Contract events emitted by a mined transaction, in log order.
    async fn transaction_events(&self, tx_hash: TxHash) -> Result<Vec<LedgerEvent>>;

    /// Contract events mined within `range`, in ledger order.
    async fn events(&self, range: BlockRange) -> Result<Vec<LedgerEvent>>;

    async fn owner(&self) -> Result<Address>;

    async fn campaign_counter(&self) -> Result<u64>;

    /// The campaign as stored by the contract at block `at`.
    async fn campaign(&self, campaign_id: u64, at: BlockNumber) -> Result<Option<LedgerCampaign>>;

    async fn total_funds(&self) -> Result<U256>;

    async fn donor_list(&self) -> Result<Vec<Address>>;
}
