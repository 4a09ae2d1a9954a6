use std::collections::HashMap;

use alloy::primitives::{Address, B256, BlockHash, BlockNumber, TxHash, U256, keccak256};
use eyre::{Result, eyre};
use tokio::sync::Mutex;

use crate::events::{EventPosition, LedgerEvent, LedgerEventKind};
use crate::ledger::{BlockRange, BlockRef, Ledger, LedgerCampaign, TxStatus};

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const BLOCK_TIME: u64 = 12;

/// A state-changing call submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateCampaign { beneficiary: Address, target_amount: U256, title: String },
    Donate { campaign_id: u64, donor: Address, amount: U256, message: String },
    ToggleCampaignStatus { campaign_id: u64 },
    Withdraw { to: Address, amount: U256 },
    TransferOwnership { new_owner: Address },
}

struct PendingTx {
    hash: TxHash,
    operation: Operation,
}

struct Chain {
    blocks: Vec<BlockRef>,
    events: Vec<LedgerEvent>,
    receipts: HashMap<TxHash, TxStatus>,
    pending: Vec<PendingTx>,
    campaigns: Vec<LedgerCampaign>,
    // Campaign table as of each block, indexed by block number.
    snapshots: Vec<Vec<LedgerCampaign>>,
    donors: Vec<Address>,
    total_funds: U256,
    owner: Address,
    nonce: u64,
}

impl Chain {
    fn new(owner: Address) -> Self {
        let genesis = BlockRef {
            number: 0,
            hash: block_hash(0),
            parent_hash: B256::ZERO,
            timestamp: GENESIS_TIMESTAMP,
        };
        Self {
            blocks: vec![genesis],
            events: Vec::new(),
            receipts: HashMap::new(),
            pending: Vec::new(),
            campaigns: Vec::new(),
            snapshots: vec![Vec::new()],
            donors: Vec::new(),
            total_funds: U256::ZERO,
            owner,
            nonce: 0,
        }
    }

    fn next_tx_hash(&mut self) -> TxHash {
        self.nonce += 1;
        keccak256(self.nonce.to_be_bytes())
    }

    // Returns the emitted event, or None when the call reverts.
    fn execute(&mut self, operation: Operation, timestamp: u64) -> Option<LedgerEventKind> {
        match operation {
            Operation::CreateCampaign { beneficiary, target_amount, title } => {
                let campaign_id = self.campaigns.len() as u64;
                self.campaigns.push(LedgerCampaign {
                    campaign_id,
                    beneficiary,
                    target_amount,
                    is_active: true,
                });
                Some(LedgerEventKind::CampaignCreated {
                    campaign_id,
                    beneficiary,
                    target_amount,
                    title,
                })
            }
            Operation::Donate { campaign_id, donor, amount, message } => {
                let campaign = self.campaigns.get(campaign_id as usize)?;
                if !campaign.is_active || amount.is_zero() {
                    return None;
                }
                self.total_funds += amount;
                if !self.donors.contains(&donor) {
                    self.donors.push(donor);
                }
                Some(LedgerEventKind::DonationReceived {
                    campaign_id,
                    donor,
                    amount,
                    timestamp,
                    message,
                })
            }
            Operation::ToggleCampaignStatus { campaign_id } => {
                let campaign = self.campaigns.get_mut(campaign_id as usize)?;
                campaign.is_active = !campaign.is_active;
                Some(LedgerEventKind::CampaignStatusChanged {
                    campaign_id,
                    is_active: campaign.is_active,
                })
            }
            Operation::Withdraw { to, amount } => {
                if amount > self.total_funds {
                    return None;
                }
                self.total_funds -= amount;
                Some(LedgerEventKind::FundsWithdrawn { to, amount, timestamp })
            }
            Operation::TransferOwnership { new_owner } => {
                self.owner = new_owner;
                None
            }
        }
    }

    fn mine(&mut self) -> BlockRef {
        let parent = self.blocks.last().cloned().unwrap_or_else(|| BlockRef {
            number: 0,
            hash: B256::ZERO,
            parent_hash: B256::ZERO,
            timestamp: GENESIS_TIMESTAMP,
        });
        let number = parent.number + 1;
        let block = BlockRef {
            number,
            hash: block_hash(number),
            parent_hash: parent.hash,
            timestamp: parent.timestamp + BLOCK_TIME,
        };

        let mut log_index = 0;
        let pending = std::mem::take(&mut self.pending);
        for (transaction_index, tx) in pending.into_iter().enumerate() {
            let transaction_index = transaction_index as u64;
            let is_ownership_change = matches!(tx.operation, Operation::TransferOwnership { .. });
            match self.execute(tx.operation, block.timestamp) {
                Some(kind) => {
                    self.events.push(LedgerEvent {
                        position: EventPosition::new(number, transaction_index, log_index),
                        block_hash: block.hash,
                        transaction_hash: tx.hash,
                        kind,
                    });
                    log_index += 1;
                    self.receipts.insert(
                        tx.hash,
                        TxStatus::Included {
                            block_number: number,
                            block_hash: block.hash,
                            transaction_index,
                        },
                    );
                }
                None if is_ownership_change => {
                    self.receipts.insert(
                        tx.hash,
                        TxStatus::Included {
                            block_number: number,
                            block_hash: block.hash,
                            transaction_index,
                        },
                    );
                }
                None => {
                    self.receipts.insert(tx.hash, TxStatus::Reverted { block_number: number });
                }
            }
        }

        self.snapshots.push(self.campaigns.clone());
        self.blocks.push(block.clone());
        block
    }
}

fn block_hash(number: BlockNumber) -> BlockHash {
    keccak256([b"block".as_slice(), &number.to_be_bytes()].concat())
}

pub struct MemoryLedger {
    chain: Mutex<Chain>,
}

impl MemoryLedger {
    pub fn new(owner: Address) -> Self {
        Self { chain: Mutex::new(Chain::new(owner)) }
    }

    /// Queues a transaction without mining it.
    pub async fn submit(&self, operation: Operation) -> TxHash {
        let mut chain = self.chain.lock().await;
        let hash = chain.next_tx_hash();
        chain.pending.push(PendingTx { hash, operation });
        hash
    }

    /// Mines every queued transaction into one new block.
    pub async fn mine(&self) -> BlockRef {
        self.chain.lock().await.mine()
    }

    /// Mines `count` blocks, the first one including any queued transactions.
    pub async fn mine_blocks(&self, count: u64) -> Option<BlockRef> {
        let mut chain = self.chain.lock().await;
        (0..count).map(|_| chain.mine()).last()
    }

    /// Submits and mines a single transaction in its own block.
    pub async fn execute(&self, operation: Operation) -> TxHash {
        let mut chain = self.chain.lock().await;
        let hash = chain.next_tx_hash();
        chain.pending.push(PendingTx { hash, operation });
        chain.mine();
        hash
    }

    pub async fn execute_with_hash(&self, hash: TxHash, operation: Operation) -> TxHash {
        let mut chain = self.chain.lock().await;
        chain.pending.push(PendingTx { hash, operation });
        chain.mine();
        hash
    }
}

#[async_trait::async_trait]
impl Ledger for MemoryLedger {
    async fn latest_block_number(&self) -> Result<BlockNumber> {
        Ok(self.chain.lock().await.blocks.last().map(|block| block.number).unwrap_or_default())
    }

    async fn block(&self, number: BlockNumber) -> Result<Option<BlockRef>> {
        Ok(self.chain.lock().await.blocks.get(number as usize).cloned())
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus> {
        let chain = self.chain.lock().await;
        if let Some(status) = chain.receipts.get(&tx_hash) {
            return Ok(status.clone());
        }
        if chain.pending.iter().any(|tx| tx.hash == tx_hash) {
            return Ok(TxStatus::Pending);
        }
        Ok(TxStatus::Unknown)
    }

    async fn transaction_events(&self, tx_hash: TxHash) -> Result<Vec<LedgerEvent>> {
        let chain = self.chain.lock().await;
        Ok(chain.events.iter().filter(|event| event.transaction_hash == tx_hash).cloned().collect())
    }

    async fn events(&self, range: BlockRange) -> Result<Vec<LedgerEvent>> {
        let chain = self.chain.lock().await;
        Ok(chain
            .events
            .iter()
            .filter(|event| range.contains(event.block_number()))
            .cloned()
            .collect())
    }

    async fn owner(&self) -> Result<Address> {
        Ok(self.chain.lock().await.owner)
    }

    async fn campaign_counter(&self) -> Result<u64> {
        Ok(self.chain.lock().await.campaigns.len() as u64)
    }

    async fn campaign(&self, campaign_id: u64, at: BlockNumber) -> Result<Option<LedgerCampaign>> {
        let chain = self.chain.lock().await;
        let campaigns =
            chain.snapshots.get(at as usize).ok_or_else(|| eyre!("block {at} is not mined yet"))?;
        Ok(campaigns.get(campaign_id as usize).cloned())
    }

    async fn total_funds(&self) -> Result<U256> {
        Ok(self.chain.lock().await.total_funds)
    }

    async fn donor_list(&self) -> Result<Vec<Address>> {
        Ok(self.chain.lock().await.donors.clone())
    }
}
