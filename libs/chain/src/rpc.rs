use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::{Address, BlockNumber, TxHash, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::reqwest::Url;
use eyre::{Result, eyre};

use crate::contract::IDonationTracker;
use crate::events::{self, LedgerEvent};
use crate::ledger::{BlockRange, BlockRef, Ledger, LedgerCampaign, TxStatus};

/// JSON-RPC backed ledger bound to one deployed contract.
#[derive(Clone)]
pub struct NodeClient {
    pub(crate) provider: RootProvider,
    contract: Address,
}

impl NodeClient {
    pub fn new(rpc_url: Url, contract: Address) -> Self {
        Self::with_client(RpcClient::new_http(rpc_url), contract)
    }

    pub fn with_client(rpc_client: RpcClient, contract: Address) -> Self {
        Self { provider: RootProvider::new(rpc_client), contract }
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    fn decode_logs(&self, logs: &[Log]) -> Vec<LedgerEvent> {
        logs.iter()
            // NOTE: logs from pending txs carry no block number yet; they are
            // re-emitted once mined, so only mined logs are decoded here.
            .filter(|log| log.block_number.is_some() && !log.removed)
            .filter(|log| log.address() == self.contract)
            .filter_map(|log| match LedgerEvent::try_from(log) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::error!("Skip: failed to decode log {log:?} - reason {e:?}");
                    None
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Ledger for NodeClient {
    async fn latest_block_number(&self) -> Result<BlockNumber> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn block(&self, number: BlockNumber) -> Result<Option<BlockRef>> {
        let block = self.provider.get_block_by_number(BlockNumberOrTag::Number(number)).await?;

        Ok(block.map(|block| BlockRef {
            number: block.number(),
            hash: block.hash(),
            parent_hash: block.header.parent_hash,
            timestamp: block.header.timestamp,
        }))
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus> {
        match self.provider.get_transaction_receipt(tx_hash).await? {
            Some(receipt) => {
                let block_number =
                    receipt.block_number.ok_or_else(|| eyre!("receipt without block_number"))?;
                if !receipt.status() {
                    return Ok(TxStatus::Reverted { block_number });
                }
                Ok(TxStatus::Included {
                    block_number,
                    block_hash: receipt
                        .block_hash
                        .ok_or_else(|| eyre!("receipt without block_hash"))?,
                    transaction_index: receipt
                        .transaction_index
                        .ok_or_else(|| eyre!("receipt without transaction_index"))?,
                })
            }
            None => match self.provider.get_transaction_by_hash(tx_hash).await? {
                Some(_) => Ok(TxStatus::Pending),
                None => Ok(TxStatus::Unknown),
            },
        }
    }

    async fn transaction_events(&self, tx_hash: TxHash) -> Result<Vec<LedgerEvent>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| eyre!("receipt not found for {tx_hash}"))?;

        let mut events = self.decode_logs(receipt.inner.logs());
        events::sort_by_position(&mut events);
        Ok(events)
    }

    async fn events(&self, range: BlockRange) -> Result<Vec<LedgerEvent>> {
        let filter = Filter::new()
            .address(self.contract)
            .event_signature(events::signatures())
            .from_block(range.from)
            .to_block(range.to);

        let logs = self.provider.get_logs(&filter).await?;
        let mut events = self.decode_logs(&logs);
        events::sort_by_position(&mut events);
        Ok(events)
    }

    async fn owner(&self) -> Result<Address> {
        let contract = IDonationTracker::new(self.contract, &self.provider);
        Ok(contract.owner().call().await?)
    }

    async fn campaign_counter(&self) -> Result<u64> {
        let contract = IDonationTracker::new(self.contract, &self.provider);
        let counter = contract.campaignCounter().call().await?;
        u64::try_from(counter).map_err(|_| eyre!("campaign counter out of range: {counter}"))
    }

    async fn campaign(&self, campaign_id: u64, at: BlockNumber) -> Result<Option<LedgerCampaign>> {
        let contract = IDonationTracker::new(self.contract, &self.provider);
        let block = BlockId::number(at);

        // getCampaign reverts for unknown IDs; the counter bounds the valid range.
        let counter = contract.campaignCounter().block(block).call().await?;
        if U256::from(campaign_id) >= counter {
            return Ok(None);
        }
        let campaign = contract.getCampaign(U256::from(campaign_id)).block(block).call().await?;

        Ok(Some(LedgerCampaign {
            campaign_id,
            beneficiary: campaign.beneficiary,
            target_amount: campaign.targetAmount,
            is_active: campaign.isActive,
        }))
    }

    async fn total_funds(&self) -> Result<U256> {
        let contract = IDonationTracker::new(self.contract, &self.provider);
        Ok(contract.getTotalFunds().call().await?)
    }

    async fn donor_list(&self) -> Result<Vec<Address>> {
        let contract = IDonationTracker::new(self.contract, &self.provider);
        Ok(contract.getDonorList().call().await?)
    }
}
