use alloy::primitives::BlockNumber;
use chain::events::{self, LedgerEvent};
use chain::ledger::{BlockRef, Ledger};
use eyre::{Result, eyre};
use std::sync::Arc;

use crate::confirmation::{self, Confirmed};
use crate::live::source::filter::ChunkFilter;
use crate::live::source::handle::{Source, SourceInput};

/// Contract events that have reached the confirmation depth.
pub struct LedgerSource {
    ledger: Arc<dyn Ledger>,
    min_confirmations: u64,
}

impl LedgerSource {
    pub fn new(ledger: Arc<dyn Ledger>, min_confirmations: u64) -> Self {
        Self { ledger, min_confirmations }
    }
}

impl SourceInput for Confirmed<LedgerEvent> {
    fn block_number(&self) -> BlockNumber {
        Confirmed::block_number(self)
    }
}

#[async_trait::async_trait]
impl Source for LedgerSource {
    type Item = Confirmed<LedgerEvent>;

    async fn confirmed_tip(&self) -> Result<BlockNumber> {
        let latest = self.ledger.latest_block_number().await?;
        Ok(confirmation::confirmed_tip(latest, self.min_confirmations))
    }

    async fn chunk(&self, filter: ChunkFilter) -> Result<Vec<Self::Item>> {
        let tip = self.confirmed_tip().await?;
        if filter.to_block_number > tip {
            return Err(eyre!(
                "Block {} is not confirmed yet (confirmed tip {tip})",
                filter.to_block_number
            ));
        }

        let mut chunk = self.ledger.events(filter.into()).await?;
        events::sort_by_position(&mut chunk);

        Ok(chunk
            .into_iter()
            .map(|event| {
                let block_number = event.block_number();
                Confirmed::new(event, block_number)
            })
            .collect())
    }

    async fn block(&self, number: BlockNumber) -> Result<BlockRef> {
        self.ledger.block(number).await?.ok_or_else(|| eyre!("Block not found: {number}"))
    }
}
