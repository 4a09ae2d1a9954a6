use alloy::primitives::BlockNumber;
use chain::ledger::BlockRef;
use eyre::Result;

use crate::live::source::filter::ChunkFilter;

pub trait SourceInput {
    fn block_number(&self) -> BlockNumber;
}

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    type Item: SourceInput + Send + Sync;

    /// Highest block the source is willing to hand out.
    async fn confirmed_tip(&self) -> Result<BlockNumber>;

    /// Items mined within the filter's range, in ledger order.
    async fn chunk(&self, filter: ChunkFilter) -> Result<Vec<Self::Item>>;

    async fn block(&self, number: BlockNumber) -> Result<BlockRef>;
}
