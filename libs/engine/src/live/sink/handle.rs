use alloy::primitives::BlockNumber;
use eyre::Result;

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    type Item: Send + Sync;

    async fn process(&self, element: &Self::Item) -> Result<()>;

    async fn process_batch(&self, elements: &[Self::Item]) -> Result<()>;

    /// Lowest block with an element still waiting to be applied. Checkpoints
    /// must stay below it.
    async fn pending_from(&self) -> Option<BlockNumber> {
        None
    }
}
