use alloy::primitives::BlockNumber;
use chain::ledger::BlockRef;
use eyre::{Result, eyre};
use store::checkpoint::model::{Checkpoint, NewCheckpoint};
use store::checkpoint::store::Store as CheckpointStore;
use store::client::Client;

#[derive(Clone)]
pub struct Checkpointer {
    store: CheckpointStore,
}

impl Checkpointer {
    pub fn new(client: Client) -> Self {
        Self { store: CheckpointStore::new(client) }
    }

    pub async fn checkpoint(&self, block: &BlockRef) -> Result<()> {
        let checkpoint = NewCheckpoint::new(block.number, &block.hash, &block.parent_hash);

        match self.store.save(&checkpoint).await {
            Ok(true) => {
                tracing::info!("Checkpoint saved at block {} ({})", block.number, block.hash);
                Ok(())
            }
            Ok(false) => {
                tracing::debug!("Checkpoint at block {} already saved", block.number);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Checkpointer failed on [save]: {e:?}");
                Err(eyre!(e))
            }
        }
    }

    /// Saves the checkpoint unless an event at or before `block` is still
    /// waiting to be applied. Returns whether it was saved.
    pub async fn checkpoint_before(
        &self,
        block: &BlockRef,
        pending_from: Option<BlockNumber>,
    ) -> Result<bool> {
        match pending_from {
            Some(pending) if pending <= block.number => {
                tracing::warn!(
                    "Checkpoint at block {} withheld: deferred events from block {pending}",
                    block.number
                );
                Ok(false)
            }
            _ => {
                self.checkpoint(block).await?;
                Ok(true)
            }
        }
    }

    pub async fn get_last_checkpoint(&self) -> Result<Option<Checkpoint>> {
        self.store.last().await.map_err(|e| {
            tracing::error!("Checkpointer failed on [last]: {e:?}");
            eyre!(e)
        })
    }
}
