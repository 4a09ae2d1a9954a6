use crate::args::Args;
use crate::checkpointer::Checkpointer;
use crate::live::sink::handle::Sink;
use crate::live::sink::reconciler::{DeferredEvent, ReconcilerSink, Tally};
use crate::live::source::filter::ChunkFilter;
use crate::live::source::handle::{Source, SourceInput};
use alloy::primitives::BlockNumber;
use chain::events::LedgerEvent;
use chain::ledger::BlockRange;
use eyre::Result;
use serde::Serialize;

use crate::confirmation::Confirmed;

/// First block the engine has to pull: the configured start, or the block
/// after the last checkpoint, or genesis.
pub async fn start_block(args: &Args, checkpointer: &Checkpointer) -> Result<BlockNumber> {
    if let Some(from_block) = args.from_block {
        return Ok(from_block);
    }
    Ok(match checkpointer.get_last_checkpoint().await? {
        Some(checkpoint) => checkpoint.resume_block(),
        None => 0,
    })
}

/// Applies every confirmed block from the start block up to the confirmed
/// tip in chunks, checkpointing after each one. Returns the next block to pull.
pub async fn chunked_backfill<T>(
    args: &Args,
    source: &dyn Source<Item = T>,
    checkpointer: &Checkpointer,
    sink: &dyn Sink<Item = T>,
) -> Result<BlockNumber>
where
    T: SourceInput + Send + Sync,
{
    // Snapshot the tip; the live tail picks up from there
    let confirmed_tip = source.confirmed_tip().await?;
    let chunk_size = args.backfill_chunk_size();

    // Local mut state
    let mut next_block_number = start_block(args, checkpointer).await?;

    tracing::info!("Backfill started at block {next_block_number} (confirmed tip {confirmed_tip})");

    while next_block_number <= confirmed_tip {
        // A safe checked addition avoids silent wraparound
        let chunk_block_number =
            next_block_number.saturating_add(chunk_size - 1).min(confirmed_tip);

        let elements = source
            .chunk(ChunkFilter {
                from_block_number: next_block_number,
                to_block_number: chunk_block_number,
            })
            .await?;

        if !elements.is_empty() {
            sink.process_batch(&elements).await?;
        }

        let chunk_checkpoint_block = source.block(chunk_block_number).await?;
        checkpointer.checkpoint_before(&chunk_checkpoint_block, sink.pending_from().await).await?;

        next_block_number = chunk_block_number + 1;
    }

    tracing::info!("Backfill finished at block {confirmed_tip}");

    Ok(next_block_number)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub from_block: BlockNumber,
    /// Requested end, clamped to the confirmed tip.
    pub to_block: BlockNumber,
    pub events: u64,
    pub tally: Tally,
    pub deferred: Vec<DeferredEvent>,
}

/// One-shot repair of `range`. Checkpoints are left alone.
pub async fn reconcile_range(
    source: &dyn Source<Item = Confirmed<LedgerEvent>>,
    sink: &ReconcilerSink,
    range: BlockRange,
    chunk_size: u64,
) -> Result<ReconcileReport> {
    let confirmed_tip = source.confirmed_tip().await?;
    let to_block = range.to.min(confirmed_tip);
    if to_block < range.to {
        tracing::warn!(
            "Reconcile clamped to confirmed tip {confirmed_tip} (requested {})",
            range.to
        );
    }

    let mut events = 0;
    let mut next_block_number = range.from;
    while next_block_number <= to_block {
        let chunk_block_number =
            next_block_number.saturating_add(chunk_size.max(1) - 1).min(to_block);

        let elements = source
            .chunk(ChunkFilter {
                from_block_number: next_block_number,
                to_block_number: chunk_block_number,
            })
            .await?;
        events += elements.len() as u64;

        if !elements.is_empty() {
            sink.process_batch(&elements).await?;
        }

        next_block_number = chunk_block_number + 1;
    }

    let report = ReconcileReport {
        from_block: range.from,
        to_block,
        events,
        tally: sink.tally().await,
        deferred: sink.deferred().await,
    };
    tracing::info!(
        "Reconciled blocks {}..={}: {} event(s), {} deferred",
        report.from_block,
        report.to_block,
        report.events,
        report.deferred.len()
    );
    Ok(report)
}
