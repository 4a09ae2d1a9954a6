use alloy::primitives::BlockNumber;
use chain::ledger::BlockRange;

/// Inclusive block range to pull from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkFilter {
    pub from_block_number: BlockNumber,
    pub to_block_number: BlockNumber,
}

impl From<BlockRange> for ChunkFilter {
    fn from(range: BlockRange) -> Self {
        Self { from_block_number: range.from, to_block_number: range.to }
    }
}

impl From<ChunkFilter> for BlockRange {
    fn from(filter: ChunkFilter) -> Self {
        BlockRange::new(filter.from_block_number, filter.to_block_number)
    }
}
