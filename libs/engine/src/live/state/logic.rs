use alloy::primitives::BlockNumber;
use chain::ledger::BlockRange;

/// Live-tail cursor: the next block to pull and how many blocks went by
/// since the last checkpoint.
#[derive(Debug)]
pub struct State {
    next_block_number: BlockNumber,
    blocks_since_checkpoint: u64,
}

impl State {
    pub fn new(next_block_number: BlockNumber) -> Self {
        Self { next_block_number, blocks_since_checkpoint: 0 }
    }

    pub fn get_next_block_number(&self) -> BlockNumber {
        self.next_block_number
    }

    /// Next range to pull, at most `max_blocks` long and never past
    /// `confirmed_tip`. `None` when nothing new is confirmed.
    pub fn next_range(&self, confirmed_tip: BlockNumber, max_blocks: u64) -> Option<BlockRange> {
        if self.next_block_number > confirmed_tip {
            return None;
        }
        let to = self
            .next_block_number
            .saturating_add(max_blocks.max(1) - 1)
            .min(confirmed_tip);
        Some(BlockRange::new(self.next_block_number, to))
    }

    // Every N blocks, produce a checkpoint at the end of the range.
    pub fn checkpoint_decision(&self, range: &BlockRange, interval: u64) -> bool {
        let blocks = range.to - range.from + 1;
        self.blocks_since_checkpoint + blocks >= interval.max(1)
    }

    pub fn on_chunk(&mut self, range: &BlockRange, checkpointed: bool) {
        self.next_block_number = range.to + 1;
        if checkpointed {
            self.blocks_since_checkpoint = 0;
        } else {
            self.blocks_since_checkpoint += range.to - range.from + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_pull_until_the_tip_moves() {
        let state = State::new(11);
        assert_eq!(state.next_range(10, 5), None);
        assert_eq!(state.next_range(11, 5), Some(BlockRange::new(11, 11)));
    }

    #[test]
    fn ranges_are_capped_by_size_and_tip() {
        let state = State::new(0);
        assert_eq!(state.next_range(100, 5), Some(BlockRange::new(0, 4)));
        assert_eq!(state.next_range(2, 5), Some(BlockRange::new(0, 2)));
        assert_eq!(state.next_range(100, 0), Some(BlockRange::new(0, 0)));
    }

    #[test]
    fn checkpoints_every_interval_blocks() {
        let mut state = State::new(0);

        let first = BlockRange::new(0, 1);
        assert!(!state.checkpoint_decision(&first, 3));
        state.on_chunk(&first, false);

        let second = BlockRange::new(2, 2);
        assert!(state.checkpoint_decision(&second, 3));
        state.on_chunk(&second, true);

        assert_eq!(state.get_next_block_number(), 3);
        assert!(!state.checkpoint_decision(&BlockRange::new(3, 3), 3));
    }
}
