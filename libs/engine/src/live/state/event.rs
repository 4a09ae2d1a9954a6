use chain::ledger::BlockRef;

#[derive(Debug)]
pub enum Event<T> {
    Elements(Vec<T>),
    Checkpoint(Box<BlockRef>),
}

#[derive(Debug)]
pub struct Events<T>(pub Vec<Event<T>>);
