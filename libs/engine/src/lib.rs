pub mod admin;
pub mod args;
pub mod backfill;
pub mod checkpointer;
pub mod confirmation;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod retry;
pub mod live {
    pub mod pubsub {
        pub mod publisher;
        pub mod subscriber;
    }
    pub mod sink {
        pub mod handle;
        pub mod reconciler;
    }
    pub mod source {
        pub mod filter;
        pub mod handle;
        pub mod ledger;
    }
    pub mod state {
        pub mod event;
        pub mod logic;
    }
}
