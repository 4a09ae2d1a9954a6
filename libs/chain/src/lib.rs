pub mod contract;
pub mod events;
pub mod inspect;
pub mod ledger;
pub mod memory;
pub mod rpc;
