use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::amount::Amount;

/// A confirmed `FundsWithdrawn` event, keyed by its transaction hash.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Withdrawal {
    pub transaction_hash: String,
    pub recipient: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub log_index: i64,
    pub recorded_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn facts(&self) -> NewWithdrawal {
        NewWithdrawal {
            transaction_hash: self.transaction_hash.clone(),
            recipient: self.recipient.clone(),
            amount: self.amount,
            timestamp: self.timestamp,
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWithdrawal {
    pub transaction_hash: String,
    pub recipient: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub log_index: i64,
}
