use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::amount::Amount;

pub const MAX_MESSAGE_LEN: usize = 500;

/// A confirmed `DonationReceived` event, keyed by its transaction hash.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Donation {
    pub transaction_hash: String,
    pub campaign_id: i64,
    pub donor: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub log_index: i64,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Donation {
    /// The ledger-derived part of the record.
    pub fn facts(&self) -> NewDonation {
        NewDonation {
            transaction_hash: self.transaction_hash.clone(),
            campaign_id: self.campaign_id,
            donor: self.donor.clone(),
            amount: self.amount,
            timestamp: self.timestamp,
            block_number: self.block_number,
            log_index: self.log_index,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub transaction_hash: String,
    pub campaign_id: i64,
    pub donor: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub log_index: i64,
    pub message: Option<String>,
}

/// Off-chain annotation fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationAnnotation {
    pub is_anonymous: Option<bool>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
}

impl DonationAnnotation {
    pub fn is_empty(&self) -> bool {
        self == &DonationAnnotation::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub campaign_id: Option<i64>,
    /// Canonical donor address.
    pub donor: Option<String>,
}
