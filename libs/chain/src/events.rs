use alloy::{
    primitives::{Address, B256, BlockHash, BlockNumber, TxHash, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};
use eyre::{Result, eyre};
use std::convert::TryFrom;

use crate::contract::IDonationTracker::{
    CampaignCreated, CampaignStatusChanged, DonationReceived, FundsWithdrawn,
};

/// Where an event sits in the ledger's total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventPosition {
    pub block_number: BlockNumber,
    pub transaction_index: u64,
    pub log_index: u64,
}

impl EventPosition {
    pub fn new(block_number: BlockNumber, transaction_index: u64, log_index: u64) -> Self {
        Self { block_number, transaction_index, log_index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEventKind {
    CampaignCreated { campaign_id: u64, beneficiary: Address, target_amount: U256, title: String },
    CampaignStatusChanged { campaign_id: u64, is_active: bool },
    DonationReceived {
        campaign_id: u64,
        donor: Address,
        amount: U256,
        timestamp: u64,
        message: String,
    },
    FundsWithdrawn { to: Address, amount: U256, timestamp: u64 },
}

impl LedgerEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::CampaignCreated { .. } => "CampaignCreated",
            LedgerEventKind::CampaignStatusChanged { .. } => "CampaignStatusChanged",
            LedgerEventKind::DonationReceived { .. } => "DonationReceived",
            LedgerEventKind::FundsWithdrawn { .. } => "FundsWithdrawn",
        }
    }
}

/// A decoded, mined contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub position: EventPosition,
    pub block_hash: BlockHash,
    pub transaction_hash: TxHash,
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn block_number(&self) -> BlockNumber {
        self.position.block_number
    }
}

/// Topic0 values of every event the reconciler consumes.
pub fn signatures() -> Vec<B256> {
    vec![
        CampaignCreated::SIGNATURE_HASH,
        CampaignStatusChanged::SIGNATURE_HASH,
        DonationReceived::SIGNATURE_HASH,
        FundsWithdrawn::SIGNATURE_HASH,
    ]
}

/// Sorts events into ledger order: block, then transaction, then log.
pub fn sort_by_position(events: &mut [LedgerEvent]) {
    events.sort_by_key(|event| event.position);
}

fn to_u64(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| eyre!("{field} does not fit in u64: {value}"))
}

impl TryFrom<&Log> for LedgerEvent {
    type Error = eyre::Report;

    fn try_from(log: &Log) -> Result<Self> {
        let position = EventPosition {
            block_number: log.block_number.ok_or_else(|| eyre!("missing block_number"))?,
            transaction_index: log
                .transaction_index
                .ok_or_else(|| eyre!("missing transaction_index"))?,
            log_index: log.log_index.ok_or_else(|| eyre!("missing log_index"))?,
        };
        let block_hash = log.block_hash.ok_or_else(|| eyre!("missing block_hash"))?;
        let transaction_hash =
            log.transaction_hash.ok_or_else(|| eyre!("missing transaction_hash"))?;
        let topic0 = *log.topic0().ok_or_else(|| eyre!("missing event signature"))?;

        let kind = if topic0 == DonationReceived::SIGNATURE_HASH {
            let event = log.log_decode::<DonationReceived>()?.inner.data;
            LedgerEventKind::DonationReceived {
                campaign_id: to_u64(event.campaignId, "campaignId")?,
                donor: event.donor,
                amount: event.amount,
                timestamp: to_u64(event.timestamp, "timestamp")?,
                message: event.message,
            }
        } else if topic0 == FundsWithdrawn::SIGNATURE_HASH {
            let event = log.log_decode::<FundsWithdrawn>()?.inner.data;
            LedgerEventKind::FundsWithdrawn {
                to: event.to,
                amount: event.amount,
                timestamp: to_u64(event.timestamp, "timestamp")?,
            }
        } else if topic0 == CampaignCreated::SIGNATURE_HASH {
            let event = log.log_decode::<CampaignCreated>()?.inner.data;
            LedgerEventKind::CampaignCreated {
                campaign_id: to_u64(event.campaignId, "campaignId")?,
                beneficiary: event.beneficiary,
                target_amount: event.targetAmount,
                title: event.title,
            }
        } else if topic0 == CampaignStatusChanged::SIGNATURE_HASH {
            let event = log.log_decode::<CampaignStatusChanged>()?.inner.data;
            LedgerEventKind::CampaignStatusChanged {
                campaign_id: to_u64(event.campaignId, "campaignId")?,
                is_active: event.isActive,
            }
        } else {
            return Err(eyre!("unknown event signature {topic0}"));
        };

        Ok(Self { position, block_hash, transaction_hash, kind })
    }
}
