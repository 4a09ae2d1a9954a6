use alloy::primitives::{Address, BlockNumber, TxHash};
use serde::Serialize;
use std::fmt;
use store::campaign::model::ValidationError;
use store::utils::ParseError;

/// How a failed ingestion should be presented to whoever triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Will not succeed on retry.
    Terminal,
    /// Still in flight; retry later. Not a failure.
    Transient,
    /// The store lags the ledger; a backfill resolves it.
    NeedsReconciliation,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Disposition::Terminal => "failed",
            Disposition::Transient => "pending",
            Disposition::NeedsReconciliation => "awaiting reconciliation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("transaction {tx_hash} has {confirmations} of {required} required confirmations")]
    UnconfirmedTransaction { tx_hash: TxHash, confirmations: u64, required: u64 },

    #[error("transaction {tx_hash} reverted in block {block_number}")]
    LedgerTransactionFailed { tx_hash: TxHash, block_number: BlockNumber },

    #[error("campaign {campaign_id} has no off-chain projection")]
    ReferenceNotFound { campaign_id: i64 },

    #[error("no {kind} recorded for {key}")]
    RecordNotFound { kind: &'static str, key: String },

    #[error("campaign {campaign_id} does not exist on the ledger")]
    UnknownLedgerCampaign { campaign_id: u64 },

    #[error(
        "campaign {campaign_id} cannot be mirrored: only {mirrored} lower campaign IDs are present"
    )]
    CampaignSequenceGap { campaign_id: u64, mirrored: i64 },

    #[error("{caller} is not the ledger owner")]
    Unauthorized { caller: Address },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("store error: {0}")]
    Store(#[source] sqlx::Error),

    #[error("ledger error: {0:#}")]
    Ledger(eyre::Report),
}

impl IngestError {
    pub fn disposition(&self) -> Disposition {
        match self {
            IngestError::UnconfirmedTransaction { .. }
            | IngestError::StoreUnavailable(_)
            | IngestError::Ledger(_) => Disposition::Transient,
            IngestError::ReferenceNotFound { .. }
            | IngestError::RecordNotFound { .. }
            | IngestError::CampaignSequenceGap { .. } => Disposition::NeedsReconciliation,
            IngestError::LedgerTransactionFailed { .. }
            | IngestError::UnknownLedgerCampaign { .. }
            | IngestError::Unauthorized { .. }
            | IngestError::InvalidInput(_)
            | IngestError::Store(_) => Disposition::Terminal,
        }
    }

    /// Worth retrying immediately with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::StoreUnavailable(_) | IngestError::Ledger(_))
    }

    pub fn ledger(report: eyre::Report) -> Self {
        IngestError::Ledger(report)
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(e: sqlx::Error) -> Self {
        if store::error::is_transient(&e) {
            IngestError::StoreUnavailable(e)
        } else {
            IngestError::Store(e)
        }
    }
}

impl From<ValidationError> for IngestError {
    fn from(e: ValidationError) -> Self {
        IngestError::InvalidInput(e.to_string())
    }
}

impl From<ParseError> for IngestError {
    fn from(e: ParseError) -> Self {
        IngestError::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispositions() {
        let reverted =
            IngestError::LedgerTransactionFailed { tx_hash: TxHash::ZERO, block_number: 1 };
        assert_eq!(reverted.disposition(), Disposition::Terminal);

        let pending = IngestError::UnconfirmedTransaction {
            tx_hash: TxHash::ZERO,
            confirmations: 0,
            required: 1,
        };
        assert_eq!(pending.disposition(), Disposition::Transient);
        assert!(!pending.is_retryable());

        let missing = IngestError::ReferenceNotFound { campaign_id: 3 };
        assert_eq!(missing.disposition(), Disposition::NeedsReconciliation);

        let busy: IngestError = sqlx::Error::PoolTimedOut.into();
        assert!(busy.is_retryable());
        assert_eq!(busy.disposition(), Disposition::Transient);
    }
}
