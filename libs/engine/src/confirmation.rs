use alloy::primitives::{BlockHash, BlockNumber, TxHash};
use chain::ledger::{Ledger, TxStatus};
use std::ops::Deref;
use std::time::Duration;

use crate::error::IngestError;

/// A value whose ledger block has at least the configured confirmations.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmed<T> {
    inner: T,
    block_number: BlockNumber,
}

impl<T> Confirmed<T> {
    pub(crate) fn new(inner: T, block_number: BlockNumber) -> Self {
        Self { inner, block_number }
    }

    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }
}

impl<T> Deref for Confirmed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTx {
    pub tx_hash: TxHash,
    pub block_number: BlockNumber,
    pub block_hash: BlockHash,
}

/// Highest block with at least `min_confirmations` confirmations. The tip
/// itself counts as one confirmation.
pub fn confirmed_tip(latest: BlockNumber, min_confirmations: u64) -> BlockNumber {
    latest.saturating_sub(min_confirmations.max(1) - 1)
}

pub async fn ensure_confirmed(
    ledger: &dyn Ledger,
    tx_hash: TxHash,
    min_confirmations: u64,
) -> Result<Confirmed<ConfirmedTx>, IngestError> {
    let required = min_confirmations.max(1);
    let status = ledger.transaction_status(tx_hash).await.map_err(IngestError::ledger)?;

    match status {
        TxStatus::Unknown | TxStatus::Pending => {
            Err(IngestError::UnconfirmedTransaction { tx_hash, confirmations: 0, required })
        }
        TxStatus::Reverted { block_number } => {
            Err(IngestError::LedgerTransactionFailed { tx_hash, block_number })
        }
        TxStatus::Included { block_number, block_hash, .. } => {
            let latest = ledger.latest_block_number().await.map_err(IngestError::ledger)?;
            let confirmations = (latest + 1).saturating_sub(block_number);
            if confirmations < required {
                return Err(IngestError::UnconfirmedTransaction {
                    tx_hash,
                    confirmations,
                    required,
                });
            }
            Ok(Confirmed::new(ConfirmedTx { tx_hash, block_number, block_hash }, block_number))
        }
    }
}

/// Polls until the transaction confirms or fails. On timeout the last
/// unconfirmed error is returned.
pub async fn await_confirmation(
    ledger: &dyn Ledger,
    tx_hash: TxHash,
    min_confirmations: u64,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Confirmed<ConfirmedTx>, IngestError> {
    let mut last = IngestError::UnconfirmedTransaction {
        tx_hash,
        confirmations: 0,
        required: min_confirmations.max(1),
    };

    let waited = tokio::time::timeout(timeout, async {
        loop {
            match ensure_confirmed(ledger, tx_hash, min_confirmations).await {
                Ok(confirmed) => return Ok(confirmed),
                Err(e @ IngestError::UnconfirmedTransaction { .. }) => {
                    tracing::debug!("Waiting for {tx_hash}: {e}");
                    last = e;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("Waiting for {tx_hash}: ledger lookup failed - reason {e}");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    })
    .await;

    match waited {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Gave up waiting for {tx_hash} after {timeout:?}");
            Err(last)
        }
    }
}
