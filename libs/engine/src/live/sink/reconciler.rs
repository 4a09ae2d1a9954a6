use alloy::primitives::BlockNumber;
use chain::events::LedgerEvent;
use eyre::{Result, eyre};
use serde::Serialize;
use std::sync::Arc;
use store::campaign::model::StatusWrite;
use store::utils::canonical_hash;
use tokio::sync::Mutex;

use crate::confirmation::Confirmed;
use crate::error::IngestError;
use crate::live::sink::handle::Sink;
use crate::reconciler::{Applied, Reconciler};

/// Running counts of what the sink applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub campaigns: u64,
    pub donations_recorded: u64,
    pub donations_already_recorded: u64,
    pub withdrawals_recorded: u64,
    pub withdrawals_already_recorded: u64,
    pub status_applied: u64,
    pub status_superseded: u64,
}

impl Tally {
    pub fn record(&mut self, applied: &Applied) {
        match applied {
            Applied::Campaign { .. } => self.campaigns += 1,
            Applied::Donation(ingested) if ingested.is_new() => self.donations_recorded += 1,
            Applied::Donation(_) => self.donations_already_recorded += 1,
            Applied::Withdrawal(ingested) if ingested.is_new() => self.withdrawals_recorded += 1,
            Applied::Withdrawal(_) => self.withdrawals_already_recorded += 1,
            Applied::Status { write: StatusWrite::Applied, .. } => self.status_applied += 1,
            Applied::Status { .. } => self.status_superseded += 1,
        }
    }
}

/// An event parked until its campaign shows up in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredEvent {
    pub event: &'static str,
    pub transaction_hash: String,
    pub block_number: BlockNumber,
    pub log_index: u64,
    pub campaign_id: i64,
}

struct Deferred {
    event: Confirmed<LedgerEvent>,
    campaign_id: i64,
}

/// Applies confirmed ledger events to the store. Events whose campaign is
/// not mirrored yet are deferred and retried after every batch.
pub struct ReconcilerSink {
    reconciler: Arc<Reconciler>,
    deferred: Mutex<Vec<Deferred>>,
    tally: Mutex<Tally>,
}

impl ReconcilerSink {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler, deferred: Mutex::new(Vec::new()), tally: Mutex::new(Tally::default()) }
    }

    pub async fn tally(&self) -> Tally {
        *self.tally.lock().await
    }

    pub async fn deferred(&self) -> Vec<DeferredEvent> {
        self.deferred
            .lock()
            .await
            .iter()
            .map(|deferred| DeferredEvent {
                event: deferred.event.kind.name(),
                transaction_hash: canonical_hash(&deferred.event.transaction_hash),
                block_number: deferred.event.block_number(),
                log_index: deferred.event.position.log_index,
                campaign_id: deferred.campaign_id,
            })
            .collect()
    }

    // Ok(Some) when the event has to wait for its campaign.
    async fn try_apply(&self, event: &Confirmed<LedgerEvent>) -> Result<Option<i64>> {
        match self.reconciler.apply(event).await {
            Ok(applied) => {
                self.tally.lock().await.record(&applied);
                Ok(None)
            }
            Err(IngestError::ReferenceNotFound { campaign_id }) => Ok(Some(campaign_id)),
            Err(e) => {
                tracing::error!(
                    "Sink failed on [apply] {} at {:?} - reason {e}",
                    event.kind.name(),
                    event.position
                );
                Err(eyre!(e))
            }
        }
    }

    async fn apply_or_defer(&self, event: &Confirmed<LedgerEvent>) -> Result<()> {
        if let Some(campaign_id) = self.try_apply(event).await? {
            let mut deferred = self.deferred.lock().await;
            let known = deferred.iter().any(|parked| parked.event.position == event.position);
            if !known {
                tracing::warn!(
                    "Deferred {} in {} until campaign {campaign_id} is mirrored",
                    event.kind.name(),
                    event.transaction_hash
                );
                deferred.push(Deferred { event: event.clone(), campaign_id });
            }
        }
        Ok(())
    }

    async fn retry_deferred(&self) -> Result<()> {
        let parked = std::mem::take(&mut *self.deferred.lock().await);
        if parked.is_empty() {
            return Ok(());
        }

        let mut still_waiting = Vec::new();
        let mut failure = None;
        for deferred in parked {
            if failure.is_some() {
                still_waiting.push(deferred);
                continue;
            }
            match self.try_apply(&deferred.event).await {
                Ok(None) => {
                    tracing::info!(
                        "Applied deferred {} in {}",
                        deferred.event.kind.name(),
                        deferred.event.transaction_hash
                    );
                }
                Ok(Some(_)) => still_waiting.push(deferred),
                Err(e) => {
                    still_waiting.push(deferred);
                    failure = Some(e);
                }
            }
        }

        let mut deferred = self.deferred.lock().await;
        still_waiting.append(&mut deferred);
        *deferred = still_waiting;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Sink for ReconcilerSink {
    type Item = Confirmed<LedgerEvent>;

    async fn process(&self, event: &Confirmed<LedgerEvent>) -> Result<()> {
        self.apply_or_defer(event).await?;
        self.retry_deferred().await
    }

    async fn process_batch(&self, events: &[Confirmed<LedgerEvent>]) -> Result<()> {
        for event in events {
            self.apply_or_defer(event).await?;
        }
        tracing::info!("Processed batch: {}", events.len());
        self.retry_deferred().await
    }

    async fn pending_from(&self) -> Option<BlockNumber> {
        self.deferred.lock().await.iter().map(|deferred| deferred.event.block_number()).min()
    }
}
