use alloy::primitives::{Address, BlockNumber, TxHash, U256};
use chain::events::{LedgerEvent, LedgerEventKind};
use chain::ledger::{BlockRange, Ledger, LedgerCampaign};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use store::amount::Amount;
use store::campaign::model::{
    Campaign, CampaignMetadata, CampaignPatch, CampaignUpdate, NewCampaign, NewCampaignUpdate,
    StatusVersion, StatusWrite,
};
use store::campaign::store::Store as CampaignStore;
use store::admin::store::Store as AdminStore;
use store::client::Client;
use store::donation::model::{Donation, DonationAnnotation, MAX_MESSAGE_LEN, NewDonation};
use store::donation::store::Store as DonationStore;
use store::utils::{canonical_address, canonical_hash};
use store::withdrawal::model::{NewWithdrawal, Withdrawal};
use store::withdrawal::store::Store as WithdrawalStore;

use crate::admin::{self, Authorized};
use crate::confirmation::{self, Confirmed};
use crate::error::IngestError;
use crate::retry::{RetryPolicy, retry_transient};

const MAX_DONOR_NAME_LEN: usize = 100;

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Ingested<T> {
    Recorded(T),
    /// The key was already present; carries the stored record.
    AlreadyRecorded(T),
}

impl<T> Ingested<T> {
    pub fn record(&self) -> &T {
        match self {
            Ingested::Recorded(record) | Ingested::AlreadyRecorded(record) => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Ingested::Recorded(record) | Ingested::AlreadyRecorded(record) => record,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Ingested::Recorded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Applied {
    Campaign { campaign_id: i64 },
    Donation(Ingested<Donation>),
    Withdrawal(Ingested<Withdrawal>),
    Status { campaign_id: i64, is_active: bool, write: StatusWrite },
}

/// A donation as reported by whoever submitted the transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationClaim {
    pub transaction_hash: TxHash,
    pub campaign_id: u64,
    pub donor: Address,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: BlockNumber,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalClaim {
    pub transaction_hash: TxHash,
    pub recipient: Address,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSync {
    pub campaign_id: u64,
    pub is_active: bool,
    pub write: StatusWrite,
}

fn block_time(seconds: u64) -> Result<DateTime<Utc>, IngestError> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| {
            IngestError::InvalidInput(format!("block timestamp out of range: {seconds}"))
        })
}

fn campaign_key(campaign_id: u64) -> Result<i64, IngestError> {
    i64::try_from(campaign_id)
        .map_err(|_| IngestError::InvalidInput(format!("campaign id out of range: {campaign_id}")))
}

// Empty messages are stored as absent; overlong ones are cut at the store limit.
fn normalize_message(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_MESSAGE_LEN).collect())
}

fn new_donation(event: &LedgerEvent) -> Result<Option<NewDonation>, IngestError> {
    let LedgerEventKind::DonationReceived { campaign_id, donor, amount, timestamp, message } =
        &event.kind
    else {
        return Ok(None);
    };
    Ok(Some(NewDonation {
        transaction_hash: canonical_hash(&event.transaction_hash),
        campaign_id: campaign_key(*campaign_id)?,
        donor: canonical_address(donor),
        amount: Amount::from_wei(*amount),
        timestamp: block_time(*timestamp)?,
        block_number: event.block_number() as i64,
        log_index: event.position.log_index as i64,
        message: normalize_message(message),
    }))
}

fn new_withdrawal(event: &LedgerEvent) -> Result<Option<NewWithdrawal>, IngestError> {
    let LedgerEventKind::FundsWithdrawn { to, amount, timestamp } = &event.kind else {
        return Ok(None);
    };
    Ok(Some(NewWithdrawal {
        transaction_hash: canonical_hash(&event.transaction_hash),
        recipient: canonical_address(to),
        amount: Amount::from_wei(*amount),
        timestamp: block_time(*timestamp)?,
        block_number: event.block_number() as i64,
        log_index: event.position.log_index as i64,
    }))
}

fn ledger_campaign(
    campaign_id: i64,
    title: String,
    beneficiary: &Address,
    target_amount: U256,
    is_active: bool,
    version: StatusVersion,
) -> NewCampaign {
    NewCampaign {
        campaign_id,
        title,
        target_amount: Amount::from_wei(target_amount),
        beneficiary: canonical_address(beneficiary),
        is_active,
        version,
    }
}

fn mismatch(
    field: &str,
    claimed: impl std::fmt::Display,
    ledger: impl std::fmt::Display,
) -> IngestError {
    IngestError::InvalidInput(format!("{field} {claimed} disagrees with the ledger ({ledger})"))
}

pub struct Reconciler {
    campaigns: CampaignStore,
    donations: DonationStore,
    withdrawals: WithdrawalStore,
    admins: AdminStore,
    min_confirmations: u64,
    retry: RetryPolicy,
}

impl Reconciler {
    pub fn new(client: Client, min_confirmations: u64, retry: RetryPolicy) -> Self {
        Self {
            campaigns: CampaignStore::new(client.clone()),
            donations: DonationStore::new(client.clone()),
            withdrawals: WithdrawalStore::new(client.clone()),
            admins: AdminStore::new(client),
            min_confirmations,
            retry,
        }
    }

    pub fn min_confirmations(&self) -> u64 {
        self.min_confirmations
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ---------------------------
    // DIRECT INGESTION
    // ---------------------------

    /// The claim is checked against the receipt; the stored facts are the ledger's.
    pub async fn record_donation(
        &self,
        ledger: &dyn Ledger,
        claim: &DonationClaim,
    ) -> Result<Ingested<Donation>, IngestError> {
        if claim.amount.is_zero() {
            return Err(IngestError::InvalidInput("donation amount must be positive".into()));
        }
        let event = self
            .confirmed_event(ledger, claim.transaction_hash, claim.block_number, |kind| {
                matches!(kind, LedgerEventKind::DonationReceived { .. })
            })
            .await?;
        let Some(donation) = new_donation(&event)? else {
            return Err(IngestError::InvalidInput("transaction emitted no donation".into()));
        };

        if donation.campaign_id as u64 != claim.campaign_id {
            return Err(mismatch("campaign", claim.campaign_id, donation.campaign_id));
        }
        if donation.donor != canonical_address(&claim.donor) {
            return Err(mismatch("donor", claim.donor, &donation.donor));
        }
        if donation.amount != claim.amount {
            return Err(mismatch("amount", claim.amount, donation.amount));
        }
        if donation.timestamp != claim.timestamp {
            return Err(mismatch("timestamp", claim.timestamp, donation.timestamp));
        }

        self.insert_donation(Confirmed::new(donation, event.block_number())).await
    }

    pub async fn record_withdrawal(
        &self,
        ledger: &dyn Ledger,
        claim: &WithdrawalClaim,
    ) -> Result<Ingested<Withdrawal>, IngestError> {
        let event = self
            .confirmed_event(ledger, claim.transaction_hash, claim.block_number, |kind| {
                matches!(kind, LedgerEventKind::FundsWithdrawn { .. })
            })
            .await?;
        let Some(withdrawal) = new_withdrawal(&event)? else {
            return Err(IngestError::InvalidInput("transaction emitted no withdrawal".into()));
        };

        if withdrawal.recipient != canonical_address(&claim.recipient) {
            return Err(mismatch("recipient", claim.recipient, &withdrawal.recipient));
        }
        if withdrawal.amount != claim.amount {
            return Err(mismatch("amount", claim.amount, withdrawal.amount));
        }
        if withdrawal.timestamp != claim.timestamp {
            return Err(mismatch("timestamp", claim.timestamp, withdrawal.timestamp));
        }

        self.insert_withdrawal(Confirmed::new(withdrawal, event.block_number())).await
    }

    pub async fn ingest_transaction(
        &self,
        ledger: &dyn Ledger,
        tx_hash: TxHash,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Vec<Applied>, IngestError> {
        let confirmed = confirmation::await_confirmation(
            ledger,
            tx_hash,
            self.min_confirmations,
            timeout,
            poll_interval,
        )
        .await?;

        let events = retry_transient(&self.retry, "transaction_events", || async {
            ledger.transaction_events(tx_hash).await.map_err(IngestError::ledger)
        })
        .await?;

        let mut applied = Vec::with_capacity(events.len());
        for event in events {
            let event = Confirmed::new(event, confirmed.block_number());
            applied.push(self.apply(&event).await?);
        }
        tracing::info!("Ingested {} event(s) from {tx_hash}", applied.len());
        Ok(applied)
    }

    // ---------------------------
    // EVENT APPLICATION
    // ---------------------------

    /// Applies one confirmed ledger event. Safe to repeat and to run out of order.
    pub async fn apply(&self, event: &Confirmed<LedgerEvent>) -> Result<Applied, IngestError> {
        let block_number = event.block_number();
        let log_index = event.position.log_index;

        match &event.kind {
            LedgerEventKind::CampaignCreated { campaign_id, beneficiary, target_amount, title } => {
                let campaign = ledger_campaign(
                    campaign_key(*campaign_id)?,
                    title.trim().to_string(),
                    beneficiary,
                    *target_amount,
                    true,
                    StatusVersion::at_log(block_number, log_index),
                );
                retry_transient(&self.retry, "upsert_campaign", || async {
                    Ok(self.campaigns.upsert_from_ledger(&campaign).await?)
                })
                .await?;
                tracing::info!("Mirrored campaign {campaign_id} from block {block_number}");
                Ok(Applied::Campaign { campaign_id: campaign.campaign_id })
            }
            LedgerEventKind::CampaignStatusChanged { campaign_id, is_active } => {
                let key = campaign_key(*campaign_id)?;
                let version = StatusVersion::at_log(block_number, log_index);
                let write = self.assert_status(key, *is_active, version).await?;
                Ok(Applied::Status { campaign_id: key, is_active: *is_active, write })
            }
            LedgerEventKind::DonationReceived { .. } => {
                let Some(donation) = new_donation(event)? else {
                    return Err(IngestError::InvalidInput("not a donation".into()));
                };
                let ingested = self.insert_donation(Confirmed::new(donation, block_number)).await?;
                Ok(Applied::Donation(ingested))
            }
            LedgerEventKind::FundsWithdrawn { .. } => {
                let Some(withdrawal) = new_withdrawal(event)? else {
                    return Err(IngestError::InvalidInput("not a withdrawal".into()));
                };
                let ingested =
                    self.insert_withdrawal(Confirmed::new(withdrawal, block_number)).await?;
                Ok(Applied::Withdrawal(ingested))
            }
        }
    }

    /// Re-asserts the active flag as of the confirmed tip. Never inverts it.
    pub async fn toggle_campaign_status(
        &self,
        ledger: &dyn Ledger,
        campaign_id: u64,
    ) -> Result<StatusSync, IngestError> {
        let key = campaign_key(campaign_id)?;
        let (confirmed_tip, latest, campaign) =
            self.confirmed_campaign(ledger, campaign_id).await?;

        if let Some(pending) =
            self.unconfirmed_change(ledger, campaign_id, confirmed_tip, latest).await?
        {
            return Err(pending);
        }
        let campaign = campaign.ok_or(IngestError::UnknownLedgerCampaign { campaign_id })?;

        let write = self
            .assert_status(key, campaign.is_active, StatusVersion::at_block(confirmed_tip))
            .await?;
        Ok(StatusSync { campaign_id, is_active: campaign.is_active, write })
    }

    // ---------------------------
    // ADMIN OPERATIONS
    // ---------------------------

    pub async fn authorize(
        &self,
        ledger: &dyn Ledger,
        caller: Address,
    ) -> Result<Authorized, IngestError> {
        admin::authorize(ledger, &self.admins, caller).await
    }

    /// Copies the ledger's campaign, as of the confirmed tip, with its metadata.
    pub async fn mirror_campaign(
        &self,
        ledger: &dyn Ledger,
        authorization: Authorized,
        campaign_id: u64,
        metadata: &CampaignMetadata,
    ) -> Result<Campaign, IngestError> {
        metadata.validate()?;
        let key = campaign_key(campaign_id)?;

        let (confirmed_tip, _, campaign) = self.confirmed_campaign(ledger, campaign_id).await?;
        let campaign = campaign.ok_or(IngestError::UnknownLedgerCampaign { campaign_id })?;

        let mirrored = self.campaigns.count_below(key).await?;
        if mirrored < key {
            return Err(IngestError::CampaignSequenceGap { campaign_id, mirrored });
        }

        let new = ledger_campaign(
            key,
            metadata.title.trim().to_string(),
            &campaign.beneficiary,
            campaign.target_amount,
            campaign.is_active,
            StatusVersion::at_block(confirmed_tip),
        );
        let stored = retry_transient(&self.retry, "mirror_campaign", || async {
            Ok(self.campaigns.mirror(&new, metadata).await?)
        })
        .await?;
        tracing::info!("Campaign {campaign_id} mirrored by {}", authorization.caller());
        Ok(stored)
    }

    pub async fn update_campaign_metadata(
        &self,
        authorization: Authorized,
        campaign_id: u64,
        patch: &CampaignPatch,
    ) -> Result<Campaign, IngestError> {
        patch.validate()?;
        let key = campaign_key(campaign_id)?;
        let updated = self
            .campaigns
            .update_metadata(key, patch)
            .await?
            .ok_or(IngestError::ReferenceNotFound { campaign_id: key })?;
        tracing::info!("Campaign {campaign_id} metadata updated by {}", authorization.caller());
        Ok(updated)
    }

    pub async fn add_campaign_update(
        &self,
        authorization: Authorized,
        campaign_id: u64,
        update: &NewCampaignUpdate,
    ) -> Result<CampaignUpdate, IngestError> {
        update.validate()?;
        let key = campaign_key(campaign_id)?;
        if !self.campaigns.exists(key).await? {
            return Err(IngestError::ReferenceNotFound { campaign_id: key });
        }
        let posted = self.campaigns.add_update(key, update).await?;
        tracing::info!("Campaign {campaign_id} update posted by {}", authorization.caller());
        Ok(posted)
    }

    pub async fn annotate_donation(
        &self,
        tx_hash: TxHash,
        annotation: &DonationAnnotation,
    ) -> Result<Donation, IngestError> {
        if let Some(name) = &annotation.donor_name {
            if name.chars().count() > MAX_DONOR_NAME_LEN {
                return Err(IngestError::InvalidInput(format!(
                    "donor name must be at most {MAX_DONOR_NAME_LEN} characters"
                )));
            }
        }
        if let Some(email) = &annotation.donor_email {
            if !email.contains('@') {
                return Err(IngestError::InvalidInput(format!("invalid email `{email}`")));
            }
        }

        let key = canonical_hash(&tx_hash);
        self.donations
            .annotate(&key, annotation)
            .await?
            .ok_or(IngestError::RecordNotFound { kind: "donation", key })
    }

    // ---------------------------
    // INTERNALS
    // ---------------------------

    // The single DonationReceived/FundsWithdrawn event of a confirmed transaction.
    async fn confirmed_event(
        &self,
        ledger: &dyn Ledger,
        tx_hash: TxHash,
        claimed_block: BlockNumber,
        wanted: impl Fn(&LedgerEventKind) -> bool,
    ) -> Result<LedgerEvent, IngestError> {
        let confirmed = retry_transient(&self.retry, "ensure_confirmed", || {
            confirmation::ensure_confirmed(ledger, tx_hash, self.min_confirmations)
        })
        .await?;
        if confirmed.block_number() != claimed_block {
            return Err(mismatch("block number", claimed_block, confirmed.block_number()));
        }

        let events = retry_transient(&self.retry, "transaction_events", || async {
            ledger.transaction_events(tx_hash).await.map_err(IngestError::ledger)
        })
        .await?;
        events
            .into_iter()
            .find(|event| wanted(&event.kind))
            .ok_or_else(|| {
                IngestError::InvalidInput(format!("{tx_hash} emitted no matching event"))
            })
    }

    // The campaign as of the confirmed tip, with that tip and the latest block.
    async fn confirmed_campaign(
        &self,
        ledger: &dyn Ledger,
        campaign_id: u64,
    ) -> Result<(BlockNumber, BlockNumber, Option<LedgerCampaign>), IngestError> {
        retry_transient(&self.retry, "read_campaign", || async {
            let latest = ledger.latest_block_number().await.map_err(IngestError::ledger)?;
            let confirmed_tip = confirmation::confirmed_tip(latest, self.min_confirmations);
            let campaign =
                ledger.campaign(campaign_id, confirmed_tip).await.map_err(IngestError::ledger)?;
            Ok((confirmed_tip, latest, campaign))
        })
        .await
    }

    // The newest creation or status change of the campaign mined after the
    // confirmed tip, as the unconfirmed error it implies.
    async fn unconfirmed_change(
        &self,
        ledger: &dyn Ledger,
        campaign_id: u64,
        confirmed_tip: BlockNumber,
        latest: BlockNumber,
    ) -> Result<Option<IngestError>, IngestError> {
        if latest <= confirmed_tip {
            return Ok(None);
        }
        let range = BlockRange::new(confirmed_tip + 1, latest);
        let events = retry_transient(&self.retry, "unconfirmed_events", || async {
            ledger.events(range).await.map_err(IngestError::ledger)
        })
        .await?;

        let change = events.iter().rev().find(|event| {
            matches!(
                event.kind,
                LedgerEventKind::CampaignCreated { campaign_id: id, .. }
                    | LedgerEventKind::CampaignStatusChanged { campaign_id: id, .. }
                    if id == campaign_id
            )
        });
        Ok(change.map(|event| IngestError::UnconfirmedTransaction {
            tx_hash: event.transaction_hash,
            confirmations: (latest + 1).saturating_sub(event.block_number()),
            required: self.min_confirmations.max(1),
        }))
    }

    async fn assert_status(
        &self,
        campaign_id: i64,
        is_active: bool,
        version: StatusVersion,
    ) -> Result<StatusWrite, IngestError> {
        let write = retry_transient(&self.retry, "assert_status", || async {
            Ok(self.campaigns.assert_status(campaign_id, is_active, version).await?)
        })
        .await?;

        match write {
            StatusWrite::Missing => Err(IngestError::ReferenceNotFound { campaign_id }),
            StatusWrite::Applied => {
                tracing::info!("Campaign {campaign_id} is_active={is_active} at {version:?}");
                Ok(write)
            }
            StatusWrite::Superseded => {
                tracing::debug!("Campaign {campaign_id} status at {version:?} already superseded");
                Ok(write)
            }
        }
    }

    async fn insert_donation(
        &self,
        donation: Confirmed<NewDonation>,
    ) -> Result<Ingested<Donation>, IngestError> {
        retry_transient(&self.retry, "insert_donation", || self.try_insert_donation(&donation))
            .await
    }

    async fn try_insert_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<Ingested<Donation>, IngestError> {
        if let Some(existing) = self.donations.get(&donation.transaction_hash).await? {
            return Ok(self.already_recorded_donation(existing, donation));
        }
        if !self.campaigns.exists(donation.campaign_id).await? {
            return Err(IngestError::ReferenceNotFound { campaign_id: donation.campaign_id });
        }

        match self.donations.insert(donation).await {
            Ok(stored) => {
                tracing::info!(
                    "Recorded donation {} of {} to campaign {}",
                    stored.transaction_hash,
                    stored.amount,
                    stored.campaign_id
                );
                Ok(Ingested::Recorded(stored))
            }
            // Lost the race against a concurrent writer.
            Err(e) if store::error::is_unique_violation(&e) => {
                let existing = self.donations.get(&donation.transaction_hash).await?.ok_or_else(
                    || IngestError::RecordNotFound {
                        kind: "donation",
                        key: donation.transaction_hash.clone(),
                    },
                )?;
                Ok(self.already_recorded_donation(existing, donation))
            }
            Err(e) if store::error::is_foreign_key_violation(&e) => {
                Err(IngestError::ReferenceNotFound { campaign_id: donation.campaign_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn already_recorded_donation(
        &self,
        existing: Donation,
        incoming: &NewDonation,
    ) -> Ingested<Donation> {
        if &existing.facts() != incoming {
            tracing::warn!(
                "Donation {} already recorded with different facts: stored {:?}, incoming {:?}",
                existing.transaction_hash,
                existing.facts(),
                incoming
            );
        } else {
            tracing::debug!("Donation {} already recorded", existing.transaction_hash);
        }
        Ingested::AlreadyRecorded(existing)
    }

    async fn insert_withdrawal(
        &self,
        withdrawal: Confirmed<NewWithdrawal>,
    ) -> Result<Ingested<Withdrawal>, IngestError> {
        retry_transient(&self.retry, "insert_withdrawal", || {
            self.try_insert_withdrawal(&withdrawal)
        })
        .await
    }

    async fn try_insert_withdrawal(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<Ingested<Withdrawal>, IngestError> {
        if let Some(existing) = self.withdrawals.get(&withdrawal.transaction_hash).await? {
            return Ok(Ingested::AlreadyRecorded(existing));
        }

        match self.withdrawals.insert(withdrawal).await {
            Ok(stored) => {
                tracing::info!(
                    "Recorded withdrawal {} of {} to {}",
                    stored.transaction_hash,
                    stored.amount,
                    stored.recipient
                );
                Ok(Ingested::Recorded(stored))
            }
            Err(e) if store::error::is_unique_violation(&e) => {
                let existing = self.withdrawals.get(&withdrawal.transaction_hash).await?.ok_or_else(
                    || IngestError::RecordNotFound {
                        kind: "withdrawal",
                        key: withdrawal.transaction_hash.clone(),
                    },
                )?;
                Ok(Ingested::AlreadyRecorded(existing))
            }
            Err(e) => Err(e.into()),
        }
    }
}
