#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, TxHash, U256};
    use chain::events::LedgerEventKind;
    use chain::ledger::Ledger;
    use chain::memory::{MemoryLedger, Operation};
    use chrono::DateTime;
    use engine::error::{Disposition, IngestError};
    use engine::reconciler::{Applied, DonationClaim, Ingested, Reconciler, WithdrawalClaim};
    use engine::retry::RetryPolicy;
    use eyre::{Result, eyre};
    use std::time::Duration;
    use store::amount::Amount;
    use store::campaign::model::{
        CampaignMetadata, CampaignPatch, Category, NewCampaignUpdate, StatusWrite,
    };
    use store::campaign::store::Store as CampaignStore;
    use store::client::Client;
    use store::donation::model::DonationAnnotation;
    use store::donation::store::Store as DonationStore;

    const OWNER: Address = Address::repeat_byte(0x01);
    const DONOR: Address = Address::repeat_byte(0x02);
    const BENEFICIARY: Address = Address::repeat_byte(0x03);

    fn ether(amount: &str) -> U256 {
        amount.parse::<Amount>().unwrap().wei()
    }

    fn metadata(title: &str) -> CampaignMetadata {
        CampaignMetadata {
            title: title.to_string(),
            description: "Shelter and clean water".to_string(),
            category: Category::DisasterRelief,
            location: Some("Valencia".to_string()),
            images: Vec::new(),
        }
    }

    async fn create_campaign(ledger: &MemoryLedger, title: &str) -> TxHash {
        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: BENEFICIARY,
                target_amount: ether("10"),
                title: title.to_string(),
            })
            .await
    }

    fn donate(campaign_id: u64, amount: &str, message: &str) -> Operation {
        Operation::Donate {
            campaign_id,
            donor: DONOR,
            amount: ether(amount),
            message: message.to_string(),
        }
    }

    async fn mirror(
        reconciler: &Reconciler,
        ledger: &MemoryLedger,
        campaign_id: u64,
    ) -> Result<()> {
        let authorization = reconciler.authorize(ledger, OWNER).await?;
        reconciler
            .mirror_campaign(ledger, authorization, campaign_id, &metadata("Flood relief"))
            .await?;
        Ok(())
    }

    // Builds the claim a client would send, from the ledger's own receipt.
    async fn claim_for(ledger: &MemoryLedger, tx_hash: TxHash) -> Result<DonationClaim> {
        let events = ledger.transaction_events(tx_hash).await?;
        let event = events.first().ok_or_else(|| eyre!("no events for {tx_hash}"))?;
        match &event.kind {
            LedgerEventKind::DonationReceived {
                campaign_id, donor, amount, timestamp, message
            } => Ok(DonationClaim {
                transaction_hash: tx_hash,
                campaign_id: *campaign_id,
                donor: *donor,
                amount: Amount::from_wei(*amount),
                timestamp: DateTime::from_timestamp(*timestamp as i64, 0).unwrap(),
                block_number: event.block_number(),
                message: Some(message.clone()),
            }),
            other => Err(eyre!("unexpected event {other:?}")),
        }
    }

    fn unmined_claim(tx_hash: TxHash, amount: &str) -> DonationClaim {
        DonationClaim {
            transaction_hash: tx_hash,
            campaign_id: 0,
            donor: DONOR,
            amount: amount.parse().unwrap(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            block_number: 0,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_record_donation_twice_keeps_one_identical_record() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());
        let donations = DonationStore::new(client.clone());

        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;

        let tx_hash = TxHash::repeat_byte(0xaa);
        ledger.execute_with_hash(tx_hash, donate(0, "0.5", "stay strong")).await;
        let claim = claim_for(&ledger, tx_hash).await?;

        let first = reconciler.record_donation(&ledger, &claim).await?;
        let second = reconciler.record_donation(&ledger, &claim).await?;

        assert!(first.is_new());
        assert!(matches!(second, Ingested::AlreadyRecorded(_)));
        assert_eq!(first.record(), second.record());

        let stored = donations.all().await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].transaction_hash, format!("0x{}", "a".repeat(64)));
        assert_eq!(stored[0].campaign_id, 0);
        assert_eq!(stored[0].amount.to_string(), "0.5");
        assert_eq!(stored[0].message.as_deref(), Some("stay strong"));
        assert_eq!(&stored[0], first.record());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_donation_waits_for_confirmations() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 3, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        ledger.mine_blocks(2).await;
        mirror(&reconciler, &ledger, 0).await?;

        // Pending: not mined at all
        let pending = ledger.submit(donate(0, "1", "")).await;
        let err =
            reconciler.record_donation(&ledger, &unmined_claim(pending, "1")).await.unwrap_err();
        assert!(matches!(err, IngestError::UnconfirmedTransaction { confirmations: 0, .. }));
        assert_eq!(err.disposition(), Disposition::Transient);

        // Mined, one confirmation of three
        ledger.mine().await;
        let claim = claim_for(&ledger, pending).await?;
        let err = reconciler.record_donation(&ledger, &claim).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnconfirmedTransaction { confirmations: 1, required: 3, .. }
        ));
        assert!(DonationStore::new(client.clone()).all().await?.is_empty());

        ledger.mine_blocks(2).await;
        let recorded = reconciler.record_donation(&ledger, &claim).await?;
        assert!(recorded.is_new());
        Ok(())
    }

    #[tokio::test]
    async fn test_campaign_reads_wait_for_confirmations() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 3, RetryPolicy::none());
        let campaigns = CampaignStore::new(client.clone());

        // Created one block ago: not visible at the confirmed tip yet
        let created = create_campaign(&ledger, "Flood relief").await;
        let err = mirror(&reconciler, &ledger, 0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::UnknownLedgerCampaign { campaign_id: 0 })
        ));
        assert!(campaigns.get(0).await?.is_none());
        assert!(matches!(
            reconciler.toggle_campaign_status(&ledger, 0).await,
            Err(IngestError::UnconfirmedTransaction { tx_hash, confirmations: 1, required: 3 })
                if tx_hash == created
        ));

        ledger.mine_blocks(2).await;
        mirror(&reconciler, &ledger, 0).await?;
        assert!(campaigns.get(0).await?.unwrap().is_active);

        // A fresh toggle stays invisible until it is deep enough
        let toggled = ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;
        let err = reconciler.toggle_campaign_status(&ledger, 0).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnconfirmedTransaction { tx_hash, confirmations: 1, required: 3 }
                if tx_hash == toggled
        ));
        assert_eq!(err.disposition(), Disposition::Transient);
        assert!(campaigns.get(0).await?.unwrap().is_active);

        ledger.mine_blocks(2).await;
        let synced = reconciler.toggle_campaign_status(&ledger, 0).await?;
        assert!(!synced.is_active);
        assert_eq!(synced.write, StatusWrite::Applied);
        assert!(!campaigns.get(0).await?.unwrap().is_active);

        assert!(matches!(
            reconciler.toggle_campaign_status(&ledger, 4).await,
            Err(IngestError::UnknownLedgerCampaign { campaign_id: 4 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_donation_rejects_reverted_transaction() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;

        // Inactive campaigns reject donations on the ledger
        let tx_hash = ledger.execute(donate(0, "1", "")).await;
        let err =
            reconciler.record_donation(&ledger, &unmined_claim(tx_hash, "1")).await.unwrap_err();

        assert!(matches!(err, IngestError::LedgerTransactionFailed { .. }));
        assert_eq!(err.disposition(), Disposition::Terminal);
        assert_eq!(err.disposition().to_string(), "failed");
        Ok(())
    }

    #[tokio::test]
    async fn test_record_donation_for_unmirrored_campaign() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        let tx_hash = ledger.execute(donate(0, "2", "")).await;
        let claim = claim_for(&ledger, tx_hash).await?;

        let err = reconciler.record_donation(&ledger, &claim).await.unwrap_err();

        assert!(matches!(err, IngestError::ReferenceNotFound { campaign_id: 0 }));
        assert_eq!(err.disposition(), Disposition::NeedsReconciliation);
        assert!(DonationStore::new(client.clone()).all().await?.is_empty());

        // Once mirrored, the same claim goes through
        mirror(&reconciler, &ledger, 0).await?;
        assert!(reconciler.record_donation(&ledger, &claim).await?.is_new());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_donation_rejects_claims_that_disagree_with_the_ledger() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;
        let tx_hash = ledger.execute(donate(0, "0.5", "")).await;
        let claim = claim_for(&ledger, tx_hash).await?;

        let inflated = DonationClaim { amount: "5".parse()?, ..claim.clone() };
        let err = reconciler.record_donation(&ledger, &inflated).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidInput(_)));

        let zero = DonationClaim { amount: Amount::ZERO, ..claim.clone() };
        assert!(matches!(
            reconciler.record_donation(&ledger, &zero).await,
            Err(IngestError::InvalidInput(_))
        ));

        let elsewhere = DonationClaim { block_number: claim.block_number + 1, ..claim };
        assert!(matches!(
            reconciler.record_donation(&ledger, &elsewhere).await,
            Err(IngestError::InvalidInput(_))
        ));
        assert!(DonationStore::new(client.clone()).all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_ingestion_stores_one_record() -> Result<()> {
        // A file database so every pool connection sees the same data
        let path = std::env::temp_dir().join(format!(
            "donation-indexer-{}-{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let client = Client::init(&format!("sqlite://{}", path.display())).await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::default());

        let ledger = MemoryLedger::new(OWNER);
        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;
        let tx_hash = ledger.execute(donate(0, "0.1", "")).await;
        let claim = claim_for(&ledger, tx_hash).await?;

        let attempts = (0..8).map(|_| reconciler.record_donation(&ledger, &claim));
        let outcomes = futures_util::future::join_all(attempts).await;

        let mut recorded = 0;
        let mut records = Vec::new();
        for outcome in outcomes {
            let outcome = outcome?;
            if outcome.is_new() {
                recorded += 1;
            }
            records.push(outcome.into_record());
        }
        assert_eq!(recorded, 1);
        assert!(records.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(DonationStore::new(client.clone()).all().await?.len(), 1);

        client.pool().close().await;
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_campaign_status_twice_matches_ledger() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());
        let campaigns = CampaignStore::new(client.clone());

        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;

        let first = reconciler.toggle_campaign_status(&ledger, 0).await?;
        let second = reconciler.toggle_campaign_status(&ledger, 0).await?;

        assert!(!first.is_active);
        assert_eq!(first.write, StatusWrite::Applied);
        assert!(!second.is_active);
        assert_eq!(second.write, StatusWrite::Superseded);
        assert!(!campaigns.get(0).await?.unwrap().is_active);

        // Unknown on the ledger
        assert!(matches!(
            reconciler.toggle_campaign_status(&ledger, 7).await,
            Err(IngestError::UnknownLedgerCampaign { campaign_id: 7 })
        ));

        // Known on the ledger, not mirrored
        create_campaign(&ledger, "School roof").await;
        assert!(matches!(
            reconciler.toggle_campaign_status(&ledger, 1).await,
            Err(IngestError::ReferenceNotFound { campaign_id: 1 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_mirror_campaign_checks_owner_and_sequence() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        create_campaign(&ledger, "School roof").await;

        // Not the owner
        let err = reconciler.authorize(&ledger, DONOR).await.unwrap_err();
        assert!(matches!(err, IngestError::Unauthorized { caller } if caller == DONOR));

        // Campaign 1 before campaign 0
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let err = reconciler
            .mirror_campaign(&ledger, authorization, 1, &metadata("School roof"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::CampaignSequenceGap { campaign_id: 1, mirrored: 0 }));

        // Not on the ledger
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let err = reconciler
            .mirror_campaign(&ledger, authorization, 9, &metadata("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnknownLedgerCampaign { campaign_id: 9 }));

        // Invalid metadata
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let err = reconciler
            .mirror_campaign(&ledger, authorization, 0, &metadata("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidInput(_)));

        mirror(&reconciler, &ledger, 0).await?;
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let campaign = reconciler
            .mirror_campaign(&ledger, authorization, 1, &metadata("School roof"))
            .await?;
        assert_eq!(campaign.campaign_id, 1);
        assert_eq!(campaign.title, "School roof");
        assert_eq!(campaign.target_amount.to_string(), "10");
        assert!(campaign.is_active);

        // Authority follows the ledger owner
        let new_owner = Address::repeat_byte(0x0e);
        ledger.execute(Operation::TransferOwnership { new_owner }).await;
        assert!(matches!(
            reconciler.authorize(&ledger, OWNER).await,
            Err(IngestError::Unauthorized { .. })
        ));
        assert!(reconciler.authorize(&ledger, new_owner).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_ingest_transaction_applies_receipt_events() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());
        let timeout = Duration::from_secs(1);
        let poll = Duration::from_millis(5);

        let created = create_campaign(&ledger, "Flood relief").await;
        let applied = reconciler.ingest_transaction(&ledger, created, timeout, poll).await?;
        assert_eq!(applied, vec![Applied::Campaign { campaign_id: 0 }]);

        let long_message = "x".repeat(600);
        let donated = ledger.execute(donate(0, "1.25", &long_message)).await;
        let applied = reconciler.ingest_transaction(&ledger, donated, timeout, poll).await?;
        let [Applied::Donation(Ingested::Recorded(donation))] = applied.as_slice() else {
            return Err(eyre!("unexpected outcome {applied:?}"));
        };
        assert_eq!(donation.amount.to_string(), "1.25");
        assert_eq!(donation.message.as_ref().map(|message| message.len()), Some(500));

        // Replaying the receipt is harmless
        let replayed = reconciler.ingest_transaction(&ledger, donated, timeout, poll).await?;
        assert!(matches!(replayed.as_slice(), [Applied::Donation(Ingested::AlreadyRecorded(_))]));

        // Never mined: gives up after the timeout
        let pending = ledger.submit(donate(0, "1", "")).await;
        let err = reconciler
            .ingest_transaction(&ledger, pending, Duration::from_millis(30), poll)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnconfirmedTransaction { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_withdrawal() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        ledger.execute(donate(0, "3", "")).await;
        let tx_hash =
            ledger.execute(Operation::Withdraw { to: BENEFICIARY, amount: ether("2") }).await;
        let events = ledger.transaction_events(tx_hash).await?;
        let LedgerEventKind::FundsWithdrawn { timestamp, .. } = events[0].kind else {
            return Err(eyre!("expected a withdrawal"));
        };

        let claim = WithdrawalClaim {
            transaction_hash: tx_hash,
            recipient: BENEFICIARY,
            amount: "2".parse()?,
            timestamp: DateTime::from_timestamp(timestamp as i64, 0).unwrap(),
            block_number: events[0].block_number(),
        };
        let first = reconciler.record_withdrawal(&ledger, &claim).await?;
        let second = reconciler.record_withdrawal(&ledger, &claim).await?;

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.record().amount.to_string(), "2");
        Ok(())
    }

    #[tokio::test]
    async fn test_off_chain_edits() -> Result<()> {
        let ledger = MemoryLedger::new(OWNER);
        let client = Client::init("sqlite::memory:").await?;
        let reconciler = Reconciler::new(client.clone(), 1, RetryPolicy::none());

        create_campaign(&ledger, "Flood relief").await;
        mirror(&reconciler, &ledger, 0).await?;
        let tx_hash = ledger.execute(donate(0, "1", "")).await;
        reconciler.record_donation(&ledger, &claim_for(&ledger, tx_hash).await?).await?;

        // Annotations
        let annotation = DonationAnnotation {
            is_anonymous: Some(true),
            donor_name: Some("Ada".to_string()),
            donor_email: None,
        };
        let annotated = reconciler.annotate_donation(tx_hash, &annotation).await?;
        assert!(annotated.is_anonymous);
        assert_eq!(annotated.donor_name.as_deref(), Some("Ada"));
        assert_eq!(annotated.amount.to_string(), "1");

        let err = reconciler
            .annotate_donation(TxHash::repeat_byte(0x77), &annotation)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::RecordNotFound { kind: "donation", .. }));

        let bad_email = DonationAnnotation { donor_email: Some("nope".to_string()), ..annotation };
        assert!(matches!(
            reconciler.annotate_donation(tx_hash, &bad_email).await,
            Err(IngestError::InvalidInput(_))
        ));

        // Metadata patch
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let patch = CampaignPatch { category: Some(Category::Medical), ..CampaignPatch::default() };
        let updated = reconciler.update_campaign_metadata(authorization, 0, &patch).await?;
        assert_eq!(updated.category, Category::Medical);
        assert_eq!(updated.title, "Flood relief");

        // Campaign updates
        let update = NewCampaignUpdate {
            title: "Week one".to_string(),
            content: "Tents delivered".to_string(),
        };
        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        let posted = reconciler.add_campaign_update(authorization, 0, &update).await?;
        assert_eq!(posted.campaign_id, 0);

        let authorization = reconciler.authorize(&ledger, OWNER).await?;
        assert!(matches!(
            reconciler.add_campaign_update(authorization, 4, &update).await,
            Err(IngestError::ReferenceNotFound { campaign_id: 4 })
        ));
        Ok(())
    }
}
