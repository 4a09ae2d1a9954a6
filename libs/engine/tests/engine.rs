#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, TxHash, U256};
    use chain::events::LedgerEvent;
    use chain::ledger::Ledger;
    use chain::memory::{MemoryLedger, Operation};
    use engine::args::Args;
    use engine::checkpointer::Checkpointer;
    use engine::confirmation::Confirmed;
    use engine::engine::Engine;
    use engine::live::sink::handle::Sink;
    use engine::live::sink::reconciler::ReconcilerSink;
    use engine::live::source::handle::Source;
    use engine::live::source::ledger::LedgerSource;
    use engine::reconciler::Reconciler;
    use engine::retry::RetryPolicy;
    use eyre::Result;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use store::amount::Amount;
    use store::campaign::store::Store as CampaignStore;
    use store::client::Client;
    use store::donation::store::Store as DonationStore;
    use store::utils::canonical_hash;

    const OWNER: Address = Address::repeat_byte(0x01);

    fn ether(amount: &str) -> U256 {
        amount.parse::<Amount>().unwrap().wei()
    }

    fn donate(donor: u8, amount: &str) -> Operation {
        Operation::Donate {
            campaign_id: 0,
            donor: Address::repeat_byte(donor),
            amount: ether(amount),
            message: String::new(),
        }
    }

    fn args(min_confirmations: u64) -> Args {
        Args {
            from_block: None,
            checkpoint_interval: 2,
            backfill_checkpoint_interval: Some(3),
            poll_interval: Duration::from_millis(20),
            min_confirmations,
            retry: RetryPolicy::none(),
        }
    }

    type Item = Confirmed<LedgerEvent>;

    async fn start(
        args: &Args,
        ledger: &Arc<MemoryLedger>,
        client: &Client,
    ) -> Result<(Engine, Arc<ReconcilerSink>)> {
        let reconciler =
            Arc::new(Reconciler::new(client.clone(), args.min_confirmations, args.retry.clone()));
        let sink = Arc::new(ReconcilerSink::new(reconciler));
        let source: Arc<dyn Source<Item = Item>> =
            Arc::new(LedgerSource::new(ledger.clone(), args.min_confirmations));
        let checkpointer = Checkpointer::new(client.clone());

        let engine = Engine::start(
            args,
            source,
            &checkpointer,
            Arc::clone(&sink) as Arc<dyn Sink<Item = Item>>,
        )
        .await?;
        Ok((engine, sink))
    }

    #[tokio::test]
    async fn test_engine_backfills_then_follows_the_ledger() -> Result<()> {
        let ledger = Arc::new(MemoryLedger::new(OWNER));
        let client = Client::init("sqlite::memory:").await?;
        let donations = DonationStore::new(client.clone());
        let campaigns = CampaignStore::new(client.clone());
        let checkpointer = Checkpointer::new(client.clone());

        let mut expected: HashSet<TxHash> = HashSet::new();

        // History before the engine starts
        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: Address::repeat_byte(0x03),
                target_amount: ether("10"),
                title: "Flood relief".to_string(),
            })
            .await;
        expected.insert(ledger.execute(donate(0xd1, "0.1")).await);

        let (engine, sink) = start(&args(1), &ledger, &client).await?;
        assert_eq!(donations.all().await?.len(), 1);

        // Live activity
        expected.insert(ledger.execute(donate(0xd2, "0.2")).await);
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;
        ledger.mine_blocks(2).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        engine.shutdown().await?;

        let collected = donations.all().await?;
        assert_eq!(collected.len(), 2);
        let hashes: HashSet<String> =
            collected.iter().map(|d| d.transaction_hash.clone()).collect();
        assert_eq!(hashes, expected.iter().map(canonical_hash).collect());
        assert!(!campaigns.get(0).await?.unwrap().is_active);
        assert_eq!(sink.tally().await.donations_recorded, 2);

        let latest = ledger.latest_block_number().await?;
        let checkpoint = checkpointer.get_last_checkpoint().await?.unwrap();
        assert!(checkpoint.block_number() >= latest - 1);

        // Restart: resumes after the checkpoint, nothing is applied twice
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;
        expected.insert(ledger.execute(donate(0xd3, "0.3")).await);
        ledger.mine_blocks(2).await;

        let (restarted, sink) = start(&args(1), &ledger, &client).await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        restarted.shutdown().await?;

        let collected = donations.all().await?;
        assert_eq!(collected.len(), 3);
        assert_eq!(sink.tally().await.donations_already_recorded, 0);
        assert!(campaigns.get(0).await?.unwrap().is_active);

        let total: Amount = collected.iter().map(|d| d.amount).sum();
        assert_eq!(total.to_string(), "0.6");
        Ok(())
    }

    #[tokio::test]
    async fn test_engine_only_applies_confirmed_blocks() -> Result<()> {
        let ledger = Arc::new(MemoryLedger::new(OWNER));
        let client = Client::init("sqlite::memory:").await?;
        let donations = DonationStore::new(client.clone());

        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: Address::repeat_byte(0x03),
                target_amount: ether("10"),
                title: "Clinic".to_string(),
            })
            .await;

        let (engine, _sink) = start(&args(3), &ledger, &client).await?;

        ledger.execute(donate(0xd1, "1")).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(donations.all().await?.is_empty());

        // Two more blocks confirm the donation
        ledger.mine_blocks(2).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        engine.shutdown().await?;

        assert_eq!(donations.all().await?.len(), 1);
        Ok(())
    }
}
