#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, B256, Bytes, U64, U128, U256};
    use alloy::rpc::client::RpcClient;
    use alloy::rpc::types::Log;
    use alloy::transports::mock::Asserter;
    use alloy::sol_types::SolEvent;
    use chain::contract::IDonationTracker::{DonationReceived, FundsWithdrawn};
    use chain::events::{EventPosition, LedgerEvent, LedgerEventKind};
    use chain::inspect::NetworkInfo;
    use chain::ledger::{BlockRange, Ledger, TxStatus};
    use chain::memory::{MemoryLedger, Operation};
    use chain::rpc::NodeClient;
    use eyre::Result;

    fn rpc_log<E: SolEvent>(
        contract: Address,
        event: &E,
        block_number: u64,
        log_index: u64,
    ) -> Log {
        Log {
            inner: alloy::primitives::Log { address: contract, data: event.encode_log_data() },
            block_hash: Some(B256::repeat_byte(0x11)),
            block_number: Some(block_number),
            transaction_hash: Some(B256::repeat_byte(0x22)),
            transaction_index: Some(0),
            log_index: Some(log_index),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_donation_received_log() -> Result<()> {
        let contract = Address::repeat_byte(0xC0);
        let donor = Address::repeat_byte(0xD0);
        let event = DonationReceived {
            campaignId: U256::from(3),
            donor,
            amount: U256::from(500_000_000_000_000_000u64),
            timestamp: U256::from(1_700_000_123u64),
            message: "for the shelter".to_string(),
        };

        let decoded = LedgerEvent::try_from(&rpc_log(contract, &event, 42, 7))?;

        assert_eq!(decoded.position, EventPosition::new(42, 0, 7));
        assert_eq!(decoded.transaction_hash, B256::repeat_byte(0x22));
        assert_eq!(
            decoded.kind,
            LedgerEventKind::DonationReceived {
                campaign_id: 3,
                donor,
                amount: U256::from(500_000_000_000_000_000u64),
                timestamp: 1_700_000_123,
                message: "for the shelter".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_decode_rejects_unmined_log() {
        let contract = Address::repeat_byte(0xC0);
        let event = FundsWithdrawn {
            to: Address::repeat_byte(0xAA),
            amount: U256::from(1),
            timestamp: U256::from(1),
        };
        let mut log = rpc_log(contract, &event, 1, 0);
        log.block_number = None;

        assert!(LedgerEvent::try_from(&log).is_err());
    }

    #[tokio::test]
    async fn test_memory_ledger_gates_donations_on_active_flag() -> Result<()> {
        let owner = Address::repeat_byte(0x01);
        let donor = Address::repeat_byte(0x02);
        let ledger = MemoryLedger::new(owner);

        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: Address::repeat_byte(0x03),
                target_amount: U256::from(10),
                title: "Flood relief".to_string(),
            })
            .await;
        let accepted = ledger
            .execute(Operation::Donate {
                campaign_id: 0,
                donor,
                amount: U256::from(4),
                message: String::new(),
            })
            .await;
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;
        let rejected = ledger
            .execute(Operation::Donate {
                campaign_id: 0,
                donor,
                amount: U256::from(4),
                message: String::new(),
            })
            .await;

        assert!(matches!(ledger.transaction_status(accepted).await?, TxStatus::Included { .. }));
        assert!(matches!(ledger.transaction_status(rejected).await?, TxStatus::Reverted { .. }));
        assert!(ledger.transaction_events(rejected).await?.is_empty());
        assert_eq!(ledger.total_funds().await?, U256::from(4));
        assert_eq!(ledger.donor_list().await?, vec![donor]);
        let latest = ledger.latest_block_number().await?;
        assert!(!ledger.campaign(0, latest).await?.unwrap().is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_ledger_campaign_reads_are_historical() -> Result<()> {
        let ledger = MemoryLedger::new(Address::repeat_byte(0x01));
        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: Address::repeat_byte(0x03),
                target_amount: U256::from(10),
                title: "School roof".to_string(),
            })
            .await;
        ledger.execute(Operation::ToggleCampaignStatus { campaign_id: 0 }).await;

        assert_eq!(ledger.campaign(0, 0).await?, None);
        assert!(ledger.campaign(0, 1).await?.unwrap().is_active);
        assert!(!ledger.campaign(0, 2).await?.unwrap().is_active);
        assert_eq!(ledger.campaign(1, 2).await?, None);
        assert!(ledger.campaign(0, 3).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_ledger_pending_until_mined() -> Result<()> {
        let ledger = MemoryLedger::new(Address::repeat_byte(0x01));
        ledger
            .execute(Operation::CreateCampaign {
                beneficiary: Address::repeat_byte(0x03),
                target_amount: U256::from(10),
                title: "School roof".to_string(),
            })
            .await;

        let tx_hash = ledger
            .submit(Operation::Donate {
                campaign_id: 0,
                donor: Address::repeat_byte(0x02),
                amount: U256::from(1),
                message: String::new(),
            })
            .await;
        assert_eq!(ledger.transaction_status(tx_hash).await?, TxStatus::Pending);

        let block = ledger.mine().await;
        let events = ledger.events(BlockRange::new(block.number, block.number)).await?;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].transaction_hash, tx_hash);
        assert!(matches!(ledger.transaction_status(tx_hash).await?, TxStatus::Included { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_node_inspection_reads() -> Result<()> {
        let asserter = Asserter::new();
        let contract = Address::repeat_byte(0xC0);
        let node = NodeClient::with_client(RpcClient::mocked(asserter.clone()), contract);

        asserter.push_success(&U64::from(31337u64));
        asserter.push_success(&U64::from(42u64));
        assert_eq!(
            node.network().await?,
            NetworkInfo { chain_id: 31337, name: "localhost", block_number: 42 }
        );

        asserter.push_success(&U256::from(5_000_000_000_000_000_000u128));
        asserter.push_success(&U64::from(3u64));
        asserter.push_success(&Bytes::from_static(&[0x60, 0x80]));
        let account = node.address(Address::repeat_byte(0xD0)).await?;
        assert_eq!(account.balance, U256::from(5_000_000_000_000_000_000u128));
        assert_eq!(account.transaction_count, 3);
        assert!(account.is_contract);

        asserter.push_success(&U256::ZERO);
        asserter.push_success(&U64::ZERO);
        asserter.push_success(&Bytes::new());
        assert!(!node.address(Address::repeat_byte(0xD1)).await?.is_contract);

        // Unknown hash
        asserter.push_success(&Option::<()>::None);
        assert!(node.transaction(B256::repeat_byte(0x22)).await?.is_none());

        // Legacy node without fee history
        asserter.push_success(&U128::from(2_000_000_000u64));
        asserter.push_failure_msg("the method eth_feeHistory does not exist");
        let fees = node.fees().await?;
        assert_eq!(fees.gas_price, 2_000_000_000);
        assert_eq!(fees.max_fee_per_gas, None);
        assert_eq!(fees.max_priority_fee_per_gas, None);
        Ok(())
    }
}
