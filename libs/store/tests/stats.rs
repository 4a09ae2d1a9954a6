#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use eyre::Result;
    use store::{
        campaign::{
            model::{CampaignFilter, CampaignMetadata, Category, NewCampaign, StatusVersion},
            store::Store as CampaignStore,
        },
        client::Client,
        donation::{model::NewDonation, store::Store as DonationStore},
        page::Page,
        stats::{model::Timeframe, store::Store as StatsStore},
    };

    async fn seed(client: &Client) -> Result<()> {
        let campaigns = CampaignStore::new(client.clone());
        let donations = DonationStore::new(client.clone());

        for (campaign_id, category) in [(0, Category::Medical), (1, Category::Education)] {
            let campaign = NewCampaign {
                campaign_id,
                title: format!("Campaign {campaign_id}"),
                target_amount: "100".parse()?,
                beneficiary: "0x00000000000000000000000000000000000000be".to_string(),
                is_active: campaign_id == 0,
                version: StatusVersion::at_block(1),
            };
            let metadata = CampaignMetadata {
                title: campaign.title.clone(),
                category,
                ..Default::default()
            };
            campaigns.mirror(&campaign, &metadata).await?;
        }

        let now = Utc::now();
        let rows = [
            ('1', 0, "0x00000000000000000000000000000000000000d1", "0.1", now - Duration::days(1)),
            ('2', 0, "0x00000000000000000000000000000000000000d2", "0.2", now - Duration::days(2)),
            ('3', 1, "0x00000000000000000000000000000000000000d1", "5", now - Duration::days(40)),
        ];
        for (block, (hash, campaign_id, donor, amount, timestamp)) in rows.into_iter().enumerate() {
            donations
                .insert(&NewDonation {
                    transaction_hash: format!("0x{}", hash.to_string().repeat(64)),
                    campaign_id,
                    donor: donor.to_string(),
                    amount: amount.parse()?,
                    timestamp: Utc.timestamp_opt(timestamp.timestamp(), 0).unwrap(),
                    block_number: block as i64 + 2,
                    log_index: 0,
                    message: None,
                })
                .await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_total_raised_is_derived_from_donations() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        seed(&client).await?;
        let stats = StatsStore::new(client);

        assert_eq!(stats.total_raised(0).await?.to_string(), "0.3");
        let detail = stats.campaign_detail(0).await?.expect("campaign");
        assert_eq!(detail.total_raised.to_string(), "0.3");
        assert_eq!(detail.recent_donations.len(), 2);
        assert!(stats.campaign_detail(42).await?.is_none());

        let per_campaign = stats.campaign_donations(0, &Page::new(1, 1)).await?;
        assert_eq!(per_campaign.donations.items.len(), 1);
        assert_eq!(per_campaign.donations.pagination.pages, 2);
        assert_eq!(per_campaign.statistics.unique_donors, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_donation_stats_and_dashboard() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        seed(&client).await?;
        let stats = StatsStore::new(client);

        let overview = stats.donation_stats().await?;
        assert_eq!(overview.overall.total_amount.to_string(), "5.3");
        assert_eq!(overview.overall.unique_donors, 2);
        assert_eq!(overview.overall.unique_campaigns, 2);
        assert_eq!(overview.top_campaigns[0].campaign_id, 1);

        let dashboard = stats.dashboard().await?;
        assert_eq!(dashboard.campaigns.total_campaigns, 2);
        assert_eq!(dashboard.campaigns.active_campaigns, 1);
        assert_eq!(dashboard.campaigns.total_target.to_string(), "200");
        assert_eq!(dashboard.donations.donation_count, 3);
        assert_eq!(dashboard.recent_donations.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_analytics_respects_timeframe() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        seed(&client).await?;
        let stats = StatsStore::new(client);

        let month = stats.analytics(Timeframe::Month, Utc::now()).await?;
        assert_eq!(month.donation_trends.len(), 2);
        assert_eq!(month.top_donors.len(), 2);
        assert_eq!(month.top_donors[0].total_amount.to_string(), "0.2");

        let all = stats.analytics(Timeframe::All, Utc::now()).await?;
        assert_eq!(all.top_donors[0].total_amount.to_string(), "5.1");
        assert_eq!(all.category_performance[0].category, Category::Education);
        assert_eq!(all.category_performance[0].campaign_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_campaigns_carry_donation_stats() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        seed(&client).await?;
        let stats = StatsStore::new(client);

        let all = stats.admin_campaigns(&CampaignFilter::default(), &Page::new(1, 20)).await?;
        assert_eq!(all.pagination.total, 2);
        assert_eq!(all.items[0].campaign.campaign_id, 1);
        assert_eq!(all.items[0].stats.total_amount.to_string(), "5");
        assert_eq!(all.items[1].stats.total_amount.to_string(), "0.3");
        assert_eq!(all.items[1].stats.donation_count, 2);
        assert_eq!(all.items[1].stats.unique_donors, 2);

        let inactive = CampaignFilter { is_active: Some(false), ..Default::default() };
        let inactive = stats.admin_campaigns(&inactive, &Page::new(1, 20)).await?;
        assert_eq!(inactive.items.len(), 1);
        assert_eq!(inactive.items[0].campaign.campaign_id, 1);
        assert!(!inactive.items[0].campaign.is_active);

        let json = serde_json::to_value(&all.items[1])?;
        assert_eq!(json["campaign_id"], 0);
        assert_eq!(json["stats"]["total_amount"], "0.3");
        Ok(())
    }

    #[tokio::test]
    async fn test_many_small_donations_sum_exactly() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let campaigns = CampaignStore::new(client.clone());
        let donations = DonationStore::new(client.clone());
        let stats = StatsStore::new(client);

        let campaign = NewCampaign {
            campaign_id: 0,
            title: "Flood relief".to_string(),
            target_amount: "1000".parse()?,
            beneficiary: "0x00000000000000000000000000000000000000be".to_string(),
            is_active: true,
            version: StatusVersion::at_block(1),
        };
        let metadata = CampaignMetadata { title: campaign.title.clone(), ..Default::default() };
        campaigns.mirror(&campaign, &metadata).await?;

        let timestamp = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for n in 0..10_000_i64 {
            donations
                .insert(&NewDonation {
                    transaction_hash: format!("0x{n:064x}"),
                    campaign_id: 0,
                    donor: "0x00000000000000000000000000000000000000d1".to_string(),
                    amount: "0.1".parse()?,
                    timestamp,
                    block_number: n + 2,
                    log_index: 0,
                    message: None,
                })
                .await?;
        }

        assert_eq!(stats.total_raised(0).await?.to_string(), "1000");
        let dashboard = stats.dashboard().await?;
        assert_eq!(dashboard.donations.total_amount.to_string(), "1000");
        assert_eq!(dashboard.donations.donation_count, 10_000);
        Ok(())
    }
}
