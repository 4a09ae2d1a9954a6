use crate::amount::Amount;
use crate::campaign::model::{Campaign, CampaignFilter};
use crate::campaign::store::Store as CampaignStore;
use crate::client::Client;
use crate::donation::model::DonationFilter;
use crate::donation::store::Store as DonationStore;
use crate::page::{Page, Paginated};
use crate::stats::model::{
    self, Analytics, CampaignDetail, CampaignDonations, CampaignWithStats, Dashboard,
    DonationFigure, DonationStats, Timeframe,
};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Error, QueryBuilder, Sqlite};

const RECENT_DONATIONS: i64 = 10;
const RECENT_CAMPAIGNS: i64 = 5;
const TOP_CAMPAIGNS: usize = 5;
const CAMPAIGN_PERFORMANCE: usize = 10;
const TOP_DONORS: usize = 10;

/// Query layer. Reads projections only and never talks to the ledger.
#[derive(Clone)]
pub struct Store {
    client: Client,
    campaigns: CampaignStore,
    donations: DonationStore,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self {
            campaigns: CampaignStore::new(client.clone()),
            donations: DonationStore::new(client.clone()),
            client,
        }
    }

    pub async fn figures(
        &self,
        campaign_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DonationFigure>, Error> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT d.campaign_id, c.title, c.category, d.donor, d.amount, d.timestamp
            FROM donations d
            JOIN campaigns c ON c.campaign_id = d.campaign_id
            WHERE 1 = 1
            "#,
        );
        if let Some(campaign_id) = campaign_id {
            query.push(" AND d.campaign_id = ").push_bind(campaign_id);
        }
        query.push(" ORDER BY d.block_number ASC, d.log_index ASC");
        let figures: Vec<DonationFigure> =
            query.build_query_as().fetch_all(self.client.pool()).await?;

        // Timestamps are compared as instants, not as stored text.
        Ok(match since {
            Some(since) => figures.into_iter().filter(|f| f.timestamp >= since).collect(),
            None => figures,
        })
    }

    pub async fn total_raised(&self, campaign_id: i64) -> Result<Amount, Error> {
        let figures = self.figures(Some(campaign_id), None).await?;
        Ok(figures.iter().map(|f| f.amount).sum())
    }

    pub async fn campaign_detail(&self, campaign_id: i64) -> Result<Option<CampaignDetail>, Error> {
        let Some(campaign) = self.campaigns.get(campaign_id).await? else {
            return Ok(None);
        };
        let total_raised = self.total_raised(campaign_id).await?;
        let recent_donations = self.donations.recent(Some(campaign_id), RECENT_DONATIONS).await?;
        let updates = self.campaigns.updates(campaign_id).await?;

        Ok(Some(CampaignDetail { campaign, total_raised, recent_donations, updates }))
    }

    pub async fn campaign_donations(
        &self,
        campaign_id: i64,
        page: &Page,
    ) -> Result<CampaignDonations, Error> {
        let filter = DonationFilter { campaign_id: Some(campaign_id), donor: None };
        let donations = self.donations.list(&filter, page).await?;
        let statistics = model::summarize(&self.figures(Some(campaign_id), None).await?);

        Ok(CampaignDonations { donations, statistics })
    }

    pub async fn admin_campaigns(
        &self,
        filter: &CampaignFilter,
        page: &Page,
    ) -> Result<Paginated<CampaignWithStats>, Error> {
        let campaigns = self.campaigns.list(filter, page).await?;

        let mut items = Vec::with_capacity(campaigns.items.len());
        for campaign in campaigns.items {
            let stats = model::summarize(&self.figures(Some(campaign.campaign_id), None).await?);
            items.push(CampaignWithStats { campaign, stats });
        }
        Ok(Paginated { items, pagination: campaigns.pagination })
    }

    pub async fn donation_stats(&self) -> Result<DonationStats, Error> {
        let figures = self.figures(None, None).await?;
        let recent_donations = self.donations.recent(None, RECENT_DONATIONS).await?;

        Ok(DonationStats {
            overall: model::overall(&figures),
            top_campaigns: model::campaign_totals(&figures, TOP_CAMPAIGNS),
            recent_donations,
        })
    }

    pub async fn dashboard(&self) -> Result<Dashboard, Error> {
        let campaigns: Vec<Campaign> = self.campaigns.all().await?;
        let figures = self.figures(None, None).await?;

        Ok(Dashboard {
            campaigns: model::campaign_summary(&campaigns),
            donations: model::summarize(&figures),
            recent_campaigns: self.campaigns.recent(RECENT_CAMPAIGNS).await?,
            recent_donations: self.donations.recent(None, RECENT_DONATIONS).await?,
            campaign_performance: model::campaign_totals(&figures, CAMPAIGN_PERFORMANCE),
        })
    }

    pub async fn analytics(
        &self,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Analytics, Error> {
        let window = self.figures(None, timeframe.since(now)).await?;
        let campaigns = self.campaigns.all().await?;
        let lifetime = self.figures(None, None).await?;

        Ok(Analytics {
            timeframe,
            donation_trends: model::daily_totals(&window),
            top_donors: model::donor_totals(&window, TOP_DONORS),
            category_performance: model::category_totals(&campaigns, &lifetime),
        })
    }
}
