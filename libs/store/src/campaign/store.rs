use crate::campaign::model::{
    Campaign, CampaignFilter, CampaignMetadata, CampaignPatch, CampaignUpdate, NewCampaign,
    NewCampaignUpdate, StatusVersion, StatusWrite,
};
use crate::client::Client;
use crate::page::{Page, Paginated};
use chrono::Utc;
use eyre::Result;
use sqlx::types::Json;
use sqlx::{Error, QueryBuilder, Sqlite};

const CAMPAIGN_COLUMNS: &str = r#"
    campaign_id, title, description, target_amount, beneficiary, is_active,
    status_block_number, status_log_index, category, location, images,
    created_at, updated_at
"#;

// `is_active` and its version only move forward in ledger order.
const VERSIONED_STATUS: &str = r#"
    is_active = CASE WHEN excluded.status_block_number > campaigns.status_block_number
            OR (excluded.status_block_number = campaigns.status_block_number
                AND excluded.status_log_index > campaigns.status_log_index)
        THEN excluded.is_active ELSE campaigns.is_active END,
    status_log_index = CASE WHEN excluded.status_block_number > campaigns.status_block_number
            OR (excluded.status_block_number = campaigns.status_block_number
                AND excluded.status_log_index > campaigns.status_log_index)
        THEN excluded.status_log_index ELSE campaigns.status_log_index END,
    status_block_number = MAX(excluded.status_block_number, campaigns.status_block_number)
"#;

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CampaignFilter) {
    let mut separator = " WHERE ";
    if let Some(category) = filter.category {
        builder.push(separator).push("category = ").push_bind(category);
        separator = " AND ";
    }
    if let Some(is_active) = filter.is_active {
        builder.push(separator).push("is_active = ").push_bind(is_active);
    }
}

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // LEDGER FIELDS
    // ---------------------------

    /// Inserts a campaign seen on the ledger, or re-asserts its ledger fields.
    /// Off-chain metadata of an existing row is left as is.
    pub async fn upsert_from_ledger(&self, campaign: &NewCampaign) -> Result<(), Error> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO campaigns (
                campaign_id, title, target_amount, beneficiary, is_active,
                status_block_number, status_log_index, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (campaign_id) DO UPDATE SET
                target_amount = excluded.target_amount,
                beneficiary = excluded.beneficiary,
                {VERSIONED_STATUS}
            "#
        );
        sqlx::query(&query)
            .bind(campaign.campaign_id)
            .bind(&campaign.title)
            .bind(campaign.target_amount)
            .bind(&campaign.beneficiary)
            .bind(campaign.is_active)
            .bind(campaign.version.block_number)
            .bind(campaign.version.log_index)
            .bind(now)
            .bind(now)
            .execute(self.client.pool())
            .await?;
        Ok(())
    }

    /// Writes ledger fields and admin metadata in one statement.
    pub async fn mirror(
        &self,
        campaign: &NewCampaign,
        metadata: &CampaignMetadata,
    ) -> Result<Campaign, Error> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO campaigns (
                campaign_id, title, description, target_amount, beneficiary, is_active,
                status_block_number, status_log_index, category, location, images,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (campaign_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                location = excluded.location,
                images = excluded.images,
                target_amount = excluded.target_amount,
                beneficiary = excluded.beneficiary,
                updated_at = excluded.updated_at,
                {VERSIONED_STATUS}
            RETURNING {CAMPAIGN_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(campaign.campaign_id)
            .bind(metadata.title.trim())
            .bind(metadata.description.trim())
            .bind(campaign.target_amount)
            .bind(&campaign.beneficiary)
            .bind(campaign.is_active)
            .bind(campaign.version.block_number)
            .bind(campaign.version.log_index)
            .bind(metadata.category)
            .bind(&metadata.location)
            .bind(Json(&metadata.images))
            .bind(now)
            .bind(now)
            .fetch_one(self.client.pool())
            .await
    }

    pub async fn assert_status(
        &self,
        campaign_id: i64,
        is_active: bool,
        version: StatusVersion,
    ) -> Result<StatusWrite, Error> {
        let query = r#"
            UPDATE campaigns
            SET is_active = ?, status_block_number = ?, status_log_index = ?, updated_at = ?
            WHERE campaign_id = ?
              AND (status_block_number < ? OR (status_block_number = ? AND status_log_index < ?))
            "#;
        let result = sqlx::query(query)
            .bind(is_active)
            .bind(version.block_number)
            .bind(version.log_index)
            .bind(Utc::now())
            .bind(campaign_id)
            .bind(version.block_number)
            .bind(version.block_number)
            .bind(version.log_index)
            .execute(self.client.pool())
            .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusWrite::Applied);
        }
        if self.exists(campaign_id).await? {
            Ok(StatusWrite::Superseded)
        } else {
            Ok(StatusWrite::Missing)
        }
    }

    // ---------------------------
    // LOOKUPS
    // ---------------------------

    pub async fn get(&self, campaign_id: i64) -> Result<Option<Campaign>, Error> {
        let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE campaign_id = ?");
        sqlx::query_as(&query).bind(campaign_id).fetch_optional(self.client.pool()).await
    }

    pub async fn exists(&self, campaign_id: i64) -> Result<bool, Error> {
        let query = "SELECT EXISTS (SELECT 1 FROM campaigns WHERE campaign_id = ?)";
        sqlx::query_scalar(query).bind(campaign_id).fetch_one(self.client.pool()).await
    }

    /// Number of mirrored campaigns with an ID lower than `campaign_id`.
    pub async fn count_below(&self, campaign_id: i64) -> Result<i64, Error> {
        let query = "SELECT COUNT(*) FROM campaigns WHERE campaign_id < ?";
        sqlx::query_scalar(query).bind(campaign_id).fetch_one(self.client.pool()).await
    }

    pub async fn list(
        &self,
        filter: &CampaignFilter,
        page: &Page,
    ) -> Result<Paginated<Campaign>, Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM campaigns");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.client.pool()).await?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns"));
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY campaign_id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as().fetch_all(self.client.pool()).await?;

        Ok(Paginated::new(items, page, total))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Campaign>, Error> {
        let query = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
            ORDER BY created_at DESC, campaign_id DESC
            LIMIT ?"
        );
        sqlx::query_as(&query).bind(limit).fetch_all(self.client.pool()).await
    }

    pub async fn all(&self) -> Result<Vec<Campaign>, Error> {
        let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY campaign_id ASC");
        sqlx::query_as(&query).fetch_all(self.client.pool()).await
    }

    // ---------------------------
    // OFF-CHAIN METADATA
    // ---------------------------

    pub async fn update_metadata(
        &self,
        campaign_id: i64,
        patch: &CampaignPatch,
    ) -> Result<Option<Campaign>, Error> {
        let query = format!(
            r#"
            UPDATE campaigns SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                location = COALESCE(?, location),
                images = COALESCE(?, images),
                updated_at = ?
            WHERE campaign_id = ?
            RETURNING {CAMPAIGN_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(patch.title.as_deref().map(str::trim))
            .bind(patch.description.as_deref().map(str::trim))
            .bind(patch.category)
            .bind(&patch.location)
            .bind(patch.images.as_ref().map(Json))
            .bind(Utc::now())
            .bind(campaign_id)
            .fetch_optional(self.client.pool())
            .await
    }

    pub async fn add_update(
        &self,
        campaign_id: i64,
        update: &NewCampaignUpdate,
    ) -> Result<CampaignUpdate, Error> {
        let query = r#"
            INSERT INTO campaign_updates (campaign_id, title, content, posted_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, campaign_id, title, content, posted_at
            "#;
        sqlx::query_as(query)
            .bind(campaign_id)
            .bind(update.title.trim())
            .bind(update.content.trim())
            .bind(Utc::now())
            .fetch_one(self.client.pool())
            .await
    }

    pub async fn updates(&self, campaign_id: i64) -> Result<Vec<CampaignUpdate>, Error> {
        let query = r#"
            SELECT id, campaign_id, title, content, posted_at
            FROM campaign_updates
            WHERE campaign_id = ?
            ORDER BY id DESC
            "#;
        sqlx::query_as(query).bind(campaign_id).fetch_all(self.client.pool()).await
    }
}
