use crate::client::Client;
use crate::donation::model::{Donation, DonationAnnotation, DonationFilter, NewDonation};
use crate::page::{Page, Paginated};
use chrono::Utc;
use eyre::Result;
use sqlx::{Error, QueryBuilder, Sqlite};

const DONATION_COLUMNS: &str = r#"
    transaction_hash, campaign_id, donor, amount, timestamp, block_number, log_index,
    message, is_anonymous, donor_name, donor_email, recorded_at
"#;

// Block time first; ledger position breaks ties.
const NEWEST_FIRST: &str = " ORDER BY timestamp DESC, block_number DESC, log_index DESC";

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &DonationFilter) {
    let mut separator = " WHERE ";
    if let Some(campaign_id) = filter.campaign_id {
        builder.push(separator).push("campaign_id = ").push_bind(campaign_id);
        separator = " AND ";
    }
    if let Some(donor) = &filter.donor {
        builder.push(separator).push("donor = ").push_bind(donor.clone());
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
    // DONATIONS
    // ---------------------------

    /// Plain insert. A second insert for the same transaction hash fails with a
    /// unique violation, which callers treat as "already recorded".
    pub async fn insert(&self, donation: &NewDonation) -> Result<Donation, Error> {
        let query = format!(
            r#"
            INSERT INTO donations (
                transaction_hash, campaign_id, donor, amount, timestamp,
                block_number, log_index, message, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {DONATION_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(&donation.transaction_hash)
            .bind(donation.campaign_id)
            .bind(&donation.donor)
            .bind(donation.amount)
            .bind(donation.timestamp)
            .bind(donation.block_number)
            .bind(donation.log_index)
            .bind(&donation.message)
            .bind(Utc::now())
            .fetch_one(self.client.pool())
            .await
    }

    pub async fn get(&self, transaction_hash: &str) -> Result<Option<Donation>, Error> {
        let query = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE transaction_hash = ?");
        sqlx::query_as(&query).bind(transaction_hash).fetch_optional(self.client.pool()).await
    }

    pub async fn annotate(
        &self,
        transaction_hash: &str,
        annotation: &DonationAnnotation,
    ) -> Result<Option<Donation>, Error> {
        let query = format!(
            r#"
            UPDATE donations SET
                is_anonymous = COALESCE(?, is_anonymous),
                donor_name = COALESCE(?, donor_name),
                donor_email = COALESCE(?, donor_email)
            WHERE transaction_hash = ?
            RETURNING {DONATION_COLUMNS}
            "#
        );
        sqlx::query_as(&query)
            .bind(annotation.is_anonymous)
            .bind(&annotation.donor_name)
            .bind(&annotation.donor_email)
            .bind(transaction_hash)
            .fetch_optional(self.client.pool())
            .await
    }

    pub async fn list(
        &self,
        filter: &DonationFilter,
        page: &Page,
    ) -> Result<Paginated<Donation>, Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM donations");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.client.pool()).await?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {DONATION_COLUMNS} FROM donations"));
        push_filter(&mut query, filter);
        query
            .push(NEWEST_FIRST)
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as().fetch_all(self.client.pool()).await?;

        Ok(Paginated::new(items, page, total))
    }

    pub async fn recent(
        &self,
        campaign_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Donation>, Error> {
        let filter = DonationFilter { campaign_id, donor: None };
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {DONATION_COLUMNS} FROM donations"));
        push_filter(&mut query, &filter);
        query.push(NEWEST_FIRST).push(" LIMIT ").push_bind(limit);
        query.build_query_as().fetch_all(self.client.pool()).await
    }

    /// Every donation in ledger order.
    pub async fn all(&self) -> Result<Vec<Donation>, Error> {
        let query = format!(
            "SELECT {DONATION_COLUMNS} FROM donations ORDER BY block_number ASC, log_index ASC"
        );
        sqlx::query_as(&query).fetch_all(self.client.pool()).await
    }

    /// Donations whose campaign has no projection row.
    pub async fn count_orphaned(&self) -> Result<i64, Error> {
        let query = r#"
            SELECT COUNT(*) FROM donations d
            LEFT JOIN campaigns c ON c.campaign_id = d.campaign_id
            WHERE c.campaign_id IS NULL
            "#;
        sqlx::query_scalar(query).fetch_one(self.client.pool()).await
    }
}
