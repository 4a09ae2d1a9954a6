use chrono::Utc;
use eyre::{Result, eyre};
use store::donation::model::DonationFilter;
use store::page::Page;
use store::utils::canonical_address;

use crate::cli::query::args::{Query, View};
use crate::cli::query::read::FromBlock;
use crate::cli::response::print_json;

pub async fn select(query: &Query) -> Result<()> {
    let client = query.database.client().await?;

    let campaign_store = store::campaign::store::Store::new(client.clone());
    let donation_store = store::donation::store::Store::new(client.clone());
    let stats_store = store::stats::store::Store::new(client.clone());

    match &query.view {
        View::Campaigns { page, limit, category, active } => {
            let filter = store::campaign::model::CampaignFilter {
                category: *category,
                is_active: *active,
            };
            let campaigns = campaign_store.list(&filter, &Page::new(*page, *limit)).await?;
            print_json(&campaigns)
        }
        View::AdminCampaigns { status, page, limit } => {
            let filter = store::campaign::model::CampaignFilter {
                category: None,
                is_active: status.is_active(),
            };
            print_json(&stats_store.admin_campaigns(&filter, &Page::new(*page, *limit)).await?)
        }
        View::Campaign { id } => {
            let detail =
                stats_store.campaign_detail(*id).await?.ok_or(eyre!("Campaign {id} Not Found"))?;
            print_json(&detail)
        }
        View::Donations { campaign_id, donor, page, limit } => {
            let page = Page::new(*page, *limit);
            match (campaign_id, donor) {
                (Some(campaign_id), None) => {
                    if !campaign_store.exists(*campaign_id).await? {
                        return Err(eyre!("Campaign {campaign_id} Not Found"));
                    }
                    print_json(&stats_store.campaign_donations(*campaign_id, &page).await?)
                }
                _ => {
                    let filter = DonationFilter {
                        campaign_id: *campaign_id,
                        donor: donor.as_ref().map(canonical_address),
                    };
                    print_json(&donation_store.list(&filter, &page).await?)
                }
            }
        }
        View::Withdrawals { page, limit } => {
            let withdrawal_store = store::withdrawal::store::Store::new(client.clone());
            print_json(&withdrawal_store.list(&Page::new(*page, *limit)).await?)
        }
        View::Stats => print_json(&stats_store.donation_stats().await?),
        View::Dashboard => print_json(&stats_store.dashboard().await?),
        View::Analytics { timeframe } => {
            print_json(&stats_store.analytics(*timeframe, Utc::now()).await?)
        }
        View::Admins => {
            let admin_store = store::admin::store::Store::new(client.clone());
            print_json(&admin_store.list().await?)
        }
        View::Checkpoint { from_block } => {
            let checkpoint_store = store::checkpoint::store::Store::new(client.clone());

            let checkpoint = match from_block {
                FromBlock::Number(block_number) => {
                    checkpoint_store.at_block(*block_number).await?
                }
                FromBlock::Last => checkpoint_store.last().await?,
            }
            .ok_or(eyre!("Checkpoint Not Found"))?;

            print_json(&checkpoint)
        }
    }
}
