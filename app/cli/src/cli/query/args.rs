use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use store::campaign::model::Category;
use store::page::DEFAULT_LIMIT;
use store::stats::model::Timeframe;

use crate::cli::query::read::{FromBlock, StatusFilter};
use crate::cli::read::{Database, parse_address};

#[derive(Parser, Debug)]
#[command(about = "Select indexed results", long_about = None)]
pub struct Query {
    #[command(flatten)]
    pub database: Database,

    #[command(subcommand)]
    pub view: View,
}

#[derive(Debug, Subcommand)]
pub enum View {
    /// Campaigns, newest first
    Campaigns {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
        #[arg(long)]
        category: Option<Category>,
        /// Only active (true) or inactive (false) campaigns
        #[arg(long)]
        active: Option<bool>,
    },
    /// Admin listing: campaigns, newest first, each with its donation statistics
    AdminCampaigns {
        /// active, inactive or all
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// One campaign with its total raised, recent donations and updates
    Campaign {
        #[arg(long)]
        id: i64,
    },
    /// Donations, newest first, with per-campaign statistics when filtered by campaign
    Donations {
        #[arg(long)]
        campaign_id: Option<i64>,
        #[arg(long, value_parser = parse_address)]
        donor: Option<Address>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    Withdrawals {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Platform-wide donation statistics
    Stats,
    Dashboard,
    Analytics {
        /// 7d, 30d, 90d, 1y or all
        #[arg(long, default_value_t = Timeframe::Month)]
        timeframe: Timeframe,
    },
    /// Cached admin records
    Admins,
    /// Checkpoint at a block number, or the last one
    Checkpoint {
        #[arg(long)]
        from_block: FromBlock,
    },
}
