use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use clap::{arg, command};
use store::campaign::model::{CampaignImage, Category};

use crate::cli::read::{Database, Node, Tuning, parse_address};

#[derive(Parser, Debug)]
#[command(
    about = "Privileged campaign operations, checked against the ledger owner",
    long_about = None
)]
pub struct Admin {
    #[command(flatten)]
    pub node: Node,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub tuning: Tuning,

    /// Address acting as admin
    #[arg(long, value_parser = parse_address)]
    pub caller: Address,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Mirror a ledger campaign with its off-chain metadata
    Mirror {
        #[arg(long)]
        campaign_id: u64,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = Category::DisasterRelief)]
        category: Category,
        #[arg(long)]
        location: Option<String>,
        /// Image URL; repeat for several
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Edit off-chain metadata; omitted fields stay as they are
    Update {
        #[arg(long)]
        campaign_id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        location: Option<String>,
        /// Replaces every image; repeat for several
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Post a progress update
    PostUpdate {
        #[arg(long)]
        campaign_id: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
}

pub fn images(urls: &[String]) -> Vec<CampaignImage> {
    urls.iter().map(|url| CampaignImage { url: url.clone(), caption: None }).collect()
}
