use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::campaign::model::{Campaign, CampaignUpdate, Category};
use crate::donation::model::Donation;
use crate::page::Paginated;

/// The columns of a donation that aggregates need, joined with its campaign.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct DonationFigure {
    pub campaign_id: i64,
    pub title: String,
    pub category: Category,
    pub donor: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DonationSummary {
    pub total_amount: Amount,
    pub donation_count: u64,
    pub unique_donors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_amount: Amount,
    pub donation_count: u64,
    pub unique_donors: u64,
    pub unique_campaigns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignTotal {
    pub campaign_id: i64,
    pub title: String,
    pub total_raised: Amount,
    pub donation_count: u64,
    pub unique_donors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorTotal {
    pub donor: String,
    pub total_amount: Amount,
    pub donation_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_amount: Amount,
    pub donation_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub campaign_count: u64,
    pub total_raised: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub total_target: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub total_raised: Amount,
    pub recent_donations: Vec<Donation>,
    pub updates: Vec<CampaignUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignWithStats {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub stats: DonationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDonations {
    pub donations: Paginated<Donation>,
    pub statistics: DonationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationStats {
    pub overall: OverallStats,
    pub top_campaigns: Vec<CampaignTotal>,
    pub recent_donations: Vec<Donation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub campaigns: CampaignSummary,
    pub donations: DonationSummary,
    pub recent_campaigns: Vec<Campaign>,
    pub recent_donations: Vec<Donation>,
    pub campaign_performance: Vec<CampaignTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub timeframe: Timeframe,
    pub donation_trends: Vec<DailyTotal>,
    pub top_donors: Vec<DonorTotal>,
    pub category_performance: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Quarter => "90d",
            Timeframe::Year => "1y",
            Timeframe::All => "all",
        }
    }

    /// Earliest donation timestamp included, `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
            Timeframe::Year => 365,
            Timeframe::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            "90d" => Ok(Timeframe::Quarter),
            "1y" => Ok(Timeframe::Year),
            "all" => Ok(Timeframe::All),
            other => Err(format!("unknown timeframe `{other}` (expected 7d, 30d, 90d, 1y or all)")),
        }
    }
}

impl Serialize for Timeframe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------
// FOLDS
// ---------------------------

pub fn summarize(figures: &[DonationFigure]) -> DonationSummary {
    let donors: HashSet<&str> = figures.iter().map(|f| f.donor.as_str()).collect();
    DonationSummary {
        total_amount: figures.iter().map(|f| f.amount).sum(),
        donation_count: figures.len() as u64,
        unique_donors: donors.len() as u64,
    }
}

pub fn overall(figures: &[DonationFigure]) -> OverallStats {
    let summary = summarize(figures);
    let campaigns: HashSet<i64> = figures.iter().map(|f| f.campaign_id).collect();
    OverallStats {
        total_amount: summary.total_amount,
        donation_count: summary.donation_count,
        unique_donors: summary.unique_donors,
        unique_campaigns: campaigns.len() as u64,
    }
}

// Largest first, at most `limit` entries.
pub fn campaign_totals(figures: &[DonationFigure], limit: usize) -> Vec<CampaignTotal> {
    let mut grouped: HashMap<i64, (String, Amount, u64, HashSet<&str>)> = HashMap::new();
    for figure in figures {
        let entry = grouped
            .entry(figure.campaign_id)
            .or_insert_with(|| (figure.title.clone(), Amount::ZERO, 0, HashSet::new()));
        entry.1 = entry.1 + figure.amount;
        entry.2 += 1;
        entry.3.insert(figure.donor.as_str());
    }

    let mut totals: Vec<CampaignTotal> = grouped
        .into_iter()
        .map(|(campaign_id, (title, total_raised, donation_count, donors))| CampaignTotal {
            campaign_id,
            title,
            total_raised,
            donation_count,
            unique_donors: donors.len() as u64,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_raised.cmp(&a.total_raised).then(a.campaign_id.cmp(&b.campaign_id))
    });
    totals.truncate(limit);
    totals
}

pub fn donor_totals(figures: &[DonationFigure], limit: usize) -> Vec<DonorTotal> {
    let mut grouped: HashMap<&str, (Amount, u64)> = HashMap::new();
    for figure in figures {
        let entry = grouped.entry(figure.donor.as_str()).or_default();
        entry.0 = entry.0 + figure.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<DonorTotal> = grouped
        .into_iter()
        .map(|(donor, (total_amount, donation_count))| DonorTotal {
            donor: donor.to_string(),
            total_amount,
            donation_count,
        })
        .collect();
    totals.sort_by(|a, b| b.total_amount.cmp(&a.total_amount).then(a.donor.cmp(&b.donor)));
    totals.truncate(limit);
    totals
}

pub fn daily_totals(figures: &[DonationFigure]) -> Vec<DailyTotal> {
    let mut grouped: BTreeMap<NaiveDate, (Amount, u64)> = BTreeMap::new();
    for figure in figures {
        let entry = grouped.entry(figure.timestamp.date_naive()).or_default();
        entry.0 = entry.0 + figure.amount;
        entry.1 += 1;
    }
    grouped
        .into_iter()
        .map(|(date, (total_amount, donation_count))| DailyTotal {
            date,
            total_amount,
            donation_count,
        })
        .collect()
}

/// Totals per category. Categories without campaigns are left out.
pub fn category_totals(campaigns: &[Campaign], figures: &[DonationFigure]) -> Vec<CategoryTotal> {
    let mut counts: HashMap<Category, u64> = HashMap::new();
    for campaign in campaigns {
        *counts.entry(campaign.category).or_default() += 1;
    }
    let mut raised: HashMap<Category, Amount> = HashMap::new();
    for figure in figures {
        let entry = raised.entry(figure.category).or_default();
        *entry = *entry + figure.amount;
    }

    let mut totals: Vec<CategoryTotal> = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let campaign_count = counts.get(&category).copied()?;
            Some(CategoryTotal {
                category,
                campaign_count,
                total_raised: raised.get(&category).copied().unwrap_or_default(),
            })
        })
        .collect();
    totals.sort_by(|a, b| b.total_raised.cmp(&a.total_raised));
    totals
}

pub fn campaign_summary(campaigns: &[Campaign]) -> CampaignSummary {
    CampaignSummary {
        total_campaigns: campaigns.len() as u64,
        active_campaigns: campaigns.iter().filter(|c| c.is_active).count() as u64,
        total_target: campaigns.iter().map(|c| c.target_amount).sum(),
    }
}
