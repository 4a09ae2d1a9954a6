use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_UPDATE_CONTENT_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    DisasterRelief,
    Medical,
    Education,
    Environment,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::DisasterRelief,
        Category::Medical,
        Category::Education,
        Category::Environment,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DisasterRelief => "disaster-relief",
            Category::Medical => "medical",
            Category::Education => "education",
            Category::Environment => "environment",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between 1 and {max} characters")]
    Length { field: &'static str, max: usize },
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(ValidationError::Length { field, max });
    }
    Ok(())
}

fn check_optional(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::Length { field, max });
    }
    Ok(())
}

#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Campaign {
    pub campaign_id: i64,
    pub title: String,
    pub description: String,
    pub target_amount: Amount,
    pub beneficiary: String,
    pub is_active: bool,
    #[serde(skip)]
    pub status_block_number: i64,
    #[serde(skip)]
    pub status_log_index: i64,
    pub category: Category,
    pub location: Option<String>,
    pub images: Json<Vec<CampaignImage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn status_version(&self) -> StatusVersion {
        StatusVersion { block_number: self.status_block_number, log_index: self.status_log_index }
    }
}

/// Ledger position of the observation behind an `is_active` value.
///
/// Status writes only land when their version is newer than the stored one, so
/// replaying events in any order converges on the latest ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatusVersion {
    pub block_number: i64,
    pub log_index: i64,
}

impl StatusVersion {
    /// Position of a `CampaignCreated` or `CampaignStatusChanged` log.
    pub fn at_log(block_number: u64, log_index: u64) -> Self {
        Self { block_number: block_number as i64, log_index: log_index as i64 }
    }

    /// A contract read at `block_number` sees every log in that block.
    pub fn at_block(block_number: u64) -> Self {
        Self { block_number: block_number as i64, log_index: i64::MAX }
    }
}

/// Ledger-owned campaign fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaign {
    pub campaign_id: i64,
    pub title: String,
    pub target_amount: Amount,
    pub beneficiary: String,
    pub is_active: bool,
    pub version: StatusVersion,
}

/// Off-chain metadata written when an admin mirrors a campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetadata {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: Option<String>,
    pub images: Vec<CampaignImage>,
}

impl CampaignMetadata {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("title", &self.title, MAX_TITLE_LEN)?;
        check_optional("description", &self.description, MAX_DESCRIPTION_LEN)
    }
}

/// Partial metadata edit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub images: Option<Vec<CampaignImage>>,
}

impl CampaignPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_required("title", title, MAX_TITLE_LEN)?;
        }
        if let Some(description) = &self.description {
            check_optional("description", description, MAX_DESCRIPTION_LEN)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &CampaignPatch::default()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct CampaignUpdate {
    pub id: i64,
    pub campaign_id: i64,
    pub title: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaignUpdate {
    pub title: String,
    pub content: String,
}

impl NewCampaignUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("update title", &self.title, MAX_TITLE_LEN)?;
        check_required("update content", &self.content, MAX_UPDATE_CONTENT_LEN)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignFilter {
    pub category: Option<Category>,
    pub is_active: Option<bool>,
}

/// Result of re-asserting a campaign's active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusWrite {
    Applied,
    /// The stored flag comes from the same or a later ledger position.
    Superseded,
    Missing,
}
