use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    CreateCampaign,
    EditCampaign,
    DeleteCampaign,
    WithdrawFunds,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::CreateCampaign,
        Permission::EditCampaign,
        Permission::DeleteCampaign,
        Permission::WithdrawFunds,
        Permission::ManageUsers,
    ];
}

/// Cached role metadata for an address that passed the ledger owner check.
/// Never consulted to decide who may act.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Admin {
    pub address: String,
    pub role: Role,
    pub permissions: Json<Vec<Permission>>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
