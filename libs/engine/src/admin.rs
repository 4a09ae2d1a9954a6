use alloy::primitives::Address;
use chain::ledger::Ledger;
use chrono::{DateTime, Utc};
use store::admin::model::{Permission, Role};
use store::admin::store::Store as AdminStore;
use store::utils::canonical_address;

use crate::error::IngestError;

/// Proof that `caller` was the ledger owner when the check ran.
///
/// Not `Clone`: every privileged operation consumes one, so each action
/// needs its own fresh check against the ledger.
#[derive(Debug)]
pub struct Authorized {
    caller: Address,
    verified_at: DateTime<Utc>,
}

impl Authorized {
    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }
}

/// Compares `caller` with the contract owner. A failed cache refresh is only logged.
pub async fn authorize(
    ledger: &dyn Ledger,
    admins: &AdminStore,
    caller: Address,
) -> Result<Authorized, IngestError> {
    let owner = ledger.owner().await.map_err(IngestError::ledger)?;
    if owner != caller {
        tracing::warn!("Rejected privileged action from {caller}: ledger owner is {owner}");
        return Err(IngestError::Unauthorized { caller });
    }

    let verified_at = Utc::now();
    let address = canonical_address(&caller);
    match admins.record_login(&address, Role::SuperAdmin, &Permission::ALL, verified_at).await {
        Ok(admin) => {
            tracing::info!("Admin {address} verified (login #{})", admin.login_count);
            if let Err(e) = admins.deactivate_others(&address).await {
                tracing::warn!("Failed to deactivate stale admins - reason {e:?}");
            }
        }
        Err(e) => tracing::warn!("Failed to refresh admin cache for {address} - reason {e:?}"),
    }

    Ok(Authorized { caller, verified_at })
}
