use alloy::primitives::U256;
use alloy::primitives::utils::format_units;
use chain::ledger::Ledger;
use eyre::{Result, eyre};
use serde_json::json;
use store::amount::Amount;
use store::utils::{canonical_address, canonical_hash};

use crate::cli::ledger::args::{LedgerQuery, LedgerRead};
use crate::cli::response::print_json;

pub async fn read(query: &LedgerQuery) -> Result<()> {
    let ledger = query.node.client()?;

    match &query.read {
        LedgerRead::TotalFunds => {
            let total = Amount::from_wei(ledger.total_funds().await?);
            print_json(&json!({ "total_funds": total }))
        }
        LedgerRead::Donors => {
            let donors: Vec<String> =
                ledger.donor_list().await?.iter().map(canonical_address).collect();
            print_json(&json!({ "count": donors.len(), "donors": donors }))
        }
        LedgerRead::Owner => {
            print_json(&json!({ "owner": canonical_address(&ledger.owner().await?) }))
        }
        LedgerRead::Campaigns { id: None } => {
            print_json(&json!({ "campaign_counter": ledger.campaign_counter().await? }))
        }
        LedgerRead::Campaigns { id: Some(id) } => {
            let latest = ledger.latest_block_number().await?;
            let campaign =
                ledger.campaign(*id, latest).await?.ok_or(eyre!("Campaign {id} Not On Ledger"))?;
            print_json(&json!({
                "campaign_id": campaign.campaign_id,
                "beneficiary": canonical_address(&campaign.beneficiary),
                "target_amount": Amount::from_wei(campaign.target_amount),
                "is_active": campaign.is_active,
            }))
        }
        LedgerRead::Network => {
            let network = ledger.network().await?;
            print_json(&json!({
                "chain_id": network.chain_id,
                "name": network.name,
                "block_number": network.block_number,
            }))
        }
        LedgerRead::Transaction { tx_hash } => {
            let tx = ledger.transaction(*tx_hash).await?.ok_or(eyre!("Transaction Not Found"))?;
            let receipt = match &tx.receipt {
                Some(receipt) => json!({
                    "status": if receipt.success { 1 } else { 0 },
                    "gas_used": receipt.gas_used,
                    "effective_gas_price": gwei(receipt.effective_gas_price)?,
                    "logs": receipt.log_count,
                }),
                None => serde_json::Value::Null,
            };
            print_json(&json!({
                "hash": canonical_hash(&tx.hash),
                "from": canonical_address(&tx.from),
                "to": tx.to.as_ref().map(canonical_address),
                "value": Amount::from_wei(tx.value),
                "gas_limit": tx.gas_limit,
                "gas_price": gwei(tx.gas_price)?,
                "block_number": tx.block_number,
                "block_hash": tx.block_hash.as_ref().map(canonical_hash),
                "transaction_index": tx.transaction_index,
                "receipt": receipt,
            }))
        }
        LedgerRead::Address { address } => {
            let account = ledger.address(*address).await?;
            print_json(&json!({
                "address": canonical_address(&account.address),
                "balance": Amount::from_wei(account.balance),
                "transaction_count": account.transaction_count,
                "is_contract": account.is_contract,
            }))
        }
        LedgerRead::GasPrice => {
            let fees = ledger.fees().await?;
            print_json(&json!({
                "gas_price": gwei(fees.gas_price)?,
                "max_fee_per_gas": fees.max_fee_per_gas.map(gwei).transpose()?,
                "max_priority_fee_per_gas": fees.max_priority_fee_per_gas.map(gwei).transpose()?,
            }))
        }
    }
}

fn gwei(wei: u128) -> Result<String> {
    Ok(format_units(U256::from(wei), "gwei")?)
}
