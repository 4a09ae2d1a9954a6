use alloy::consensus::Transaction as _;
use alloy::primitives::{Address, BlockHash, BlockNumber, TxHash, U256};
use alloy::providers::Provider;
use eyre::Result;

use crate::rpc::NodeClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: &'static str,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub block_number: Option<BlockNumber>,
    pub block_hash: Option<BlockHash>,
    pub transaction_index: Option<u64>,
    /// None while the transaction is pending.
    pub receipt: Option<ReceiptInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub success: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub log_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    pub address: Address,
    pub balance: U256,
    pub transaction_count: u64,
    pub is_contract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeInfo {
    pub gas_price: u128,
    /// Absent on nodes without EIP-1559 fee history.
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        17000 => "holesky",
        11155111 => "sepolia",
        1337 | 31337 => "localhost",
        _ => "unknown",
    }
}

impl NodeClient {
    pub async fn network(&self) -> Result<NetworkInfo> {
        let chain_id = self.provider.get_chain_id().await?;
        let block_number = self.provider.get_block_number().await?;
        Ok(NetworkInfo { chain_id, name: network_name(chain_id), block_number })
    }

    pub async fn transaction(&self, tx_hash: TxHash) -> Result<Option<TransactionInfo>> {
        let Some(tx) = self.provider.get_transaction_by_hash(tx_hash).await? else {
            return Ok(None);
        };
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?.map(|receipt| {
            ReceiptInfo {
                success: receipt.status(),
                gas_used: receipt.gas_used,
                effective_gas_price: receipt.effective_gas_price,
                log_count: receipt.inner.logs().len(),
            }
        });

        Ok(Some(TransactionInfo {
            hash: tx_hash,
            from: alloy::network::TransactionResponse::from(&tx),
            to: tx.to(),
            value: tx.value(),
            gas_limit: tx.gas_limit(),
            gas_price: tx.effective_gas_price.unwrap_or_else(|| tx.max_fee_per_gas()),
            block_number: tx.block_number,
            block_hash: tx.block_hash,
            transaction_index: tx.transaction_index,
            receipt,
        }))
    }

    pub async fn address(&self, address: Address) -> Result<AddressInfo> {
        let balance = self.provider.get_balance(address).await?;
        let transaction_count = self.provider.get_transaction_count(address).await?;
        let code = self.provider.get_code_at(address).await?;
        Ok(AddressInfo { address, balance, transaction_count, is_contract: !code.is_empty() })
    }

    pub async fn fees(&self) -> Result<FeeInfo> {
        let gas_price = self.provider.get_gas_price().await?;
        let estimate = match self.provider.estimate_eip1559_fees().await {
            Ok(estimate) => Some(estimate),
            Err(e) => {
                tracing::debug!("No EIP-1559 fee estimate - reason {e}");
                None
            }
        };
        Ok(FeeInfo {
            gas_price,
            max_fee_per_gas: estimate.map(|fees| fees.max_fee_per_gas),
            max_priority_fee_per_gas: estimate.map(|fees| fees.max_priority_fee_per_gas),
        })
    }
}
