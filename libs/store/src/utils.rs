use alloy::{
    hex,
    primitives::{Address, B256, TxHash},
};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid address `{0}`")]
    Address(String),
    #[error("invalid transaction hash `{0}`: expected 0x followed by 64 hex digits")]
    TxHash(String),
}

/// Lower-case `0x` hex, the only form addresses take in the store.
pub fn canonical_address(address: &Address) -> String {
    hex::encode_prefixed(address)
}

pub fn canonical_hash(hash: &B256) -> String {
    hex::encode_prefixed(hash)
}

/// Accepts any casing, with or without checksum.
pub fn parse_address(input: &str) -> Result<Address, ParseError> {
    let trimmed = input.trim();
    if trimmed.len() != 42 || !trimmed.starts_with("0x") {
        return Err(ParseError::Address(input.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| ParseError::Address(input.to_string()))
}

pub fn parse_tx_hash(input: &str) -> Result<TxHash, ParseError> {
    let trimmed = input.trim();
    if trimmed.len() != 66 || !trimmed.starts_with("0x") {
        return Err(ParseError::TxHash(input.to_string()));
    }
    TxHash::from_str(trimmed).map_err(|_| ParseError::TxHash(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_mixed_case_addresses() {
        let address = parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        assert_eq!(canonical_address(&address), "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
    }

    #[test]
    fn rejects_short_hashes() {
        assert!(parse_tx_hash("0xaaa").is_err());
        assert!(parse_tx_hash(&format!("0x{}", "a".repeat(64))).is_ok());
        assert!(parse_tx_hash(&"a".repeat(66)).is_err());
    }
}
