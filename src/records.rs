//! Aggregate and activity-log record definitions.
//!
//! Three mutable aggregates (Factory, Pool, Token) and three append-only
//! activity logs (Mint, Burn, Swap). Aggregates are keyed by lower-cased hex
//! identifiers; activity logs by the composite `txHash-logIndex` identifier so
//! two same-kind events in one transaction never collide.

use ethers::types::{Address, H256, I256, U256};
use serde::{Deserialize, Serialize};

use crate::metadata::Fetched;

/// Fallback used when a token's `decimals()` read reverted.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Canonical string identifier for an address-keyed record (lower-cased hex).
pub fn address_id(address: Address) -> String {
    format!("{:?}", address).to_lowercase()
}

/// Canonical string identifier for a transaction-keyed record.
pub fn tx_id(tx_hash: H256) -> String {
    format!("{:?}", tx_hash).to_lowercase()
}

/// Composite identifier for an activity-log record.
///
/// The log index disambiguates multiple events emitted by one transaction.
pub fn activity_id(tx_hash: H256, log_index: U256) -> String {
    format!("{:?}-{}", tx_hash, log_index).to_lowercase()
}

/// One record per observed pool-creation transaction, keyed by its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryRecord {
    pub id: String,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    /// Pool from the first creation in this transaction. Later creations in
    /// the same transaction only bump `pool_count`; `pool`, `token0`,
    /// `token1`, and `fee` keep their initial values.
    pub pool: Address,
    /// Only ever increments.
    pub pool_count: u64,
    pub block_number: u64,
    pub block_timestamp: U256,
    pub transaction_hash: H256,
}

/// One record per unique pool contract, keyed by its address.
///
/// Created exactly once at first sight of its `PoolCreated` event and mutated
/// by every subsequent activity event; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRecord {
    pub id: String,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,

    pub total_liquidity_in: U256,
    pub total_liquidity_out: U256,
    /// `total_liquidity_in - total_liquidity_out`. Signed: inconsistent event
    /// streams can drive it negative and that is recorded as-is.
    pub total_liquidity: I256,
    /// `total_liquidity_in / mint_count`, zero while `mint_count` is zero.
    pub average_liquidity_in: U256,
    pub average_liquidity_out: U256,

    pub mint_count: u64,
    pub burn_count: u64,
    pub swap_count: u64,
    /// `mint_count + burn_count + swap_count`, bumped on every activity event.
    pub activity_count: u64,

    pub token0_mint_count: u64,
    pub token0_burn_count: u64,
    pub token0_swap_count: u64,
    pub token1_mint_count: u64,
    pub token1_burn_count: u64,
    pub token1_swap_count: u64,
    pub token0_transfer_count: u64,
    pub token1_transfer_count: u64,

    pub block_number: u64,
    pub timestamp: U256,
    pub transaction_hash: H256,
}

/// One record per unique token contract, keyed by its address.
///
/// Metadata fields keep their fetch outcome explicit so "fetched zero" stays
/// distinguishable from "fetch reverted".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub symbol: Fetched<String>,
    pub name: Fetched<String>,
    pub decimals: Fetched<u8>,
    pub total_supply: Fetched<U256>,
    pub transfer_count: u64,
}

impl TokenRecord {
    /// Token with no resolved metadata, as created on first sight via a
    /// transfer rather than a pool creation.
    pub fn unresolved(address: Address) -> Self {
        Self {
            id: address_id(address),
            symbol: Fetched::Unavailable,
            name: Fetched::Unavailable,
            decimals: Fetched::Unavailable,
            total_supply: Fetched::Unavailable,
            transfer_count: 0,
        }
    }

    pub fn symbol_or_default(&self) -> &str {
        match &self.symbol {
            Fetched::Resolved(s) => s,
            Fetched::Unavailable => "",
        }
    }

    pub fn decimals_or_default(&self) -> u8 {
        self.decimals.clone().resolved().unwrap_or(DEFAULT_TOKEN_DECIMALS)
    }

    pub fn total_supply_or_default(&self) -> U256 {
        self.total_supply.clone().resolved().unwrap_or_default()
    }
}

/// Immutable record of one Mint event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRecord {
    pub id: String,
    pub pool: String,
    pub sender: Address,
    /// Not carried by the V3 Mint event payload; always zero.
    pub recipient: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: U256,
    pub amount0: U256,
    pub amount1: U256,
    pub timestamp: U256,
}

/// Immutable record of one Burn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnRecord {
    pub id: String,
    pub pool: String,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: U256,
    pub amount0: U256,
    pub amount1: U256,
    pub timestamp: U256,
}

/// Immutable record of one Swap event, with the signed event amounts split
/// into in/out components by sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRecord {
    pub id: String,
    pub pool: String,
    pub sender: Address,
    pub recipient: Address,
    pub amount0_in: U256,
    pub amount0_out: U256,
    pub amount1_in: U256,
    pub amount1_out: U256,
    pub timestamp: U256,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_address_id_is_lowercase_hex() {
        let addr = Address::from_str("0xAbCd000000000000000000000000000000001234").unwrap();
        let id = address_id(addr);
        assert_eq!(id, "0xabcd000000000000000000000000000000001234");
    }

    #[test]
    fn test_activity_ids_distinct_within_one_tx() {
        let tx = H256::from_low_u64_be(0xfeed);
        let a = activity_id(tx, U256::zero());
        let b = activity_id(tx, U256::one());
        assert_ne!(a, b);
        assert!(a.ends_with("-0"));
        assert!(b.ends_with("-1"));
    }

    #[test]
    fn test_unresolved_token_defaults() {
        let token = TokenRecord::unresolved(Address::zero());
        assert_eq!(token.symbol_or_default(), "");
        assert_eq!(token.decimals_or_default(), DEFAULT_TOKEN_DECIMALS);
        assert_eq!(token.total_supply_or_default(), U256::zero());
        assert_eq!(token.transfer_count, 0);
    }
}
