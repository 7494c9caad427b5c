//! # Token Metadata Provider
//!
//! Read-only access to ERC-20 metadata (symbol, name, decimals, total supply)
//! with revert tolerance: a failed or timed-out call yields
//! [`Fetched::Unavailable`] instead of an error, so metadata trouble can never
//! stall the aggregation pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::warn;

use crate::contracts::Erc20;

/// Outcome of one external metadata read.
///
/// Kept explicit rather than coerced to a zero value: downstream consumers
/// (and tests) can tell "the contract returned zero" apart from "the call
/// reverted".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fetched<T> {
    Resolved(T),
    Unavailable,
}

impl<T> Fetched<T> {
    pub fn resolved(self) -> Option<T> {
        match self {
            Fetched::Resolved(value) => Some(value),
            Fetched::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Fetched::Unavailable)
    }
}

impl<T> From<Option<T>> for Fetched<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Fetched::Resolved(v),
            None => Fetched::Unavailable,
        }
    }
}

/// External read-only metadata facility consulted by the token resolver.
///
/// Each read is independent; implementations signal "reverted" through
/// [`Fetched::Unavailable`] and must not raise.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn read_symbol(&self, token: Address) -> Fetched<String>;
    async fn read_name(&self, token: Address) -> Fetched<String>;
    async fn read_decimals(&self, token: Address) -> Fetched<u8>;
    async fn read_total_supply(&self, token: Address) -> Fetched<U256>;
}

/// On-chain metadata provider over any ethers [`Middleware`].
pub struct Erc20MetadataProvider<M> {
    provider: Arc<M>,
    call_timeout: Duration,
}

impl<M: Middleware + 'static> Erc20MetadataProvider<M> {
    pub fn new(provider: Arc<M>, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
        }
    }

    pub fn from_settings(provider: Arc<M>, settings: &crate::settings::Settings) -> Self {
        Self::new(
            provider,
            Duration::from_secs(settings.metadata.call_timeout_secs),
        )
    }

    fn contract(&self, token: Address) -> Erc20<M> {
        Erc20::new(token, self.provider.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> MetadataProvider for Erc20MetadataProvider<M> {
    async fn read_symbol(&self, token: Address) -> Fetched<String> {
        match timeout(self.call_timeout, self.contract(token).symbol().call()).await {
            Ok(Ok(symbol)) => Fetched::Resolved(symbol),
            _ => {
                warn!("symbol() reverted/timed out for {:?}", token);
                Fetched::Unavailable
            }
        }
    }

    async fn read_name(&self, token: Address) -> Fetched<String> {
        match timeout(self.call_timeout, self.contract(token).name().call()).await {
            Ok(Ok(name)) => Fetched::Resolved(name),
            _ => {
                warn!("name() reverted/timed out for {:?}", token);
                Fetched::Unavailable
            }
        }
    }

    async fn read_decimals(&self, token: Address) -> Fetched<u8> {
        match timeout(self.call_timeout, self.contract(token).decimals().call()).await {
            Ok(Ok(decimals)) => Fetched::Resolved(decimals),
            _ => {
                warn!("decimals() reverted/timed out for {:?}", token);
                Fetched::Unavailable
            }
        }
    }

    async fn read_total_supply(&self, token: Address) -> Fetched<U256> {
        match timeout(self.call_timeout, self.contract(token).total_supply().call()).await {
            Ok(Ok(supply)) => Fetched::Resolved(supply),
            _ => {
                warn!("totalSupply() reverted/timed out for {:?}", token);
                Fetched::Unavailable
            }
        }
    }
}

/// Fixed answers for a known set of tokens; anything else reads as reverted.
///
/// Useful for wiring the engine without an RPC endpoint and for tests.
#[derive(Default)]
pub struct StaticMetadataProvider {
    entries: DashMap<Address, StaticTokenMetadata>,
}

#[derive(Debug, Clone)]
pub struct StaticTokenMetadata {
    pub symbol: Fetched<String>,
    pub name: Fetched<String>,
    pub decimals: Fetched<u8>,
    pub total_supply: Fetched<U256>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: Address, metadata: StaticTokenMetadata) {
        self.entries.insert(token, metadata);
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn read_symbol(&self, token: Address) -> Fetched<String> {
        self.entries
            .get(&token)
            .map(|m| m.symbol.clone())
            .unwrap_or(Fetched::Unavailable)
    }

    async fn read_name(&self, token: Address) -> Fetched<String> {
        self.entries
            .get(&token)
            .map(|m| m.name.clone())
            .unwrap_or(Fetched::Unavailable)
    }

    async fn read_decimals(&self, token: Address) -> Fetched<u8> {
        self.entries
            .get(&token)
            .map(|m| m.decimals.clone())
            .unwrap_or(Fetched::Unavailable)
    }

    async fn read_total_supply(&self, token: Address) -> Fetched<U256> {
        self.entries
            .get(&token)
            .map(|m| m.total_supply.clone())
            .unwrap_or(Fetched::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_distinguishes_zero_from_unavailable() {
        let fetched_zero: Fetched<U256> = Fetched::Resolved(U256::zero());
        let unavailable: Fetched<U256> = Fetched::Unavailable;

        assert_ne!(fetched_zero, unavailable);
        assert_eq!(fetched_zero.resolved(), Some(U256::zero()));
        assert!(unavailable.is_unavailable());
    }

    #[test]
    fn test_fetched_survives_serialization() {
        let resolved: Fetched<u8> = Fetched::Resolved(0);
        let unavailable: Fetched<u8> = Fetched::Unavailable;

        let resolved_json = serde_json::to_string(&resolved).unwrap();
        let unavailable_json = serde_json::to_string(&unavailable).unwrap();
        assert_ne!(resolved_json, unavailable_json);

        let back: Fetched<u8> = serde_json::from_str(&resolved_json).unwrap();
        assert_eq!(back, resolved);
    }

    #[tokio::test]
    async fn test_static_provider_defaults_unknown_tokens() {
        let provider = StaticMetadataProvider::new();
        assert!(provider.read_symbol(Address::zero()).await.is_unavailable());
        assert!(provider.read_decimals(Address::zero()).await.is_unavailable());
    }
}
