//! # Token Resolver
//!
//! Lazily materializes Token records on first reference. Resolution is
//! idempotent: once a token exists in the store it is returned unchanged, so
//! repeated references never re-fetch metadata or reset counters even if the
//! external provider would answer differently on a second call.

use std::sync::Arc;

use ethers::types::Address;
use log::debug;

use crate::metadata::MetadataProvider;
use crate::records::{address_id, TokenRecord};
use crate::store::RecordStore;

pub struct TokenResolver {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl TokenResolver {
    pub fn new(store: Arc<dyn RecordStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { store, provider }
    }

    /// Returns the Token for `address`, creating it on first reference.
    ///
    /// A new token gets up to four independent metadata reads; each may come
    /// back unavailable and is recorded as such. The (possibly partial) token
    /// is persisted before return. An existing token is returned as-is.
    pub async fn resolve(&self, address: Address) -> TokenRecord {
        let id = address_id(address);
        if let Some(existing) = self.store.load_token(&id) {
            return existing;
        }

        let symbol = self.provider.read_symbol(address).await;
        let name = self.provider.read_name(address).await;
        let decimals = self.provider.read_decimals(address).await;
        let total_supply = self.provider.read_total_supply(address).await;

        if decimals.is_unavailable() {
            debug!("TokenResolver: unable to fetch decimals for token {}", id);
        }

        let token = TokenRecord {
            id,
            symbol,
            name,
            decimals,
            total_supply,
            transfer_count: 0,
        };
        self.store.save_token(token.clone());
        token
    }

    /// Bumps a token's transfer count, creating an unresolved token when the
    /// address is first seen through a transfer rather than a pool creation.
    pub fn record_transfer(&self, address: Address) {
        let id = address_id(address);
        match self.store.load_token(&id) {
            Some(mut token) => {
                token.transfer_count += 1;
                self.store.save_token(token);
            }
            None => {
                let mut token = TokenRecord::unresolved(address);
                token.transfer_count = 1;
                self.store.save_token(token);
            }
        }
    }
}
