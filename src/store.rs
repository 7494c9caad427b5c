//! # Record Store Adapter
//!
//! Load-by-id / save semantics over the three aggregate record kinds and the
//! three append-only activity logs. The store is the only shared mutable
//! resource in the engine; all writes go through the registry, resolver, and
//! aggregator contracts, one event at a time.

use dashmap::DashMap;

use crate::records::{
    BurnRecord, FactoryRecord, MintRecord, PoolRecord, SwapRecord, TokenRecord,
};

/// Durable keyed-record collaborator.
///
/// `load_*` returns `None` for an absent id; `save_*` upserts. Activity logs
/// are append-only by discipline: the aggregator never saves the same
/// composite id twice.
pub trait RecordStore: Send + Sync {
    fn load_factory(&self, id: &str) -> Option<FactoryRecord>;
    fn save_factory(&self, record: FactoryRecord);

    fn load_pool(&self, id: &str) -> Option<PoolRecord>;
    fn save_pool(&self, record: PoolRecord);

    fn load_token(&self, id: &str) -> Option<TokenRecord>;
    fn save_token(&self, record: TokenRecord);

    fn load_mint(&self, id: &str) -> Option<MintRecord>;
    fn save_mint(&self, record: MintRecord);

    fn load_burn(&self, id: &str) -> Option<BurnRecord>;
    fn save_burn(&self, record: BurnRecord);

    fn load_swap(&self, id: &str) -> Option<SwapRecord>;
    fn save_swap(&self, record: SwapRecord);
}

/// In-memory store backed by `DashMap`, one map per record kind.
#[derive(Default)]
pub struct MemoryStore {
    factories: DashMap<String, FactoryRecord>,
    pools: DashMap<String, PoolRecord>,
    tokens: DashMap<String, TokenRecord>,
    mints: DashMap<String, MintRecord>,
    burns: DashMap<String, BurnRecord>,
    swaps: DashMap<String, SwapRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl RecordStore for MemoryStore {
    fn load_factory(&self, id: &str) -> Option<FactoryRecord> {
        self.factories.get(id).map(|r| r.clone())
    }

    fn save_factory(&self, record: FactoryRecord) {
        self.factories.insert(record.id.clone(), record);
    }

    fn load_pool(&self, id: &str) -> Option<PoolRecord> {
        self.pools.get(id).map(|r| r.clone())
    }

    fn save_pool(&self, record: PoolRecord) {
        self.pools.insert(record.id.clone(), record);
    }

    fn load_token(&self, id: &str) -> Option<TokenRecord> {
        self.tokens.get(id).map(|r| r.clone())
    }

    fn save_token(&self, record: TokenRecord) {
        self.tokens.insert(record.id.clone(), record);
    }

    fn load_mint(&self, id: &str) -> Option<MintRecord> {
        self.mints.get(id).map(|r| r.clone())
    }

    fn save_mint(&self, record: MintRecord) {
        self.mints.insert(record.id.clone(), record);
    }

    fn load_burn(&self, id: &str) -> Option<BurnRecord> {
        self.burns.get(id).map(|r| r.clone())
    }

    fn save_burn(&self, record: BurnRecord) {
        self.burns.insert(record.id.clone(), record);
    }

    fn load_swap(&self, id: &str) -> Option<SwapRecord> {
        self.swaps.get(id).map(|r| r.clone())
    }

    fn save_swap(&self, record: SwapRecord) {
        self.swaps.insert(record.id.clone(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Fetched;
    use ethers::types::Address;

    #[test]
    fn test_load_absent_returns_none() {
        let store = MemoryStore::new();
        assert!(store.load_pool("0xmissing").is_none());
        assert!(store.load_token("0xmissing").is_none());
        assert!(store.load_factory("0xmissing").is_none());
    }

    #[test]
    fn test_save_then_load_token() {
        let store = MemoryStore::new();
        let mut token = TokenRecord::unresolved(Address::zero());
        token.symbol = Fetched::Resolved("WETH".to_string());
        store.save_token(token);

        let loaded = store.load_token(&crate::records::address_id(Address::zero()));
        assert_eq!(loaded.unwrap().symbol_or_default(), "WETH");
    }
}
