//! # Pool Registry
//!
//! Creates the Pool aggregate the first time a pool address is observed via a
//! factory event, with every counter seeded to zero, and keeps the Factory
//! aggregate's pool count in step. Both constituent tokens are resolved as a
//! side effect so no Pool ever exists with unresolved tokens.

use std::sync::Arc;

use ethers::types::{I256, U256};
use log::{debug, info};

use crate::events::PoolCreatedEvent;
use crate::records::{address_id, tx_id, FactoryRecord, PoolRecord};
use crate::store::RecordStore;
use crate::token_resolver::TokenResolver;

pub struct PoolRegistry {
    store: Arc<dyn RecordStore>,
    resolver: Arc<TokenResolver>,
}

impl PoolRegistry {
    pub fn new(store: Arc<dyn RecordStore>, resolver: Arc<TokenResolver>) -> Self {
        Self { store, resolver }
    }

    /// Registers the pool announced by a `PoolCreated` event.
    ///
    /// Idempotent: if a Pool already exists for this address the call is a
    /// complete no-op (no counter touched, no factory update) and the
    /// existing record is returned. Otherwise the Factory aggregate keyed by
    /// the triggering transaction is created with `pool_count = 1` or
    /// incremented, both tokens are resolved, and the zero-seeded Pool is
    /// persisted.
    pub async fn register_pool(&self, event: &PoolCreatedEvent) -> PoolRecord {
        let pool_id = address_id(event.pool);
        if let Some(existing) = self.store.load_pool(&pool_id) {
            debug!("PoolRegistry: pool {} already registered, skipping", pool_id);
            return existing;
        }

        self.update_factory(event);

        self.resolver.resolve(event.token0).await;
        self.resolver.resolve(event.token1).await;

        let pool = Self::initialize_pool(pool_id, event);
        self.store.save_pool(pool.clone());
        info!(
            "PoolRegistry: registered pool {} (token0 {:?}, token1 {:?}, fee {})",
            pool.id, event.token0, event.token1, event.fee
        );
        pool
    }

    fn update_factory(&self, event: &PoolCreatedEvent) {
        let factory_id = tx_id(event.block.transaction_hash);
        match self.store.load_factory(&factory_id) {
            Some(mut factory) => {
                factory.pool_count += 1;
                self.store.save_factory(factory);
            }
            None => {
                self.store.save_factory(FactoryRecord {
                    id: factory_id,
                    token0: event.token0,
                    token1: event.token1,
                    fee: event.fee,
                    tick_spacing: event.tick_spacing,
                    pool: event.pool,
                    pool_count: 1,
                    block_number: event.block.block_number,
                    block_timestamp: event.block.block_timestamp,
                    transaction_hash: event.block.transaction_hash,
                });
            }
        }
    }

    fn initialize_pool(pool_id: String, event: &PoolCreatedEvent) -> PoolRecord {
        PoolRecord {
            id: pool_id,
            token0: event.token0,
            token1: event.token1,
            fee: event.fee,
            tick_spacing: event.tick_spacing,
            total_liquidity_in: U256::zero(),
            total_liquidity_out: U256::zero(),
            total_liquidity: I256::zero(),
            average_liquidity_in: U256::zero(),
            average_liquidity_out: U256::zero(),
            mint_count: 0,
            burn_count: 0,
            swap_count: 0,
            activity_count: 0,
            token0_mint_count: 0,
            token0_burn_count: 0,
            token0_swap_count: 0,
            token1_mint_count: 0,
            token1_burn_count: 0,
            token1_swap_count: 0,
            token0_transfer_count: 0,
            token1_transfer_count: 0,
            block_number: event.block.block_number,
            timestamp: event.block.block_timestamp,
            transaction_hash: event.block.transaction_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BlockMeta;
    use crate::metadata::StaticMetadataProvider;
    use crate::store::MemoryStore;
    use ethers::types::{Address, H256};

    fn test_event(pool: u64, tx: u64) -> PoolCreatedEvent {
        PoolCreatedEvent {
            token0: Address::from_low_u64_be(0xa),
            token1: Address::from_low_u64_be(0xb),
            fee: 500,
            tick_spacing: 10,
            pool: Address::from_low_u64_be(pool),
            block: BlockMeta {
                block_number: 100,
                block_timestamp: U256::from(1_700_000_000u64),
                transaction_hash: H256::from_low_u64_be(tx),
            },
        }
    }

    fn registry_with_store() -> (PoolRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(TokenResolver::new(
            store.clone(),
            Arc::new(StaticMetadataProvider::new()),
        ));
        (PoolRegistry::new(store.clone(), resolver), store)
    }

    #[tokio::test]
    async fn test_register_seeds_all_counters_to_zero() {
        let (registry, store) = registry_with_store();
        let pool = registry.register_pool(&test_event(0xd0, 0x11)).await;

        assert_eq!(pool.mint_count, 0);
        assert_eq!(pool.burn_count, 0);
        assert_eq!(pool.swap_count, 0);
        assert_eq!(pool.activity_count, 0);
        assert_eq!(pool.total_liquidity, I256::zero());
        assert_eq!(pool.average_liquidity_in, U256::zero());

        // Both tokens must exist after registration.
        assert_eq!(store.token_count(), 2);
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (registry, store) = registry_with_store();
        let event = test_event(0xd0, 0x11);

        let first = registry.register_pool(&event).await;
        let second = registry.register_pool(&event).await;

        assert_eq!(first.id, second.id);
        assert_eq!(store.pool_count(), 1);

        // Factory count untouched by the duplicate registration.
        let factory = store
            .load_factory(&tx_id(event.block.transaction_hash))
            .unwrap();
        assert_eq!(factory.pool_count, 1);
    }

    #[tokio::test]
    async fn test_factory_counts_pools_per_transaction() {
        let (registry, store) = registry_with_store();

        registry.register_pool(&test_event(0xd0, 0x11)).await;
        registry.register_pool(&test_event(0xd1, 0x11)).await;
        registry.register_pool(&test_event(0xd2, 0x22)).await;

        let first_tx = store.load_factory(&tx_id(H256::from_low_u64_be(0x11))).unwrap();
        let second_tx = store.load_factory(&tx_id(H256::from_low_u64_be(0x22))).unwrap();
        assert_eq!(first_tx.pool_count, 2);
        assert_eq!(second_tx.pool_count, 1);

        // The record keeps the first creation's pool; only the count moves.
        assert_eq!(first_tx.pool, Address::from_low_u64_be(0xd0));
    }
}
