//! # Activity Aggregator
//!
//! The reducer. Consumes Mint/Burn/Swap events for registered pools, appends
//! one immutable activity record per event, and folds the event into the
//! pool's running liquidity and count statistics. Each transition runs to
//! completion (load, mutate, persist) before the next event is considered.
//!
//! An event whose pool id has no Pool record is dropped silently: it is
//! permanently lost for aggregation purposes, which is acceptable only
//! because subscription registration precedes delivery.

use std::sync::Arc;

use ethers::types::{Address, I256, U256};
use log::debug;

use crate::events::{BurnEvent, MintEvent, SwapEvent, TransferEvent};
use crate::records::{activity_id, address_id, BurnRecord, MintRecord, PoolRecord, SwapRecord};
use crate::store::RecordStore;
use crate::token_resolver::TokenResolver;

/// `total_liquidity_in - total_liquidity_out` as a signed quantity.
///
/// Goes negative only when the event stream itself is inconsistent (more
/// liquidity out than in); recorded as-is rather than corrected.
fn net_liquidity(total_in: U256, total_out: U256) -> I256 {
    if total_in >= total_out {
        I256::try_from(total_in - total_out).unwrap_or(I256::MAX)
    } else {
        -I256::try_from(total_out - total_in).unwrap_or(I256::MAX)
    }
}

/// Splits a signed swap delta into (in, out) magnitudes.
fn split_signed(amount: I256) -> (U256, U256) {
    if amount.is_negative() {
        (U256::zero(), amount.unsigned_abs())
    } else {
        (amount.unsigned_abs(), U256::zero())
    }
}

pub struct ActivityAggregator {
    store: Arc<dyn RecordStore>,
    resolver: Arc<TokenResolver>,
}

impl ActivityAggregator {
    pub fn new(store: Arc<dyn RecordStore>, resolver: Arc<TokenResolver>) -> Self {
        Self { store, resolver }
    }

    fn load_pool(&self, pool: Address) -> Option<PoolRecord> {
        let id = address_id(pool);
        let record = self.store.load_pool(&id);
        if record.is_none() {
            debug!("Aggregator: dropping event for unregistered pool {}", id);
        }
        record
    }

    /// Appends a Mint record and folds the amount into the pool's inbound
    /// liquidity statistics.
    pub fn apply_mint(&self, event: &MintEvent) {
        let Some(mut pool) = self.load_pool(event.pool) else {
            return;
        };

        self.store.save_mint(MintRecord {
            id: activity_id(event.tx_hash, event.log_index),
            pool: pool.id.clone(),
            sender: event.sender,
            recipient: Address::zero(),
            tick_lower: event.tick_lower,
            tick_upper: event.tick_upper,
            amount: event.amount,
            amount0: event.amount0,
            amount1: event.amount1,
            timestamp: event.block_timestamp,
        });

        pool.total_liquidity_in = pool.total_liquidity_in.saturating_add(event.amount);
        pool.mint_count += 1;
        // mint_count was just incremented, so the division is safe.
        pool.average_liquidity_in = pool.total_liquidity_in / U256::from(pool.mint_count);

        // Attribution by sender address, compared against the token contract
        // addresses. An account address never equals a token address in
        // practice; kept literal pending clarified product intent.
        if event.sender == pool.token0 {
            pool.token0_mint_count += 1;
        } else if event.sender == pool.token1 {
            pool.token1_mint_count += 1;
        }

        self.finish(pool);
    }

    /// Appends a Burn record and folds the amount into the pool's outbound
    /// liquidity statistics.
    pub fn apply_burn(&self, event: &BurnEvent) {
        let Some(mut pool) = self.load_pool(event.pool) else {
            return;
        };

        self.store.save_burn(BurnRecord {
            id: activity_id(event.tx_hash, event.log_index),
            pool: pool.id.clone(),
            owner: event.owner,
            tick_lower: event.tick_lower,
            tick_upper: event.tick_upper,
            amount: event.amount,
            amount0: event.amount0,
            amount1: event.amount1,
            timestamp: event.block_timestamp,
        });

        pool.total_liquidity_out = pool.total_liquidity_out.saturating_add(event.amount);
        pool.burn_count += 1;
        pool.average_liquidity_out = pool.total_liquidity_out / U256::from(pool.burn_count);

        if event.owner == pool.token0 {
            pool.token0_burn_count += 1;
        } else if event.owner == pool.token1 {
            pool.token1_burn_count += 1;
        }

        self.finish(pool);
    }

    /// Appends a Swap record and moves the net swapped amount through both
    /// liquidity accumulators.
    ///
    /// The signed event amounts are split by sign for the stored record; the
    /// net amount is the magnitude of their signed sum. A zero-net swap still
    /// counts as activity but contributes nothing to the liquidity deltas.
    pub fn apply_swap(&self, event: &SwapEvent) {
        let Some(mut pool) = self.load_pool(event.pool) else {
            return;
        };

        let (amount0_in, amount0_out) = split_signed(event.amount0);
        let (amount1_in, amount1_out) = split_signed(event.amount1);

        self.store.save_swap(SwapRecord {
            id: activity_id(event.tx_hash, event.log_index),
            pool: pool.id.clone(),
            sender: event.sender,
            recipient: event.recipient,
            amount0_in,
            amount0_out,
            amount1_in,
            amount1_out,
            timestamp: event.block_timestamp,
        });

        let net_moved = event.amount0.saturating_add(event.amount1).unsigned_abs();
        pool.total_liquidity_in = pool.total_liquidity_in.saturating_add(net_moved);
        pool.total_liquidity_out = pool.total_liquidity_out.saturating_add(net_moved);
        pool.swap_count += 1;

        if event.sender == pool.token0 {
            pool.token0_swap_count += 1;
        } else if event.sender == pool.token1 {
            pool.token1_swap_count += 1;
        }

        self.finish(pool);
    }

    /// Bumps the pool-side and token-side transfer counters for an ERC-20
    /// transfer attributed to a tracked pool.
    pub fn apply_transfer(&self, event: &TransferEvent) {
        let Some(mut pool) = self.load_pool(event.pool) else {
            return;
        };

        if event.token == pool.token0 {
            pool.token0_transfer_count += 1;
        } else if event.token == pool.token1 {
            pool.token1_transfer_count += 1;
        }
        pool.activity_count += 1;
        self.store.save_pool(pool);

        self.resolver.record_transfer(event.token);
    }

    fn finish(&self, mut pool: PoolRecord) {
        pool.activity_count += 1;
        pool.total_liquidity = net_liquidity(pool.total_liquidity_in, pool.total_liquidity_out);
        self.store.save_pool(pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BlockMeta, PoolCreatedEvent};
    use crate::metadata::StaticMetadataProvider;
    use crate::pool_registry::PoolRegistry;
    use crate::store::MemoryStore;
    use ethers::types::H256;

    const POOL: u64 = 0xd0;

    async fn setup() -> (ActivityAggregator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(TokenResolver::new(
            store.clone(),
            Arc::new(StaticMetadataProvider::new()),
        ));
        let registry = PoolRegistry::new(store.clone(), resolver.clone());
        registry
            .register_pool(&PoolCreatedEvent {
                token0: Address::from_low_u64_be(0xa),
                token1: Address::from_low_u64_be(0xb),
                fee: 500,
                tick_spacing: 10,
                pool: Address::from_low_u64_be(POOL),
                block: BlockMeta {
                    block_number: 100,
                    block_timestamp: U256::from(1_700_000_000u64),
                    transaction_hash: H256::from_low_u64_be(0x1),
                },
            })
            .await;
        (ActivityAggregator::new(store.clone(), resolver), store)
    }

    fn mint(amount: u64, tx: u64, log_index: u64) -> MintEvent {
        MintEvent {
            pool: Address::from_low_u64_be(POOL),
            sender: Address::from_low_u64_be(0x51),
            tick_lower: -60,
            tick_upper: 60,
            amount: U256::from(amount),
            amount0: U256::from(amount / 2),
            amount1: U256::from(amount / 2),
            block_timestamp: U256::from(1_700_000_100u64),
            tx_hash: H256::from_low_u64_be(tx),
            log_index: U256::from(log_index),
        }
    }

    fn burn(amount: u64, tx: u64, log_index: u64) -> BurnEvent {
        BurnEvent {
            pool: Address::from_low_u64_be(POOL),
            owner: Address::from_low_u64_be(0x52),
            tick_lower: -60,
            tick_upper: 60,
            amount: U256::from(amount),
            amount0: U256::from(amount / 2),
            amount1: U256::from(amount / 2),
            block_timestamp: U256::from(1_700_000_200u64),
            tx_hash: H256::from_low_u64_be(tx),
            log_index: U256::from(log_index),
        }
    }

    fn swap(amount0: i64, amount1: i64, tx: u64, log_index: u64) -> SwapEvent {
        SwapEvent {
            pool: Address::from_low_u64_be(POOL),
            sender: Address::from_low_u64_be(0x53),
            recipient: Address::from_low_u64_be(0x54),
            amount0: I256::from(amount0),
            amount1: I256::from(amount1),
            block_timestamp: U256::from(1_700_000_300u64),
            tx_hash: H256::from_low_u64_be(tx),
            log_index: U256::from(log_index),
        }
    }

    fn pool_record(store: &MemoryStore) -> PoolRecord {
        store
            .load_pool(&address_id(Address::from_low_u64_be(POOL)))
            .unwrap()
    }

    #[test]
    fn test_net_liquidity_can_go_negative() {
        assert_eq!(
            net_liquidity(U256::from(100u64), U256::from(400u64)),
            I256::from(-300)
        );
        assert_eq!(
            net_liquidity(U256::from(400u64), U256::from(100u64)),
            I256::from(300)
        );
    }

    #[test]
    fn test_split_signed() {
        assert_eq!(
            split_signed(I256::from(7)),
            (U256::from(7u64), U256::zero())
        );
        assert_eq!(
            split_signed(I256::from(-7)),
            (U256::zero(), U256::from(7u64))
        );
        assert_eq!(split_signed(I256::zero()), (U256::zero(), U256::zero()));
    }

    #[tokio::test]
    async fn test_mint_sequence_accumulates_and_averages() {
        let (aggregator, store) = setup().await;

        aggregator.apply_mint(&mint(1000, 0x10, 0));
        aggregator.apply_mint(&mint(500, 0x10, 1));
        aggregator.apply_mint(&mint(300, 0x11, 0));

        let pool = pool_record(&store);
        assert_eq!(pool.total_liquidity_in, U256::from(1800u64));
        assert_eq!(pool.mint_count, 3);
        assert_eq!(pool.average_liquidity_in, U256::from(600u64));
        assert_eq!(pool.total_liquidity, I256::from(1800));
        assert_eq!(pool.activity_count, 3);
    }

    #[tokio::test]
    async fn test_activity_count_tracks_all_kinds() {
        let (aggregator, store) = setup().await;

        aggregator.apply_mint(&mint(1000, 0x10, 0));
        aggregator.apply_burn(&burn(400, 0x10, 1));
        aggregator.apply_swap(&swap(100, -40, 0x10, 2));

        let pool = pool_record(&store);
        assert_eq!(pool.mint_count, 1);
        assert_eq!(pool.burn_count, 1);
        assert_eq!(pool.swap_count, 1);
        assert_eq!(
            pool.activity_count,
            pool.mint_count + pool.burn_count + pool.swap_count
        );
        assert_eq!(
            pool.total_liquidity,
            net_liquidity(pool.total_liquidity_in, pool.total_liquidity_out)
        );
    }

    #[tokio::test]
    async fn test_swap_moves_net_amount_through_both_sides() {
        let (aggregator, store) = setup().await;

        aggregator.apply_swap(&swap(1000, -400, 0x10, 0));

        let pool = pool_record(&store);
        // net moved = |1000 + (-400)| = 600 on both accumulators
        assert_eq!(pool.total_liquidity_in, U256::from(600u64));
        assert_eq!(pool.total_liquidity_out, U256::from(600u64));
        assert_eq!(pool.total_liquidity, I256::zero());
        assert_eq!(pool.swap_count, 1);

        let record = store
            .load_swap(&activity_id(H256::from_low_u64_be(0x10), U256::zero()))
            .unwrap();
        assert_eq!(record.amount0_in, U256::from(1000u64));
        assert_eq!(record.amount0_out, U256::zero());
        assert_eq!(record.amount1_in, U256::zero());
        assert_eq!(record.amount1_out, U256::from(400u64));
    }

    #[tokio::test]
    async fn test_zero_net_swap_counts_but_contributes_nothing() {
        let (aggregator, store) = setup().await;

        aggregator.apply_swap(&swap(500, -500, 0x10, 0));

        let pool = pool_record(&store);
        assert_eq!(pool.swap_count, 1);
        assert_eq!(pool.activity_count, 1);
        assert_eq!(pool.total_liquidity_in, U256::zero());
        assert_eq!(pool.total_liquidity_out, U256::zero());
    }

    #[tokio::test]
    async fn test_unregistered_pool_event_is_dropped() {
        let (aggregator, store) = setup().await;

        let mut event = mint(1000, 0x10, 0);
        event.pool = Address::from_low_u64_be(0xffff);
        aggregator.apply_mint(&event);

        // No activity record and no pool mutation.
        assert!(store
            .load_mint(&activity_id(H256::from_low_u64_be(0x10), U256::zero()))
            .is_none());
        let pool = pool_record(&store);
        assert_eq!(pool.mint_count, 0);
        assert_eq!(pool.activity_count, 0);
    }

    #[tokio::test]
    async fn test_same_tx_different_log_index_yields_distinct_records() {
        let (aggregator, store) = setup().await;

        aggregator.apply_mint(&mint(1000, 0x10, 0));
        aggregator.apply_mint(&mint(500, 0x10, 1));

        let first = store.load_mint(&activity_id(H256::from_low_u64_be(0x10), U256::zero()));
        let second = store.load_mint(&activity_id(H256::from_low_u64_be(0x10), U256::one()));
        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(first.unwrap().amount, U256::from(1000u64));
        assert_eq!(second.unwrap().amount, U256::from(500u64));
    }

    #[tokio::test]
    async fn test_burn_beyond_mints_goes_negative() {
        let (aggregator, store) = setup().await;

        aggregator.apply_mint(&mint(100, 0x10, 0));
        aggregator.apply_burn(&burn(400, 0x10, 1));

        let pool = pool_record(&store);
        assert_eq!(pool.total_liquidity, I256::from(-300));
    }

    #[tokio::test]
    async fn test_sender_attribution_stays_literal() {
        let (aggregator, store) = setup().await;

        // Ordinary account sender never matches a token address.
        aggregator.apply_mint(&mint(1000, 0x10, 0));
        let pool = pool_record(&store);
        assert_eq!(pool.token0_mint_count, 0);
        assert_eq!(pool.token1_mint_count, 0);

        // The comparison itself is against token addresses, so a sender that
        // happens to equal token0 does count.
        let mut event = mint(500, 0x10, 1);
        event.sender = pool.token0;
        aggregator.apply_mint(&event);
        assert_eq!(pool_record(&store).token0_mint_count, 1);
    }

    #[tokio::test]
    async fn test_transfer_bumps_pool_and_token_counters() {
        let (aggregator, store) = setup().await;
        let token0 = Address::from_low_u64_be(0xa);

        aggregator.apply_transfer(&TransferEvent {
            pool: Address::from_low_u64_be(POOL),
            token: token0,
            tx_hash: H256::from_low_u64_be(0x10),
            log_index: U256::zero(),
        });

        let pool = pool_record(&store);
        assert_eq!(pool.token0_transfer_count, 1);
        assert_eq!(pool.token1_transfer_count, 0);
        assert_eq!(pool.activity_count, 1);

        let token = store.load_token(&address_id(token0)).unwrap();
        assert_eq!(token.transfer_count, 1);
    }
}
