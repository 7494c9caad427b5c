//! Thin per-contract event handlers.
//!
//! Dispatch glue only: no aggregate state is read or mutated here, everything
//! goes through the registry, tracker, and aggregator contracts.

use std::sync::Arc;

use crate::aggregator::ActivityAggregator;
use crate::events::{BurnEvent, MintEvent, PoolCreatedEvent, SwapEvent, TransferEvent};
use crate::pool_registry::PoolRegistry;
use crate::records::PoolRecord;
use crate::tracking::Trackable;

/// Routes factory events: registers the new pool, then starts tracking it so
/// its future activity events are deliverable.
pub struct FactoryHandler {
    registry: PoolRegistry,
    tracker: Arc<dyn Trackable>,
}

impl FactoryHandler {
    pub fn new(registry: PoolRegistry, tracker: Arc<dyn Trackable>) -> Self {
        Self { registry, tracker }
    }

    pub async fn on_pool_created(&self, event: &PoolCreatedEvent) -> PoolRecord {
        let pool = self.registry.register_pool(event).await;
        // Tracking comes second: a pool must exist before any of its events
        // can be folded.
        self.tracker.track(event.pool);
        pool
    }
}

/// Routes activity events from tracked pool contracts to the aggregator.
pub struct PoolHandler {
    aggregator: ActivityAggregator,
}

impl PoolHandler {
    pub fn new(aggregator: ActivityAggregator) -> Self {
        Self { aggregator }
    }

    pub fn on_mint(&self, event: &MintEvent) {
        self.aggregator.apply_mint(event);
    }

    pub fn on_burn(&self, event: &BurnEvent) {
        self.aggregator.apply_burn(event);
    }

    pub fn on_swap(&self, event: &SwapEvent) {
        self.aggregator.apply_swap(event);
    }

    pub fn on_transfer(&self, event: &TransferEvent) {
        self.aggregator.apply_transfer(event);
    }
}
