//! # Engine
//!
//! Single entry point wiring the components together. Events are applied one
//! at a time in delivery order (block, then transaction index, then log
//! index); every transition runs to completion before the next event is
//! considered, so the store sees strictly sequential read-modify-write.

use std::sync::Arc;

use ethers::types::{Address, Log, U256};
use log::{debug, warn};

use crate::aggregator::ActivityAggregator;
use crate::events::{decode_log, Event};
use crate::handlers::{FactoryHandler, PoolHandler};
use crate::metadata::MetadataProvider;
use crate::pool_registry::PoolRegistry;
use crate::settings::Settings;
use crate::store::RecordStore;
use crate::token_resolver::TokenResolver;
use crate::tracking::{Trackable, TrackedPools};

pub struct Engine {
    factory_handler: FactoryHandler,
    pool_handler: PoolHandler,
    tracker: Arc<TrackedPools>,
    factory: Address,
}

impl Engine {
    /// Wires registry, resolver, aggregator, and tracker over the given store
    /// and metadata provider. Only `PoolCreated` logs emitted by `factory`
    /// are honored.
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn MetadataProvider>,
        factory: Address,
    ) -> Self {
        let resolver = Arc::new(TokenResolver::new(store.clone(), provider));
        let tracker = Arc::new(TrackedPools::new());
        let registry = PoolRegistry::new(store.clone(), resolver.clone());
        let aggregator = ActivityAggregator::new(store, resolver);
        Self {
            factory_handler: FactoryHandler::new(registry, tracker.clone()),
            pool_handler: PoolHandler::new(aggregator),
            tracker,
            factory,
        }
    }

    /// Builds an engine watching the configured factory address.
    pub fn from_settings(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn MetadataProvider>,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(store, provider, settings.factory_address()?))
    }

    /// Applies one typed event.
    ///
    /// Activity events from untracked addresses are skipped before they reach
    /// the aggregator, mirroring a delivery mechanism that only forwards
    /// events from registered contracts.
    pub async fn process(&self, event: Event) {
        match event {
            Event::PoolCreated(event) => {
                self.factory_handler.on_pool_created(&event).await;
            }
            Event::Mint(event) => {
                if self.tracker.is_tracked(event.pool) {
                    self.pool_handler.on_mint(&event);
                } else {
                    debug!("Engine: mint from untracked address {:?}", event.pool);
                }
            }
            Event::Burn(event) => {
                if self.tracker.is_tracked(event.pool) {
                    self.pool_handler.on_burn(&event);
                } else {
                    debug!("Engine: burn from untracked address {:?}", event.pool);
                }
            }
            Event::Swap(event) => {
                if self.tracker.is_tracked(event.pool) {
                    self.pool_handler.on_swap(&event);
                } else {
                    debug!("Engine: swap from untracked address {:?}", event.pool);
                }
            }
            Event::Transfer(event) => {
                if self.tracker.is_tracked(event.pool) {
                    self.pool_handler.on_transfer(&event);
                } else {
                    debug!("Engine: transfer from untracked address {:?}", event.pool);
                }
            }
        }
    }

    /// Decodes and applies one raw log, routing by the emitting address:
    /// `PoolCreated` is honored only when emitted by the watched factory.
    /// Undecodable logs are skipped with a warning; they never abort the
    /// stream.
    pub async fn process_log(&self, log: &Log, block_timestamp: U256) {
        match decode_log(log, block_timestamp) {
            Ok(Event::PoolCreated(event)) => {
                if log.address != self.factory {
                    debug!(
                        "Engine: PoolCreated from non-factory address {:?}",
                        log.address
                    );
                    return;
                }
                self.factory_handler.on_pool_created(&event).await;
            }
            Ok(event) => self.process(event).await,
            Err(err) => {
                warn!("Engine: skipping undecodable log from {:?}: {}", log.address, err);
            }
        }
    }

    pub fn tracker(&self) -> &TrackedPools {
        &self.tracker
    }
}
