//! # DEX Aggregation Engine
//!
//! Incremental aggregation and dynamic-subscription engine for a
//! chronologically ordered stream of DEX factory and pool events. The engine
//! maintains a consistent set of derived aggregate records (pools, tokens,
//! per-transaction factory stats) and append-only activity logs that
//! downstream consumers can query.
//!
//! ## Overview
//!
//! Each event is folded exactly once into running counters, sums, and derived
//! averages, with no reprocessing of history:
//!
//! - **Pool Registry**: creates the Pool aggregate the first time a factory
//!   event announces a pool, seeding every counter to zero
//! - **Subscription Manager**: registers newly created pools so their future
//!   activity events become deliverable
//! - **Activity Aggregator**: appends one immutable record per Mint/Burn/Swap
//!   event and updates the owning pool's liquidity and count statistics
//! - **Token Resolver**: lazily materializes token metadata on first
//!   reference, tolerating reverted reads
//!
//! Events are applied strictly one at a time in block / transaction / log
//! order; correctness of each transition is paramount since partial aggregate
//! state cannot be repaired without replaying the whole chain history.

// Core Types
/// Aggregate and activity-log record definitions
pub mod records;
/// Inbound event types and raw-log decoding
pub mod events;

// Storage
/// Keyed record store adapter and in-memory implementation
pub mod store;

// Resolution & Registration
/// Token metadata provider abstraction
pub mod metadata;
/// Lazy, idempotent token materialization
pub mod token_resolver;
/// Pool and factory aggregate creation
pub mod pool_registry;
/// Dynamic pool subscription registry
pub mod tracking;

// Aggregation
/// The per-event reducer
pub mod aggregator;
/// Per-contract event handlers
pub mod handlers;
/// Component wiring and dispatch
pub mod engine;

// Infrastructure
/// Smart contract ABIs (read-only)
pub mod contracts;
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use aggregator::ActivityAggregator;
pub use engine::Engine;
pub use events::Event;
pub use metadata::{Fetched, MetadataProvider};
pub use pool_registry::PoolRegistry;
pub use records::{FactoryRecord, PoolRecord, TokenRecord};
pub use settings::Settings;
pub use store::{MemoryStore, RecordStore};
pub use token_resolver::TokenResolver;
pub use tracking::{Trackable, TrackedPools};
