//! # Subscription Manager
//!
//! Dynamic registration of pool contracts with the event delivery mechanism.
//! The registry is populated by the pool registry the moment a factory event
//! reports a new pool, and consulted by dispatch before routing activity
//! events. Registration is fire-and-forget: there is no acknowledgement, and
//! a pool that never gets registered is a permanent delivery gap, not a retry
//! candidate.

use dashmap::DashMap;
use ethers::types::Address;
use log::debug;

/// Capability to register a contract for event delivery.
pub trait Trackable: Send + Sync {
    /// Starts delivering the contract's future events. No return value: the
    /// core cannot observe a failure here.
    fn track(&self, address: Address);

    /// Whether events from this address are deliverable.
    fn is_tracked(&self, address: Address) -> bool;
}

/// In-process registry of tracked pool addresses.
#[derive(Default)]
pub struct TrackedPools {
    pools: DashMap<Address, ()>,
}

impl TrackedPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Trackable for TrackedPools {
    fn track(&self, address: Address) {
        if self.pools.insert(address, ()).is_none() {
            debug!("Tracking: now observing pool {:?}", address);
        }
    }

    fn is_tracked(&self, address: Address) -> bool {
        self.pools.contains_key(&address)
    }
}
