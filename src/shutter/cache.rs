//! Durable copy of the two resolved actuator addresses.
//!
//! Each address is one `u32` record (`ip1`, `ip2`) in a fixed NVS
//! namespace, laid out as lwIP keeps an `ip4_addr_t`.  Absence of a key is
//! the "never resolved" signal; a stored zero is a real value.  The pair is
//! always written with a single commit.

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::error::StorageError;

use super::{ActuatorAddress, ShutterId, ShutterPair};

/// NVS key of one shutter's address record.
pub const fn key(id: ShutterId) -> &'static str {
    match id {
        ShutterId::First => "ip1",
        ShutterId::Second => "ip2",
    }
}

pub struct AddressCache<S> {
    storage: S,
    namespace: &'static str,
}

impl<S: StoragePort> AddressCache<S> {
    pub fn new(storage: S, namespace: &'static str) -> Self {
        Self { storage, namespace }
    }

    /// Cached address, or `None` if it was never stored.  Read failures
    /// other than a missing key are logged and also treated as a miss.
    pub fn load(&self, id: ShutterId) -> Option<ActuatorAddress> {
        match self.storage.read_u32(self.namespace, key(id)) {
            Ok(raw) => Some(ActuatorAddress::from_raw(raw)),
            Err(StorageError::NotFound) => {
                info!("Cache: no address stored for {}", id);
                None
            }
            Err(e) => {
                warn!("Cache: reading {} failed: {}", id, e);
                None
            }
        }
    }

    /// Persist one address.
    pub fn store(&mut self, id: ShutterId, address: ActuatorAddress) -> Result<(), StorageError> {
        self.storage
            .write_u32_all(self.namespace, &[(key(id), address.to_raw())])
            .inspect_err(|e| warn!("Cache: storing {} failed: {}", id, e))
    }

    /// Persist both addresses in one commit.
    pub fn store_pair(&mut self, pair: &ShutterPair<ActuatorAddress>) -> Result<(), StorageError> {
        let entries = [
            (key(ShutterId::First), pair.first.to_raw()),
            (key(ShutterId::Second), pair.second.to_raw()),
        ];
        match self.storage.write_u32_all(self.namespace, &entries) {
            Ok(()) => {
                info!("Cache: stored {} / {}", pair.first, pair.second);
                Ok(())
            }
            Err(e) => {
                warn!("Cache: storing address pair failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
