//! Hardware-address → network-address resolution by ARP sweep.
//!
//! The actuators announce no names, so the controller walks the local /24:
//! one ARP request per host number, a short pause for the reply to land in
//! the resolution table, and a scan of the table's first slots every
//! `checkpoint_interval` candidates (and after the last one).  The first slot
//! whose MAC matches wins and the sweep stops.  A full sweep without a match
//! yields [`ActuatorAddress::SENTINEL`].

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::NetworkPort;

use super::{ActuatorAddress, ActuatorIdentity};

/// Sweep parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepParams {
    pub first_host: u8,
    pub last_host: u8,
    pub probe_delay_ms: u32,
    pub checkpoint_interval: u8,
    pub scan_entries: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            first_host: 1,
            last_host: 254,
            probe_delay_ms: 50,
            checkpoint_interval: 10,
            scan_entries: 10,
        }
    }
}

impl SweepParams {
    /// Whether the table is inspected after probing `host`.
    pub fn is_checkpoint(&self, host: u8) -> bool {
        host % self.checkpoint_interval.max(1) == 0 || host == self.last_host
    }
}

/// `a.b.c.host` within the /24 of `local`.
pub fn candidate(local: Ipv4Addr, host: u8) -> Ipv4Addr {
    let [a, b, c, _] = local.octets();
    Ipv4Addr::new(a, b, c, host)
}

/// ARP-sweep resolver.
pub struct Discovery<N, D> {
    network: N,
    delay: D,
    params: SweepParams,
}

impl<N: NetworkPort, D: DelayNs> Discovery<N, D> {
    pub fn new(network: N, delay: D, params: SweepParams) -> Self {
        Self {
            network,
            delay,
            params,
        }
    }

    /// Resolve `identity`; the sentinel when it is not seen.
    pub fn resolve(&mut self, identity: ActuatorIdentity) -> ActuatorAddress {
        let local = match self.network.local_address() {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    "Discovery: no local address ({}), {} unresolved",
                    e, identity
                );
                return ActuatorAddress::SENTINEL;
            }
        };
        info!(
            "Discovery: sweeping {}..={} for {}",
            candidate(local, self.params.first_host),
            candidate(local, self.params.last_host),
            identity
        );

        for host in self.params.first_host..=self.params.last_host {
            let target = candidate(local, host);
            if target != local {
                if let Err(e) = self.network.probe(target) {
                    debug!("Discovery: probe {} failed: {}", target, e);
                }
                self.delay.delay_ms(self.params.probe_delay_ms);
            }

            if self.params.is_checkpoint(host) {
                if let Some(ip) = self.scan_table(identity) {
                    info!("Discovery: {} is at {}", identity, ip);
                    return ActuatorAddress::new(ip);
                }
            }
        }

        warn!(
            "Discovery: {} not found, using {}",
            identity, ActuatorAddress::SENTINEL
        );
        ActuatorAddress::SENTINEL
    }

    fn scan_table(&self, identity: ActuatorIdentity) -> Option<Ipv4Addr> {
        (0..self.params.scan_entries)
            .filter_map(|slot| self.network.table_entry(slot))
            .find(|entry| entry.mac == *identity.mac())
            .map(|entry| entry.ip)
    }
}
