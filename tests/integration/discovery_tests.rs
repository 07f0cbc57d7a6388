//! Discovery sweep and address cache against mock and simulated adapters.

use std::net::Ipv4Addr;

use shutterpad::adapters::netif::NetifAdapter;
use shutterpad::adapters::nvs::NvsAdapter;
use shutterpad::app::ports::ArpEntry;
use shutterpad::config;
use shutterpad::shutter::cache::AddressCache;
use shutterpad::shutter::discovery::{Discovery, SweepParams};
use shutterpad::shutter::{ActuatorAddress, ActuatorIdentity, ShutterId, ShutterPair};

use crate::mocks::{LOCAL, MockClock, MockNetwork, SHUTTER_1_IP};

fn stranger() -> ActuatorIdentity {
    ActuatorIdentity::new([0x02, 0, 0, 0, 0, 0x99])
}

#[test]
fn stops_at_first_checkpoint_after_reply() {
    let network = MockNetwork::new(Some(LOCAL)).with_host(SHUTTER_1_IP, config::SHUTTER_1);
    let clock = MockClock::default();
    let mut discovery = Discovery::new(network.clone(), clock.delay(), SweepParams::default());

    let found = discovery.resolve(config::SHUTTER_1);

    assert_eq!(found, ActuatorAddress::new(SHUTTER_1_IP));
    let probes = network.probes();
    assert_eq!(probes.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
    assert_eq!(probes.last(), Some(&Ipv4Addr::new(192, 168, 1, 30)));
    // One probe delay per probe.
    assert_eq!(clock.now.get(), 30 * 50);
}

#[test]
fn miss_sweeps_whole_range_and_returns_sentinel() {
    let network = MockNetwork::new(Some(LOCAL)).with_host(SHUTTER_1_IP, config::SHUTTER_1);
    let clock = MockClock::default();
    let mut discovery = Discovery::new(network.clone(), clock.delay(), SweepParams::default());

    assert_eq!(discovery.resolve(stranger()), ActuatorAddress::SENTINEL);
    assert_eq!(network.probe_count(), 253);
    assert_eq!(
        network.probes().last(),
        Some(&Ipv4Addr::new(192, 168, 1, 254))
    );
}

#[test]
fn reply_to_last_probe_is_still_seen() {
    let last = Ipv4Addr::new(192, 168, 1, 254);
    let network = MockNetwork::new(Some(LOCAL)).with_host(last, config::SHUTTER_2);
    let clock = MockClock::default();
    let mut discovery = Discovery::new(network, clock.delay(), SweepParams::default());

    assert_eq!(
        discovery.resolve(config::SHUTTER_2),
        ActuatorAddress::new(last)
    );
}

#[test]
fn entries_beyond_scan_window_are_not_seen() {
    let params = SweepParams {
        scan_entries: 1,
        ..SweepParams::default()
    };
    let other = Ipv4Addr::new(192, 168, 1, 5);
    let network = MockNetwork::new(Some(LOCAL))
        .with_host(other, stranger())
        .with_host(SHUTTER_1_IP, config::SHUTTER_1);
    let clock = MockClock::default();
    let mut discovery = Discovery::new(network, clock.delay(), params);

    // Slot 0 always holds the stranger, so the target is never matched.
    assert_eq!(
        discovery.resolve(config::SHUTTER_1),
        ActuatorAddress::SENTINEL
    );
}

#[test]
fn finds_host_through_simulated_netif() {
    let target = Ipv4Addr::new(10, 0, 0, 42);
    let netif = NetifAdapter::with_hosts(
        Ipv4Addr::new(10, 0, 0, 2),
        vec![ArpEntry {
            ip: target,
            mac: *config::SHUTTER_2.mac(),
        }],
    );
    let clock = MockClock::default();
    let mut discovery = Discovery::new(netif, clock.delay(), SweepParams::default());

    assert_eq!(
        discovery.resolve(config::SHUTTER_2),
        ActuatorAddress::new(target)
    );
}

#[test]
fn unconnected_netif_yields_sentinel() {
    let clock = MockClock::default();
    let mut discovery = Discovery::new(NetifAdapter::new(), clock.delay(), SweepParams::default());

    assert!(discovery.resolve(config::SHUTTER_1).is_sentinel());
    assert_eq!(clock.now.get(), 0);
}

#[test]
fn address_pair_survives_in_simulated_nvs() {
    let nvs = NvsAdapter::new().expect("sim NVS");
    let mut cache = AddressCache::new(nvs, config::NVS_NAMESPACE);
    assert_eq!(cache.load(ShutterId::First), None);

    let pair = ShutterPair::new(
        ActuatorAddress::new(Ipv4Addr::new(192, 168, 1, 23)),
        ActuatorAddress::SENTINEL,
    );
    cache.store_pair(&pair).expect("store");

    assert_eq!(cache.storage().commit_count(), 1);
    assert_eq!(cache.load(ShutterId::First), Some(pair.first));
    assert_eq!(
        cache.load(ShutterId::Second),
        Some(ActuatorAddress::SENTINEL)
    );
}
