//! lwIP network-interface adapter.
//!
//! Implements [`NetworkPort`] on top of the station netif: the local IPv4
//! address comes from `esp_netif_get_ip_info`, probes are raw
//! `etharp_request` calls, and table slots are read with
//! `etharp_get_entry`.  lwIP keeps addresses as network-order octets in a
//! native `u32`, hence the little-endian conversions.
//!
//! The simulation backend models a LAN: hosts registered with
//! [`NetifAdapter::with_hosts`] answer probes by filling a bounded table.

use core::net::Ipv4Addr;

use crate::app::ports::{ArpEntry, NetworkPort};
use crate::error::NetworkError;

#[cfg(target_os = "espidf")]
use core::ffi::c_void;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_netif_get_handle_from_ifkey, esp_netif_get_ip_info, esp_netif_ip_info_t,
    esp_netif_t,
};

#[cfg(target_os = "espidf")]
#[repr(C)]
struct Ip4Addr {
    addr: u32,
}

#[cfg(target_os = "espidf")]
#[repr(C)]
struct EthAddr {
    addr: [u8; 6],
}

#[cfg(target_os = "espidf")]
unsafe extern "C" {
    fn esp_netif_get_netif_impl(esp_netif: *mut esp_netif_t) -> *mut c_void;
    fn etharp_request(netif: *mut c_void, ipaddr: *const Ip4Addr) -> i8;
    fn etharp_get_entry(
        i: usize,
        ipaddr: *mut *mut Ip4Addr,
        netif: *mut *mut c_void,
        eth_ret: *mut *mut EthAddr,
    ) -> i32;
}

#[cfg(target_os = "espidf")]
const STA_IFKEY: &core::ffi::CStr = c"WIFI_STA_DEF";

/// lwIP `ERR_MEM`.
#[cfg(not(target_os = "espidf"))]
const ERR_MEM: i8 = -1;

/// Capacity of the simulated resolution table.
#[cfg(not(target_os = "espidf"))]
const SIM_TABLE_SIZE: usize = 10;

pub struct NetifAdapter {
    #[cfg(not(target_os = "espidf"))]
    local: Option<Ipv4Addr>,
    #[cfg(not(target_os = "espidf"))]
    hosts: Vec<ArpEntry>,
    #[cfg(not(target_os = "espidf"))]
    table: std::cell::RefCell<heapless::Deque<ArpEntry, SIM_TABLE_SIZE>>,
}

impl NetifAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            local: None,
            #[cfg(not(target_os = "espidf"))]
            hosts: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            table: std::cell::RefCell::new(heapless::Deque::new()),
        }
    }

    /// Simulated LAN where `local` is our address and `hosts` answer ARP.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_hosts(local: Ipv4Addr, hosts: Vec<ArpEntry>) -> Self {
        Self {
            local: Some(local),
            hosts,
            table: std::cell::RefCell::new(heapless::Deque::new()),
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn sta_netif() -> Result<*mut esp_netif_t, NetworkError> {
        // SAFETY: looks up a handle by a NUL-terminated key; no ownership.
        let netif = unsafe { esp_netif_get_handle_from_ifkey(STA_IFKEY.as_ptr()) };
        if netif.is_null() {
            Err(NetworkError::NotConnected)
        } else {
            Ok(netif)
        }
    }
}

impl Default for NetifAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl NetworkPort for NetifAdapter {
    fn local_address(&self) -> Result<Ipv4Addr, NetworkError> {
        let netif = Self::sta_netif()?;
        let mut info = esp_netif_ip_info_t::default();
        // SAFETY: `netif` is a live handle and `info` is a valid out-pointer.
        let ret = unsafe { esp_netif_get_ip_info(netif, &mut info) };
        if ret != ESP_OK as i32 || info.ip.addr == 0 {
            return Err(NetworkError::NotConnected);
        }
        Ok(Ipv4Addr::from(info.ip.addr.to_le_bytes()))
    }

    fn probe(&mut self, target: Ipv4Addr) -> Result<(), NetworkError> {
        let netif = Self::sta_netif()?;
        // SAFETY: the lwIP netif backing a live esp_netif handle.
        let lwip = unsafe { esp_netif_get_netif_impl(netif) };
        if lwip.is_null() {
            return Err(NetworkError::NotConnected);
        }
        let ip = Ip4Addr {
            addr: u32::from_le_bytes(target.octets()),
        };
        // SAFETY: `ip` outlives the call; lwIP copies it into the request.
        let err = unsafe { etharp_request(lwip, &ip) };
        if err == 0 {
            Ok(())
        } else {
            Err(NetworkError::ProbeFailed(err))
        }
    }

    fn table_entry(&self, index: usize) -> Option<ArpEntry> {
        let mut ip: *mut Ip4Addr = core::ptr::null_mut();
        let mut netif: *mut c_void = core::ptr::null_mut();
        let mut mac: *mut EthAddr = core::ptr::null_mut();
        // SAFETY: out-pointers are valid; on success lwIP points them at
        // entries of its static ARP table.
        let found = unsafe { etharp_get_entry(index, &mut ip, &mut netif, &mut mac) };
        if found == 0 || ip.is_null() || mac.is_null() {
            return None;
        }
        // SAFETY: non-null pointers into the ARP table, read immediately.
        let (raw_ip, mac) = unsafe { ((*ip).addr, (*mac).addr) };
        Some(ArpEntry {
            ip: Ipv4Addr::from(raw_ip.to_le_bytes()),
            mac,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl NetworkPort for NetifAdapter {
    fn local_address(&self) -> Result<Ipv4Addr, NetworkError> {
        self.local.ok_or(NetworkError::NotConnected)
    }

    fn probe(&mut self, target: Ipv4Addr) -> Result<(), NetworkError> {
        if self.local.is_none() {
            return Err(NetworkError::NotConnected);
        }
        let mut table = self.table.borrow_mut();
        if table.iter().any(|e| e.ip == target) {
            return Ok(());
        }
        if let Some(host) = self.hosts.iter().find(|h| h.ip == target) {
            // Oldest entry is recycled, like lwIP does when the table is full.
            if table.is_full() {
                table.pop_front();
            }
            table
                .push_back(*host)
                .map_err(|_| NetworkError::ProbeFailed(ERR_MEM))?;
        }
        Ok(())
    }

    fn table_entry(&self, index: usize) -> Option<ArpEntry> {
        self.table.borrow().iter().nth(index).copied()
    }
}
