//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ShutterController (domain)
//! ```
//!
//! Driven adapters (network stack, HTTP client, NVS, power management,
//! buttons, clock, event sinks) implement these traits.  The
//! [`ShutterController`](super::service::ShutterController) consumes them via
//! generics, so the domain core never touches ESP-IDF directly.
//!
//! Blocking delays are not a port of their own: the core takes any
//! [`embedded_hal::delay::DelayNs`].

use core::net::Ipv4Addr;

use crate::error::{NetworkError, StorageError, TransportError};
use crate::shutter::MacAddress;

use super::commands::ButtonSet;

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: lwIP netif / ARP)
// ───────────────────────────────────────────────────────────────

/// One slot of the link-layer resolution (ARP) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
}

/// Address-resolution primitives of the local network stack.
pub trait NetworkPort {
    /// IPv4 address of the station interface.
    fn local_address(&self) -> Result<Ipv4Addr, NetworkError>;

    /// Transmit an ARP request for `target`.  Replies populate the table
    /// asynchronously.
    fn probe(&mut self, target: Ipv4Addr) -> Result<(), NetworkError>;

    /// Read table slot `index`; `None` if the slot is empty.
    fn table_entry(&self, index: usize) -> Option<ArpEntry>;
}

// ───────────────────────────────────────────────────────────────
// HTTP transport port (driven adapter: esp_http_client)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single request to an actuator.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes copied into the caller's buffer.
    pub body_len: usize,
}

/// Request/response transport.  One connection per call; no retries.
pub trait HttpTransport {
    /// Perform `request` and copy at most `body.len()` bytes of the response
    /// body into `body`.  A longer body is truncated, not an error.
    fn perform(
        &mut self,
        request: &HttpRequest<'_>,
        body: &mut [u8],
    ) -> Result<HttpResponse, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - `StorageError::NotFound` is the only "never written" signal; a stored
///   zero is a real value.
/// - [`write_u32_all`](Self::write_u32_all) MUST commit every entry in a
///   single transaction so a power loss never leaves half of the batch.
pub trait StoragePort {
    /// Read a `u32` record.
    fn read_u32(&self, namespace: &str, key: &str) -> Result<u32, StorageError>;

    /// Set every entry, then commit once.
    fn write_u32_all(&mut self, namespace: &str, entries: &[(&str, u32)])
    -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Power port (driven adapter: deep sleep)
// ───────────────────────────────────────────────────────────────

/// Low-power entry.  On hardware this never returns: a button edge resets
/// the chip and the firmware boots again.  Simulation backends return, and
/// the caller resumes as if woken.
pub trait PowerPort {
    fn enter_low_power(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Input + time
// ───────────────────────────────────────────────────────────────

/// Source of button activity: level polling or an ISR-fed latch.
pub trait ButtonSource {
    /// Buttons active since the previous poll (or currently held).
    fn poll(&mut self) -> ButtonSet;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
