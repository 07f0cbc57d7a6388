//! Shutter actuator domain: identities, addresses, and the subsystems that
//! find and drive the two actuators.
//!
//! ```text
//!   ActuatorIdentity ──Discovery──▶ ActuatorAddress ──AddressCache──▶ NVS
//!                                          │
//!                                          ▼
//!                 CommandPolicy ──▶ CommandChannel ──▶ HTTP (Cover.* RPC)
//!                                          │
//!                                          ▼
//!                                   StatusCodec ──▶ ActuatorStatus
//! ```

pub mod cache;
pub mod channel;
pub mod discovery;
pub mod policy;
pub mod status;

use core::fmt;
use core::net::Ipv4Addr;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Full 6-byte link-layer address.
pub type MacAddress = [u8; 6];

// ───────────────────────────────────────────────────────────────
// Identity
// ───────────────────────────────────────────────────────────────

/// Fixed hardware (MAC) address of one actuator.  Never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActuatorIdentity(MacAddress);

impl ActuatorIdentity {
    pub const fn new(mac: MacAddress) -> Self {
        Self(mac)
    }

    pub const fn mac(&self) -> &MacAddress {
        &self.0
    }

    /// Parse `aa:bb:cc:dd:ee:ff` (case-insensitive, `-` also accepted).
    /// Usable in `const` context for compile-time overrides.
    pub const fn parse(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() != 17 {
            return None;
        }
        let mut mac = [0u8; 6];
        let mut i = 0;
        while i < 6 {
            let at = i * 3;
            let (Some(hi), Some(lo)) = (hex_nibble(b[at]), hex_nibble(b[at + 1])) else {
                return None;
            };
            if i < 5 && b[at + 2] != b':' && b[at + 2] != b'-' {
                return None;
            }
            mac[i] = (hi << 4) | lo;
            i += 1;
        }
        Some(Self(mac))
    }
}

const fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for ActuatorIdentity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

impl fmt::Display for ActuatorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Address
// ───────────────────────────────────────────────────────────────

/// Resolved IPv4 address of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActuatorAddress(Ipv4Addr);

impl ActuatorAddress {
    /// Returned by discovery when the hardware address was not seen.
    pub const SENTINEL: Self = Self(Ipv4Addr::BROADCAST);

    pub const fn new(ip: Ipv4Addr) -> Self {
        Self(ip)
    }

    pub const fn ip(&self) -> Ipv4Addr {
        self.0
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// The address as lwIP keeps it in an `ip4_addr_t` on a little-endian
    /// core: network-order octets read as a native `u32`.  This is the
    /// layout of the persisted NVS records.
    pub fn to_raw(self) -> u32 {
        u32::from_le_bytes(self.0.octets())
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(Ipv4Addr::from(raw.to_le_bytes()))
    }
}

impl From<Ipv4Addr> for ActuatorAddress {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for ActuatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ───────────────────────────────────────────────────────────────
// The two shutters
// ───────────────────────────────────────────────────────────────

/// Which of the two actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutterId {
    First,
    Second,
}

impl ShutterId {
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// 1-based number used in logs and NVS keys.
    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl fmt::Display for ShutterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shutter{}", self.number())
    }
}

/// One value per shutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutterPair<T> {
    pub first: T,
    pub second: T,
}

impl<T> ShutterPair<T> {
    pub const fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    pub fn get(&self, id: ShutterId) -> &T {
        match id {
            ShutterId::First => &self.first,
            ShutterId::Second => &self.second,
        }
    }

    pub fn get_mut(&mut self, id: ShutterId) -> &mut T {
        match id {
            ShutterId::First => &mut self.first,
            ShutterId::Second => &mut self.second,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(ShutterId, T) -> U) -> ShutterPair<U> {
        ShutterPair {
            first: f(ShutterId::First, self.first),
            second: f(ShutterId::Second, self.second),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShutterId, &T)> {
        [
            (ShutterId::First, &self.first),
            (ShutterId::Second, &self.second),
        ]
        .into_iter()
    }
}
