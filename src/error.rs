//! Error taxonomy for the shutter controller firmware.
//!
//! Every variant is `Copy` so it can be logged and carried through
//! [`AppEvent`](crate::app::events::AppEvent)s without allocation.  None of
//! these ever abort the control loop: the controller degrades to "the
//! shutters did not move" and keeps polling buttons.

use core::fmt;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failure of a single request/response exchange with an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be created or opened (ESP-IDF error code).
    Connect(i32),
    /// The transport's own deadline fired.
    Timeout,
    /// Request or response failed mid-exchange (ESP-IDF error code).
    Protocol(i32),
    /// The actuator answered with a non-2xx HTTP status.
    Status(u16),
    /// The request URL does not fit the fixed-size buffer.
    UrlTooLong,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(rc) => write!(f, "connect failed (rc={rc})"),
            Self::Timeout => write!(f, "timed out"),
            Self::Protocol(rc) => write!(f, "protocol error (rc={rc})"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::UrlTooLong => write!(f, "URL too long"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Why a status payload collapsed to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Body is not a JSON object.
    Json,
    /// No string field named `state`.
    MissingState,
    /// `state` holds a literal outside the known set.
    UnknownState,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "malformed JSON"),
            Self::MissingState => write!(f, "missing string field `state`"),
            Self::UnknownState => write!(f, "unrecognised state literal"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The station interface has no address (not associated / no DHCP lease).
    NotConnected,
    /// lwIP rejected the ARP request (lwIP `err_t`).
    ProbeFailed(i8),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "station interface not connected"),
            Self::ProbeFailed(err) => write!(f, "ARP request failed (err={err})"),
        }
    }
}

impl std::error::Error for NetworkError {}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
