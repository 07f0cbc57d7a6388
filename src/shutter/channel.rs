//! JSON-RPC command channel to one actuator.
//!
//! Requests target `http://<ip>/rpc/Cover.<Operation>`:
//!
//! | Call            | Method | Body                   |
//! |-----------------|--------|------------------------|
//! | Open/Close/Stop | POST   | `{"id":0}`             |
//! | GoToPosition    | POST   | `{"id":0,"pos":<n>}`   |
//! | GetStatus       | GET    | — (`?id=0` in the URL) |
//!
//! Every exchange, successful or not, is followed by a fixed settle delay so
//! consecutive commands never overlap on the transport.  There are no
//! retries; repeated button presses rely on the actuator being idempotent.

use core::fmt::{self, Write as _};

use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::TransportError;

use super::ActuatorAddress;
use super::status::{self, ActuatorStatus};

/// Capacity of the status response buffer.  Longer bodies are truncated and
/// then usually fail to parse (→ `Unknown`).
pub const STATUS_BODY_CAP: usize = 512;

/// Capacity of the request URL buffer.
pub const URL_CAP: usize = 64;

pub type Url = heapless::String<URL_CAP>;
pub type StatusBody = heapless::Vec<u8, STATUS_BODY_CAP>;

const CONTENT_TYPE_JSON: &str = "application/json";

// ───────────────────────────────────────────────────────────────
// Operations
// ───────────────────────────────────────────────────────────────

/// RPC methods of the `Cover` resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOperation {
    Open,
    Close,
    Stop,
    GoToPosition,
    GetStatus,
}

impl CoverOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Close => "Close",
            Self::Stop => "Stop",
            Self::GoToPosition => "GoToPosition",
            Self::GetStatus => "GetStatus",
        }
    }
}

/// Fire-and-forget commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterCommand {
    Open,
    Close,
    Stop,
    /// Target position in percent open.
    GoToPosition(u8),
}

impl ShutterCommand {
    pub const fn operation(self) -> CoverOperation {
        match self {
            Self::Open => CoverOperation::Open,
            Self::Close => CoverOperation::Close,
            Self::Stop => CoverOperation::Stop,
            Self::GoToPosition(_) => CoverOperation::GoToPosition,
        }
    }

    const fn position(self) -> Option<u8> {
        match self {
            Self::GoToPosition(pos) => Some(pos),
            _ => None,
        }
    }
}

impl fmt::Display for ShutterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoToPosition(pos) => write!(f, "GoToPosition({pos})"),
            other => f.write_str(other.operation().as_str()),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest {
    id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pos: Option<u8>,
}

// ───────────────────────────────────────────────────────────────
// Request building
// ───────────────────────────────────────────────────────────────

/// `http://<ip>/rpc/Cover.<op>`, plus `?id=0` for status reads.
pub fn rpc_url(address: ActuatorAddress, op: CoverOperation) -> Result<Url, TransportError> {
    let mut url = Url::new();
    write!(url, "http://{}/rpc/Cover.{}", address, op.as_str())
        .map_err(|_| TransportError::UrlTooLong)?;
    if op == CoverOperation::GetStatus {
        url.push_str("?id=0")
            .map_err(|()| TransportError::UrlTooLong)?;
    }
    Ok(url)
}

/// JSON body for a command.
pub fn rpc_body(command: ShutterCommand) -> Vec<u8> {
    let request = RpcRequest {
        id: 0,
        pos: command.position(),
    };
    // Serialising two integers cannot fail.
    serde_json::to_vec(&request).unwrap_or_default()
}

// ───────────────────────────────────────────────────────────────
// Channel
// ───────────────────────────────────────────────────────────────

/// Sends RPC requests over `T` and waits `settle_ms` after each one.
pub struct CommandChannel<T, D> {
    transport: T,
    delay: D,
    settle_ms: u32,
}

impl<T: HttpTransport, D: DelayNs> CommandChannel<T, D> {
    pub fn new(transport: T, delay: D, settle_ms: u32) -> Self {
        Self {
            transport,
            delay,
            settle_ms,
        }
    }

    /// POST a command.  Transport failures are logged and returned; the
    /// caller treats them as a no-op.
    pub fn send(
        &mut self,
        address: ActuatorAddress,
        command: ShutterCommand,
    ) -> Result<(), TransportError> {
        let result = self.post(address, command);
        self.settle();
        match result {
            Ok(()) => {
                debug!("Channel: {} -> {} ok", command, address);
                Ok(())
            }
            Err(e) => {
                warn!("Channel: {} -> {} failed: {}", command, address, e);
                Err(e)
            }
        }
    }

    /// GET the raw status body (truncated at [`STATUS_BODY_CAP`]).
    pub fn query(&mut self, address: ActuatorAddress) -> Result<StatusBody, TransportError> {
        let result = self.get_status(address);
        self.settle();
        if let Err(e) = &result {
            warn!("Channel: GetStatus -> {} failed: {}", address, e);
        }
        result
    }

    /// Query and decode.  Any failure yields `Unknown`.
    pub fn status(&mut self, address: ActuatorAddress) -> ActuatorStatus {
        match self.query(address) {
            Ok(body) => status::decode(&body),
            Err(_) => ActuatorStatus::Unknown,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn post(
        &mut self,
        address: ActuatorAddress,
        command: ShutterCommand,
    ) -> Result<(), TransportError> {
        let url = rpc_url(address, command.operation())?;
        let body = rpc_body(command);
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: &url,
            content_type: Some(CONTENT_TYPE_JSON),
            body: &body,
        };
        let response = self.transport.perform(&request, &mut [])?;
        check_status(response.status)
    }

    fn get_status(&mut self, address: ActuatorAddress) -> Result<StatusBody, TransportError> {
        let url = rpc_url(address, CoverOperation::GetStatus)?;
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: &url,
            content_type: None,
            body: &[],
        };
        let mut buf = [0u8; STATUS_BODY_CAP];
        let response = self.transport.perform(&request, &mut buf)?;
        check_status(response.status)?;
        let len = response.body_len.min(STATUS_BODY_CAP);
        if len == STATUS_BODY_CAP {
            debug!(
                "Channel: status body from {} filled the buffer, may be truncated",
                address
            );
        }
        // Capacity equals the buffer length, so this cannot overflow.
        Ok(StatusBody::from_slice(&buf[..len]).unwrap_or_default())
    }

    fn settle(&mut self) {
        if self.settle_ms > 0 {
            self.delay.delay_ms(self.settle_ms);
        }
    }
}

fn check_status(status: u16) -> Result<(), TransportError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(TransportError::Status(status))
    }
}
