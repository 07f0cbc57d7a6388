//! Cover status decoding.
//!
//! The actuator answers `Cover.GetStatus` with a JSON object carrying many
//! fields; only the string field `state` matters here.  Decoding is total:
//! anything that is not an object with a recognised `state` literal maps to
//! [`ActuatorStatus::Unknown`].

use log::debug;
use serde_json::Value;

use crate::error::DecodeError;

/// Snapshot of one actuator's motion state.  Never persisted and never
/// inferred from an earlier snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorStatus {
    Unknown,
    Closed,
    Closing,
    Open,
    Opening,
    Stopped,
}

impl ActuatorStatus {
    /// Map a wire literal (case-sensitive) to a status.
    pub fn from_literal(literal: &str) -> Option<Self> {
        match literal {
            "closed" => Some(Self::Closed),
            "closing" => Some(Self::Closing),
            "open" => Some(Self::Open),
            "opening" => Some(Self::Opening),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }
}

/// Decode a status body, reporting why it was rejected.
pub fn try_decode(bytes: &[u8]) -> Result<ActuatorStatus, DecodeError> {
    let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(bytes) else {
        return Err(DecodeError::Json);
    };
    let literal = body
        .get("state")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingState)?;
    ActuatorStatus::from_literal(literal).ok_or(DecodeError::UnknownState)
}

/// Decode a status body; every failure collapses to `Unknown`.
pub fn decode(bytes: &[u8]) -> ActuatorStatus {
    match try_decode(bytes) {
        Ok(status) => status,
        Err(e) => {
            debug!("StatusCodec: {} -> Unknown", e);
            ActuatorStatus::Unknown
        }
    }
}
