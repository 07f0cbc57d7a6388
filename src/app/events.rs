//! Outbound application events.
//!
//! The [`ShutterController`](super::service::ShutterController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them; on the device they become log
//! lines, in tests they are recorded and asserted on.

use crate::error::TransportError;
use crate::shutter::channel::ShutterCommand;
use crate::shutter::status::ActuatorStatus;
use crate::shutter::{ActuatorAddress, ShutterId, ShutterPair};

use super::commands::{ButtonSet, InputEvent};

/// How the working address pair was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Both read from the cache.
    Cached,
    /// At least one discovered at cold start.
    ColdStart,
    /// Re-pair gesture.
    Repair,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller started; carries the buttons captured at boot.
    Started(ButtonSet),

    /// The working address pair changed or was first loaded.
    AddressesResolved {
        source: AddressSource,
        addresses: ShutterPair<ActuatorAddress>,
    },

    /// An input event is about to be dispatched.
    Dispatched(InputEvent),

    /// A command reached the actuator.
    CommandIssued {
        shutter: ShutterId,
        command: ShutterCommand,
    },

    /// A command failed at transport level and was dropped.
    CommandFailed {
        shutter: ShutterId,
        command: ShutterCommand,
        error: TransportError,
    },

    /// Status snapshot taken for Stop planning.
    StatusPolled {
        shutter: ShutterId,
        status: ActuatorStatus,
    },

    /// Stop did nothing because the status was unknown.
    StopSkipped(ShutterId),

    /// The awake window expired.
    SleepEntered,

    /// Execution continued after a low-power period.
    Resumed,
}
