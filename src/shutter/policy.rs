//! Stop-button semantics.
//!
//! A press of Stop means "halt" while a shutter travels, and "ventilate"
//! (drive to a fixed partial-open position) while it rests.  An unknown
//! status is never acted on: doing nothing beats an unintended full traverse.

use super::channel::ShutterCommand;
use super::status::ActuatorStatus;

/// What a Stop press turns into for one shutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// Halt mid-travel.
    Halt,
    /// Go to the ventilation position (percent open).
    Ventilate(u8),
}

impl StopAction {
    pub const fn command(self) -> ShutterCommand {
        match self {
            Self::Halt => ShutterCommand::Stop,
            Self::Ventilate(pos) => ShutterCommand::GoToPosition(pos),
        }
    }
}

/// Decide the Stop action from a single status snapshot.
///
/// Pure: the result depends on `status` and the configured position only.
pub const fn plan_stop(status: ActuatorStatus, ventilation: u8) -> Option<StopAction> {
    match status {
        ActuatorStatus::Opening | ActuatorStatus::Closing => Some(StopAction::Halt),
        ActuatorStatus::Open | ActuatorStatus::Closed | ActuatorStatus::Stopped => {
            Some(StopAction::Ventilate(ventilation))
        }
        ActuatorStatus::Unknown => None,
    }
}

/// Stop policy bound to the configured ventilation position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPolicy {
    ventilation: u8,
}

impl CommandPolicy {
    pub const fn new(ventilation: u8) -> Self {
        Self { ventilation }
    }

    pub const fn stop(&self, status: ActuatorStatus) -> Option<StopAction> {
        plan_stop(status, self.ventilation)
    }
}
