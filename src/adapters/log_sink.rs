//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC on the device, stderr on the host).

use log::{info, warn};

use crate::app::commands::InputEvent;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(boot) => {
                info!("START | boot_buttons={}", boot);
            }
            AppEvent::AddressesResolved { source, addresses } => {
                info!(
                    "ADDR  | source={:?} | shutter1={} shutter2={}",
                    source, addresses.first, addresses.second
                );
            }
            AppEvent::Dispatched(InputEvent::Pressed(button)) => {
                info!("INPUT | {:?}", button);
            }
            AppEvent::Dispatched(InputEvent::Repair) => {
                info!("INPUT | re-pair gesture");
            }
            AppEvent::CommandIssued { shutter, command } => {
                info!("CMD   | {} <- {}", shutter, command);
            }
            AppEvent::CommandFailed {
                shutter,
                command,
                error,
            } => {
                warn!("CMD   | {} <- {} failed: {}", shutter, command, error);
            }
            AppEvent::StatusPolled { shutter, status } => {
                info!("STAT  | {} is {:?}", shutter, status);
            }
            AppEvent::StopSkipped(shutter) => {
                info!("STOP  | {} skipped, status unknown", shutter);
            }
            AppEvent::SleepEntered => {
                info!("POWER | sleep");
            }
            AppEvent::Resumed => {
                info!("POWER | resumed");
            }
        }
    }
}
