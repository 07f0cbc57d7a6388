//! Duty-cycle power management.
//!
//! ```text
//!            button activity (touch)
//!          ┌──────────────────────────┐
//!          ▼                          │
//!   ┌────────────┐  idle > awake_ms  ┌────────────┐
//!   │   Awake    │──────────────────▶│   Asleep   │
//!   └────────────┘◀──────────────────└────────────┘
//!                   GPIO low on Up/Stop/Down
//! ```
//!
//! On hardware "Asleep" is deep sleep: the chip powers down and a button
//! edge reboots it, so the return transition is a fresh boot whose wake
//! press is captured by [`crate::drivers::hw_init::read_boot_buttons`].
//! The simulation backend returns from [`PowerPort::enter_low_power`] and
//! the controller resumes in place.

use log::info;

use crate::app::ports::PowerPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Awake window ──────────────────────────────────────────────

/// Deadline tracker: `last activity + awake_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwakeWindow {
    awake_ms: u64,
    last_activity_ms: u64,
}

impl AwakeWindow {
    pub fn new(awake_ms: u32, now_ms: u64) -> Self {
        Self {
            awake_ms: u64::from(awake_ms),
            last_activity_ms: now_ms,
        }
    }

    /// Record activity, pushing the deadline out.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// Strictly more than `awake_ms` since the last activity.
    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) > self.awake_ms
    }

    pub fn deadline(&self) -> u64 {
        self.last_activity_ms.saturating_add(self.awake_ms)
    }
}

// ── State ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Awake,
    Asleep,
}

/// Why the chip booted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Cold boot or reset.
    PowerOn,
    /// Deep-sleep wake on a button line.
    Gpio,
    /// Any other wake source (raw ESP-IDF cause).
    Other(u32),
}

impl WakeReason {
    #[cfg(target_os = "espidf")]
    pub fn determine() -> Self {
        // SAFETY: read-only query of the RTC wake cause register.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        #[allow(non_upper_case_globals)]
        match cause {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => Self::PowerOn,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO => Self::Gpio,
            other => Self::Other(other),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn determine() -> Self {
        Self::PowerOn
    }
}

// ── Power manager ─────────────────────────────────────────────

/// [`PowerPort`] backed by ESP-IDF deep sleep.
pub struct PowerManager {
    #[cfg(not(target_os = "espidf"))]
    sleeps: u32,
}

impl PowerManager {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sleeps: 0,
        }
    }

    /// Number of simulated sleeps.
    #[cfg(not(target_os = "espidf"))]
    pub fn sleep_count(&self) -> u32 {
        self.sleeps
    }
}

impl Default for PowerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerPort for PowerManager {
    #[cfg(target_os = "espidf")]
    fn enter_low_power(&mut self) {
        use crate::drivers::hw_init;

        info!("Power: entering deep sleep");
        hw_init::park_unused_pins();
        // SAFETY: called from the main task with no request in flight; the
        // driver is not used again before the chip powers down.
        unsafe {
            esp_wifi_stop();
            esp_wifi_deinit();
        }
        if let Err(e) = hw_init::enable_gpio_wakeup() {
            log::error!("Power: {}, sleeping without button wake", e);
        }
        // SAFETY: never returns; the chip resets on wake.
        unsafe { esp_deep_sleep_start() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn enter_low_power(&mut self) {
        self.sleeps += 1;
        info!("Power(sim): deep sleep #{}", self.sleeps);
    }
}
