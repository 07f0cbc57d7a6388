//! Controller configuration.
//!
//! Everything is compiled in.  The actuator MACs and the WiFi credentials
//! can be overridden at build time through the `SHUTTER_1_MAC`,
//! `SHUTTER_2_MAC`, `WIFI_SSID` and `WIFI_PASS` environment variables; a
//! MAC override that does not parse falls back to the built-in value.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::shutter::discovery::SweepParams;
use crate::shutter::{ActuatorIdentity, ShutterPair};

const fn mac_or(env: Option<&str>, fallback: ActuatorIdentity) -> ActuatorIdentity {
    match env {
        Some(s) => match ActuatorIdentity::parse(s) {
            Some(id) => id,
            None => fallback,
        },
        None => fallback,
    }
}

const fn str_or(env: Option<&'static str>, fallback: &'static str) -> &'static str {
    match env {
        Some(s) => s,
        None => fallback,
    }
}

pub const SHUTTER_1: ActuatorIdentity = mac_or(
    option_env!("SHUTTER_1_MAC"),
    ActuatorIdentity::new([0xE4, 0xB3, 0x23, 0x23, 0x4B, 0x1C]),
);
pub const SHUTTER_2: ActuatorIdentity = mac_or(
    option_env!("SHUTTER_2_MAC"),
    ActuatorIdentity::new([0xE4, 0xB3, 0x23, 0x1F, 0xFA, 0xAC]),
);

pub const WIFI_SSID: &str = str_or(option_env!("WIFI_SSID"), "");
pub const WIFI_PASS: &str = str_or(option_env!("WIFI_PASS"), "");

/// Namespace holding the address records.
pub const NVS_NAMESPACE: &str = "storage";

/// How button activity reaches the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Read the three line levels every tick.
    #[default]
    Polling,
    /// Falling-edge ISRs set the button latch; the loop drains it.
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Actuators ---
    /// Hardware addresses of the two actuators.
    pub shutters: ShutterPair<ActuatorIdentity>,
    /// Stop on a resting shutter drives it here (percent open).
    pub ventilation_position: u8,

    // --- Duty cycle ---
    /// Idle time before deep sleep.
    pub awake_ms: u32,
    /// Pause between loop iterations.
    pub tick_ms: u32,
    /// Pause after every RPC exchange.
    pub settle_ms: u32,

    // --- Discovery ---
    pub probe_delay_ms: u32,
    pub first_host: u8,
    pub last_host: u8,
    pub checkpoint_interval: u8,
    pub arp_scan_entries: usize,

    // --- Network ---
    pub http_timeout_ms: u32,
    pub wifi_max_retries: u32,

    pub input_mode: InputMode,
    #[serde(skip, default = "default_namespace")]
    pub nvs_namespace: &'static str,
}

fn default_namespace() -> &'static str {
    NVS_NAMESPACE
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            shutters: ShutterPair::new(SHUTTER_1, SHUTTER_2),
            ventilation_position: 17,

            awake_ms: 20_000,
            tick_ms: 10,
            settle_ms: 200,

            probe_delay_ms: 50,
            first_host: 1,
            last_host: 254,
            checkpoint_interval: 10,
            arp_scan_entries: 10,

            http_timeout_ms: 5_000,
            wifi_max_retries: 10,

            input_mode: InputMode::Polling,
            nvs_namespace: NVS_NAMESPACE,
        }
    }
}

impl ControllerConfig {
    pub fn sweep_params(&self) -> SweepParams {
        SweepParams {
            first_host: self.first_host,
            last_host: self.last_host,
            probe_delay_ms: self.probe_delay_ms,
            checkpoint_interval: self.checkpoint_interval,
            scan_entries: self.arp_scan_entries,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [a, b] = [self.shutters.first, self.shutters.second];
        if a == b {
            return Err(ConfigError::ValidationFailed("shutter MACs must differ"));
        }
        if a.mac() == &[0; 6] || b.mac() == &[0; 6] {
            return Err(ConfigError::ValidationFailed("shutter MAC must be non-zero"));
        }
        if self.ventilation_position > 100 {
            return Err(ConfigError::ValidationFailed("ventilation_position must be 0–100"));
        }
        if !(1_000..=600_000).contains(&self.awake_ms) {
            return Err(ConfigError::ValidationFailed("awake_ms must be 1000–600000"));
        }
        if !(1..=1_000).contains(&self.tick_ms) {
            return Err(ConfigError::ValidationFailed("tick_ms must be 1–1000"));
        }
        if self.settle_ms > 5_000 {
            return Err(ConfigError::ValidationFailed("settle_ms must be 0–5000"));
        }
        if !(1..=1_000).contains(&self.probe_delay_ms) {
            return Err(ConfigError::ValidationFailed("probe_delay_ms must be 1–1000"));
        }
        if self.first_host == 0 || self.first_host > self.last_host || self.last_host > 254 {
            return Err(ConfigError::ValidationFailed(
                "host range must satisfy 1 <= first_host <= last_host <= 254",
            ));
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::ValidationFailed("checkpoint_interval must be >= 1"));
        }
        if !(1..=32).contains(&self.arp_scan_entries) {
            return Err(ConfigError::ValidationFailed("arp_scan_entries must be 1–32"));
        }
        if !(100..=60_000).contains(&self.http_timeout_ms) {
            return Err(ConfigError::ValidationFailed("http_timeout_ms must be 100–60000"));
        }
        if self.nvs_namespace.is_empty() || self.nvs_namespace.len() > 15 {
            return Err(ConfigError::ValidationFailed("nvs_namespace must be 1–15 bytes"));
        }
        Ok(())
    }
}
