//! WiFi station-mode adapter.
//!
//! Brings the station link up once at boot, before the controller resolves
//! actuator addresses.  Retry bookkeeping lives in an explicit
//! [`ConnectionState`] value rather than in globals: each disconnect while
//! connecting spends one retry, a successful connect resets the count.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi<EspWifi>`.
//! - **all other targets**: simulation stub that always connects.

use core::fmt;
use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// Every retry was spent.
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// What the event path should do after a link event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Connect,
    Wait,
    GiveUp,
}

/// Retry bookkeeping for station bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    status: LinkStatus,
    retries: u32,
    max_retries: u32,
}

impl ConnectionState {
    pub const fn new(max_retries: u32) -> Self {
        Self {
            status: LinkStatus::Idle,
            retries: 0,
            max_retries,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Station started: issue the first connect.
    pub fn on_start(&mut self) -> LinkAction {
        self.status = LinkStatus::Connecting;
        LinkAction::Connect
    }

    /// Link dropped or an attempt failed.
    pub fn on_disconnected(&mut self) -> LinkAction {
        if self.retries < self.max_retries {
            self.retries += 1;
            self.status = LinkStatus::Connecting;
            LinkAction::Connect
        } else {
            self.status = LinkStatus::Failed;
            LinkAction::GiveUp
        }
    }

    /// Got an address: connected, retry budget restored.
    pub fn on_connected(&mut self) -> LinkAction {
        self.retries = 0;
        self.status = LinkStatus::Connected;
        LinkAction::Wait
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() {
        return Err(ConnectivityError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    state: ConnectionState,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, max_retries: u32) -> Self {
        Self {
            wifi,
            state: ConnectionState::new(max_retries),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: ConnectionState::new(max_retries),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Connect and block until the station has an address or every retry
    /// is spent.
    pub fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.platform_configure(ssid, password)?;
        info!("WiFi: connecting to '{}'", ssid);

        let mut action = self.state.on_start();
        while action == LinkAction::Connect {
            action = match self.platform_connect() {
                Ok(()) => self.state.on_connected(),
                Err(()) => {
                    warn!(
                        "WiFi: attempt failed, retry {}/{}",
                        self.state.retries() + 1,
                        self.state.max_retries
                    );
                    self.state.on_disconnected()
                }
            };
        }

        match self.state.status() {
            LinkStatus::Connected => {
                info!("WiFi: connected to '{}'", ssid);
                Ok(())
            }
            _ => {
                error!("WiFi: giving up on '{}'", ssid);
                Err(ConnectivityError::ConnectionFailed)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: password
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.wifi
            .start()
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self, ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        info!("WiFi(sim): configured for '{}'", ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ()> {
        self.wifi
            .connect()
            .and_then(|()| self.wifi.wait_netif_up())
            .map_err(|e| warn!("WiFi: {}", e))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
