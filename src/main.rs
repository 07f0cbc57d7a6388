//! ShutterPad Firmware — Main Entry Point
//!
//! Battery wall controller for two networked roller-shutter actuators.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NetifAdapter   EspHttpTransport   NvsAdapter   Esp32Time      │
//! │  (NetworkPort)  (HttpTransport)    (Storage)    (Clock)        │
//! │  LevelButtons / LatchedButtons     LogEventSink PowerManager   │
//! │  (ButtonSource)                    (EventSink)  (PowerPort)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ShutterController (pure logic)                │    │
//! │  │  Discovery · AddressCache · CommandPolicy · AwakeWindow│    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info};

use shutterpad::adapters::http::EspHttpTransport;
use shutterpad::adapters::log_sink::LogEventSink;
use shutterpad::adapters::netif::NetifAdapter;
use shutterpad::adapters::nvs::NvsAdapter;
use shutterpad::adapters::time::{Esp32TimeAdapter, SystemDelay};
use shutterpad::adapters::wifi::WifiAdapter;
use shutterpad::app::commands::ButtonSet;
use shutterpad::app::ports::{ButtonSource, PowerPort};
use shutterpad::app::service::ShutterController;
use shutterpad::config::{self, ControllerConfig, InputMode};
use shutterpad::drivers::button::{GpioLine, LatchedButtons, LevelButtons};
use shutterpad::drivers::hw_init;
use shutterpad::power::{PowerManager, WakeReason};

// ── Input selection ───────────────────────────────────────────

/// The configured input variant.
enum Buttons {
    Level(LevelButtons<GpioLine>),
    Latched(LatchedButtons<'static>),
}

impl Buttons {
    fn for_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Polling => Self::Level(LevelButtons::board()),
            InputMode::Interrupt => Self::Latched(LatchedButtons::global()),
        }
    }
}

impl ButtonSource for Buttons {
    fn poll(&mut self) -> ButtonSet {
        match self {
            Self::Level(b) => b.poll(),
            Self::Latched(b) => b.poll(),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Capture the wake press before anything slow ────────
    let boot_buttons = hw_init::read_boot_buttons();

    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!(
        "║  ShutterPad v{}                      ║",
        env!("CARGO_PKG_VERSION")
    );
    info!("╚══════════════════════════════════════╝");

    match WakeReason::determine() {
        WakeReason::PowerOn => info!("Boot: power-on"),
        WakeReason::Gpio => info!("Boot: button wake ({})", boot_buttons),
        other => info!("Boot: {:?}", other),
    }

    // ── 2. Config ─────────────────────────────────────────────
    let cfg = ControllerConfig::default();
    cfg.validate()?;

    // ── 3. Persistent storage ─────────────────────────────────
    let nvs = NvsAdapter::new().context("NVS init failed")?;

    // ── 4. WiFi station ───────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs_partition))?,
        sys_loop,
    )?;
    let mut wifi = WifiAdapter::new(wifi, cfg.wifi_max_retries);
    let mut power = PowerManager::new();

    if let Err(e) = wifi.connect(config::WIFI_SSID, config::WIFI_PASS) {
        // Sleep until the next press retries the whole bring-up.
        error!("WiFi: {}, going back to sleep", e);
        power.enter_low_power();
        return Ok(());
    }

    // ── 5. Buttons ────────────────────────────────────────────
    hw_init::init_buttons(cfg.input_mode)?;
    let mut buttons = Buttons::for_mode(cfg.input_mode);

    // ── 6. Controller ─────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut delay = SystemDelay;
    let tick_ms = cfg.tick_ms;

    let mut controller = ShutterController::new(
        cfg.clone(),
        NetifAdapter::new(),
        EspHttpTransport::new(cfg.http_timeout_ms),
        nvs,
        SystemDelay,
    );
    controller.start(boot_buttons, &clock, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        controller.tick(&mut buttons, &clock, &mut power, &mut sink);
        delay.delay_ms(tick_ms);
    }
}
