//! One-shot GPIO setup for the button lines, the button ISRs, and the
//! deep-sleep pin/wake configuration.
//!
//! Uses raw ESP-IDF sys calls.  [`read_boot_buttons`] runs first thing in
//! `main()`; everything else runs once before the control loop or right
//! before deep sleep.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::commands::{Button, ButtonSet};
use crate::config::InputMode;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    WakeupConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::WakeupConfigFailed(rc) => write!(f, "GPIO wakeup config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Map an ESP-IDF return code to `Ok(())`, or to `err(code)` on failure.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn esp_result(ret: i32, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == 0 { Ok(()) } else { Err(err(ret)) }
}

/// Button lines in dispatch order.
pub const BUTTON_LINES: [(Button, i32); 3] = [
    (Button::Up, pins::BUTTON_UP_GPIO),
    (Button::Stop, pins::BUTTON_STOP_GPIO),
    (Button::Down, pins::BUTTON_DOWN_GPIO),
];

// ── Raw level access ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access; safe to call
    // from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulation: every line idles high (released).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

/// Sample the button lines straight after reset, so the press that woke
/// the chip from deep sleep is not lost during WiFi bring-up.
pub fn read_boot_buttons() -> ButtonSet {
    BUTTON_LINES
        .iter()
        .filter(|(_, gpio)| !gpio_read(*gpio))
        .map(|(button, _)| *button)
        .collect()
}

// ── Button inputs ─────────────────────────────────────────────

/// Configure the three button lines as inputs.  In interrupt mode they
/// also get falling-edge interrupts feeding the button latch.
#[cfg(target_os = "espidf")]
pub fn init_buttons(mode: InputMode) -> Result<(), HwInitError> {
    let intr_type = match mode {
        InputMode::Polling => gpio_int_type_t_GPIO_INTR_DISABLE,
        InputMode::Interrupt => gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    let cfg = gpio_config_t {
        pin_bit_mask: pins::BUTTON_WAKE_MASK,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type,
    };
    // SAFETY: called once from the main task before the control loop.
    esp_result(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;

    if mode == InputMode::Interrupt {
        init_isr_service()?;
    }
    info!("hw_init: buttons configured ({:?})", mode);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_buttons(mode: InputMode) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): buttons ({:?}) skipped", mode);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::button_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn up_gpio_isr(_arg: *mut core::ffi::c_void) {
    button_isr_handler(Button::Up);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn stop_gpio_isr(_arg: *mut core::ffi::c_void) {
    button_isr_handler(Button::Stop);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn down_gpio_isr(_arg: *mut core::ffi::c_void) {
    button_isr_handler(Button::Down);
}

/// Install the per-pin GPIO ISR service and register the button handlers.
#[cfg(target_os = "espidf")]
fn init_isr_service() -> Result<(), HwInitError> {
    type Isr = unsafe extern "C" fn(*mut core::ffi::c_void);
    let handlers: [(i32, Isr); 3] = [
        (pins::BUTTON_UP_GPIO, up_gpio_isr),
        (pins::BUTTON_STOP_GPIO, stop_gpio_isr),
        (pins::BUTTON_DOWN_GPIO, down_gpio_isr),
    ];

    // SAFETY: ESP_ERR_INVALID_STATE means the service was already installed
    // (acceptable).  The handlers are static functions that only OR a bit
    // into the lock-free button latch.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        for (gpio, handler) in handlers {
            esp_result(
                gpio_isr_handler_add(gpio, Some(handler), core::ptr::null_mut()),
                HwInitError::IsrInstallFailed,
            )?;
            esp_result(gpio_intr_enable(gpio), HwInitError::IsrInstallFailed)?;
        }
    }
    info!("hw_init: ISR service installed (up, stop, down)");
    Ok(())
}

// ── Deep sleep ────────────────────────────────────────────────

/// Park unused pins: GPIO0 driven low, the rest pulled up.
#[cfg(target_os = "espidf")]
pub fn park_unused_pins() {
    let output = gpio_config_t {
        pin_bit_mask: 1u64 << pins::PARKED_OUTPUT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let inputs = gpio_config_t {
        pin_bit_mask: pins::PARKED_INPUT_GPIOS
            .iter()
            .fold(0u64, |mask, gpio| mask | (1u64 << gpio)),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: main task, right before deep sleep; nothing else drives
    // these pins.
    unsafe {
        gpio_config(&output);
        gpio_set_level(pins::PARKED_OUTPUT_GPIO, 0);
        gpio_config(&inputs);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn park_unused_pins() {}

/// Arm deep-sleep wake on a low level of any button line.
#[cfg(target_os = "espidf")]
pub fn enable_gpio_wakeup() -> Result<(), HwInitError> {
    // SAFETY: configures RTC wake sources; main task only.
    let ret = unsafe {
        esp_deep_sleep_enable_gpio_wakeup(
            pins::BUTTON_WAKE_MASK,
            esp_deepsleep_gpio_wake_up_mode_t_ESP_GPIO_WAKEUP_GPIO_LOW,
        )
    };
    esp_result(ret, HwInitError::WakeupConfigFailed)
}

#[cfg(not(target_os = "espidf"))]
pub fn enable_gpio_wakeup() -> Result<(), HwInitError> {
    Ok(())
}
