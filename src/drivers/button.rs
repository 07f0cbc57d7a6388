//! Button sources for the three wall buttons.
//!
//! ## Hardware
//!
//! Active-low momentary switches with external pull-ups on the Up, Stop
//! and Down lines.
//!
//! ## Variants
//!
//! | Mode        | Source                          | Sees                        |
//! |-------------|---------------------------------|-----------------------------|
//! | `Polling`   | [`LevelButtons`] reads levels   | buttons held at poll time   |
//! | `Interrupt` | [`LatchedButtons`] drains latch | falling edges since last poll |
//!
//! No debouncing: a bounce re-issues an idempotent command at worst, and
//! the pending-set logic in the controller swallows repeats within a tick.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};
use log::warn;

use crate::app::commands::{Button, ButtonSet};
use crate::app::ports::ButtonSource;
use crate::events::latch_button;
use crate::pins;

pub use crate::events::LatchedButtons;

/// One raw GPIO input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioLine(i32);

impl GpioLine {
    pub const fn new(gpio: i32) -> Self {
        Self(gpio)
    }

    pub const fn gpio(&self) -> i32 {
        self.0
    }
}

impl ErrorType for GpioLine {
    type Error = Infallible;
}

impl InputPin for GpioLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(crate::drivers::hw_init::gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Level-polled buttons.  A line reads as pressed while it is low.
pub struct LevelButtons<P> {
    up: P,
    stop: P,
    down: P,
}

impl<P: InputPin> LevelButtons<P> {
    pub fn new(up: P, stop: P, down: P) -> Self {
        Self { up, stop, down }
    }

    fn pressed(pin: &mut P, button: Button) -> bool {
        pin.is_low().unwrap_or_else(|_| {
            warn!("Buttons: reading {:?} failed, treated as released", button);
            false
        })
    }
}

impl LevelButtons<GpioLine> {
    /// The board's Up/Stop/Down lines.
    pub fn board() -> Self {
        Self::new(
            GpioLine::new(pins::BUTTON_UP_GPIO),
            GpioLine::new(pins::BUTTON_STOP_GPIO),
            GpioLine::new(pins::BUTTON_DOWN_GPIO),
        )
    }
}

impl<P: InputPin> ButtonSource for LevelButtons<P> {
    fn poll(&mut self) -> ButtonSet {
        let mut set = ButtonSet::EMPTY;
        if Self::pressed(&mut self.up, Button::Up) {
            set.insert(Button::Up);
        }
        if Self::pressed(&mut self.stop, Button::Stop) {
            set.insert(Button::Stop);
        }
        if Self::pressed(&mut self.down, Button::Down) {
            set.insert(Button::Down);
        }
        set
    }
}

/// ISR handler; register on a button line's falling edge.
/// Safe to call from interrupt context (lock-free atomic OR).
pub fn button_isr_handler(button: Button) {
    latch_button(button);
}
