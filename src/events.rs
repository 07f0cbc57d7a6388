//! Interrupt-to-loop button handoff.
//!
//! ```text
//! ┌─────────────┐  set (fetch_or)  ┌──────────────┐  take (swap 0)  ┌───────────┐
//! │ GPIO ISR    │─────────────────▶│ ButtonLatch  │────────────────▶│ Main loop │
//! └─────────────┘                  └──────────────┘                 └───────────┘
//! ```
//!
//! The latch is one `AtomicU8` holding a [`ButtonSet`].  The ISR ORs its
//! line in; the loop swaps the byte with zero.  A press landing between two
//! takes is seen exactly once, and nothing is lost while a take runs.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::app::commands::{Button, ButtonSet};
use crate::app::ports::ButtonSource;

/// Single-producer / single-consumer set of pressed buttons.
pub struct ButtonLatch(AtomicU8);

impl ButtonLatch {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Mark `button` pressed.  Safe to call from ISR context (lock-free).
    pub fn set(&self, button: Button) {
        self.0.fetch_or(button.mask(), Ordering::AcqRel);
    }

    /// Read and clear in one atomic step.
    pub fn take(&self) -> ButtonSet {
        ButtonSet::from_bits(self.0.swap(0, Ordering::AcqRel))
    }

    /// Peek without clearing.
    pub fn is_empty(&self) -> bool {
        self.0.load(Ordering::Acquire) == 0
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// The latch fed by the button ISRs.
pub static BUTTON_LATCH: ButtonLatch = ButtonLatch::new();

/// Record a press from interrupt context.
pub fn latch_button(button: Button) {
    BUTTON_LATCH.set(button);
}

/// [`ButtonSource`] draining a latch.
pub struct LatchedButtons<'a> {
    latch: &'a ButtonLatch,
}

impl<'a> LatchedButtons<'a> {
    pub fn new(latch: &'a ButtonLatch) -> Self {
        Self { latch }
    }
}

impl LatchedButtons<'static> {
    /// Source backed by [`BUTTON_LATCH`].
    pub fn global() -> Self {
        Self::new(&BUTTON_LATCH)
    }
}

impl ButtonSource for LatchedButtons<'_> {
    fn poll(&mut self) -> ButtonSet {
        self.latch.take()
    }
}
