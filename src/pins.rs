//! GPIO assignments for the ShutterPad wall controller (ESP32-C3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Buttons (active-low momentary switches, external pull-ups)
// ---------------------------------------------------------------------------

/// Open both shutters.
pub const BUTTON_UP_GPIO: i32 = 5;
/// Halt, or nudge to ventilation when at rest.
pub const BUTTON_STOP_GPIO: i32 = 4;
/// Close both shutters.
pub const BUTTON_DOWN_GPIO: i32 = 3;

/// Bit mask of the three button lines, used for deep-sleep GPIO wake.
pub const BUTTON_WAKE_MASK: u64 =
    (1 << BUTTON_UP_GPIO) | (1 << BUTTON_STOP_GPIO) | (1 << BUTTON_DOWN_GPIO);

// ---------------------------------------------------------------------------
// Unused pins, parked before deep sleep to minimise leakage
// ---------------------------------------------------------------------------

/// Strapping pin driven low during sleep.
pub const PARKED_OUTPUT_GPIO: i32 = 0;

/// Floating pins parked as inputs with pull-up.
pub const PARKED_INPUT_GPIOS: [i32; 9] = [1, 2, 6, 7, 8, 9, 10, 20, 21];
